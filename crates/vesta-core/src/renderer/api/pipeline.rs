// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines all data structures used to configure a graphics render pipeline.

use crate::renderer::api::binding::BindingLayoutId;
use crate::renderer::api::texture::TextureFormat;
use std::collections::BTreeMap;

/// The memory format of a single vertex attribute's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Four 8-bit unsigned integer components normalized to `[0.0, 1.0]`.
    Unorm8x4,
    /// One 32-bit float component.
    Float32,
    /// Two 32-bit float components.
    Float32x2,
    /// Three 32-bit float components.
    Float32x3,
    /// Four 32-bit float components.
    Float32x4,
}

/// Defines how vertices are connected to form a geometric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Vertices are rendered as a list of isolated points.
    PointList,
    /// Vertices are rendered as a list of isolated lines.
    LineList,
    /// Vertices are rendered as a list of isolated triangles.
    TriangleList,
    /// Vertices are rendered as a connected triangle strip.
    TriangleStrip,
}

/// Defines which face of a triangle to cull (not render).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// No culling is performed.
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    Back,
}

/// Defines which vertex winding order considers a triangle to be "front-facing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    /// Counter-clockwise winding order is the front face.
    Ccw,
    /// Clockwise winding order is the front face.
    Cw,
}

/// The comparison function used for depth testing and comparison samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// The test passes if the new value is less than the existing value.
    Less,
    /// The test passes if the new value is equal to the existing value.
    Equal,
    /// The test passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// The test passes if the new value is greater than the existing value.
    Greater,
    /// The test passes if the new value is not equal to the existing value.
    NotEqual,
    /// The test passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// The test always passes.
    #[default]
    Always,
}

/// Describes the state for primitive rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterStateDescriptor {
    /// The face culling mode.
    pub cull_mode: CullMode,
    /// The vertex winding order that determines the "front" face of a triangle.
    pub front_face: FrontFace,
}

impl Default for RasterStateDescriptor {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::Ccw,
        }
    }
}

/// Describes the state for depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStateDescriptor {
    /// The format of the depth texture.
    pub format: TextureFormat,
    /// If `true`, depth values will be written to the depth buffer.
    pub depth_write_enabled: bool,
    /// The comparison function used for the depth test.
    pub depth_compare: CompareFunction,
}

/// Describes a single vertex attribute consumed by a pipeline.
///
/// Each entry maps one vertex buffer binding slot to one shader input
/// location; the engine binds one vertex buffer per attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputLayoutEntry {
    /// The input location of this attribute in the vertex shader.
    pub shader_location: u32,
    /// The format of the attribute's data.
    pub format: VertexFormat,
    /// The vertex buffer binding slot the attribute is read from.
    pub buffer_slot: u32,
}

/// An ordered set of shader preprocessor defines.
///
/// Backed by a `BTreeMap`, so iteration is always sorted by define name.
/// That makes define sets order-independent for hashing and comparison: two
/// surfaces producing the same defines in a different order yield identical
/// lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DefineList(BTreeMap<String, String>);

impl DefineList {
    /// Creates an empty define list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a define, replacing any previous value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Looks up a define value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether a define with the given name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over `(name, value)` pairs in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of defines.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Describes one shader stage to compile as part of a pipeline.
///
/// Shaders are referenced by source name; compiling them (with the attached
/// define list applied) is the backend's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderBuildDescriptor {
    /// The shader source name (e.g., `"forward.wgsl"`).
    pub source: String,
    /// The entry point function name.
    pub entry_point: String,
    /// Preprocessor defines applied when compiling this stage.
    pub defines: DefineList,
}

impl ShaderBuildDescriptor {
    /// Creates a build descriptor for the given source and entry point.
    pub fn new(source: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entry_point: entry_point.into(),
            defines: DefineList::new(),
        }
    }

    /// Attaches a define list to this stage.
    pub fn with_defines(mut self, defines: DefineList) -> Self {
        self.defines = defines;
        self
    }
}

/// A complete descriptor for a render pipeline.
///
/// This struct aggregates all the state needed by the GPU to render primitives.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The binding layout the pipeline is created against.
    pub binding_layout: BindingLayoutId,
    /// The vertex shader stage.
    pub vertex_shader: ShaderBuildDescriptor,
    /// The fragment shader stage.
    pub fragment_shader: ShaderBuildDescriptor,
    /// The vertex attributes consumed by the pipeline, one buffer slot each.
    pub input_layout: Vec<InputLayoutEntry>,
    /// The topology of the primitives.
    pub primitive_topology: PrimitiveTopology,
    /// The rasterization state.
    pub raster_state: RasterStateDescriptor,
    /// The depth test state. If `None`, depth testing is disabled.
    pub depth_state: Option<DepthStateDescriptor>,
    /// The formats of all color targets this pipeline will render to.
    pub color_formats: Vec<TextureFormat>,
}

/// An opaque handle to a compiled render pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPipelineId(pub usize);
