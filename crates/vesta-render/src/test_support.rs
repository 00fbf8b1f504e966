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

//! Shared test doubles: a mock graphics device and a recording command list.
//!
//! The mock device hands out unique resource IDs and counts object
//! creation; the recording command list captures the recorded stream as
//! typed values so tests can assert on draw counts and barrier ordering.

use std::sync::atomic::{AtomicUsize, Ordering};
use vesta_core::renderer::api::{
    Barrier, BindingLayoutDescriptor, BindingLayoutId, BufferAddressInfo, BufferDescriptor,
    BufferId, IndexFormat, ParameterSet, PrimitiveTopology, RenderPipelineDescriptor,
    RenderPipelineId, SamplerDescriptor, SamplerId, TextureViewId, VertexFormat,
};
use vesta_core::renderer::error::{PipelineError, ResourceError};
use vesta_core::renderer::traits::{CommandList, GraphicsDevice};
use vesta_data::material::{Material, MaterialId, MaterialTexture, TextureClass};
use vesta_data::mesh::{IndexBufferInfo, Surface, VertexAttribute, VertexBufferInfo};

/// A mock graphics device that produces unique resource IDs and counts
/// object creation/destruction.
#[derive(Debug, Default)]
pub struct MockGraphicsDevice {
    next_id: AtomicUsize,
    samplers_created: AtomicUsize,
    samplers_destroyed: AtomicUsize,
    pipelines_created: AtomicUsize,
    pipelines_destroyed: AtomicUsize,
    buffers_created: AtomicUsize,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            ..Default::default()
        }
    }

    fn next(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn samplers_created(&self) -> usize {
        self.samplers_created.load(Ordering::Relaxed)
    }

    pub fn samplers_destroyed(&self) -> usize {
        self.samplers_destroyed.load(Ordering::Relaxed)
    }

    pub fn pipelines_created(&self) -> usize {
        self.pipelines_created.load(Ordering::Relaxed)
    }

    pub fn pipelines_destroyed(&self) -> usize {
        self.pipelines_destroyed.load(Ordering::Relaxed)
    }

    pub fn buffers_created(&self) -> usize {
        self.buffers_created.load(Ordering::Relaxed)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_binding_layout(
        &self,
        _descriptor: &BindingLayoutDescriptor,
    ) -> Result<BindingLayoutId, ResourceError> {
        Ok(BindingLayoutId(self.next()))
    }

    fn create_render_pipeline(
        &self,
        _descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, PipelineError> {
        self.pipelines_created.fetch_add(1, Ordering::Relaxed);
        Ok(RenderPipelineId(self.next()))
    }

    fn destroy_render_pipeline(&self, _id: RenderPipelineId) -> Result<(), ResourceError> {
        self.pipelines_destroyed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        self.samplers_created.fetch_add(1, Ordering::Relaxed);
        Ok(SamplerId(self.next()))
    }

    fn destroy_sampler(&self, _id: SamplerId) -> Result<(), ResourceError> {
        self.samplers_destroyed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn create_buffer(&self, _descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.buffers_created.fetch_add(1, Ordering::Relaxed);
        Ok(BufferId(self.next()))
    }

    fn destroy_buffer(&self, _id: BufferId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn write_buffer(&self, _id: BufferId, _offset: u64, _data: &[u8]) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// One command captured by the [`RecordingCommandList`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    ResourceBarrier(Vec<Barrier>),
    ClearRenderTarget(TextureViewId),
    ClearDepthStencil(TextureViewId, f32),
    BeginRaster {
        color_count: usize,
        has_depth: bool,
        has_shading_rate_image: bool,
    },
    EndRaster,
    SetViewportScissor {
        width: u32,
        height: u32,
    },
    SetPrimitiveTopology(PrimitiveTopology),
    SetPipelineState(RenderPipelineId),
    BindParameterSet,
    SetVertexBuffers {
        first_slot: u32,
        buffers: Vec<BufferAddressInfo>,
    },
    SetIndexBuffer(BufferAddressInfo, IndexFormat),
    DrawIndexedInstanced {
        index_count: u32,
        instance_count: u32,
    },
    PushDebugMarker(String),
    PopDebugMarker,
}

/// A command list that records the command stream for inspection.
#[derive(Debug, Default)]
pub struct RecordingCommandList {
    pub commands: Vec<RecordedCommand>,
}

impl RecordingCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed draws recorded.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::DrawIndexedInstanced { .. }))
            .count()
    }

    /// The pipelines bound, in recording order.
    pub fn pipelines_bound(&self) -> Vec<RenderPipelineId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::SetPipelineState(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// The position of the first command matching `predicate`.
    pub fn position_of(&self, predicate: impl Fn(&RecordedCommand) -> bool) -> Option<usize> {
        self.commands.iter().position(predicate)
    }
}

impl CommandList for RecordingCommandList {
    fn resource_barrier(&mut self, barriers: &[Barrier]) {
        self.commands
            .push(RecordedCommand::ResourceBarrier(barriers.to_vec()));
    }

    fn clear_render_target(&mut self, view: TextureViewId, _color: [f32; 4]) {
        self.commands.push(RecordedCommand::ClearRenderTarget(view));
    }

    fn clear_depth_stencil(&mut self, view: TextureViewId, depth: f32) {
        self.commands
            .push(RecordedCommand::ClearDepthStencil(view, depth));
    }

    fn begin_raster(
        &mut self,
        color_views: &[TextureViewId],
        depth_view: Option<TextureViewId>,
        shading_rate_image: Option<TextureViewId>,
    ) {
        self.commands.push(RecordedCommand::BeginRaster {
            color_count: color_views.len(),
            has_depth: depth_view.is_some(),
            has_shading_rate_image: shading_rate_image.is_some(),
        });
    }

    fn end_raster(&mut self, _shading_rate_image: Option<TextureViewId>) {
        self.commands.push(RecordedCommand::EndRaster);
    }

    fn set_viewport_scissor(
        &mut self,
        _x: u32,
        _y: u32,
        width: u32,
        height: u32,
        _min_depth: f32,
        _max_depth: f32,
    ) {
        self.commands
            .push(RecordedCommand::SetViewportScissor { width, height });
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.commands
            .push(RecordedCommand::SetPrimitiveTopology(topology));
    }

    fn set_pipeline_state(&mut self, pipeline: RenderPipelineId) {
        self.commands
            .push(RecordedCommand::SetPipelineState(pipeline));
    }

    fn bind_parameter_set(&mut self, _parameter_set: &ParameterSet) {
        self.commands.push(RecordedCommand::BindParameterSet);
    }

    fn set_vertex_buffers(&mut self, first_slot: u32, buffers: &[BufferAddressInfo]) {
        self.commands.push(RecordedCommand::SetVertexBuffers {
            first_slot,
            buffers: buffers.to_vec(),
        });
    }

    fn set_index_buffer(&mut self, buffer: &BufferAddressInfo, format: IndexFormat) {
        self.commands
            .push(RecordedCommand::SetIndexBuffer(*buffer, format));
    }

    fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32) {
        self.commands.push(RecordedCommand::DrawIndexedInstanced {
            index_count,
            instance_count,
        });
    }

    fn push_debug_marker(&mut self, label: &str) {
        self.commands
            .push(RecordedCommand::PushDebugMarker(label.to_string()));
    }

    fn pop_debug_marker(&mut self) {
        self.commands.push(RecordedCommand::PopDebugMarker);
    }
}

/// A specification of a material texture binding for fixtures.
#[derive(Debug, Clone, Copy)]
pub struct TextureSpec {
    pub class: TextureClass,
    pub view: TextureViewId,
    pub sampler: SamplerDescriptor,
    pub texcoord_set: u32,
}

impl TextureSpec {
    pub fn new(class: TextureClass, view: usize) -> Self {
        Self {
            class,
            view: TextureViewId(view),
            sampler: SamplerDescriptor::default(),
            texcoord_set: 0,
        }
    }

    pub fn with_sampler(mut self, sampler: SamplerDescriptor) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_texcoord_set(mut self, set: u32) -> Self {
        self.texcoord_set = set;
        self
    }
}

/// Builds an opaque material with the given texture bindings.
pub fn material_with_textures(textures: &[TextureSpec]) -> Material {
    let mut material = Material::new();
    for spec in textures {
        material.set_texture(
            spec.class,
            MaterialTexture {
                view: spec.view,
                sampler: spec.sampler,
                texcoord_set: spec.texcoord_set,
            },
        );
    }
    material
}

/// Monotonic source of unique buffer addresses for surface fixtures.
static NEXT_FIXTURE_BUFFER: AtomicUsize = AtomicUsize::new(1000);

fn fixture_buffer(size: u64) -> BufferAddressInfo {
    BufferAddressInfo {
        buffer: BufferId(NEXT_FIXTURE_BUFFER.fetch_add(1, Ordering::Relaxed)),
        offset: 0,
        size,
    }
}

/// Builds a surface supplying the given vertex attributes.
pub fn surface_with_attributes(
    surface_id: u32,
    material: MaterialId,
    attributes: &[(VertexAttribute, VertexFormat)],
) -> Surface {
    let mut surface = Surface::new(
        surface_id,
        material,
        IndexBufferInfo {
            address: fixture_buffer(36 * 4),
            format: IndexFormat::Uint32,
            count: 36,
        },
    );
    for (attribute, format) in attributes {
        surface.set_vertex_buffer(
            *attribute,
            VertexBufferInfo {
                address: fixture_buffer(24 * 16),
                format: *format,
                count: 24,
            },
        );
    }
    surface
}

/// The standard static-mesh attribute set: position, normal, tangent, texcoord0.
pub fn standard_attributes() -> Vec<(VertexAttribute, VertexFormat)> {
    vec![
        (VertexAttribute::Position, VertexFormat::Float32x3),
        (VertexAttribute::Normal, VertexFormat::Float32x3),
        (VertexAttribute::Tangent, VertexFormat::Float32x4),
        (VertexAttribute::Texcoord0, VertexFormat::Float32x2),
    ]
}
