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

//! Defines data structures related to GPU texture and sampler resources.

use crate::renderer::api::pipeline::CompareFunction;

/// An opaque handle to a GPU texture owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a view into a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureViewId(pub usize);

/// An opaque handle to a sampler object owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);

/// The pixel format of a texture.
///
/// Only the formats the engine actually renders to or samples are listed;
/// backends may support more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Four 8-bit unsigned normalized components.
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components in sRGB space.
    Rgba8UnormSrgb,
    /// Four 8-bit unsigned normalized components, BGRA order, sRGB space.
    Bgra8UnormSrgb,
    /// Four 16-bit float components. The usual HDR color target format.
    Rgba16Float,
    /// Two 16-bit float components. The usual motion-vector target format.
    Rg16Float,
    /// A single 32-bit float depth component.
    Depth32Float,
}

impl TextureFormat {
    /// Whether this is a depth format.
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::Depth32Float)
    }
}

/// The dimensionality of a texture view as seen by a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewDimension {
    /// A view of a 2D texture.
    D2,
    /// A view of a 2D texture array.
    D2Array,
    /// A view of a cubemap texture (6 faces of a 2D texture).
    Cube,
}

/// Defines how texture coordinates are handled when sampling outside the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Coordinates wrap around. `1.1` becomes `0.1`.
    Repeat,
    /// Coordinates are clamped to the edge. `1.1` becomes `1.0`.
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirrorRepeat,
    /// Coordinates outside the range are given a fixed border color.
    ClampToBorder,
}

/// Defines the filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Point sampling. Returns the value of the nearest texel.
    Nearest,
    /// Linear interpolation. Returns a weighted average of the four nearest texels.
    Linear,
}

/// A descriptor used to create a [`SamplerId`].
///
/// Samplers are deduplicated by descriptor equality throughout the engine,
/// so the derived `PartialEq` is part of the contract: two descriptors that
/// compare equal must describe interchangeable samplers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDescriptor {
    /// Address mode for the U texture coordinate.
    pub address_mode_u: AddressMode,
    /// Address mode for the V texture coordinate.
    pub address_mode_v: AddressMode,
    /// Address mode for the W texture coordinate.
    pub address_mode_w: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Filter between mipmap levels.
    pub mip_filter: FilterMode,
    /// Maximum anisotropy. `1` disables anisotropic filtering.
    pub max_anisotropy: u32,
    /// If set, this is a comparison sampler using the given function.
    pub compare: Option<CompareFunction>,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mip_filter: FilterMode::Linear,
            max_anisotropy: 1,
            compare: None,
        }
    }
}
