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

//! Resource binding layouts and the persistent [`ParameterSet`] binding table.

use crate::renderer::api::buffer::BufferAddressInfo;
use crate::renderer::api::texture::{SamplerDescriptor, SamplerId, TextureViewId, ViewDimension};

/// Flags representing which shader stages can access a resource binding.
///
/// Multiple stages can be combined using bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderStageFlags {
    bits: u32,
}

impl ShaderStageFlags {
    /// No shader stages.
    pub const NONE: Self = Self { bits: 0 };
    /// Vertex shader stage.
    pub const VERTEX: Self = Self { bits: 1 << 0 };
    /// Fragment shader stage.
    pub const FRAGMENT: Self = Self { bits: 1 << 1 };
    /// All graphics stages (vertex + fragment).
    pub const VERTEX_FRAGMENT: Self = Self {
        bits: Self::VERTEX.bits | Self::FRAGMENT.bits,
    };

    /// Creates a new set of shader stage flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if these flags contain all flags of `other`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for ShaderStageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ShaderStageFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// An opaque handle to a binding layout (the root-signature analogue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingLayoutId(pub usize);

/// A constant buffer binding slot within a [`BindingLayoutDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBufferBinding {
    /// The constant buffer slot index.
    pub slot: u32,
    /// The shader stages that can read the buffer.
    pub visibility: ShaderStageFlags,
}

/// A contiguous range of texture SRV slots within a [`BindingLayoutDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSrvRange {
    /// The first slot of the range.
    pub base_slot: u32,
    /// The number of slots in the range.
    pub count: u32,
    /// The shader stages that can sample the textures.
    pub visibility: ShaderStageFlags,
}

/// A contiguous range of dynamic sampler slots within a [`BindingLayoutDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerRange {
    /// The first slot of the range.
    pub base_slot: u32,
    /// The number of slots in the range.
    pub count: u32,
}

/// A sampler baked immutably into a binding layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticSampler {
    /// The sampler slot the static sampler occupies.
    pub slot: u32,
    /// The sampler configuration.
    pub descriptor: SamplerDescriptor,
}

/// Describes the full set of resource bindings a pipeline can access.
#[derive(Debug, Clone, Default)]
pub struct BindingLayoutDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Constant buffer slots.
    pub constant_buffers: Vec<ConstantBufferBinding>,
    /// Texture SRV slot ranges.
    pub texture_srvs: Vec<TextureSrvRange>,
    /// Dynamic sampler slot ranges.
    pub samplers: Vec<SamplerRange>,
    /// Samplers baked into the layout.
    pub static_samplers: Vec<StaticSampler>,
}

impl BindingLayoutDescriptor {
    /// Creates an empty layout with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    /// Adds a constant buffer slot.
    pub fn add_constant_buffer(&mut self, slot: u32, visibility: ShaderStageFlags) {
        self.constant_buffers
            .push(ConstantBufferBinding { slot, visibility });
    }

    /// Adds a contiguous texture SRV range.
    pub fn add_texture_srv_range(&mut self, base_slot: u32, count: u32, visibility: ShaderStageFlags) {
        self.texture_srvs.push(TextureSrvRange {
            base_slot,
            count,
            visibility,
        });
    }

    /// Adds a contiguous dynamic sampler range.
    pub fn add_sampler_range(&mut self, base_slot: u32, count: u32) {
        self.samplers.push(SamplerRange { base_slot, count });
    }

    /// Adds a static sampler at a fixed slot.
    pub fn add_static_sampler(&mut self, slot: u32, descriptor: SamplerDescriptor) {
        self.static_samplers.push(StaticSampler { slot, descriptor });
    }

    /// Total number of texture SRV slots addressed by the layout
    /// (the highest `base + count` over all ranges).
    pub fn texture_srv_slot_count(&self) -> u32 {
        self.texture_srvs
            .iter()
            .map(|range| range.base_slot + range.count)
            .max()
            .unwrap_or(0)
    }

    /// Total number of dynamic sampler slots addressed by the layout.
    pub fn sampler_slot_count(&self) -> u32 {
        self.samplers
            .iter()
            .map(|range| range.base_slot + range.count)
            .max()
            .unwrap_or(0)
    }

    /// Number of constant buffer slots (the highest slot index plus one).
    pub fn constant_buffer_count(&self) -> u32 {
        self.constant_buffers
            .iter()
            .map(|binding| binding.slot + 1)
            .max()
            .unwrap_or(0)
    }
}

/// A texture SRV entry held by a [`ParameterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSrvEntry {
    /// The bound view, or `None` for an explicitly nulled slot.
    pub view: Option<TextureViewId>,
    /// The dimensionality the shader sees.
    pub dimension: ViewDimension,
}

/// A persistent, CPU-side resource binding table.
///
/// A `ParameterSet` is created against a [`BindingLayoutDescriptor`] and
/// holds the current contents of every addressable slot: texture SRVs,
/// dynamic samplers, and the per-draw constant buffer addresses. Binding it
/// on a [`CommandList`](crate::renderer::traits::CommandList) applies the
/// whole table for subsequent draws.
///
/// Slots may be rewritten at any time, including with `None` views: callers
/// that manage dense slot arrays republish every slot — nulls included —
/// rather than issuing partial updates.
#[derive(Debug)]
pub struct ParameterSet {
    textures: Vec<Option<TextureSrvEntry>>,
    samplers: Vec<Option<SamplerId>>,
    constant_buffers: Vec<Option<BufferAddressInfo>>,
}

impl ParameterSet {
    /// Creates a parameter set sized for the given layout.
    pub fn new(layout: &BindingLayoutDescriptor) -> Self {
        Self {
            textures: vec![None; layout.texture_srv_slot_count() as usize],
            samplers: vec![None; layout.sampler_slot_count() as usize],
            constant_buffers: vec![None; layout.constant_buffer_count() as usize],
        }
    }

    /// Writes a texture SRV slot. `None` nulls the slot out explicitly.
    ///
    /// Slot indices outside the layout are a logic error.
    pub fn set_texture_srv(&mut self, slot: u32, view: Option<TextureViewId>, dimension: ViewDimension) {
        let slot = slot as usize;
        assert!(
            slot < self.textures.len(),
            "texture SRV slot {} outside binding layout ({} slots)",
            slot,
            self.textures.len()
        );
        self.textures[slot] = Some(TextureSrvEntry { view, dimension });
    }

    /// Writes a dynamic sampler slot.
    pub fn set_sampler(&mut self, slot: u32, sampler: SamplerId) {
        let slot = slot as usize;
        assert!(
            slot < self.samplers.len(),
            "sampler slot {} outside binding layout ({} slots)",
            slot,
            self.samplers.len()
        );
        self.samplers[slot] = Some(sampler);
    }

    /// Updates the buffer address bound at a constant buffer slot.
    pub fn update_constant_buffer(&mut self, index: u32, address: BufferAddressInfo) {
        let index = index as usize;
        assert!(
            index < self.constant_buffers.len(),
            "constant buffer index {} outside binding layout ({} slots)",
            index,
            self.constant_buffers.len()
        );
        self.constant_buffers[index] = Some(address);
    }

    /// The entry written at a texture SRV slot, if any write has happened.
    pub fn texture_srv(&self, slot: u32) -> Option<TextureSrvEntry> {
        self.textures.get(slot as usize).copied().flatten()
    }

    /// The sampler bound at a slot, if any.
    pub fn sampler(&self, slot: u32) -> Option<SamplerId> {
        self.samplers.get(slot as usize).copied().flatten()
    }

    /// The buffer address bound at a constant buffer slot, if any.
    pub fn constant_buffer(&self, index: u32) -> Option<BufferAddressInfo> {
        self.constant_buffers.get(index as usize).copied().flatten()
    }

    /// Number of addressable texture SRV slots.
    pub fn texture_srv_slot_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of addressable dynamic sampler slots.
    pub fn sampler_slot_count(&self) -> usize {
        self.samplers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_layout() -> BindingLayoutDescriptor {
        let mut layout = BindingLayoutDescriptor::new("test-layout");
        layout.add_constant_buffer(0, ShaderStageFlags::VERTEX_FRAGMENT);
        layout.add_constant_buffer(1, ShaderStageFlags::FRAGMENT);
        layout.add_texture_srv_range(0, 4, ShaderStageFlags::FRAGMENT);
        layout.add_texture_srv_range(4, 2, ShaderStageFlags::FRAGMENT);
        layout.add_sampler_range(0, 2);
        layout
    }

    #[test]
    fn test_layout_slot_counts() {
        let layout = test_layout();
        assert_eq!(layout.texture_srv_slot_count(), 6);
        assert_eq!(layout.sampler_slot_count(), 2);
        assert_eq!(layout.constant_buffer_count(), 2);
    }

    #[test]
    fn test_parameter_set_starts_unwritten() {
        let params = ParameterSet::new(&test_layout());
        assert!(params.texture_srv(0).is_none());
        assert!(params.sampler(0).is_none());
        assert!(params.constant_buffer(0).is_none());
    }

    #[test]
    fn test_parameter_set_records_null_writes() {
        let mut params = ParameterSet::new(&test_layout());
        params.set_texture_srv(3, None, ViewDimension::D2);

        // An explicit null write is distinguishable from a never-written slot.
        let entry = params.texture_srv(3).expect("slot was written");
        assert!(entry.view.is_none());
        assert!(params.texture_srv(2).is_none());
    }

    #[test]
    fn test_parameter_set_overwrites_slots() {
        let mut params = ParameterSet::new(&test_layout());
        params.set_texture_srv(1, Some(TextureViewId(7)), ViewDimension::D2);
        params.set_texture_srv(1, Some(TextureViewId(9)), ViewDimension::Cube);

        let entry = params.texture_srv(1).unwrap();
        assert_eq!(entry.view, Some(TextureViewId(9)));
        assert_eq!(entry.dimension, ViewDimension::Cube);
    }

    #[test]
    #[should_panic(expected = "outside binding layout")]
    fn test_parameter_set_out_of_range_slot_panics() {
        let mut params = ParameterSet::new(&test_layout());
        params.set_texture_srv(6, Some(TextureViewId(1)), ViewDimension::D2);
    }

    #[test]
    fn test_shader_stage_flags_union() {
        let flags = ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT;
        assert_eq!(flags, ShaderStageFlags::VERTEX_FRAGMENT);
        assert!(flags.contains(ShaderStageFlags::VERTEX));
    }
}
