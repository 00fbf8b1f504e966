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

//! The fixed binding contract between the forward module and its shaders.
//!
//! Slot assignments and capacity ceilings here are bit-compatible with the
//! shader side and must not be reordered: constant buffers b0-b4, a 500-slot
//! bindless content texture array at t0, the IBL lookup textures at
//! t500-t502, the shadow block starting at t503, ten bindless sampler slots
//! at s0, and the static IBL/comparison samplers at s10-s13.

use bytemuck::{Pod, Zeroable};

/// Constant buffer slot for per-frame scene information.
pub const FRAME_INFO_SLOT: u32 = 0;
/// Constant buffer slot for per-instance information.
pub const INSTANCE_INFO_SLOT: u32 = 1;
/// Constant buffer slot for per-surface texture indices.
pub const TEXTURE_INDICES_SLOT: u32 = 2;
/// Constant buffer slot for scene lighting information.
pub const SCENE_LIGHTING_SLOT: u32 = 3;
/// Constant buffer slot for the IBL factor block.
pub const IBL_FACTORS_SLOT: u32 = 4;

/// Global ceiling on texture descriptors across all modules.
pub const MAX_TEXTURE_COUNT: usize = 1000;
/// Global ceiling on sampler descriptors across all modules.
pub const MAX_SAMPLER_COUNT: usize = 20;
/// Capacity of the shadow-map texture block.
pub const MAX_SHADOW_MAP_TEXTURES: usize = 15;

/// Number of bindless content texture slots owned by the forward module.
pub const BINDLESS_TEXTURE_SLOT_COUNT: u32 = (MAX_TEXTURE_COUNT / 2) as u32;
/// Number of bindless sampler slots owned by the forward module.
pub const BINDLESS_SAMPLER_SLOT_COUNT: u32 = (MAX_SAMPLER_COUNT / 2) as u32;

/// Texture slot of the BRDF lookup table.
pub const BRDF_LUT_SLOT: u32 = BINDLESS_TEXTURE_SLOT_COUNT;
/// Texture slot of the irradiance cubemap.
pub const IRRADIANCE_CUBE_SLOT: u32 = BRDF_LUT_SLOT + 1;
/// Texture slot of the prefiltered environment cubemap.
pub const PREFILTERED_CUBE_SLOT: u32 = BRDF_LUT_SLOT + 2;
/// First texture slot of the shadow-map block. A screen-space shadow
/// texture, when present, occupies this slot instead of the pool.
pub const SHADOW_MAP_BASE_SLOT: u32 = BRDF_LUT_SLOT + 3;

/// Static sampler slot for the prefiltered environment cubemap.
pub const PREFILTERED_SAMPLER_SLOT: u32 = 10;
/// Static sampler slot for the irradiance cubemap.
pub const IRRADIANCE_SAMPLER_SLOT: u32 = 11;
/// Static sampler slot for the BRDF lookup table.
pub const BRDF_SAMPLER_SLOT: u32 = 12;
/// Static comparison sampler slot for shadow sampling.
pub const COMPARISON_SAMPLER_SLOT: u32 = 13;

/// Sentinel index marking an unused texture or sampler slot reference.
pub const UNUSED_INDEX: i32 = -1;

/// Per-draw material constants embedded in [`InstanceInformation`].
///
/// Total size: 64 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialInformation {
    /// Emissive color factor.
    pub emissive_factor: [f32; 4],
    /// Base color factor.
    pub albedo_factor: [f32; 4],
    /// Workflow parameters: metallic/roughness or specular/glossiness.
    pub pbr_params: [f32; 4],
    /// Alpha cutoff for masked materials, 0.0 otherwise.
    pub alpha_cutoff: f32,
    /// Padding to a 16-byte boundary.
    pub _padding: [f32; 3],
}

impl Default for MaterialInformation {
    fn default() -> Self {
        Self {
            emissive_factor: [0.0; 4],
            albedo_factor: [1.0, 1.0, 1.0, 1.0],
            pbr_params: [0.0; 4],
            alpha_cutoff: 0.0,
            _padding: [0.0; 3],
        }
    }
}

/// Per-draw instance constants uploaded to [`INSTANCE_INFO_SLOT`].
///
/// Total size: 64 + 64 + 64 = 192 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceInformation {
    /// World transform of the owning entity.
    pub world_transform: [[f32; 4]; 4],
    /// Previous frame's world transform (motion vectors).
    pub prev_world_transform: [[f32; 4]; 4],
    /// Material constants.
    pub material: MaterialInformation,
}

impl Default for InstanceInformation {
    fn default() -> Self {
        Self {
            world_transform: [[0.0; 4]; 4],
            prev_world_transform: [[0.0; 4]; 4],
            material: MaterialInformation::default(),
        }
    }
}

/// Per-draw resolved bindless slot indices uploaded to [`TEXTURE_INDICES_SLOT`].
///
/// Metal-rough and spec-gloss share one slot pair; which texture it refers
/// to is implied by the pipeline's workflow define. [`UNUSED_INDEX`] marks
/// absent textures. Total size: 48 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct TextureIndices {
    /// Albedo texture slot.
    pub albedo_texture: i32,
    /// Albedo sampler slot.
    pub albedo_sampler: i32,
    /// Metal-rough or spec-gloss texture slot.
    pub metal_rough_spec_gloss_texture: i32,
    /// Metal-rough or spec-gloss sampler slot.
    pub metal_rough_spec_gloss_sampler: i32,
    /// Normal map texture slot.
    pub normal_texture: i32,
    /// Normal map sampler slot.
    pub normal_sampler: i32,
    /// Emissive texture slot.
    pub emissive_texture: i32,
    /// Emissive sampler slot.
    pub emissive_sampler: i32,
    /// Occlusion texture slot.
    pub occlusion_texture: i32,
    /// Occlusion sampler slot.
    pub occlusion_sampler: i32,
    /// Padding to a 16-byte boundary.
    pub _padding: [i32; 2],
}

impl Default for TextureIndices {
    fn default() -> Self {
        Self {
            albedo_texture: UNUSED_INDEX,
            albedo_sampler: UNUSED_INDEX,
            metal_rough_spec_gloss_texture: UNUSED_INDEX,
            metal_rough_spec_gloss_sampler: UNUSED_INDEX,
            normal_texture: UNUSED_INDEX,
            normal_sampler: UNUSED_INDEX,
            emissive_texture: UNUSED_INDEX,
            emissive_sampler: UNUSED_INDEX,
            occlusion_texture: UNUSED_INDEX,
            occlusion_sampler: UNUSED_INDEX,
            _padding: [0; 2],
        }
    }
}

/// The IBL factor block uploaded to [`IBL_FACTORS_SLOT`].
///
/// Total size: 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct IblFactors {
    /// Diffuse IBL intensity.
    pub ibl_factor: f32,
    /// Specular IBL intensity.
    pub specular_ibl_factor: f32,
    /// Padding to a 16-byte boundary.
    pub _padding: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_information_size() {
        assert_eq!(std::mem::size_of::<MaterialInformation>(), 64);
    }

    #[test]
    fn test_instance_information_size() {
        assert_eq!(std::mem::size_of::<InstanceInformation>(), 192);
        assert_eq!(std::mem::size_of::<InstanceInformation>() % 16, 0);
    }

    #[test]
    fn test_texture_indices_size_and_defaults() {
        assert_eq!(std::mem::size_of::<TextureIndices>(), 48);

        let indices = TextureIndices::default();
        assert_eq!(indices.albedo_texture, UNUSED_INDEX);
        assert_eq!(indices.occlusion_sampler, UNUSED_INDEX);
    }

    #[test]
    fn test_ibl_factors_size() {
        assert_eq!(std::mem::size_of::<IblFactors>(), 16);
    }

    #[test]
    fn test_binding_contract_slot_layout() {
        // The shader side depends on these exact values.
        assert_eq!(BINDLESS_TEXTURE_SLOT_COUNT, 500);
        assert_eq!(BRDF_LUT_SLOT, 500);
        assert_eq!(IRRADIANCE_CUBE_SLOT, 501);
        assert_eq!(PREFILTERED_CUBE_SLOT, 502);
        assert_eq!(SHADOW_MAP_BASE_SLOT, 503);
        assert_eq!(BINDLESS_SAMPLER_SLOT_COUNT, 10);
    }
}
