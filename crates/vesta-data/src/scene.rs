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

//! The scene accessor: stores, per-frame GPU constants, and environment textures.

use crate::entity::EntityStore;
use crate::material::MaterialStore;
use crate::mesh::MeshStore;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use vesta_core::renderer::api::TextureViewId;

/// Maximum number of lights carried in the scene lighting constants.
pub const MAX_SCENE_LIGHTS: usize = 8;

/// Per-frame camera constants uploaded to the frame-information slot.
///
/// Total size: 64 + 64 + 16 = 144 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneInformation {
    /// Camera view-projection matrix.
    pub view_projection: [[f32; 4]; 4],
    /// Previous frame's view-projection matrix (motion vectors).
    pub prev_view_projection: [[f32; 4]; 4],
    /// Camera position in world space (w unused).
    pub camera_position: [f32; 4],
}

impl Default for SceneInformation {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY.to_cols_array_2d(),
            prev_view_projection: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0; 4],
        }
    }
}

/// GPU-friendly representation of a light source.
///
/// A unified layout representing all light types. Total size: 48 bytes
/// (12 × 4-byte fields).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// Light color (RGB, linear space).
    pub color: [f32; 3],
    /// Light intensity multiplier.
    pub intensity: f32,
    /// Light direction (normalized, for directional/spot lights).
    pub direction: [f32; 3],
    /// Light type: 0 = directional, 1 = point, 2 = spot.
    pub light_type: u32,
    /// Light position in world space (ignored for directional lights).
    pub position: [f32; 3],
    /// Maximum range of the light (point/spot lights only).
    pub range: f32,
}

impl GpuLight {
    /// Light type constant for directional lights.
    pub const TYPE_DIRECTIONAL: u32 = 0;
    /// Light type constant for point lights.
    pub const TYPE_POINT: u32 = 1;
    /// Light type constant for spot lights.
    pub const TYPE_SPOT: u32 = 2;
}

impl Default for GpuLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            direction: [0.0, -1.0, 0.0],
            light_type: Self::TYPE_DIRECTIONAL,
            position: [0.0; 3],
            range: 0.0,
        }
    }
}

/// Per-frame lighting constants uploaded to the scene-lighting slot.
///
/// Total size: 16 + 8 × 48 = 400 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneLightingInformation {
    /// Number of active entries in `lights`.
    pub light_count: u32,
    /// Padding for 16-byte alignment of the array.
    pub _padding: [u32; 3],
    /// The light array; entries past `light_count` are ignored.
    pub lights: [GpuLight; MAX_SCENE_LIGHTS],
}

impl Default for SceneLightingInformation {
    fn default() -> Self {
        Self {
            light_count: 0,
            _padding: [0; 3],
            lights: [GpuLight::default(); MAX_SCENE_LIGHTS],
        }
    }
}

/// The world as render modules see it.
///
/// Owns the entity/mesh/material stores, the per-frame constant blocks, the
/// image-based-lighting environment textures, and the shadow sources. All
/// texture views here are owned by the content system; the scene only hands
/// out handles.
#[derive(Debug, Default)]
pub struct Scene {
    /// Entity storage.
    pub entities: EntityStore,
    /// Mesh storage.
    pub meshes: MeshStore,
    /// Material storage.
    pub materials: MaterialStore,
    scene_info: SceneInformation,
    lighting_info: SceneLightingInformation,
    ibl_factor: f32,
    specular_ibl_factor: f32,
    brdf_lut: Option<TextureViewId>,
    irradiance_cube: Option<TextureViewId>,
    prefiltered_cube: Option<TextureViewId>,
    screen_space_shadow: Option<TextureViewId>,
    shadow_maps: Vec<TextureViewId>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self {
            ibl_factor: 1.0,
            specular_ibl_factor: 1.0,
            ..Default::default()
        }
    }

    /// The camera constants for the current frame.
    pub fn scene_info(&self) -> &SceneInformation {
        &self.scene_info
    }

    /// Updates the camera constants.
    pub fn set_scene_info(&mut self, info: SceneInformation) {
        self.scene_info = info;
    }

    /// The lighting constants for the current frame.
    pub fn scene_lighting_info(&self) -> &SceneLightingInformation {
        &self.lighting_info
    }

    /// Updates the lighting constants.
    pub fn set_scene_lighting_info(&mut self, info: SceneLightingInformation) {
        self.lighting_info = info;
    }

    /// Diffuse IBL intensity factor.
    pub fn ibl_factor(&self) -> f32 {
        self.ibl_factor
    }

    /// Specular IBL intensity factor.
    pub fn specular_ibl_factor(&self) -> f32 {
        self.specular_ibl_factor
    }

    /// Sets the IBL intensity factors.
    pub fn set_ibl_factors(&mut self, ibl: f32, specular_ibl: f32) {
        self.ibl_factor = ibl;
        self.specular_ibl_factor = specular_ibl;
    }

    /// The BRDF lookup table, when the environment provides one.
    pub fn brdf_lut(&self) -> Option<TextureViewId> {
        self.brdf_lut
    }

    /// Sets the BRDF lookup table.
    pub fn set_brdf_lut(&mut self, view: Option<TextureViewId>) {
        self.brdf_lut = view;
    }

    /// The irradiance cubemap, when the environment provides one.
    pub fn irradiance_cube(&self) -> Option<TextureViewId> {
        self.irradiance_cube
    }

    /// Sets the irradiance cubemap.
    pub fn set_irradiance_cube(&mut self, view: Option<TextureViewId>) {
        self.irradiance_cube = view;
    }

    /// The prefiltered environment cubemap, when present.
    pub fn prefiltered_cube(&self) -> Option<TextureViewId> {
        self.prefiltered_cube
    }

    /// Sets the prefiltered environment cubemap.
    pub fn set_prefiltered_cube(&mut self, view: Option<TextureViewId>) {
        self.prefiltered_cube = view;
    }

    /// The screen-space shadow texture, when a screen-space pass produced one.
    ///
    /// When present it takes precedence over the shadow-map pool.
    pub fn screen_space_shadow(&self) -> Option<TextureViewId> {
        self.screen_space_shadow
    }

    /// Sets the screen-space shadow texture.
    pub fn set_screen_space_shadow(&mut self, view: Option<TextureViewId>) {
        self.screen_space_shadow = view;
    }

    /// The precomputed shadow-map render targets.
    pub fn shadow_maps(&self) -> &[TextureViewId] {
        &self.shadow_maps
    }

    /// Replaces the shadow-map pool.
    pub fn set_shadow_maps(&mut self, views: Vec<TextureViewId>) {
        self.shadow_maps = views;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_information_size() {
        assert_eq!(std::mem::size_of::<SceneInformation>(), 144);
        assert_eq!(std::mem::size_of::<SceneInformation>() % 16, 0);
    }

    #[test]
    fn test_gpu_light_size() {
        // 12 x 4-byte fields, no implicit padding.
        assert_eq!(std::mem::size_of::<GpuLight>(), 48);
    }

    #[test]
    fn test_scene_lighting_information_size() {
        assert_eq!(
            std::mem::size_of::<SceneLightingInformation>(),
            16 + MAX_SCENE_LIGHTS * 48
        );
        assert_eq!(std::mem::size_of::<SceneLightingInformation>() % 16, 0);
    }

    #[test]
    fn test_new_scene_has_neutral_ibl_factors() {
        let scene = Scene::new();
        assert_eq!(scene.ibl_factor(), 1.0);
        assert_eq!(scene.specular_ibl_factor(), 1.0);
        assert!(scene.brdf_lut().is_none());
        assert!(scene.shadow_maps().is_empty());
    }
}
