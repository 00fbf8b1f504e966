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

//! PBR materials in the metallic-roughness and specular-glossiness workflows.

use glam::{Vec3, Vec4};
use vesta_core::renderer::api::{SamplerDescriptor, TextureViewId};

/// Specifies how a material handles transparency.
///
/// - `Opaque`: no transparency calculations; the fast path.
/// - `Mask`: alpha testing against a cutoff; no sorting required.
/// - `Blend`: full alpha blending; such surfaces are translucent and are
///   skipped entirely by the forward opaque pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlendMode {
    /// The material is fully opaque.
    Opaque,
    /// Alpha testing with the given cutoff threshold (typically 0.5).
    Mask(f32),
    /// Full alpha blending.
    Blend,
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::Opaque
    }
}

/// The texture classes a material can bind.
///
/// `MetalRough` and `SpecGloss` are the workflow-specific classes; a material
/// carries at most one of them, and they share a shader binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum TextureClass {
    /// Base color (albedo).
    Albedo = 0,
    /// Metallic-roughness (metallic in B, roughness in G — glTF convention).
    MetalRough = 1,
    /// Specular-glossiness (specular in RGB, glossiness in A).
    SpecGloss = 2,
    /// Tangent-space normal map.
    Normal = 3,
    /// Emissive color.
    Emissive = 4,
    /// Ambient occlusion.
    Occlusion = 5,
}

impl TextureClass {
    /// Number of texture classes.
    pub const COUNT: usize = 6;

    /// The class's array index.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One texture binding of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialTexture {
    /// The texture view, owned by the content system.
    pub view: TextureViewId,
    /// The sampler configuration the texture wants.
    pub sampler: SamplerDescriptor,
    /// Which texture coordinate set (0 or 1) the texture reads.
    pub texcoord_set: u32,
}

/// The PBR shading workflow of a material.
///
/// Mutually exclusive; a material declares at most one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PbrWorkflow {
    /// The glTF 2.0 standard metallic-roughness model.
    MetallicRoughness {
        /// Metallic factor (0.0 = dielectric, 1.0 = metal).
        metallic: f32,
        /// Roughness factor (0.0 = smooth, 1.0 = rough).
        roughness: f32,
    },
    /// The legacy specular-glossiness model.
    SpecularGlossiness {
        /// Specular reflectance color.
        specular: Vec3,
        /// Glossiness factor (1.0 = smooth).
        glossiness: f32,
    },
}

impl PbrWorkflow {
    /// The workflow parameters packed for the shader: `[metallic, roughness,
    /// 0, 0]` or `[specular.xyz, glossiness]`.
    pub fn params(&self) -> [f32; 4] {
        match *self {
            PbrWorkflow::MetallicRoughness {
                metallic,
                roughness,
            } => [metallic, roughness, 0.0, 0.0],
            PbrWorkflow::SpecularGlossiness {
                specular,
                glossiness,
            } => [specular.x, specular.y, specular.z, glossiness],
        }
    }
}

/// A surface material: factors, workflow, blend state, and texture bindings.
#[derive(Debug)]
pub struct Material {
    /// Transparency handling.
    pub blend_mode: BlendMode,
    /// Double-sided materials disable face culling.
    pub double_sided: bool,
    /// Base color factor, multiplied with the albedo texture.
    pub albedo_factor: Vec4,
    /// Emissive color factor.
    pub emissive_factor: Vec4,
    /// The PBR workflow, if the material declares one.
    pub workflow: Option<PbrWorkflow>,
    textures: [Option<MaterialTexture>; TextureClass::COUNT],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Opaque,
            double_sided: false,
            albedo_factor: Vec4::ONE,
            emissive_factor: Vec4::ZERO,
            workflow: None,
            textures: [None; TextureClass::COUNT],
        }
    }
}

impl Material {
    /// Creates an opaque, untextured material with neutral factors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a texture for a class.
    pub fn set_texture(&mut self, class: TextureClass, texture: MaterialTexture) {
        self.textures[class.index()] = Some(texture);
    }

    /// The texture bound for a class, if any.
    pub fn texture(&self, class: TextureClass) -> Option<&MaterialTexture> {
        self.textures[class.index()].as_ref()
    }

    /// Whether the material requires blending and must be skipped by opaque passes.
    pub fn has_translucency(&self) -> bool {
        matches!(self.blend_mode, BlendMode::Blend)
    }

    /// Whether the material declares any PBR workflow.
    pub fn has_pbr_workflow(&self) -> bool {
        self.workflow.is_some()
    }

    /// Whether the material uses the metallic-roughness workflow.
    pub fn has_metallic_roughness(&self) -> bool {
        matches!(self.workflow, Some(PbrWorkflow::MetallicRoughness { .. }))
    }

    /// Whether the material uses the specular-glossiness workflow.
    pub fn has_specular_glossiness(&self) -> bool {
        matches!(self.workflow, Some(PbrWorkflow::SpecularGlossiness { .. }))
    }

    /// The packed workflow parameters, or zeros without a workflow.
    pub fn pbr_params(&self) -> [f32; 4] {
        self.workflow.map(|w| w.params()).unwrap_or([0.0; 4])
    }

    /// The alpha cutoff, or 0.0 for non-masked materials.
    pub fn alpha_cutoff(&self) -> f32 {
        match self.blend_mode {
            BlendMode::Mask(cutoff) => cutoff,
            _ => 0.0,
        }
    }
}

/// A weak handle to a material in a [`MaterialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// Flat storage for materials.
#[derive(Debug, Default)]
pub struct MaterialStore {
    materials: Vec<Material>,
}

impl MaterialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a material and returns its handle.
    pub fn add(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        id
    }

    /// Resolves a material handle.
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    /// Number of materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material_is_opaque_and_untextured() {
        let material = Material::new();
        assert!(!material.has_translucency());
        assert!(!material.has_pbr_workflow());
        assert_eq!(material.pbr_params(), [0.0; 4]);
        for class in [
            TextureClass::Albedo,
            TextureClass::MetalRough,
            TextureClass::SpecGloss,
            TextureClass::Normal,
            TextureClass::Emissive,
            TextureClass::Occlusion,
        ] {
            assert!(material.texture(class).is_none());
        }
    }

    #[test]
    fn test_blend_mode_translucency() {
        let mut material = Material::new();
        material.blend_mode = BlendMode::Mask(0.5);
        assert!(!material.has_translucency());
        assert_eq!(material.alpha_cutoff(), 0.5);

        material.blend_mode = BlendMode::Blend;
        assert!(material.has_translucency());
        assert_eq!(material.alpha_cutoff(), 0.0);
    }

    #[test]
    fn test_workflow_params_packing() {
        let mr = PbrWorkflow::MetallicRoughness {
            metallic: 1.0,
            roughness: 0.25,
        };
        assert_eq!(mr.params(), [1.0, 0.25, 0.0, 0.0]);

        let sg = PbrWorkflow::SpecularGlossiness {
            specular: Vec3::new(0.1, 0.2, 0.3),
            glossiness: 0.9,
        };
        assert_eq!(sg.params(), [0.1, 0.2, 0.3, 0.9]);
    }

    #[test]
    fn test_workflow_classification() {
        let mut material = Material::new();
        material.workflow = Some(PbrWorkflow::MetallicRoughness {
            metallic: 0.0,
            roughness: 1.0,
        });
        assert!(material.has_metallic_roughness());
        assert!(!material.has_specular_glossiness());
    }
}
