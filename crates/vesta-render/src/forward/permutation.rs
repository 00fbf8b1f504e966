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

//! The pipeline permutation cache of the forward module.
//!
//! Surfaces are grouped by shader permutation: the set of preprocessor
//! defines derived from their material and vertex attributes, hashed
//! together with the used attribute mask and the used attributes' vertex
//! formats into a 64-bit key. The group list is append-only — a group is
//! created lazily the first time a never-seen key appears, never removed
//! while the module lives (even when its surface list empties), and torn
//! down wholesale with the module.
//!
//! The forward shader is specialized to what each surface provides:
//! - POSITION must be present; NORMAL, TANGENT and COLOR0/1 are used
//!   whenever present; PREVIOUS_POSITION feeds motion vectors on animated
//!   meshes.
//! - A texture only contributes defines when the surface actually supplies
//!   the texture coordinate set it reads.
//! - The material workflow picks metallic-roughness over
//!   specular-glossiness if a material somehow declares both.

use crate::forward::constants::TextureIndices;
use std::hash::{BuildHasher, Hash, Hasher};
use vesta_core::renderer::api::{
    BindingLayoutId, CompareFunction, CullMode, DefineList, DepthStateDescriptor, FrontFace,
    InputLayoutEntry, PrimitiveTopology, RasterStateDescriptor, RenderPipelineDescriptor,
    RenderPipelineId, ShaderBuildDescriptor, TextureFormat,
};
use vesta_core::renderer::error::PipelineError;
use vesta_core::renderer::traits::GraphicsDevice;
use vesta_data::entity::EntityId;
use vesta_data::material::{BlendMode, Material, TextureClass};
use vesta_data::mesh::{MeshId, Surface, VertexAttribute, VertexAttributeFlags};

/// The forward shader source compiled into every permutation.
const FORWARD_SHADER_SOURCE: &str = "forward.wgsl";
/// Vertex entry point.
const FORWARD_VS_ENTRY: &str = "vs_main";
/// Fragment entry point.
const FORWARD_PS_ENTRY: &str = "fs_main";

/// Fixed seeds for the permutation hasher. Hashing must be stable within a
/// process so identical define sets always land in the same group.
const HASH_SEEDS: (u64, u64, u64, u64) = (
    0x7665_7374_6100_0001,
    0x666f_7277_6172_6400,
    0x7065_726d_7574_6174,
    0x696f_6e5f_6861_7368,
);

/// A weak reference to one surface of one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SurfaceRef {
    /// The mesh owning the surface.
    pub mesh: MeshId,
    /// The surface's position within the mesh.
    pub surface_index: u32,
}

/// Per-surface render data registered with a pipeline group.
///
/// Both references are weak: the entity lives in the scene's store, the
/// surface in the mesh's store. Content unload removes the record before
/// the owners disappear.
#[derive(Debug)]
pub(crate) struct PipelineSurfaceRenderInfo {
    /// The entity the surface was loaded for.
    pub owner: EntityId,
    /// The surface being drawn.
    pub surface: SurfaceRef,
    /// Resolved bindless slot indices for the surface's textures.
    pub texture_indices: TextureIndices,
}

/// One pipeline permutation and the surfaces drawn with it.
#[derive(Debug)]
pub(crate) struct PipelineRenderGroup {
    /// The compiled pipeline, exclusively owned by the group.
    pub pipeline: RenderPipelineId,
    /// The permutation key.
    pub pipeline_hash: u64,
    /// The vertex attributes the pipeline consumes.
    pub used_attributes: VertexAttributeFlags,
    /// Registered surfaces, in registration order.
    pub surfaces: Vec<PipelineSurfaceRenderInfo>,
}

/// Everything pipeline construction needs besides the surface itself.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PipelineBuildContext {
    /// The module's binding layout.
    pub binding_layout: BindingLayoutId,
    /// Format of the color target.
    pub color_format: TextureFormat,
    /// Format of the motion-vector target, when one exists.
    pub motion_vector_format: Option<TextureFormat>,
    /// Format of the depth target.
    pub depth_format: TextureFormat,
    /// Whether this module writes motion vectors.
    pub generate_motion_vectors: bool,
}

/// Derives the shader define set and used-attribute mask for a surface.
pub(crate) fn build_surface_defines(
    surface: &Surface,
    material: &Material,
    generate_motion_vectors: bool,
) -> (DefineList, VertexAttributeFlags) {
    let candidate = VertexAttributeFlags::POSITION
        | VertexAttributeFlags::NORMAL
        | VertexAttributeFlags::TANGENT
        | VertexAttributeFlags::COLOR0
        | VertexAttributeFlags::COLOR1
        | VertexAttributeFlags::PREVIOUS_POSITION;
    let surface_attributes = surface.attributes();
    let used = candidate & surface_attributes;

    let mut defines = DefineList::new();

    if generate_motion_vectors {
        defines.insert("HAS_MOTION_VECTORS", "1");
        defines.insert("MOTION_VECTORS_RT_INDEX", "1");
    }

    if material.has_pbr_workflow() {
        // Metallic-roughness wins if a material somehow declares both.
        if material.has_metallic_roughness() {
            defines.insert("MATERIAL_METALLIC_ROUGHNESS", "1");
            add_texture_defines(
                &mut defines,
                surface_attributes,
                material,
                TextureClass::Albedo,
                "HAS_ALBEDO_TEXTURE",
                "ALBEDO_TEXCOORD_SET",
            );
            add_texture_defines(
                &mut defines,
                surface_attributes,
                material,
                TextureClass::MetalRough,
                "HAS_METAL_ROUGH_TEXTURE",
                "METAL_ROUGH_TEXCOORD_SET",
            );
        } else if material.has_specular_glossiness() {
            defines.insert("MATERIAL_SPECULAR_GLOSSINESS", "1");
            add_texture_defines(
                &mut defines,
                surface_attributes,
                material,
                TextureClass::Albedo,
                "HAS_ALBEDO_TEXTURE",
                "ALBEDO_TEXCOORD_SET",
            );
            add_texture_defines(
                &mut defines,
                surface_attributes,
                material,
                TextureClass::SpecGloss,
                "HAS_SPEC_GLOSS_TEXTURE",
                "SPEC_GLOSS_TEXCOORD_SET",
            );
        }
    }

    // Evaluated independently of the workflow.
    add_texture_defines(
        &mut defines,
        surface_attributes,
        material,
        TextureClass::Normal,
        "HAS_NORMAL_TEXTURE",
        "NORMAL_TEXCOORD_SET",
    );
    add_texture_defines(
        &mut defines,
        surface_attributes,
        material,
        TextureClass::Emissive,
        "HAS_EMISSIVE_TEXTURE",
        "EMISSIVE_TEXCOORD_SET",
    );
    add_texture_defines(
        &mut defines,
        surface_attributes,
        material,
        TextureClass::Occlusion,
        "HAS_OCCLUSION_TEXTURE",
        "OCCLUSION_TEXCOORD_SET",
    );

    if material.double_sided {
        defines.insert("DOUBLE_SIDED", "1");
    }
    if matches!(material.blend_mode, BlendMode::Mask(_)) {
        defines.insert("ALPHA_MASK", "1");
    }

    for attribute in used.iter() {
        defines.insert(attribute_define(attribute), "1");
    }

    (defines, used)
}

/// Emits the presence/texcoord defines for one texture class, but only when
/// the texture exists and the surface supplies the coordinate set it reads.
fn add_texture_defines(
    defines: &mut DefineList,
    surface_attributes: VertexAttributeFlags,
    material: &Material,
    class: TextureClass,
    texture_define: &str,
    texcoord_define: &str,
) {
    let Some(texture) = material.texture(class) else {
        return;
    };
    let required = if texture.texcoord_set == 0 {
        VertexAttributeFlags::TEXCOORD0
    } else {
        VertexAttributeFlags::TEXCOORD1
    };
    if !surface_attributes.contains(required) {
        return;
    }
    defines.insert(texture_define, "1");
    defines.insert(texcoord_define, texture.texcoord_set.to_string());
}

fn attribute_define(attribute: VertexAttribute) -> &'static str {
    match attribute {
        VertexAttribute::Position => "HAS_POSITION",
        VertexAttribute::Normal => "HAS_NORMAL",
        VertexAttribute::Tangent => "HAS_TANGENT",
        VertexAttribute::Texcoord0 => "HAS_TEXCOORD_0",
        VertexAttribute::Texcoord1 => "HAS_TEXCOORD_1",
        VertexAttribute::Color0 => "HAS_COLOR_0",
        VertexAttribute::Color1 => "HAS_COLOR_1",
        VertexAttribute::PreviousPosition => "HAS_PREVIOUS_POSITION",
    }
}

/// Hashes a permutation into its 64-bit group key.
///
/// Covers the sorted define list, the used-attribute mask, and the vertex
/// formats of the used attributes (the part of the surface that feeds the
/// input layout). Surfaces agreeing on all three must share a pipeline;
/// surfaces differing in any must not silently collide.
pub(crate) fn permutation_hash(
    defines: &DefineList,
    used_attributes: VertexAttributeFlags,
    surface: &Surface,
) -> u64 {
    let (s0, s1, s2, s3) = HASH_SEEDS;
    let mut hasher = ahash::RandomState::with_seeds(s0, s1, s2, s3).build_hasher();

    for (name, value) in defines.iter() {
        name.hash(&mut hasher);
        value.hash(&mut hasher);
    }
    used_attributes.bits().hash(&mut hasher);
    for attribute in used_attributes.iter() {
        if let Some(buffer) = surface.vertex_buffer(attribute) {
            buffer.format.hash(&mut hasher);
        }
    }

    hasher.finish()
}

/// Returns the index of the pipeline group matching the surface's
/// permutation, compiling a new pipeline for a never-seen key.
///
/// Group lookup is a linear scan over the (small) group list. A hit returns
/// the existing index without touching its surface list — registration is
/// the caller's job.
pub(crate) fn get_or_create_pipeline(
    groups: &mut Vec<PipelineRenderGroup>,
    device: &dyn GraphicsDevice,
    ctx: &PipelineBuildContext,
    surface: &Surface,
    material: &Material,
) -> Result<usize, PipelineError> {
    let (defines, used) = build_surface_defines(surface, material, ctx.generate_motion_vectors);
    let hash = permutation_hash(&defines, used, surface);

    if let Some(index) = groups.iter().position(|g| g.pipeline_hash == hash) {
        return Ok(index);
    }

    // Never-seen permutation: build the pipeline.
    let mut input_layout = Vec::new();
    for attribute in used.iter() {
        let buffer = surface
            .vertex_buffer(attribute)
            .expect("used attribute not supplied by surface");
        let slot = input_layout.len() as u32;
        input_layout.push(InputLayoutEntry {
            shader_location: slot,
            format: buffer.format,
            buffer_slot: slot,
        });
    }

    let mut color_formats = vec![ctx.color_format];
    if ctx.generate_motion_vectors {
        if let Some(format) = ctx.motion_vector_format {
            color_formats.push(format);
        }
    }

    let descriptor = RenderPipelineDescriptor {
        label: Some(format!("forward-opaque-{hash:016x}")),
        binding_layout: ctx.binding_layout,
        vertex_shader: ShaderBuildDescriptor::new(FORWARD_SHADER_SOURCE, FORWARD_VS_ENTRY)
            .with_defines(defines.clone()),
        fragment_shader: ShaderBuildDescriptor::new(FORWARD_SHADER_SOURCE, FORWARD_PS_ENTRY)
            .with_defines(defines),
        input_layout,
        primitive_topology: PrimitiveTopology::TriangleList,
        raster_state: RasterStateDescriptor {
            cull_mode: if material.double_sided {
                CullMode::None
            } else {
                CullMode::Front
            },
            front_face: FrontFace::Ccw,
        },
        depth_state: Some(DepthStateDescriptor {
            format: ctx.depth_format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
        }),
        color_formats,
    };

    let pipeline = device.create_render_pipeline(&descriptor)?;
    log::debug!(
        "Compiled forward pipeline permutation {:016x} ({} attributes)",
        hash,
        used.iter().count()
    );

    groups.push(PipelineRenderGroup {
        pipeline,
        pipeline_hash: hash,
        used_attributes: used,
        surfaces: Vec::new(),
    });
    Ok(groups.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        material_with_textures, standard_attributes, surface_with_attributes, MockGraphicsDevice,
        TextureSpec,
    };
    use vesta_core::renderer::api::VertexFormat;
    use vesta_data::material::{MaterialId, PbrWorkflow};

    fn metal_rough_material(textures: &[TextureSpec]) -> Material {
        let mut material = material_with_textures(textures);
        material.workflow = Some(PbrWorkflow::MetallicRoughness {
            metallic: 1.0,
            roughness: 0.5,
        });
        material
    }

    fn build_context() -> PipelineBuildContext {
        PipelineBuildContext {
            binding_layout: BindingLayoutId(1),
            color_format: TextureFormat::Rgba16Float,
            motion_vector_format: Some(TextureFormat::Rg16Float),
            depth_format: TextureFormat::Depth32Float,
            generate_motion_vectors: false,
        }
    }

    #[test]
    fn test_used_mask_is_intersection_with_surface() {
        let surface = surface_with_attributes(0, MaterialId(0), &standard_attributes());
        let material = Material::new();

        let (_, used) = build_surface_defines(&surface, &material, false);
        assert_eq!(
            used,
            VertexAttributeFlags::POSITION
                | VertexAttributeFlags::NORMAL
                | VertexAttributeFlags::TANGENT
        );
        assert!(!used.contains_attribute(VertexAttribute::Texcoord0));
        assert!(!used.contains_attribute(VertexAttribute::Color0));
    }

    #[test]
    fn test_texture_define_requires_texcoord_attribute() {
        let material =
            metal_rough_material(&[TextureSpec::new(TextureClass::Albedo, 1)]);

        // Surface WITH texcoord0: the albedo texture contributes defines.
        let with_uv = surface_with_attributes(0, MaterialId(0), &standard_attributes());
        let (defines, _) = build_surface_defines(&with_uv, &material, false);
        assert!(defines.contains("HAS_ALBEDO_TEXTURE"));
        assert_eq!(defines.get("ALBEDO_TEXCOORD_SET"), Some("0"));

        // Surface WITHOUT texcoord0: the texture is ignored as a define.
        let without_uv = surface_with_attributes(
            1,
            MaterialId(0),
            &[(VertexAttribute::Position, VertexFormat::Float32x3)],
        );
        let (defines, _) = build_surface_defines(&without_uv, &material, false);
        assert!(!defines.contains("HAS_ALBEDO_TEXTURE"));
        assert!(!defines.contains("ALBEDO_TEXCOORD_SET"));
    }

    #[test]
    fn test_normal_emissive_occlusion_defines_without_workflow() {
        // No PBR workflow declared, but class textures still contribute.
        let material = material_with_textures(&[
            TextureSpec::new(TextureClass::Normal, 1),
            TextureSpec::new(TextureClass::Emissive, 2),
            TextureSpec::new(TextureClass::Occlusion, 3),
        ]);
        let surface = surface_with_attributes(0, MaterialId(0), &standard_attributes());

        let (defines, _) = build_surface_defines(&surface, &material, false);
        assert!(defines.contains("HAS_NORMAL_TEXTURE"));
        assert!(defines.contains("HAS_EMISSIVE_TEXTURE"));
        assert!(defines.contains("HAS_OCCLUSION_TEXTURE"));
        assert!(!defines.contains("MATERIAL_METALLIC_ROUGHNESS"));
        assert!(!defines.contains("HAS_ALBEDO_TEXTURE"));
    }

    #[test]
    fn test_motion_vector_defines_are_module_wide() {
        let surface = surface_with_attributes(0, MaterialId(0), &standard_attributes());
        let material = Material::new();

        let (without, _) = build_surface_defines(&surface, &material, false);
        assert!(!without.contains("HAS_MOTION_VECTORS"));

        let (with, _) = build_surface_defines(&surface, &material, true);
        assert!(with.contains("HAS_MOTION_VECTORS"));
    }

    #[test]
    fn test_alpha_mask_and_double_sided_defines() {
        let surface = surface_with_attributes(0, MaterialId(0), &standard_attributes());
        let mut material = Material::new();
        material.blend_mode = BlendMode::Mask(0.5);
        material.double_sided = true;

        let (defines, _) = build_surface_defines(&surface, &material, false);
        assert!(defines.contains("ALPHA_MASK"));
        assert!(defines.contains("DOUBLE_SIDED"));
    }

    #[test]
    fn test_hash_identical_for_identical_permutations() {
        let material = metal_rough_material(&[TextureSpec::new(TextureClass::Albedo, 1)]);
        let a = surface_with_attributes(0, MaterialId(0), &standard_attributes());
        let b = surface_with_attributes(1, MaterialId(0), &standard_attributes());

        let (defines_a, used_a) = build_surface_defines(&a, &material, false);
        let (defines_b, used_b) = build_surface_defines(&b, &material, false);
        assert_eq!(
            permutation_hash(&defines_a, used_a, &a),
            permutation_hash(&defines_b, used_b, &b)
        );
    }

    #[test]
    fn test_hash_differs_for_different_define_sets() {
        let surface = surface_with_attributes(0, MaterialId(0), &standard_attributes());
        let plain = Material::new();
        let textured = metal_rough_material(&[TextureSpec::new(TextureClass::Albedo, 1)]);

        let (defines_a, used_a) = build_surface_defines(&surface, &plain, false);
        let (defines_b, used_b) = build_surface_defines(&surface, &textured, false);
        assert_ne!(
            permutation_hash(&defines_a, used_a, &surface),
            permutation_hash(&defines_b, used_b, &surface)
        );
    }

    #[test]
    fn test_hash_ignores_attributes_absent_from_both_masks() {
        // Two surfaces differing only in an attribute that is in neither
        // used mask (texcoord0 present in data on one, absent on the other,
        // with no texture reading it) must share a group.
        let material = Material::new();
        let with_uv = surface_with_attributes(0, MaterialId(0), &standard_attributes());
        let without_uv = surface_with_attributes(
            1,
            MaterialId(0),
            &[
                (VertexAttribute::Position, VertexFormat::Float32x3),
                (VertexAttribute::Normal, VertexFormat::Float32x3),
                (VertexAttribute::Tangent, VertexFormat::Float32x4),
            ],
        );

        let (defines_a, used_a) = build_surface_defines(&with_uv, &material, false);
        let (defines_b, used_b) = build_surface_defines(&without_uv, &material, false);
        assert_eq!(used_a, used_b);
        assert_eq!(
            permutation_hash(&defines_a, used_a, &with_uv),
            permutation_hash(&defines_b, used_b, &without_uv)
        );
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let device = MockGraphicsDevice::new();
        let ctx = build_context();
        let mut groups = Vec::new();
        let material = metal_rough_material(&[TextureSpec::new(TextureClass::Albedo, 1)]);
        let surface = surface_with_attributes(0, MaterialId(0), &standard_attributes());

        let first = get_or_create_pipeline(&mut groups, &device, &ctx, &surface, &material).unwrap();
        let second =
            get_or_create_pipeline(&mut groups, &device, &ctx, &surface, &material).unwrap();

        assert_eq!(first, second);
        assert_eq!(groups.len(), 1);
        assert_eq!(device.pipelines_created(), 1);
        assert!(groups[first].surfaces.is_empty(), "lookup must not register surfaces");
    }

    #[test]
    fn test_different_permutations_get_different_groups() {
        let device = MockGraphicsDevice::new();
        let ctx = build_context();
        let mut groups = Vec::new();
        let surface = surface_with_attributes(0, MaterialId(0), &standard_attributes());

        let plain = Material::new();
        let mut double_sided = Material::new();
        double_sided.double_sided = true;

        let a = get_or_create_pipeline(&mut groups, &device, &ctx, &surface, &plain).unwrap();
        let b = get_or_create_pipeline(&mut groups, &device, &ctx, &surface, &double_sided).unwrap();

        assert_ne!(a, b);
        assert_eq!(groups.len(), 2);
        assert_eq!(device.pipelines_created(), 2);
    }

    #[test]
    fn test_input_layout_order_follows_attribute_indices() {
        let device = MockGraphicsDevice::new();
        let ctx = build_context();
        let mut groups = Vec::new();
        let surface = surface_with_attributes(0, MaterialId(0), &standard_attributes());
        let index =
            get_or_create_pipeline(&mut groups, &device, &ctx, &surface, &Material::new()).unwrap();

        // Position, Normal, Tangent in ascending attribute order.
        assert_eq!(
            groups[index].used_attributes,
            VertexAttributeFlags::POSITION
                | VertexAttributeFlags::NORMAL
                | VertexAttributeFlags::TANGENT
        );
    }
}
