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

//! Content synchronization: registering and releasing surfaces as geometry
//! streams in and out of the scene.
//!
//! Both handlers run under the module's single state lock for the whole
//! batch, so a concurrent frame can never observe a partially constructed
//! group. The forward pass only handles opaques; translucent surfaces are
//! skipped at registration and therefore silently absent at unload.

use crate::forward::bindless::BindlessTable;
use crate::forward::constants::TextureIndices;
use crate::forward::permutation::{get_or_create_pipeline, PipelineSurfaceRenderInfo, SurfaceRef};
use crate::forward::ForwardRenderModule;
use vesta_core::renderer::error::ResourceError;
use vesta_core::renderer::traits::GraphicsDevice;
use vesta_data::content::{ContentBlock, ContentListener};
use vesta_data::material::{Material, TextureClass};
use vesta_data::scene::Scene;

/// Resolves the up-to-five texture/sampler slot pairs for a surface's material.
///
/// Albedo and the workflow texture are only resolved for materials that
/// declare a PBR workflow; normal, emissive and occlusion are always
/// attempted. On a backend error every slot acquired so far is released
/// again, leaving the table unchanged.
fn resolve_texture_indices(
    bindless: &mut BindlessTable,
    device: &dyn GraphicsDevice,
    material: &Material,
) -> Result<TextureIndices, ResourceError> {
    let mut indices = TextureIndices::default();

    let result = (|| -> Result<(), ResourceError> {
        if material.has_pbr_workflow() {
            let (texture, sampler) = bindless.add_texture(device, material, TextureClass::Albedo)?;
            indices.albedo_texture = texture;
            indices.albedo_sampler = sampler;

            if material.has_metallic_roughness() {
                let (texture, sampler) =
                    bindless.add_texture(device, material, TextureClass::MetalRough)?;
                indices.metal_rough_spec_gloss_texture = texture;
                indices.metal_rough_spec_gloss_sampler = sampler;
            } else if material.has_specular_glossiness() {
                let (texture, sampler) =
                    bindless.add_texture(device, material, TextureClass::SpecGloss)?;
                indices.metal_rough_spec_gloss_texture = texture;
                indices.metal_rough_spec_gloss_sampler = sampler;
            }
        }

        let (texture, sampler) = bindless.add_texture(device, material, TextureClass::Normal)?;
        indices.normal_texture = texture;
        indices.normal_sampler = sampler;

        let (texture, sampler) = bindless.add_texture(device, material, TextureClass::Emissive)?;
        indices.emissive_texture = texture;
        indices.emissive_sampler = sampler;

        let (texture, sampler) = bindless.add_texture(device, material, TextureClass::Occlusion)?;
        indices.occlusion_texture = texture;
        indices.occlusion_sampler = sampler;

        Ok(())
    })();

    match result {
        Ok(()) => Ok(indices),
        Err(e) => {
            release_texture_indices(bindless, &indices);
            Err(e)
        }
    }
}

/// Releases every slot referenced by `indices` (sentinel-tolerant).
pub(crate) fn release_texture_indices(bindless: &mut BindlessTable, indices: &TextureIndices) {
    bindless.remove_texture(indices.albedo_texture);
    bindless.remove_texture(indices.metal_rough_spec_gloss_texture);
    bindless.remove_texture(indices.normal_texture);
    bindless.remove_texture(indices.emissive_texture);
    bindless.remove_texture(indices.occlusion_texture);
}

impl ContentListener for ForwardRenderModule {
    fn on_content_loaded(&self, block: &ContentBlock, scene: &Scene) {
        let build_ctx = self.pipeline_build_context();
        let device = self.device.as_ref();

        let mut guard = self.state.lock().expect("forward module state poisoned");
        let state = &mut *guard;

        let mut registered = 0usize;
        for instance in &block.mesh_instances {
            let Some(mesh) = scene.meshes.get(instance.mesh) else {
                continue;
            };
            for (surface_index, surface) in mesh.surfaces().iter().enumerate() {
                let Some(material) = scene.materials.get(surface.material) else {
                    continue;
                };
                // Forward only handles opaques.
                if material.has_translucency() {
                    continue;
                }

                let texture_indices =
                    match resolve_texture_indices(&mut state.bindless, device, material) {
                        Ok(indices) => indices,
                        Err(e) => {
                            log::error!(
                                "Skipping surface {}: failed to register textures: {e}",
                                surface.surface_id()
                            );
                            continue;
                        }
                    };

                let group_index = match get_or_create_pipeline(
                    &mut state.groups,
                    device,
                    &build_ctx,
                    surface,
                    material,
                ) {
                    Ok(index) => index,
                    Err(e) => {
                        log::error!(
                            "Skipping surface {}: failed to build pipeline: {e}",
                            surface.surface_id()
                        );
                        release_texture_indices(&mut state.bindless, &texture_indices);
                        continue;
                    }
                };

                state.groups[group_index]
                    .surfaces
                    .push(PipelineSurfaceRenderInfo {
                        owner: instance.entity,
                        surface: SurfaceRef {
                            mesh: instance.mesh,
                            surface_index: surface_index as u32,
                        },
                        texture_indices,
                    });
                registered += 1;
            }
        }

        // Loaded textures only become visible to the shader through a full
        // republish of the bindless table.
        state.bindless.publish(&mut state.params);

        log::debug!(
            "Forward module registered {registered} surfaces ({} pipeline groups, {} textures)",
            state.groups.len(),
            state.bindless.texture_count()
        );
    }

    fn on_content_unloaded(&self, block: &ContentBlock, scene: &Scene) {
        let mut guard = self.state.lock().expect("forward module state poisoned");
        let state = &mut *guard;

        for instance in &block.mesh_instances {
            let Some(mesh) = scene.meshes.get(instance.mesh) else {
                continue;
            };
            for surface_index in 0..mesh.surfaces().len() {
                let target = SurfaceRef {
                    mesh: instance.mesh,
                    surface_index: surface_index as u32,
                };

                // A surface belongs to exactly one group; stop at the first
                // match. Surfaces never registered (translucent, or already
                // removed) are silently ignored.
                for group in state.groups.iter_mut() {
                    if let Some(position) = group
                        .surfaces
                        .iter()
                        .position(|info| info.owner == instance.entity && info.surface == target)
                    {
                        let info = group.surfaces.remove(position);
                        release_texture_indices(&mut state.bindless, &info.texture_indices);
                        break;
                    }
                }
            }
        }

        state.bindless.publish(&mut state.params);
    }
}
