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

//! The forward opaque geometry render module.
//!
//! Draws every opaque surface of the scene in one forward pass, grouped by
//! shader/pipeline permutation. The module owns three cooperating pieces:
//!
//! - a bindless texture/sampler table ([`bindless`]) mapping content
//!   textures to small slot indices with reference counting;
//! - a pipeline permutation cache ([`permutation`]) compiling one pipeline
//!   per observed combination of material features and vertex attributes;
//! - content synchronization ([`content`]) reacting to load/unload
//!   notifications from the loader thread.
//!
//! A single mutex serializes content synchronization against frame
//! submission: pipeline groups and their surface lists are only ever read
//! or written under it, so a frame can never observe a half-registered
//! batch.
//!
//! Translucent surfaces, shadow rendering and skinning computation are out
//! of scope: blending surfaces are skipped at registration, shadow maps
//! arrive as precomputed textures, and skinned vertex streams are consumed
//! ready-made from the entity's skin component.

mod bindless;
pub mod constants;
mod content;
mod permutation;

use crate::forward::bindless::BindlessTable;
use crate::forward::constants::{
    IblFactors, InstanceInformation, MaterialInformation, BINDLESS_SAMPLER_SLOT_COUNT,
    BINDLESS_TEXTURE_SLOT_COUNT, BRDF_LUT_SLOT, BRDF_SAMPLER_SLOT, COMPARISON_SAMPLER_SLOT,
    FRAME_INFO_SLOT, IBL_FACTORS_SLOT, INSTANCE_INFO_SLOT, IRRADIANCE_CUBE_SLOT,
    IRRADIANCE_SAMPLER_SLOT, MAX_SHADOW_MAP_TEXTURES, PREFILTERED_CUBE_SLOT,
    PREFILTERED_SAMPLER_SLOT, SCENE_LIGHTING_SLOT, SHADOW_MAP_BASE_SLOT, TEXTURE_INDICES_SLOT,
};
use crate::forward::permutation::{PipelineBuildContext, PipelineRenderGroup};
use serde::Deserialize;
use std::sync::{Arc, Mutex, OnceLock};
use vesta_core::renderer::api::{
    Barrier, BindingLayoutDescriptor, BindingLayoutId, BufferAddressInfo, CompareFunction,
    DynamicBufferPool, FilterMode, ParameterSet, PrimitiveTopology, RenderTarget, ResourceState,
    SamplerDescriptor, ShaderStageFlags, TextureViewId, ViewDimension,
};
use vesta_core::renderer::error::{PipelineError, ResourceError};
use vesta_core::renderer::traits::{CommandList, GraphicsDevice};
use vesta_data::content::{ContentManager, ListenerId};
use vesta_data::mesh::VertexAttribute;
use vesta_data::scene::Scene;

/// Per-frame budget of the module's dynamic constant pool.
const DYNAMIC_CONSTANTS_BYTES_PER_FRAME: u64 = 2 * 1024 * 1024;

/// Clear color for the color and motion-vector targets.
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Errors surfaced by forward module construction and frame recording.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// A backend resource operation failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// Pipeline or shader compilation failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Which pass produces motion vectors, selected globally per render technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum MotionVectorGeneration {
    /// No motion vectors are produced.
    #[default]
    Disabled,
    /// The forward pass writes motion vectors alongside color.
    ForwardPass,
    /// A dedicated velocity pass produces them; the forward pass does not.
    DedicatedPass,
}

/// Framework-wide rendering configuration the module reads at construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Which pass generates motion vectors.
    pub motion_vector_generation: MotionVectorGeneration,
    /// Whether the depth convention is inverted (near = 1).
    pub inverted_depth: bool,
}

/// Module-local configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ForwardModuleConfig {
    /// Attach per-draw variable-rate-shading information to the raster scope.
    pub variable_shading: bool,
}

/// The render targets the module draws into.
#[derive(Debug, Clone)]
pub struct ForwardTargets {
    /// The color target.
    pub color: RenderTarget,
    /// The motion-vector target; required when the module generates motion vectors.
    pub motion_vectors: Option<RenderTarget>,
    /// The depth target.
    pub depth: RenderTarget,
    /// Shading-rate image for variable-rate shading, when the device has one.
    pub shading_rate_image: Option<TextureViewId>,
}

/// Where the frame sits relative to a resolution upscaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpscalerState {
    /// No upscaler is active.
    None,
    /// Upscaling is active and has not run yet: render at render resolution.
    PreUpscale,
    /// Upscaling has already been applied: render at display resolution.
    PostUpscale,
}

/// Render and display resolutions for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionInfo {
    /// Pre-upscale render width.
    pub render_width: u32,
    /// Pre-upscale render height.
    pub render_height: u32,
    /// Final presentation width.
    pub display_width: u32,
    /// Final presentation height.
    pub display_height: u32,
}

/// Everything frame submission needs from the embedding frame loop.
#[derive(Debug)]
pub struct FrameContext<'a> {
    /// The scene being drawn.
    pub scene: &'a Scene,
    /// Upscaler progress for viewport selection.
    pub upscaler_state: UpscalerState,
    /// Current resolutions.
    pub resolution: ResolutionInfo,
}

/// State guarded by the module's single lock.
///
/// Content synchronization mutates it from the loader thread; frame
/// submission reads it on the render thread. Everything that either side
/// touches lives here.
pub(crate) struct ForwardState {
    pub params: ParameterSet,
    pub pool: DynamicBufferPool,
    pub bindless: BindlessTable,
    pub groups: Vec<PipelineRenderGroup>,
}

/// The forward opaque geometry render module.
///
/// Construct with [`new`](Self::new) (which registers the module as a
/// content listener), feed it load/unload notifications through the
/// [`ContentManager`], and record one frame per call to
/// [`execute`](Self::execute). Dropping the module unregisters the listener
/// and asserts that all surfaces were unloaded first.
pub struct ForwardRenderModule {
    device: Arc<dyn GraphicsDevice>,
    content: Arc<ContentManager>,
    listener_id: OnceLock<ListenerId>,
    targets: ForwardTargets,
    binding_layout: BindingLayoutId,
    generate_motion_vectors: bool,
    variable_shading: bool,
    depth_clear_value: f32,
    state: Mutex<ForwardState>,
}

impl ForwardRenderModule {
    /// Creates the module and registers it for content notifications.
    ///
    /// The binding layout, static samplers and dynamic constant pool are
    /// created here; pipelines are compiled lazily as content arrives.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        content: Arc<ContentManager>,
        targets: ForwardTargets,
        config: ForwardModuleConfig,
        render_config: &RenderConfig,
    ) -> Result<Arc<Self>, ForwardError> {
        let generate_motion_vectors =
            render_config.motion_vector_generation == MotionVectorGeneration::ForwardPass;

        let layout = Self::binding_layout_descriptor(render_config.inverted_depth);
        let params = ParameterSet::new(&layout);
        let binding_layout = device.create_binding_layout(&layout)?;
        let pool = DynamicBufferPool::new(
            device.as_ref(),
            DYNAMIC_CONSTANTS_BYTES_PER_FRAME,
            "forward-dynamic-constants",
        )?;

        let module = Arc::new(Self {
            device,
            content: content.clone(),
            listener_id: OnceLock::new(),
            targets,
            binding_layout,
            generate_motion_vectors,
            variable_shading: config.variable_shading,
            depth_clear_value: if render_config.inverted_depth { 0.0 } else { 1.0 },
            state: Mutex::new(ForwardState {
                params,
                pool,
                bindless: BindlessTable::new(),
                groups: Vec::new(),
            }),
        });

        let listener: Arc<dyn vesta_data::content::ContentListener> = module.clone();
        let id = content.add_listener(Arc::downgrade(&listener));
        module
            .listener_id
            .set(id)
            .expect("forward module listener registered twice");

        log::info!(
            "Forward render module initialized (motion vectors: {}, variable shading: {})",
            generate_motion_vectors,
            config.variable_shading
        );
        Ok(module)
    }

    /// The module's binding layout: the fixed contract with the forward shader.
    fn binding_layout_descriptor(inverted_depth: bool) -> BindingLayoutDescriptor {
        let mut layout = BindingLayoutDescriptor::new("forward-render-module");
        layout.add_constant_buffer(FRAME_INFO_SLOT, ShaderStageFlags::VERTEX_FRAGMENT);
        layout.add_constant_buffer(INSTANCE_INFO_SLOT, ShaderStageFlags::VERTEX_FRAGMENT);
        layout.add_constant_buffer(TEXTURE_INDICES_SLOT, ShaderStageFlags::FRAGMENT);
        layout.add_constant_buffer(SCENE_LIGHTING_SLOT, ShaderStageFlags::FRAGMENT);
        layout.add_constant_buffer(IBL_FACTORS_SLOT, ShaderStageFlags::FRAGMENT);

        layout.add_texture_srv_range(0, BINDLESS_TEXTURE_SLOT_COUNT, ShaderStageFlags::FRAGMENT);
        layout.add_texture_srv_range(BRDF_LUT_SLOT, 1, ShaderStageFlags::FRAGMENT);
        layout.add_texture_srv_range(IRRADIANCE_CUBE_SLOT, 1, ShaderStageFlags::FRAGMENT);
        layout.add_texture_srv_range(PREFILTERED_CUBE_SLOT, 1, ShaderStageFlags::FRAGMENT);
        layout.add_texture_srv_range(
            SHADOW_MAP_BASE_SLOT,
            MAX_SHADOW_MAP_TEXTURES as u32,
            ShaderStageFlags::FRAGMENT,
        );

        layout.add_sampler_range(0, BINDLESS_SAMPLER_SLOT_COUNT);

        // Shadow comparison sampler honors the depth convention.
        layout.add_static_sampler(
            COMPARISON_SAMPLER_SLOT,
            SamplerDescriptor {
                mip_filter: FilterMode::Nearest,
                compare: Some(if inverted_depth {
                    CompareFunction::GreaterEqual
                } else {
                    CompareFunction::LessEqual
                }),
                ..Default::default()
            },
        );

        let prefiltered_sampler = SamplerDescriptor::default();
        layout.add_static_sampler(PREFILTERED_SAMPLER_SLOT, prefiltered_sampler);
        layout.add_static_sampler(BRDF_SAMPLER_SLOT, prefiltered_sampler);
        layout.add_static_sampler(
            IRRADIANCE_SAMPLER_SLOT,
            SamplerDescriptor {
                mag_filter: FilterMode::Nearest,
                min_filter: FilterMode::Nearest,
                mip_filter: FilterMode::Nearest,
                ..Default::default()
            },
        );

        layout
    }

    /// Context for compiling pipeline permutations against this module's targets.
    pub(crate) fn pipeline_build_context(&self) -> PipelineBuildContext {
        PipelineBuildContext {
            binding_layout: self.binding_layout,
            color_format: self.targets.color.format,
            motion_vector_format: self.targets.motion_vectors.as_ref().map(|t| t.format),
            depth_format: self.targets.depth.format,
            generate_motion_vectors: self.generate_motion_vectors,
        }
    }

    /// Number of pipeline permutation groups created so far.
    pub fn pipeline_group_count(&self) -> usize {
        self.state
            .lock()
            .expect("forward module state poisoned")
            .groups
            .len()
    }

    /// Number of surfaces currently registered across all groups.
    pub fn registered_surface_count(&self) -> usize {
        self.state
            .lock()
            .expect("forward module state poisoned")
            .groups
            .iter()
            .map(|g| g.surfaces.len())
            .sum()
    }

    /// Records one frame of forward opaque rendering.
    ///
    /// All targets are expected to arrive in (and are returned to) the
    /// shader-read state. Missing optional resources — IBL textures, shadow
    /// sources — simply skip their binding for the frame.
    pub fn execute(
        &self,
        cmd_list: &mut dyn CommandList,
        frame: &FrameContext<'_>,
    ) -> Result<(), ForwardError> {
        let device = self.device.as_ref();
        let scene = frame.scene;

        cmd_list.push_debug_marker("Forward");

        // Surface lists, the parameter set and the constant pool must not
        // change under us while we record: hold the content-sync lock for
        // the whole frame body.
        let mut guard = self.state.lock().expect("forward module state poisoned");
        let state = &mut *guard;
        state.pool.advance_frame();

        self.bind_environment(state, scene);

        // Targets come in shader-read; move them to their write states.
        let mut barriers = vec![
            Barrier::transition(
                self.targets.color.resource,
                ResourceState::SHADER_RESOURCE,
                ResourceState::RENDER_TARGET,
            ),
            Barrier::transition(
                self.targets.depth.resource,
                ResourceState::SHADER_RESOURCE,
                ResourceState::DEPTH_WRITE,
            ),
        ];
        if self.generate_motion_vectors {
            if let Some(motion) = &self.targets.motion_vectors {
                barriers.push(Barrier::transition(
                    motion.resource,
                    ResourceState::SHADER_RESOURCE,
                    ResourceState::RENDER_TARGET,
                ));
            }
        }
        cmd_list.resource_barrier(&barriers);

        cmd_list.clear_render_target(self.targets.color.view, CLEAR_COLOR);
        if self.generate_motion_vectors {
            if let Some(motion) = &self.targets.motion_vectors {
                cmd_list.clear_render_target(motion.view, CLEAR_COLOR);
            }
        }
        cmd_list.clear_depth_stencil(self.targets.depth.view, self.depth_clear_value);

        let mut color_views = vec![self.targets.color.view];
        if self.generate_motion_vectors {
            if let Some(motion) = &self.targets.motion_vectors {
                color_views.push(motion.view);
            }
        }
        let shading_rate_image = if self.variable_shading {
            self.targets.shading_rate_image
        } else {
            None
        };
        cmd_list.begin_raster(&color_views, Some(self.targets.depth.view), shading_rate_image);

        // Per-frame constants are uploaded once.
        let frame_info = state
            .pool
            .alloc_constant_buffer(device, bytemuck::bytes_of(scene.scene_info()))?;
        state.params.update_constant_buffer(FRAME_INFO_SLOT, frame_info);

        let lighting_info = state
            .pool
            .alloc_constant_buffer(device, bytemuck::bytes_of(scene.scene_lighting_info()))?;
        state
            .params
            .update_constant_buffer(SCENE_LIGHTING_SLOT, lighting_info);

        let ibl = IblFactors {
            ibl_factor: scene.ibl_factor(),
            specular_ibl_factor: scene.specular_ibl_factor(),
            _padding: [0.0; 2],
        };
        let ibl_info = state
            .pool
            .alloc_constant_buffer(device, bytemuck::bytes_of(&ibl))?;
        state.params.update_constant_buffer(IBL_FACTORS_SLOT, ibl_info);

        // Viewport follows the upscaler: render resolution until upscaling
        // has been applied, presentation resolution otherwise.
        let (width, height) = match frame.upscaler_state {
            UpscalerState::None | UpscalerState::PostUpscale => (
                frame.resolution.display_width,
                frame.resolution.display_height,
            ),
            UpscalerState::PreUpscale => (
                frame.resolution.render_width,
                frame.resolution.render_height,
            ),
        };
        cmd_list.set_viewport_scissor(0, 0, width, height, 0.0, 1.0);
        cmd_list.set_primitive_topology(PrimitiveTopology::TriangleList);

        self.submit_groups(state, scene, cmd_list)?;

        cmd_list.end_raster(shading_rate_image);

        // Return every target to shader-read for downstream consumers.
        let mut barriers = vec![
            Barrier::transition(
                self.targets.color.resource,
                ResourceState::RENDER_TARGET,
                ResourceState::SHADER_RESOURCE,
            ),
            Barrier::transition(
                self.targets.depth.resource,
                ResourceState::DEPTH_WRITE,
                ResourceState::SHADER_RESOURCE,
            ),
        ];
        if self.generate_motion_vectors {
            if let Some(motion) = &self.targets.motion_vectors {
                barriers.push(Barrier::transition(
                    motion.resource,
                    ResourceState::RENDER_TARGET,
                    ResourceState::SHADER_RESOURCE,
                ));
            }
        }
        cmd_list.resource_barrier(&barriers);

        cmd_list.pop_debug_marker();
        Ok(())
    }

    /// Rebinds the IBL lookup textures and the frame's shadow source.
    ///
    /// A screen-space shadow texture takes precedence over the shadow-map
    /// pool and occupies shadow slot 0. These are fixed slots, not bindless
    /// table slots; the bindless range is untouched here.
    fn bind_environment(&self, state: &mut ForwardState, scene: &Scene) {
        if let Some(view) = scene.brdf_lut() {
            state
                .params
                .set_texture_srv(BRDF_LUT_SLOT, Some(view), ViewDimension::D2);
        }
        if let Some(view) = scene.irradiance_cube() {
            state
                .params
                .set_texture_srv(IRRADIANCE_CUBE_SLOT, Some(view), ViewDimension::Cube);
        }
        if let Some(view) = scene.prefiltered_cube() {
            state
                .params
                .set_texture_srv(PREFILTERED_CUBE_SLOT, Some(view), ViewDimension::Cube);
        }

        if let Some(view) = scene.screen_space_shadow() {
            state
                .params
                .set_texture_srv(SHADOW_MAP_BASE_SLOT, Some(view), ViewDimension::D2);
        } else {
            let shadow_maps = scene.shadow_maps();
            if !shadow_maps.is_empty() {
                assert!(
                    shadow_maps.len() <= MAX_SHADOW_MAP_TEXTURES,
                    "Forward render module can only support up to {} shadow maps. There are currently {} shadow maps",
                    MAX_SHADOW_MAP_TEXTURES,
                    shadow_maps.len()
                );
                for (i, view) in shadow_maps.iter().enumerate() {
                    state.params.set_texture_srv(
                        SHADOW_MAP_BASE_SLOT + i as u32,
                        Some(*view),
                        ViewDimension::D2,
                    );
                }
            }
        }
    }

    /// Draws all pipeline groups in creation order.
    ///
    /// Per group: bind the pipeline once, batch-allocate one instance slot
    /// and one texture-index slot per *active* surface, then draw the active
    /// surfaces in registration order. Inactive owners consume no slots.
    fn submit_groups(
        &self,
        state: &mut ForwardState,
        scene: &Scene,
        cmd_list: &mut dyn CommandList,
    ) -> Result<(), ForwardError> {
        let device = self.device.as_ref();

        let mut instance_slots: Vec<BufferAddressInfo> = Vec::new();
        let mut texture_index_slots: Vec<BufferAddressInfo> = Vec::new();
        let mut vertex_buffers: Vec<BufferAddressInfo> = Vec::new();

        for group in &state.groups {
            let active_count = group
                .surfaces
                .iter()
                .filter(|info| {
                    scene
                        .entities
                        .get(info.owner)
                        .is_some_and(|entity| entity.is_active())
                })
                .count();
            if active_count == 0 {
                continue;
            }

            cmd_list.set_pipeline_state(group.pipeline);

            instance_slots.clear();
            state.pool.batch_allocate_constant_buffers(
                std::mem::size_of::<InstanceInformation>() as u64,
                active_count,
                &mut instance_slots,
            );
            texture_index_slots.clear();
            state.pool.batch_allocate_constant_buffers(
                std::mem::size_of::<crate::forward::constants::TextureIndices>() as u64,
                active_count,
                &mut texture_index_slots,
            );

            let mut current_surface = 0usize;
            for info in &group.surfaces {
                let Some(owner) = scene.entities.get(info.owner) else {
                    continue;
                };
                if !owner.is_active() {
                    continue;
                }

                // A registered surface outliving its mesh or material is an
                // upstream lifecycle bug (unload must run first).
                let mesh = scene
                    .meshes
                    .get(info.surface.mesh)
                    .expect("registered surface references a missing mesh");
                let surface = mesh
                    .surface(info.surface.surface_index as usize)
                    .expect("registered surface index out of range");
                let material = scene
                    .materials
                    .get(surface.material)
                    .expect("registered surface references a missing material");

                let mut instance = InstanceInformation {
                    world_transform: owner.transform.to_cols_array_2d(),
                    prev_world_transform: owner.prev_transform.to_cols_array_2d(),
                    material: MaterialInformation::default(),
                };
                instance.material.alpha_cutoff = material.alpha_cutoff();
                if material.has_pbr_workflow() {
                    instance.material.emissive_factor = material.emissive_factor.to_array();
                    instance.material.albedo_factor = material.albedo_factor.to_array();
                    instance.material.pbr_params = material.pbr_params();
                }

                let instance_slot = instance_slots[current_surface];
                state
                    .pool
                    .initialize_constant_buffer(device, instance_slot, bytemuck::bytes_of(&instance))?;
                let texture_index_slot = texture_index_slots[current_surface];
                state.pool.initialize_constant_buffer(
                    device,
                    texture_index_slot,
                    bytemuck::bytes_of(&info.texture_indices),
                )?;
                current_surface += 1;

                state
                    .params
                    .update_constant_buffer(INSTANCE_INFO_SLOT, instance_slot);
                state
                    .params
                    .update_constant_buffer(TEXTURE_INDICES_SLOT, texture_index_slot);
                cmd_list.bind_parameter_set(&state.params);

                // Bind exactly the attributes the pipeline was built with,
                // in ascending attribute order.
                vertex_buffers.clear();
                for attribute in group.used_attributes.iter() {
                    let buffer = surface
                        .vertex_buffer(attribute)
                        .expect("group attribute not supplied by surface");
                    vertex_buffers.push(buffer.address);
                }

                // Skeletal animation: substitute the skinned streams.
                if let Some(skin) = owner.skin.as_ref() {
                    if skin.has_valid_skin() {
                        let surface_id = surface.surface_id();
                        for (slot, attribute) in group.used_attributes.iter().enumerate() {
                            let replacement = match attribute {
                                VertexAttribute::Position => skin.skinned_positions(surface_id),
                                VertexAttribute::Normal => skin.skinned_normals(surface_id),
                                VertexAttribute::PreviousPosition => {
                                    skin.skinned_previous_positions(surface_id)
                                }
                                _ => None,
                            };
                            if let Some(buffer) = replacement {
                                vertex_buffers[slot] = buffer.address;
                            }
                        }
                    }
                }

                cmd_list.set_vertex_buffers(0, &vertex_buffers);
                cmd_list.set_index_buffer(&surface.index_buffer.address, surface.index_buffer.format);
                cmd_list.draw_indexed_instanced(surface.index_buffer.count, 1);
            }

            debug_assert_eq!(
                current_surface, active_count,
                "active-surface count drifted between the slot pass and the draw pass"
            );
        }

        Ok(())
    }
}

impl Drop for ForwardRenderModule {
    fn drop(&mut self) {
        if let Some(id) = self.listener_id.get() {
            self.content.remove_listener(*id);
        }

        let state = match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        for group in &state.groups {
            assert!(
                group.surfaces.is_empty(),
                "Not all pipeline surfaces have been removed. This ship is leaking."
            );
            if let Err(e) = self.device.destroy_render_pipeline(group.pipeline) {
                log::warn!("ForwardRenderModule: Failed to destroy pipeline: {:?}", e);
            }
        }

        state.bindless.destroy(self.device.as_ref());
        state.pool.destroy(self.device.as_ref());
    }
}
