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

use crate::renderer::api::{
    Barrier, BufferAddressInfo, IndexFormat, ParameterSet, PrimitiveTopology, RenderPipelineId,
    TextureViewId,
};

/// A trait for an object that records a sequence of GPU commands.
///
/// Render modules record CPU-side into a `CommandList`; the backend later
/// translates and submits the recorded stream. Recording is synchronous and
/// infallible — invalid command sequences are backend-validation errors, not
/// recoverable conditions.
///
/// The rasterization state machine is flat: [`begin_raster`](Self::begin_raster)
/// opens one raster scope bound to a set of targets, draw state is set inside
/// it, and [`end_raster`](Self::end_raster) closes it. Resource state
/// transitions are explicit via [`resource_barrier`](Self::resource_barrier)
/// and must bracket the raster scope.
pub trait CommandList {
    /// Records a batch of resource state transitions.
    fn resource_barrier(&mut self, barriers: &[Barrier]);

    /// Clears a color target view to the given RGBA value.
    ///
    /// The target must be in the render-target state.
    fn clear_render_target(&mut self, view: TextureViewId, color: [f32; 4]);

    /// Clears a depth target view to the given depth value.
    ///
    /// The target must be in the depth-write state.
    fn clear_depth_stencil(&mut self, view: TextureViewId, depth: f32);

    /// Begins rasterization bound to the given color targets and optional
    /// depth target. `shading_rate_image` attaches per-draw variable-rate
    /// shading information when the backend supports it.
    fn begin_raster(
        &mut self,
        color_views: &[TextureViewId],
        depth_view: Option<TextureViewId>,
        shading_rate_image: Option<TextureViewId>,
    );

    /// Ends the current raster scope.
    fn end_raster(&mut self, shading_rate_image: Option<TextureViewId>);

    /// Sets the viewport and scissor rectangle.
    #[allow(clippy::too_many_arguments)]
    fn set_viewport_scissor(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        min_depth: f32,
        max_depth: f32,
    );

    /// Sets the primitive topology for subsequent draws.
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology);

    /// Sets the active render pipeline for subsequent draw calls.
    fn set_pipeline_state(&mut self, pipeline: RenderPipelineId);

    /// Applies the current contents of a [`ParameterSet`] for subsequent draws.
    fn bind_parameter_set(&mut self, parameter_set: &ParameterSet);

    /// Binds vertex buffers to consecutive slots starting at `first_slot`.
    fn set_vertex_buffers(&mut self, first_slot: u32, buffers: &[BufferAddressInfo]);

    /// Binds an index buffer for indexed drawing.
    fn set_index_buffer(&mut self, buffer: &BufferAddressInfo, format: IndexFormat);

    /// Records an indexed draw call.
    fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32);

    /// Opens a debug marker scope (for GPU profilers).
    fn push_debug_marker(&mut self, label: &str);

    /// Closes the innermost debug marker scope.
    fn pop_debug_marker(&mut self);
}
