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

use crate::renderer::api::*;
use crate::renderer::error::{PipelineError, ResourceError};
use std::fmt::Debug;

/// The opaque GPU backend: object creation, destruction, and buffer writes.
///
/// Everything the engine knows about a backend object is its opaque ID;
/// lifetime management is explicit via the `destroy_*` methods. All methods
/// take `&self` — implementations are expected to be internally synchronized,
/// as creation can happen from a loader thread while the render thread records
/// commands.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a binding layout (root-signature analogue) from the provided descriptor.
    ///
    /// ## Errors
    /// * `ResourceError` - If the layout creation fails.
    fn create_binding_layout(
        &self,
        descriptor: &BindingLayoutDescriptor,
    ) -> Result<BindingLayoutId, ResourceError>;

    /// Creates a render pipeline, compiling the shader stages referenced by
    /// the descriptor with their attached define lists.
    ///
    /// ## Errors
    /// * `PipelineError` - If shader or pipeline compilation fails.
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, PipelineError>;

    /// Destroys the render pipeline associated with the given ID.
    ///
    /// ## Errors
    /// * `ResourceError` - If the ID is unknown to the backend.
    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError>;

    /// Creates a sampler from the provided descriptor.
    ///
    /// ## Errors
    /// * `ResourceError` - If the sampler creation fails.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError>;

    /// Destroys the sampler associated with the given ID.
    ///
    /// ## Errors
    /// * `ResourceError` - If the ID is unknown to the backend.
    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError>;

    /// Creates a new GPU buffer.
    ///
    /// ## Errors
    /// * `ResourceError` - If the buffer creation fails.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    ///
    /// ## Errors
    /// * `ResourceError` - If the ID is unknown to the backend.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Writes data into a GPU buffer at the given byte offset.
    ///
    /// ## Errors
    /// * `ResourceError` - If the write fails or is out of bounds.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;
}
