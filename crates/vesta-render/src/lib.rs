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

//! Hot-path render modules of the Vesta Engine.
//!
//! Render modules consume the contracts of `vesta-core` and the scene data
//! of `vesta-data` to turn the world into recorded GPU commands. The crate
//! currently ships the forward opaque geometry module ([`forward`]); sibling
//! passes (shadows, translucency, post-processing) plug into the same
//! structure.

pub mod forward;

#[cfg(test)]
pub(crate) mod test_support;

pub use forward::{
    ForwardError, ForwardModuleConfig, ForwardRenderModule, ForwardTargets, FrameContext,
    MotionVectorGeneration, RenderConfig, ResolutionInfo, UpscalerState,
};
