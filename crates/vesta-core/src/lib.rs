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

//! Foundational crate of the Vesta Engine.
//!
//! `vesta-core` defines the backend-agnostic rendering contracts that the
//! rest of the engine is written against: opaque resource handles,
//! descriptor types, the [`GraphicsDevice`](renderer::GraphicsDevice) and
//! [`CommandList`](renderer::CommandList) traits, the persistent
//! [`ParameterSet`](renderer::ParameterSet) binding table, and the per-frame
//! [`DynamicBufferPool`](renderer::DynamicBufferPool) constant allocator.
//!
//! No concrete GPU backend lives here. A backend crate implements the traits
//! of [`renderer::traits`] against a real graphics API; render modules and
//! tests only ever see opaque IDs and recorded commands.

pub mod renderer;
