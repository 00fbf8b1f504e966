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

//! Scene-side data model of the Vesta Engine.
//!
//! `vesta-data` owns everything render modules *reference* but do not own:
//! the generational entity store, meshes and their surfaces, PBR materials,
//! the scene accessor with per-frame constants and environment textures, and
//! the content-change notification bus that tells render modules when
//! geometry enters or leaves the world.
//!
//! Render modules hold only weak handles ([`EntityId`](entity::EntityId),
//! [`MeshId`](mesh::MeshId) + surface index) into these stores; validity is
//! the stores' responsibility and lookups tolerate absent entries.

pub mod content;
pub mod entity;
pub mod material;
pub mod mesh;
pub mod scene;

pub use content::{ContentBlock, ContentListener, ContentManager, ListenerId, MeshInstance};
pub use entity::{Entity, EntityId, EntityStore, SkinComponent};
pub use material::{
    BlendMode, Material, MaterialId, MaterialStore, MaterialTexture, PbrWorkflow, TextureClass,
};
pub use mesh::{
    IndexBufferInfo, Mesh, MeshId, MeshStore, Surface, VertexAttribute, VertexAttributeFlags,
    VertexBufferInfo,
};
pub use scene::{GpuLight, Scene, SceneInformation, SceneLightingInformation, MAX_SCENE_LIGHTS};
