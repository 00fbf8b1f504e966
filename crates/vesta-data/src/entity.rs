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

//! Generational entity storage and the per-entity data render modules read.

use crate::mesh::VertexBufferInfo;
use glam::Mat4;
use std::collections::HashMap;

/// A weak, generational handle to an entity in an [`EntityStore`].
///
/// Holding an `EntityId` does not keep the entity alive; a lookup after the
/// entity was despawned (or its slot reused) returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// The slot index inside the store.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation the handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Precomputed skinning data attached to an animated entity.
///
/// Produced by the animation system; this crate only stores the results.
/// For each surface of the entity's mesh, the skinned position, normal and
/// previous-position vertex streams replace the mesh's static ones at draw
/// time.
#[derive(Debug, Default)]
pub struct SkinComponent {
    skin_id: Option<u32>,
    skinned_positions: HashMap<u32, VertexBufferInfo>,
    skinned_normals: HashMap<u32, VertexBufferInfo>,
    skinned_previous_positions: HashMap<u32, VertexBufferInfo>,
}

impl SkinComponent {
    /// Creates a skin component. `skin_id` is `None` for entities that carry
    /// the component but currently have no skin assigned.
    pub fn new(skin_id: Option<u32>) -> Self {
        Self {
            skin_id,
            ..Default::default()
        }
    }

    /// Whether a skin is currently assigned.
    pub fn has_valid_skin(&self) -> bool {
        self.skin_id.is_some()
    }

    /// The assigned skin, if any.
    pub fn skin_id(&self) -> Option<u32> {
        self.skin_id
    }

    /// Registers the skinned vertex streams for one surface.
    pub fn set_surface_buffers(
        &mut self,
        surface_id: u32,
        positions: VertexBufferInfo,
        normals: VertexBufferInfo,
        previous_positions: VertexBufferInfo,
    ) {
        self.skinned_positions.insert(surface_id, positions);
        self.skinned_normals.insert(surface_id, normals);
        self.skinned_previous_positions
            .insert(surface_id, previous_positions);
    }

    /// The skinned position stream for a surface.
    pub fn skinned_positions(&self, surface_id: u32) -> Option<&VertexBufferInfo> {
        self.skinned_positions.get(&surface_id)
    }

    /// The skinned normal stream for a surface.
    pub fn skinned_normals(&self, surface_id: u32) -> Option<&VertexBufferInfo> {
        self.skinned_normals.get(&surface_id)
    }

    /// The skinned previous-position stream for a surface.
    pub fn skinned_previous_positions(&self, surface_id: u32) -> Option<&VertexBufferInfo> {
        self.skinned_previous_positions.get(&surface_id)
    }
}

/// An entity as seen by the render modules: transforms, activity, optional skin.
#[derive(Debug)]
pub struct Entity {
    /// Current world transform.
    pub transform: Mat4,
    /// World transform of the previous frame (motion vectors).
    pub prev_transform: Mat4,
    /// Inactive entities are skipped by frame submission.
    pub active: bool,
    /// Optional precomputed skinning data.
    pub skin: Option<SkinComponent>,
}

impl Entity {
    /// Creates an active entity at the given transform.
    pub fn new(transform: Mat4) -> Self {
        Self {
            transform,
            prev_transform: transform,
            active: true,
            skin: None,
        }
    }

    /// Whether frame submission should draw this entity.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// A generational arena of entities.
///
/// Slots are reused after despawn with a bumped generation, so stale
/// [`EntityId`]s held elsewhere (e.g. by render modules) fail to resolve
/// instead of aliasing a new entity.
#[derive(Debug, Default)]
pub struct EntityStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity and returns its handle.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entity = Some(entity);
            EntityId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entity: Some(entity),
            });
            EntityId {
                index,
                generation: 0,
            }
        }
    }

    /// Removes an entity, invalidating all handles to it.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(entity)
    }

    /// Resolves a handle, returning `None` for stale or unknown handles.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_ref()
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entity.is_some()).count()
    }

    /// Whether the store holds no live entities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_get() {
        let mut store = EntityStore::new();
        let id = store.spawn(Entity::new(Mat4::IDENTITY));
        assert!(store.get(id).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_handle_after_despawn_returns_none() {
        let mut store = EntityStore::new();
        let id = store.spawn(Entity::new(Mat4::IDENTITY));
        assert!(store.despawn(id).is_some());
        assert!(store.get(id).is_none());
        assert!(store.despawn(id).is_none());
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut store = EntityStore::new();
        let first = store.spawn(Entity::new(Mat4::IDENTITY));
        store.despawn(first);

        let second = store.spawn(Entity::new(Mat4::IDENTITY));
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());

        // The stale handle must not alias the new entity.
        assert!(store.get(first).is_none());
        assert!(store.get(second).is_some());
    }

    #[test]
    fn test_entity_starts_active_with_matching_transforms() {
        let entity = Entity::new(Mat4::from_translation(glam::Vec3::X));
        assert!(entity.is_active());
        assert_eq!(entity.transform, entity.prev_transform);
    }

    #[test]
    fn test_skin_component_validity() {
        assert!(!SkinComponent::new(None).has_valid_skin());
        assert!(SkinComponent::new(Some(2)).has_valid_skin());
    }
}
