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

//! Content-change notifications from the loader to interested render modules.
//!
//! The content system batches loaded/unloaded geometry into
//! [`ContentBlock`]s and fans each block out to registered
//! [`ContentListener`]s through the [`ContentManager`]. Listeners are held
//! weakly: a dropped listener is pruned on the next notification, and
//! modules additionally unregister explicitly on teardown via their
//! [`ListenerId`].
//!
//! Notifications may be delivered from a loader thread while the render
//! thread is mid-frame; listeners are responsible for their own internal
//! locking.

use crate::entity::EntityId;
use crate::mesh::MeshId;
use crate::scene::Scene;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, Weak};

/// One mesh attached to one entity within a content batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshInstance {
    /// The owning entity.
    pub entity: EntityId,
    /// The attached mesh.
    pub mesh: MeshId,
}

/// A batch of content that was loaded or unloaded together.
#[derive(Debug, Default)]
pub struct ContentBlock {
    /// The mesh instances in the batch.
    pub mesh_instances: Vec<MeshInstance>,
}

impl ContentBlock {
    /// Creates an empty block.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Receives content-change notifications.
pub trait ContentListener: Send + Sync {
    /// Called after a batch of content has been loaded into the scene.
    fn on_content_loaded(&self, block: &ContentBlock, scene: &Scene);

    /// Called before a batch of content is removed from the scene.
    fn on_content_unloaded(&self, block: &ContentBlock, scene: &Scene);
}

/// A registration handle returned by [`ContentManager::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fans content notifications out to registered listeners.
#[derive(Default)]
pub struct ContentManager {
    listeners: Mutex<Vec<(ListenerId, Weak<dyn ContentListener>)>>,
    next_id: AtomicU64,
}

impl ContentManager {
    /// Creates a manager with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its unregistration handle.
    pub fn add_listener(&self, listener: Weak<dyn ContentListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .expect("content listener registry poisoned")
            .push((id, listener));
        id
    }

    /// Unregisters a listener. Returns `false` if the ID was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .expect("content listener registry poisoned");
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Number of registered (possibly dead) listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .expect("content listener registry poisoned")
            .len()
    }

    /// Notifies all live listeners that `block` has been loaded.
    pub fn notify_content_loaded(&self, block: &ContentBlock, scene: &Scene) {
        for listener in self.collect_live_listeners() {
            listener.on_content_loaded(block, scene);
        }
    }

    /// Notifies all live listeners that `block` is being unloaded.
    pub fn notify_content_unloaded(&self, block: &ContentBlock, scene: &Scene) {
        for listener in self.collect_live_listeners() {
            listener.on_content_unloaded(block, scene);
        }
    }

    /// Upgrades live listeners and prunes dead ones.
    ///
    /// The registry lock is released before any callback runs, so listeners
    /// may re-enter the manager (e.g. unregister themselves) from a callback.
    fn collect_live_listeners(&self) -> Vec<std::sync::Arc<dyn ContentListener>> {
        let mut listeners = self
            .listeners
            .lock()
            .expect("content listener registry poisoned");
        let mut live = Vec::with_capacity(listeners.len());
        listeners.retain(|(_, weak)| match weak.upgrade() {
            Some(listener) => {
                live.push(listener);
                true
            }
            None => {
                log::debug!("Pruning dropped content listener");
                false
            }
        });
        live
    }
}

impl std::fmt::Debug for ContentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentManager")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
