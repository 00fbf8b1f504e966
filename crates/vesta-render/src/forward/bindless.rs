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

//! The bindless texture/sampler table of the forward module.
//!
//! Content textures are mapped to small integer slots in a dense array.
//! Entries are reference counted: surfaces sharing a texture share its slot,
//! and a slot whose count reaches zero keeps its position (the handle is
//! cleared) until a later registration reuses it via linear scan. Samplers
//! are deduplicated by descriptor equality and are append-only — they are
//! never reclaimed, which bounds growth by the number of distinct sampler
//! descriptors ever seen rather than by live content.
//!
//! After any batch of additions or removals the whole table — cleared slots
//! included — must be republished into the module's
//! [`ParameterSet`](vesta_core::renderer::api::ParameterSet); partial
//! updates are not supported.

use crate::forward::constants::{MAX_SAMPLER_COUNT, MAX_TEXTURE_COUNT, UNUSED_INDEX};
use vesta_core::renderer::api::{ParameterSet, SamplerDescriptor, SamplerId, TextureViewId, ViewDimension};
use vesta_core::renderer::error::ResourceError;
use vesta_core::renderer::traits::GraphicsDevice;
use vesta_data::material::{Material, TextureClass};

/// One slot of the bindless texture array.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoundTexture {
    /// The bound view; `None` once the slot's count dropped to zero.
    view: Option<TextureViewId>,
    /// Number of registered surfaces referencing the slot.
    ref_count: u32,
}

/// One deduplicated sampler entry.
#[derive(Debug)]
struct SamplerEntry {
    sampler: SamplerId,
    descriptor: SamplerDescriptor,
}

/// The forward module's bindless texture and sampler table.
#[derive(Debug, Default)]
pub(crate) struct BindlessTable {
    textures: Vec<BoundTexture>,
    samplers: Vec<SamplerEntry>,
}

impl BindlessTable {
    pub fn new() -> Self {
        Self {
            textures: Vec::with_capacity(MAX_TEXTURE_COUNT / 2),
            samplers: Vec::with_capacity(MAX_SAMPLER_COUNT / 2),
        }
    }

    /// Registers the material's texture of the given class.
    ///
    /// Returns `(texture_slot, sampler_slot)`, or `(UNUSED_INDEX,
    /// UNUSED_INDEX)` without touching the table when the material has no
    /// texture of that class. A texture already present has its reference
    /// count bumped and keeps its slot; a new texture reuses the first
    /// zero-count slot or appends.
    pub fn add_texture(
        &mut self,
        device: &dyn GraphicsDevice,
        material: &Material,
        class: TextureClass,
    ) -> Result<(i32, i32), ResourceError> {
        let Some(texture) = material.texture(class) else {
            return Ok((UNUSED_INDEX, UNUSED_INDEX));
        };

        // Sampler lookup by descriptor equality; append on miss.
        let sampler_slot = match self
            .samplers
            .iter()
            .position(|entry| entry.descriptor == texture.sampler)
        {
            Some(slot) => slot,
            None => {
                let sampler = device.create_sampler(&texture.sampler)?;
                log::debug!(
                    "Created content sampler {} for the forward bindless table",
                    self.samplers.len()
                );
                self.samplers.push(SamplerEntry {
                    sampler,
                    descriptor: texture.sampler,
                });
                self.samplers.len() - 1
            }
        };

        // Texture lookup: shared slot on hit, first free slot on miss.
        let mut first_free = None;
        for (slot, bound) in self.textures.iter_mut().enumerate() {
            if bound.view == Some(texture.view) {
                bound.ref_count += 1;
                return Ok((slot as i32, sampler_slot as i32));
            }
            if first_free.is_none() && bound.ref_count == 0 {
                first_free = Some(slot);
            }
        }

        let entry = BoundTexture {
            view: Some(texture.view),
            ref_count: 1,
        };
        let texture_slot = match first_free {
            Some(slot) => {
                self.textures[slot] = entry;
                slot
            }
            None => {
                self.textures.push(entry);
                self.textures.len() - 1
            }
        };

        Ok((texture_slot as i32, sampler_slot as i32))
    }

    /// Releases one reference on a texture slot.
    ///
    /// A zero count clears the handle but keeps the slot in place for reuse.
    /// No-op for [`UNUSED_INDEX`].
    pub fn remove_texture(&mut self, slot: i32) {
        if slot < 0 {
            return;
        }
        let bound = &mut self.textures[slot as usize];
        debug_assert!(bound.ref_count > 0, "releasing an unreferenced texture slot");
        bound.ref_count -= 1;
        if bound.ref_count == 0 {
            bound.view = None;
        }
    }

    /// Republishes the whole table into the parameter set.
    ///
    /// Every slot in use is rewritten, cleared slots included; the shader
    /// sees exactly the dense array this table holds. Exceeding either
    /// capacity ceiling is a fatal logic error.
    pub fn publish(&self, parameter_set: &mut ParameterSet) {
        assert!(
            self.textures.len() <= MAX_TEXTURE_COUNT / 2,
            "Too many textures: {} registered, {} supported",
            self.textures.len(),
            MAX_TEXTURE_COUNT / 2
        );
        assert!(
            self.samplers.len() <= MAX_SAMPLER_COUNT / 2,
            "Too many samplers: {} registered, {} supported",
            self.samplers.len(),
            MAX_SAMPLER_COUNT / 2
        );

        for (slot, bound) in self.textures.iter().enumerate() {
            parameter_set.set_texture_srv(slot as u32, bound.view, ViewDimension::D2);
        }
        for (slot, entry) in self.samplers.iter().enumerate() {
            parameter_set.set_sampler(slot as u32, entry.sampler);
        }
    }

    /// Number of occupied texture slots (live or cleared).
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of deduplicated samplers.
    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    /// The reference count of a texture slot.
    pub fn texture_ref_count(&self, slot: i32) -> u32 {
        self.textures[slot as usize].ref_count
    }

    /// The view bound at a texture slot, if the slot is live.
    pub fn texture_view(&self, slot: i32) -> Option<TextureViewId> {
        self.textures[slot as usize].view
    }

    /// Destroys the sampler objects owned by the table.
    pub fn destroy(&self, device: &dyn GraphicsDevice) {
        for entry in &self.samplers {
            if let Err(e) = device.destroy_sampler(entry.sampler) {
                log::warn!("BindlessTable: Failed to destroy sampler: {:?}", e);
            }
        }
    }
}
