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

//! Defines data structures used for recording and describing GPU commands.

use crate::renderer::api::texture::{TextureFormat, TextureId, TextureViewId};

/// Specifies the data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    Uint32,
}

/// A set of flags describing the state a resource is in.
///
/// State transitions are recorded explicitly via [`Barrier`]s; command lists
/// require every resource to be in a compatible state before it is read or
/// written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceState {
    bits: u32,
}

impl ResourceState {
    /// The resource is readable from non-pixel shader stages.
    pub const NON_PIXEL_SHADER_RESOURCE: Self = Self { bits: 1 << 0 };
    /// The resource is readable from the pixel shader stage.
    pub const PIXEL_SHADER_RESOURCE: Self = Self { bits: 1 << 1 };
    /// The resource is bound as a color render target.
    pub const RENDER_TARGET: Self = Self { bits: 1 << 2 };
    /// The resource is bound as a writable depth target.
    pub const DEPTH_WRITE: Self = Self { bits: 1 << 3 };
    /// The resource is the destination of a copy.
    pub const COPY_DEST: Self = Self { bits: 1 << 4 };
    /// The resource is the source of a copy.
    pub const COPY_SOURCE: Self = Self { bits: 1 << 5 };
    /// Readable from any shader stage.
    pub const SHADER_RESOURCE: Self = Self {
        bits: Self::NON_PIXEL_SHADER_RESOURCE.bits | Self::PIXEL_SHADER_RESOURCE.bits,
    };

    /// Creates a new state from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two states.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if this state contains all bits of `other`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for ResourceState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ResourceState {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A resource state transition recorded into a command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barrier {
    /// The texture resource being transitioned.
    pub resource: TextureId,
    /// The state the resource is currently in.
    pub state_before: ResourceState,
    /// The state the resource transitions to.
    pub state_after: ResourceState,
}

impl Barrier {
    /// Creates a transition barrier.
    pub fn transition(resource: TextureId, before: ResourceState, after: ResourceState) -> Self {
        Self {
            resource,
            state_before: before,
            state_after: after,
        }
    }
}

/// A render target: the underlying resource, the view rendered into, and its format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    /// The texture resource (used for state transitions).
    pub resource: TextureId,
    /// The view bound during rasterization.
    pub view: TextureViewId,
    /// The pixel format of the target.
    pub format: TextureFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_resource_covers_both_stages() {
        assert!(ResourceState::SHADER_RESOURCE.contains(ResourceState::PIXEL_SHADER_RESOURCE));
        assert!(ResourceState::SHADER_RESOURCE.contains(ResourceState::NON_PIXEL_SHADER_RESOURCE));
        assert!(!ResourceState::SHADER_RESOURCE.contains(ResourceState::RENDER_TARGET));
    }

    #[test]
    fn test_barrier_transition_constructor() {
        let barrier = Barrier::transition(
            TextureId(3),
            ResourceState::SHADER_RESOURCE,
            ResourceState::RENDER_TARGET,
        );
        assert_eq!(barrier.resource, TextureId(3));
        assert_eq!(barrier.state_before, ResourceState::SHADER_RESOURCE);
        assert_eq!(barrier.state_after, ResourceState::RENDER_TARGET);
    }
}
