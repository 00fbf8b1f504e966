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

//! Defines data structures related to GPU buffer resources.

/// An opaque handle to a GPU buffer owned by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// A set of flags describing the allowed usages of a [`BufferId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferUsage {
    bits: u32,
}

impl BufferUsage {
    /// No usage.
    pub const NONE: Self = Self { bits: 0 };
    /// The buffer can be the source of a copy operation.
    pub const COPY_SRC: Self = Self { bits: 1 << 0 };
    /// The buffer can be the destination of a copy operation.
    pub const COPY_DST: Self = Self { bits: 1 << 1 };
    /// The buffer can be bound as a vertex buffer.
    pub const VERTEX: Self = Self { bits: 1 << 2 };
    /// The buffer can be bound as an index buffer.
    pub const INDEX: Self = Self { bits: 1 << 3 };
    /// The buffer can be bound as a uniform (constant) buffer.
    pub const UNIFORM: Self = Self { bits: 1 << 4 };

    /// Creates a new set of usage flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if these flags contain all flags of `other`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for BufferUsage {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The size of the buffer in bytes.
    pub size: u64,
    /// The allowed usages of the buffer.
    pub usage: BufferUsage,
}

/// The address of a sub-range of a GPU buffer.
///
/// This is the unit handed out by the
/// [`DynamicBufferPool`](super::dynamic_buffer::DynamicBufferPool) and
/// consumed by vertex/index/constant bindings: a buffer handle plus the byte
/// range inside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferAddressInfo {
    /// The buffer the range lives in.
    pub buffer: BufferId,
    /// Byte offset of the range from the start of the buffer.
    pub offset: u64,
    /// Size of the range in bytes.
    pub size: u64,
}
