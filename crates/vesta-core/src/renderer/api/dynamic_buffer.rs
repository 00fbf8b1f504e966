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

//! Per-frame dynamic constant buffer allocation.
//!
//! The [`DynamicBufferPool`] pre-allocates one large GPU buffer per
//! frame-in-flight and hands out aligned sub-ranges from the current frame's
//! buffer. Each frame, [`advance_frame()`](DynamicBufferPool::advance_frame)
//! moves to the next buffer and resets the cursor, ensuring the GPU can
//! still read the previous frame's constants while the CPU fills the
//! current slot.
//!
//! Allocation is a cursor bump; nothing is ever freed mid-frame. Render
//! modules either allocate-and-write in one step
//! ([`alloc_constant_buffer`](DynamicBufferPool::alloc_constant_buffer)) or
//! reserve a batch of equally sized slots up front and initialize them one
//! by one while iterating surfaces
//! ([`batch_allocate_constant_buffers`](DynamicBufferPool::batch_allocate_constant_buffers) /
//! [`initialize_constant_buffer`](DynamicBufferPool::initialize_constant_buffer)).

use crate::renderer::api::buffer::{BufferAddressInfo, BufferDescriptor, BufferId, BufferUsage};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GraphicsDevice;

/// Number of frames the CPU may record ahead of the GPU.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Minimum constant buffer alignment required by most graphics APIs.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// A pool of per-frame GPU memory for transient constant buffer data.
#[derive(Debug)]
pub struct DynamicBufferPool {
    /// One backing buffer per frame in flight.
    buffers: Vec<BufferId>,
    /// Capacity of each backing buffer in bytes.
    capacity: u64,
    /// Bump cursor into the current frame's buffer.
    cursor: u64,
    /// Index of the current frame's buffer.
    frame_index: usize,
    /// Debug label for logging.
    label: &'static str,
}

impl DynamicBufferPool {
    /// Creates a pool with `capacity_per_frame` bytes per frame in flight.
    pub fn new(
        device: &dyn GraphicsDevice,
        capacity_per_frame: u64,
        label: &'static str,
    ) -> Result<Self, ResourceError> {
        let mut buffers = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for i in 0..MAX_FRAMES_IN_FLIGHT {
            let buffer = device.create_buffer(&BufferDescriptor {
                label: Some(format!("{label} [frame {i}]")),
                size: capacity_per_frame,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            })?;
            buffers.push(buffer);
        }

        Ok(Self {
            buffers,
            capacity: capacity_per_frame,
            cursor: 0,
            frame_index: 0,
            label,
        })
    }

    /// Advances to the next frame's buffer and resets the allocation cursor.
    ///
    /// Call once at the beginning of each frame, before any allocation.
    pub fn advance_frame(&mut self) {
        self.frame_index = (self.frame_index + 1) % self.buffers.len();
        self.cursor = 0;
    }

    /// Allocates an aligned range and writes `data` into it.
    pub fn alloc_constant_buffer(
        &mut self,
        device: &dyn GraphicsDevice,
        data: &[u8],
    ) -> Result<BufferAddressInfo, ResourceError> {
        let address = self.reserve(data.len() as u64);
        device.write_buffer(address.buffer, address.offset, data)?;
        Ok(address)
    }

    /// Reserves `count` equally sized aligned ranges without writing them.
    ///
    /// The reserved addresses are appended to `out`. Each slot must be
    /// filled via [`initialize_constant_buffer`](Self::initialize_constant_buffer)
    /// before the GPU consumes it.
    pub fn batch_allocate_constant_buffers(
        &mut self,
        size: u64,
        count: usize,
        out: &mut Vec<BufferAddressInfo>,
    ) {
        out.reserve(count);
        for _ in 0..count {
            let address = self.reserve(size);
            out.push(address);
        }
    }

    /// Writes `data` into a previously reserved range.
    pub fn initialize_constant_buffer(
        &self,
        device: &dyn GraphicsDevice,
        address: BufferAddressInfo,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        assert!(
            data.len() as u64 <= address.size,
            "DynamicBufferPool({}): write of {} bytes into a {}-byte slot",
            self.label,
            data.len(),
            address.size
        );
        device.write_buffer(address.buffer, address.offset, data)
    }

    /// Bytes allocated so far in the current frame.
    pub fn bytes_allocated(&self) -> u64 {
        self.cursor
    }

    /// Capacity per frame in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Destroys all GPU buffers owned by the pool.
    pub fn destroy(&self, device: &dyn GraphicsDevice) {
        for &buffer in &self.buffers {
            if let Err(e) = device.destroy_buffer(buffer) {
                log::warn!(
                    "DynamicBufferPool({}): Failed to destroy buffer: {:?}",
                    self.label,
                    e
                );
            }
        }
    }

    fn reserve(&mut self, size: u64) -> BufferAddressInfo {
        let aligned =
            (size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1);
        assert!(
            self.cursor + aligned <= self.capacity,
            "DynamicBufferPool({}): out of per-frame space ({} of {} bytes used, {} requested)",
            self.label,
            self.cursor,
            self.capacity,
            aligned
        );

        let address = BufferAddressInfo {
            buffer: self.buffers[self.frame_index],
            offset: self.cursor,
            size: aligned,
        };
        self.cursor += aligned;
        address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::{
        BindingLayoutDescriptor, RenderPipelineDescriptor, SamplerDescriptor,
    };
    use crate::renderer::api::{BindingLayoutId, RenderPipelineId, SamplerId};
    use crate::renderer::error::PipelineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A mock graphics device that produces unique resource IDs for testing.
    #[derive(Debug)]
    struct MockGraphicsDevice {
        next_id: AtomicUsize,
    }

    impl MockGraphicsDevice {
        fn new() -> Self {
            Self {
                next_id: AtomicUsize::new(1),
            }
        }

        fn next(&self) -> usize {
            self.next_id.fetch_add(1, Ordering::Relaxed)
        }
    }

    impl GraphicsDevice for MockGraphicsDevice {
        fn create_binding_layout(
            &self,
            _descriptor: &BindingLayoutDescriptor,
        ) -> Result<BindingLayoutId, ResourceError> {
            Ok(BindingLayoutId(self.next()))
        }
        fn create_render_pipeline(
            &self,
            _descriptor: &RenderPipelineDescriptor,
        ) -> Result<RenderPipelineId, PipelineError> {
            Ok(RenderPipelineId(self.next()))
        }
        fn destroy_render_pipeline(&self, _id: RenderPipelineId) -> Result<(), ResourceError> {
            Ok(())
        }
        fn create_sampler(
            &self,
            _descriptor: &SamplerDescriptor,
        ) -> Result<SamplerId, ResourceError> {
            Ok(SamplerId(self.next()))
        }
        fn destroy_sampler(&self, _id: SamplerId) -> Result<(), ResourceError> {
            Ok(())
        }
        fn create_buffer(&self, _descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
            Ok(BufferId(self.next()))
        }
        fn destroy_buffer(&self, _id: BufferId) -> Result<(), ResourceError> {
            Ok(())
        }
        fn write_buffer(
            &self,
            _id: BufferId,
            _offset: u64,
            _data: &[u8],
        ) -> Result<(), ResourceError> {
            Ok(())
        }
    }

    #[test]
    fn test_pool_creates_one_buffer_per_frame_in_flight() {
        let device = MockGraphicsDevice::new();
        let pool = DynamicBufferPool::new(&device, 4096, "Test").unwrap();
        assert_eq!(pool.buffers.len(), MAX_FRAMES_IN_FLIGHT);
    }

    #[test]
    fn test_allocations_are_aligned() {
        let device = MockGraphicsDevice::new();
        let mut pool = DynamicBufferPool::new(&device, 4096, "Test").unwrap();

        let a = pool.alloc_constant_buffer(&device, &[0u8; 16]).unwrap();
        let b = pool.alloc_constant_buffer(&device, &[0u8; 300]).unwrap();

        assert_eq!(a.offset % CONSTANT_BUFFER_ALIGNMENT, 0);
        assert_eq!(a.size, CONSTANT_BUFFER_ALIGNMENT);
        assert_eq!(b.offset, CONSTANT_BUFFER_ALIGNMENT);
        assert_eq!(b.size, 2 * CONSTANT_BUFFER_ALIGNMENT);
    }

    #[test]
    fn test_batch_allocate_reserves_exact_count() {
        let device = MockGraphicsDevice::new();
        let mut pool = DynamicBufferPool::new(&device, 16384, "Test").unwrap();

        let mut slots = Vec::new();
        pool.batch_allocate_constant_buffers(192, 5, &mut slots);
        assert_eq!(slots.len(), 5);

        // Slots are contiguous and non-overlapping.
        for pair in slots.windows(2) {
            assert_eq!(pair[0].offset + pair[0].size, pair[1].offset);
        }

        for slot in &slots {
            pool.initialize_constant_buffer(&device, *slot, &[0u8; 192])
                .unwrap();
        }
    }

    #[test]
    fn test_advance_frame_resets_cursor_and_switches_buffers() {
        let device = MockGraphicsDevice::new();
        let mut pool = DynamicBufferPool::new(&device, 4096, "Test").unwrap();

        let a = pool.alloc_constant_buffer(&device, &[0u8; 64]).unwrap();
        pool.advance_frame();
        assert_eq!(pool.bytes_allocated(), 0);

        let b = pool.alloc_constant_buffer(&device, &[0u8; 64]).unwrap();
        assert_ne!(a.buffer, b.buffer, "frames must not share a buffer");
        assert_eq!(b.offset, 0);
    }

    #[test]
    #[should_panic(expected = "out of per-frame space")]
    fn test_exhausting_frame_capacity_is_fatal() {
        let device = MockGraphicsDevice::new();
        let mut pool = DynamicBufferPool::new(&device, 512, "Test").unwrap();

        let _ = pool.alloc_constant_buffer(&device, &[0u8; 256]).unwrap();
        let _ = pool.alloc_constant_buffer(&device, &[0u8; 256]).unwrap();
        let _ = pool.alloc_constant_buffer(&device, &[0u8; 1]).unwrap();
    }
}
