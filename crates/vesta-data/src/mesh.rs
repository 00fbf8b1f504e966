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

//! Meshes, surfaces, and the vertex attribute vocabulary.
//!
//! A [`Mesh`] is a list of [`Surface`]s; each surface owns one GPU vertex
//! buffer per present [`VertexAttribute`] plus an index buffer, and
//! references its [`Material`](crate::material::Material) by handle.

use crate::material::MaterialId;
use vesta_core::renderer::api::{BufferAddressInfo, IndexFormat, VertexFormat};

/// A vertex attribute stream, in binding-slot order.
///
/// The declaration order is load-bearing: pipelines bind one vertex buffer
/// per used attribute in ascending attribute-index order, so this enum fixes
/// both the shader input locations and the buffer binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VertexAttribute {
    /// Object-space position. Always present.
    Position = 0,
    /// Object-space normal.
    Normal = 1,
    /// Object-space tangent.
    Tangent = 2,
    /// First texture coordinate set.
    Texcoord0 = 3,
    /// Second texture coordinate set.
    Texcoord1 = 4,
    /// First vertex color set.
    Color0 = 5,
    /// Second vertex color set.
    Color1 = 6,
    /// Previous-frame position, for motion vectors on animated meshes.
    PreviousPosition = 7,
}

impl VertexAttribute {
    /// Number of attribute kinds.
    pub const COUNT: usize = 8;

    /// All attributes in binding-slot order.
    pub const ALL: [VertexAttribute; Self::COUNT] = [
        VertexAttribute::Position,
        VertexAttribute::Normal,
        VertexAttribute::Tangent,
        VertexAttribute::Texcoord0,
        VertexAttribute::Texcoord1,
        VertexAttribute::Color0,
        VertexAttribute::Color1,
        VertexAttribute::PreviousPosition,
    ];

    /// The attribute's binding-slot index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The flag bit for this attribute.
    pub fn flag(self) -> VertexAttributeFlags {
        VertexAttributeFlags::from_bits(1 << (self as u32))
    }
}

/// A bit set of [`VertexAttribute`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeFlags {
    bits: u32,
}

impl VertexAttributeFlags {
    /// No attributes.
    pub const NONE: Self = Self { bits: 0 };
    /// Position attribute.
    pub const POSITION: Self = Self { bits: 1 << 0 };
    /// Normal attribute.
    pub const NORMAL: Self = Self { bits: 1 << 1 };
    /// Tangent attribute.
    pub const TANGENT: Self = Self { bits: 1 << 2 };
    /// First texture coordinate set.
    pub const TEXCOORD0: Self = Self { bits: 1 << 3 };
    /// Second texture coordinate set.
    pub const TEXCOORD1: Self = Self { bits: 1 << 4 };
    /// First vertex color set.
    pub const COLOR0: Self = Self { bits: 1 << 5 };
    /// Second vertex color set.
    pub const COLOR1: Self = Self { bits: 1 << 6 };
    /// Previous-frame position.
    pub const PREVIOUS_POSITION: Self = Self { bits: 1 << 7 };

    /// Creates a flag set from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Intersects two flag sets.
    pub const fn intersection(self, other: Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    /// Checks if all flags of `other` are set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if a specific attribute is set.
    pub fn contains_attribute(&self, attribute: VertexAttribute) -> bool {
        self.contains(attribute.flag())
    }

    /// Whether no attribute is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterates the set attributes in binding-slot order.
    pub fn iter(&self) -> impl Iterator<Item = VertexAttribute> + '_ {
        VertexAttribute::ALL
            .into_iter()
            .filter(|attr| self.contains_attribute(*attr))
    }
}

impl std::ops::BitOr for VertexAttributeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for VertexAttributeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl std::ops::BitAnd for VertexAttributeFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

/// One GPU vertex stream of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferInfo {
    /// The buffer range holding the stream.
    pub address: BufferAddressInfo,
    /// The per-vertex data format.
    pub format: VertexFormat,
    /// Number of vertices in the stream.
    pub count: u32,
}

/// The GPU index stream of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBufferInfo {
    /// The buffer range holding the indices.
    pub address: BufferAddressInfo,
    /// The index data format.
    pub format: IndexFormat,
    /// Number of indices.
    pub count: u32,
}

/// One drawable piece of a mesh with a single material.
#[derive(Debug)]
pub struct Surface {
    surface_id: u32,
    /// The surface's material handle.
    pub material: MaterialId,
    attributes: VertexAttributeFlags,
    vertex_buffers: [Option<VertexBufferInfo>; VertexAttribute::COUNT],
    /// The surface's index stream.
    pub index_buffer: IndexBufferInfo,
}

impl Surface {
    /// Creates a surface with no vertex streams registered yet.
    ///
    /// `surface_id` must be unique across the application; skinning systems
    /// key their per-surface output buffers by it.
    pub fn new(surface_id: u32, material: MaterialId, index_buffer: IndexBufferInfo) -> Self {
        Self {
            surface_id,
            material,
            attributes: VertexAttributeFlags::NONE,
            vertex_buffers: [None; VertexAttribute::COUNT],
            index_buffer,
        }
    }

    /// The application-unique surface ID.
    pub fn surface_id(&self) -> u32 {
        self.surface_id
    }

    /// Registers a vertex stream, marking its attribute as present.
    pub fn set_vertex_buffer(&mut self, attribute: VertexAttribute, info: VertexBufferInfo) {
        self.vertex_buffers[attribute.index()] = Some(info);
        self.attributes |= attribute.flag();
    }

    /// The vertex stream for an attribute, if present.
    pub fn vertex_buffer(&self, attribute: VertexAttribute) -> Option<&VertexBufferInfo> {
        self.vertex_buffers[attribute.index()].as_ref()
    }

    /// The set of attributes this surface supplies.
    pub fn attributes(&self) -> VertexAttributeFlags {
        self.attributes
    }
}

/// A renderable mesh: an ordered list of surfaces.
#[derive(Debug, Default)]
pub struct Mesh {
    surfaces: Vec<Surface>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a surface.
    pub fn push_surface(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    /// The mesh's surfaces in order.
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    /// A surface by position.
    pub fn surface(&self, index: usize) -> Option<&Surface> {
        self.surfaces.get(index)
    }
}

/// A weak handle to a mesh in a [`MeshStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// Flat storage for meshes.
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: Vec<Mesh>,
}

impl MeshStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mesh and returns its handle.
    pub fn add(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(mesh);
        id
    }

    /// Resolves a mesh handle.
    pub fn get(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0 as usize)
    }

    /// Number of meshes.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_index_buffer() -> IndexBufferInfo {
        IndexBufferInfo {
            address: BufferAddressInfo::default(),
            format: IndexFormat::Uint32,
            count: 36,
        }
    }

    #[test]
    fn test_attribute_flags_match_indices() {
        for attr in VertexAttribute::ALL {
            assert_eq!(attr.flag().bits(), 1 << attr.index());
        }
    }

    #[test]
    fn test_flags_iter_is_in_binding_order() {
        let flags =
            VertexAttributeFlags::TANGENT | VertexAttributeFlags::POSITION | VertexAttributeFlags::COLOR1;
        let attrs: Vec<VertexAttribute> = flags.iter().collect();
        assert_eq!(
            attrs,
            vec![
                VertexAttribute::Position,
                VertexAttribute::Tangent,
                VertexAttribute::Color1
            ]
        );
    }

    #[test]
    fn test_surface_tracks_registered_attributes() {
        let mut surface = Surface::new(0, MaterialId(0), dummy_index_buffer());
        assert!(surface.attributes().is_empty());

        surface.set_vertex_buffer(
            VertexAttribute::Position,
            VertexBufferInfo {
                address: BufferAddressInfo::default(),
                format: VertexFormat::Float32x3,
                count: 24,
            },
        );

        assert!(surface.attributes().contains_attribute(VertexAttribute::Position));
        assert!(!surface.attributes().contains_attribute(VertexAttribute::Normal));
        assert!(surface.vertex_buffer(VertexAttribute::Position).is_some());
        assert!(surface.vertex_buffer(VertexAttribute::Normal).is_none());
    }

    #[test]
    fn test_flag_intersection() {
        let a = VertexAttributeFlags::POSITION | VertexAttributeFlags::NORMAL;
        let b = VertexAttributeFlags::NORMAL | VertexAttributeFlags::TANGENT;
        assert_eq!(a & b, VertexAttributeFlags::NORMAL);
    }

    #[test]
    fn test_mesh_store_roundtrip() {
        let mut store = MeshStore::new();
        let mut mesh = Mesh::new();
        mesh.push_surface(Surface::new(1, MaterialId(0), dummy_index_buffer()));
        let id = store.add(mesh);

        let fetched = store.get(id).unwrap();
        assert_eq!(fetched.surfaces().len(), 1);
        assert_eq!(fetched.surface(0).unwrap().surface_id(), 1);
    }
}
