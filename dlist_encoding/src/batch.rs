// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::Node;

/// Descriptor of a geometry batch owned by the vertex buffer subsystem.
///
/// The display list only stores, moves and hands back this descriptor; the
/// buffers it names are managed elsewhere. It is embedded inline in the
/// instruction stream on an 8-byte boundary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct VertexBatch {
    /// Opaque handle of the vertex store holding the batch.
    pub buffer: u64,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub first_prim: u32,
    pub prim_count: u32,
    /// Offset of the "current attribute" snapshot taken at the end of the batch.
    pub current_offset: u32,
    /// Size in bytes of that snapshot; zero when there is none.
    pub current_size: u32,
}

/// Number of cells a [`VertexBatch`] occupies in the stream.
pub const VERTEX_BATCH_CELLS: usize = size_of::<VertexBatch>() / size_of::<Node>();

static_assertions::const_assert_eq!(size_of::<VertexBatch>() % size_of::<Node>(), 0);

impl VertexBatch {
    pub fn to_cells(self) -> [Node; VERTEX_BATCH_CELLS] {
        bytemuck::cast(self)
    }

    pub fn from_cells(cells: [Node; VERTEX_BATCH_CELLS]) -> Self {
        bytemuck::cast(cells)
    }
}
