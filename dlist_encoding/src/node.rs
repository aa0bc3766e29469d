// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bytemuck::{Pod, Zeroable};

/// A single storage cell of an instruction stream.
///
/// The first cell of every instruction is a header holding the opcode in the
/// low 16 bits and the instruction size (in cells, header included) in the
/// high 16 bits. Every following cell holds the raw bits of one operand.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Node(pub u32);

static_assertions::assert_eq_size!(Node, u32);

impl Node {
    /// An all-zero cell.
    pub const ZERO: Self = Self(0);

    /// Creates an instruction header.
    pub const fn header(opcode: u16, inst_size: u16) -> Self {
        Self(opcode as u32 | (inst_size as u32) << 16)
    }

    /// The opcode of a header cell.
    pub const fn opcode(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    /// The instruction size of a header cell, in cells.
    pub const fn inst_size(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Rewrites the opcode of a header cell, keeping its size.
    pub fn set_opcode(&mut self, opcode: u16) {
        self.0 = (self.0 & 0xffff_0000) | opcode as u32;
    }

    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    pub const fn from_i32(value: i32) -> Self {
        Self(value as u32)
    }

    pub fn from_f32(value: f32) -> Self {
        Self(value.to_bits())
    }

    pub const fn from_bool(value: bool) -> Self {
        Self(value as u32)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }

    pub fn as_f32(self) -> f32 {
        f32::from_bits(self.0)
    }

    pub const fn as_bool(self) -> bool {
        self.0 != 0
    }
}

impl core::fmt::Debug for Node {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Node({:#010x})", self.0)
    }
}

/// Splits a 64-bit value into two cells, low word first.
pub const fn split_u64(value: u64) -> [Node; 2] {
    [Node(value as u32), Node((value >> 32) as u32)]
}

/// Joins two cells written by [`split_u64`].
pub const fn join_u64(cells: [Node; 2]) -> u64 {
    cells[0].0 as u64 | (cells[1].0 as u64) << 32
}

pub fn split_f64(value: f64) -> [Node; 2] {
    split_u64(value.to_bits())
}

pub fn join_f64(cells: [Node; 2]) -> f64 {
    f64::from_bits(join_u64(cells))
}

pub const fn split_i64(value: i64) -> [Node; 2] {
    split_u64(value as u64)
}

pub const fn join_i64(cells: [Node; 2]) -> i64 {
    join_u64(cells) as i64
}
