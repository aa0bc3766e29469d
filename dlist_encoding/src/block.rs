// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

use crate::{Node, Opcode};

/// Capacity of one block, in cells.
pub const BLOCK_SIZE: usize = 256;

/// Cells taken by a `CONTINUE` instruction: the header and the index of the
/// next block.
pub const CONTINUE_SIZE: usize = 2;

/// Largest instruction (header included) a block can hold.
pub const MAX_INSTRUCTION_SIZE: usize = BLOCK_SIZE - CONTINUE_SIZE;

/// Errors raised while reserving space for an instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
    /// A new block could not be obtained.
    #[error("Out of memory while building display list")]
    OutOfMemory,
    /// The instruction cannot fit in any block.
    #[error("Instruction of {0} cells exceeds the block capacity")]
    TooLarge(usize),
}

/// Position of an instruction header inside a list's storage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cursor {
    /// Index of the segment (block) holding the instruction.
    pub segment: u32,
    /// Cell index inside that segment.
    pub pos: u32,
}

impl Cursor {
    pub const fn new(segment: u32, pos: u32) -> Self {
        Self { segment, pos }
    }
}

/// A growing chain of fixed-capacity blocks.
///
/// # Invariants
///
/// * Every block but the last ends with exactly one `CONTINUE` instruction
///   naming the index of the following block.
/// * The current block always keeps [`CONTINUE_SIZE`] free cells after the
///   last instruction, so a link (or the end-of-list marker) can be written.
#[derive(Clone, Debug)]
pub struct BlockChain {
    blocks: Vec<Vec<Node>>,
    max_blocks: usize,
    sealed: bool,
}

impl BlockChain {
    /// Creates a chain with one empty block.
    ///
    /// `max_blocks` bounds the number of blocks the chain may ever hold.
    pub fn new(max_blocks: usize) -> Result<Self, AllocError> {
        let mut chain = Self {
            blocks: Vec::new(),
            max_blocks: max_blocks.max(1),
            sealed: false,
        };
        let block = chain.new_block()?;
        chain.blocks.push(block);
        Ok(chain)
    }

    fn new_block(&self) -> Result<Vec<Node>, AllocError> {
        if self.blocks.len() >= self.max_blocks {
            return Err(AllocError::OutOfMemory);
        }
        let mut block = Vec::new();
        block
            .try_reserve_exact(BLOCK_SIZE)
            .map_err(|_| AllocError::OutOfMemory)?;
        Ok(block)
    }

    fn current(&mut self) -> &mut Vec<Node> {
        // The constructor pushes the first block and blocks are never removed.
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    /// Reserves a zeroed instruction of `1 + payload_len` cells and returns
    /// its payload.
    ///
    /// When `align8` is set, the payload starts on an even cell index; a
    /// single `NOP` cell is inserted in front of the header if needed. When
    /// the current block is too full, a `CONTINUE` is written and a new block
    /// is opened first. On failure nothing is written: every instruction
    /// already in the chain stays decodable.
    pub fn allocate(
        &mut self,
        opcode: Opcode,
        payload_len: usize,
        align8: bool,
    ) -> Result<&mut [Node], AllocError> {
        debug_assert!(!self.sealed, "allocating in a sealed chain");
        let size = 1 + payload_len;
        if size > MAX_INSTRUCTION_SIZE - usize::from(align8) {
            return Err(AllocError::TooLarge(size));
        }
        let mut pos = self.current().len();
        let mut pad = align8 && (pos + 1) % 2 == 1;
        if pos + usize::from(pad) + size + CONTINUE_SIZE > BLOCK_SIZE {
            let block = self.new_block()?;
            let next = self.blocks.len() as u32;
            let current = self.current();
            current.push(Node::header(Opcode::Continue as u16, CONTINUE_SIZE as u16));
            current.push(Node::from_u32(next));
            self.blocks.push(block);
            pos = 0;
            pad = align8;
        }
        let current = self.current();
        if pad {
            current.push(Node::header(Opcode::Nop as u16, 1));
            pos += 1;
        }
        current.push(Node::header(opcode as u16, size as u16));
        current.resize(pos + size, Node::ZERO);
        Ok(&mut current[pos + 1..pos + size])
    }

    /// Appends an instruction with the given operands.
    pub fn push(
        &mut self,
        opcode: Opcode,
        operands: &[Node],
        align8: bool,
    ) -> Result<(), AllocError> {
        self.allocate(opcode, operands.len(), align8)?
            .copy_from_slice(operands);
        Ok(())
    }

    /// Terminates the chain with `END_OF_LIST`. Never fails.
    pub fn seal(&mut self) {
        if !self.sealed {
            self.current()
                .push(Node::header(Opcode::EndOfList as u16, 1));
            self.sealed = true;
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Cells in use across all blocks, links included.
    pub fn occupied_cells(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    pub fn blocks(&self) -> &[Vec<Node>] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Vec<Node>> {
        self.blocks
    }
}
