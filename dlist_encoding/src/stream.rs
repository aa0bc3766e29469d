// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Walking the instructions of a stored list.

use crate::{Cursor, DecodeError, Node, Opcode};

/// Storage that can be addressed by [`Cursor`].
pub trait Segments {
    fn segment(&self, index: u32) -> Option<&[Node]>;
}

/// A block chain: one segment per block.
impl Segments for [Vec<Node>] {
    fn segment(&self, index: u32) -> Option<&[Node]> {
        self.get(index as usize).map(Vec::as_slice)
    }
}

/// Contiguous storage: a single segment with index 0.
impl Segments for [Node] {
    fn segment(&self, index: u32) -> Option<&[Node]> {
        (index == 0).then_some(self)
    }
}

/// One undecoded instruction.
#[derive(Copy, Clone, Debug)]
pub struct RawInstruction<'a> {
    pub cursor: Cursor,
    pub opcode: Opcode,
    /// Cells following the header.
    pub operands: &'a [Node],
}

impl RawInstruction<'_> {
    /// Size in cells, header included.
    pub fn size(&self) -> usize {
        self.operands.len() + 1
    }

    /// Where the following instruction starts, or `None` after `END_OF_LIST`.
    ///
    /// `CONTINUE` moves to the start of the block it names.
    pub fn next_cursor(&self) -> Option<Cursor> {
        match self.opcode {
            Opcode::EndOfList => None,
            Opcode::Continue => Some(Cursor::new(self.operands.first()?.as_u32(), 0)),
            _ => Some(Cursor::new(
                self.cursor.segment,
                self.cursor.pos + self.size() as u32,
            )),
        }
    }
}

/// Reads the instruction starting at `cursor`.
pub fn read_instruction<S: Segments + ?Sized>(
    segments: &S,
    cursor: Cursor,
) -> Result<RawInstruction<'_>, DecodeError> {
    let segment = segments
        .segment(cursor.segment)
        .ok_or(DecodeError::MissingSegment(cursor.segment))?;
    let pos = cursor.pos as usize;
    let header = segment.get(pos).ok_or(DecodeError::Truncated(cursor))?;
    let opcode = Opcode::from_u16(header.opcode()).ok_or(DecodeError::UnknownOpcode {
        opcode: header.opcode(),
        cursor,
    })?;
    let size = header.inst_size() as usize;
    if size == 0 {
        return Err(DecodeError::ZeroSize(cursor));
    }
    let operands = segment
        .get(pos + 1..pos + size)
        .ok_or(DecodeError::Truncated(cursor))?;
    if opcode == Opcode::Continue && operands.is_empty() {
        return Err(DecodeError::ShortOperands(opcode));
    }
    Ok(RawInstruction {
        cursor,
        opcode,
        operands,
    })
}

/// Iterates over every instruction of a list, `CONTINUE` and `END_OF_LIST`
/// included. Iteration stops after `END_OF_LIST` or the first error.
#[derive(Clone, Debug)]
pub struct Instructions<'a, S: ?Sized> {
    segments: &'a S,
    cursor: Option<Cursor>,
}

impl<'a, S: Segments + ?Sized> Instructions<'a, S> {
    pub fn new(segments: &'a S, start: Cursor) -> Self {
        Self {
            segments,
            cursor: Some(start),
        }
    }
}

impl<'a, S: Segments + ?Sized> Iterator for Instructions<'a, S> {
    type Item = Result<RawInstruction<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        let result = read_instruction(self.segments, cursor);
        if let Ok(inst) = &result {
            self.cursor = inst.next_cursor();
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockChain;

    #[test]
    fn walks_across_blocks() {
        let mut chain = BlockChain::new(usize::MAX).unwrap();
        for i in 0..200 {
            chain.push(Opcode::LineWidth, &[Node(i)], false).unwrap();
        }
        chain.seal();
        let blocks = chain.blocks();
        let ops: Vec<_> = Instructions::new(blocks, Cursor::default())
            .map(|inst| inst.unwrap().opcode)
            .collect();
        assert_eq!(ops.len(), 200 + 2);
        assert_eq!(ops.iter().filter(|op| **op == Opcode::Continue).count(), 1);
        assert_eq!(ops.last(), Some(&Opcode::EndOfList));
    }

    #[test]
    fn contiguous_storage() {
        let cells = [
            Node::header(Opcode::Nop as u16, 1),
            Node::header(Opcode::Enable as u16, 2),
            Node(0x0b44),
            Node::header(Opcode::EndOfList as u16, 1),
        ];
        let insts: Vec<_> = Instructions::new(&cells[..], Cursor::new(0, 1))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(insts.len(), 2);
        assert_eq!(insts[0].operands, &[Node(0x0b44)]);
    }

    #[test]
    fn malformed_headers_stop_iteration() {
        let cells = [Node::header(0x7777, 1), Node::ZERO];
        let mut insts = Instructions::new(&cells[..], Cursor::default());
        assert!(matches!(
            insts.next(),
            Some(Err(DecodeError::UnknownOpcode { opcode: 0x7777, .. }))
        ));
        assert!(insts.next().is_none());

        let zero = [Node::ZERO];
        assert_eq!(
            read_instruction(&zero[..], Cursor::default()).unwrap_err(),
            DecodeError::ZeroSize(Cursor::default())
        );

        let short = [Node::header(Opcode::Enable as u16, 4), Node(1)];
        assert_eq!(
            read_instruction(&short[..], Cursor::default()).unwrap_err(),
            DecodeError::Truncated(Cursor::default())
        );
    }
}
