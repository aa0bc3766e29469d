// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt::{self, Write};

use crate::codec::{decode, decode_error, decode_vertex_batch};
use crate::stream::{Instructions, Segments};
use crate::{Cursor, Opcode, Payloads};

/// Writes a human readable listing of a stored list.
///
/// Each line holds the cursor of the instruction, its mnemonic and its
/// decoded operands. A malformed stream is reported inline and ends the
/// listing.
pub fn disassemble<S: Segments + ?Sized>(
    out: &mut impl Write,
    name: u32,
    segments: &S,
    start: Cursor,
    payloads: &Payloads,
) -> fmt::Result {
    writeln!(out, "START-LIST {name}")?;
    for inst in Instructions::new(segments, start) {
        let inst = match inst {
            Ok(inst) => inst,
            Err(err) => {
                writeln!(out, "  ERROR IN DISPLAY LIST: {err}")?;
                break;
            }
        };
        let Cursor { segment, pos } = inst.cursor;
        write!(out, "  {segment:>3}:{pos:<3} {:<22}", inst.opcode.name())?;
        match inst.opcode {
            Opcode::Nop => writeln!(out)?,
            Opcode::EndOfList => writeln!(out, "END-LIST {name}")?,
            Opcode::Continue => match inst.next_cursor() {
                Some(next) => writeln!(out, "-> block {}", next.segment)?,
                None => writeln!(out)?,
            },
            Opcode::Error => match decode_error(inst.operands, payloads) {
                Ok((code, message)) => writeln!(out, "{code:#06x} {message:?}")?,
                Err(err) => writeln!(out, "<{err}>")?,
            },
            op if op.is_vertex_list() => match decode_vertex_batch(op, inst.operands) {
                Ok(batch) => writeln!(out, "{batch:?}")?,
                Err(err) => writeln!(out, "<{err}>")?,
            },
            op => match decode(op, inst.operands, payloads) {
                Ok(command) => writeln!(out, "{command:?}")?,
                Err(err) => writeln!(out, "<{err}>")?,
            },
        }
    }
    Ok(())
}
