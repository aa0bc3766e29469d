// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The list interpreter.
//!
//! Nested calls are handled with an explicit stack of frames instead of
//! recursion, so a deep chain of `CALL_LIST`s cannot overflow the native
//! stack. The table lock is held by the caller for the whole traversal.

use std::mem;

use bytemuck::pod_read_unaligned;
use dlist_encoding::codec::{decode_error, decode_vertex_batch};
use dlist_encoding::gl::{self, GLenum};
use dlist_encoding::{decode, read_instruction, Command, Cursor, DecodeError, Opcode};
use smallvec::{smallvec, SmallVec};

use crate::{Backend, Context, GlError, ListTable, PixelStore, VertexListMode};

pub(crate) enum Frame {
    /// A list being executed, positioned at its next instruction.
    List { name: u32, cursor: Cursor },
    /// Lists still to be called for a `glCallLists`, with the base applied.
    Sequence { ids: Vec<u32>, next: usize },
}

impl Frame {
    pub(crate) fn call(name: u32) -> Self {
        Self::Sequence {
            ids: vec![name],
            next: 0,
        }
    }
}

type Frames = SmallVec<[Frame; 8]>;

enum Action {
    Enter(u32),
    Return,
    Step(u32, Cursor),
}

/// The result of executing one instruction.
enum Step {
    Next(Cursor),
    End,
    Call {
        next: Cursor,
        list: u32,
    },
    CallLists {
        next: Cursor,
        ty: GLenum,
        ids: Vec<u32>,
    },
}

/// Converts `glCallLists` ids to list offsets, before the list base is
/// added. Returns nothing for an unknown type.
pub(crate) fn translate_ids(ty: GLenum, bytes: &[u8]) -> Vec<u32> {
    let Some(size) = gl::call_lists_type_size(ty) else {
        return Vec::new();
    };
    bytes
        .chunks_exact(size)
        .map(|id| translate_id(ty, id))
        .collect()
}

fn translate_id(ty: GLenum, id: &[u8]) -> u32 {
    match ty {
        gl::BYTE => id[0] as i8 as u32,
        gl::UNSIGNED_BYTE => u32::from(id[0]),
        gl::SHORT => pod_read_unaligned::<i16>(id) as u32,
        gl::UNSIGNED_SHORT => u32::from(pod_read_unaligned::<u16>(id)),
        gl::INT => pod_read_unaligned::<i32>(id) as u32,
        gl::UNSIGNED_INT => pod_read_unaligned::<u32>(id),
        gl::FLOAT => pod_read_unaligned::<f32>(id).floor() as i32 as u32,
        gl::TWO_BYTES => (u32::from(id[0]) << 8) | u32::from(id[1]),
        gl::THREE_BYTES => (u32::from(id[0]) << 16) | (u32::from(id[1]) << 8) | u32::from(id[2]),
        _ => u32::from_be_bytes([id[0], id[1], id[2], id[3]]),
    }
}

fn set_cursor(frames: &mut Frames, next: Cursor) {
    if let Some(Frame::List { cursor, .. }) = frames.last_mut() {
        *cursor = next;
    }
}

impl<B: Backend> Context<B> {
    /// Executes `root` and everything it calls.
    pub(crate) fn run(&mut self, table: &mut ListTable, root: Frame) {
        let mut frames: Frames = smallvec![root];
        let mut depth = 0;
        while let Some(frame) = frames.last_mut() {
            let action = match frame {
                Frame::Sequence { ids, next } => match ids.get(*next) {
                    Some(&id) => {
                        *next += 1;
                        Action::Enter(id)
                    }
                    None => Action::Return,
                },
                Frame::List { name, cursor } => Action::Step(*name, *cursor),
            };
            match action {
                Action::Enter(name) => self.enter(table, &mut frames, &mut depth, name),
                Action::Return => {
                    frames.pop();
                }
                Action::Step(name, cursor) => match self.step(table, name, cursor) {
                    Step::Next(next) => set_cursor(&mut frames, next),
                    Step::End => {
                        frames.pop();
                        depth -= 1;
                    }
                    Step::Call { next, list } => {
                        set_cursor(&mut frames, next);
                        self.enter(table, &mut frames, &mut depth, list);
                    }
                    Step::CallLists { next, ty, ids } => {
                        set_cursor(&mut frames, next);
                        if let Some(frame) = self.call_lists_frame(table, ty, ids) {
                            frames.push(frame);
                        }
                    }
                },
            }
        }
    }

    /// Pushes a frame for list `name`. Missing lists are skipped silently,
    /// as are calls past the nesting limit.
    fn enter(&self, table: &ListTable, frames: &mut Frames, depth: &mut usize, name: u32) {
        let Some(list) = table.get(name) else {
            return;
        };
        if *depth >= self.config.max_list_nesting {
            log::debug!("call of list {name} skipped at nesting depth {depth}");
            return;
        }
        *depth += 1;
        let (_, head) = table.cells(list);
        frames.push(Frame::List { name, cursor: head });
    }

    /// Starts a `glCallLists`: either draws it through a bitmap atlas or
    /// returns the sequence of lists to call.
    pub(crate) fn call_lists_frame(
        &mut self,
        table: &mut ListTable,
        ty: GLenum,
        ids: Vec<u32>,
    ) -> Option<Frame> {
        if self.render_bitmap_atlas(table, ty, &ids) {
            return None;
        }
        let base = self.list_base;
        Some(Frame::Sequence {
            ids: ids.into_iter().map(|id| id.wrapping_add(base)).collect(),
            next: 0,
        })
    }

    fn corrupt(&mut self, name: u32, err: &DecodeError) -> Step {
        log::error!("list {name}: {err}");
        self.backend
            .problem(&format!("display list {name} is corrupt: {err}"));
        Step::End
    }

    fn step(&mut self, table: &ListTable, name: u32, cursor: Cursor) -> Step {
        let Some(list) = table.get(name) else {
            return Step::End;
        };
        let (cells, _) = table.cells(list);
        let inst = match read_instruction(&cells, cursor) {
            Ok(inst) => inst,
            Err(err) => return self.corrupt(name, &err),
        };
        log::trace!(
            "list {name} {}:{} {}",
            cursor.segment,
            cursor.pos,
            inst.opcode.name()
        );
        let next = inst.next_cursor();
        let payloads = list.payloads();
        let next_or_end = |next: Option<Cursor>| next.map_or(Step::End, Step::Next);
        match inst.opcode {
            Opcode::EndOfList => Step::End,
            Opcode::Nop | Opcode::Continue => next_or_end(next),
            Opcode::Error => {
                match decode_error(inst.operands, payloads) {
                    Ok((code, message)) => match GlError::from_code(code) {
                        Some(error) => self.backend.error(error, message),
                        None => log::error!("list {name}: unknown error code {code:#x}"),
                    },
                    Err(err) => return self.corrupt(name, &err),
                }
                next_or_end(next)
            }
            op @ (Opcode::VertexList
            | Opcode::VertexListCopyCurrent
            | Opcode::VertexListLoopback) => {
                let batch = match decode_vertex_batch(op, inst.operands) {
                    Ok(batch) => batch,
                    Err(err) => return self.corrupt(name, &err),
                };
                let mode = match op {
                    Opcode::VertexListCopyCurrent => VertexListMode::CopyCurrent,
                    Opcode::VertexListLoopback => VertexListMode::Loopback,
                    _ => VertexListMode::Replay,
                };
                self.backend.draw_vertex_list(&batch, mode);
                next_or_end(next)
            }
            op => {
                let command = match decode(op, inst.operands, payloads) {
                    Ok(command) => command,
                    Err(err) => return self.corrupt(name, &err),
                };
                let Some(next) = next else {
                    return Step::End;
                };
                match command {
                    Command::CallList(list) => Step::Call { next, list },
                    Command::CallLists { ty, lists, .. } => Step::CallLists {
                        next,
                        ty,
                        ids: translate_ids(ty, &lists),
                    },
                    Command::ListBase(base) => {
                        self.list_base = base;
                        Step::Next(next)
                    }
                    command => {
                        self.replay(&command);
                        Step::Next(next)
                    }
                }
            }
        }
    }

    /// Replays a compiled call. Image data in a list is already tightly
    /// packed, so image calls see [`PixelStore::TIGHT`].
    fn replay(&mut self, command: &Command<'_>) {
        if command.uses_unpack_state() {
            let client = mem::replace(&mut self.unpack, PixelStore::TIGHT);
            self.backend.call(command, &self.unpack);
            self.unpack = client;
        } else {
            self.backend.call(command, &self.unpack);
        }
    }
}
