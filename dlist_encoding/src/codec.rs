// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion between [`Command`]s and instruction cells.
//!
//! Operands are written in declaration order: scalars take one cell, 64-bit
//! scalars two (low word first), fixed arrays one cell per element, and
//! variable-length buffers one cell holding an index into the list's
//! [`Payloads`].

use std::borrow::Cow;

use smallvec::SmallVec;
use thiserror::Error;

use crate::node::{join_u64, split_u64};
use crate::payload::NO_PAYLOAD;
use crate::{
    AllocError, BlockChain, Command, Cursor, Node, Opcode, Payload, Payloads, VertexBatch,
    VERTEX_BATCH_CELLS,
};

/// Errors raised while reading an instruction stream.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Unknown opcode {opcode} at {cursor:?}")]
    UnknownOpcode { opcode: u16, cursor: Cursor },
    #[error("Zero-sized instruction at {0:?}")]
    ZeroSize(Cursor),
    #[error("Instruction at {0:?} runs past the end of its segment")]
    Truncated(Cursor),
    #[error("Missing segment {0}")]
    MissingSegment(u32),
    #[error("Operands too short for {0:?}")]
    ShortOperands(Opcode),
    #[error("Missing payload {0}")]
    MissingPayload(u32),
    #[error("Payload {0} has an unexpected kind")]
    PayloadKind(u32),
    #[error("{0:?} is not a GL call")]
    NotACommand(Opcode),
}

/// An instruction staged for insertion into a list.
///
/// Payload indices are assigned relative to the `first_payload` given at
/// construction, so the staged payloads must be appended to the list's table
/// only once the instruction has been stored.
#[derive(Clone, Debug)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: SmallVec<[Node; 20]>,
    pub payloads: SmallVec<[Payload; 1]>,
    /// The payload must start on an 8-byte boundary.
    pub align8: bool,
    first_payload: u32,
}

impl Instruction {
    pub fn new(opcode: Opcode, first_payload: u32) -> Self {
        Self {
            opcode,
            operands: SmallVec::new(),
            payloads: SmallVec::new(),
            align8: false,
            first_payload,
        }
    }

    /// A deferred error, re-raised when the list is replayed.
    pub fn error(code: u32, message: &str, first_payload: u32) -> Self {
        let mut inst = Self::new(Opcode::Error, first_payload);
        inst.u32(code);
        inst.payload(Payload::Text(message.into()));
        inst
    }

    /// A vertex batch record. `opcode` must be one of the vertex list tags.
    pub fn vertex_list(opcode: Opcode, batch: &VertexBatch) -> Self {
        debug_assert!(opcode.is_vertex_list());
        let mut inst = Self::new(opcode, 0);
        inst.operands.extend_from_slice(&batch.to_cells());
        inst.align8 = true;
        inst
    }

    pub fn u32(&mut self, value: u32) {
        self.operands.push(Node::from_u32(value));
    }

    pub fn i32(&mut self, value: i32) {
        self.operands.push(Node::from_i32(value));
    }

    pub fn f32(&mut self, value: f32) {
        self.operands.push(Node::from_f32(value));
    }

    pub fn bool(&mut self, value: bool) {
        self.operands.push(Node::from_bool(value));
    }

    pub fn u64(&mut self, value: u64) {
        self.operands.extend_from_slice(&split_u64(value));
    }

    pub fn f64(&mut self, value: f64) {
        self.u64(value.to_bits());
    }

    pub fn floats(&mut self, values: &[f32]) {
        self.operands.extend(values.iter().copied().map(Node::from_f32));
    }

    pub fn payload(&mut self, payload: Payload) {
        let index = self.first_payload + self.payloads.len() as u32;
        self.payloads.push(payload);
        self.u32(index);
    }

    pub fn opt_payload(&mut self, payload: Option<Payload>) {
        match payload {
            Some(payload) => self.payload(payload),
            None => self.u32(NO_PAYLOAD),
        }
    }

    /// Stores the instruction in `chain` and moves its payloads into
    /// `payloads`. Nothing is stored on failure.
    pub fn commit(self, chain: &mut BlockChain, payloads: &mut Payloads) -> Result<(), AllocError> {
        debug_assert!(self.payloads.is_empty() || self.first_payload == payloads.next_index());
        chain.push(self.opcode, &self.operands, self.align8)?;
        payloads.extend(self.payloads);
        Ok(())
    }
}

fn bytes_payload(bytes: &[u8]) -> Payload {
    Payload::Bytes(bytes.into())
}

/// Encodes a call as an instruction whose payloads will be numbered from
/// `first_payload`.
pub fn encode(command: &Command<'_>, first_payload: u32) -> Instruction {
    let mut inst = Instruction::new(command.opcode(), first_payload);
    match command {
        Command::Accum { op, value } => {
            inst.u32(*op);
            inst.f32(*value);
        }
        Command::AlphaFunc { func, reference } => {
            inst.u32(*func);
            inst.f32(*reference);
        }
        Command::BlendColor(color) | Command::ClearColor(color) | Command::RasterPos(color) => {
            inst.floats(color);
        }
        Command::BlendFunc { src, dst } => {
            inst.u32(*src);
            inst.u32(*dst);
        }
        Command::Clear(mask) | Command::PushAttrib(mask) => inst.u32(*mask),
        Command::ClearDepth(depth) => inst.f64(*depth),
        Command::ColorMask(mask) => {
            for flag in mask {
                inst.bool(*flag);
            }
        }
        Command::CullFace(value)
        | Command::DepthFunc(value)
        | Command::Disable(value)
        | Command::Enable(value)
        | Command::FrontFace(value)
        | Command::MatrixMode(value)
        | Command::ShadeModel(value)
        | Command::StencilMask(value)
        | Command::UseProgram(value)
        | Command::CallList(value)
        | Command::ListBase(value) => inst.u32(*value),
        Command::DepthMask(flag) => inst.bool(*flag),
        Command::DepthRange { near, far } => {
            inst.f64(*near);
            inst.f64(*far);
        }
        Command::Fog { pname, params } | Command::LightModel { pname, params } => {
            inst.u32(*pname);
            inst.floats(params);
        }
        Command::Hint { target, mode } => {
            inst.u32(*target);
            inst.u32(*mode);
        }
        Command::Light {
            light: first,
            pname,
            params,
        }
        | Command::Material {
            face: first,
            pname,
            params,
        }
        | Command::TexParameter {
            target: first,
            pname,
            params,
        } => {
            inst.u32(*first);
            inst.u32(*pname);
            inst.floats(params);
        }
        Command::LineStipple { factor, pattern } => {
            inst.i32(*factor);
            inst.u32(u32::from(*pattern));
        }
        Command::LineWidth(value) | Command::PointSize(value) => inst.f32(*value),
        Command::PolygonMode { face, mode } => {
            inst.u32(*face);
            inst.u32(*mode);
        }
        Command::PopAttrib | Command::LoadIdentity | Command::PopMatrix | Command::PushMatrix => {}
        Command::Scissor {
            x,
            y,
            width,
            height,
        }
        | Command::Viewport {
            x,
            y,
            width,
            height,
        } => {
            inst.i32(*x);
            inst.i32(*y);
            inst.i32(*width);
            inst.i32(*height);
        }
        Command::StencilFunc {
            func,
            reference,
            mask,
        } => {
            inst.u32(*func);
            inst.i32(*reference);
            inst.u32(*mask);
        }
        Command::StencilOp { fail, zfail, zpass } => {
            inst.u32(*fail);
            inst.u32(*zfail);
            inst.u32(*zpass);
        }
        Command::Frustum(planes) | Command::Ortho(planes) => {
            for plane in planes {
                inst.f64(*plane);
            }
        }
        Command::LoadMatrix(m) | Command::MultMatrix(m) => inst.floats(m),
        Command::Rotate { angle, x, y, z } => inst.floats(&[*angle, *x, *y, *z]),
        Command::Scale(v) | Command::Translate(v) => inst.floats(v),
        Command::Attr1f { index, x } => {
            inst.u32(*index);
            inst.f32(*x);
        }
        Command::Attr2f { index, v } => {
            inst.u32(*index);
            inst.floats(v);
        }
        Command::Attr3f { index, v } => {
            inst.u32(*index);
            inst.floats(v);
        }
        Command::Attr4f { index, v } => {
            inst.u32(*index);
            inst.floats(v);
        }
        Command::BindTexture { target, texture } => {
            inst.u32(*target);
            inst.u32(*texture);
        }
        Command::Bitmap {
            width,
            height,
            xorig,
            yorig,
            xmove,
            ymove,
            bitmap,
        } => {
            inst.i32(*width);
            inst.i32(*height);
            inst.floats(&[*xorig, *yorig, *xmove, *ymove]);
            inst.payload(bytes_payload(bitmap));
        }
        Command::DrawPixels {
            width,
            height,
            format,
            ty,
            pixels,
        } => {
            inst.i32(*width);
            inst.i32(*height);
            inst.u32(*format);
            inst.u32(*ty);
            inst.payload(bytes_payload(pixels));
        }
        Command::PolygonStipple(mask) => inst.payload(bytes_payload(mask)),
        Command::TexImage2d {
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            ty,
            pixels,
        } => {
            inst.u32(*target);
            inst.i32(*level);
            inst.i32(*internal_format);
            inst.i32(*width);
            inst.i32(*height);
            inst.i32(*border);
            inst.u32(*format);
            inst.u32(*ty);
            inst.opt_payload(pixels.as_deref().map(bytes_payload));
        }
        Command::TexSubImage2d {
            target,
            level,
            xoffset,
            yoffset,
            width,
            height,
            format,
            ty,
            pixels,
        } => {
            inst.u32(*target);
            inst.i32(*level);
            inst.i32(*xoffset);
            inst.i32(*yoffset);
            inst.i32(*width);
            inst.i32(*height);
            inst.u32(*format);
            inst.u32(*ty);
            inst.payload(bytes_payload(pixels));
        }
        Command::ProgramString {
            target,
            format,
            program,
        } => {
            inst.u32(*target);
            inst.u32(*format);
            inst.payload(Payload::Text(program.as_ref().into()));
        }
        Command::Uniform1d { location, x } => {
            inst.i32(*location);
            inst.f64(*x);
        }
        Command::Uniform1i64 { location, x } => {
            inst.i32(*location);
            inst.u64(*x as u64);
        }
        Command::Uniform1ui64 { location, x } => {
            inst.i32(*location);
            inst.u64(*x);
        }
        Command::Uniform4fv { location, values } => {
            inst.i32(*location);
            inst.payload(Payload::Floats(values.as_ref().into()));
        }
        Command::CallLists { n, ty, lists } => {
            inst.i32(*n);
            inst.u32(*ty);
            inst.payload(bytes_payload(lists));
        }
    }
    inst
}

/// Sequential reader over the operand cells of one instruction.
#[derive(Clone, Debug)]
pub struct Operands<'a> {
    opcode: Opcode,
    cells: &'a [Node],
}

impl<'a> Operands<'a> {
    pub fn new(opcode: Opcode, cells: &'a [Node]) -> Self {
        Self { opcode, cells }
    }

    fn next(&mut self) -> Result<Node, DecodeError> {
        let (first, rest) = self
            .cells
            .split_first()
            .ok_or(DecodeError::ShortOperands(self.opcode))?;
        self.cells = rest;
        Ok(*first)
    }

    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        self.next().map(Node::as_u32)
    }

    pub fn i32(&mut self) -> Result<i32, DecodeError> {
        self.next().map(Node::as_i32)
    }

    pub fn f32(&mut self) -> Result<f32, DecodeError> {
        self.next().map(Node::as_f32)
    }

    pub fn bool(&mut self) -> Result<bool, DecodeError> {
        self.next().map(Node::as_bool)
    }

    pub fn u64(&mut self) -> Result<u64, DecodeError> {
        let low = self.next()?;
        let high = self.next()?;
        Ok(join_u64([low, high]))
    }

    pub fn f64(&mut self) -> Result<f64, DecodeError> {
        self.u64().map(f64::from_bits)
    }

    pub fn floats<const N: usize>(&mut self) -> Result<[f32; N], DecodeError> {
        let mut out = [0.0; N];
        for value in &mut out {
            *value = self.f32()?;
        }
        Ok(out)
    }

    pub fn f64s<const N: usize>(&mut self) -> Result<[f64; N], DecodeError> {
        let mut out = [0.0; N];
        for value in &mut out {
            *value = self.f64()?;
        }
        Ok(out)
    }
}

/// Decodes the operands of a GL call instruction.
///
/// Special instructions (`NOP`, `ERROR`, `CONTINUE`, `END_OF_LIST` and the
/// vertex list tags) are not calls and yield [`DecodeError::NotACommand`].
pub fn decode<'a>(
    opcode: Opcode,
    operands: &'a [Node],
    payloads: &'a Payloads,
) -> Result<Command<'a>, DecodeError> {
    let mut ops = Operands::new(opcode, operands);
    let bytes = |index: u32| payloads.bytes(index).map(Cow::Borrowed);
    let command = match opcode {
        Opcode::Nop
        | Opcode::Error
        | Opcode::Continue
        | Opcode::EndOfList
        | Opcode::VertexList
        | Opcode::VertexListCopyCurrent
        | Opcode::VertexListLoopback => return Err(DecodeError::NotACommand(opcode)),
        Opcode::CallList => Command::CallList(ops.u32()?),
        Opcode::CallLists => Command::CallLists {
            n: ops.i32()?,
            ty: ops.u32()?,
            lists: bytes(ops.u32()?)?,
        },
        Opcode::ListBase => Command::ListBase(ops.u32()?),
        Opcode::Accum => Command::Accum {
            op: ops.u32()?,
            value: ops.f32()?,
        },
        Opcode::AlphaFunc => Command::AlphaFunc {
            func: ops.u32()?,
            reference: ops.f32()?,
        },
        Opcode::BlendColor => Command::BlendColor(ops.floats()?),
        Opcode::BlendFunc => Command::BlendFunc {
            src: ops.u32()?,
            dst: ops.u32()?,
        },
        Opcode::Clear => Command::Clear(ops.u32()?),
        Opcode::ClearColor => Command::ClearColor(ops.floats()?),
        Opcode::ClearDepth => Command::ClearDepth(ops.f64()?),
        Opcode::ColorMask => {
            Command::ColorMask([ops.bool()?, ops.bool()?, ops.bool()?, ops.bool()?])
        }
        Opcode::CullFace => Command::CullFace(ops.u32()?),
        Opcode::DepthFunc => Command::DepthFunc(ops.u32()?),
        Opcode::DepthMask => Command::DepthMask(ops.bool()?),
        Opcode::DepthRange => Command::DepthRange {
            near: ops.f64()?,
            far: ops.f64()?,
        },
        Opcode::Disable => Command::Disable(ops.u32()?),
        Opcode::Enable => Command::Enable(ops.u32()?),
        Opcode::Fog => Command::Fog {
            pname: ops.u32()?,
            params: ops.floats()?,
        },
        Opcode::FrontFace => Command::FrontFace(ops.u32()?),
        Opcode::Hint => Command::Hint {
            target: ops.u32()?,
            mode: ops.u32()?,
        },
        Opcode::Light => Command::Light {
            light: ops.u32()?,
            pname: ops.u32()?,
            params: ops.floats()?,
        },
        Opcode::LightModel => Command::LightModel {
            pname: ops.u32()?,
            params: ops.floats()?,
        },
        Opcode::LineStipple => Command::LineStipple {
            factor: ops.i32()?,
            pattern: ops.u32()? as u16,
        },
        Opcode::LineWidth => Command::LineWidth(ops.f32()?),
        Opcode::Material => Command::Material {
            face: ops.u32()?,
            pname: ops.u32()?,
            params: ops.floats()?,
        },
        Opcode::PointSize => Command::PointSize(ops.f32()?),
        Opcode::PolygonMode => Command::PolygonMode {
            face: ops.u32()?,
            mode: ops.u32()?,
        },
        Opcode::PopAttrib => Command::PopAttrib,
        Opcode::PushAttrib => Command::PushAttrib(ops.u32()?),
        Opcode::Scissor => Command::Scissor {
            x: ops.i32()?,
            y: ops.i32()?,
            width: ops.i32()?,
            height: ops.i32()?,
        },
        Opcode::ShadeModel => Command::ShadeModel(ops.u32()?),
        Opcode::StencilFunc => Command::StencilFunc {
            func: ops.u32()?,
            reference: ops.i32()?,
            mask: ops.u32()?,
        },
        Opcode::StencilMask => Command::StencilMask(ops.u32()?),
        Opcode::StencilOp => Command::StencilOp {
            fail: ops.u32()?,
            zfail: ops.u32()?,
            zpass: ops.u32()?,
        },
        Opcode::Viewport => Command::Viewport {
            x: ops.i32()?,
            y: ops.i32()?,
            width: ops.i32()?,
            height: ops.i32()?,
        },
        Opcode::Frustum => Command::Frustum(ops.f64s()?),
        Opcode::LoadIdentity => Command::LoadIdentity,
        Opcode::LoadMatrix => Command::LoadMatrix(ops.floats()?),
        Opcode::MatrixMode => Command::MatrixMode(ops.u32()?),
        Opcode::MultMatrix => Command::MultMatrix(ops.floats()?),
        Opcode::Ortho => Command::Ortho(ops.f64s()?),
        Opcode::PopMatrix => Command::PopMatrix,
        Opcode::PushMatrix => Command::PushMatrix,
        Opcode::Rotate => {
            let [angle, x, y, z] = ops.floats()?;
            Command::Rotate { angle, x, y, z }
        }
        Opcode::Scale => Command::Scale(ops.floats()?),
        Opcode::Translate => Command::Translate(ops.floats()?),
        Opcode::Attr1f => Command::Attr1f {
            index: ops.u32()?,
            x: ops.f32()?,
        },
        Opcode::Attr2f => Command::Attr2f {
            index: ops.u32()?,
            v: ops.floats()?,
        },
        Opcode::Attr3f => Command::Attr3f {
            index: ops.u32()?,
            v: ops.floats()?,
        },
        Opcode::Attr4f => Command::Attr4f {
            index: ops.u32()?,
            v: ops.floats()?,
        },
        Opcode::RasterPos => Command::RasterPos(ops.floats()?),
        Opcode::BindTexture => Command::BindTexture {
            target: ops.u32()?,
            texture: ops.u32()?,
        },
        Opcode::Bitmap => {
            let width = ops.i32()?;
            let height = ops.i32()?;
            let [xorig, yorig, xmove, ymove] = ops.floats()?;
            Command::Bitmap {
                width,
                height,
                xorig,
                yorig,
                xmove,
                ymove,
                bitmap: bytes(ops.u32()?)?,
            }
        }
        Opcode::DrawPixels => Command::DrawPixels {
            width: ops.i32()?,
            height: ops.i32()?,
            format: ops.u32()?,
            ty: ops.u32()?,
            pixels: bytes(ops.u32()?)?,
        },
        Opcode::PolygonStipple => Command::PolygonStipple(bytes(ops.u32()?)?),
        Opcode::TexImage2d => Command::TexImage2d {
            target: ops.u32()?,
            level: ops.i32()?,
            internal_format: ops.i32()?,
            width: ops.i32()?,
            height: ops.i32()?,
            border: ops.i32()?,
            format: ops.u32()?,
            ty: ops.u32()?,
            pixels: match ops.u32()? {
                NO_PAYLOAD => None,
                index => Some(bytes(index)?),
            },
        },
        Opcode::TexParameter => Command::TexParameter {
            target: ops.u32()?,
            pname: ops.u32()?,
            params: ops.floats()?,
        },
        Opcode::TexSubImage2d => Command::TexSubImage2d {
            target: ops.u32()?,
            level: ops.i32()?,
            xoffset: ops.i32()?,
            yoffset: ops.i32()?,
            width: ops.i32()?,
            height: ops.i32()?,
            format: ops.u32()?,
            ty: ops.u32()?,
            pixels: bytes(ops.u32()?)?,
        },
        Opcode::ProgramString => Command::ProgramString {
            target: ops.u32()?,
            format: ops.u32()?,
            program: Cow::Borrowed(payloads.text(ops.u32()?)?),
        },
        Opcode::Uniform1d => Command::Uniform1d {
            location: ops.i32()?,
            x: ops.f64()?,
        },
        Opcode::Uniform1i64 => Command::Uniform1i64 {
            location: ops.i32()?,
            x: ops.u64()? as i64,
        },
        Opcode::Uniform1ui64 => Command::Uniform1ui64 {
            location: ops.i32()?,
            x: ops.u64()?,
        },
        Opcode::Uniform4fv => Command::Uniform4fv {
            location: ops.i32()?,
            values: Cow::Borrowed(payloads.floats(ops.u32()?)?),
        },
        Opcode::UseProgram => Command::UseProgram(ops.u32()?),
    };
    Ok(command)
}

/// Decodes the `(code, message)` pair of an `ERROR` instruction.
pub fn decode_error<'a>(
    operands: &'a [Node],
    payloads: &'a Payloads,
) -> Result<(u32, &'a str), DecodeError> {
    let mut ops = Operands::new(Opcode::Error, operands);
    let code = ops.u32()?;
    let message = payloads.text(ops.u32()?)?;
    Ok((code, message))
}

/// Decodes the descriptor embedded in a vertex list instruction.
pub fn decode_vertex_batch(opcode: Opcode, operands: &[Node]) -> Result<VertexBatch, DecodeError> {
    let cells: [Node; VERTEX_BATCH_CELLS] = operands
        .get(..VERTEX_BATCH_CELLS)
        .and_then(|cells| cells.try_into().ok())
        .ok_or(DecodeError::ShortOperands(opcode))?;
    Ok(VertexBatch::from_cells(cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl;

    fn round_trip(command: Command<'_>) {
        let mut payloads = Payloads::new();
        let inst = encode(&command, payloads.next_index());
        let opcode = inst.opcode;
        let operands = inst.operands.clone();
        payloads.extend(inst.payloads);
        let decoded = decode(opcode, &operands, &payloads).unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn scalar_operands() {
        round_trip(Command::Enable(gl::CULL_FACE));
        round_trip(Command::AlphaFunc {
            func: gl::GREATER,
            reference: 0.25,
        });
        round_trip(Command::StencilFunc {
            func: gl::EQUAL,
            reference: -3,
            mask: 0xffff_ffff,
        });
        round_trip(Command::ColorMask([true, false, true, false]));
        round_trip(Command::LineStipple {
            factor: 2,
            pattern: 0xf0f0,
        });
    }

    #[test]
    fn split_64_bit_operands() {
        round_trip(Command::ClearDepth(0.123_456_789_012_345_6));
        round_trip(Command::Ortho([-1.0, 1.0, -2.5, 2.5, 0.1, 1e300]));
        round_trip(Command::Uniform1i64 {
            location: 4,
            x: i64::MIN + 7,
        });
        round_trip(Command::Uniform1ui64 {
            location: 4,
            x: u64::MAX - 1,
        });
        round_trip(Command::Uniform1d {
            location: 0,
            x: -0.0,
        });
    }

    #[test]
    fn payload_operands() {
        round_trip(Command::Bitmap {
            width: 9,
            height: 2,
            xorig: 0.5,
            yorig: 1.0,
            xmove: 10.0,
            ymove: 0.0,
            bitmap: Cow::Borrowed(&[0xff, 0x80, 0x00, 0x80]),
        });
        round_trip(Command::TexImage2d {
            target: gl::TEXTURE_2D,
            level: 0,
            internal_format: gl::RGBA as i32,
            width: 0,
            height: 0,
            border: 0,
            format: gl::RGBA,
            ty: gl::UNSIGNED_BYTE,
            pixels: None,
        });
        round_trip(Command::ProgramString {
            target: gl::FRAGMENT_PROGRAM_ARB,
            format: gl::PROGRAM_FORMAT_ASCII_ARB,
            program: Cow::Borrowed("!!ARBfp1.0\nEND\n"),
        });
        round_trip(Command::Uniform4fv {
            location: 1,
            values: Cow::Borrowed(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
        });
    }

    #[test]
    fn payload_indices_follow_the_table() {
        let mut payloads = Payloads::new();
        payloads.push(Payload::Text("earlier".into()));
        let inst = encode(&Command::PolygonStipple(Cow::Borrowed(&[1u8; 128])), 1);
        assert_eq!(inst.operands[0].as_u32(), 1);
    }

    #[test]
    fn special_opcodes_are_not_commands() {
        let payloads = Payloads::new();
        assert_eq!(
            decode(Opcode::EndOfList, &[], &payloads),
            Err(DecodeError::NotACommand(Opcode::EndOfList))
        );
    }

    #[test]
    fn short_operands_are_reported() {
        let payloads = Payloads::new();
        assert_eq!(
            decode(Opcode::Viewport, &[Node(0), Node(0)], &payloads),
            Err(DecodeError::ShortOperands(Opcode::Viewport))
        );
    }

    #[test]
    fn vertex_batch_is_inline() {
        let batch = VertexBatch {
            buffer: 0xdead_beef_0000_0001,
            first_vertex: 3,
            vertex_count: 6,
            ..Default::default()
        };
        let inst = Instruction::vertex_list(Opcode::VertexList, &batch);
        assert!(inst.align8);
        assert_eq!(
            decode_vertex_batch(Opcode::VertexList, &inst.operands).unwrap(),
            batch
        );
    }
}
