// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The record path: appending calls to the list being built.

use std::borrow::Cow;

use dlist_encoding::gl::{self, GLenum};
use dlist_encoding::{
    encode, material_param_count, AllocError, BlockChain, Command, Instruction, Payloads,
};

use crate::unpack::{unpack_bitmap, unpack_image, UnpackError};
use crate::{Backend, Context, DisplayList, GlError, PixelStore};

/// Front and back copies of emission, ambient, diffuse, specular, shininess
/// and color indexes.
const MATERIAL_ATTRIBS: usize = 12;

#[derive(Copy, Clone, Debug, PartialEq)]
struct MaterialValue {
    size: usize,
    values: [f32; 4],
}

/// The list being compiled between `glNewList` and `glEndList`.
#[derive(Debug)]
pub(crate) struct ListState {
    pub(crate) name: u32,
    pub(crate) mode: GLenum,
    chain: BlockChain,
    payloads: Payloads,
    /// Last compiled shade model, `None` when unknown.
    shade_model: Option<GLenum>,
    /// Last compiled value of each material attribute.
    materials: [Option<MaterialValue>; MATERIAL_ATTRIBS],
    use_loopback: bool,
    out_of_memory: bool,
}

impl ListState {
    pub(crate) fn new(name: u32, mode: GLenum, max_blocks: usize) -> Result<Self, AllocError> {
        Ok(Self {
            name,
            mode,
            chain: BlockChain::new(max_blocks)?,
            payloads: Payloads::new(),
            shade_model: None,
            materials: [None; MATERIAL_ATTRIBS],
            use_loopback: false,
            out_of_memory: false,
        })
    }

    pub(crate) fn executes(&self) -> bool {
        self.mode == gl::COMPILE_AND_EXECUTE
    }

    /// Forgets the coalescing caches. Needed whenever control may leave the
    /// linear stream, since the called list can change any state.
    fn invalidate_state(&mut self) {
        self.shade_model = None;
        self.materials = [None; MATERIAL_ATTRIBS];
    }

    /// Records a material change. Returns `false` when every affected
    /// attribute already has this value.
    fn update_material(&mut self, face: GLenum, pname: GLenum, params: &[f32; 4]) -> bool {
        let Some(size) = material_param_count(pname) else {
            return true;
        };
        let mut values = [0.0; 4];
        values[..size].copy_from_slice(&params[..size]);
        let value = MaterialValue { size, values };
        let mut changed = false;
        for attrib in material_attribs(face, pname) {
            if self.materials[attrib] != Some(value) {
                self.materials[attrib] = Some(value);
                changed = true;
            }
        }
        changed
    }

    /// Seals the chain and returns the finished list and whether it needs
    /// the loopback rewrite.
    pub(crate) fn finish(mut self) -> (DisplayList, bool) {
        self.chain.seal();
        (
            DisplayList::from_chain(self.name, self.chain, self.payloads),
            self.use_loopback,
        )
    }
}

/// Indices of the material attributes touched by a `glMaterial` call.
fn material_attribs(face: GLenum, pname: GLenum) -> impl Iterator<Item = usize> {
    let kinds: &[usize] = match pname {
        gl::EMISSION => &[0],
        gl::AMBIENT => &[1],
        gl::DIFFUSE => &[2],
        gl::SPECULAR => &[3],
        gl::SHININESS => &[4],
        gl::COLOR_INDEXES => &[5],
        gl::AMBIENT_AND_DIFFUSE => &[1, 2],
        _ => &[],
    };
    let sides: &[usize] = match face {
        gl::FRONT => &[0],
        gl::BACK => &[1],
        gl::FRONT_AND_BACK => &[0, 1],
        _ => &[],
    };
    kinds
        .iter()
        .flat_map(move |kind| sides.iter().map(move |side| kind * 2 + side))
}

/// Flags passed along with a vertex batch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchFlags {
    /// Replay must copy the batch's final attributes into the current state.
    pub copy_current: bool,
    /// The batch depends on current attribute state set outside of it, so
    /// the finished list (and every list it calls) must use loopback replay.
    pub needs_loopback: bool,
}

/// Checks the arguments that are validated when a call is compiled.
pub(crate) fn validate(command: &Command<'_>) -> Result<(), (GlError, &'static str)> {
    let check = |ok: bool, error: GlError, message: &'static str| {
        if ok {
            Ok(())
        } else {
            Err((error, message))
        }
    };
    use GlError::{InvalidEnum, InvalidValue};
    match command {
        Command::ShadeModel(mode) => check(
            matches!(*mode, gl::FLAT | gl::SMOOTH),
            InvalidEnum,
            "glShadeModel(mode)",
        ),
        Command::MatrixMode(mode) => check(
            matches!(*mode, gl::MODELVIEW | gl::PROJECTION | gl::TEXTURE | gl::COLOR),
            InvalidEnum,
            "glMatrixMode(mode)",
        ),
        Command::CullFace(face) => check(gl::is_face(*face), InvalidEnum, "glCullFace(mode)"),
        Command::FrontFace(mode) => check(
            matches!(*mode, gl::CW | gl::CCW),
            InvalidEnum,
            "glFrontFace(mode)",
        ),
        Command::PolygonMode { face, mode } => {
            check(gl::is_face(*face), InvalidEnum, "glPolygonMode(face)")?;
            check(
                matches!(*mode, gl::POINT | gl::LINE | gl::FILL),
                InvalidEnum,
                "glPolygonMode(mode)",
            )
        }
        Command::AlphaFunc { func, .. } => {
            check(gl::is_compare_func(*func), InvalidEnum, "glAlphaFunc(func)")
        }
        Command::DepthFunc(func) => {
            check(gl::is_compare_func(*func), InvalidEnum, "glDepthFunc(func)")
        }
        Command::StencilFunc { func, .. } => {
            check(gl::is_compare_func(*func), InvalidEnum, "glStencilFunc(func)")
        }
        Command::BlendFunc { src, dst } => check(
            gl::is_blend_factor(*src) && gl::is_blend_factor(*dst),
            InvalidEnum,
            "glBlendFunc(factor)",
        ),
        Command::Material { face, pname, .. } => {
            check(gl::is_face(*face), InvalidEnum, "glMaterial(face)")?;
            check(
                material_param_count(*pname).is_some(),
                InvalidEnum,
                "glMaterial(pname)",
            )
        }
        Command::Uniform4fv { values, .. } => check(
            values.len() % 4 == 0,
            InvalidValue,
            "glUniform4fv(count)",
        ),
        _ => Ok(()),
    }
}

/// Calls that are executed immediately and never compiled.
fn is_proxy_call(command: &Command<'_>) -> bool {
    matches!(command, Command::TexImage2d { target, .. } if gl::is_proxy_texture_target(*target))
}

/// Copies client image data out with the current unpack state. Returns
/// `None` for calls without client data.
fn pack_client_data(
    command: &Command<'_>,
    unpack: &PixelStore,
) -> Option<Result<Command<'static>, (UnpackError, &'static str)>> {
    let packed = match command {
        Command::Bitmap {
            width,
            height,
            xorig,
            yorig,
            xmove,
            ymove,
            bitmap,
        } => unpack_bitmap(*width, *height, bitmap, unpack)
            .map(|bitmap| Command::Bitmap {
                width: *width,
                height: *height,
                xorig: *xorig,
                yorig: *yorig,
                xmove: *xmove,
                ymove: *ymove,
                bitmap: Cow::Owned(bitmap),
            })
            .map_err(|err| (err, "glBitmap")),
        Command::DrawPixels {
            width,
            height,
            format,
            ty,
            pixels,
        } => unpack_image(*width, *height, *format, *ty, pixels, unpack)
            .map(|pixels| Command::DrawPixels {
                width: *width,
                height: *height,
                format: *format,
                ty: *ty,
                pixels: Cow::Owned(pixels),
            })
            .map_err(|err| (err, "glDrawPixels")),
        Command::PolygonStipple(mask) => unpack_bitmap(32, 32, mask, unpack)
            .map(|mask| Command::PolygonStipple(Cow::Owned(mask)))
            .map_err(|err| (err, "glPolygonStipple")),
        Command::TexImage2d {
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            ty,
            pixels: Some(pixels),
        } => unpack_image(*width, *height, *format, *ty, pixels, unpack)
            .map(|pixels| Command::TexImage2d {
                target: *target,
                level: *level,
                internal_format: *internal_format,
                width: *width,
                height: *height,
                border: *border,
                format: *format,
                ty: *ty,
                pixels: Some(Cow::Owned(pixels)),
            })
            .map_err(|err| (err, "glTexImage2D")),
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
        } => unpack_image(*width, *height, *format, *ty, pixels, unpack)
            .map(|pixels| Command::TexSubImage2d {
                target: *target,
                level: *level,
                xoffset: *xoffset,
                yoffset: *yoffset,
                width: *width,
                height: *height,
                format: *format,
                ty: *ty,
                pixels: Cow::Owned(pixels),
            })
            .map_err(|err| (err, "glTexSubImage2D")),
        _ => return None,
    };
    Some(packed)
}

impl<B: Backend> Context<B> {
    /// Appends an instruction to the list being compiled.
    ///
    /// The first allocation failure raises `GL_OUT_OF_MEMORY`; the list keeps
    /// what was compiled so far and later instructions are dropped.
    fn emit(&mut self, inst: Instruction) {
        let Some(state) = self.current.as_mut() else {
            return;
        };
        if state.out_of_memory {
            return;
        }
        if let Err(err) = inst.commit(&mut state.chain, &mut state.payloads) {
            state.out_of_memory = true;
            log::warn!("list {}: {err}, dropping the rest of the list", state.name);
            self.backend
                .error(GlError::OutOfMemory, "display list construction");
        }
    }

    fn next_payload(&self) -> u32 {
        self.current
            .as_ref()
            .map_or(0, |state| state.payloads.next_index())
    }

    /// Records an error detected while compiling, so that replay raises it
    /// again. In `GL_COMPILE_AND_EXECUTE` mode it is also raised now.
    pub(crate) fn compile_error(&mut self, error: GlError, message: &str) {
        let Some(executes) = self.current.as_ref().map(ListState::executes) else {
            self.backend.error(error, message);
            return;
        };
        let inst = Instruction::error(error.code(), message, self.next_payload());
        self.emit(inst);
        if executes {
            self.backend.error(error, message);
        }
    }

    /// Compiles a GL call into the open list.
    pub(crate) fn record(&mut self, command: Command<'_>) {
        if is_proxy_call(&command) {
            self.execute(&command);
            return;
        }
        if let Err((error, message)) = validate(&command) {
            self.compile_error(error, message);
            return;
        }
        let Some(state) = self.current.as_mut() else {
            return;
        };
        let executes = state.executes();
        let coalesced = match &command {
            Command::ShadeModel(mode) => {
                let same = state.shade_model == Some(*mode);
                state.shade_model = Some(*mode);
                same
            }
            Command::Material {
                face,
                pname,
                params,
            } => !state.update_material(*face, *pname, params),
            // Restores state behind the caches' back.
            Command::PopAttrib => {
                state.invalidate_state();
                false
            }
            _ => false,
        };
        if !coalesced {
            let packed = match pack_client_data(&command, &self.unpack) {
                Some(Ok(packed)) => Some(packed),
                Some(Err((err, message))) => {
                    self.compile_error(err.gl_error(), message);
                    return;
                }
                None => None,
            };
            let stored = packed.as_ref().unwrap_or(&command);
            let inst = encode(stored, self.next_payload());
            self.emit(inst);
        }
        if executes {
            self.execute(&command);
        }
    }

    /// Compiles a `glCallList` or `glCallLists` whose arguments have been
    /// validated.
    pub(crate) fn record_call(&mut self, command: &Command<'_>) {
        let inst = encode(command, self.next_payload());
        self.emit(inst);
        if let Some(state) = self.current.as_mut() {
            state.invalidate_state();
        }
    }

    pub(crate) fn record_list_base(&mut self, base: u32) {
        let inst = encode(&Command::ListBase(base), self.next_payload());
        self.emit(inst);
    }

    /// Compiles a vertex batch handed over by the vertex buffer subsystem.
    pub(crate) fn record_vertex_batch(
        &mut self,
        batch: &dlist_encoding::VertexBatch,
        flags: BatchFlags,
    ) -> Option<bool> {
        let state = self.current.as_mut()?;
        state.use_loopback |= flags.needs_loopback;
        let executes = state.executes();
        let opcode = if flags.copy_current {
            dlist_encoding::Opcode::VertexListCopyCurrent
        } else {
            dlist_encoding::Opcode::VertexList
        };
        self.emit(Instruction::vertex_list(opcode, batch));
        Some(executes)
    }
}
