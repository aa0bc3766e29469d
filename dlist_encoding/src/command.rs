// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::borrow::Cow;

use crate::gl::{GLbitfield, GLenum};
use crate::Opcode;

/// A single GL call with its decoded arguments.
///
/// This is the one representation shared by the direct path, the recorder and
/// the interpreter: replaying a list hands the backend exactly the value a
/// direct call would have produced. Variable-length arguments borrow from
/// the caller (direct path) or from the list's payload table (replay).
#[derive(Clone, Debug, PartialEq)]
pub enum Command<'a> {
    Accum {
        op: GLenum,
        value: f32,
    },
    AlphaFunc {
        func: GLenum,
        reference: f32,
    },
    BlendColor([f32; 4]),
    BlendFunc {
        src: GLenum,
        dst: GLenum,
    },
    Clear(GLbitfield),
    ClearColor([f32; 4]),
    ClearDepth(f64),
    ColorMask([bool; 4]),
    CullFace(GLenum),
    DepthFunc(GLenum),
    DepthMask(bool),
    DepthRange {
        near: f64,
        far: f64,
    },
    Disable(GLenum),
    Enable(GLenum),
    Fog {
        pname: GLenum,
        params: [f32; 4],
    },
    FrontFace(GLenum),
    Hint {
        target: GLenum,
        mode: GLenum,
    },
    Light {
        light: GLenum,
        pname: GLenum,
        params: [f32; 4],
    },
    LightModel {
        pname: GLenum,
        params: [f32; 4],
    },
    LineStipple {
        factor: i32,
        pattern: u16,
    },
    LineWidth(f32),
    /// `glMaterialfv`. Only the first [`material_param_count`] values of
    /// `params` are meaningful.
    Material {
        face: GLenum,
        pname: GLenum,
        params: [f32; 4],
    },
    PointSize(f32),
    PolygonMode {
        face: GLenum,
        mode: GLenum,
    },
    PopAttrib,
    PushAttrib(GLbitfield),
    Scissor {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    ShadeModel(GLenum),
    StencilFunc {
        func: GLenum,
        reference: i32,
        mask: u32,
    },
    StencilMask(u32),
    StencilOp {
        fail: GLenum,
        zfail: GLenum,
        zpass: GLenum,
    },
    Viewport {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    /// `left, right, bottom, top, near, far`
    Frustum([f64; 6]),
    LoadIdentity,
    LoadMatrix([f32; 16]),
    MatrixMode(GLenum),
    MultMatrix([f32; 16]),
    /// `left, right, bottom, top, near, far`
    Ortho([f64; 6]),
    PopMatrix,
    PushMatrix,
    Rotate {
        angle: f32,
        x: f32,
        y: f32,
        z: f32,
    },
    Scale([f32; 3]),
    Translate([f32; 3]),

    Attr1f {
        index: u32,
        x: f32,
    },
    Attr2f {
        index: u32,
        v: [f32; 2],
    },
    Attr3f {
        index: u32,
        v: [f32; 3],
    },
    Attr4f {
        index: u32,
        v: [f32; 4],
    },
    RasterPos([f32; 4]),

    BindTexture {
        target: GLenum,
        texture: u32,
    },
    Bitmap {
        width: i32,
        height: i32,
        xorig: f32,
        yorig: f32,
        xmove: f32,
        ymove: f32,
        bitmap: Cow<'a, [u8]>,
    },
    DrawPixels {
        width: i32,
        height: i32,
        format: GLenum,
        ty: GLenum,
        pixels: Cow<'a, [u8]>,
    },
    /// A 32x32 stipple pattern, one bit per pixel.
    PolygonStipple(Cow<'a, [u8]>),
    TexImage2d {
        target: GLenum,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        border: i32,
        format: GLenum,
        ty: GLenum,
        pixels: Option<Cow<'a, [u8]>>,
    },
    TexParameter {
        target: GLenum,
        pname: GLenum,
        params: [f32; 4],
    },
    TexSubImage2d {
        target: GLenum,
        level: i32,
        xoffset: i32,
        yoffset: i32,
        width: i32,
        height: i32,
        format: GLenum,
        ty: GLenum,
        pixels: Cow<'a, [u8]>,
    },

    ProgramString {
        target: GLenum,
        format: GLenum,
        program: Cow<'a, str>,
    },
    Uniform1d {
        location: i32,
        x: f64,
    },
    Uniform1i64 {
        location: i32,
        x: i64,
    },
    Uniform1ui64 {
        location: i32,
        x: u64,
    },
    /// `glUniform4fv`; `values.len()` is four times the vector count.
    Uniform4fv {
        location: i32,
        values: Cow<'a, [f32]>,
    },
    UseProgram(u32),

    CallList(u32),
    /// `glCallLists`. `lists` holds `n` ids of type `ty` in native byte order.
    CallLists {
        n: i32,
        ty: GLenum,
        lists: Cow<'a, [u8]>,
    },
    ListBase(u32),
}

impl Command<'_> {
    /// The opcode this call is recorded under.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Accum { .. } => Opcode::Accum,
            Self::AlphaFunc { .. } => Opcode::AlphaFunc,
            Self::BlendColor(_) => Opcode::BlendColor,
            Self::BlendFunc { .. } => Opcode::BlendFunc,
            Self::Clear(_) => Opcode::Clear,
            Self::ClearColor(_) => Opcode::ClearColor,
            Self::ClearDepth(_) => Opcode::ClearDepth,
            Self::ColorMask(_) => Opcode::ColorMask,
            Self::CullFace(_) => Opcode::CullFace,
            Self::DepthFunc(_) => Opcode::DepthFunc,
            Self::DepthMask(_) => Opcode::DepthMask,
            Self::DepthRange { .. } => Opcode::DepthRange,
            Self::Disable(_) => Opcode::Disable,
            Self::Enable(_) => Opcode::Enable,
            Self::Fog { .. } => Opcode::Fog,
            Self::FrontFace(_) => Opcode::FrontFace,
            Self::Hint { .. } => Opcode::Hint,
            Self::Light { .. } => Opcode::Light,
            Self::LightModel { .. } => Opcode::LightModel,
            Self::LineStipple { .. } => Opcode::LineStipple,
            Self::LineWidth(_) => Opcode::LineWidth,
            Self::Material { .. } => Opcode::Material,
            Self::PointSize(_) => Opcode::PointSize,
            Self::PolygonMode { .. } => Opcode::PolygonMode,
            Self::PopAttrib => Opcode::PopAttrib,
            Self::PushAttrib(_) => Opcode::PushAttrib,
            Self::Scissor { .. } => Opcode::Scissor,
            Self::ShadeModel(_) => Opcode::ShadeModel,
            Self::StencilFunc { .. } => Opcode::StencilFunc,
            Self::StencilMask(_) => Opcode::StencilMask,
            Self::StencilOp { .. } => Opcode::StencilOp,
            Self::Viewport { .. } => Opcode::Viewport,
            Self::Frustum(_) => Opcode::Frustum,
            Self::LoadIdentity => Opcode::LoadIdentity,
            Self::LoadMatrix(_) => Opcode::LoadMatrix,
            Self::MatrixMode(_) => Opcode::MatrixMode,
            Self::MultMatrix(_) => Opcode::MultMatrix,
            Self::Ortho(_) => Opcode::Ortho,
            Self::PopMatrix => Opcode::PopMatrix,
            Self::PushMatrix => Opcode::PushMatrix,
            Self::Rotate { .. } => Opcode::Rotate,
            Self::Scale(_) => Opcode::Scale,
            Self::Translate(_) => Opcode::Translate,
            Self::Attr1f { .. } => Opcode::Attr1f,
            Self::Attr2f { .. } => Opcode::Attr2f,
            Self::Attr3f { .. } => Opcode::Attr3f,
            Self::Attr4f { .. } => Opcode::Attr4f,
            Self::RasterPos(_) => Opcode::RasterPos,
            Self::BindTexture { .. } => Opcode::BindTexture,
            Self::Bitmap { .. } => Opcode::Bitmap,
            Self::DrawPixels { .. } => Opcode::DrawPixels,
            Self::PolygonStipple(_) => Opcode::PolygonStipple,
            Self::TexImage2d { .. } => Opcode::TexImage2d,
            Self::TexParameter { .. } => Opcode::TexParameter,
            Self::TexSubImage2d { .. } => Opcode::TexSubImage2d,
            Self::ProgramString { .. } => Opcode::ProgramString,
            Self::Uniform1d { .. } => Opcode::Uniform1d,
            Self::Uniform1i64 { .. } => Opcode::Uniform1i64,
            Self::Uniform1ui64 { .. } => Opcode::Uniform1ui64,
            Self::Uniform4fv { .. } => Opcode::Uniform4fv,
            Self::UseProgram(_) => Opcode::UseProgram,
            Self::CallList(_) => Opcode::CallList,
            Self::CallLists { .. } => Opcode::CallLists,
            Self::ListBase(_) => Opcode::ListBase,
        }
    }

    /// Returns `true` for calls that carry client pixel data and are affected
    /// by the pixel unpack state.
    pub fn uses_unpack_state(&self) -> bool {
        matches!(
            self,
            Self::Bitmap { .. }
                | Self::DrawPixels { .. }
                | Self::PolygonStipple(_)
                | Self::TexImage2d { .. }
                | Self::TexSubImage2d { .. }
        )
    }

    /// Detaches the command from any borrowed buffers.
    pub fn into_owned(self) -> Command<'static> {
        fn own<T: ToOwned + ?Sized + 'static>(data: Cow<'_, T>) -> Cow<'static, T> {
            Cow::Owned(data.into_owned())
        }
        match self {
            Self::Bitmap {
                width,
                height,
                xorig,
                yorig,
                xmove,
                ymove,
                bitmap,
            } => Command::Bitmap {
                width,
                height,
                xorig,
                yorig,
                xmove,
                ymove,
                bitmap: own(bitmap),
            },
            Self::DrawPixels {
                width,
                height,
                format,
                ty,
                pixels,
            } => Command::DrawPixels {
                width,
                height,
                format,
                ty,
                pixels: own(pixels),
            },
            Self::PolygonStipple(mask) => Command::PolygonStipple(own(mask)),
            Self::TexImage2d {
                target,
                level,
                internal_format,
                width,
                height,
                border,
                format,
                ty,
                pixels,
            } => Command::TexImage2d {
                target,
                level,
                internal_format,
                width,
                height,
                border,
                format,
                ty,
                pixels: pixels.map(own),
            },
            Self::TexSubImage2d {
                target,
                level,
                xoffset,
                yoffset,
                width,
                height,
                format,
                ty,
                pixels,
            } => Command::TexSubImage2d {
                target,
                level,
                xoffset,
                yoffset,
                width,
                height,
                format,
                ty,
                pixels: own(pixels),
            },
            Self::ProgramString {
                target,
                format,
                program,
            } => Command::ProgramString {
                target,
                format,
                program: own(program),
            },
            Self::Uniform4fv { location, values } => Command::Uniform4fv {
                location,
                values: own(values),
            },
            Self::CallLists { n, ty, lists } => Command::CallLists {
                n,
                ty,
                lists: own(lists),
            },
            Self::Accum { op, value } => Command::Accum { op, value },
            Self::AlphaFunc { func, reference } => Command::AlphaFunc { func, reference },
            Self::BlendColor(c) => Command::BlendColor(c),
            Self::BlendFunc { src, dst } => Command::BlendFunc { src, dst },
            Self::Clear(mask) => Command::Clear(mask),
            Self::ClearColor(c) => Command::ClearColor(c),
            Self::ClearDepth(depth) => Command::ClearDepth(depth),
            Self::ColorMask(mask) => Command::ColorMask(mask),
            Self::CullFace(mode) => Command::CullFace(mode),
            Self::DepthFunc(func) => Command::DepthFunc(func),
            Self::DepthMask(flag) => Command::DepthMask(flag),
            Self::DepthRange { near, far } => Command::DepthRange { near, far },
            Self::Disable(cap) => Command::Disable(cap),
            Self::Enable(cap) => Command::Enable(cap),
            Self::Fog { pname, params } => Command::Fog { pname, params },
            Self::FrontFace(mode) => Command::FrontFace(mode),
            Self::Hint { target, mode } => Command::Hint { target, mode },
            Self::Light {
                light,
                pname,
                params,
            } => Command::Light {
                light,
                pname,
                params,
            },
            Self::LightModel { pname, params } => Command::LightModel { pname, params },
            Self::LineStipple { factor, pattern } => Command::LineStipple { factor, pattern },
            Self::LineWidth(width) => Command::LineWidth(width),
            Self::Material {
                face,
                pname,
                params,
            } => Command::Material {
                face,
                pname,
                params,
            },
            Self::PointSize(size) => Command::PointSize(size),
            Self::PolygonMode { face, mode } => Command::PolygonMode { face, mode },
            Self::PopAttrib => Command::PopAttrib,
            Self::PushAttrib(mask) => Command::PushAttrib(mask),
            Self::Scissor {
                x,
                y,
                width,
                height,
            } => Command::Scissor {
                x,
                y,
                width,
                height,
            },
            Self::ShadeModel(mode) => Command::ShadeModel(mode),
            Self::StencilFunc {
                func,
                reference,
                mask,
            } => Command::StencilFunc {
                func,
                reference,
                mask,
            },
            Self::StencilMask(mask) => Command::StencilMask(mask),
            Self::StencilOp { fail, zfail, zpass } => Command::StencilOp { fail, zfail, zpass },
            Self::Viewport {
                x,
                y,
                width,
                height,
            } => Command::Viewport {
                x,
                y,
                width,
                height,
            },
            Self::Frustum(planes) => Command::Frustum(planes),
            Self::LoadIdentity => Command::LoadIdentity,
            Self::LoadMatrix(m) => Command::LoadMatrix(m),
            Self::MatrixMode(mode) => Command::MatrixMode(mode),
            Self::MultMatrix(m) => Command::MultMatrix(m),
            Self::Ortho(planes) => Command::Ortho(planes),
            Self::PopMatrix => Command::PopMatrix,
            Self::PushMatrix => Command::PushMatrix,
            Self::Rotate { angle, x, y, z } => Command::Rotate { angle, x, y, z },
            Self::Scale(v) => Command::Scale(v),
            Self::Translate(v) => Command::Translate(v),
            Self::Attr1f { index, x } => Command::Attr1f { index, x },
            Self::Attr2f { index, v } => Command::Attr2f { index, v },
            Self::Attr3f { index, v } => Command::Attr3f { index, v },
            Self::Attr4f { index, v } => Command::Attr4f { index, v },
            Self::RasterPos(v) => Command::RasterPos(v),
            Self::BindTexture { target, texture } => Command::BindTexture { target, texture },
            Self::TexParameter {
                target,
                pname,
                params,
            } => Command::TexParameter {
                target,
                pname,
                params,
            },
            Self::Uniform1d { location, x } => Command::Uniform1d { location, x },
            Self::Uniform1i64 { location, x } => Command::Uniform1i64 { location, x },
            Self::Uniform1ui64 { location, x } => Command::Uniform1ui64 { location, x },
            Self::UseProgram(program) => Command::UseProgram(program),
            Self::CallList(list) => Command::CallList(list),
            Self::ListBase(base) => Command::ListBase(base),
        }
    }
}

/// Number of meaningful values for a `glMaterial` parameter, or `None` for
/// an unknown parameter.
pub fn material_param_count(pname: GLenum) -> Option<usize> {
    use crate::gl;
    match pname {
        gl::EMISSION | gl::AMBIENT | gl::DIFFUSE | gl::SPECULAR | gl::AMBIENT_AND_DIFFUSE => {
            Some(4)
        }
        gl::SHININESS => Some(1),
        gl::COLOR_INDEXES => Some(3),
        _ => None,
    }
}
