// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The subset of OpenGL enumerants understood by the encoder.
//!
//! Values match the Khronos registry so that recorded streams can be handed
//! to a real driver unchanged.

#![allow(missing_docs, reason = "names are the registry names")]

pub type GLenum = u32;
pub type GLbitfield = u32;

// Display list modes.
pub const COMPILE: GLenum = 0x1300;
pub const COMPILE_AND_EXECUTE: GLenum = 0x1301;

// Data types accepted by `glCallLists`.
pub const BYTE: GLenum = 0x1400;
pub const UNSIGNED_BYTE: GLenum = 0x1401;
pub const SHORT: GLenum = 0x1402;
pub const UNSIGNED_SHORT: GLenum = 0x1403;
pub const INT: GLenum = 0x1404;
pub const UNSIGNED_INT: GLenum = 0x1405;
pub const FLOAT: GLenum = 0x1406;
pub const TWO_BYTES: GLenum = 0x1407;
pub const THREE_BYTES: GLenum = 0x1408;
pub const FOUR_BYTES: GLenum = 0x1409;
pub const DOUBLE: GLenum = 0x140A;
pub const HALF_FLOAT: GLenum = 0x140B;

// Errors.
pub const NO_ERROR: GLenum = 0;
pub const INVALID_ENUM: GLenum = 0x0500;
pub const INVALID_VALUE: GLenum = 0x0501;
pub const INVALID_OPERATION: GLenum = 0x0502;
pub const STACK_OVERFLOW: GLenum = 0x0503;
pub const STACK_UNDERFLOW: GLenum = 0x0504;
pub const OUT_OF_MEMORY: GLenum = 0x0505;

// Capabilities.
pub const CULL_FACE: GLenum = 0x0B44;
pub const LIGHTING: GLenum = 0x0B50;
pub const DEPTH_TEST: GLenum = 0x0B71;
pub const STENCIL_TEST: GLenum = 0x0B90;
pub const ALPHA_TEST: GLenum = 0x0BC0;
pub const BLEND: GLenum = 0x0BE2;
pub const SCISSOR_TEST: GLenum = 0x0C11;
pub const TEXTURE_1D: GLenum = 0x0DE0;
pub const TEXTURE_2D: GLenum = 0x0DE1;
pub const TEXTURE_3D: GLenum = 0x806F;
pub const TEXTURE_RECTANGLE: GLenum = 0x84F5;
pub const TEXTURE_CUBE_MAP: GLenum = 0x8513;
pub const LIGHT0: GLenum = 0x4000;

// Proxy texture targets.
pub const PROXY_TEXTURE_1D: GLenum = 0x8063;
pub const PROXY_TEXTURE_2D: GLenum = 0x8064;
pub const PROXY_TEXTURE_3D: GLenum = 0x8070;
pub const PROXY_TEXTURE_RECTANGLE: GLenum = 0x84F7;
pub const PROXY_TEXTURE_CUBE_MAP: GLenum = 0x851B;
pub const PROXY_TEXTURE_1D_ARRAY: GLenum = 0x8C19;
pub const PROXY_TEXTURE_2D_ARRAY: GLenum = 0x8C1B;
pub const PROXY_TEXTURE_CUBE_MAP_ARRAY: GLenum = 0x900B;

// Shading.
pub const FLAT: GLenum = 0x1D00;
pub const SMOOTH: GLenum = 0x1D01;

// Faces and winding.
pub const FRONT: GLenum = 0x0404;
pub const BACK: GLenum = 0x0405;
pub const FRONT_AND_BACK: GLenum = 0x0408;
pub const CW: GLenum = 0x0900;
pub const CCW: GLenum = 0x0901;

// Polygon modes.
pub const POINT: GLenum = 0x1B00;
pub const LINE: GLenum = 0x1B01;
pub const FILL: GLenum = 0x1B02;

// Material parameters.
pub const AMBIENT: GLenum = 0x1200;
pub const DIFFUSE: GLenum = 0x1201;
pub const SPECULAR: GLenum = 0x1202;
pub const POSITION: GLenum = 0x1203;
pub const EMISSION: GLenum = 0x1600;
pub const SHININESS: GLenum = 0x1601;
pub const AMBIENT_AND_DIFFUSE: GLenum = 0x1602;
pub const COLOR_INDEXES: GLenum = 0x1603;

// Matrix modes.
pub const MODELVIEW: GLenum = 0x1700;
pub const PROJECTION: GLenum = 0x1701;
pub const TEXTURE: GLenum = 0x1702;
pub const COLOR: GLenum = 0x1800;

// Comparison functions.
pub const NEVER: GLenum = 0x0200;
pub const LESS: GLenum = 0x0201;
pub const EQUAL: GLenum = 0x0202;
pub const LEQUAL: GLenum = 0x0203;
pub const GREATER: GLenum = 0x0204;
pub const NOTEQUAL: GLenum = 0x0205;
pub const GEQUAL: GLenum = 0x0206;
pub const ALWAYS: GLenum = 0x0207;

// Blend factors.
pub const ZERO: GLenum = 0;
pub const ONE: GLenum = 1;
pub const SRC_COLOR: GLenum = 0x0300;
pub const ONE_MINUS_SRC_COLOR: GLenum = 0x0301;
pub const SRC_ALPHA: GLenum = 0x0302;
pub const ONE_MINUS_SRC_ALPHA: GLenum = 0x0303;
pub const DST_ALPHA: GLenum = 0x0304;
pub const ONE_MINUS_DST_ALPHA: GLenum = 0x0305;
pub const DST_COLOR: GLenum = 0x0306;
pub const ONE_MINUS_DST_COLOR: GLenum = 0x0307;
pub const SRC_ALPHA_SATURATE: GLenum = 0x0308;
pub const CONSTANT_COLOR: GLenum = 0x8001;
pub const ONE_MINUS_CONSTANT_COLOR: GLenum = 0x8002;
pub const CONSTANT_ALPHA: GLenum = 0x8003;
pub const ONE_MINUS_CONSTANT_ALPHA: GLenum = 0x8004;

// Attribute and clear mask bits.
pub const LIGHTING_BIT: GLbitfield = 0x0000_0040;
pub const DEPTH_BUFFER_BIT: GLbitfield = 0x0000_0100;
pub const ACCUM_BUFFER_BIT: GLbitfield = 0x0000_0200;
pub const STENCIL_BUFFER_BIT: GLbitfield = 0x0000_0400;
pub const COLOR_BUFFER_BIT: GLbitfield = 0x0000_4000;

// Pixel formats.
pub const STENCIL_INDEX: GLenum = 0x1901;
pub const DEPTH_COMPONENT: GLenum = 0x1902;
pub const RED: GLenum = 0x1903;
pub const GREEN: GLenum = 0x1904;
pub const BLUE: GLenum = 0x1905;
pub const ALPHA: GLenum = 0x1906;
pub const RGB: GLenum = 0x1907;
pub const RGBA: GLenum = 0x1908;
pub const LUMINANCE: GLenum = 0x1909;
pub const LUMINANCE_ALPHA: GLenum = 0x190A;
pub const BGR: GLenum = 0x80E0;
pub const BGRA: GLenum = 0x80E1;
pub const RG: GLenum = 0x8227;
pub const COLOR_INDEX: GLenum = 0x1900;

// Pixel store parameters.
pub const UNPACK_SWAP_BYTES: GLenum = 0x0CF0;
pub const UNPACK_LSB_FIRST: GLenum = 0x0CF1;
pub const UNPACK_ROW_LENGTH: GLenum = 0x0CF2;
pub const UNPACK_SKIP_ROWS: GLenum = 0x0CF3;
pub const UNPACK_SKIP_PIXELS: GLenum = 0x0CF4;
pub const UNPACK_ALIGNMENT: GLenum = 0x0CF5;

// Program targets.
pub const VERTEX_PROGRAM_ARB: GLenum = 0x8620;
pub const FRAGMENT_PROGRAM_ARB: GLenum = 0x8804;
pub const PROGRAM_FORMAT_ASCII_ARB: GLenum = 0x8875;

/// Returns `true` for texture targets that only query whether an image would
/// fit and have no persistent effect.
pub fn is_proxy_texture_target(target: GLenum) -> bool {
    matches!(
        target,
        PROXY_TEXTURE_1D
            | PROXY_TEXTURE_2D
            | PROXY_TEXTURE_3D
            | PROXY_TEXTURE_RECTANGLE
            | PROXY_TEXTURE_CUBE_MAP
            | PROXY_TEXTURE_1D_ARRAY
            | PROXY_TEXTURE_2D_ARRAY
            | PROXY_TEXTURE_CUBE_MAP_ARRAY
    )
}

/// Returns `true` for the comparison functions shared by alpha, depth and
/// stencil tests.
pub fn is_compare_func(func: GLenum) -> bool {
    (NEVER..=ALWAYS).contains(&func)
}

/// Returns `true` for valid `glBlendFunc` factors.
pub fn is_blend_factor(factor: GLenum) -> bool {
    matches!(
        factor,
        ZERO | ONE
            | SRC_COLOR
            | ONE_MINUS_SRC_COLOR
            | SRC_ALPHA
            | ONE_MINUS_SRC_ALPHA
            | DST_ALPHA
            | ONE_MINUS_DST_ALPHA
            | DST_COLOR
            | ONE_MINUS_DST_COLOR
            | SRC_ALPHA_SATURATE
            | CONSTANT_COLOR
            | ONE_MINUS_CONSTANT_COLOR
            | CONSTANT_ALPHA
            | ONE_MINUS_CONSTANT_ALPHA
    )
}

/// Returns `true` for `GL_FRONT`, `GL_BACK` and `GL_FRONT_AND_BACK`.
pub fn is_face(face: GLenum) -> bool {
    matches!(face, FRONT | BACK | FRONT_AND_BACK)
}

/// Size in bytes of one list id of the given `glCallLists` type, or `None`
/// if the type is not accepted.
pub fn call_lists_type_size(ty: GLenum) -> Option<usize> {
    match ty {
        BYTE | UNSIGNED_BYTE => Some(1),
        SHORT | UNSIGNED_SHORT | TWO_BYTES => Some(2),
        THREE_BYTES => Some(3),
        INT | UNSIGNED_INT | FLOAT | FOUR_BYTES => Some(4),
        _ => None,
    }
}
