// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use dlist_encoding::gl::{self, GLenum};
use thiserror::Error;

/// A GL error as seen by the application through `glGetError`.
///
/// These are delivered through [`Dispatch::error`](crate::Dispatch::error)
/// and never returned to the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum GlError {
    #[error("GL_INVALID_ENUM")]
    InvalidEnum,
    #[error("GL_INVALID_VALUE")]
    InvalidValue,
    #[error("GL_INVALID_OPERATION")]
    InvalidOperation,
    #[error("GL_STACK_OVERFLOW")]
    StackOverflow,
    #[error("GL_STACK_UNDERFLOW")]
    StackUnderflow,
    #[error("GL_OUT_OF_MEMORY")]
    OutOfMemory,
}

impl GlError {
    /// The registry value of this error.
    pub fn code(self) -> GLenum {
        match self {
            Self::InvalidEnum => gl::INVALID_ENUM,
            Self::InvalidValue => gl::INVALID_VALUE,
            Self::InvalidOperation => gl::INVALID_OPERATION,
            Self::StackOverflow => gl::STACK_OVERFLOW,
            Self::StackUnderflow => gl::STACK_UNDERFLOW,
            Self::OutOfMemory => gl::OUT_OF_MEMORY,
        }
    }

    pub fn from_code(code: GLenum) -> Option<Self> {
        Some(match code {
            gl::INVALID_ENUM => Self::InvalidEnum,
            gl::INVALID_VALUE => Self::InvalidValue,
            gl::INVALID_OPERATION => Self::InvalidOperation,
            gl::STACK_OVERFLOW => Self::StackOverflow,
            gl::STACK_UNDERFLOW => Self::StackUnderflow,
            gl::OUT_OF_MEMORY => Self::OutOfMemory,
            _ => return None,
        })
    }
}

/// Reasons a bitmap atlas is rejected.
///
/// A rejected atlas is marked incomplete and never retried; callers fall
/// back to drawing each glyph list on its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum AtlasError {
    /// The first candidate list is missing or empty.
    #[error("no glyphs found")]
    Empty,
    /// List `list` is not exactly one bitmap followed by the end of the list.
    #[error("list {list} is not a single bitmap")]
    NotABitmap { list: u32 },
    /// A glyph does not fit in a texture row.
    #[error("glyph {list} is {width} pixels wide, rows are {max}")]
    GlyphTooWide { list: u32, width: u32, max: u32 },
    /// The packed glyphs exceed the maximum texture size.
    #[error("atlas height {height} exceeds the maximum texture size {max}")]
    TooTall { height: u32, max: u32 },
    /// A glyph list could not be decoded.
    #[error("list {list} is malformed")]
    Malformed { list: u32 },
    /// The backend did not create the texture.
    #[error("texture creation failed")]
    TextureCreation,
}
