// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The collaborators that receive the calls a list produces.

use dlist_encoding::{Command, VertexBatch};

use crate::{BitmapAtlas, GlError, PixelStore};

/// The real GL entry points.
pub trait Dispatch {
    /// Performs a call. `unpack` is the pixel unpack state in effect; it
    /// is the tight packing while replaying image calls from a list.
    fn call(&mut self, command: &Command<'_>, unpack: &PixelStore);

    /// Records a GL error.
    fn error(&mut self, error: GlError, message: &str);

    /// Reports an internal problem that is not a GL error, such as a corrupt
    /// list.
    fn problem(&mut self, message: &str) {
        log::warn!("{message}");
    }

    /// `GL_MAX_TEXTURE_SIZE`.
    fn max_texture_size(&self) -> u32 {
        2048
    }

    /// Whether the current raster position is valid.
    fn raster_pos_valid(&self) -> bool {
        true
    }
}

/// How a recorded vertex batch is replayed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VertexListMode {
    /// Draw the batch as recorded.
    Replay,
    /// Draw the batch and copy its final attribute values into the current
    /// attribute state.
    CopyCurrent,
    /// Re-submit the batch through the immediate-mode path so the current
    /// attribute state is derived from the replay.
    Loopback,
}

/// The vertex buffer subsystem that owns recorded geometry.
pub trait VertexPlayback {
    fn draw_vertex_list(&mut self, batch: &VertexBatch, mode: VertexListMode);
}

/// Handle of a texture created for an atlas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// The texture subsystem used by bitmap atlases.
pub trait AtlasTextures {
    /// Whether [`draw_atlas_bitmaps`](Self::draw_atlas_bitmaps) is
    /// implemented. Atlases are never built otherwise.
    fn supports_atlas_bitmaps(&self) -> bool {
        false
    }

    /// Creates a `width` x `height` texture with one byte per texel.
    fn create_atlas_texture(&mut self, width: u32, height: u32, texels: &[u8]) -> Option<TextureId> {
        let _ = (width, height, texels);
        None
    }

    fn delete_texture(&mut self, texture: TextureId) {
        let _ = texture;
    }

    /// Draws glyphs from a complete atlas at the current raster position,
    /// advancing it by each glyph's move. `glyphs` are indices into
    /// [`BitmapAtlas::glyphs`].
    fn draw_atlas_bitmaps(&mut self, atlas: &BitmapAtlas, glyphs: &[u32]) {
        let _ = (atlas, glyphs);
    }
}

/// Everything a [`Context`](crate::Context) needs from its driver.
pub trait Backend: Dispatch + VertexPlayback + AtlasTextures {}

impl<T: Dispatch + VertexPlayback + AtlasTextures> Backend for T {}
