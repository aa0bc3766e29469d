// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph atlases built from font bitmap lists.
//!
//! Text is commonly drawn by compiling one `glBitmap` per character into a
//! range of lists and calling `glCallLists` with a string. When every list
//! of such a range holds exactly one bitmap, the bitmaps are packed into a
//! single texture and a string is drawn with one backend call.

use dlist_encoding::gl::UNSIGNED_BYTE;
use dlist_encoding::{decode, read_instruction, Command, Opcode};

use crate::unpack::bitmap_row_bytes;
use crate::{AtlasError, Backend, Context, ListTable, TextureId};

/// Build state of an atlas. Both outcomes of a build are final.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AtlasState {
    Unbuilt,
    Complete,
    Incomplete,
}

/// Placement and metrics of one glyph.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Glyph {
    /// Left edge in the texture.
    pub x: u32,
    /// Bottom edge in the texture.
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub xorig: f32,
    pub yorig: f32,
    pub xmove: f32,
    pub ymove: f32,
}

/// A texture packing the bitmaps of lists `id..id + num_bitmaps`.
#[derive(Clone, Debug)]
pub struct BitmapAtlas {
    id: u32,
    num_bitmaps: u32,
    state: AtlasState,
    texture: Option<TextureId>,
    width: u32,
    height: u32,
    glyphs: Vec<Glyph>,
}

impl BitmapAtlas {
    pub(crate) fn new(id: u32, num_bitmaps: u32) -> Self {
        Self {
            id,
            num_bitmaps,
            state: AtlasState::Unbuilt,
            texture: None,
            width: 0,
            height: 0,
            glyphs: Vec::new(),
        }
    }

    /// The first list of the range, also the key of the atlas.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of glyphs. Zero for an unbuilt atlas of unknown size.
    pub fn num_bitmaps(&self) -> u32 {
        self.num_bitmaps
    }

    pub fn state(&self) -> AtlasState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == AtlasState::Complete
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Texture size in texels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Glyphs in list order; glyph `i` comes from list `id + i`.
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn contains(&self, name: u32) -> bool {
        name >= self.id && name - self.id < self.num_bitmaps
    }

    /// Retires a complete atlas. Returns whether the state changed.
    pub(crate) fn invalidate(&mut self) -> bool {
        if self.state == AtlasState::Complete {
            self.state = AtlasState::Incomplete;
            true
        } else {
            false
        }
    }

    fn complete(&mut self, layout: AtlasLayout, texture: TextureId) {
        self.num_bitmaps = layout.num_bitmaps;
        self.width = layout.width;
        self.height = layout.height;
        self.glyphs = layout.glyphs;
        self.texture = Some(texture);
        self.state = AtlasState::Complete;
    }

    fn reject(&mut self) {
        self.state = AtlasState::Incomplete;
    }

    pub(crate) fn take_texture(&mut self) -> Option<TextureId> {
        self.texture.take()
    }
}

/// A packed atlas ready to be uploaded.
#[derive(Clone, Debug)]
pub(crate) struct AtlasLayout {
    pub(crate) num_bitmaps: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) glyphs: Vec<Glyph>,
    /// One byte per texel, rows bottom to top.
    pub(crate) texels: Vec<u8>,
}

struct GlyphSource {
    width: u32,
    height: u32,
    xorig: f32,
    yorig: f32,
    xmove: f32,
    ymove: f32,
    bitmap: Vec<u8>,
}

/// Reads the bitmap of a glyph list. `None` for a missing or empty list.
fn glyph_source(table: &ListTable, name: u32) -> Result<Option<GlyphSource>, AtlasError> {
    let Some(list) = table.get(name) else {
        return Ok(None);
    };
    let malformed = |_| AtlasError::Malformed { list: name };
    let (cells, head) = table.cells(list);
    let first = read_instruction(&cells, head).map_err(malformed)?;
    match first.opcode {
        Opcode::EndOfList => return Ok(None),
        Opcode::Bitmap => {}
        _ => return Err(AtlasError::NotABitmap { list: name }),
    }
    let next = first
        .next_cursor()
        .ok_or(AtlasError::Malformed { list: name })?;
    if read_instruction(&cells, next).map_err(malformed)?.opcode != Opcode::EndOfList {
        return Err(AtlasError::NotABitmap { list: name });
    }
    match decode(first.opcode, first.operands, list.payloads()).map_err(malformed)? {
        Command::Bitmap {
            width,
            height,
            xorig,
            yorig,
            xmove,
            ymove,
            bitmap,
        } => Ok(Some(GlyphSource {
            width: u32::try_from(width).map_err(|_| AtlasError::Malformed { list: name })?,
            height: u32::try_from(height).map_err(|_| AtlasError::Malformed { list: name })?,
            xorig,
            yorig,
            xmove,
            ymove,
            bitmap: bitmap.into_owned(),
        })),
        _ => Err(AtlasError::Malformed { list: name }),
    }
}

/// Packs the glyphs of lists `base..base + count` into rows.
///
/// The range stops early at the first missing or empty list.
pub(crate) fn layout_atlas(
    table: &ListTable,
    base: u32,
    count: u32,
    texture_width: u32,
    max_texture_size: u32,
) -> Result<AtlasLayout, AtlasError> {
    let mut sources = Vec::new();
    let mut glyphs = Vec::new();
    let (mut x, mut y, mut row_height) = (0_u32, 0_u32, 0_u32);
    for i in 0..count {
        let Some(name) = base.checked_add(i) else {
            break;
        };
        let Some(source) = glyph_source(table, name)? else {
            break;
        };
        if source.width > texture_width {
            return Err(AtlasError::GlyphTooWide {
                list: name,
                width: source.width,
                max: texture_width,
            });
        }
        if x + source.width > texture_width {
            x = 0;
            y += row_height;
            row_height = 0;
        }
        glyphs.push(Glyph {
            x,
            y,
            width: source.width,
            height: source.height,
            xorig: source.xorig,
            yorig: source.yorig,
            xmove: source.xmove,
            ymove: source.ymove,
        });
        x += source.width;
        row_height = row_height.max(source.height);
        sources.push(source);
    }
    if glyphs.is_empty() {
        return Err(AtlasError::Empty);
    }
    let height = (y + row_height).max(1);
    if height > max_texture_size {
        return Err(AtlasError::TooTall {
            height,
            max: max_texture_size,
        });
    }

    let stride = texture_width as usize;
    let mut texels = vec![0_u8; stride * height as usize];
    for (glyph, source) in glyphs.iter().zip(&sources) {
        let row_bytes = bitmap_row_bytes(glyph.width);
        for row in 0..glyph.height as usize {
            let Some(bits) = source.bitmap.get(row * row_bytes..(row + 1) * row_bytes) else {
                break;
            };
            let start = (glyph.y as usize + row) * stride + glyph.x as usize;
            let dst = &mut texels[start..start + glyph.width as usize];
            for (col, texel) in dst.iter_mut().enumerate() {
                if bits[col / 8] & (0x80 >> (col % 8)) != 0 {
                    *texel = 0xff;
                }
            }
        }
    }

    Ok(AtlasLayout {
        num_bitmaps: glyphs.len() as u32,
        width: texture_width,
        height,
        glyphs,
        texels,
    })
}

impl<B: Backend> Context<B> {
    /// Allocates an unbuilt atlas for a range reserved by `glGenLists`.
    pub(crate) fn allocate_atlas(&mut self, table: &mut ListTable, base: u32, range: u32) {
        if !self.config.atlas.enabled || !self.backend.supports_atlas_bitmaps() {
            return;
        }
        if let Some(old) = table.insert_atlas(BitmapAtlas::new(base, range)) {
            self.release_atlas(old);
        }
    }

    pub(crate) fn release_atlas(&mut self, mut atlas: BitmapAtlas) {
        if let Some(texture) = atlas.take_texture() {
            self.backend.delete_texture(texture);
        }
    }

    fn build_atlas(&mut self, table: &mut ListTable, base: u32) {
        let Some(atlas) = table.atlas(base) else {
            return;
        };
        let count = match atlas.num_bitmaps() {
            0 => self.config.atlas.default_glyph_count,
            count => count,
        };
        let result = layout_atlas(
            table,
            base,
            count,
            self.config.atlas.texture_width,
            self.backend.max_texture_size(),
        )
        .and_then(|layout| {
            let texture = self
                .backend
                .create_atlas_texture(layout.width, layout.height, &layout.texels)
                .ok_or(AtlasError::TextureCreation)?;
            Ok((layout, texture))
        });
        let Some(atlas) = table.atlas_mut(base) else {
            return;
        };
        match result {
            Ok((layout, texture)) => {
                log::debug!(
                    "bitmap atlas {base}: {} glyphs in {}x{}",
                    layout.num_bitmaps,
                    layout.width,
                    layout.height
                );
                atlas.complete(layout, texture);
            }
            Err(err) => {
                log::warn!("bitmap atlas {base} rejected: {err}");
                atlas.reject();
            }
        }
    }

    /// Draws a `glCallLists` string through the atlas at the current list
    /// base. Returns `false` when the generic path must be used instead.
    pub(crate) fn render_bitmap_atlas(&mut self, table: &mut ListTable, ty: u32, ids: &[u32]) -> bool {
        let base = self.list_base;
        if ty != UNSIGNED_BYTE
            || base == 0
            || !self.config.atlas.enabled
            || !self.backend.supports_atlas_bitmaps()
            || !self.backend.raster_pos_valid()
        {
            return false;
        }
        if table.atlas(base).is_none() {
            table.insert_atlas(BitmapAtlas::new(base, 0));
        }
        if table
            .atlas(base)
            .is_some_and(|atlas| atlas.state() == AtlasState::Unbuilt)
        {
            self.build_atlas(table, base);
        }
        let Some(atlas) = table.atlas(base) else {
            return false;
        };
        if !atlas.is_complete() || ids.iter().any(|&id| id >= atlas.num_bitmaps()) {
            return false;
        }
        self.backend.draw_atlas_bitmaps(atlas, ids);
        true
    }
}
