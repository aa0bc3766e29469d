// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing `glCallLists` strings of bitmap lists through a glyph atlas.

use std::borrow::Cow;

use anyhow::{Context as _, Result};
use dlist::{AtlasState, Config, Context, PixelStore, TextureId};
use dlist_encoding::{gl, Command};
use dlist_tests::{compile, context_with, Event, RecordingBackend};

/// An 8x8 glyph whose rows are all `fill`.
fn glyph(fill: u8) -> Command<'static> {
    Command::Bitmap {
        width: 8,
        height: 8,
        xorig: 0.0,
        yorig: 0.0,
        xmove: 9.0,
        ymove: 0.0,
        bitmap: Cow::Owned(vec![fill; 8]),
    }
}

/// Compiles `count` glyph lists from a fresh `glGenLists` range.
fn font(ctx: &mut Context<RecordingBackend>, count: u32) -> u32 {
    ctx.pixel_store(gl::UNPACK_ALIGNMENT, 1);
    let base = ctx.gen_lists(count as i32);
    for i in 0..count {
        compile(ctx, base + i, vec![glyph(i as u8)]);
    }
    base
}

fn atlas_context() -> Context<RecordingBackend> {
    context_with(RecordingBackend::with_atlases(), Config::default())
}

#[test]
fn strings_are_drawn_from_the_atlas() -> Result<()> {
    let mut ctx = atlas_context();
    let base = font(&mut ctx, 20);
    {
        let table = ctx.shared_lists().lock();
        let atlas = table.atlas(base).context("atlas allocated by glGenLists")?;
        assert_eq!(atlas.state(), AtlasState::Unbuilt);
        assert_eq!(atlas.num_bitmaps(), 20);
    }

    ctx.list_base(base);
    ctx.call_lists(3, gl::UNSIGNED_BYTE, &[0, 5, 19]);
    ctx.call_lists(2, gl::UNSIGNED_BYTE, &[1, 1]);
    assert_eq!(
        ctx.backend().events,
        [
            Event::CreateTexture {
                texture: TextureId(1),
                width: 1024,
                height: 8,
            },
            Event::DrawAtlas {
                atlas: base,
                glyphs: vec![0, 5, 19],
            },
            Event::DrawAtlas {
                atlas: base,
                glyphs: vec![1, 1],
            },
        ]
    );

    let table = ctx.shared_lists().lock();
    let atlas = table.atlas(base).context("atlas kept")?;
    assert!(atlas.is_complete());
    assert_eq!(atlas.texture(), Some(TextureId(1)));
    let glyphs = atlas.glyphs();
    assert_eq!(glyphs.len(), 20);
    assert_eq!((glyphs[5].x, glyphs[5].y), (40, 0));
    assert_eq!(glyphs[5].xmove, 9.0);
    Ok(())
}

#[test]
fn glyph_bits_become_texels() {
    let mut ctx = atlas_context();
    let base = font(&mut ctx, 17);
    ctx.list_base(base);
    ctx.call_lists(1, gl::UNSIGNED_BYTE, &[0]);
    let texels = &ctx.backend().last_texels;
    // Glyph 3 has the bit pattern 0b0000_0011 in every row.
    assert_eq!(&texels[24..32], [0, 0, 0, 0, 0, 0, 0xff, 0xff]);
    // Glyph 0 is blank.
    assert!(texels[..8].iter().all(|&texel| texel == 0));
}

#[test]
fn redefining_a_glyph_retires_the_atlas() {
    let mut ctx = atlas_context();
    let base = font(&mut ctx, 20);
    ctx.list_base(base);
    ctx.call_lists(1, gl::UNSIGNED_BYTE, &[0]);
    ctx.backend_mut().take_events();

    compile(&mut ctx, base + 5, vec![Command::Enable(gl::BLEND)]);
    ctx.call_lists(3, gl::UNSIGNED_BYTE, &[0, 5, 19]);
    assert_eq!(
        ctx.backend_mut().take_events(),
        [
            Event::Call(glyph(0), PixelStore::TIGHT),
            Event::Call(Command::Enable(gl::BLEND), PixelStore {
                alignment: 1,
                ..PixelStore::default()
            }),
            Event::Call(glyph(19), PixelStore::TIGHT),
        ]
    );
    assert_eq!(
        ctx.shared_lists().lock().atlas(base).map(|atlas| atlas.state()),
        Some(AtlasState::Incomplete)
    );

    // Deleting the range releases the texture.
    ctx.delete_lists(base, 20);
    assert_eq!(
        ctx.backend().events,
        [Event::DeleteTexture(TextureId(1))]
    );
    assert!(ctx.shared_lists().lock().atlas(base).is_none());
}

#[test]
fn deleting_a_glyph_retires_the_atlas() {
    let mut ctx = atlas_context();
    let base = font(&mut ctx, 20);
    ctx.list_base(base);
    ctx.call_lists(1, gl::UNSIGNED_BYTE, &[0]);
    assert!(ctx
        .shared_lists()
        .lock()
        .atlas(base)
        .is_some_and(|atlas| atlas.is_complete()));
    ctx.backend_mut().take_events();

    ctx.delete_lists(base + 5, 1);
    assert!(!ctx.is_list(base + 5));
    assert_eq!(
        ctx.shared_lists().lock().atlas(base).map(|atlas| atlas.state()),
        Some(AtlasState::Incomplete)
    );

    // The remaining glyphs are drawn one list at a time.
    ctx.call_lists(3, gl::UNSIGNED_BYTE, &[0, 5, 19]);
    assert_eq!(ctx.backend().calls(), [glyph(0), glyph(19)]);
}

#[test]
fn non_bitmap_lists_reject_the_atlas() {
    let mut ctx = atlas_context();
    let base = font(&mut ctx, 20);
    compile(
        &mut ctx,
        base + 3,
        vec![glyph(3), Command::Enable(gl::BLEND)],
    );
    ctx.list_base(base);
    ctx.call_lists(1, gl::UNSIGNED_BYTE, &[0]);
    ctx.call_lists(1, gl::UNSIGNED_BYTE, &[1]);
    assert_eq!(
        ctx.backend().calls(),
        [glyph(0), glyph(1)]
    );
    assert!(!ctx
        .backend()
        .events
        .iter()
        .any(|event| matches!(event, Event::CreateTexture { .. })));
}

#[test]
fn unusable_atlas_falls_back() {
    let mut ctx = atlas_context();
    let base = font(&mut ctx, 20);
    ctx.list_base(base);

    // Ids outside the atlas.
    ctx.call_lists(2, gl::UNSIGNED_BYTE, &[0, 25]);
    // Ids that are not unsigned bytes.
    ctx.call_lists(1, gl::UNSIGNED_SHORT, &1_u16.to_ne_bytes());
    ctx.backend_mut().raster_pos_valid = false;
    ctx.call_lists(1, gl::UNSIGNED_BYTE, &[2]);
    assert_eq!(
        ctx.backend().calls(),
        [glyph(0), glyph(1), glyph(2)]
    );
}

#[test]
fn call_lists_builds_an_atlas_on_demand() {
    let mut ctx = atlas_context();
    ctx.pixel_store(gl::UNPACK_ALIGNMENT, 1);
    for i in 0..10 {
        compile(&mut ctx, 100 + i, vec![glyph(i as u8)]);
    }
    ctx.list_base(100);
    ctx.call_lists(2, gl::UNSIGNED_BYTE, &[9, 0]);
    assert_eq!(
        ctx.backend().events,
        [
            Event::CreateTexture {
                texture: TextureId(1),
                width: 1024,
                height: 8,
            },
            Event::DrawAtlas {
                atlas: 100,
                glyphs: vec![9, 0],
            },
        ]
    );
    let table = ctx.shared_lists().lock();
    assert_eq!(table.atlas(100).map(|atlas| atlas.num_bitmaps()), Some(10));
}

#[test]
fn backends_without_atlases_draw_each_glyph() {
    let mut ctx = context_with(RecordingBackend::default(), Config::default());
    let base = font(&mut ctx, 20);
    assert!(ctx.shared_lists().lock().atlas(base).is_none());
    ctx.list_base(base);
    ctx.call_lists(2, gl::UNSIGNED_BYTE, &[4, 2]);
    assert_eq!(ctx.backend().calls(), [glyph(4), glyph(2)]);
}
