// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording calls into lists.

use std::borrow::Cow;

use anyhow::{Context as _, Result};
use dlist::{GlError, PixelStore};
use dlist_encoding::{gl, Command};
use dlist_tests::{compile, context, Event};

#[test]
fn compiled_calls_replay_in_order() {
    let mut ctx = context();
    let list = ctx.gen_lists(1);
    assert_eq!(list, 1);
    compile(
        &mut ctx,
        list,
        vec![Command::Enable(gl::LIGHTING), Command::Disable(gl::DEPTH_TEST)],
    );
    assert!(ctx.backend().events.is_empty());

    ctx.call_list(list);
    ctx.call_list(list);
    assert_eq!(
        ctx.backend().calls(),
        [
            Command::Enable(gl::LIGHTING),
            Command::Disable(gl::DEPTH_TEST),
            Command::Enable(gl::LIGHTING),
            Command::Disable(gl::DEPTH_TEST),
        ]
    );
}

#[test]
fn compile_and_execute_runs_immediately() {
    let mut ctx = context();
    ctx.new_list(3, gl::COMPILE_AND_EXECUTE);
    ctx.submit(Command::Enable(gl::BLEND));
    ctx.end_list();
    assert_eq!(
        ctx.backend_mut().take_events(),
        [Event::Call(Command::Enable(gl::BLEND), PixelStore::default())]
    );

    ctx.call_list(3);
    assert_eq!(ctx.backend().calls(), [Command::Enable(gl::BLEND)]);
}

#[test]
fn calls_outside_a_list_go_to_the_backend() {
    let mut ctx = context();
    ctx.submit(Command::Clear(gl::COLOR_BUFFER_BIT));
    assert_eq!(ctx.backend().calls(), [Command::Clear(gl::COLOR_BUFFER_BIT)]);
    assert!(!ctx.is_list(1));
}

#[test]
fn errors_are_deferred_to_replay() {
    let mut ctx = context();
    compile(
        &mut ctx,
        1,
        vec![Command::ShadeModel(gl::FILL), Command::Enable(gl::BLEND)],
    );
    assert!(ctx.backend().events.is_empty());

    ctx.call_list(1);
    assert_eq!(
        ctx.backend_mut().take_events(),
        [
            Event::Error(GlError::InvalidEnum, "glShadeModel(mode)".into()),
            Event::Call(Command::Enable(gl::BLEND), PixelStore::default()),
        ]
    );

    // In compile and execute mode the error is raised now and on replay.
    ctx.new_list(2, gl::COMPILE_AND_EXECUTE);
    ctx.submit(Command::DepthFunc(gl::BLEND));
    ctx.end_list();
    assert_eq!(ctx.backend_mut().take_events().len(), 1);
    ctx.call_list(2);
    assert_eq!(ctx.backend().errors(), [GlError::InvalidEnum]);
}

#[test]
fn call_list_zero() {
    let mut ctx = context();
    ctx.call_list(0);
    assert_eq!(ctx.backend_mut().take_events().len(), 1);

    // Compiled, it is skipped on replay.
    compile(
        &mut ctx,
        1,
        vec![Command::CallList(0), Command::Enable(gl::BLEND)],
    );
    ctx.call_list(1);
    assert_eq!(ctx.backend().calls(), [Command::Enable(gl::BLEND)]);
    assert!(ctx.backend().errors().is_empty());
}

#[test]
fn list_state_queries_and_misuse() {
    let mut ctx = context();
    ctx.new_list(0, gl::COMPILE);
    ctx.new_list(1, 0x1234);
    assert!(!ctx.is_compiling());

    ctx.new_list(1, gl::COMPILE);
    assert!(ctx.is_compiling());
    assert_eq!(ctx.list_index(), 1);
    assert_eq!(ctx.list_mode(), gl::COMPILE);
    ctx.new_list(2, gl::COMPILE);
    assert_eq!(ctx.list_index(), 1);
    ctx.end_list();
    ctx.end_list();

    assert_eq!(ctx.list_index(), 0);
    assert_eq!(ctx.list_mode(), 0);
    assert_eq!(
        ctx.backend().errors(),
        [
            GlError::InvalidValue,
            GlError::InvalidEnum,
            GlError::InvalidOperation,
            GlError::InvalidOperation,
        ]
    );
    assert!(ctx.is_list(1));
    assert!(!ctx.is_list(2));
    assert!(!ctx.is_list(0));
}

#[test]
fn proxy_textures_are_not_compiled() {
    let mut ctx = context();
    let proxy = Command::TexImage2d {
        target: gl::PROXY_TEXTURE_2D,
        level: 0,
        internal_format: gl::RGBA as i32,
        width: 64,
        height: 64,
        border: 0,
        format: gl::RGBA,
        ty: gl::UNSIGNED_BYTE,
        pixels: None,
    };
    compile(
        &mut ctx,
        1,
        vec![proxy.clone(), Command::Enable(gl::TEXTURE_2D)],
    );
    assert_eq!(
        ctx.backend_mut().take_events(),
        [Event::Call(proxy, PixelStore::default())]
    );

    ctx.call_list(1);
    assert_eq!(ctx.backend().calls(), [Command::Enable(gl::TEXTURE_2D)]);
}

#[test]
fn redundant_shade_model_is_dropped() {
    let mut ctx = context();
    compile(
        &mut ctx,
        1,
        vec![
            Command::ShadeModel(gl::FLAT),
            Command::ShadeModel(gl::FLAT),
            Command::ShadeModel(gl::SMOOTH),
            Command::ShadeModel(gl::SMOOTH),
            // A called list may change the shade model.
            Command::CallList(99),
            Command::ShadeModel(gl::SMOOTH),
        ],
    );
    ctx.call_list(1);
    assert_eq!(
        ctx.backend().calls(),
        [
            Command::ShadeModel(gl::FLAT),
            Command::ShadeModel(gl::SMOOTH),
            Command::ShadeModel(gl::SMOOTH),
        ]
    );
}

#[test]
fn redundant_materials_are_dropped() {
    let material = |face, pname, value| Command::Material {
        face,
        pname,
        params: [value; 4],
    };
    let mut ctx = context();
    compile(
        &mut ctx,
        1,
        vec![
            material(gl::FRONT, gl::AMBIENT, 1.0),
            material(gl::FRONT, gl::AMBIENT, 1.0),
            material(gl::FRONT_AND_BACK, gl::AMBIENT, 1.0),
            material(gl::BACK, gl::AMBIENT, 1.0),
            material(gl::FRONT, gl::AMBIENT_AND_DIFFUSE, 1.0),
            material(gl::FRONT, gl::DIFFUSE, 1.0),
            material(gl::FRONT, gl::DIFFUSE, 0.5),
        ],
    );
    ctx.call_list(1);
    assert_eq!(
        ctx.backend().calls(),
        [
            material(gl::FRONT, gl::AMBIENT, 1.0),
            material(gl::FRONT_AND_BACK, gl::AMBIENT, 1.0),
            material(gl::FRONT, gl::AMBIENT_AND_DIFFUSE, 1.0),
            material(gl::FRONT, gl::DIFFUSE, 0.5),
        ]
    );
}

#[test]
fn pop_attrib_forgets_compiled_state() {
    let material = Command::Material {
        face: gl::FRONT,
        pname: gl::SHININESS,
        params: [8.0; 4],
    };
    let commands = vec![
        Command::ShadeModel(gl::FLAT),
        material.clone(),
        Command::PushAttrib(gl::LIGHTING_BIT),
        Command::ShadeModel(gl::SMOOTH),
        Command::PopAttrib,
        Command::ShadeModel(gl::SMOOTH),
        material,
    ];
    let mut ctx = context();
    compile(&mut ctx, 1, commands.clone());
    ctx.call_list(1);
    assert_eq!(ctx.backend().calls(), commands);
}

#[test]
fn coalesced_calls_still_execute() {
    let mut ctx = context();
    ctx.new_list(1, gl::COMPILE_AND_EXECUTE);
    ctx.submit(Command::ShadeModel(gl::FLAT));
    ctx.submit(Command::ShadeModel(gl::FLAT));
    ctx.end_list();
    assert_eq!(ctx.backend_mut().take_events().len(), 2);
    ctx.call_list(1);
    assert_eq!(ctx.backend().calls(), [Command::ShadeModel(gl::FLAT)]);
}

#[test]
fn pixels_are_unpacked_when_compiled() {
    let mut ctx = context();
    // 3x2 RGB with the default 4 byte row alignment: 9 bytes per row, padded to 12.
    let data: Vec<u8> = (0..24).collect();
    compile(
        &mut ctx,
        1,
        vec![Command::DrawPixels {
            width: 3,
            height: 2,
            format: gl::RGB,
            ty: gl::UNSIGNED_BYTE,
            pixels: Cow::Borrowed(&data),
        }],
    );
    // Later unpack changes do not affect the list.
    ctx.pixel_store(gl::UNPACK_ALIGNMENT, 8);
    ctx.pixel_store(gl::UNPACK_SKIP_ROWS, 1);
    ctx.call_list(1);

    let tight: Vec<u8> = (0..9).chain(12..21).collect();
    assert_eq!(
        ctx.backend().events,
        [Event::Call(
            Command::DrawPixels {
                width: 3,
                height: 2,
                format: gl::RGB,
                ty: gl::UNSIGNED_BYTE,
                pixels: Cow::Owned(tight),
            },
            PixelStore::TIGHT,
        )]
    );
    // The client state is restored after replay.
    assert_eq!(
        *ctx.pixel_store_state(),
        PixelStore {
            alignment: 8,
            skip_rows: 1,
            ..PixelStore::default()
        }
    );
}

#[test]
fn swapped_bytes_are_stored_native() {
    let mut ctx = context();
    ctx.pixel_store(gl::UNPACK_SWAP_BYTES, 1);
    compile(
        &mut ctx,
        1,
        vec![Command::DrawPixels {
            width: 1,
            height: 1,
            format: gl::LUMINANCE_ALPHA,
            ty: gl::UNSIGNED_SHORT,
            pixels: Cow::Borrowed(&[1, 2, 3, 4]),
        }],
    );
    ctx.call_list(1);
    let Some(Command::DrawPixels { pixels, .. }) = ctx.backend().calls().pop() else {
        panic!("no DrawPixels replayed");
    };
    assert_eq!(&*pixels, [2, 1, 4, 3]);
}

#[test]
fn bad_client_data_is_a_deferred_error() {
    let mut ctx = context();
    compile(
        &mut ctx,
        1,
        vec![
            Command::DrawPixels {
                width: 4,
                height: 4,
                format: gl::RGBA,
                ty: gl::UNSIGNED_BYTE,
                pixels: Cow::Borrowed(&[0; 8]),
            },
            Command::Bitmap {
                width: -1,
                height: 1,
                xorig: 0.0,
                yorig: 0.0,
                xmove: 0.0,
                ymove: 0.0,
                bitmap: Cow::Borrowed(&[]),
            },
        ],
    );
    assert!(ctx.backend().events.is_empty());
    ctx.call_list(1);
    assert_eq!(
        ctx.backend().events,
        [
            Event::Error(GlError::InvalidValue, "glDrawPixels".into()),
            Event::Error(GlError::InvalidValue, "glBitmap".into()),
        ]
    );
}

#[test]
fn oversized_images_without_data_are_rejected() {
    let mut ctx = context();
    compile(
        &mut ctx,
        1,
        vec![
            Command::Bitmap {
                width: i32::MAX,
                height: i32::MAX,
                xorig: 0.0,
                yorig: 0.0,
                xmove: 0.0,
                ymove: 0.0,
                bitmap: Cow::Borrowed(&[]),
            },
            Command::DrawPixels {
                width: i32::MAX,
                height: i32::MAX,
                format: gl::RGBA,
                ty: gl::FLOAT,
                pixels: Cow::Borrowed(&[]),
            },
        ],
    );
    ctx.call_list(1);
    assert_eq!(
        ctx.backend().errors(),
        [GlError::InvalidValue, GlError::InvalidValue]
    );
}

#[test]
fn pixel_store_is_validated() {
    let mut ctx = context();
    ctx.pixel_store(gl::UNPACK_ALIGNMENT, 3);
    ctx.pixel_store(0x1234, 1);
    assert_eq!(
        ctx.backend().errors(),
        [GlError::InvalidValue, GlError::InvalidEnum]
    );
    assert_eq!(*ctx.pixel_store_state(), PixelStore::default());
}

#[test]
fn print_list_disassembles() -> Result<()> {
    let mut ctx = context();
    compile(
        &mut ctx,
        1,
        vec![Command::Enable(gl::LIGHTING), Command::ShadeModel(gl::FILL)],
    );
    let listing = ctx.print_list(1).context("list 1 exists")?;
    let lines: Vec<_> = listing.lines().collect();
    assert_eq!(lines[0], "START-LIST 1");
    assert!(lines[1].contains(&format!("Enable({})", gl::LIGHTING)));
    assert!(lines[2].contains("glShadeModel(mode)"));
    assert!(lines[3].ends_with("END-LIST 1"));
    assert_eq!(lines.len(), 4);
    assert!(ctx.print_list(2).is_none());
    Ok(())
}
