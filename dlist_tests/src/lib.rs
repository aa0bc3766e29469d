// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display list tests.
//!
//! The backend here records everything it receives, so tests can compare
//! what a list replays against what was compiled into it.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
// Feel free to send a PR that solves one or more of these.
#![allow(
    missing_debug_implementations,
    unreachable_pub,
    missing_docs,
    clippy::missing_assert_message,
    clippy::allow_attributes_without_reason
)]

use dlist::{
    AtlasTextures, BitmapAtlas, Config, Context, Dispatch, GlError, PixelStore, TextureId,
    VertexListMode, VertexPlayback,
};
use dlist_encoding::gl;
use dlist_encoding::{Command, VertexBatch};

/// Something the backend was asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Call(Command<'static>, PixelStore),
    Error(GlError, String),
    Problem(String),
    DrawVertexList(VertexBatch, VertexListMode),
    CreateTexture {
        texture: TextureId,
        width: u32,
        height: u32,
    },
    DeleteTexture(TextureId),
    DrawAtlas {
        atlas: u32,
        glyphs: Vec<u32>,
    },
}

pub struct RecordingBackend {
    pub events: Vec<Event>,
    /// Whether the backend claims to draw bitmap atlases.
    pub atlas_support: bool,
    pub max_texture_size: u32,
    pub raster_pos_valid: bool,
    /// Atlas texels of the most recently created texture.
    pub last_texels: Vec<u8>,
    next_texture: u32,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            atlas_support: false,
            max_texture_size: 2048,
            raster_pos_valid: true,
            last_texels: Vec::new(),
            next_texture: 1,
        }
    }
}

impl RecordingBackend {
    pub fn with_atlases() -> Self {
        Self {
            atlas_support: true,
            ..Self::default()
        }
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// The calls received, without their unpack state.
    pub fn calls(&self) -> Vec<Command<'static>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Call(command, _) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<GlError> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Error(error, _) => Some(*error),
                _ => None,
            })
            .collect()
    }
}

impl Dispatch for RecordingBackend {
    fn call(&mut self, command: &Command<'_>, unpack: &PixelStore) {
        self.events
            .push(Event::Call(command.clone().into_owned(), *unpack));
    }

    fn error(&mut self, error: GlError, message: &str) {
        self.events.push(Event::Error(error, message.to_owned()));
    }

    fn problem(&mut self, message: &str) {
        self.events.push(Event::Problem(message.to_owned()));
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn raster_pos_valid(&self) -> bool {
        self.raster_pos_valid
    }
}

impl VertexPlayback for RecordingBackend {
    fn draw_vertex_list(&mut self, batch: &VertexBatch, mode: VertexListMode) {
        self.events.push(Event::DrawVertexList(*batch, mode));
    }
}

impl AtlasTextures for RecordingBackend {
    fn supports_atlas_bitmaps(&self) -> bool {
        self.atlas_support
    }

    fn create_atlas_texture(&mut self, width: u32, height: u32, texels: &[u8]) -> Option<TextureId> {
        let texture = TextureId(self.next_texture);
        self.next_texture += 1;
        self.last_texels = texels.to_vec();
        self.events.push(Event::CreateTexture {
            texture,
            width,
            height,
        });
        Some(texture)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.events.push(Event::DeleteTexture(texture));
    }

    fn draw_atlas_bitmaps(&mut self, atlas: &BitmapAtlas, glyphs: &[u32]) {
        self.events.push(Event::DrawAtlas {
            atlas: atlas.id(),
            glyphs: glyphs.to_vec(),
        });
    }
}

/// Routes engine logs to the test output. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn context() -> Context<RecordingBackend> {
    context_with(RecordingBackend::default(), Config::default())
}

pub fn context_with(backend: RecordingBackend, config: Config) -> Context<RecordingBackend> {
    init_logging();
    Context::new(backend, config)
}

/// Compiles `commands` into list `name` in `GL_COMPILE` mode.
pub fn compile(ctx: &mut Context<RecordingBackend>, name: u32, commands: Vec<Command<'_>>) {
    ctx.new_list(name, gl::COMPILE);
    for command in commands {
        ctx.submit(command);
    }
    ctx.end_list();
}
