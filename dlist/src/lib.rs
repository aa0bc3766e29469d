// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display lists for legacy OpenGL command streams.
//!
//! A [`Context`] sits in front of a GL driver (the [`Backend`]). Calls made
//! between `glNewList` and `glEndList` are compiled into a compact
//! instruction stream and stored under an integer name in a table that can
//! be shared between contexts. Calling a list replays the stored calls into
//! the backend, following nested `glCallList` and `glCallLists` calls up to
//! a configurable depth.
//!
//! Lists that draw a single bitmap each, as produced by font helpers, are
//! additionally packed into a glyph atlas so a whole `glCallLists` string
//! can be drawn by the backend in one go.
//!
//! ```ignore
//! let mut ctx = Context::new(backend, Config::default());
//! let base = ctx.gen_lists(1);
//! ctx.new_list(base, gl::COMPILE);
//! ctx.submit(Command::Enable(gl::LIGHTING));
//! ctx.end_list();
//! ctx.call_list(base);
//! ```

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::missing_assert_message,
    clippy::exhaustive_enums,
    reason = "Deferred"
)]

mod atlas;
mod backend;
mod compile;
mod config;
mod context;
mod error;
mod exec;
mod loopback;
mod store;
pub mod unpack;

pub use dlist_encoding;

pub use atlas::{AtlasState, BitmapAtlas, Glyph};
pub use backend::{AtlasTextures, Backend, Dispatch, TextureId, VertexListMode, VertexPlayback};
pub use compile::BatchFlags;
pub use config::{AtlasConfig, Config};
pub use context::Context;
pub use error::{AtlasError, GlError};
pub use store::{DisplayList, ListCells, ListStats, ListTable, SharedLists};
pub use unpack::PixelStore;
