// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Options controlling list storage and execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of lists executing at once, the top-level list
    /// included. Calls that would exceed it are skipped.
    pub max_list_nesting: usize,
    /// Maximum number of blocks a single list may use. Compiling past this
    /// limit raises `GL_OUT_OF_MEMORY` and truncates the list.
    pub max_list_blocks: usize,
    /// Whether lists that fit in one block are moved into the shared small
    /// list store when they are finished.
    pub small_lists: bool,
    pub atlas: AtlasConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_list_nesting: 64,
            max_list_blocks: 1 << 16,
            small_lists: true,
            atlas: AtlasConfig::default(),
        }
    }
}

/// Options for the glyph atlas built from bitmap lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Whether atlases are used at all. They are also only used when the
    /// backend supports drawing them.
    pub enabled: bool,
    /// `glGenLists` allocates an atlas when its range exceeds this value.
    pub min_gen_range: i32,
    /// Glyph count assumed for an atlas created by `glCallLists` rather than
    /// by `glGenLists`.
    pub default_glyph_count: u32,
    /// Width of the atlas texture in texels.
    pub texture_width: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_gen_range: 16,
            default_glyph_count: 256,
            texture_width: 1024,
        }
    }
}
