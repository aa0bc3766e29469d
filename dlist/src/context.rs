// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::borrow::Cow;
use std::sync::Arc;

use dlist_encoding::gl::{self, GLenum};
use dlist_encoding::{disassemble, Command, VertexBatch};

use crate::compile::ListState;
use crate::exec::{translate_ids, Frame};
use crate::{loopback, Backend, BatchFlags, Config, GlError, PixelStore, SharedLists, VertexListMode};

/// A GL context's view of display lists.
///
/// All GL calls go through [`submit`](Self::submit): between
/// [`new_list`](Self::new_list) and [`end_list`](Self::end_list) they are
/// compiled into the open list (and executed as well in
/// `GL_COMPILE_AND_EXECUTE` mode), otherwise they are passed straight to the
/// backend. The list table can be shared between contexts.
pub struct Context<B> {
    pub(crate) backend: B,
    pub(crate) shared: Arc<SharedLists>,
    pub(crate) config: Config,
    pub(crate) list_base: u32,
    /// The client's `GL_UNPACK_*` state.
    pub(crate) unpack: PixelStore,
    pub(crate) current: Option<ListState>,
}

impl<B: Backend> Context<B> {
    pub fn new(backend: B, config: Config) -> Self {
        Self::with_shared_lists(backend, config, Arc::new(SharedLists::new()))
    }

    /// Creates a context using the list table of another context.
    pub fn with_shared_lists(backend: B, config: Config, shared: Arc<SharedLists>) -> Self {
        Self {
            backend,
            shared,
            config,
            list_base: 0,
            unpack: PixelStore::default(),
            current: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn shared_lists(&self) -> &Arc<SharedLists> {
        &self.shared
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `glGenLists`: reserves `range` consecutive unused names and returns
    /// the first one, or 0 if that is not possible.
    pub fn gen_lists(&mut self, range: i32) -> u32 {
        if range < 0 {
            self.backend.error(GlError::InvalidValue, "glGenLists");
            return 0;
        }
        if range == 0 {
            return 0;
        }
        let count = range as u32;
        let shared = Arc::clone(&self.shared);
        let mut table = shared.lock();
        let Some(base) = table.find_free_block(count) else {
            return 0;
        };
        for name in base..=base + (count - 1) {
            table.reserve(name);
        }
        if range > self.config.atlas.min_gen_range {
            self.allocate_atlas(&mut table, base, count);
        }
        base
    }

    /// `glNewList`.
    pub fn new_list(&mut self, name: u32, mode: GLenum) {
        if name == 0 {
            self.backend.error(GlError::InvalidValue, "glNewList");
            return;
        }
        if mode != gl::COMPILE && mode != gl::COMPILE_AND_EXECUTE {
            self.backend.error(GlError::InvalidEnum, "glNewList");
            return;
        }
        if self.current.is_some() {
            self.backend
                .error(GlError::InvalidOperation, "glNewList already compiling");
            return;
        }
        self.shared.lock().invalidate_atlases(name);
        match ListState::new(name, mode, self.config.max_list_blocks) {
            Ok(state) => {
                log::debug!("list {name}: compiling");
                self.current = Some(state);
            }
            Err(_) => self.backend.error(GlError::OutOfMemory, "glNewList"),
        }
    }

    /// `glEndList`: installs the open list, replacing any list with the
    /// same name.
    pub fn end_list(&mut self) {
        let Some(state) = self.current.take() else {
            self.backend
                .error(GlError::InvalidOperation, "glEndList not compiling");
            return;
        };
        let (list, use_loopback) = state.finish();
        let name = list.name();
        let shared = Arc::clone(&self.shared);
        let mut table = shared.lock();
        table.destroy(name);
        table.install(list, self.config.small_lists);
        if let Some(list) = table.get(name) {
            log::debug!(
                "list {name}: {} cells, {}",
                list.cell_count(),
                if list.is_small() { "small" } else { "blocks" }
            );
        }
        if use_loopback {
            let retagged = loopback::rewrite(&mut table, name, self.list_base);
            log::debug!("list {name}: {retagged} vertex lists switched to loopback");
        }
    }

    /// `glCallList`.
    pub fn call_list(&mut self, name: u32) {
        let Some(executes) = self.current.as_ref().map(ListState::executes) else {
            self.execute_call_list(name);
            return;
        };
        self.record_call(&Command::CallList(name));
        if executes {
            self.execute_call_list(name);
        }
    }

    /// `glCallLists`. `lists` holds at least `n` ids of type `ty` in native
    /// byte order.
    pub fn call_lists(&mut self, n: i32, ty: GLenum, lists: &[u8]) {
        let Some(size) = gl::call_lists_type_size(ty) else {
            self.compile_error(GlError::InvalidEnum, "glCallLists(type)");
            return;
        };
        let Ok(count) = usize::try_from(n) else {
            self.compile_error(GlError::InvalidValue, "glCallLists(n < 0)");
            return;
        };
        let Some(lists) = count.checked_mul(size).and_then(|len| lists.get(..len)) else {
            self.compile_error(GlError::InvalidValue, "glCallLists(lists)");
            return;
        };
        let Some(executes) = self.current.as_ref().map(ListState::executes) else {
            self.execute_call_lists(ty, lists);
            return;
        };
        self.record_call(&Command::CallLists {
            n,
            ty,
            lists: Cow::Borrowed(lists),
        });
        if executes {
            self.execute_call_lists(ty, lists);
        }
    }

    /// `glListBase`.
    pub fn list_base(&mut self, base: u32) {
        let executes = match self.current.as_ref() {
            Some(state) => {
                let executes = state.executes();
                self.record_list_base(base);
                executes
            }
            None => true,
        };
        if executes {
            self.list_base = base;
        }
    }

    /// `glDeleteLists`. Names without a list are ignored.
    pub fn delete_lists(&mut self, list: u32, range: i32) {
        if range < 0 {
            self.backend.error(GlError::InvalidValue, "glDeleteLists");
            return;
        }
        let shared = Arc::clone(&self.shared);
        let mut table = shared.lock();
        if range > 1 {
            if let Some(atlas) = table.remove_atlas(list) {
                self.release_atlas(atlas);
            }
        }
        for offset in 0..range as u32 {
            let Some(name) = list.checked_add(offset) else {
                break;
            };
            if name != 0 && table.destroy(name) {
                log::trace!("list {name}: deleted");
            }
        }
    }

    /// `glIsList`.
    pub fn is_list(&self, name: u32) -> bool {
        name != 0 && self.shared.lock().contains(name)
    }

    /// Issues a GL call.
    pub fn submit(&mut self, command: Command<'_>) {
        match command {
            Command::CallList(name) => self.call_list(name),
            Command::CallLists { n, ty, lists } => self.call_lists(n, ty, &lists),
            Command::ListBase(base) => self.list_base(base),
            command if self.current.is_some() => self.record(command),
            command => self.execute(&command),
        }
    }

    /// `glPixelStorei` for the unpack state. Never compiled.
    pub fn pixel_store(&mut self, pname: GLenum, param: i32) {
        if let Err(error) = self.unpack.set(pname, param) {
            self.backend.error(error, "glPixelStorei");
        }
    }

    pub fn pixel_store_state(&self) -> &PixelStore {
        &self.unpack
    }

    /// Accepts a finished vertex batch from the vertex buffer subsystem.
    ///
    /// Outside of list compilation this is a caller bug; it is reported
    /// through [`Dispatch::problem`](crate::Dispatch::problem) and ignored.
    pub fn save_vertex_batch(&mut self, batch: &VertexBatch, flags: BatchFlags) {
        match self.record_vertex_batch(batch, flags) {
            None => self
                .backend
                .problem("vertex batch saved outside of display list compilation"),
            Some(true) => {
                let mode = if flags.copy_current {
                    VertexListMode::CopyCurrent
                } else {
                    VertexListMode::Replay
                };
                self.backend.draw_vertex_list(batch, mode);
            }
            Some(false) => {}
        }
    }

    /// `GL_LIST_INDEX`: the name of the list being compiled, or 0.
    pub fn list_index(&self) -> u32 {
        self.current.as_ref().map_or(0, |state| state.name)
    }

    /// `GL_LIST_MODE`: the mode of the list being compiled, or 0.
    pub fn list_mode(&self) -> GLenum {
        self.current.as_ref().map_or(0, |state| state.mode)
    }

    /// `GL_LIST_BASE`.
    pub fn current_list_base(&self) -> u32 {
        self.list_base
    }

    pub fn is_compiling(&self) -> bool {
        self.current.is_some()
    }

    /// Disassembles a list, one instruction per line.
    pub fn print_list(&self, name: u32) -> Option<String> {
        let table = self.shared.lock();
        let list = table.get(name)?;
        let (cells, head) = table.cells(list);
        let mut out = String::new();
        disassemble(&mut out, name, &cells, head, list.payloads()).ok()?;
        Some(out)
    }

    /// Passes a call to the backend with the client unpack state.
    pub(crate) fn execute(&mut self, command: &Command<'_>) {
        self.backend.call(command, &self.unpack);
    }

    fn execute_call_list(&mut self, name: u32) {
        if name == 0 {
            self.backend
                .error(GlError::InvalidValue, "glCallList(list==0)");
            return;
        }
        let shared = Arc::clone(&self.shared);
        let mut table = shared.lock();
        self.run(&mut table, Frame::call(name));
    }

    fn execute_call_lists(&mut self, ty: GLenum, lists: &[u8]) {
        let ids = translate_ids(ty, lists);
        let shared = Arc::clone(&self.shared);
        let mut table = shared.lock();
        if let Some(frame) = self.call_lists_frame(&mut table, ty, ids) {
            self.run(&mut table, frame);
        }
    }
}
