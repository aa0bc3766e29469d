// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The handle table and the storage of finished lists.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dlist_encoding::{BlockChain, Cursor, Node, Opcode, Payloads, Segments};

use crate::BitmapAtlas;

/// Where the cells of a finished list live.
#[derive(Clone, Debug)]
pub(crate) enum Storage {
    /// A slice of the shared small list store.
    Small {
        start: u32,
        count: u32,
        /// The first cell is alignment padding and execution starts after it.
        begins_with_a_nop: bool,
    },
    /// Blocks owned by the list, linked by `CONTINUE`.
    Blocks(Vec<Vec<Node>>),
}

/// A finished display list.
#[derive(Clone, Debug)]
pub struct DisplayList {
    name: u32,
    storage: Storage,
    payloads: Payloads,
}

impl DisplayList {
    /// A list holding only `END_OF_LIST`, as reserved by `glGenLists`.
    pub(crate) fn empty(name: u32) -> Self {
        Self {
            name,
            storage: Storage::Blocks(vec![vec![Node::header(Opcode::EndOfList as u16, 1)]]),
            payloads: Payloads::new(),
        }
    }

    /// Takes ownership of a sealed chain.
    pub(crate) fn from_chain(name: u32, chain: BlockChain, payloads: Payloads) -> Self {
        debug_assert!(chain.is_sealed());
        Self {
            name,
            storage: Storage::Blocks(chain.into_blocks()),
            payloads,
        }
    }

    pub fn name(&self) -> u32 {
        self.name
    }

    pub fn payloads(&self) -> &Payloads {
        &self.payloads
    }

    /// Whether the list lives in the small list store.
    pub fn is_small(&self) -> bool {
        matches!(self.storage, Storage::Small { .. })
    }

    /// Cells used by the list, end marker included.
    pub fn cell_count(&self) -> usize {
        match &self.storage {
            Storage::Small { count, .. } => *count as usize,
            Storage::Blocks(blocks) => blocks.iter().map(Vec::len).sum(),
        }
    }
}

/// The cells of one list, wherever they are stored.
#[derive(Copy, Clone, Debug)]
pub enum ListCells<'a> {
    Small(&'a [Node]),
    Blocks(&'a [Vec<Node>]),
}

impl Segments for ListCells<'_> {
    fn segment(&self, index: u32) -> Option<&[Node]> {
        match self {
            Self::Small(cells) => cells.segment(index),
            Self::Blocks(blocks) => blocks.segment(index),
        }
    }
}

/// First-fit allocator of cell ranges in the small list store.
///
/// Ranges always start on an even cell, so an instruction keeps the parity
/// of its position when it is moved out of a block.
#[derive(Clone, Debug, Default)]
pub(crate) struct RangeAllocator {
    /// Sorted, disjoint and non-adjacent.
    free: Vec<Range<u32>>,
    end: u32,
}

impl RangeAllocator {
    pub(crate) fn alloc(&mut self, count: u32) -> Option<u32> {
        for i in 0..self.free.len() {
            let range = self.free[i].clone();
            let start = range.start.next_multiple_of(2);
            if start.checked_add(count).is_some_and(|end| end <= range.end) {
                let mut rest = Vec::with_capacity(2);
                if range.start < start {
                    rest.push(range.start..start);
                }
                if start + count < range.end {
                    rest.push(start + count..range.end);
                }
                self.free.splice(i..=i, rest);
                return Some(start);
            }
        }
        let start = self.end.checked_next_multiple_of(2)?;
        let end = start.checked_add(count)?;
        if start > self.end {
            self.release(self.end, start - self.end);
        }
        self.end = end;
        Some(start)
    }

    pub(crate) fn release(&mut self, start: u32, count: u32) {
        if count == 0 {
            return;
        }
        let mut range = start..start + count;
        let i = self.free.partition_point(|r| r.end < range.start);
        let mut j = i;
        while j < self.free.len() && self.free[j].start <= range.end {
            range.start = range.start.min(self.free[j].start);
            range.end = range.end.max(self.free[j].end);
            j += 1;
        }
        if range.end == self.end {
            self.end = range.start;
            self.free.drain(i..j);
        } else {
            self.free.splice(i..j, [range]);
        }
    }

    /// One past the highest allocated cell.
    pub(crate) fn end(&self) -> u32 {
        self.end
    }

    pub(crate) fn free_ranges(&self) -> usize {
        self.free.len()
    }
}

/// Counters describing a [`ListTable`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListStats {
    pub lists: usize,
    pub small_lists: usize,
    pub block_lists: usize,
    pub blocks: usize,
    /// Cells spanned by the small list store, free ranges included.
    pub small_store_cells: usize,
    pub free_ranges: usize,
    pub atlases: usize,
    /// Bytes held by the payload tables of all lists.
    pub payload_bytes: usize,
}

/// The display list namespace: handles, the small list store and the
/// bitmap atlases keyed by their first handle.
#[derive(Debug, Default)]
pub struct ListTable {
    lists: BTreeMap<u32, DisplayList>,
    small: Vec<Node>,
    ranges: RangeAllocator,
    pub(crate) atlases: BTreeMap<u32, BitmapAtlas>,
}

impl ListTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: u32) -> bool {
        self.lists.contains_key(&name)
    }

    pub fn get(&self, name: u32) -> Option<&DisplayList> {
        self.lists.get(&name)
    }

    /// The cells of `list` and the cursor of its first instruction.
    pub fn cells<'a>(&'a self, list: &'a DisplayList) -> (ListCells<'a>, Cursor) {
        match &list.storage {
            Storage::Small {
                start,
                count,
                begins_with_a_nop,
            } => {
                let cells = &self.small[*start as usize..(*start + *count) as usize];
                (
                    ListCells::Small(cells),
                    Cursor::new(0, u32::from(*begins_with_a_nop)),
                )
            }
            Storage::Blocks(blocks) => (ListCells::Blocks(blocks), Cursor::default()),
        }
    }

    /// The cell at `cursor` of list `name`.
    pub(crate) fn cell_mut(&mut self, name: u32, cursor: Cursor) -> Option<&mut Node> {
        match &mut self.lists.get_mut(&name)?.storage {
            Storage::Small { start, count, .. } => {
                if cursor.segment != 0 || cursor.pos >= *count {
                    return None;
                }
                self.small.get_mut((*start + cursor.pos) as usize)
            }
            Storage::Blocks(blocks) => blocks
                .get_mut(cursor.segment as usize)?
                .get_mut(cursor.pos as usize),
        }
    }

    /// Finds the lowest `range` consecutive unused handles.
    pub fn find_free_block(&self, range: u32) -> Option<u32> {
        if range == 0 {
            return None;
        }
        let mut first: u32 = 1;
        for &name in self.lists.keys() {
            if name.checked_sub(first).is_some_and(|gap| gap >= range) {
                break;
            }
            if name >= first {
                first = name.checked_add(1)?;
            }
        }
        first.checked_add(range - 1).map(|_| first)
    }

    /// Reserves `name` with an empty list.
    pub(crate) fn reserve(&mut self, name: u32) {
        self.insert(DisplayList::empty(name));
    }

    /// Installs a finished list, moving it into the small list store when it
    /// fits in one block. The previous definition, if any, is freed.
    pub(crate) fn install(&mut self, mut list: DisplayList, use_small_store: bool) {
        if use_small_store {
            if let Storage::Blocks(blocks) = &list.storage {
                if let [cells] = blocks.as_slice() {
                    if let Some(storage) = self.copy_to_small_store(cells) {
                        log::debug!(
                            "list {}: moved {} cells to the small list store",
                            list.name,
                            cells.len()
                        );
                        list.storage = storage;
                    }
                }
            }
        }
        self.insert(list);
    }

    fn copy_to_small_store(&mut self, cells: &[Node]) -> Option<Storage> {
        let count = u32::try_from(cells.len()).ok()?;
        let start = self.ranges.alloc(count)?;
        let end = self.ranges.end() as usize;
        if self.small.len() < end {
            if self.small.try_reserve(end - self.small.len()).is_err() {
                self.ranges.release(start, count);
                return None;
            }
            self.small.resize(end, Node::ZERO);
        }
        self.small[start as usize..start as usize + cells.len()].copy_from_slice(cells);
        let begins_with_a_nop = cells
            .first()
            .is_some_and(|cell| cell.opcode() == Opcode::Nop as u16);
        Some(Storage::Small {
            start,
            count,
            begins_with_a_nop,
        })
    }

    fn insert(&mut self, list: DisplayList) {
        if let Some(old) = self.lists.insert(list.name, list) {
            self.free_storage(old);
        }
    }

    /// Removes list `name`, marking every atlas that contains it as
    /// incomplete first. Returns whether the list existed.
    pub(crate) fn destroy(&mut self, name: u32) -> bool {
        if !self.lists.contains_key(&name) {
            return false;
        }
        self.invalidate_atlases(name);
        match self.lists.remove(&name) {
            Some(list) => {
                self.free_storage(list);
                true
            }
            None => false,
        }
    }

    fn free_storage(&mut self, list: DisplayList) {
        log::debug!(
            "list {}: freed {} cells, {} payloads",
            list.name,
            list.cell_count(),
            list.payloads.len()
        );
        if let Storage::Small { start, count, .. } = list.storage {
            self.ranges.release(start, count);
            self.small.truncate(self.ranges.end() as usize);
        }
    }

    /// Marks every complete atlas containing `name` as incomplete.
    pub(crate) fn invalidate_atlases(&mut self, name: u32) {
        for atlas in self.atlases.values_mut() {
            if atlas.contains(name) && atlas.invalidate() {
                log::debug!("bitmap atlas {}: list {name} changed", atlas.id());
            }
        }
    }

    pub fn atlas(&self, id: u32) -> Option<&BitmapAtlas> {
        self.atlases.get(&id)
    }

    pub(crate) fn atlas_mut(&mut self, id: u32) -> Option<&mut BitmapAtlas> {
        self.atlases.get_mut(&id)
    }

    pub(crate) fn insert_atlas(&mut self, atlas: BitmapAtlas) -> Option<BitmapAtlas> {
        self.atlases.insert(atlas.id(), atlas)
    }

    pub(crate) fn remove_atlas(&mut self, id: u32) -> Option<BitmapAtlas> {
        self.atlases.remove(&id)
    }

    pub fn stats(&self) -> ListStats {
        let mut stats = ListStats {
            lists: self.lists.len(),
            small_store_cells: self.small.len(),
            free_ranges: self.ranges.free_ranges(),
            atlases: self.atlases.len(),
            ..ListStats::default()
        };
        for list in self.lists.values() {
            stats.payload_bytes += list.payloads.heap_size();
            match &list.storage {
                Storage::Small { .. } => stats.small_lists += 1,
                Storage::Blocks(blocks) => {
                    stats.block_lists += 1;
                    stats.blocks += blocks.len();
                }
            }
        }
        stats
    }
}

/// A list namespace that several contexts can share.
#[derive(Debug, Default)]
pub struct SharedLists {
    table: Mutex<ListTable>,
}

impl SharedLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the table. A poisoned lock is recovered, since every table
    /// update leaves it consistent.
    pub fn lock(&self) -> MutexGuard<'_, ListTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

static_assertions::assert_impl_all!(SharedLists: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use dlist_encoding::{read_instruction, Instructions};

    fn chain_with(ops: &[(Opcode, usize)], align8: bool) -> BlockChain {
        let mut chain = BlockChain::new(usize::MAX).unwrap();
        for &(op, len) in ops {
            chain.allocate(op, len, align8).unwrap();
        }
        chain.seal();
        chain
    }

    #[test]
    fn ranges_are_reused_first_fit() {
        let mut ranges = RangeAllocator::default();
        let a = ranges.alloc(5).unwrap();
        let b = ranges.alloc(4).unwrap();
        let c = ranges.alloc(3).unwrap();
        assert_eq!((a, b, c), (0, 6, 10));
        ranges.release(b, 4);
        assert_eq!(ranges.free_ranges(), 1);
        assert_eq!(ranges.alloc(2), Some(6));
        assert_eq!(ranges.alloc(2), Some(8));
        // The odd cell left behind by the first list stays free.
        assert_eq!(ranges.free_ranges(), 1);
    }

    #[test]
    fn released_ranges_coalesce() {
        let mut ranges = RangeAllocator::default();
        let a = ranges.alloc(4).unwrap();
        let b = ranges.alloc(4).unwrap();
        let c = ranges.alloc(4).unwrap();
        let _d = ranges.alloc(4).unwrap();
        ranges.release(a, 4);
        ranges.release(c, 4);
        assert_eq!(ranges.free_ranges(), 2);
        ranges.release(b, 4);
        assert_eq!(ranges.free_ranges(), 1);
        assert_eq!(ranges.alloc(12), Some(0));
    }

    #[test]
    fn releasing_the_tail_shrinks_the_store() {
        let mut ranges = RangeAllocator::default();
        let a = ranges.alloc(3).unwrap();
        let b = ranges.alloc(3).unwrap();
        ranges.release(b, 3);
        assert_eq!(ranges.end(), 3);
        ranges.release(a, 3);
        assert_eq!(ranges.end(), 0);
        assert_eq!(ranges.free_ranges(), 0);
    }

    #[test]
    fn short_list_moves_to_small_store() {
        let mut table = ListTable::new();
        let chain = chain_with(&[(Opcode::Enable, 1), (Opcode::Disable, 1)], false);
        table.install(DisplayList::from_chain(3, chain, Payloads::new()), true);
        let list = table.get(3).unwrap();
        assert!(list.is_small());
        assert_eq!(list.cell_count(), 5);
        let (cells, head) = table.cells(list);
        let ops: Vec<_> = Instructions::new(&cells, head)
            .map(|inst| inst.unwrap().opcode)
            .collect();
        assert_eq!(ops, [Opcode::Enable, Opcode::Disable, Opcode::EndOfList]);
    }

    #[test]
    fn leading_nop_is_skipped() {
        let mut table = ListTable::new();
        let chain = chain_with(&[(Opcode::VertexList, 8)], true);
        table.install(DisplayList::from_chain(1, chain, Payloads::new()), true);
        let list = table.get(1).unwrap();
        let (cells, head) = table.cells(list);
        assert_eq!(head, Cursor::new(0, 1));
        let first = read_instruction(&cells, head).unwrap();
        assert_eq!(first.opcode, Opcode::VertexList);
        assert_eq!(first.operands.len(), 8);
    }

    #[test]
    fn long_list_keeps_its_blocks() {
        let mut table = ListTable::new();
        let ops = vec![(Opcode::LineWidth, 1); 200];
        let chain = chain_with(&ops, false);
        table.install(DisplayList::from_chain(9, chain, Payloads::new()), true);
        assert!(!table.get(9).unwrap().is_small());
        let stats = table.stats();
        assert_eq!(stats.block_lists, 1);
        assert_eq!(stats.blocks, 2);
        assert_eq!(stats.small_store_cells, 0);
    }

    #[test]
    fn destroy_returns_the_range() {
        let mut table = ListTable::new();
        for name in 1..=3 {
            let chain = chain_with(&[(Opcode::PopMatrix, 0)], false);
            table.install(DisplayList::from_chain(name, chain, Payloads::new()), true);
        }
        assert!(table.destroy(2));
        assert!(!table.destroy(2));
        assert_eq!(table.stats().free_ranges, 1);
        let chain = chain_with(&[(Opcode::PushMatrix, 0)], false);
        table.install(DisplayList::from_chain(4, chain, Payloads::new()), true);
        assert_eq!(table.stats().free_ranges, 0);
        assert_eq!(table.stats().small_store_cells, 6);
    }

    #[test]
    fn free_block_search() {
        let mut table = ListTable::new();
        assert_eq!(table.find_free_block(3), Some(1));
        for name in [1, 2, 5] {
            table.reserve(name);
        }
        assert_eq!(table.find_free_block(2), Some(3));
        assert_eq!(table.find_free_block(3), Some(6));
        assert_eq!(table.find_free_block(0), None);
        table.reserve(u32::MAX);
        assert_eq!(table.find_free_block(u32::MAX), None);
    }
}
