//! # Page Log
//!
//! Append-only record of the pages a session owns. Pages are kept in blocks
//! of [`PAGES_PER_BLOCK`]; the block list itself grows on demand, so appends
//! are amortized O(1) and the number of blocks reflects how far the mapping
//! has grown.

use crate::{Page, PagerError};
use alloc::vec::Vec;
use dmaer_info::memory::PAGES_PER_BLOCK;

/// Fixed-capacity chunk of the page log.
pub struct PageBlock {
    pages: Vec<Page>,
}

impl PageBlock {
    /// An empty block with room for [`PAGES_PER_BLOCK`] pages.
    ///
    /// # Errors
    /// [`PagerError::OutOfMemory`] if the block storage cannot be allocated.
    pub fn try_new() -> Result<Self, PagerError> {
        let mut pages = Vec::new();
        pages
            .try_reserve_exact(PAGES_PER_BLOCK)
            .map_err(|_| PagerError::OutOfMemory)?;
        Ok(Self { pages })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.pages.len() == PAGES_PER_BLOCK
    }
}

/// The block chain of one session. Never empty: the head block exists from
/// the moment the session does.
pub struct PageLog {
    blocks: Vec<PageBlock>,
    len: usize,
}

impl PageLog {
    /// A log with one empty head block.
    ///
    /// # Errors
    /// [`PagerError::OutOfMemory`] if the head block cannot be allocated.
    pub fn try_new() -> Result<Self, PagerError> {
        let mut blocks = Vec::new();
        blocks
            .try_reserve(1)
            .map_err(|_| PagerError::OutOfMemory)?;
        blocks.push(PageBlock::try_new()?);
        Ok(Self { blocks, len: 0 })
    }

    /// Make sure the next [`push`](Self::push) has a slot, chaining a new
    /// tail block if the current one is full.
    ///
    /// Nothing changes on failure.
    ///
    /// # Errors
    /// [`PagerError::OutOfMemory`] if a new block is needed and cannot be allocated.
    pub fn reserve_slot(&mut self) -> Result<(), PagerError> {
        if !self.tail().is_full() {
            return Ok(());
        }
        let block = PageBlock::try_new()?;
        self.blocks
            .try_reserve(1)
            .map_err(|_| PagerError::OutOfMemory)?;
        self.blocks.push(block);
        log::trace!("page log grew to {} blocks", self.blocks.len());
        Ok(())
    }

    /// Append a page. Call [`reserve_slot`](Self::reserve_slot) first.
    ///
    /// # Panics
    /// In debug builds, if the tail block is full.
    pub fn push(&mut self, page: Page) {
        debug_assert!(!self.tail().is_full(), "push without reserve_slot");
        let last = self.blocks.len() - 1;
        self.blocks[last].pages.push(page);
        self.len += 1;
    }

    fn tail(&self) -> &PageBlock {
        // never empty, see `try_new`
        &self.blocks[self.blocks.len() - 1]
    }

    /// Total pages recorded across all blocks.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &PageBlock> {
        self.blocks.iter()
    }

    /// Remove every page, in append order, together with the blocks.
    ///
    /// The log is spent afterwards; this is for teardown only.
    pub fn drain(&mut self) -> impl Iterator<Item = Page> + '_ {
        self.len = 0;
        self.blocks.drain(..).flat_map(|b| b.pages)
    }
}
