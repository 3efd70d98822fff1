//! # Page Translation Cache
//!
//! Resolving a virtual address means pinning its page and asking for the
//! page's bus address, which is the dominant cost of translating a chain.
//! Chains tend to hit the same few pages over and over (consecutive blocks
//! of one buffer, blocks packed into one page), so a handful of slots
//! replaced round-robin absorbs almost all of it.
//!
//! The cache is reset at the start of every translation pass and before a
//! standalone kick, so nothing survives from a previous buffer lifetime.

use dmaer_addresses::{BusAddress, BusPage, VirtualAddress, VirtualPage};
use dmaer_info::memory::TRANSLATION_CACHE_SLOTS;
use dmaer_pager::{PagerError, UserMemory};

/// Eight `(virtual page, bus page)` pairs, replaced round-robin.
#[derive(Debug, Clone)]
pub struct TranslationCache {
    /// `None` never matches a lookup.
    slots: [Option<(VirtualPage, BusPage)>; TRANSLATION_CACHE_SLOTS],
    cursor: usize,
    hits: u32,
    misses: u32,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationCache {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None; TRANSLATION_CACHE_SLOTS],
            cursor: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Forget every entry and start over at slot 0.
    pub fn reset(&mut self) {
        self.slots = [None; TRANSLATION_CACHE_SLOTS];
        self.cursor = 0;
        self.hits = 0;
        self.misses = 0;
    }

    /// Bus address of `va` in `mem`.
    ///
    /// A miss pins the page just long enough to read its bus address and
    /// then records the translation in the slot under the cursor.
    ///
    /// # Errors
    /// Whatever pinning the page fails with, typically
    /// [`PagerError::Unmapped`]. Nothing is cached in that case.
    pub fn lookup<M>(&mut self, va: VirtualAddress, mem: &M) -> Result<BusAddress, PagerError>
    where
        M: UserMemory + ?Sized,
    {
        let (page, offset) = va.split();

        if let Some(bus) = self.find(page) {
            self.hits += 1;
            return Ok(bus.join(offset));
        }

        let bus = mem.pin_page(page)?.bus_page();
        self.misses += 1;
        self.slots[self.cursor] = Some((page, bus));
        self.cursor = (self.cursor + 1) % TRANSLATION_CACHE_SLOTS;
        Ok(bus.join(offset))
    }

    fn find(&self, page: VirtualPage) -> Option<BusPage> {
        self.slots
            .iter()
            .flatten()
            .find_map(|&(v, b)| (v == page).then_some(b))
    }

    /// Lookups served from a slot since the last reset.
    #[inline]
    #[must_use]
    pub const fn hits(&self) -> u32 {
        self.hits
    }

    /// Lookups that had to pin a page since the last reset.
    #[inline]
    #[must_use]
    pub const fn misses(&self) -> u32 {
        self.misses
    }

    /// The slot the next miss will overwrite.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<(VirtualPage, BusPage)> {
        self.slots.get(index).copied().flatten()
    }
}
