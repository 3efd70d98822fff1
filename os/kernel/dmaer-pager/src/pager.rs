use crate::{Mapping, MappingSession, Page, PageAllocator, PagerError, SessionHandle};
use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};
use dmaer_addresses::{PAGE_SIZE, VirtualAddress};

/// Hands out demand-paged mappings and keeps count of the pages they hold.
///
/// The tracked-page count is a diagnostic: it goes up by one for every page
/// faulted into any session and down by one for every page a session
/// releases. A non-zero count when nothing is mapped any more is a leak.
pub struct Pager<A: PageAllocator> {
    allocator: A,
    tracked: AtomicUsize,
}

impl<A: PageAllocator> Pager<A> {
    #[must_use]
    pub const fn new(allocator: A) -> Self {
        Self {
            allocator,
            tracked: AtomicUsize::new(0),
        }
    }

    /// Pages currently held by all sessions of this pager.
    #[inline]
    #[must_use]
    pub fn tracked_pages(&self) -> usize {
        self.tracked.load(Ordering::Acquire)
    }

    /// Set up a demand-paged mapping of `len` bytes at `start`.
    ///
    /// Nothing is allocated for the pages themselves; they appear on first
    /// touch. The returned mapping holds the session's first reference.
    ///
    /// # Errors
    /// - [`PagerError::Misaligned`] if `start` is not page aligned.
    /// - [`PagerError::EmptyMapping`] if `len` is zero.
    /// - [`PagerError::TooLarge`] if the page-rounded range does not end
    ///   below the top of the address space.
    /// - [`PagerError::OutOfMemory`] if the session bookkeeping cannot be allocated.
    pub fn map(self: &Arc<Self>, start: VirtualAddress, len: u64) -> Result<Mapping<A>, PagerError> {
        if !start.is_page_aligned() {
            return Err(PagerError::Misaligned(start));
        }
        if len == 0 {
            return Err(PagerError::EmptyMapping);
        }
        let pages = len.div_ceil(PAGE_SIZE);
        let fits = pages
            .checked_mul(PAGE_SIZE)
            .and_then(|size| start.as_u64().checked_add(size))
            .is_some();
        if !fits {
            return Err(PagerError::TooLarge { start, len });
        }
        let session = MappingSession::try_new(Arc::clone(self)).inspect_err(|_| {
            log::error!("couldn't allocate a session for mapping at {start}");
        })?;
        log::debug!("mmap {start} ({pages} pages), {} pages tracked", self.tracked_pages());
        Ok(Mapping::new(start, pages, SessionHandle::new(session)))
    }

    pub(crate) fn grant(&self) -> Option<Page> {
        let page = self.allocator.alloc_page()?;
        self.tracked.fetch_add(1, Ordering::AcqRel);
        Some(page)
    }

    pub(crate) fn release(&self, page: Page) {
        self.allocator.free_page(page);
        self.tracked.fetch_sub(1, Ordering::AcqRel);
    }
}
