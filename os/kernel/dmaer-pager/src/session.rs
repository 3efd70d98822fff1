use crate::{Page, PageAllocator, PageLog, Pager, PagerError};
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::ops::Deref;
use dmaer_sync::SpinLock;

/// Backing store shared by a mapping and all of its duplicates.
///
/// Owns every page faulted into the mapping. Pages are only released when the
/// session itself is dropped, which happens once, when the last
/// [`SessionHandle`] goes away.
pub struct MappingSession<A: PageAllocator> {
    pager: Arc<Pager<A>>,
    state: SpinLock<SessionState>,
}

struct SessionState {
    log: PageLog,
    /// Installed pages by page offset into the mapping.
    installed: BTreeMap<u64, Page>,
}

impl<A: PageAllocator> MappingSession<A> {
    pub(crate) fn try_new(pager: Arc<Pager<A>>) -> Result<Self, PagerError> {
        Ok(Self {
            pager,
            state: SpinLock::new(SessionState {
                log: PageLog::try_new()?,
                installed: BTreeMap::new(),
            }),
        })
    }

    /// Pages faulted in so far.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.state.with_lock(|s| s.log.len())
    }

    /// Blocks in the page log.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.state.with_lock(|s| s.log.block_count())
    }

    /// The page installed at page offset `pgoff`, if it has been touched.
    #[must_use]
    pub fn installed(&self, pgoff: u64) -> Option<Page> {
        self.state.with_lock(|s| s.installed.get(&pgoff).cloned())
    }

    /// Service a fault at page offset `pgoff`.
    ///
    /// Returns the installed page, allocating and recording a fresh one if
    /// the offset has not been touched yet. Concurrent faults on the same
    /// session are serialized; a fault that lost the race returns the page
    /// the winner installed.
    ///
    /// # Errors
    /// [`PagerError::OutOfMemory`] if either the page or a new log block
    /// cannot be allocated. The session is unchanged in that case.
    pub fn fault(&self, pgoff: u64) -> Result<Page, PagerError> {
        let mut state = self.state.lock();
        if let Some(page) = state.installed.get(&pgoff) {
            return Ok(Arc::clone(page));
        }

        // Room in the log first, so a granted page is never left unrecorded.
        state.log.reserve_slot().inspect_err(|_| {
            log::error!("couldn't grow page log for fault at offset {pgoff}");
        })?;
        let Some(page) = self.pager.grant() else {
            log::error!("fault oom at offset {pgoff}");
            return Err(PagerError::OutOfMemory);
        };

        state.log.push(Arc::clone(&page));
        state.installed.insert(pgoff, Arc::clone(&page));
        log::trace!("fault at offset {pgoff} backed by {:?}", page.bus_page());
        Ok(page)
    }
}

impl<A: PageAllocator> Drop for MappingSession<A> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.installed.clear();

        let blocks = state.log.block_count();
        let mut freed = 0_usize;
        for page in state.log.drain() {
            self.pager.release(page);
            freed += 1;
        }
        log::debug!(
            "session released {freed} pages from {blocks} blocks, {} pages tracked",
            self.pager.tracked_pages()
        );
    }
}

/// Counted reference to a [`MappingSession`].
///
/// Cloning is the `open`/duplicate event, dropping is `close`.
pub struct SessionHandle<A: PageAllocator>(Arc<MappingSession<A>>);

impl<A: PageAllocator> SessionHandle<A> {
    pub(crate) fn new(session: MappingSession<A>) -> Self {
        Self(Arc::new(session))
    }

    /// Number of live handles to this session.
    #[must_use]
    pub fn references(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Whether two handles refer to the same session.
    #[must_use]
    pub fn same_session(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<A: PageAllocator> Clone for SessionHandle<A> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<A: PageAllocator> Deref for SessionHandle<A> {
    type Target = MappingSession<A>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
