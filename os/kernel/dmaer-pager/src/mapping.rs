use crate::{Page, PageAllocator, PagerError, SessionHandle, UserMemory};
use dmaer_addresses::{PAGE_SHIFT, PAGE_SIZE, VirtualAddress};

/// One demand-paged region over the device.
///
/// A mapping is a window of `pages` pages at `start`, bound to a session.
/// Duplicates (a forked process, a split region) share the session; each one
/// must be closed, and the session's pages go away with the last close.
pub struct Mapping<A: PageAllocator> {
    start: VirtualAddress,
    pages: u64,
    session: Option<SessionHandle<A>>,
}

impl<A: PageAllocator> Mapping<A> {
    pub(crate) fn new(start: VirtualAddress, pages: u64, session: SessionHandle<A>) -> Self {
        log::trace!("vma open {start}, {} references", session.references());
        Self {
            start,
            pages,
            session: Some(session),
        }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> VirtualAddress {
        self.start
    }

    /// First address past the mapping. [`Pager::map`](crate::Pager::map)
    /// only hands out mappings for which this does not overflow.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> VirtualAddress {
        VirtualAddress::new(self.start.as_u64() + self.size())
    }

    /// Size in bytes, always a whole number of pages.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.pages * PAGE_SIZE
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, va: VirtualAddress) -> bool {
        va.as_u64() >= self.start.as_u64() && va.as_u64() < self.end().as_u64()
    }

    /// The session, unless this mapping has been closed.
    #[inline]
    #[must_use]
    pub const fn session(&self) -> Option<&SessionHandle<A>> {
        self.session.as_ref()
    }

    /// A second mapping of the same region sharing this one's session.
    ///
    /// # Errors
    /// [`PagerError::NoSession`] if this mapping was already closed.
    pub fn duplicate(&self) -> Result<Self, PagerError> {
        let Some(session) = &self.session else {
            log::error!("duplicate of {} without a session", self.start);
            return Err(PagerError::NoSession);
        };
        Ok(Self::new(self.start, self.pages, session.clone()))
    }

    /// Drop this mapping's reference to its session.
    ///
    /// # Errors
    /// [`PagerError::NoSession`] if the mapping was already closed. This is
    /// reported rather than ignored: it means open and close events got out
    /// of step.
    pub fn close(&mut self) -> Result<(), PagerError> {
        let Some(session) = self.session.take() else {
            log::error!("close of {} without a session", self.start);
            return Err(PagerError::NoSession);
        };
        let remaining = session.references() - 1;
        drop(session);
        log::trace!("vma close {}, {remaining} references remain", self.start);
        Ok(())
    }

    /// Page offset of `va` within this mapping.
    fn page_offset(&self, va: VirtualAddress) -> Result<u64, PagerError> {
        if self.contains(va) {
            Ok((va.as_u64() - self.start.as_u64()) >> PAGE_SHIFT)
        } else {
            Err(PagerError::Unmapped(va))
        }
    }

    /// Touch the page at `va`, faulting it in if it is not backed yet.
    ///
    /// # Errors
    /// - [`PagerError::Unmapped`] outside the mapping.
    /// - [`PagerError::NoSession`] after [`close`](Self::close).
    /// - [`PagerError::OutOfMemory`] if the fault cannot be serviced.
    pub fn fault(&self, va: VirtualAddress) -> Result<Page, PagerError> {
        let pgoff = self.page_offset(va)?;
        let session = self.session.as_ref().ok_or(PagerError::NoSession)?;
        session.fault(pgoff)
    }
}

impl<A: PageAllocator> UserMemory for Mapping<A> {
    #[inline]
    fn user_page(&self, va: VirtualAddress) -> Result<Page, PagerError> {
        self.fault(va)
    }
}

/// A set of mappings, e.g. all mappings of one process.
impl<A: PageAllocator> UserMemory for [Mapping<A>] {
    fn user_page(&self, va: VirtualAddress) -> Result<Page, PagerError> {
        self.iter()
            .find(|m| m.contains(va))
            .ok_or(PagerError::Unmapped(va))?
            .fault(va)
    }
}

impl<A: PageAllocator> Drop for Mapping<A> {
    fn drop(&mut self) {
        if self.session.is_some() {
            let _ = self.close();
        }
    }
}

impl<A: PageAllocator> core::fmt::Debug for Mapping<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Mapping")
            .field("start", &self.start)
            .field("pages", &self.pages)
            .field("open", &self.session.is_some())
            .finish()
    }
}
