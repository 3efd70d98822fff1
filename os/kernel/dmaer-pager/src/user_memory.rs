use crate::frame::FRAME_BYTES;
use crate::{Page, PagerError};
use dmaer_addresses::{BusAddress, BusPage, PageOffset, VirtualAddress, VirtualPage};

/// The driver's view of a caller's memory.
///
/// Implementors only provide [`user_page`](Self::user_page); copies and
/// pinning are built on top of it and work across page boundaries.
pub trait UserMemory {
    /// The page backing `va`, faulting it in if the memory is demand paged.
    ///
    /// # Errors
    /// [`PagerError::Unmapped`] if nothing is mapped at `va`, or whatever the
    /// fault itself fails with.
    fn user_page(&self, va: VirtualAddress) -> Result<Page, PagerError>;

    /// Copy `dst.len()` bytes starting at `src` out of user memory.
    ///
    /// # Errors
    /// See [`user_page`](Self::user_page). `dst` may be partially filled on error.
    fn copy_from_user(&self, src: VirtualAddress, dst: &mut [u8]) -> Result<(), PagerError> {
        for_each_chunk(self, src, dst.len(), |page, offset, range| {
            page.read(offset, &mut dst[range]);
        })
    }

    /// Copy `src` into user memory starting at `dst`.
    ///
    /// # Errors
    /// See [`user_page`](Self::user_page). Bytes before the failing page are
    /// already written.
    fn copy_to_user(&self, dst: VirtualAddress, src: &[u8]) -> Result<(), PagerError> {
        for_each_chunk(self, dst, src.len(), |page, offset, range| {
            page.write(offset, &src[range]);
        })
    }

    /// Pin the page at `page` for as long as the returned guard lives.
    ///
    /// # Errors
    /// See [`user_page`](Self::user_page).
    fn pin_page(&self, page: VirtualPage) -> Result<PinnedPage, PagerError> {
        self.user_page(page.base()).map(PinnedPage)
    }
}

fn for_each_chunk<M, F>(mem: &M, start: VirtualAddress, len: usize, mut f: F) -> Result<(), PagerError>
where
    M: UserMemory + ?Sized,
    F: FnMut(&Page, usize, core::ops::Range<usize>),
{
    let mut done = 0;
    while done < len {
        let at = start
            .checked_add(done as u64)
            .ok_or(PagerError::Unmapped(start))?;
        let page = mem.user_page(at)?;
        let offset = at.offset().as_usize();
        let n = (FRAME_BYTES - offset).min(len - done);
        f(&page, offset, done..done + n);
        done += n;
    }
    Ok(())
}

/// A page held in place while its bus address is in use.
///
/// Dropping the guard releases the pin.
pub struct PinnedPage(Page);

impl PinnedPage {
    #[inline]
    #[must_use]
    pub fn bus_page(&self) -> BusPage {
        self.0.bus_page()
    }

    /// Bus address of the byte at `offset` in this page.
    #[inline]
    #[must_use]
    pub fn bus_address(&self, offset: PageOffset) -> BusAddress {
        self.0.bus_page().join(offset)
    }
}
