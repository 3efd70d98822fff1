//! # Page Frames and Their Allocator
//!
//! A [`Frame`] is one physical page: its physical address, the bus address
//! the DMA engine uses for it, and its bytes. Frames are shared as [`Page`]
//! (`Arc<Frame>`); each clone is one reference, the way `get_page` /
//! `put_page` count references to a kernel `struct page`.
//!
//! [`PageAllocator`] is the seam to the system's page allocator.
//! [`FramePool`] implements it for hosted use: a bounded pool that hands out
//! frames from a contiguous physical window and can be looked up by bus
//! address, which is what a simulated DMA engine needs.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use dmaer_addresses::{BusAddress, BusPage, PAGE_SIZE};
use dmaer_info::memory::{BUS_ALIAS, FRAME_POOL_PHYS_BASE};
use dmaer_sync::SpinLock;

/// Bytes in one frame.
#[allow(clippy::cast_possible_truncation)]
pub const FRAME_BYTES: usize = PAGE_SIZE as usize;

/// Shared reference to a frame.
pub type Page = Arc<Frame>;

/// One physical page.
pub struct Frame {
    phys: u64,
    bus: BusPage,
    bytes: SpinLock<[u8; FRAME_BYTES]>,
}

impl Frame {
    /// A zero-filled frame at physical address `phys`, visible to the engine
    /// at `phys + bus_alias`.
    #[must_use]
    pub fn new(phys: u64, bus_alias: u64) -> Self {
        debug_assert!(phys.is_multiple_of(PAGE_SIZE), "frame must be page aligned");
        Self {
            phys,
            bus: BusPage::from_addr(BusAddress::new(phys + bus_alias)),
            bytes: SpinLock::new([0; FRAME_BYTES]),
        }
    }

    #[inline]
    #[must_use]
    pub const fn phys(&self) -> u64 {
        self.phys
    }

    /// Where the DMA engine sees this frame.
    #[inline]
    #[must_use]
    pub const fn bus_page(&self) -> BusPage {
        self.bus
    }

    /// Copy `dst.len()` bytes starting at `offset` out of the frame.
    ///
    /// # Panics
    /// If the range leaves the frame.
    pub fn read(&self, offset: usize, dst: &mut [u8]) {
        self.bytes
            .with_lock(|b| dst.copy_from_slice(&b[offset..offset + dst.len()]));
    }

    /// Copy `src` into the frame starting at `offset`.
    ///
    /// # Panics
    /// If the range leaves the frame.
    pub fn write(&self, offset: usize, src: &[u8]) {
        self.bytes
            .with_lock(|b| b[offset..offset + src.len()].copy_from_slice(src));
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Frame")
            .field("phys", &format_args!("{:#010x}", self.phys))
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

/// Source of single physical pages.
pub trait PageAllocator: Send + Sync {
    /// One fresh page, or `None` when memory is exhausted.
    fn alloc_page(&self) -> Option<Page>;

    /// Give back a page previously returned by [`alloc_page`](Self::alloc_page).
    fn free_page(&self, page: Page);
}

impl<A> PageAllocator for Arc<A>
where
    A: PageAllocator + ?Sized,
{
    #[inline]
    fn alloc_page(&self) -> Option<Page> {
        (**self).alloc_page()
    }

    #[inline]
    fn free_page(&self, page: Page) {
        (**self).free_page(page);
    }
}

/// Default number of frames in a [`FramePool`] (64 MiB).
#[allow(clippy::cast_possible_truncation)]
pub const DEFAULT_POOL_FRAMES: usize = (64 * 1024 * 1024 / PAGE_SIZE) as usize;

/// Bounded frame pool over the physical window starting at
/// [`FRAME_POOL_PHYS_BASE`].
pub struct FramePool {
    capacity: usize,
    state: SpinLock<PoolState>,
}

struct PoolState {
    /// Next never-used frame index.
    next: u64,
    /// Physical addresses of returned frames, reused first.
    free: Vec<u64>,
    /// Frames currently handed out, by bus page.
    outstanding: BTreeMap<BusPage, Page>,
}

impl Default for FramePool {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePool {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_FRAMES)
    }

    /// A pool that refuses to hand out more than `capacity` frames at once.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: SpinLock::new(PoolState {
                next: 0,
                free: Vec::new(),
                outstanding: BTreeMap::new(),
            }),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of frames currently handed out.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.state.with_lock(|s| s.outstanding.len())
    }

    /// The outstanding frame backing `bus`, if any.
    #[must_use]
    pub fn frame_at(&self, bus: BusAddress) -> Option<Page> {
        self.state
            .with_lock(|s| s.outstanding.get(&bus.page()).cloned())
    }

    /// Read bus memory, crossing frame boundaries as needed.
    ///
    /// Returns `false` if any byte of the range is not backed by an
    /// outstanding frame.
    #[must_use]
    pub fn read_bus(&self, bus: BusAddress, dst: &mut [u8]) -> bool {
        let mut done = 0;
        while done < dst.len() {
            let at = bus + done as u64;
            let Some(frame) = self.frame_at(at) else {
                return false;
            };
            let offset = at.offset().as_usize();
            let n = (FRAME_BYTES - offset).min(dst.len() - done);
            frame.read(offset, &mut dst[done..done + n]);
            done += n;
        }
        true
    }

    /// Write bus memory, crossing frame boundaries as needed.
    ///
    /// Returns `false` if any byte of the range is not backed by an
    /// outstanding frame; bytes before the gap are already written.
    #[must_use]
    pub fn write_bus(&self, bus: BusAddress, src: &[u8]) -> bool {
        let mut done = 0;
        while done < src.len() {
            let at = bus + done as u64;
            let Some(frame) = self.frame_at(at) else {
                return false;
            };
            let offset = at.offset().as_usize();
            let n = (FRAME_BYTES - offset).min(src.len() - done);
            frame.write(offset, &src[done..done + n]);
            done += n;
        }
        true
    }
}

impl PageAllocator for FramePool {
    fn alloc_page(&self) -> Option<Page> {
        self.state.with_lock(|s| {
            if s.outstanding.len() >= self.capacity {
                return None;
            }
            let phys = if let Some(phys) = s.free.pop() {
                phys
            } else {
                let phys = FRAME_POOL_PHYS_BASE.checked_add(s.next.checked_mul(PAGE_SIZE)?)?;
                if phys + PAGE_SIZE > BUS_ALIAS {
                    return None;
                }
                s.next += 1;
                phys
            };
            let page = Arc::new(Frame::new(phys, BUS_ALIAS));
            s.outstanding.insert(page.bus_page(), Arc::clone(&page));
            Some(page)
        })
    }

    fn free_page(&self, page: Page) {
        self.state.with_lock(|s| {
            if s.outstanding.remove(&page.bus_page()).is_some() {
                s.free.push(page.phys());
            } else {
                log::error!("freeing page {page:?} that is not outstanding");
            }
        });
    }
}
