use crate::{BusAddress, OFFSET_MASK, PAGE_SIZE, PageOffset, VirtualAddress};
use core::fmt;

/// Page-aligned base of a page in the caller's view of memory.
///
/// ### Invariants
/// - The low [`PAGE_SHIFT`](crate::PAGE_SHIFT) bits are always zero.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualPage(u64);

impl VirtualPage {
    /// Page that contains `addr` (aligns down).
    #[inline]
    #[must_use]
    pub const fn containing(addr: VirtualAddress) -> Self {
        Self(addr.as_u64() & !OFFSET_MASK)
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> VirtualAddress {
        VirtualAddress::new(self.0)
    }

    #[inline]
    #[must_use]
    pub const fn join(self, off: PageOffset) -> VirtualAddress {
        VirtualAddress::new(self.0 | off.as_u64())
    }

    /// The page directly after this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + PAGE_SIZE)
    }
}

impl fmt::Debug for VirtualPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualPage({:#010X})", self.0)
    }
}

impl fmt::Display for VirtualPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}/4K", self.0)
    }
}

/// Page-aligned base of a page as seen by the DMA engine.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BusPage(u64);

impl BusPage {
    /// Page that contains `addr` (aligns down).
    #[inline]
    #[must_use]
    pub const fn from_addr(addr: BusAddress) -> Self {
        Self(addr.as_u64() & !OFFSET_MASK)
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> BusAddress {
        BusAddress::new(self.0)
    }

    #[inline]
    #[must_use]
    pub const fn join(self, off: PageOffset) -> BusAddress {
        BusAddress::new(self.0 | off.as_u64())
    }
}

impl fmt::Debug for BusPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BusPage({:#010X})", self.0)
    }
}

impl fmt::Display for BusPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}/4K", self.0)
    }
}
