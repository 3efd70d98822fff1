use crate::{BusPage, OFFSET_MASK, PAGE_SIZE, VirtualPage};
use core::fmt;
use core::ops::Add;

/// Offset of a byte within its page (`0..PAGE_SIZE`).
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageOffset(u64);

impl PageOffset {
    /// Create from a raw value, asserting it is below [`PAGE_SIZE`] in debug.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        debug_assert!(value < PAGE_SIZE, "offset must be < page size");
        Self(value & OFFSET_MASK)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The offset as an index into the page's bytes.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PageOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset({:#X})", self.0)
    }
}

impl Add<PageOffset> for VirtualPage {
    type Output = crate::VirtualAddress;
    #[inline]
    fn add(self, rhs: PageOffset) -> Self::Output {
        self.join(rhs)
    }
}

impl Add<PageOffset> for BusPage {
    type Output = crate::BusAddress;
    #[inline]
    fn add(self, rhs: PageOffset) -> Self::Output {
        self.join(rhs)
    }
}
