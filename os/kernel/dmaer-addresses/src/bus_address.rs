use crate::{BusPage, OFFSET_MASK, PageOffset};
use core::fmt;
use core::ops::Add;

/// Address as seen by the DMA engine.
///
/// The CPU never dereferences a bus address. Once a descriptor field has been
/// rewritten to bus form it is only ever handed back to hardware.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BusAddress(u64);

impl BusAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The 32-bit register form, if the address fits.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn as_u32(self) -> Option<u32> {
        if self.0 > u32::MAX as u64 {
            None
        } else {
            Some(self.0 as u32)
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    #[must_use]
    pub const fn page(self) -> BusPage {
        BusPage::from_addr(self)
    }

    #[inline]
    #[must_use]
    pub const fn offset(self) -> PageOffset {
        PageOffset::new(self.0 & OFFSET_MASK)
    }

    #[inline]
    #[must_use]
    pub const fn split(self) -> (BusPage, PageOffset) {
        (self.page(), self.offset())
    }
}

impl fmt::Debug for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BA({:#010X})", self.0)
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for BusAddress {
    #[inline]
    fn from(v: u32) -> Self {
        Self(u64::from(v))
    }
}

impl Add<u64> for BusAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}
