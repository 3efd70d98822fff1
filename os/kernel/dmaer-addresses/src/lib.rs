//! # Virtual and Bus Address Types
//!
//! Strongly typed wrappers for the two address spaces a DMA transfer touches.
//!
//! ## Overview
//!
//! A caller describes a transfer with addresses from its own (virtual) view of
//! memory. The DMA engine cannot dereference those; it needs the **bus**
//! address of the same byte. Mixing the two silently is the classic failure
//! mode of a driver like this one, so both kinds get their own type:
//!
//! | Address | Page base | Meaning |
//! |---------|-----------|---------|
//! | [`VirtualAddress`] | [`VirtualPage`] | Caller view; only valid inside the owning mapping. |
//! | [`BusAddress`] | [`BusPage`] | Engine view; never dereferenced by the CPU. |
//!
//! Both split into a page base and a [`PageOffset`], and a page base joins
//! with an offset back into a full address. There is no conversion between
//! the two kinds in this crate: going from virtual to bus requires resolving
//! the backing page, which is the job of the pager.
//!
//! ```rust
//! # use dmaer_addresses::*;
//! let va = VirtualAddress::new(0x1000_2345);
//! let (page, off) = va.split();
//! assert_eq!(page.base().as_u64(), 0x1000_2000);
//! assert_eq!(off.as_u64(), 0x345);
//!
//! // Pretend the page lives at bus page 0xC000_7000
//! let bus = BusPage::from_addr(BusAddress::new(0xC000_7000)).join(off);
//! assert_eq!(bus.as_u64(), 0xC000_7345);
//! ```
//!
//! All types are `#[repr(transparent)]`, `Copy`, and usable as map keys.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod bus_address;
mod page;
mod page_offset;
mod virtual_address;

pub use crate::bus_address::BusAddress;
pub use crate::page::{BusPage, VirtualPage};
pub use crate::page_offset::PageOffset;
pub use crate::virtual_address::VirtualAddress;
pub use dmaer_info::memory::{PAGE_SHIFT, PAGE_SIZE};

/// Mask selecting the in-page offset bits.
pub(crate) const OFFSET_MASK: u64 = PAGE_SIZE - 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_virtual() {
        let va = VirtualAddress::new(0x1234_5678_9ABC_DEF0);
        let (p, o) = va.split();
        assert_eq!(p.base().as_u64() & OFFSET_MASK, 0);
        assert_eq!(o.as_u64(), 0xEF0);
        assert_eq!(p.join(o), va);
    }

    #[test]
    fn split_and_join_bus() {
        let ba = BusAddress::new(0xC012_3042);
        let (p, o) = ba.split();
        assert_eq!(p.base().as_u64(), 0xC012_3000);
        assert_eq!(o.as_u64(), 0x42);
        assert_eq!(p.join(o), ba);
    }

    #[test]
    fn null_detection() {
        assert!(VirtualAddress::zero().is_null());
        assert!(!VirtualAddress::new(1).is_null());
        assert!(BusAddress::zero().is_null());
    }

    #[test]
    fn page_alignment_helpers() {
        let va = VirtualAddress::new(0x12345);
        assert_eq!(va.page().base().as_u64(), 0x12000);
        assert_eq!(va.offset().as_u64(), 0x345);
        assert!(VirtualAddress::new(0x12000).is_page_aligned());
        assert!(!va.is_page_aligned());
        assert_eq!(VirtualPage::containing(va).next().base().as_u64(), 0x13000);
    }

    #[test]
    fn pages_spanned_counts_partial_pages() {
        assert_eq!(VirtualAddress::new(0x1000).pages_spanned(4096), 1);
        assert_eq!(VirtualAddress::new(0x1800).pages_spanned(4096), 2);
        assert_eq!(VirtualAddress::new(0x1fff).pages_spanned(2), 2);
        assert_eq!(VirtualAddress::new(0x1000).pages_spanned(3 * 4096 + 1), 4);
    }

    #[test]
    fn formatting() {
        let va = VirtualAddress::new(0x1000_0020);
        assert_eq!(format!("{va}"), "0x10000020");
        assert_eq!(format!("{va:?}"), "VA(0x10000020)");
        let ba = BusAddress::new(0xC000_0020);
        assert_eq!(format!("{ba:?}"), "BA(0xC0000020)");
        assert_eq!(format!("{:?}", ba.page()), "BusPage(0xC0000000)");
    }
}
