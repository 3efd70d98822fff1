//! # Memory Geometry

/// Size of a page, in bytes. Demand paging, pinning and the translation
/// cache all work at this granularity.
pub const PAGE_SIZE: u64 = 4096;

/// log2([`PAGE_SIZE`]).
pub const PAGE_SHIFT: u32 = 12;

/// Number of page handles a single page-log block records before a new
/// block is chained on.
pub const PAGES_PER_BLOCK: usize = 500;

/// Number of slots in the page-granularity translation cache.
pub const TRANSLATION_CACHE_SLOTS: usize = 8;

/// Offset added to a physical address to obtain the address the DMA engine
/// uses for the same memory (L2-coherent alias on BCM2835).
pub const BUS_ALIAS: u64 = 0xC000_0000;

/// First physical address handed out by the hosted frame pool.
pub const FRAME_POOL_PHYS_BASE: u64 = 0x0010_0000; // 1 MiB

/// Largest length a single transfer block may carry.
pub const MAX_TRANSFER_LENGTH: u32 = 0x3fff_ffff;

const _: () = {
    assert!(1 << PAGE_SHIFT == PAGE_SIZE);
    assert!(PAGES_PER_BLOCK > 0);
    assert!(TRANSLATION_CACHE_SLOTS > 0);
    assert!(BUS_ALIAS.is_multiple_of(PAGE_SIZE));
    assert!(FRAME_POOL_PHYS_BASE.is_multiple_of(PAGE_SIZE));
    assert!(FRAME_POOL_PHYS_BASE < BUS_ALIAS);
};
