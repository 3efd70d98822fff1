//! # Driver Configuration
//!
//! Compile-time constants shared by every `dmaer` crate. There is no runtime
//! configuration: the page geometry, the bookkeeping granularity, the cache
//! size, the completion poll budget and the command numbering are all fixed
//! here so that every component agrees on them.
//!
//! ## Modules
//!
//! * [`memory`]: page geometry, page-log block capacity and the bus alias
//!   under which the DMA engine sees system RAM.
//! * [`channel`]: register offsets and bits of a DMA channel, plus the poll
//!   budget for completion.
//! * [`ioctl`]: numeric command codes accepted on an open device handle.
//!
//! ```text
//!  user mapping (virtual) ──► page frames (physical) ──► bus alias (engine)
//!  0x1000_2345                0x0000_7000 + 0x345        0xC000_7345
//! ```
//!
//! All values are checked with `const` assertions where a relation between
//! them must hold.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod channel;
pub mod ioctl;
pub mod memory;

/// Name the character device registers under.
pub const DEVICE_NAME: &str = "dmaer";
