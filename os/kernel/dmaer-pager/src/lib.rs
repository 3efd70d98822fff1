//! # Demand-Paged DMA Buffers
//!
//! This crate backs a device mapping with physical pages that materialize
//! lazily, one per first-touched page offset, and tracks them until the last
//! reference to the mapping goes away.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Mapping (one per mapped region / duplicate)          │
//! │   • virtual range, demand faults, user copies        │
//! └──────────────┬───────────────────────────────────────┘
//!                │ SessionHandle (shared, counted)
//! ┌──────────────▼───────────────────────────────────────┐
//! │ MappingSession                                       │
//! │   • installed pages by offset                        │
//! │   • PageLog: blocks of up to 500 owned pages         │
//! └──────────────┬───────────────────────────────────────┘
//!                │
//! ┌──────────────▼───────────────────────────────────────┐
//! │ Pager<A: PageAllocator>                              │
//! │   • tracked-page diagnostic                          │
//! │   • FramePool (hosted) or a platform allocator       │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! * [`Pager::map`] creates a fresh [`MappingSession`] and hands out the first
//!   [`Mapping`] over it.
//! * [`Mapping::duplicate`] (fork, `vm_open`) shares the same session.
//! * [`Mapping::close`] (or drop) gives up one reference. The session, and every
//!   page it ever faulted in, is released exactly once, when the last
//!   reference is gone.
//!
//! ## User Memory
//!
//! [`UserMemory`] is the view the driver has of a caller's memory: copy to and
//! from a virtual address, and pin a page long enough to learn its bus
//! address. [`Mapping`] implements it with demand-fault semantics: touching an
//! unbacked page inside the mapping faults it in, anything outside is
//! [`PagerError::Unmapped`].

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod error;
pub mod frame;
mod mapping;
mod page_log;
mod pager;
mod session;
mod user_memory;

pub use crate::error::PagerError;
pub use crate::frame::{Frame, FramePool, Page, PageAllocator};
pub use crate::mapping::Mapping;
pub use crate::page_log::{PageBlock, PageLog};
pub use crate::pager::Pager;
pub use crate::session::{MappingSession, SessionHandle};
pub use crate::user_memory::{PinnedPage, UserMemory};
