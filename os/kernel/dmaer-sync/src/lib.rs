//! # Driver synchronization primitives
//!
//! Two primitives cover the driver's needs:
//!
//! * [`SpinLock`]: serializes page-fault appends to a mapping session. Faults
//!   can arrive from several threads sharing one mapping, independently of
//!   who holds the device open.
//! * [`ExclusiveCell`]: a slot that hands out at most one owner at a time and
//!   fails fast instead of waiting. The device uses it as its open gate.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod exclusive_cell;
mod spin_lock;

pub use exclusive_cell::{ExclusiveCell, ExclusiveGuard};
pub use spin_lock::{SpinLock, SpinLockGuard};
