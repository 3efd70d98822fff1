//! # DMA Engine Access Layer
//!
//! Bridges a caller's demand-paged buffer and a BCM2835-style DMA channel.
//! The caller maps a buffer through the device, lays out a chain of control
//! blocks in it using virtual addresses, and then asks the device to
//! translate the chain to bus addresses and run it.
//!
//! ```text
//!   caller                     dmaer                        hardware
//!   ──────                     ─────                        ────────
//!   open()  ─────────────────▶ Device ── ExclusiveCell ──▶  one OpenFile
//!   mmap()  ─────────────────▶ Pager  ── faults ─────────▶  page frames
//!   write ControlBlocks into the mapping
//!   PREPARE(head) ───────────▶ translate_chain ─┐
//!                                               ├─ TranslationCache
//!   KICK(head)    ───────────▶ Engine::kick ────┘
//!                                  └─ CONBLK_AD, CS.ACTIVE ──▶ channel
//!                                  └─ poll CS until idle
//! ```
//!
//! ## Modules
//!
//! * [`descriptor`]: [`ControlBlock`] as the caller writes it and
//!   [`BusControlBlock`] as the engine reads it, with the one-way
//!   [`ControlBlock::translate`] between them.
//! * [`cache`]: eight-slot page translation cache.
//! * [`translate`]: the in-place chain walk.
//! * [`engine`]: start and poll one channel through [`ChannelRegisters`].
//! * [`device`]: the exclusivity gate and the command surface.
//! * [`kmsg`]: a kernel-log style [`log::Log`] sink.
//! * [`sim`]: a simulated channel that executes chains against a
//!   [`FramePool`](dmaer_pager::FramePool).
//!
//! [`ChannelRegisters`]: dmaer_registers::ChannelRegisters

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

pub mod cache;
mod command;
pub mod descriptor;
pub mod device;
pub mod engine;
mod error;
pub mod kmsg;
pub mod sim;
pub mod translate;

pub use crate::cache::TranslationCache;
pub use crate::command::Command;
pub use crate::descriptor::{BusControlBlock, ControlBlock, DescriptorError};
pub use crate::device::{Device, OpenFile};
pub use crate::engine::{Engine, PollOutcome};
pub use crate::error::{DmaError, errno};
