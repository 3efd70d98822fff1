//! # Typed BCM2835 DMA Channel Registers
//!
//! Bit-level models of the registers the driver touches, plus the
//! [`ChannelRegisters`] seam through which the engine controller reads and
//! writes them. Keeping register access behind a trait means the controller
//! runs unchanged against real MMIO ([`mmio::MmioChannel`], feature `mmio`)
//! or against a simulated channel in tests.
//!
//! | Register | Offset | Model |
//! |----------|--------|-------|
//! | `CS` | `0x00` | [`ControlStatus`] |
//! | `CONBLK_AD` | `0x04` | raw 32-bit bus address |
//! | `TI` (in a control block) | word 0 | [`TransferInformation`] |

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod cs;
#[cfg(feature = "mmio")]
pub mod mmio;
mod ti;

pub use crate::cs::ControlStatus;
pub use crate::ti::TransferInformation;

use core::sync::atomic::{Ordering, fence};

/// Register-level access to one DMA channel.
///
/// Every method takes `&mut self`: a channel has exactly one controller, and
/// test doubles get to record what happened.
pub trait ChannelRegisters {
    /// Read `CS`.
    fn control_status(&mut self) -> ControlStatus;

    /// Write `CS`.
    fn set_control_status(&mut self, cs: ControlStatus);

    /// Read `CONBLK_AD`.
    fn control_block_address(&mut self) -> u32;

    /// Write `CONBLK_AD`.
    fn set_control_block_address(&mut self, bus: u32);

    /// Full memory barrier: everything written before is visible to the
    /// device before anything written after.
    #[inline]
    fn barrier(&mut self) {
        fence(Ordering::SeqCst);
    }

    /// Start the channel on the control block at bus address `bus`.
    ///
    /// Writes `CONBLK_AD` first and then raises `CS.ACTIVE`, with a barrier
    /// in front so the control block contents are visible to the engine.
    fn start(&mut self, bus: u32) {
        self.barrier();
        self.set_control_block_address(bus);
        self.set_control_status(ControlStatus::new().with_active(true));
    }

    /// Abort whatever the channel is doing and return it to its reset state.
    fn reset(&mut self) {
        self.set_control_status(ControlStatus::new().with_reset(true));
    }
}

impl<T> ChannelRegisters for &mut T
where
    T: ChannelRegisters + ?Sized,
{
    #[inline]
    fn control_status(&mut self) -> ControlStatus {
        (**self).control_status()
    }

    #[inline]
    fn set_control_status(&mut self, cs: ControlStatus) {
        (**self).set_control_status(cs);
    }

    #[inline]
    fn control_block_address(&mut self) -> u32 {
        (**self).control_block_address()
    }

    #[inline]
    fn set_control_block_address(&mut self, bus: u32) {
        (**self).set_control_block_address(bus);
    }

    #[inline]
    fn barrier(&mut self) {
        (**self).barrier();
    }

    #[inline]
    fn start(&mut self, bus: u32) {
        (**self).start(bus);
    }

    #[inline]
    fn reset(&mut self) {
        (**self).reset();
    }
}
