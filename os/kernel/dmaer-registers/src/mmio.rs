//! Volatile access to a memory-mapped channel register block.

use crate::{ChannelRegisters, ControlStatus};
use core::ptr::NonNull;
use dmaer_info::channel::{CHANNEL_STRIDE, CONBLK_AD_OFFSET, CS_OFFSET};

/// A channel's register block at a fixed MMIO address.
pub struct MmioChannel {
    base: NonNull<u32>,
}

// Safety: the register block is device memory, not shared Rust data.
unsafe impl Send for MmioChannel {}

impl MmioChannel {
    /// # Safety
    /// `base` must point at a mapped DMA channel register block (uncached,
    /// device memory) that nothing else drives for the lifetime of the value.
    #[must_use]
    pub const unsafe fn new(base: NonNull<u32>) -> Self {
        Self { base }
    }

    /// Channel `index` of the controller whose register window starts at
    /// `controller`.
    ///
    /// # Safety
    /// As for [`new`](Self::new), for the block of channel `index`.
    #[must_use]
    pub const unsafe fn at_channel(controller: NonNull<u32>, index: usize) -> Self {
        // Safety: the caller vouches for the channel's block.
        unsafe { Self::new(controller.byte_add(index * CHANNEL_STRIDE)) }
    }

    #[inline]
    fn reg(&self, offset: usize) -> *mut u32 {
        self.base.as_ptr().wrapping_byte_add(offset)
    }

    #[inline]
    fn read(&self, offset: usize) -> u32 {
        // Safety: see `new`.
        unsafe { self.reg(offset).read_volatile() }
    }

    #[inline]
    fn write(&mut self, offset: usize, value: u32) {
        // Safety: see `new`.
        unsafe { self.reg(offset).write_volatile(value) }
    }
}

impl ChannelRegisters for MmioChannel {
    fn control_status(&mut self) -> ControlStatus {
        ControlStatus::from_bits(self.read(CS_OFFSET))
    }

    fn set_control_status(&mut self, cs: ControlStatus) {
        self.write(CS_OFFSET, cs.into_bits());
    }

    fn control_block_address(&mut self) -> u32 {
        self.read(CONBLK_AD_OFFSET)
    }

    fn set_control_block_address(&mut self, bus: u32) {
        self.write(CONBLK_AD_OFFSET, bus);
    }

    #[inline]
    fn barrier(&mut self) {
        // Safety: `dsb sy` only orders memory accesses; it touches no registers or stack.
        #[cfg(target_arch = "aarch64")]
        unsafe {
            core::arch::asm!("dsb sy", options(nostack, preserves_flags));
        }
        // ARMv6 has no `dsb`; the CP15 data synchronization barrier works on v6 and v7.
        // Safety: the CP15 barrier write only orders memory accesses; its operand is an input.
        #[cfg(target_arch = "arm")]
        unsafe {
            core::arch::asm!("mcr p15, 0, {0}, c7, c10, 4", in(reg) 0_u32, options(nostack, preserves_flags));
        }
        core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
    }
}
