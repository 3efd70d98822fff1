//! # DMA Channel Registers

/// Byte offset of the control/status register within a channel's register block.
pub const CS_OFFSET: usize = 0x00;

/// Byte offset of the control-block address register.
pub const CONBLK_AD_OFFSET: usize = 0x04;

/// Size of one channel's register block.
pub const CHANNEL_STRIDE: usize = 0x100;

/// Maximum number of status reads while waiting for the engine to go idle.
pub const POLL_BUDGET: u32 = 1_000_000;

const _: () = {
    assert!(CONBLK_AD_OFFSET > CS_OFFSET);
    assert!(CONBLK_AD_OFFSET < CHANNEL_STRIDE);
    assert!(POLL_BUDGET > 0);
};
