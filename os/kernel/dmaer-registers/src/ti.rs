use bitfield_struct::bitfield;

/// `TI`: transfer information word of a DMA control block.
///
/// Describes how one block moves data: address increments, bus widths,
/// burst length and peripheral pacing.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct TransferInformation {
    /// Bit 0: INTEN. Raise an interrupt when this block completes.
    pub interrupt_enable: bool,

    /// Bit 1: TDMODE. 2D mode; interprets `TXFR_LEN` as `YLENGTH:XLENGTH`
    /// and uses the stride word.
    pub two_d_mode: bool,

    #[bits(1, default = false)]
    _reserved_2: bool,

    /// Bit 3: `WAIT_RESP`. Wait for the AXI write response after each write.
    pub wait_response: bool,

    /// Bit 4: `DEST_INC`. Increment the destination address after each write.
    pub dest_increment: bool,

    /// Bit 5: `DEST_WIDTH`. 1 = 128-bit writes, 0 = 32-bit writes.
    pub dest_wide: bool,

    /// Bit 6: `DEST_DREQ`. Gate writes with the peripheral's DREQ.
    pub dest_dreq: bool,

    /// Bit 7: `DEST_IGNORE`. Do not perform destination writes.
    pub dest_ignore: bool,

    /// Bit 8: `SRC_INC`. Increment the source address after each read.
    pub src_increment: bool,

    /// Bit 9: `SRC_WIDTH`. 1 = 128-bit reads, 0 = 32-bit reads.
    pub src_wide: bool,

    /// Bit 10: `SRC_DREQ`. Gate reads with the peripheral's DREQ.
    pub src_dreq: bool,

    /// Bit 11: `SRC_IGNORE`. Do not perform source reads; writes zeroes.
    pub src_ignore: bool,

    /// Bits 12–15: `BURST_LENGTH`, in words.
    #[bits(4)]
    pub burst_length: u8,

    /// Bits 16–20: PERMAP. Peripheral whose DREQ paces the transfer.
    #[bits(5)]
    pub peripheral_map: u8,

    /// Bits 21–25: WAITS. Dummy cycles added after each read or write.
    #[bits(5)]
    pub waits: u8,

    /// Bit 26: `NO_WIDE_BURSTS`.
    pub no_wide_bursts: bool,

    #[bits(5, default = 0)]
    _reserved_27_31: u8,
}

impl TransferInformation {
    /// Burst length used for plain memory-to-memory copies.
    pub const MEMCPY_BURST: u8 = 5;

    /// Memory-to-memory copy: wide reads and writes, incrementing
    /// destination, bursts of [`MEMCPY_BURST`](Self::MEMCPY_BURST) words.
    ///
    /// `src_increment = false` repeats the first source word, which turns the
    /// block into a fill.
    #[must_use]
    pub const fn memory_copy(src_increment: bool) -> Self {
        Self::new()
            .with_src_increment(src_increment)
            .with_src_wide(true)
            .with_dest_increment(true)
            .with_dest_wide(true)
            .with_burst_length(Self::MEMCPY_BURST)
    }
}
