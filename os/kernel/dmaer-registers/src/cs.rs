use bitfield_struct::bitfield;

/// `CS`: DMA channel control and status register.
///
/// Read for status, write to start, abort or reset the channel.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct ControlStatus {
    /// Bit 0: ACTIVE.
    ///
    /// Set to start the channel; reads back as 1 while a transfer is in
    /// progress. Clears itself after the last control block (null
    /// `NEXTCONBK`) completes.
    pub active: bool,

    /// Bit 1: END. Set when a control block with `INTEN` completes.
    /// Write 1 to clear.
    pub end: bool,

    /// Bit 2: INT. Interrupt status. Write 1 to clear.
    pub int: bool,

    /// Bit 3: DREQ. State of the selected peripheral request line.
    pub dreq: bool,

    /// Bit 4: PAUSED.
    pub paused: bool,

    /// Bit 5: `DREQ_STOPS_DMA`.
    pub dreq_stops_dma: bool,

    /// Bit 6: `WAITING_FOR_OUTSTANDING_WRITES`.
    pub waiting_for_outstanding_writes: bool,

    #[bits(1, default = false)]
    _reserved_7: bool,

    /// Bit 8: ERROR. An AXI read error or FIFO error occurred.
    pub error: bool,

    #[bits(7, default = 0)]
    _reserved_9_15: u8,

    /// Bits 16–19: PRIORITY of normal AXI bus transactions.
    #[bits(4)]
    pub priority: u8,

    /// Bits 20–23: `PANIC_PRIORITY` of panicking AXI bus transactions.
    #[bits(4)]
    pub panic_priority: u8,

    #[bits(4, default = 0)]
    _reserved_24_27: u8,

    /// Bit 28: `WAIT_FOR_OUTSTANDING_WRITES` before signalling END.
    pub wait_for_outstanding_writes: bool,

    /// Bit 29: DISDEBUG. Keep running while the debug pause signal is set.
    pub disable_debug: bool,

    /// Bit 30: ABORT the current control block. Self-clearing.
    pub abort: bool,

    /// Bit 31: RESET the channel. Self-clearing.
    pub reset: bool,
}

impl ControlStatus {
    /// Whether the engine is still working through a chain.
    #[inline]
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.active()
    }
}
