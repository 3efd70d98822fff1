//! # Simulated DMA Channel
//!
//! A [`ChannelRegisters`] implementation that behaves like a BCM2835 channel
//! doing memory-to-memory copies, with bus memory provided by a
//! [`FramePool`]. After `CS.ACTIVE` is raised the channel reports busy for a
//! configurable number of status reads, then walks the chain at `CONBLK_AD`
//! and performs every block before going idle.
//!
//! Handles are cheap to clone and share state, so a test keeps one to
//! inspect the register traffic while the device owns another.

use crate::BusControlBlock;
use crate::descriptor::CONTROL_BLOCK_BYTES;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use dmaer_addresses::BusAddress;
use dmaer_pager::FramePool;
use dmaer_registers::{ChannelRegisters, ControlStatus};
use dmaer_sync::SpinLock;

/// Longest chain the simulation will follow before flagging an error.
pub const MAX_SIMULATED_BLOCKS: usize = 1 << 16;

/// One register access, in the order the channel saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterEvent {
    Barrier,
    ControlStatus(ControlStatus),
    ControlBlockAddress(u32),
}

#[derive(Clone)]
pub struct SimulatedChannel {
    pool: Arc<FramePool>,
    state: Arc<SpinLock<SimState>>,
}

struct SimState {
    cs: ControlStatus,
    conblk: u32,
    /// Busy reads after each start; `None` never finishes.
    latency: Option<u32>,
    remaining: u32,
    blocks_run: usize,
    events: Vec<RegisterEvent>,
}

impl SimulatedChannel {
    /// An idle channel that finishes on the first status read after a start.
    #[must_use]
    pub fn new(pool: Arc<FramePool>) -> Self {
        Self {
            pool,
            state: Arc::new(SpinLock::new(SimState {
                cs: ControlStatus::new(),
                conblk: 0,
                latency: Some(0),
                remaining: 0,
                blocks_run: 0,
                events: Vec::new(),
            })),
        }
    }

    /// Stay busy for `reads` status reads after every start.
    #[must_use]
    pub fn with_latency(self, reads: u32) -> Self {
        self.state.with_lock(|s| s.latency = Some(reads));
        self
    }

    /// Never finish a chain.
    #[must_use]
    pub fn stalled(self) -> Self {
        self.state.with_lock(|s| s.latency = None);
        self
    }

    /// Register accesses so far.
    #[must_use]
    pub fn events(&self) -> Vec<RegisterEvent> {
        self.state.with_lock(|s| s.events.clone())
    }

    /// Control blocks performed so far.
    #[must_use]
    pub fn blocks_run(&self) -> usize {
        self.state.with_lock(|s| s.blocks_run)
    }

    /// Walk the chain at `CONBLK_AD` to its end.
    fn run(&self, state: &mut SimState) {
        while state.conblk != 0 {
            if state.blocks_run >= MAX_SIMULATED_BLOCKS {
                log::error!("simulated chain exceeds {MAX_SIMULATED_BLOCKS} blocks");
                state.cs.set_error(true);
                return;
            }

            let at = BusAddress::from(state.conblk);
            let mut raw = [0; CONTROL_BLOCK_BYTES];
            if !self.pool.read_bus(at, &mut raw) {
                log::error!("simulated channel: no memory behind control block {at}");
                state.cs.set_error(true);
                return;
            }
            let block = BusControlBlock::from_bytes(&raw);
            if !self.perform(&block) {
                log::error!("simulated channel: bad transfer in block {at}: {block:?}");
                state.cs.set_error(true);
                return;
            }
            state.blocks_run += 1;
            state.conblk = block.next().and_then(BusAddress::as_u32).unwrap_or(0);
        }
    }

    fn perform(&self, block: &BusControlBlock) -> bool {
        let ti = block.transfer_information();
        let len = block.length() as usize;
        let unit = if ti.src_wide() { 16 } else { 4 };

        let mut data = vec![0; len];
        if ti.src_increment() {
            if !self.pool.read_bus(block.source(), &mut data) {
                return false;
            }
        } else {
            // the first source unit, over and over
            let mut first = vec![0; unit.min(len)];
            if !self.pool.read_bus(block.source(), &mut first) {
                return false;
            }
            for chunk in data.chunks_mut(unit) {
                chunk.copy_from_slice(&first[..chunk.len()]);
            }
        }

        if ti.dest_increment() {
            self.pool.write_bus(block.destination(), &data)
        } else {
            // every unit lands on the same address; only the last one stays
            let tail = &data[len.saturating_sub(unit)..];
            self.pool.write_bus(block.destination(), tail)
        }
    }
}

impl ChannelRegisters for SimulatedChannel {
    fn control_status(&mut self) -> ControlStatus {
        let mut state = self.state.lock();
        if state.cs.active() && state.latency.is_some() {
            if state.remaining > 0 {
                state.remaining -= 1;
            } else {
                self.run(&mut state);
                state.cs.set_active(false);
            }
        }
        state.cs
    }

    fn set_control_status(&mut self, cs: ControlStatus) {
        let mut state = self.state.lock();
        state.events.push(RegisterEvent::ControlStatus(cs));
        if cs.reset() {
            state.cs = ControlStatus::new();
            state.remaining = 0;
        } else if cs.active() {
            state.cs = ControlStatus::new().with_active(true);
            state.remaining = state.latency.unwrap_or(0);
        }
    }

    fn control_block_address(&mut self) -> u32 {
        self.state.with_lock(|s| s.conblk)
    }

    fn set_control_block_address(&mut self, bus: u32) {
        self.state.with_lock(|s| {
            s.events.push(RegisterEvent::ControlBlockAddress(bus));
            s.conblk = bus;
        });
    }

    fn barrier(&mut self) {
        self.state.with_lock(|s| s.events.push(RegisterEvent::Barrier));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmaer_pager::{Page, PageAllocator};
    use dmaer_registers::TransferInformation;

    fn bus(page: &Page, offset: u64) -> BusAddress {
        page.bus_page().base() + offset
    }

    fn block_bytes(ti: TransferInformation, src: BusAddress, dst: BusAddress, len: u32, next: u32) -> [u8; 32] {
        let words = [
            ti.into_bits(),
            src.as_u32().unwrap(),
            dst.as_u32().unwrap(),
            len,
            0xffff_ffff,
            next,
            0,
            0,
        ];
        let mut raw = [0; 32];
        for (chunk, w) in raw.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&w.to_le_bytes());
        }
        raw
    }

    #[test]
    fn runs_a_two_block_chain_after_latency() {
        let pool = Arc::new(FramePool::with_capacity(2));
        let page = pool.alloc_page().unwrap();
        let data = pool.alloc_page().unwrap();
        data.write(0, b"0123456789abcdef");

        let copy = TransferInformation::memory_copy(true);
        let second = bus(&page, 0x20).as_u32().unwrap();
        page.write(0, &block_bytes(copy, bus(&data, 0), bus(&data, 0x100), 16, second));
        page.write(0x20, &block_bytes(copy, bus(&data, 4), bus(&data, 0x200), 4, 0));

        let mut ch = SimulatedChannel::new(Arc::clone(&pool)).with_latency(2);
        ch.start(bus(&page, 0).as_u32().unwrap());
        assert!(ch.control_status().active());
        assert!(ch.control_status().active());
        assert_eq!(ch.blocks_run(), 0);
        assert!(!ch.control_status().active());
        assert_eq!(ch.blocks_run(), 2);

        let mut out = [0; 16];
        data.read(0x100, &mut out);
        assert_eq!(&out, b"0123456789abcdef");
        data.read(0x200, &mut out[..4]);
        assert_eq!(&out[..4], b"4567");
    }

    #[test]
    fn fixed_source_fills() {
        let pool = Arc::new(FramePool::with_capacity(1));
        let page = pool.alloc_page().unwrap();
        page.write(0x40, &[0xAB; 16]);
        let fill = TransferInformation::memory_copy(false);
        page.write(0, &block_bytes(fill, bus(&page, 0x40), bus(&page, 0x100), 64, 0));

        let mut ch = SimulatedChannel::new(Arc::clone(&pool));
        ch.start(bus(&page, 0).as_u32().unwrap());
        assert!(!ch.control_status().is_busy());

        let mut out = [0; 64];
        page.read(0x100, &mut out);
        assert_eq!(out, [0xAB; 64]);
    }

    #[test]
    fn unbacked_control_block_sets_error() {
        let pool = Arc::new(FramePool::with_capacity(1));
        let mut ch = SimulatedChannel::new(pool);
        ch.start(0xC000_0000);
        let cs = ch.control_status();
        assert!(cs.error());
        assert!(!cs.active());
    }

    #[test]
    fn stalled_channel_stays_active_until_reset() {
        let pool = Arc::new(FramePool::with_capacity(1));
        let mut ch = SimulatedChannel::new(pool).stalled();
        ch.start(0xC000_0000);
        for _ in 0..100 {
            assert!(ch.control_status().active());
        }
        ch.reset();
        assert!(!ch.control_status().active());
    }

    #[test]
    fn clones_share_register_traffic() {
        let pool = Arc::new(FramePool::with_capacity(1));
        let observer = SimulatedChannel::new(pool);
        let mut ch = observer.clone();
        ch.barrier();
        ch.set_control_block_address(0x40);
        assert_eq!(
            observer.events(),
            [RegisterEvent::Barrier, RegisterEvent::ControlBlockAddress(0x40)]
        );
    }
}
