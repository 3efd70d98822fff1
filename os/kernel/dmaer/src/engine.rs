//! # Engine Controller
//!
//! Starts one DMA channel on a translated chain and busy-waits for it to go
//! idle. The channel's registers are reached through [`ChannelRegisters`],
//! so the same controller drives real MMIO or a simulated channel.

use crate::{DescriptorError, DmaError, TranslationCache};
use dmaer_addresses::{BusAddress, VirtualAddress};
use dmaer_info::channel::POLL_BUDGET;
use dmaer_pager::UserMemory;
use dmaer_registers::ChannelRegisters;

/// How a wait for the channel ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The channel went idle after `polls` status reads.
    Completed { polls: u32 },
    /// The channel was still active when the poll budget ran out.
    TimedOut,
}

pub struct Engine<R> {
    registers: R,
    budget: u32,
}

impl<R: ChannelRegisters> Engine<R> {
    /// A controller that polls up to [`POLL_BUDGET`] times.
    #[must_use]
    pub const fn new(registers: R) -> Self {
        Self::with_budget(registers, POLL_BUDGET)
    }

    #[must_use]
    pub const fn with_budget(registers: R, budget: u32) -> Self {
        Self { registers, budget }
    }

    #[inline]
    #[must_use]
    pub const fn registers(&self) -> &R {
        &self.registers
    }

    /// Abort anything in flight and put the channel back in its reset state.
    pub fn reset(&mut self) {
        let before = self.registers.control_status();
        self.registers.reset();
        let after = self.registers.control_status();
        log::debug!(
            "channel reset, CS {:#010x} -> {:#010x}",
            before.into_bits(),
            after.into_bits()
        );
    }

    /// Run the translated chain whose head block lives at `head`.
    ///
    /// The head's own bus address is resolved through `cache`, so a cache
    /// still warm from translating the same chain serves it without a page
    /// lookup.
    ///
    /// # Errors
    /// - [`DmaError::InvalidDescriptor`] for a null head.
    /// - [`DmaError::Unmapped`] if `head` is not mapped, or
    ///   [`DmaError::Fault`] if its page cannot be brought in; the channel
    ///   is not started either way.
    /// - [`DmaError::Timeout`] if the channel does not go idle in time.
    pub fn kick<M>(
        &mut self,
        cache: &mut TranslationCache,
        mem: &M,
        head: VirtualAddress,
    ) -> Result<PollOutcome, DmaError>
    where
        M: UserMemory + ?Sized,
    {
        if head.is_null() {
            log::error!("kick without a control block");
            return Err(DescriptorError::NullAddress.into());
        }
        let bus = cache
            .lookup(head, mem)
            .map_err(DmaError::in_chain)
            .inspect_err(|e| log::error!("kick at {head}: {e}"))?;

        self.start(bus)?;
        match self.poll() {
            outcome @ PollOutcome::Completed { polls } => {
                log::debug!("chain at {head} ({bus}) done after {polls} polls");
                Ok(outcome)
            }
            PollOutcome::TimedOut => {
                log::error!("chain at {head} ({bus}) still running after {} polls", self.budget);
                Err(DmaError::Timeout { polls: self.budget })
            }
        }
    }

    /// Point the channel at the block at `bus` and set it running.
    ///
    /// # Errors
    /// [`DescriptorError::AddressTooWide`] if `bus` does not fit the 32-bit
    /// register.
    pub fn start(&mut self, bus: BusAddress) -> Result<(), DmaError> {
        let conblk = bus
            .as_u32()
            .ok_or(DescriptorError::AddressTooWide(bus.as_u64()))?;
        self.registers.start(conblk);
        self.registers.barrier();
        Ok(())
    }

    /// Read `CS` until the channel goes idle or the budget runs out.
    #[must_use]
    pub fn poll(&mut self) -> PollOutcome {
        for polls in 1..=self.budget {
            if !self.registers.control_status().is_busy() {
                return PollOutcome::Completed { polls };
            }
        }
        PollOutcome::TimedOut
    }
}
