//! # The Device
//!
//! [`Device`] owns the channel and the pager behind it. The channel sits in
//! an [`ExclusiveCell`]: [`Device::open`] hands out the only [`OpenFile`] or
//! fails with [`DmaError::Busy`] on the spot, and dropping the `OpenFile`
//! makes the device available again.
//!
//! Everything that touches the channel goes through the `OpenFile`, so the
//! translation cache, the chain walk and the engine never run concurrently
//! and need no locking of their own. Page faults on mappings are a
//! different matter; the pager serializes those itself.

use crate::translate::translate_chain;
use crate::{Command, DmaError, Engine, TranslationCache};
use alloc::sync::Arc;
use dmaer_addresses::VirtualAddress;
use dmaer_info::DEVICE_NAME;
use dmaer_pager::{Mapping, PageAllocator, Pager, UserMemory};
use dmaer_registers::ChannelRegisters;
use dmaer_sync::{ExclusiveCell, ExclusiveGuard};

struct Channel<R> {
    engine: Engine<R>,
    cache: TranslationCache,
}

pub struct Device<A: PageAllocator, R> {
    pager: Arc<Pager<A>>,
    channel: ExclusiveCell<Channel<R>>,
}

impl<A: PageAllocator, R: ChannelRegisters> Device<A, R> {
    /// Take over the channel behind `registers` and reset it.
    #[must_use]
    pub fn new(pager: Arc<Pager<A>>, registers: R) -> Self {
        Self::with_engine(pager, Engine::new(registers))
    }

    /// Like [`new`](Self::new) with a preconfigured engine.
    #[must_use]
    pub fn with_engine(pager: Arc<Pager<A>>, mut engine: Engine<R>) -> Self {
        engine.reset();
        log::info!("{DEVICE_NAME}: ready");
        Self {
            pager,
            channel: ExclusiveCell::new(Channel {
                engine,
                cache: TranslationCache::new(),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub const fn pager(&self) -> &Arc<Pager<A>> {
        &self.pager
    }

    /// Whether an [`OpenFile`] is currently out.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.channel.is_issued()
    }

    /// Open the device.
    ///
    /// # Errors
    /// [`DmaError::Busy`] if it is already open. Nothing waits; retrying is
    /// up to the caller.
    pub fn open(&self) -> Result<OpenFile<'_, A, R>, DmaError> {
        let Some(channel) = self.channel.try_acquire() else {
            log::debug!("{DEVICE_NAME}: open refused, already open");
            return Err(DmaError::Busy);
        };
        log::debug!("{DEVICE_NAME}: open");
        Ok(OpenFile {
            pager: &self.pager,
            channel,
        })
    }
}

/// The one open handle on a [`Device`].
pub struct OpenFile<'d, A: PageAllocator, R> {
    pager: &'d Arc<Pager<A>>,
    channel: ExclusiveGuard<'d, Channel<R>>,
}

impl<A: PageAllocator, R: ChannelRegisters> OpenFile<'_, A, R> {
    /// Map `len` bytes at `start` as a demand-paged buffer.
    ///
    /// # Errors
    /// See [`Pager::map`].
    pub fn mmap(&self, start: VirtualAddress, len: u64) -> Result<Mapping<A>, DmaError> {
        self.pager.map(start, len).map_err(DmaError::from)
    }

    /// Translate the chain at `head` in place. Returns the number of blocks
    /// rewritten.
    ///
    /// # Errors
    /// See [`translate_chain`].
    pub fn prepare<M>(&mut self, mem: &M, head: VirtualAddress) -> Result<usize, DmaError>
    where
        M: UserMemory + ?Sized,
    {
        let cache = &mut self.channel.cache;
        cache.reset();
        let steps = translate_chain(cache, mem, head)
            .inspect_err(|e| log::error!("prepare {head}: {e}"))?;
        log::debug!(
            "prepare {head}: {steps} blocks, {} hits, {} misses",
            cache.hits(),
            cache.misses()
        );
        Ok(steps)
    }

    /// Run the already translated chain at `head`.
    ///
    /// # Errors
    /// See [`Engine::kick`].
    pub fn kick<M>(&mut self, mem: &M, head: VirtualAddress) -> Result<(), DmaError>
    where
        M: UserMemory + ?Sized,
    {
        self.channel.cache.reset();
        self.run(mem, head)
    }

    /// [`prepare`](Self::prepare) and then run the chain, resolving the
    /// head from the translations the prepare left in the cache.
    ///
    /// # Errors
    /// Whatever either step fails with; a failed prepare starts nothing.
    pub fn prepare_then_kick<M>(&mut self, mem: &M, head: VirtualAddress) -> Result<(), DmaError>
    where
        M: UserMemory + ?Sized,
    {
        self.prepare(mem, head)?;
        self.run(mem, head)
    }

    fn run<M>(&mut self, mem: &M, head: VirtualAddress) -> Result<(), DmaError>
    where
        M: UserMemory + ?Sized,
    {
        let Channel { engine, cache } = &mut *self.channel;
        engine.kick(cache, mem, head).map(|_| ())
    }

    /// Reserved. Completes immediately.
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    pub fn wait_one(&mut self) -> Result<(), DmaError> {
        Ok(())
    }

    /// Reserved. Completes immediately.
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    pub fn wait_all(&mut self) -> Result<(), DmaError> {
        Ok(())
    }

    /// Decode and run command number `cmd` with pointer argument `arg`.
    ///
    /// # Errors
    /// [`DmaError::UnknownCommand`] for numbers outside the command set,
    /// otherwise whatever the command fails with.
    pub fn ioctl<M>(&mut self, mem: &M, cmd: u32, arg: u64) -> Result<(), DmaError>
    where
        M: UserMemory + ?Sized,
    {
        let cmd = Command::try_from(cmd).inspect_err(|e| log::warn!("ioctl: {e}"))?;
        let at = VirtualAddress::new(arg);
        log::trace!("ioctl {cmd:?} {at}");
        match cmd {
            Command::Prepare => self.prepare(mem, at).map(|_| ()),
            Command::Kick => self.kick(mem, at),
            Command::PrepareThenKick => self.prepare_then_kick(mem, at),
            Command::WaitOne => self.wait_one(),
            Command::WaitAll => self.wait_all(),
        }
    }

    /// Reading the device is not supported.
    ///
    /// # Errors
    /// Always [`DmaError::Io`].
    #[allow(clippy::unused_self)]
    pub fn read(&self, _buf: &mut [u8]) -> Result<usize, DmaError> {
        Err(DmaError::Io)
    }

    /// The translation cache as the last command left it.
    #[must_use]
    pub fn cache(&self) -> &TranslationCache {
        &self.channel.cache
    }
}

impl<A: PageAllocator, R> Drop for OpenFile<'_, A, R> {
    fn drop(&mut self) {
        let tracked = self.pager.tracked_pages();
        if tracked > 0 {
            log::warn!("{DEVICE_NAME}: closed with {tracked} pages still tracked");
        }
        log::debug!("{DEVICE_NAME}: close");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ControlBlock;
    use crate::sim::{RegisterEvent, SimulatedChannel};
    use dmaer_addresses::PAGE_SIZE;
    use dmaer_info::ioctl::{DMA_KICK, DMA_PREPARE, DMA_WAIT_ALL, DMA_WAIT_ONE};
    use dmaer_pager::FramePool;
    use dmaer_registers::ControlStatus;

    const BASE: u64 = 0x4000_0000;

    fn device(frames: usize) -> (SimulatedChannel, Device<Arc<FramePool>, SimulatedChannel>) {
        let pool = Arc::new(FramePool::with_capacity(frames));
        let channel = SimulatedChannel::new(Arc::clone(&pool));
        let pager = Arc::new(Pager::new(pool));
        (channel.clone(), Device::new(pager, channel))
    }

    fn va(v: u64) -> VirtualAddress {
        VirtualAddress::new(v)
    }

    #[test]
    fn construction_resets_the_channel() {
        let (sim, _dev) = device(1);
        assert_eq!(
            sim.events(),
            [RegisterEvent::ControlStatus(ControlStatus::new().with_reset(true))]
        );
    }

    #[test]
    fn second_open_is_busy_until_first_closes() {
        let (_sim, dev) = device(1);
        let first = dev.open().unwrap();
        assert!(dev.is_open());
        assert!(matches!(dev.open(), Err(DmaError::Busy)));
        drop(first);
        assert!(!dev.is_open());
        assert!(dev.open().is_ok());
    }

    #[test]
    fn read_is_unsupported() {
        let (_sim, dev) = device(1);
        let file = dev.open().unwrap();
        assert_eq!(file.read(&mut [0; 4]), Err(DmaError::Io));
    }

    #[test]
    fn unknown_and_reserved_commands() {
        let (sim, dev) = device(1);
        let mut file = dev.open().unwrap();
        let m = file.mmap(va(BASE), PAGE_SIZE).unwrap();
        assert_eq!(file.ioctl(&m, 0x4004_dd09, BASE), Err(DmaError::UnknownCommand(0x4004_dd09)));
        assert_eq!(file.ioctl(&m, DMA_WAIT_ONE, 0), Ok(()));
        assert_eq!(file.ioctl(&m, DMA_WAIT_ALL, 0), Ok(()));
        assert_eq!(sim.events().len(), 1, "only the reset");
    }

    #[test]
    fn prepare_out_of_pages_reports_efault() {
        // one frame: the block's page, none left for the destination
        let (sim, dev) = device(1);
        let mut file = dev.open().unwrap();
        let m = file.mmap(va(BASE), 2 * PAGE_SIZE).unwrap();
        let block = ControlBlock::copy_linear(va(BASE + PAGE_SIZE), va(BASE + 0x100), 32, true).unwrap();
        m.copy_to_user(va(BASE), &block.to_bytes().unwrap()).unwrap();

        let err = file.ioctl(&m, DMA_PREPARE, BASE).unwrap_err();
        assert_eq!(err.errno(), crate::errno::EFAULT);
        assert_eq!(sim.blocks_run(), 0);
    }

    #[test]
    fn prepare_then_kick_serves_the_head_from_the_cache() {
        let (sim, dev) = device(4);
        let mut file = dev.open().unwrap();
        let m = file.mmap(va(BASE), 4 * PAGE_SIZE).unwrap();
        // source data shares the page with the block
        let block = ControlBlock::copy_linear(va(BASE + PAGE_SIZE), va(BASE + 0x100), 32, true).unwrap();
        m.copy_to_user(va(BASE), &block.to_bytes().unwrap()).unwrap();

        file.prepare_then_kick(&m, va(BASE)).unwrap();
        // source and destination missed during prepare, the head hit on kick
        assert_eq!(file.cache().misses(), 2);
        assert_eq!(file.cache().hits(), 1);
        assert_eq!(sim.blocks_run(), 1);
    }

    #[test]
    fn standalone_kick_starts_from_a_cold_cache() {
        let (sim, dev) = device(4);
        let mut file = dev.open().unwrap();
        let m = file.mmap(va(BASE), 4 * PAGE_SIZE).unwrap();
        let block = ControlBlock::copy_linear(va(BASE + PAGE_SIZE), va(BASE + 2 * PAGE_SIZE), 32, true).unwrap();
        m.copy_to_user(va(BASE + 0x40), &block.to_bytes().unwrap()).unwrap();

        file.ioctl(&m, DMA_PREPARE, BASE + 0x40).unwrap();
        file.ioctl(&m, DMA_KICK, BASE + 0x40).unwrap();
        assert_eq!(file.cache().misses(), 1);
        assert_eq!(file.cache().hits(), 0);

        let head_bus = m.pin_page(va(BASE).page()).unwrap().bus_page().base() + 0x40;
        let events = sim.events();
        let start = events
            .iter()
            .position(|e| matches!(e, RegisterEvent::ControlBlockAddress(_)))
            .unwrap();
        assert_eq!(events[start - 1], RegisterEvent::Barrier);
        assert_eq!(
            events[start],
            RegisterEvent::ControlBlockAddress(head_bus.as_u32().unwrap())
        );
        assert!(matches!(events[start + 1], RegisterEvent::ControlStatus(cs) if cs.active()));
        assert_eq!(events[start + 2], RegisterEvent::Barrier);
    }

    #[test]
    fn kick_of_unmapped_head_never_starts_the_engine() {
        let (sim, dev) = device(1);
        let mut file = dev.open().unwrap();
        let m = file.mmap(va(BASE), PAGE_SIZE).unwrap();
        let outside = va(BASE + 8 * PAGE_SIZE);
        assert_eq!(file.kick(&m, outside), Err(DmaError::Unmapped(outside)));
        assert_eq!(file.kick(&m, VirtualAddress::zero()).map_err(DmaError::errno), Err(14));
        assert_eq!(sim.events().len(), 1);
    }
}
