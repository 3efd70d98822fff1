use dmaer::kmsg::KmsgLogger;
use dmaer::sim::SimulatedChannel;
use dmaer::{ControlBlock, Device};
use dmaer_addresses::{PAGE_SIZE, VirtualAddress};
use dmaer_pager::{FramePool, Pager, UserMemory};
use log::LevelFilter;
use std::sync::Arc;

static LOGGER: KmsgLogger<String> = KmsgLogger::new(String::new(), LevelFilter::Debug);

// One test per binary: the logger is process-global.
#[test]
fn driver_diagnostics_reach_the_log() {
    LOGGER.install().unwrap();

    let pool = Arc::new(FramePool::with_capacity(8));
    let pager = Arc::new(Pager::new(Arc::clone(&pool)));
    let dev = Device::new(pager, SimulatedChannel::new(pool));

    let base = 0x4000_0000;
    let mut file = dev.open().unwrap();
    assert!(dev.open().is_err());
    let m = file.mmap(VirtualAddress::new(base), 4 * PAGE_SIZE).unwrap();

    // crosses from page 1 into page 2
    let block = ControlBlock::copy_linear(
        VirtualAddress::new(base + 2 * PAGE_SIZE - 8),
        VirtualAddress::new(base + 0x100),
        16,
        true,
    )
    .unwrap();
    m.copy_to_user(VirtualAddress::new(base), &block.to_bytes().unwrap()).unwrap();
    file.prepare(&m, VirtualAddress::new(base)).unwrap();
    assert!(file.prepare(&m, VirtualAddress::new(base + 0x40)).is_err());
    drop(file);

    let out = LOGGER.with_sink(core::mem::take);
    let has = |needle: &str| out.lines().any(|l| l.contains(needle));

    assert!(has("<6>[INFO] dmaer::device: dmaer: ready"), "{out}");
    assert!(has("<7>[DEBUG] dmaer::engine: channel reset"), "{out}");
    assert!(has("open refused, already open"), "{out}");
    assert!(has("<4>[WARN] dmaer::descriptor: destination 0x40001ff8 +0x10 straddles a page boundary"), "{out}");
    assert!(has("prepare 0x40000000: 1 blocks, 0 hits, 2 misses"), "{out}");
    assert!(has("<3>[ERROR] dmaer::translate: control block at 0x40000040"), "{out}");
    assert!(has("<4>[WARN] dmaer::device: dmaer: closed with 2 pages still tracked"), "{out}");
    assert!(out.lines().all(|l| l.starts_with('<')), "{out}");
}
