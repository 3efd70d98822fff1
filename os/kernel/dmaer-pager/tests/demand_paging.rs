use dmaer_addresses::{PAGE_SIZE, VirtualAddress};
use dmaer_info::memory::PAGES_PER_BLOCK;
use dmaer_pager::{FramePool, Pager, PagerError, UserMemory};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

const BASE: u64 = 0x1000_0000;

fn pager(frames: usize) -> (Arc<FramePool>, Arc<Pager<Arc<FramePool>>>) {
    let pool = Arc::new(FramePool::with_capacity(frames));
    let pager = Arc::new(Pager::new(Arc::clone(&pool)));
    (pool, pager)
}

fn at_page(n: u64) -> VirtualAddress {
    VirtualAddress::new(BASE + n * PAGE_SIZE)
}

#[test]
fn mapping_allocates_nothing_up_front() {
    let (pool, pager) = pager(16);
    let m = pager.map(VirtualAddress::new(BASE), 16 * PAGE_SIZE).unwrap();
    assert_eq!(pool.in_use(), 0);
    assert_eq!(m.session().unwrap().page_count(), 0);
    assert_eq!(m.session().unwrap().block_count(), 1);
}

#[test]
fn backed_pages_equal_distinct_offsets_touched() {
    let (pool, pager) = pager(64);
    let before = pool.in_use();
    let mut m = pager.map(VirtualAddress::new(BASE), 64 * PAGE_SIZE).unwrap();

    let touched = [7_u64, 3, 3, 0, 63, 7, 12, 0, 12, 12];
    for &n in &touched {
        // touch somewhere inside the page, not just its base
        m.fault(at_page(n) + 0x123).unwrap();
    }
    let distinct: BTreeSet<_> = touched.iter().collect();
    assert_eq!(pool.in_use(), distinct.len());
    assert_eq!(pager.tracked_pages(), distinct.len());

    m.close().unwrap();
    assert_eq!(pool.in_use(), before);
    assert_eq!(pager.tracked_pages(), 0);
}

#[test]
fn ascending_faults_past_one_block() {
    let pages = PAGES_PER_BLOCK as u64 + 1;
    let (pool, pager) = pager(PAGES_PER_BLOCK + 1);
    let mut m = pager.map(VirtualAddress::new(BASE), pages * PAGE_SIZE).unwrap();

    for n in 0..pages {
        m.fault(at_page(n)).unwrap();
    }
    let session = m.session().unwrap();
    assert_eq!(session.page_count(), 501);
    assert_eq!(session.block_count(), 2);
    assert_eq!(pager.tracked_pages(), 501);

    m.close().unwrap();
    assert_eq!(pool.in_use(), 0);
    assert_eq!(pager.tracked_pages(), 0);
}

#[test]
fn duplicates_share_pages_until_last_close() {
    let (pool, pager) = pager(8);
    let mut parent = pager.map(VirtualAddress::new(BASE), 8 * PAGE_SIZE).unwrap();
    parent.fault(at_page(1)).unwrap();

    let mut child = parent.duplicate().unwrap();
    assert!(child.session().unwrap().same_session(parent.session().unwrap()));
    assert_eq!(parent.session().unwrap().references(), 2);

    // the child sees the parent's page instead of faulting a new one
    let a = parent.fault(at_page(1)).unwrap();
    let b = child.fault(at_page(1)).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    drop((a, b));
    child.fault(at_page(2)).unwrap();
    assert_eq!(pool.in_use(), 2);

    parent.close().unwrap();
    assert_eq!(pool.in_use(), 2, "child still holds the session");
    assert_eq!(child.session().unwrap().references(), 1);

    child.close().unwrap();
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn close_without_session_is_reported() {
    let (_pool, pager) = pager(1);
    let mut m = pager.map(VirtualAddress::new(BASE), PAGE_SIZE).unwrap();
    m.close().unwrap();
    assert_eq!(m.close(), Err(PagerError::NoSession));
    assert!(matches!(m.duplicate(), Err(PagerError::NoSession)));
    assert!(matches!(m.fault(at_page(0)), Err(PagerError::NoSession)));
}

#[test]
fn dropping_the_mapping_closes_it() {
    let (pool, pager) = pager(2);
    {
        let m = pager.map(VirtualAddress::new(BASE), 2 * PAGE_SIZE).unwrap();
        m.fault(at_page(0)).unwrap();
        m.fault(at_page(1)).unwrap();
        assert_eq!(pool.in_use(), 2);
    }
    assert_eq!(pool.in_use(), 0);
    assert_eq!(pager.tracked_pages(), 0);
}

#[test]
fn fault_out_of_memory_leaves_session_unchanged() {
    let (pool, pager) = pager(2);
    let m = pager.map(VirtualAddress::new(BASE), 4 * PAGE_SIZE).unwrap();
    m.fault(at_page(0)).unwrap();
    m.fault(at_page(1)).unwrap();

    assert!(matches!(m.fault(at_page(2)), Err(PagerError::OutOfMemory)));
    assert_eq!(m.session().unwrap().page_count(), 2);
    assert_eq!(pager.tracked_pages(), 2);
    assert_eq!(pool.in_use(), 2);
    assert!(m.session().unwrap().installed(2).is_none());
}

#[test]
fn invalid_mapping_requests() {
    let (_pool, pager) = pager(1);
    assert!(matches!(
        pager.map(VirtualAddress::new(BASE + 1), PAGE_SIZE),
        Err(PagerError::Misaligned(_))
    ));
    assert!(matches!(
        pager.map(VirtualAddress::new(BASE), 0),
        Err(PagerError::EmptyMapping)
    ));
}

#[test]
fn mappings_must_end_inside_the_address_space() {
    let (pool, pager) = pager(1);
    let top = VirtualAddress::new(u64::MAX - PAGE_SIZE + 1);
    assert_eq!(
        pager.map(top, PAGE_SIZE).err(),
        Some(PagerError::TooLarge { start: top, len: PAGE_SIZE })
    );
    assert!(matches!(
        pager.map(VirtualAddress::new(BASE), u64::MAX),
        Err(PagerError::TooLarge { .. })
    ));

    // the last page that still ends below the top works as usual
    let last = VirtualAddress::new(u64::MAX - 2 * PAGE_SIZE + 1);
    let m = pager.map(last, PAGE_SIZE).unwrap();
    assert!(m.contains(last));
    assert!(m.fault(last).is_ok());
    assert_eq!(pool.in_use(), 1);
    assert!(matches!(m.fault(top), Err(PagerError::Unmapped(_))));
}

#[test]
fn faults_outside_the_mapping_are_unmapped() {
    let (pool, pager) = pager(4);
    let m = pager.map(VirtualAddress::new(BASE), 2 * PAGE_SIZE).unwrap();
    assert!(matches!(m.fault(at_page(2)), Err(PagerError::Unmapped(_))));
    assert!(matches!(
        m.fault(VirtualAddress::new(BASE - 1)),
        Err(PagerError::Unmapped(_))
    ));
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn concurrent_faults_back_each_offset_once() {
    let threads = 6;
    let pages = 40_u64;
    let (pool, pager) = pager(pages as usize);
    let m = Arc::new(pager.map(VirtualAddress::new(BASE), pages * PAGE_SIZE).unwrap());
    let start = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let m = Arc::clone(&m);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                // every thread walks all pages, each from a different starting point
                for i in 0..pages {
                    let n = (i + t as u64 * 7) % pages;
                    m.fault(at_page(n)).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(m.session().unwrap().page_count(), pages as usize);
    assert_eq!(pool.in_use(), pages as usize);
    drop(m);
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn user_copies_cross_page_boundaries() {
    let (_pool, pager) = pager(4);
    let m = pager.map(VirtualAddress::new(BASE), 4 * PAGE_SIZE).unwrap();

    let at = VirtualAddress::new(BASE + PAGE_SIZE - 3);
    m.copy_to_user(at, b"straddle").unwrap();
    let mut back = [0u8; 8];
    m.copy_from_user(at, &mut back).unwrap();
    assert_eq!(&back, b"straddle");
    assert_eq!(m.session().unwrap().page_count(), 2);
}

#[test]
fn pinned_page_reports_the_installed_bus_page() {
    let (_pool, pager) = pager(4);
    let m = pager.map(VirtualAddress::new(BASE), 4 * PAGE_SIZE).unwrap();
    let va = at_page(3) + 0x40;

    let pinned = m.pin_page(va.page()).unwrap();
    let installed = m.session().unwrap().installed(3).unwrap();
    assert_eq!(pinned.bus_page(), installed.bus_page());
    assert_eq!(
        pinned.bus_address(va.offset()).as_u64(),
        installed.bus_page().base().as_u64() + 0x40
    );
}

#[test]
fn a_set_of_mappings_resolves_each_address_in_its_own_mapping() {
    let (pool, pager) = pager(4);
    let maps = vec![
        pager.map(VirtualAddress::new(BASE), PAGE_SIZE).unwrap(),
        pager.map(VirtualAddress::new(0x2000_0000), PAGE_SIZE).unwrap(),
    ];
    maps[..].copy_to_user(VirtualAddress::new(0x2000_0010), &[9; 4]).unwrap();
    assert_eq!(maps[0].session().unwrap().page_count(), 0);
    assert_eq!(maps[1].session().unwrap().page_count(), 1);
    assert!(matches!(
        maps[..].user_page(VirtualAddress::new(0x3000_0000)),
        Err(PagerError::Unmapped(_))
    ));
    drop(maps);
    assert_eq!(pool.in_use(), 0);
}
