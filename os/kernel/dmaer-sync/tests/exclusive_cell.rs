use dmaer_sync::ExclusiveCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn second_acquire_fails_until_release() {
    let cell = ExclusiveCell::new(String::from("dev"));
    let mut first = cell.try_acquire().expect("slot is free");
    first.push('0');
    assert!(cell.is_issued());
    assert!(cell.try_acquire().is_none());

    drop(first);
    assert!(!cell.is_issued());
    let second = cell.try_acquire().expect("slot was released");
    assert_eq!(second.as_str(), "dev0");
}

#[test]
fn racing_acquirers_never_overlap() {
    let threads = 8;
    let rounds = 500;

    let cell = Arc::new(ExclusiveCell::new(()));
    let holders = Arc::new(AtomicUsize::new(0));
    let wins = Arc::new(AtomicUsize::new(0));
    let start = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cell = Arc::clone(&cell);
            let holders = Arc::clone(&holders);
            let wins = Arc::clone(&wins);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for _ in 0..rounds {
                    if let Some(guard) = cell.try_acquire() {
                        assert_eq!(holders.fetch_add(1, Ordering::SeqCst), 0);
                        wins.fetch_add(1, Ordering::SeqCst);
                        thread::yield_now();
                        holders.fetch_sub(1, Ordering::SeqCst);
                        drop(guard);
                    }
                    thread::yield_now();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert!(wins.load(Ordering::SeqCst) > 0);
    assert!(!cell.is_issued());
}
