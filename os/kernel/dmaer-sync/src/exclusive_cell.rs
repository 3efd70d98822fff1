use core::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, Ordering},
};

/// A value that at most one owner may hold at a time.
///
/// Unlike a lock there is no way to wait: [`try_acquire`](Self::try_acquire)
/// either hands out the only [`ExclusiveGuard`] or returns `None` right away,
/// and the caller decides whether to retry. Dropping the guard makes the slot
/// available again.
///
/// ```rust
/// # use dmaer_sync::ExclusiveCell;
/// let slot = ExclusiveCell::new(0_u32);
/// let first = slot.try_acquire().unwrap();
/// assert!(slot.try_acquire().is_none());
/// drop(first);
/// assert!(slot.try_acquire().is_some());
/// ```
pub struct ExclusiveCell<T> {
    /// * `false`: available
    /// * `true`: a guard is out
    issued: AtomicBool,
    value: UnsafeCell<T>,
}

// Safety: access to `value` only happens through the single outstanding guard.
unsafe impl<T: Send> Sync for ExclusiveCell<T> {}

impl<T> ExclusiveCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            issued: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Take the slot if nobody holds it.
    #[inline]
    pub fn try_acquire(&self) -> Option<ExclusiveGuard<'_, T>> {
        self.issued
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(ExclusiveGuard { cell: self })
    }

    /// Whether a guard is currently out.
    #[inline]
    pub fn is_issued(&self) -> bool {
        self.issued.load(Ordering::Acquire)
    }

    #[inline]
    pub const fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}

/// Sole owner of an [`ExclusiveCell`]'s value.
pub struct ExclusiveGuard<'a, T> {
    cell: &'a ExclusiveCell<T>,
}

impl<T> Deref for ExclusiveGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // Safety: only one guard exists.
        unsafe { &*self.cell.value.get() }
    }
}

impl<T> DerefMut for ExclusiveGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: only one guard exists.
        unsafe { &mut *self.cell.value.get() }
    }
}

impl<T> Drop for ExclusiveGuard<'_, T> {
    fn drop(&mut self) {
        self.cell.issued.store(false, Ordering::Release);
    }
}
