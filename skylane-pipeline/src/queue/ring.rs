use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use skylane_common::CachePadded;

/// Fixed-capacity storage shared by a [`Producer`](super::Producer) and a
/// [`Consumer`](super::Consumer).
///
/// `head` and `tail` grow monotonically and wrap on overflow. A cursor is mapped to a slot by
/// masking with `capacity - 1`, so the occupancy is always `head - tail` and all `capacity` slots
/// are usable.
pub(super) struct Ring<T> {
    /// Next slot to write. Only the producer stores to it.
    pub(super) head: CachePadded<AtomicUsize>,
    /// Next slot to read. Only the consumer stores to it.
    pub(super) tail: CachePadded<AtomicUsize>,
    /// Set when the producer is dropped.
    closed: AtomicBool,
    mask: usize,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: a slot is accessed by at most one side at a time, handed over through the
// release/acquire pairs on `head` and `tail`.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Allocates all slots up front. `capacity` must be a power of two.
    pub(super) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());

        let slots = (0..capacity).map(|_| UnsafeCell::new(MaybeUninit::uninit())).collect();

        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
            mask: capacity - 1,
            slots,
        }
    }

    #[inline]
    pub(super) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Writes `item` into the slot for `cursor`.
    ///
    /// # Safety
    /// The slot must be free and the caller must be the only producer.
    #[inline]
    pub(super) unsafe fn write(&self, cursor: usize, item: T) {
        (*self.slots[cursor & self.mask].get()).write(item);
    }

    /// Moves the item out of the slot for `cursor`.
    ///
    /// # Safety
    /// The slot must hold an initialized item and the caller must be the only consumer.
    #[inline]
    pub(super) unsafe fn read(&self, cursor: usize) -> T {
        (*self.slots[cursor & self.mask].get()).assume_init_read()
    }

    /// Snapshot of the occupancy. Exact when called from either end while the other is idle.
    pub(super) fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail).min(self.capacity())
    }

    pub(super) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(super) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let mut tail = *self.tail.get_mut();

        while tail != head {
            // SAFETY: every slot in `tail..head` holds an item that was never popped.
            unsafe { self.slots[tail & self.mask].get_mut().assume_init_drop() };
            tail = tail.wrapping_add(1);
        }
    }
}
