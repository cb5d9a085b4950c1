//! A bounded, lock-free, single-producer single-consumer queue.
//!
//! [`bounded`] returns the only [`Producer`] and the only [`Consumer`] a queue will ever have.
//! Neither half can be cloned and both take `&mut self` to push or pop, so the single-writer /
//! single-reader contract is upheld by the type system instead of being checked at runtime.
//!
//! ```
//! use skylane_pipeline::queue;
//!
//! let (mut tx, mut rx) = queue::bounded::<u32>(2).unwrap();
//! assert!(tx.try_push(1).is_ok());
//! assert!(tx.try_push(2).is_ok());
//! assert_eq!(tx.try_push(3), Err(3));
//!
//! assert_eq!(rx.try_pop(), Some(1));
//! assert_eq!(rx.try_pop(), Some(2));
//! assert_eq!(rx.try_pop(), None);
//! ```

use std::{
    fmt,
    sync::{atomic::Ordering, Arc},
};

use crate::ConfigError;

mod ring;
use ring::Ring;

/// Creates a queue that holds up to `capacity` items.
///
/// ## Errors
/// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero or not a power of two.
pub fn bounded<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), ConfigError> {
    if !capacity.is_power_of_two() {
        return Err(ConfigError::InvalidCapacity(capacity));
    }

    let ring = Arc::new(Ring::with_capacity(capacity));
    let producer = Producer { ring: Arc::clone(&ring), cached_tail: 0 };
    let consumer = Consumer { ring, cached_head: 0 };

    Ok((producer, consumer))
}

/// The writing half of a queue created with [`bounded`].
///
/// Dropping the producer closes the queue, see [`Consumer::is_closed`].
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
    /// Last observed consumer cursor. Refreshed only when the queue looks full.
    cached_tail: usize,
}

impl<T> Producer<T> {
    /// Tries to push an item without blocking.
    ///
    /// If the queue is full the item is handed back in the `Err` variant, and the caller decides
    /// whether to retry or drop it.
    pub fn try_push(&mut self, item: T) -> Result<(), T> {
        let head = self.ring.head.load(Ordering::Relaxed);

        if head.wrapping_sub(self.cached_tail) == self.ring.capacity() {
            self.cached_tail = self.ring.tail.load(Ordering::Acquire);
            if head.wrapping_sub(self.cached_tail) == self.ring.capacity() {
                return Err(item);
            }
        }

        // SAFETY: the slot at `head` is free (occupancy < capacity) and only the producer
        // writes to free slots.
        unsafe { self.ring.write(head, item) };
        // Publish the write. Pairs with the acquire load in `Consumer::try_pop`.
        self.ring.head.store(head.wrapping_add(1), Ordering::Release);

        Ok(())
    }

    /// Returns the number of items in the queue.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the next push would fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.ring.close();
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// The reading half of a queue created with [`bounded`].
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
    /// Last observed producer cursor. Refreshed only when the queue looks empty.
    cached_head: usize,
}

impl<T> Consumer<T> {
    /// Tries to pop the oldest item without blocking. Returns `None` if the queue is empty.
    pub fn try_pop(&mut self) -> Option<T> {
        let tail = self.ring.tail.load(Ordering::Relaxed);

        if tail == self.cached_head {
            self.cached_head = self.ring.head.load(Ordering::Acquire);
            if tail == self.cached_head {
                return None;
            }
        }

        // SAFETY: `tail < head`, so the slot was initialized by the producer and published by
        // the release store we just synchronized with.
        let item = unsafe { self.ring.read(tail) };
        // Hand the slot back. Pairs with the acquire load in `Producer::try_push`.
        self.ring.tail.store(tail.wrapping_add(1), Ordering::Release);

        Some(item)
    }

    /// Returns `true` once the producer has been dropped. Items pushed before that can still be
    /// popped.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.ring.is_closed()
    }

    /// Returns the number of items in the queue.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::AtomicUsize, thread};

    use super::*;

    #[test]
    fn rejects_invalid_capacity() {
        assert_eq!(bounded::<u8>(0).unwrap_err(), ConfigError::InvalidCapacity(0));
        assert_eq!(bounded::<u8>(3).unwrap_err(), ConfigError::InvalidCapacity(3));
        assert_eq!(bounded::<u8>(1000).unwrap_err(), ConfigError::InvalidCapacity(1000));
        assert!(bounded::<u8>(1).is_ok());
        assert!(bounded::<u8>(1024).is_ok());
    }

    #[test]
    fn fifo_order() {
        let (mut tx, mut rx) = bounded(8).unwrap();

        for i in 0..5 {
            tx.try_push(i).unwrap();
        }
        assert_eq!(rx.len(), 5);

        let popped: Vec<_> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
        assert!(rx.is_empty());
    }

    #[test]
    fn holds_exactly_capacity_items() {
        let (mut tx, mut rx) = bounded(4).unwrap();

        for i in 0..4 {
            assert!(tx.try_push(i).is_ok());
        }
        assert!(tx.is_full());
        assert_eq!(tx.try_push(99), Err(99));

        // Freeing one slot makes room for exactly one more item.
        assert_eq!(rx.try_pop(), Some(0));
        assert!(tx.try_push(4).is_ok());
        assert_eq!(tx.try_push(5), Err(5));

        let popped: Vec<_> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(popped, vec![1, 2, 3, 4]);
    }

    #[test]
    fn cursors_wrap_around() {
        let (mut tx, mut rx) = bounded(2).unwrap();

        for i in 0..1_000 {
            tx.try_push(i).unwrap();
            assert_eq!(rx.try_pop(), Some(i));
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn producer_drop_closes_queue() {
        let (mut tx, mut rx) = bounded(4).unwrap();
        tx.try_push("last").unwrap();
        assert!(!rx.is_closed());

        drop(tx);

        assert!(rx.is_closed());
        assert_eq!(rx.try_pop(), Some("last"));
        assert_eq!(rx.try_pop(), None);
    }

    #[derive(Debug)]
    struct Tracked<'a>(&'a AtomicUsize);

    impl Drop for Tracked<'_> {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn drops_remaining_items() {
        let drops = AtomicUsize::new(0);
        let (mut tx, mut rx) = bounded(8).unwrap();

        for _ in 0..5 {
            tx.try_push(Tracked(&drops)).unwrap();
        }
        drop(rx.try_pop());
        assert_eq!(drops.load(Ordering::Relaxed), 1);

        drop(tx);
        drop(rx);
        assert_eq!(drops.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn spsc_threads_preserve_order() {
        const N: u64 = 100_000;
        let (mut tx, mut rx) = bounded(64).unwrap();

        let producer = thread::spawn(move || {
            for i in 0..N {
                let mut item = i;
                while let Err(back) = tx.try_push(item) {
                    item = back;
                    thread::yield_now();
                }
            }
        });

        let mut expected = 0;
        while expected < N {
            match rx.try_pop() {
                Some(i) => {
                    assert_eq!(i, expected);
                    expected += 1;
                }
                None => thread::yield_now(),
            }
        }

        producer.join().unwrap();
        assert!(rx.is_closed());
        assert_eq!(rx.try_pop(), None);
    }
}
