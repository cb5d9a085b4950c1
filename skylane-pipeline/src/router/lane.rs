use std::{cmp::Ordering, collections::BinaryHeap};

use parking_lot::{Condvar, Mutex};

use skylane_wire::{Packet, TrafficClass};

/// A packet waiting in a lane, ordered by dequeue priority.
///
/// [`BinaryHeap`] pops the greatest element, so a packet compares greater when it must leave
/// first: lower class precedence, then lower sequence number.
#[derive(Debug)]
struct Queued(Packet);

impl Queued {
    #[inline]
    fn key(&self) -> (TrafficClass, u64) {
        (self.0.class(), self.0.sequence())
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Queued {}

/// One destination-keyed output queue.
#[derive(Debug, Default)]
pub(super) struct Lane {
    queue: Mutex<BinaryHeap<Queued>>,
    /// Signalled when a packet is pushed or the router closes.
    ready: Condvar,
}

impl Lane {
    /// Pushes a packet and wakes one waiting drainer. `on_push` runs inside the critical
    /// section.
    pub(super) fn push(&self, packet: Packet, on_push: impl FnOnce()) {
        let mut queue = self.queue.lock();
        queue.push(Queued(packet));
        on_push();
        self.ready.notify_one();
    }

    /// Pops the highest priority packet. `on_pop` runs inside the critical section.
    pub(super) fn pop(&self, on_pop: impl FnOnce()) -> Option<Packet> {
        let mut queue = self.queue.lock();
        let packet = queue.pop()?.0;
        on_pop();
        Some(packet)
    }

    /// Blocks until a packet can be popped, or until `is_closed` returns `true` while the lane is
    /// empty.
    pub(super) fn pop_blocking(
        &self,
        is_closed: impl Fn() -> bool,
        on_pop: impl FnOnce(),
    ) -> Option<Packet> {
        let mut queue = self.queue.lock();
        loop {
            if let Some(Queued(packet)) = queue.pop() {
                on_pop();
                return Some(packet);
            }

            if is_closed() {
                return None;
            }

            self.ready.wait(&mut queue);
        }
    }

    /// Wakes every waiting drainer. Takes the lock so that a drainer cannot miss the wake-up
    /// between checking the closed flag and going to sleep.
    pub(super) fn wake_all(&self) {
        let _queue = self.queue.lock();
        self.ready.notify_all();
    }
}
