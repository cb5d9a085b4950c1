use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use skylane_wire::Packet;

use super::{Admission, ReorderOptions, ReorderStats, Release};
use crate::ConfigError;

/// State guarded by the buffer lock.
#[derive(Debug)]
struct State {
    /// The next sequence number to release. Only ever increases.
    next_expected: u64,
    /// Out-of-order packets. Every key is at least `next_expected`. Holds at most `max_pending`
    /// packets, plus the expected one.
    pending: FxHashMap<u64, Packet>,
    /// Set by `stop`.
    stopped: bool,
}

impl State {
    /// Removes and returns the packet for `next_expected`, advancing past it.
    fn take_expected(&mut self) -> Option<Packet> {
        let packet = self.pending.remove(&self.next_expected)?;
        self.next_expected += 1;
        Some(packet)
    }

    fn has_expected(&self) -> bool {
        self.pending.contains_key(&self.next_expected)
    }
}

/// Restores in-order delivery of an out-of-order, lossy packet stream.
///
/// A producer hands packets to [`ReorderBuffer::insert`] in arrival order, and a single consumer
/// calls [`ReorderBuffer::next`] to receive them in strictly increasing sequence order. When the
/// expected sequence number does not show up within the timeout, it is declared lost (a gap)
/// and delivery moves on.
///
/// All state lives behind one lock. `insert` never waits; `next` is the only call that blocks,
/// and never for longer than its deadline.
///
/// The number of buffered packets is bounded by `max_pending`. A full buffer pushes back: the
/// packet is handed back to the caller, who retries once `next` has made room. Every packet the
/// buffer takes is eventually released, so pushing back never loses traffic.
#[derive(Debug)]
pub struct ReorderBuffer {
    state: Mutex<State>,
    /// Signalled on every insert and on stop.
    available: Condvar,
    timeout: Duration,
    max_pending: usize,
    stats: ReorderStats,
}

impl ReorderBuffer {
    /// Creates a new reorder buffer.
    ///
    /// ## Errors
    /// - [`ConfigError::InvalidTimeout`] if the timeout is zero.
    /// - [`ConfigError::InvalidPendingLimit`] if `max_pending` is zero.
    pub fn new(options: ReorderOptions) -> Result<Self, ConfigError> {
        if options.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        if options.max_pending == 0 {
            return Err(ConfigError::InvalidPendingLimit);
        }

        Ok(Self {
            state: Mutex::new(State {
                next_expected: options.start_sequence,
                pending: FxHashMap::default(),
                stopped: false,
            }),
            available: Condvar::new(),
            timeout: options.timeout,
            max_pending: options.max_pending,
            stats: ReorderStats::default(),
        })
    }

    /// Buffers a packet under its sequence number and wakes the consumer.
    ///
    /// A packet whose sequence number was already released or skipped is dropped. The returned
    /// [`Admission`] says what happened; the same outcome is reflected in [`ReorderStats`].
    ///
    /// ## Errors
    /// Hands the packet back if the buffer already holds `max_pending` packets. The expected
    /// sequence number and duplicates of buffered ones are always taken, since they never grow
    /// the backlog.
    pub fn insert(&self, packet: Packet) -> Result<Admission, Packet> {
        let seq = packet.sequence();
        let mut state = self.state.lock();

        if seq < state.next_expected {
            self.stats.increment_received();
            self.stats.increment_late();
            warn!(seq, next_expected = state.next_expected, "Dropping late packet");
            return Ok(Admission::Late);
        }

        if state.pending.len() >= self.max_pending &&
            seq != state.next_expected &&
            !state.pending.contains_key(&seq)
        {
            self.stats.increment_rejected();
            trace!(seq, next_expected = state.next_expected, "Reorder buffer full");
            return Err(packet);
        }

        self.stats.increment_received();
        let admission = if state.pending.insert(seq, packet).is_some() {
            self.stats.increment_duplicates();
            debug!(seq, "Replaced pending packet with duplicate");
            Admission::Replaced
        } else {
            trace!(seq, pending = state.pending.len(), "Buffered packet");
            Admission::Accepted
        };

        self.available.notify_one();

        Ok(admission)
    }

    /// Waits up to the configured timeout for the next in-order packet.
    ///
    /// See [`ReorderBuffer::next_until`].
    pub fn next(&self) -> Release {
        self.next_until(Instant::now() + self.timeout)
    }

    /// Waits until `deadline` for the next in-order packet.
    ///
    /// - If the expected packet is (or becomes) available, it is released.
    /// - If the deadline passes first, the expected sequence number is declared a gap and
    ///   skipped. If the packet after it is already buffered it is released by this same call,
    ///   otherwise [`Release::NotReady`] is returned without waiting again. At most one gap is
    ///   declared per call.
    /// - Once the buffer is stopped, waiting ends immediately. Buffered packets keep draining
    ///   (skipping missing sequence numbers one call at a time), and [`Release::Closed`] is
    ///   returned when nothing is left.
    pub fn next_until(&self, deadline: Instant) -> Release {
        let mut state = self.state.lock();

        // Wake-ups may be spurious or caused by an unrelated insert, so always re-check.
        while !state.stopped && !state.has_expected() {
            if self.available.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }

        if state.stopped && state.pending.is_empty() {
            return Release::Closed;
        }

        if let Some(packet) = state.take_expected() {
            self.stats.increment_released();
            trace!(seq = packet.sequence(), "Released packet");
            return Release::Packet(packet);
        }

        self.stats.increment_gaps();
        debug!(seq = state.next_expected, pending = state.pending.len(), "Declaring gap");
        state.next_expected += 1;

        match state.take_expected() {
            Some(packet) => {
                self.stats.increment_released();
                trace!(seq = packet.sequence(), "Released packet after gap");
                Release::Packet(packet)
            }
            None => Release::NotReady,
        }
    }

    /// Stops the buffer. Blocked and future calls to `next` no longer wait, and return
    /// [`Release::Closed`] once every buffered packet is released. Calling it again is a no-op.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if !state.stopped {
            state.stopped = true;
            debug!(pending = state.pending.len(), "Stopping reorder buffer");
        }
        self.available.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Returns the sequence number the buffer will release next.
    pub fn next_expected(&self) -> u64 {
        self.state.lock().next_expected
    }

    /// Returns the number of buffered, not yet released packets.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Returns the timeout used by [`ReorderBuffer::next`].
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[inline]
    pub fn stats(&self) -> &ReorderStats {
        &self.stats
    }
}
