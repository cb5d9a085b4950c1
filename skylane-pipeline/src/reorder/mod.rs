use std::time::Duration;

use skylane_wire::Packet;

mod buffer;
pub use buffer::ReorderBuffer;

mod stats;
pub use stats::ReorderStats;

/// The default time `next` waits for a missing sequence number before declaring a gap.
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

/// The default number of out-of-order packets the buffer holds before pushing back on inserts.
const DEFAULT_MAX_PENDING: usize = 65_536;

#[derive(Debug, Clone)]
pub struct ReorderOptions {
    /// The first sequence number the buffer expects.
    pub(crate) start_sequence: u64,
    /// How long `next` waits for the expected sequence number before skipping it.
    pub(crate) timeout: Duration,
    /// The most packets held while waiting for the expected one. Once reached, `insert` hands
    /// packets back to the caller instead of buffering them.
    pub(crate) max_pending: usize,
}

impl Default for ReorderOptions {
    fn default() -> Self {
        Self { start_sequence: 0, timeout: DEFAULT_TIMEOUT, max_pending: DEFAULT_MAX_PENDING }
    }
}

impl ReorderOptions {
    /// Sets the first sequence number the buffer expects.
    pub fn start_sequence(mut self, start_sequence: u64) -> Self {
        self.start_sequence = start_sequence;
        self
    }

    /// Sets how long `next` waits for a missing sequence number before declaring a gap.
    /// Must be greater than zero.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the most packets held while waiting for the expected one. Must be greater than
    /// zero.
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }
}

/// The outcome of a call to [`ReorderBuffer::next`].
#[derive(Debug)]
pub enum Release {
    /// The next in-order packet.
    Packet(Packet),
    /// The deadline passed, so the expected sequence number was declared a gap, and the one
    /// after it is not buffered either. The caller should call again.
    NotReady,
    /// The buffer was stopped and every buffered packet has been released.
    Closed,
}

impl Release {
    /// Returns the packet, if any.
    pub fn into_packet(self) -> Option<Packet> {
        match self {
            Self::Packet(packet) => Some(packet),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// What happened to a packet handed to [`ReorderBuffer::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The packet is buffered.
    Accepted,
    /// The packet replaced a buffered packet with the same sequence number.
    Replaced,
    /// The sequence number was already released or skipped. The packet was dropped.
    Late,
}
