use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of a [`ReorderBuffer`](super::ReorderBuffer). They only ever grow and can be read
/// without taking the buffer lock.
#[derive(Debug, Default)]
pub struct ReorderStats {
    /// Total packets taken by `insert`, including late and duplicate ones
    received: AtomicU64,
    /// Total packets handed out by `next`
    released: AtomicU64,
    /// Total sequence numbers skipped after a timeout
    gaps: AtomicU64,
    /// Total packets dropped because their sequence number was already released or skipped
    late: AtomicU64,
    /// Total packets handed back to the caller because the buffer was full
    rejected: AtomicU64,
    /// Total packets that replaced a pending packet with the same sequence number
    duplicates: AtomicU64,
}

impl ReorderStats {
    #[inline]
    pub(crate) fn increment_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_gaps(&self) {
        self.gaps.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_late(&self) {
        self.late.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_duplicates(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn gaps(&self) -> u64 {
        self.gaps.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn late(&self) -> u64 {
        self.late.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn duplicates(&self) -> u64 {
        self.duplicates.load(Ordering::Relaxed)
    }
}
