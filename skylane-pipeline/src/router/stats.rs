use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use skylane_wire::TrafficClass;

/// Counters of a [`PriorityRouter`](super::PriorityRouter).
#[derive(Debug)]
pub struct RouterStats {
    /// Total packets routed
    routed: AtomicU64,
    /// Total packets taken out of a lane
    dequeued: AtomicU64,
    /// Total packets routed per class, indexed by precedence
    routed_by_class: [AtomicU64; TrafficClass::COUNT],
    /// Current number of packets in each lane
    lane_depths: Box<[AtomicUsize]>,
}

impl RouterStats {
    pub(crate) fn new(lanes: usize) -> Self {
        Self {
            routed: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            routed_by_class: Default::default(),
            lane_depths: (0..lanes).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    #[inline]
    pub(crate) fn on_route(&self, lane: usize, class: TrafficClass) {
        self.lane_depths[lane].fetch_add(1, Ordering::Relaxed);
        self.routed_by_class[class.precedence() as usize].fetch_add(1, Ordering::Relaxed);
        self.routed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn on_dequeue(&self, lane: usize) {
        self.lane_depths[lane].fetch_sub(1, Ordering::Relaxed);
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn routed(&self) -> u64 {
        self.routed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn routed_by_class(&self, class: TrafficClass) -> u64 {
        self.routed_by_class[class.precedence() as usize].load(Ordering::Relaxed)
    }

    /// Returns the number of packets currently in `lane`, or `None` if there is no such lane.
    #[inline]
    pub fn lane_depth(&self, lane: usize) -> Option<usize> {
        self.lane_depths.get(lane).map(|depth| depth.load(Ordering::Relaxed))
    }

    /// Returns the number of packets currently in each lane.
    pub fn lane_depths(&self) -> Vec<usize> {
        self.lane_depths.iter().map(|depth| depth.load(Ordering::Relaxed)).collect()
    }
}
