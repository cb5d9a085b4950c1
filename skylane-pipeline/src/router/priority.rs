use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use skylane_wire::Packet;

use super::{lane::Lane, RouterError, RouterStats};
use crate::ConfigError;

/// Fans packets out into per-destination lanes, each ordered by traffic class and then by
/// sequence number.
///
/// Every lane has its own lock, so routing to different lanes never contends. No ordering is
/// guaranteed across lanes.
#[derive(Debug)]
pub struct PriorityRouter {
    lanes: Box<[Lane]>,
    /// Set by `close`. Blocked drainers return once their lane is empty.
    closed: AtomicBool,
    stats: RouterStats,
}

impl PriorityRouter {
    /// Creates a router with `lanes` output lanes.
    ///
    /// ## Errors
    /// Returns [`ConfigError::InvalidLaneCount`] if `lanes` is zero.
    pub fn new(lanes: usize) -> Result<Self, ConfigError> {
        if lanes == 0 {
            return Err(ConfigError::InvalidLaneCount);
        }

        Ok(Self {
            lanes: (0..lanes).map(|_| Lane::default()).collect(),
            closed: AtomicBool::new(false),
            stats: RouterStats::new(lanes),
        })
    }

    #[inline]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Returns the lane that packets for `destination_id` are routed to.
    #[inline]
    pub fn lane_for(&self, destination_id: u32) -> usize {
        destination_id as usize % self.lanes.len()
    }

    /// Routes a packet into the lane of its destination. Only holds that lane's lock.
    pub fn route(&self, packet: Packet) {
        let lane = self.lane_for(packet.destination_id());
        let class = packet.class();
        trace!(seq = packet.sequence(), lane, %class, "Routing packet");

        self.lanes[lane].push(packet, || self.stats.on_route(lane, class));
    }

    /// Removes the highest priority packet from `lane`, or returns `None` if the lane is empty.
    ///
    /// # Panics
    /// If `lane` is not smaller than [`PriorityRouter::lane_count`]. Use
    /// [`PriorityRouter::try_dequeue`] to get an error instead.
    pub fn dequeue(&self, lane: usize) -> Option<Packet> {
        assert!(
            lane < self.lanes.len(),
            "lane {lane} out of range (router has {} lanes)",
            self.lanes.len()
        );
        self.lanes[lane].pop(|| self.stats.on_dequeue(lane))
    }

    /// Like [`PriorityRouter::dequeue`], but returns an error for an out of range lane.
    pub fn try_dequeue(&self, lane: usize) -> Result<Option<Packet>, RouterError> {
        self.check_lane(lane)?;
        Ok(self.lanes[lane].pop(|| self.stats.on_dequeue(lane)))
    }

    /// Blocks until a packet can be taken from `lane`. Returns `None` once the router is closed
    /// and the lane is drained.
    ///
    /// ## Errors
    /// Returns [`RouterError::LaneOutOfRange`] for an out of range lane.
    pub fn recv(&self, lane: usize) -> Result<Option<Packet>, RouterError> {
        self.check_lane(lane)?;
        Ok(self.lanes[lane].pop_blocking(|| self.is_closed(), || self.stats.on_dequeue(lane)))
    }

    /// Closes the router and wakes every drainer blocked in [`PriorityRouter::recv`].
    ///
    /// Packets routed after closing are still delivered.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(routed = self.stats.routed(), "Closing router");
        }

        for lane in self.lanes.iter() {
            lane.wake_all();
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    fn check_lane(&self, lane: usize) -> Result<(), RouterError> {
        if lane >= self.lanes.len() {
            return Err(RouterError::LaneOutOfRange { lane, lanes: self.lanes.len() });
        }

        Ok(())
    }
}
