use std::{
    fmt,
    time::{Duration, Instant},
};

use bytes::Bytes;

use crate::TrafficClass;

/// A packet flowing through the delivery pipeline.
///
/// A packet is immutable once created and deliberately not `Clone`: it is moved from stage to
/// stage so that exactly one component owns it at any time. The payload is an opaque, reference
/// counted [`Bytes`] buffer whose framing is the producer's concern.
pub struct Packet {
    /// Intended delivery order.
    sequence: u64,
    /// Priority category.
    class: TrafficClass,
    /// The satellite (or other source) the packet was received from.
    source_id: u32,
    /// The destination, used to select an output lane.
    destination_id: u32,
    /// When the packet entered the pipeline.
    arrival_time: Instant,
    /// The opaque payload.
    payload: Bytes,
}

impl Packet {
    /// Creates a new packet stamped with the current time as its arrival time.
    pub fn new(
        sequence: u64,
        class: TrafficClass,
        source_id: u32,
        destination_id: u32,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            sequence,
            class,
            source_id,
            destination_id,
            arrival_time: Instant::now(),
            payload: payload.into(),
        }
    }

    /// Replaces the arrival time of the packet.
    pub fn with_arrival_time(mut self, arrival_time: Instant) -> Self {
        self.arrival_time = arrival_time;
        self
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn class(&self) -> TrafficClass {
        self.class
    }

    #[inline]
    pub fn source_id(&self) -> u32 {
        self.source_id
    }

    #[inline]
    pub fn destination_id(&self) -> u32 {
        self.destination_id
    }

    #[inline]
    pub fn arrival_time(&self) -> Instant {
        self.arrival_time
    }

    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consumes the packet, returning its payload.
    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Returns how long ago the packet arrived.
    #[inline]
    pub fn age(&self) -> Duration {
        self.arrival_time.elapsed()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("sequence", &self.sequence)
            .field("class", &self.class)
            .field("source_id", &self.source_id)
            .field("destination_id", &self.destination_id)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}
