use std::thread;

use bytes::Bytes;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use skylane_common::Backoff;
use skylane_pipeline::Ingress;
use skylane_wire::{Packet, TrafficClass};

use crate::{SimError, TrafficConfig};

/// Byte every generated payload is filled with.
const PAYLOAD_FILL: u8 = 0xAB;

/// Outcome of [`TrafficGenerator::feed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Packets generated, including the dropped ones.
    pub generated: u64,
    /// Packets handed to the ingress.
    pub sent: u64,
    /// Packets the simulated link lost.
    pub dropped: u64,
    /// Send attempts the ingress handed back because the pipeline was full.
    pub retries: u64,
}

/// Generates deterministic, lossy, out-of-order traffic.
#[derive(Debug)]
pub struct TrafficGenerator {
    config: TrafficConfig,
    rng: StdRng,
}

impl TrafficGenerator {
    /// Creates a generator seeded with [`TrafficConfig::seed`].
    ///
    /// ## Errors
    /// Returns a [`SimError`] if the configuration is invalid.
    pub fn new(config: TrafficConfig) -> Result<Self, SimError> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);

        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    /// Generates the configured traffic, returned in arrival order.
    ///
    /// Walking the packets in sequence order, each one is either dropped, or (possibly after
    /// being swapped with a packet at most `max_displacement` positions later) emitted.
    pub fn generate(&mut self) -> Vec<Packet> {
        let mut batch: Vec<Option<Packet>> =
            (0..self.config.packets).map(|seq| Some(self.packet(seq))).collect();
        let len = batch.len();
        let mut arrivals = Vec::with_capacity(len);

        for i in 0..len {
            if self.rng.gen_bool(self.config.drop_probability) {
                batch[i] = None;
                continue;
            }

            if self.config.max_displacement > 0 &&
                i + 1 < len &&
                self.rng.gen_bool(self.config.reorder_probability)
            {
                let offset =
                    self.rng.gen_range(1..=self.config.max_displacement).min(len - i - 1);
                batch.swap(i, i + offset);
            }

            if let Some(packet) = batch[i].take() {
                arrivals.push(packet);
            }
        }

        arrivals
    }

    /// Generates the configured traffic and sends it into `ingress`, retrying with a backoff
    /// whenever the ingress hands a packet back. Does not close the ingress.
    pub fn feed(&mut self, ingress: &mut Ingress) -> FeedSummary {
        let arrivals = self.generate();
        let mut summary = FeedSummary {
            generated: self.config.packets,
            dropped: self.config.packets - arrivals.len() as u64,
            ..Default::default()
        };
        let mut backoff = Backoff::default();

        for packet in arrivals {
            let mut packet = packet;
            while let Err(rejected) = ingress.send(packet) {
                packet = rejected;
                summary.retries += 1;
                backoff.snooze();
            }
            backoff.reset();
            summary.sent += 1;

            if self.config.jitter_every > 0 && summary.sent % self.config.jitter_every == 0 {
                thread::sleep(self.config.jitter);
            }
        }

        debug!(
            sent = summary.sent,
            dropped = summary.dropped,
            retries = summary.retries,
            "Finished feeding traffic"
        );

        summary
    }

    fn packet(&mut self, seq: u64) -> Packet {
        let class = TrafficClass::ALL[self.rng.gen_range(0..TrafficClass::COUNT)];
        let source_id = self.rng.gen_range(1..=self.config.sources);
        let destination_id = self.rng.gen_range(0..self.config.destinations);
        let len = self.rng.gen_range(self.config.payload_len.clone());

        Packet::new(seq, class, source_id, destination_id, Bytes::from(vec![PAYLOAD_FILL; len]))
    }
}
