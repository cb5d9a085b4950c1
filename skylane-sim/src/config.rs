use std::{ops::RangeInclusive, time::Duration};

use crate::SimError;

/// Shape of the generated traffic.
#[derive(Debug, Clone)]
pub struct TrafficConfig {
    /// Number of packets to generate, with sequence numbers `0..packets`.
    pub packets: u64,
    /// Probability that a packet is swapped with a later one.
    pub reorder_probability: f64,
    /// Probability that a packet never arrives.
    pub drop_probability: f64,
    /// How far ahead (in packets) a swapped packet may travel.
    pub max_displacement: usize,
    /// Number of distinct destination ids, `0..destinations`.
    pub destinations: u32,
    /// Number of distinct source satellite ids, `1..=sources`.
    pub sources: u32,
    /// Payload sizes, in bytes.
    pub payload_len: RangeInclusive<usize>,
    /// Sleep for `jitter` every `jitter_every` packets while feeding. `0` disables the jitter.
    pub jitter_every: u64,
    pub jitter: Duration,
    /// Seed for the random number generator. The same seed produces the same traffic.
    pub seed: u64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            packets: 100_000,
            reorder_probability: 0.15,
            drop_probability: 0.02,
            max_displacement: 10,
            destinations: 8,
            sources: 100,
            payload_len: 64..=1500,
            jitter_every: 1000,
            jitter: Duration::from_micros(100),
            seed: 42,
        }
    }
}

impl TrafficConfig {
    pub(crate) fn validate(&self) -> Result<(), SimError> {
        check_probability("reorder_probability", self.reorder_probability)?;
        check_probability("drop_probability", self.drop_probability)?;

        if self.payload_len.is_empty() {
            return Err(SimError::InvalidPayloadRange {
                min: *self.payload_len.start(),
                max: *self.payload_len.end(),
            });
        }

        if self.destinations == 0 {
            return Err(SimError::NoDestinations);
        }

        if self.sources == 0 {
            return Err(SimError::NoSources);
        }

        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), SimError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SimError::InvalidProbability { name, value });
    }

    Ok(())
}
