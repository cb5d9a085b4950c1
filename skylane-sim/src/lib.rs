#![doc(issue_tracker_base_url = "https://github.com/stuartray/skylane/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Synthetic satellite traffic for exercising the delivery pipeline.
//!
//! Packets are generated in sequence order and then disturbed the way a multi-path satellite
//! link would: some are dropped, and some are swapped with a nearby later packet so they arrive
//! out of order.

use thiserror::Error;

mod config;
pub use config::TrafficConfig;

mod generator;
pub use generator::{FeedSummary, TrafficGenerator};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("Probability {name} must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Payload length range is empty: {min}..={max}")]
    InvalidPayloadRange { min: usize, max: usize },
    #[error("At least one destination is required")]
    NoDestinations,
    #[error("At least one source is required")]
    NoSources,
}
