#![doc(issue_tracker_base_url = "https://github.com/stuartray/skylane/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use thiserror::Error;

pub mod queue;
pub use queue::{Consumer, Producer};

mod reorder;
pub use reorder::*;

mod router;
pub use router::*;

mod pipeline;
pub use pipeline::*;

/// Errors caused by an invalid configuration. These indicate a programming error and are
/// returned at construction time, never at runtime.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Queue capacity must be a non-zero power of two, got {0}")]
    InvalidCapacity(usize),
    #[error("Reorder timeout must be greater than zero")]
    InvalidTimeout,
    #[error("Reorder buffer must be able to hold at least one pending packet")]
    InvalidPendingLimit,
    #[error("Router needs at least one output lane")]
    InvalidLaneCount,
}
