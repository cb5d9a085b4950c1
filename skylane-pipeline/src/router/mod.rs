use thiserror::Error;

mod lane;

mod priority;
pub use priority::PriorityRouter;

mod stats;
pub use stats::RouterStats;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RouterError {
    #[error("Lane {lane} out of range (router has {lanes} lanes)")]
    LaneOutOfRange { lane: usize, lanes: usize },
}
