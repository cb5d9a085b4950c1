use std::{fmt, io, time::Duration};

use thiserror::Error;

use crate::{ConfigError, ReorderOptions};

mod driver;
pub use driver::Pipeline;

mod ingress;
pub use ingress::Ingress;

/// The default number of output lanes.
const DEFAULT_LANES: usize = 8;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to spawn worker thread: {0:?}")]
    Spawn(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Options for the reorder stage.
    pub(crate) reorder: ReorderOptions,
    /// The number of output lanes of the router.
    pub(crate) lanes: usize,
    /// Capacity of the lock-free ingress ring. If this is `None`, packets are inserted directly
    /// into the reorder buffer by the sending thread.
    pub(crate) ingress_capacity: Option<usize>,
    /// The longest the stager sleeps when the ingress ring is empty.
    pub(crate) idle_backoff: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            reorder: ReorderOptions::default(),
            lanes: DEFAULT_LANES,
            ingress_capacity: None,
            idle_backoff: Duration::from_millis(1),
        }
    }
}

impl PipelineOptions {
    /// Sets the options of the reorder stage.
    pub fn reorder(mut self, reorder: ReorderOptions) -> Self {
        self.reorder = reorder;
        self
    }

    /// Sets the number of output lanes.
    pub fn lanes(mut self, lanes: usize) -> Self {
        self.lanes = lanes;
        self
    }

    /// Stages incoming packets through a lock-free ring of the given capacity, drained into the
    /// reorder buffer by a dedicated thread. The capacity must be a power of two.
    pub fn ingress_capacity(mut self, capacity: usize) -> Self {
        self.ingress_capacity = Some(capacity);
        self
    }

    /// Sets the longest the stager sleeps when the ingress ring is empty.
    pub fn idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }
}

/// A snapshot of every pipeline counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub received: u64,
    pub released: u64,
    pub gaps: u64,
    pub late: u64,
    /// Inserts the reorder buffer pushed back on because it was full.
    pub rejected: u64,
    pub duplicates: u64,
    /// Packets still held by the reorder buffer.
    pub pending: usize,
    pub routed: u64,
    pub dequeued: u64,
    pub lane_depths: Vec<usize>,
    pub elapsed: Duration,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reorder buffer:")?;
        writeln!(f, "  received:   {}", self.received)?;
        writeln!(f, "  released:   {}", self.released)?;
        writeln!(f, "  gaps:       {}", self.gaps)?;
        writeln!(f, "  late:       {}", self.late)?;
        writeln!(f, "  rejected:   {}", self.rejected)?;
        writeln!(f, "  duplicates: {}", self.duplicates)?;
        writeln!(f, "  pending:    {}", self.pending)?;
        writeln!(f, "Router:")?;
        writeln!(f, "  routed:     {}", self.routed)?;
        writeln!(f, "  dequeued:   {}", self.dequeued)?;
        write!(f, "  lanes:     ")?;
        for (lane, depth) in self.lane_depths.iter().enumerate() {
            write!(f, " [{lane}]={depth}")?;
        }
        writeln!(f)?;
        write!(f, "Elapsed: {:?}", self.elapsed)
    }
}
