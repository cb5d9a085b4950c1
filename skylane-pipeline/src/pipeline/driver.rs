use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, info_span};

use skylane_common::Backoff;
use skylane_wire::Packet;

use super::{Ingress, PipelineError, PipelineOptions, PipelineReport};
use crate::{
    queue::{self, Consumer},
    PriorityRouter, ReorderBuffer, Release,
};

/// The first sleep of the stager once it stops spinning on an empty ring.
const STAGER_MIN_SLEEP: Duration = Duration::from_micros(10);

/// A running packet delivery pipeline.
///
/// ```text
/// Ingress ──▶ [ingress ring ──▶ stager] ──▶ ReorderBuffer ──▶ consumer ──▶ PriorityRouter ──▶ lanes
/// ```
///
/// The consumer thread releases packets from the reorder buffer in sequence order and routes
/// them. Downstream drainers read the lanes through [`Pipeline::router`]. Shutdown is driven by
/// the [`Ingress`]: once it is closed, every buffered packet is released and routed, then the
/// router is closed and the workers exit.
#[derive(Debug)]
pub struct Pipeline {
    reorder: Arc<ReorderBuffer>,
    router: Arc<PriorityRouter>,
    /// Moves packets from the ingress ring into the reorder buffer. Returns the number moved.
    stager: Option<JoinHandle<u64>>,
    /// Releases packets from the reorder buffer and routes them. Returns the number routed.
    consumer: JoinHandle<u64>,
    started: Instant,
}

impl Pipeline {
    /// Builds the pipeline stages and spawns the worker threads.
    ///
    /// ## Errors
    /// - [`PipelineError::Config`] for invalid options.
    /// - [`PipelineError::Spawn`] if a worker thread cannot be spawned.
    pub fn spawn(options: PipelineOptions) -> Result<(Self, Ingress), PipelineError> {
        let reorder = Arc::new(ReorderBuffer::new(options.reorder)?);
        let router = Arc::new(PriorityRouter::new(options.lanes)?);

        let (ingress, stager) = match options.ingress_capacity {
            Some(capacity) => {
                let (producer, consumer) = queue::bounded(capacity)?;
                let backoff = Backoff::new(STAGER_MIN_SLEEP, options.idle_backoff);
                let reorder = Arc::clone(&reorder);

                let stager = thread::Builder::new()
                    .name("skylane-stager".to_string())
                    .spawn(move || {
                        let _span = info_span!(parent: None, "stager", capacity).entered();
                        run_stager(consumer, &reorder, backoff)
                    })?;

                (Ingress::staged(producer), Some(stager))
            }
            None => (Ingress::direct(Arc::clone(&reorder)), None),
        };

        let consumer = {
            let reorder = Arc::clone(&reorder);
            let router = Arc::clone(&router);

            thread::Builder::new().name("skylane-consumer".to_string()).spawn(move || {
                let _span = info_span!(parent: None, "reorder_consumer").entered();
                run_consumer(&reorder, &router)
            })?
        };

        let pipeline = Self { reorder, router, stager, consumer, started: Instant::now() };

        Ok((pipeline, ingress))
    }

    /// Returns the router, for downstream drainers.
    pub fn router(&self) -> &Arc<PriorityRouter> {
        &self.router
    }

    /// Returns the reorder buffer.
    pub fn reorder(&self) -> &Arc<ReorderBuffer> {
        &self.reorder
    }

    /// Returns a snapshot of every counter.
    pub fn report(&self) -> PipelineReport {
        snapshot(&self.reorder, &self.router, self.started)
    }

    /// Waits for the workers to finish and returns the final report.
    ///
    /// The workers finish only after the [`Ingress`] is closed or dropped.
    ///
    /// # Panics
    /// Re-raises the panic of a worker thread that panicked.
    pub fn join(self) -> PipelineReport {
        let Self { reorder, router, stager, consumer, started } = self;

        if let Some(stager) = stager {
            let staged = join_worker(stager);
            debug!(staged, "Stager finished");
        }

        let routed = join_worker(consumer);
        debug!(routed, "Consumer finished");

        snapshot(&reorder, &router, started)
    }
}

fn snapshot(reorder: &ReorderBuffer, router: &PriorityRouter, started: Instant) -> PipelineReport {
    let reorder_stats = reorder.stats();
    let router_stats = router.stats();

    PipelineReport {
        received: reorder_stats.received(),
        released: reorder_stats.released(),
        gaps: reorder_stats.gaps(),
        late: reorder_stats.late(),
        rejected: reorder_stats.rejected(),
        duplicates: reorder_stats.duplicates(),
        pending: reorder.pending_len(),
        routed: router_stats.routed(),
        dequeued: router_stats.dequeued(),
        lane_depths: router_stats.lane_depths(),
        elapsed: started.elapsed(),
    }
}

fn join_worker(handle: JoinHandle<u64>) -> u64 {
    match handle.join() {
        Ok(count) => count,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Moves packets from the ingress ring into the reorder buffer until the ring is closed and
/// empty, then stops the reorder buffer.
///
/// While the reorder buffer is full, the rejected packet is held and retried, and the ring
/// fills up behind it, which pushes back on the ingress.
fn run_stager(mut ring: Consumer<Packet>, reorder: &ReorderBuffer, mut backoff: Backoff) -> u64 {
    debug!("Stager started");
    let mut staged = 0;
    let mut held: Option<Packet> = None;

    loop {
        let packet = match held.take().or_else(|| ring.try_pop()) {
            Some(packet) => packet,
            // The producer publishes its last push before closing, so a closed ring that is
            // empty on the next pop stays empty.
            None if ring.is_closed() => match ring.try_pop() {
                Some(packet) => packet,
                None => break,
            },
            None => {
                backoff.snooze();
                continue;
            }
        };

        match reorder.insert(packet) {
            Ok(_) => {
                staged += 1;
                backoff.reset();
            }
            Err(packet) => {
                held = Some(packet);
                backoff.snooze();
            }
        }
    }

    reorder.stop();
    staged
}

/// Releases packets in sequence order and routes them until the reorder buffer is closed, then
/// closes the router.
fn run_consumer(reorder: &ReorderBuffer, router: &PriorityRouter) -> u64 {
    debug!(timeout = ?reorder.timeout(), lanes = router.lane_count(), "Consumer started");
    let mut routed = 0;

    loop {
        match reorder.next() {
            Release::Packet(packet) => {
                router.route(packet);
                routed += 1;
            }
            Release::NotReady => continue,
            Release::Closed => break,
        }
    }

    router.close();
    routed
}
