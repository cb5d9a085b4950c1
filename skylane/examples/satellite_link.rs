//! Feeds 100k packets of simulated satellite traffic (2% loss, 15% reordering) through a staged
//! pipeline with 8 output lanes, and logs the final counters.

use std::{sync::Arc, thread, time::Duration};

use skylane::{
    sim::{TrafficConfig, TrafficGenerator},
    Pipeline, PipelineOptions, ReorderOptions, TrafficClass,
};

const NUM_OUTPUT_LANES: usize = 8;

fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let options = PipelineOptions::default()
        .lanes(NUM_OUTPUT_LANES)
        .ingress_capacity(4096)
        .reorder(ReorderOptions::default().timeout(Duration::from_millis(10)));

    let (pipeline, mut ingress) = Pipeline::spawn(options).unwrap();

    // One drainer per output lane.
    let drainers: Vec<_> = (0..NUM_OUTPUT_LANES)
        .map(|lane| {
            let router = Arc::clone(pipeline.router());
            thread::spawn(move || {
                let mut count = 0usize;
                while let Some(_packet) = router.recv(lane).unwrap() {
                    count += 1;
                }
                (lane, count)
            })
        })
        .collect();

    let mut generator = TrafficGenerator::new(TrafficConfig::default()).unwrap();
    let summary = generator.feed(&mut ingress);
    tracing::info!(
        sent = summary.sent,
        dropped = summary.dropped,
        retries = summary.retries,
        "Traffic fed, closing ingress"
    );
    ingress.close();

    let router = Arc::clone(pipeline.router());
    let report = pipeline.join();
    tracing::info!("Final results:\n{report}");

    for class in TrafficClass::ALL {
        tracing::info!(%class, routed = router.stats().routed_by_class(class), "Class totals");
    }

    for drainer in drainers {
        let (lane, count) = drainer.join().unwrap();
        tracing::info!(lane, count, "Lane drained");
    }
}
