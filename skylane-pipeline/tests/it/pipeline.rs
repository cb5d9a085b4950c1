use std::{collections::HashMap, sync::Arc, thread, time::Duration};

use skylane_pipeline::{
    ConfigError, Pipeline, PipelineError, PipelineOptions, PriorityRouter, ReorderOptions,
};
use skylane_wire::{Packet, TrafficClass};

fn packet(seq: u64) -> Packet {
    let class = TrafficClass::ALL[(seq % 4) as usize];
    Packet::new(seq, class, 1, (seq % 5) as u32, vec![0u8; 32])
}

/// Spawns one drainer per lane, each collecting the sequence numbers it receives.
fn spawn_drainers(router: &Arc<PriorityRouter>) -> Vec<thread::JoinHandle<Vec<u64>>> {
    (0..router.lane_count())
        .map(|lane| {
            let router = Arc::clone(router);
            thread::spawn(move || {
                let mut seqs = Vec::new();
                while let Some(packet) = router.recv(lane).unwrap() {
                    assert_eq!(router.lane_for(packet.destination_id()), lane);
                    seqs.push(packet.sequence());
                }
                seqs
            })
        })
        .collect()
}

fn options() -> PipelineOptions {
    PipelineOptions::default()
        .lanes(4)
        .reorder(ReorderOptions::default().timeout(Duration::from_millis(200)))
}

#[test]
fn direct_ingress_delivers_everything() {
    let _ = tracing_subscriber::fmt::try_init();

    let (pipeline, mut ingress) = Pipeline::spawn(options()).unwrap();
    assert!(!ingress.is_staged());
    let drainers = spawn_drainers(pipeline.router());

    for seq in [1, 0, 3, 2, 5, 4, 7, 6] {
        ingress.send(packet(seq)).unwrap();
    }
    ingress.close();

    let report = pipeline.join();
    let mut delivered: Vec<u64> = drainers.into_iter().flat_map(|d| d.join().unwrap()).collect();
    delivered.sort_unstable();

    assert_eq!(delivered, (0..8).collect::<Vec<_>>());
    assert_eq!(report.received, 8);
    assert_eq!(report.released, 8);
    assert_eq!(report.gaps, 0);
    assert_eq!(report.routed, 8);
    assert_eq!(report.dequeued, 8);
    assert_eq!(report.pending, 0);
    assert_eq!(report.lane_depths, vec![0; 4]);
}

#[test]
fn staged_ingress_drains_ring_before_shutdown() {
    const N: u64 = 10_000;

    let (pipeline, mut ingress) = Pipeline::spawn(options().ingress_capacity(256)).unwrap();
    assert!(ingress.is_staged());
    let drainers = spawn_drainers(pipeline.router());

    let mut retries = 0;
    for seq in 0..N {
        let mut packet = packet(seq);
        while let Err(rejected) = ingress.send(packet) {
            packet = rejected;
            retries += 1;
            thread::yield_now();
        }
    }
    // Dropping the ingress is an end-of-stream signal too.
    drop(ingress);

    let report = pipeline.join();
    let delivered: usize = drainers.into_iter().map(|d| d.join().unwrap().len()).sum();

    assert_eq!(delivered as u64, N);
    assert_eq!(report.received, N);
    assert_eq!(report.released, N);
    assert_eq!(report.gaps, 0);
    tracing::debug!(retries, "ingress ring was full");
}

/// A small reorder buffer pushes back on the ingress during gap waits instead of dropping
/// traffic, for both ingress modes.
#[test]
fn full_reorder_buffer_pushes_back_on_ingress() {
    const N: u64 = 5_000;
    let lost = |seq: u64| seq % 500 == 250;

    for staged in [false, true] {
        let reorder = ReorderOptions::default().timeout(Duration::from_millis(200)).max_pending(16);
        let mut options = options().reorder(reorder);
        if staged {
            options = options.ingress_capacity(64);
        }

        let (pipeline, mut ingress) = Pipeline::spawn(options).unwrap();
        let drainers = spawn_drainers(pipeline.router());

        // Neighbours are swapped within blocks of 8, never further than the buffer can hold.
        for block in (0..N).step_by(8) {
            for seq in (block..block + 8).rev().filter(|seq| !lost(*seq)) {
                let mut packet = packet(seq);
                while let Err(rejected) = ingress.send(packet) {
                    packet = rejected;
                    thread::yield_now();
                }
            }
        }
        ingress.close();

        let report = pipeline.join();
        let delivered: usize = drainers.into_iter().map(|d| d.join().unwrap().len()).sum();
        let expected = (0..N).filter(|seq| !lost(*seq)).count() as u64;

        assert!(report.rejected > 0, "staged={staged}");
        assert_eq!(report.received, expected);
        assert_eq!(report.released, expected);
        assert_eq!(report.late, 0);
        assert_eq!(report.gaps, N - expected);
        assert_eq!(delivered as u64, expected);
    }
}

#[test]
fn lost_packets_become_gaps() {
    let (pipeline, mut ingress) = Pipeline::spawn(options()).unwrap();

    for seq in [0, 2, 1, 4, 6] {
        ingress.send(packet(seq)).unwrap();
    }
    ingress.close();

    let report = pipeline.join();

    assert_eq!(report.received, 5);
    assert_eq!(report.released, 5);
    assert_eq!(report.gaps, 2);
    assert_eq!(report.routed, 5);
    // Nobody drained the lanes, so the packets are still there.
    assert_eq!(report.lane_depths.iter().sum::<usize>(), 5);
    assert_eq!(report.dequeued, 0);
}

#[test]
fn lanes_preserve_class_order() {
    let (pipeline, mut ingress) = Pipeline::spawn(options().lanes(1)).unwrap();
    let router = Arc::clone(pipeline.router());

    for seq in 0..16 {
        ingress.send(packet(seq)).unwrap();
    }
    ingress.close();
    pipeline.join();

    let mut order = Vec::new();
    while let Some(packet) = router.dequeue(0) {
        order.push((packet.class(), packet.sequence()));
    }

    let mut expected = order.clone();
    expected.sort();
    assert_eq!(order, expected);
    assert_eq!(order.first().map(|(class, _)| *class), Some(TrafficClass::Control));

    let per_class: HashMap<_, _> = TrafficClass::ALL
        .into_iter()
        .map(|class| (class, router.stats().routed_by_class(class)))
        .collect();
    assert!(per_class.values().all(|count| *count == 4));
}

#[test]
fn invalid_options_are_rejected() {
    let err = Pipeline::spawn(options().lanes(0)).unwrap_err();
    assert!(matches!(err, PipelineError::Config(ConfigError::InvalidLaneCount)));

    let err = Pipeline::spawn(options().ingress_capacity(100)).unwrap_err();
    assert!(matches!(err, PipelineError::Config(ConfigError::InvalidCapacity(100))));

    let err = Pipeline::spawn(
        options().reorder(ReorderOptions::default().timeout(Duration::ZERO)),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Config(ConfigError::InvalidTimeout)));
}
