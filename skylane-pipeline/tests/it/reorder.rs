use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use skylane_pipeline::{Admission, ReorderBuffer, ReorderOptions, Release};
use skylane_wire::{Packet, TrafficClass};

fn packet(seq: u64) -> Packet {
    Packet::new(seq, TrafficClass::RealTime, 7, (seq % 4) as u32, vec![0xAB; 16])
}

/// Sequence numbers [0, 2, 1, 4] with 3 delayed beyond the timeout.
#[test]
fn delayed_packet_becomes_gap() {
    let _ = tracing_subscriber::fmt::try_init();

    let buffer =
        ReorderBuffer::new(ReorderOptions::default().timeout(Duration::from_millis(10))).unwrap();

    for seq in [0, 2, 1, 4] {
        buffer.insert(packet(seq)).unwrap();
    }

    let mut released = Vec::new();
    let mut not_ready = 0;
    while released.len() < 4 {
        match buffer.next() {
            Release::Packet(packet) => released.push(packet.sequence()),
            Release::NotReady => not_ready += 1,
            Release::Closed => unreachable!("buffer was never stopped"),
        }
    }

    assert_eq!(released, vec![0, 1, 2, 4]);
    assert_eq!(not_ready, 0);
    assert_eq!(buffer.stats().received(), 4);
    assert_eq!(buffer.stats().released(), 4);
    assert_eq!(buffer.stats().gaps(), 1);

    // The delayed packet shows up eventually, but its slot is gone.
    assert_eq!(buffer.insert(packet(3)).unwrap(), Admission::Late);
    assert_eq!(buffer.stats().late(), 1);
    assert_eq!(buffer.pending_len(), 0);
}

/// Any arrival order from a concurrent producer is released in strictly increasing order, and
/// with no loss nothing is skipped.
#[test]
fn concurrent_producer_no_loss() {
    const N: u64 = 20_000;

    let buffer = Arc::new(
        ReorderBuffer::new(ReorderOptions::default().timeout(Duration::from_secs(2))).unwrap(),
    );

    let producer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            // Swap every pair of neighbours within blocks of 8.
            for block in (0..N).step_by(8) {
                for seq in (block..(block + 8).min(N)).rev() {
                    buffer.insert(packet(seq)).unwrap();
                }
            }
            buffer.stop();
        })
    };

    let mut last = None;
    let mut released = 0;
    loop {
        match buffer.next() {
            Release::Packet(packet) => {
                let seq = packet.sequence();
                assert!(last.map_or(true, |last| seq > last), "{seq} released after {last:?}");
                last = Some(seq);
                released += 1;
            }
            Release::NotReady => {}
            Release::Closed => break,
        }
    }

    producer.join().unwrap();
    assert_eq!(released, N);
    assert_eq!(buffer.stats().gaps(), 0);
    assert_eq!(buffer.stats().released(), N);
}

/// With losses, output stays strictly increasing and every sequence number is accounted for as
/// either released or a gap.
#[test]
fn concurrent_producer_with_loss() {
    const N: u64 = 2_000;

    let buffer = Arc::new(
        ReorderBuffer::new(ReorderOptions::default().timeout(Duration::from_millis(2))).unwrap(),
    );

    let producer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            for seq in 0..N {
                if seq % 97 == 13 {
                    continue;
                }
                buffer.insert(packet(seq)).unwrap();
            }
            buffer.stop();
        })
    };

    let mut last = None;
    loop {
        match buffer.next() {
            Release::Packet(packet) => {
                let seq = packet.sequence();
                assert!(last.map_or(true, |last| seq > last));
                last = Some(seq);
            }
            Release::NotReady => {}
            Release::Closed => break,
        }
    }

    producer.join().unwrap();

    let stats = buffer.stats();
    assert_eq!(stats.received(), N - (0..N).filter(|seq| seq % 97 == 13).count() as u64);
    assert_eq!(stats.released() + stats.gaps(), buffer.next_expected());
    assert_eq!(last, Some(N - 1));
}

#[test]
fn explicit_deadline() {
    let buffer =
        ReorderBuffer::new(ReorderOptions::default().timeout(Duration::from_secs(60))).unwrap();
    buffer.insert(packet(1)).unwrap();

    // An already elapsed deadline declares the gap without waiting for the configured timeout.
    let start = Instant::now();
    let release = buffer.next_until(start);
    assert_eq!(release.into_packet().map(|p| p.sequence()), Some(1));
    assert!(start.elapsed() < Duration::from_secs(60));
    assert_eq!(buffer.stats().gaps(), 1);
}
