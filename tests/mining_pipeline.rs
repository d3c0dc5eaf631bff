use alloy::primitives::U256;
use blobmint::domain::constants::CANDIDATE_QUEUE_CAPACITY;
use blobmint::domain::session::AcceptanceRule;
use blobmint::mining::candidate::{CandidateMiner, accepts, acceptance_value};
use blobmint::mining::target::TargetTracker;
use blobmint::mining::worker::{MiningStats, WorkerPool};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    cond()
}

#[test]
fn full_queue_blocks_the_producer() {
    let tracker = TargetTracker::new();
    tracker.advance(U256::MAX);
    let (candidate_tx, mut candidate_rx) = mpsc::channel(CANDIDATE_QUEUE_CAPACITY);
    let stats = Arc::new(MiningStats::default());
    let shutdown = CancellationToken::new();

    let pool = WorkerPool::spawn(
        1,
        Arc::new(CandidateMiner::new(AcceptanceRule::Truncate)),
        tracker.subscribe(),
        candidate_tx,
        Arc::clone(&stats),
        shutdown.clone(),
    )
    .expect("spawn pool");

    // Three queued plus one held by the parked worker.
    assert!(wait_until(Duration::from_secs(300), || stats.accepted() >= 4));
    thread::sleep(Duration::from_millis(500));
    assert_eq!(stats.accepted(), 4);
    assert_eq!(stats.attempts(), 4);

    let first = candidate_rx.try_recv().expect("queued candidate");
    assert!(accepts(first.acceptance, U256::MAX));
    assert!(wait_until(Duration::from_secs(300), || stats.accepted() >= 5));

    let mut drained = 0;
    while candidate_rx.try_recv().is_ok() {
        drained += 1;
    }
    assert!(drained <= CANDIDATE_QUEUE_CAPACITY);

    pool.stop();
    drop(candidate_rx);
    pool.join();
}

#[test]
fn attempts_count_accepts_and_rejects() {
    let tracker = TargetTracker::new();
    let (candidate_tx, mut candidate_rx) = mpsc::channel(CANDIDATE_QUEUE_CAPACITY);
    let stats = Arc::new(MiningStats::default());
    let shutdown = CancellationToken::new();

    // Target zero: every attempt is a rejection but still counted.
    let pool = WorkerPool::spawn(
        2,
        Arc::new(CandidateMiner::new(AcceptanceRule::LegacyShift)),
        tracker.subscribe(),
        candidate_tx,
        Arc::clone(&stats),
        shutdown.clone(),
    )
    .expect("spawn pool");

    assert!(wait_until(Duration::from_secs(300), || stats.attempts() >= 3));
    let before_raise = stats.attempts();
    assert_eq!(stats.accepted(), 0);

    tracker.advance(U256::MAX);
    let mut received = None;
    assert!(wait_until(Duration::from_secs(300), || {
        received = candidate_rx.try_recv().ok();
        received.is_some()
    }));
    let candidate = received.expect("accepted after raise");
    assert_eq!(
        candidate.acceptance,
        acceptance_value(&candidate.versioned_hash, AcceptanceRule::LegacyShift)
    );

    pool.stop();
    drop(candidate_rx);
    pool.join();
    assert!(stats.attempts() >= before_raise + stats.accepted());
    assert!(stats.accepted() >= 1);
}
