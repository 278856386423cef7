use crate::*;
use ledger_core::types::{Account, Msg, ValidationError};
use ledger_middleware::{AccountLocker, ErrorKind, SubmitParams};
use ledger_providers::{BroadcastResponse, Cache, MemoryCache};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing_test::traced_test;

const LATENCY: Duration = Duration::from_secs(1);

fn accept(mock: &MockTransport, count: usize) {
    for _ in 0..count {
        mock.push_broadcast(BroadcastResponse::accepted(""));
    }
}

#[tokio::test(start_paused = true)]
async fn one_chunk_per_sender_in_flight() {
    let mock = MockTransport::new().with_latency(LATENCY);
    let submitter = Submitter::new(mock.clone(), keyring(), config()).with_codec(TestCodec);
    mock.push_query_json(&account_json(3, 0)).unwrap();
    accept(&mock, 8);

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let submitter = submitter.clone();
            tokio::spawn(async move {
                let params = SubmitParams::new("alice", "");
                submitter.submit(&msgs([1, 1]), &params).await
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().len(), 1);
    }

    assert_eq!(mock.max_in_flight(), 1);
    let sequences: Vec<u64> = broadcast_frames(&mock).iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2, 3]);
    assert_eq!(mock.query_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn submitters_sharing_parts_share_the_lock() {
    let mock = MockTransport::new().with_latency(LATENCY);
    let locker = Arc::new(AccountLocker::default());
    let cache: Arc<dyn Cache<String, Account>> = Arc::new(MemoryCache::new());
    let first = Submitter::with_parts(mock.clone(), keyring(), config(), locker.clone(), cache.clone())
        .with_codec(TestCodec);
    let second = Submitter::with_parts(mock.clone(), keyring(), config(), locker, cache)
        .with_codec(TestCodec);
    mock.push_query_json(&account_json(3, 10)).unwrap();
    accept(&mock, 2);

    let params = SubmitParams::new("alice", "");
    let (one, other) = (msgs([1]), msgs([1]));
    let (a, b) = tokio::join!(first.submit(&one, &params), second.submit(&other, &params));
    a.unwrap();
    b.unwrap();

    assert_eq!(mock.max_in_flight(), 1);
    let mut sequences: Vec<u64> = broadcast_frames(&mock).iter().map(|f| f.sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![10, 11]);
}

/// A shard count under which `a` and `b` land on different shards
async fn separating_shards(keys: &LocalKeyring, a: &str, b: &str) -> usize {
    let a = address_of(keys, a).await.to_string();
    let b = address_of(keys, b).await.to_string();
    (2..64)
        .find(|shards| {
            let locker = AccountLocker::new(*shards);
            locker.shard_index(&a) != locker.shard_index(&b)
        })
        .unwrap()
}

async fn submit_pair(lock_shards: usize) -> Duration {
    let mock = MockTransport::new().with_latency(LATENCY);
    let submitter = Submitter::new(mock.clone(), keyring(), config().lock_shards(lock_shards))
        .with_codec(TestCodec);
    mock.push_query_json(&account_json(1, 0)).unwrap();
    mock.push_query_json(&account_json(1, 0)).unwrap();
    accept(&mock, 2);

    let (for_alice, for_bob) = (msgs([1]), msgs([1]));
    let (from_alice, from_bob) = (SubmitParams::new("alice", ""), SubmitParams::new("bob", ""));

    let start = Instant::now();
    let (alice, bob) =
        tokio::join!(submitter.submit(&for_alice, &from_alice), submitter.submit(&for_bob, &from_bob));
    alice.unwrap();
    bob.unwrap();
    start.elapsed()
}

#[tokio::test(start_paused = true)]
async fn independent_senders_run_in_parallel() {
    let shards = separating_shards(&keyring(), "alice", "bob").await;
    let elapsed = submit_pair(shards).await;
    assert!(elapsed >= LATENCY);
    assert!(elapsed < LATENCY * 2, "took {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn senders_sharing_a_shard_serialize() {
    let elapsed = submit_pair(1).await;
    assert!(elapsed >= LATENCY * 2, "took {elapsed:?}");
}

#[tokio::test]
#[traced_test]
async fn panics_are_contained_and_release_the_lock() {
    let (mock, submitter) = setup(config().max_msgs_per_chunk(1));
    let alice = address_of(submitter.keys(), "alice").await;
    mock.push_query_json(&account_json(7, 3)).unwrap();
    accept(&mock, 1);

    let batch: Vec<Box<dyn Msg>> =
        vec![Box::new(TestMsg::new(0, 1)), Box::new(TestMsg::exploding(1)), Box::new(TestMsg::new(2, 1))];
    let failure = submitter.submit(&batch, &SubmitParams::new("alice", "")).await.unwrap_err();

    assert_eq!(failure.kind(), ErrorKind::Panic);
    assert!(failure.error.to_string().contains("message 1 exploded"));
    assert_eq!(failure.completed.len(), 1);
    assert!(logs_contain("submission panicked"));

    // the lock is free again and the reserved sequence was forgotten
    assert!(submitter.locker().try_lock(&alice.to_string()).is_some());
    assert!(submitter.sequencer().cached(&alice).is_none());

    mock.push_query_json(&account_json(7, 4)).unwrap();
    accept(&mock, 1);
    submitter.submit(&msgs([1]), &SubmitParams::new("alice", "")).await.unwrap();
    let sequences: Vec<u64> = broadcast_frames(&mock).iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, vec![3, 4]);
}

#[tokio::test]
async fn lock_is_released_after_errors() {
    let (mock, submitter) = setup(config());
    let alice = address_of(submitter.keys(), "alice").await;
    mock.push_query_json(&account_json(7, 3)).unwrap();
    mock.push_broadcast(BroadcastResponse::rejected(5, "sdk", "insufficient funds"));

    let failure = submitter.submit(&msgs([1]), &SubmitParams::new("alice", "")).await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::Rejected);
    assert!(submitter.locker().try_lock(&alice.to_string()).is_some());
}

/// A message whose own validation panics
#[derive(Debug)]
struct BrokenValidation;

impl Msg for BrokenValidation {
    fn msg_type(&self) -> &str {
        "test/Broken"
    }

    fn validate_basic(&self) -> Result<(), ValidationError> {
        panic!("validation exploded")
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Null)
    }
}

#[tokio::test]
#[traced_test]
async fn panics_during_validation_are_contained() {
    let (mock, submitter) = setup(config());
    let batch: Vec<Box<dyn Msg>> = vec![Box::new(TestMsg::new(0, 1)), Box::new(BrokenValidation)];

    let failure = submitter.submit(&batch, &SubmitParams::new("alice", "")).await.unwrap_err();

    assert_eq!(failure.kind(), ErrorKind::Panic);
    assert!(failure.error.to_string().contains("validation exploded"));
    assert!(failure.completed.is_empty());
    assert!(mock.requests().is_empty());
    assert!(logs_contain("before taking the account lock"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn waiter_after_a_panic_reads_the_chain_again() {
    let mock = MockTransport::new().with_latency(Duration::from_millis(50));
    let submitter =
        Submitter::new(mock.clone(), keyring(), config().max_msgs_per_chunk(1)).with_codec(TestCodec);
    mock.push_query_json(&account_json(7, 3)).unwrap();
    mock.push_query_json(&account_json(7, 4)).unwrap();
    accept(&mock, 2);

    let first = {
        let submitter = submitter.clone();
        tokio::spawn(async move {
            let batch: Vec<Box<dyn Msg>> =
                vec![Box::new(TestMsg::new(0, 1)), Box::new(TestMsg::exploding(1))];
            submitter.submit(&batch, &SubmitParams::new("alice", "")).await
        })
    };
    // the first submission holds the lock by now, waiting on its first broadcast
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = {
        let submitter = submitter.clone();
        tokio::spawn(async move {
            submitter.submit(&msgs([1]), &SubmitParams::new("alice", "")).await
        })
    };

    assert_eq!(first.await.unwrap().unwrap_err().kind(), ErrorKind::Panic);
    second.await.unwrap().unwrap();

    // sequence 4 was reserved by the panicking chunk; the waiter must not skip it
    let sequences: Vec<u64> = broadcast_frames(&mock).iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, vec![3, 4]);
    assert_eq!(mock.query_count(), 2);
}
