use crate::*;
use ledger_middleware::{ErrorKind, SubmitError, SubmitParams};
use ledger_providers::{BroadcastResponse, MockRequest, CODE_WRONG_SEQUENCE};
use tracing_test::traced_test;

fn stale(expected: u64, got: u64) -> BroadcastResponse {
    BroadcastResponse::rejected(
        CODE_WRONG_SEQUENCE,
        "sdk",
        format!("account sequence mismatch, expected {expected}, got {got}: incorrect account sequence"),
    )
}

#[tokio::test]
#[traced_test]
async fn cached_sequences_then_stale_retry() {
    let (mock, submitter) = setup(config());
    let alice = address_of(submitter.keys(), "alice").await;
    let params = SubmitParams::new("alice", "");

    // empty cache: the account is read from the chain
    mock.push_query_json(&account_json(7, 3)).unwrap();
    mock.push_broadcast(BroadcastResponse::accepted("H1").height(100));
    let responses = submitter.submit(&msgs([10]), &params).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!((responses[0].hash.as_str(), responses[0].height), ("H1", 100));
    let cached = submitter.sequencer().cached(&alice).unwrap();
    assert_eq!((cached.account_number, cached.sequence), (7, 4));
    assert_eq!(mock.query_count(), 1);

    // cache hit: no chain read, sequence 4 is used
    mock.push_broadcast(BroadcastResponse::accepted("H2").height(101));
    submitter.submit(&msgs([10]), &params).await.unwrap();
    assert_eq!(mock.query_count(), 1);
    assert_eq!(submitter.sequencer().cached(&alice).unwrap().sequence, 5);

    // stale sequence: invalidated, re-read as 6, accepted on the second attempt
    mock.push_broadcast(stale(6, 5));
    mock.push_query_json(&account_json(7, 6)).unwrap();
    mock.push_broadcast(BroadcastResponse::accepted("H3").height(102));
    let responses = submitter.submit(&msgs([10]), &params).await.unwrap();
    assert_eq!(responses[0].hash, "H3");
    assert_eq!(mock.query_count(), 2);
    assert!(logs_contain("stale sequence, retrying chunk"));

    let sequences: Vec<u64> = broadcast_frames(&mock).iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, vec![3, 4, 5, 6]);
    assert_eq!(submitter.sequencer().cached(&alice).unwrap().sequence, 7);
    assert_eq!(mock.pending(), (0, 0));
}

#[tokio::test]
async fn stale_rejection_forces_a_chain_read() {
    let (mock, submitter) = setup(config());
    let params = SubmitParams::new("alice", "");

    mock.push_query_json(&account_json(1, 0)).unwrap();
    mock.push_broadcast(stale(2, 0));
    mock.push_query_json(&account_json(1, 2)).unwrap();
    mock.push_broadcast(BroadcastResponse::accepted(""));
    submitter.submit(&msgs([1]), &params).await.unwrap();

    let kinds: Vec<&str> = mock
        .requests()
        .iter()
        .map(|req| match req {
            MockRequest::Query { .. } => "query",
            MockRequest::Broadcast { .. } => "broadcast",
        })
        .collect();
    assert_eq!(kinds, vec!["query", "broadcast", "query", "broadcast"]);
}

#[tokio::test]
async fn stale_retries_are_bounded() {
    let (mock, submitter) = setup(config());
    let params = SubmitParams::new("bob", "");

    for sequence in 0..3 {
        mock.push_query_json(&account_json(2, sequence)).unwrap();
        mock.push_broadcast(stale(sequence + 10, sequence));
    }

    let failure = submitter.submit(&msgs([1, 1]), &params).await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::StaleSequenceExhausted);
    assert!(failure.completed.is_empty());
    match &failure.error {
        SubmitError::StaleSequenceExhausted { attempts, source } => {
            assert_eq!(*attempts, 3);
            assert!(source.is_stale_sequence());
            assert_eq!(source.code(), Some(CODE_WRONG_SEQUENCE));
        }
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(mock.query_count(), 3);
    assert_eq!(mock.broadcast_count(), 3);
    assert_eq!(mock.pending(), (0, 0));

    let bob = address_of(submitter.keys(), "bob").await;
    assert!(submitter.sequencer().cached(&bob).is_none());
}

#[tokio::test]
async fn try_threshold_is_configurable() {
    let (mock, submitter) = setup(config().try_threshold(1));
    mock.push_query_json(&account_json(2, 0)).unwrap();
    mock.push_broadcast(stale(1, 0));

    let failure = submitter.submit(&msgs([1]), &SubmitParams::new("bob", "")).await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::StaleSequenceExhausted);
    assert_eq!((mock.query_count(), mock.broadcast_count()), (1, 1));
}

#[tokio::test]
async fn sequences_advance_by_chunks_consumed() {
    let (mock, submitter) = setup(config().max_msgs_per_chunk(3));
    let params = SubmitParams::new("alice", "");
    mock.push_query_json(&account_json(5, 20)).unwrap();

    let mut first_sequences = Vec::new();
    for len in [1, 7, 3, 4] {
        let before = mock.broadcast_count();
        let chunks = (len + 2) / 3;
        for _ in 0..chunks {
            mock.push_broadcast(BroadcastResponse::accepted(""));
        }
        let responses = submitter.submit(&msgs(vec![1; len]), &params).await.unwrap();
        assert_eq!(responses.len(), chunks);

        let frames = broadcast_frames(&mock);
        first_sequences.push((frames[before].sequence, chunks as u64));
        let used: Vec<u64> = frames[before..].iter().map(|f| f.sequence).collect();
        let expected: Vec<u64> = (0..chunks as u64).map(|i| frames[before].sequence + i).collect();
        assert_eq!(used, expected);
    }

    for pair in first_sequences.windows(2) {
        let (sequence, consumed) = pair[0];
        assert_eq!(pair[1].0, sequence + consumed);
    }
    assert_eq!(first_sequences[0].0, 20);
    assert_eq!(mock.query_count(), 1);
}

#[tokio::test]
async fn account_query_errors_are_sequencing_errors() {
    let (mock, submitter) = setup(config());
    mock.push_query_error(ledger_providers::JsonRpcError::new(-32603, "node is syncing"));

    let failure = submitter.submit(&msgs([1]), &SubmitParams::new("alice", "")).await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::Sequencing);
    assert_eq!(mock.broadcast_count(), 0);
}

#[tokio::test]
async fn query_account_refreshes_the_cache() {
    let (mock, submitter) = setup(config());
    let alice = address_of(submitter.keys(), "alice").await;
    mock.push_query_json(&account_json(7, 42)).unwrap();

    let account = submitter.query_account("alice", "").await.unwrap();
    assert_eq!((account.address, account.account_number, account.sequence), (alice, 7, 42));
    assert_eq!(submitter.sequencer().cached(&alice).unwrap().sequence, 42);

    mock.push_broadcast(BroadcastResponse::accepted(""));
    submitter.submit(&msgs([1]), &SubmitParams::new("alice", "")).await.unwrap();
    assert_eq!(broadcast_frames(&mock)[0].sequence, 42);
    assert_eq!(mock.query_count(), 1);
}
