use crate::*;
use ledger_core::types::BroadcastMode;
use ledger_middleware::{ErrorKind, SubmitParams};
use ledger_providers::{BroadcastResponse, JsonRpcError, MockRequest};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn deadline_ends_the_submission() {
    let mock = MockTransport::new().with_latency(Duration::from_secs(5));
    let config = config().max_msgs_per_chunk(1).broadcast_timeout(Duration::from_secs(2));
    let submitter = Submitter::new(mock.clone(), keyring(), config).with_codec(TestCodec);
    mock.push_query_json(&account_json(7, 3)).unwrap();
    mock.push_broadcast(BroadcastResponse::accepted(""));
    mock.push_broadcast(BroadcastResponse::accepted(""));

    let failure = submitter.submit(&msgs([1, 1]), &SubmitParams::new("alice", "")).await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::Timeout);
    assert_eq!(failure.error.timeout(), Some(Duration::from_secs(2)));
    assert!(failure.completed.is_empty());

    // not retried: one broadcast went out and may still land on the node
    assert_eq!(mock.broadcast_count(), 1);
}

#[tokio::test]
async fn mode_is_passed_to_the_transport() {
    let (mock, submitter) = setup(config());
    mock.push_query_json(&account_json(7, 3)).unwrap();
    mock.push_broadcast(BroadcastResponse::accepted("A1"));

    let params = SubmitParams::new("alice", "").mode(BroadcastMode::Async);
    let responses = submitter.submit(&msgs([1]), &params).await.unwrap();
    assert_eq!(responses[0].hash, "A1");
    assert!(mock
        .requests()
        .iter()
        .any(|req| matches!(req, MockRequest::Broadcast { mode: BroadcastMode::Async, .. })));
}

#[tokio::test]
async fn transport_errors_keep_completed_chunks() {
    let (mock, submitter) = setup(config().max_msgs_per_chunk(2));
    let alice = address_of(submitter.keys(), "alice").await;
    mock.push_query_json(&account_json(7, 3)).unwrap();
    mock.push_broadcast(BroadcastResponse::accepted("H1").height(10));
    mock.push_broadcast_error(JsonRpcError::new(-32603, "connection reset"));

    let failure =
        submitter.submit(&msgs([1, 1, 1, 1, 1]), &SubmitParams::new("alice", "")).await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::Transport);
    assert_eq!(failure.completed.len(), 1);
    assert_eq!(failure.completed[0].hash, "H1");
    assert_eq!(mock.broadcast_count(), 2);

    // whether the failed chunk consumed its sequence is unknown, so it is read again
    assert!(submitter.sequencer().cached(&alice).is_none());
}

#[tokio::test]
async fn stale_sequence_reported_as_rpc_error_is_retried() {
    let (mock, submitter) = setup(config());
    mock.push_query_json(&account_json(7, 3)).unwrap();
    let mut error = JsonRpcError::new(-32603, "Internal error");
    error.data = Some("account sequence mismatch, expected 4, got 3".into());
    mock.push_broadcast_error(error);
    mock.push_query_json(&account_json(7, 4)).unwrap();
    mock.push_broadcast(BroadcastResponse::accepted(""));

    submitter.submit(&msgs([1]), &SubmitParams::new("alice", "")).await.unwrap();
    let sequences: Vec<u64> = broadcast_frames(&mock).iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, vec![3, 4]);
}

#[tokio::test]
async fn results_come_back_in_chunk_order() {
    let (mock, submitter) = setup(config().max_msgs_per_chunk(1));
    mock.push_query_json(&account_json(7, 0)).unwrap();
    for (i, height) in [5, 6, 7].into_iter().enumerate() {
        mock.push_broadcast(BroadcastResponse::accepted(format!("H{i}")).height(height));
    }

    let responses = submitter.submit(&msgs([1, 1, 1]), &SubmitParams::new("alice", "")).await.unwrap();
    let hashes: Vec<&str> = responses.iter().map(|r| r.hash.as_str()).collect();
    assert_eq!(hashes, vec!["H0", "H1", "H2"]);
    assert_eq!(responses.iter().map(|r| r.height).collect::<Vec<_>>(), vec![5, 6, 7]);
}
