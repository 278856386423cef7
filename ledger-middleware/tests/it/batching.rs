use crate::*;
use ledger_middleware::{ErrorKind, SubmitError, SubmitParams};
use ledger_providers::{BroadcastResponse, CODE_TX_TOO_LARGE};

fn accept(mock: &MockTransport, count: usize) {
    for _ in 0..count {
        mock.push_broadcast(BroadcastResponse::accepted(""));
    }
}

#[tokio::test]
async fn oversized_chunk_replans_the_remainder() {
    let (mock, submitter) = setup(config().max_tx_bytes(9_500));
    let weights = std::iter::repeat(50).take(10).chain(std::iter::repeat(1_000).take(15));
    mock.push_query_json(&account_json(7, 3)).unwrap();
    accept(&mock, 3);

    let responses =
        submitter.submit(&msgs(weights), &SubmitParams::new("alice", "")).await.unwrap();
    assert_eq!(responses.len(), 3);

    let frames = broadcast_frames(&mock);
    let sizes: Vec<usize> = frames.iter().map(|f| f.ids.len()).collect();
    assert_eq!(sizes, vec![10, 9, 6]);
    assert_eq!(frames[0].ids, (0..10).collect::<Vec<_>>());
    assert_eq!(frames[1].ids, (10..19).collect::<Vec<_>>());
    assert_eq!(frames[2].ids, (19..25).collect::<Vec<_>>());

    // the oversized attempt never reached the node, so no sequence was skipped
    let sequences: Vec<u64> = frames.iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, vec![3, 4, 5]);
    assert!(mock.broadcast_txs().iter().all(|tx| tx.len() <= 9_500));
    assert_eq!(mock.pending(), (0, 0));
}

#[tokio::test]
async fn chunks_conserve_every_message_in_order() {
    for (len, max, budget) in [(1, 10, 100_000), (23, 4, 100_000), (40, 10, 700), (17, 17, 250)] {
        let (mock, submitter) = setup(config().max_msgs_per_chunk(max).max_tx_bytes(budget));
        // weights vary so that shrinking kicks in at different points
        let weights: Vec<usize> = (0..len).map(|i| 10 + (i * 37) % 90).collect();
        mock.push_query_json(&account_json(1, 0)).unwrap();
        accept(&mock, len);

        let responses =
            submitter.submit(&msgs(weights), &SubmitParams::new("alice", "")).await.unwrap();

        let frames = broadcast_frames(&mock);
        assert_eq!(responses.len(), frames.len());
        let ids: Vec<usize> = frames.iter().flat_map(|f| f.ids.clone()).collect();
        assert_eq!(ids, (0..len).collect::<Vec<_>>(), "len {len} max {max} budget {budget}");
        assert!(frames.iter().all(|f| f.ids.len() <= max));
        assert!(mock.broadcast_txs().iter().all(|tx| tx.len() <= budget));
    }
}

#[tokio::test]
async fn single_message_above_the_limit_is_fatal() {
    let (mock, submitter) = setup(config().max_tx_bytes(2_000));
    let alice = address_of(submitter.keys(), "alice").await;
    mock.push_query_json(&account_json(7, 3)).unwrap();
    accept(&mock, 1);

    let failure = submitter
        .submit(&msgs([100, 5_000, 100]), &SubmitParams::new("alice", ""))
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::SizeExceeded);
    match failure.error {
        SubmitError::SizeExceeded { index, size, limit } => {
            assert_eq!((index, limit), (1, 2_000));
            assert!(size > 5_000);
        }
        other => panic!("unexpected error {other:?}"),
    }

    // the first message went out on its own before the second was found too large
    assert_eq!(failure.completed.len(), 1);
    assert_eq!(broadcast_frames(&mock)[0].ids, vec![0]);
    assert_eq!(submitter.sequencer().cached(&alice).unwrap().sequence, 4);
}

#[tokio::test]
async fn node_size_rejection_shrinks_like_the_local_check() {
    let (mock, submitter) = setup(config().max_msgs_per_chunk(4));
    mock.push_query_json(&account_json(7, 3)).unwrap();
    mock.push_broadcast(BroadcastResponse::rejected(CODE_TX_TOO_LARGE, "sdk", "tx too large"));
    accept(&mock, 2);

    let responses =
        submitter.submit(&msgs([1, 1, 1, 1]), &SubmitParams::new("alice", "")).await.unwrap();
    assert_eq!(responses.len(), 2);

    let frames = broadcast_frames(&mock);
    let sizes: Vec<usize> = frames.iter().map(|f| f.ids.len()).collect();
    assert_eq!(sizes, vec![4, 3, 1]);
    let sequences: Vec<u64> = frames.iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, vec![3, 3, 4]);
}

#[tokio::test]
async fn invalid_messages_fail_before_anything_is_sent() {
    let (mock, submitter) = setup(config());
    let failure =
        submitter.submit(&msgs([5, 0, 5]), &SubmitParams::new("alice", "")).await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::Validation);
    assert!(matches!(failure.error, SubmitError::Validation { index: 1, .. }));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn simulation_sets_the_gas_of_every_chunk() {
    let (mock, submitter) = setup(config().max_msgs_per_chunk(2).gas_adjustment(1.5));
    mock.push_query_json(&account_json(7, 0)).unwrap();
    mock.push_query_json(&serde_json::json!({ "gas_info": { "gas_used": "50000" } })).unwrap();
    mock.push_query_json(&serde_json::json!({ "gas_info": { "gas_used": 10000 } })).unwrap();
    accept(&mock, 2);

    let params = SubmitParams::new("alice", "").gas(1).simulate(true);
    submitter.submit(&msgs([1, 1, 1]), &params).await.unwrap();

    let gas: Vec<u64> = broadcast_frames(&mock).iter().map(|f| f.gas).collect();
    assert_eq!(gas, vec![75_000, 15_000]);
    assert_eq!(mock.query_count(), 3);
}

#[tokio::test]
async fn build_and_sign_assigns_consecutive_sequences() {
    let (mock, submitter) = setup(config().max_msgs_per_chunk(2));
    let alice = address_of(submitter.keys(), "alice").await;
    mock.push_query_json(&account_json(7, 11)).unwrap();

    let signed =
        submitter.build_and_sign(&msgs([1, 1, 1, 1, 1]), &SubmitParams::new("alice", "")).await.unwrap();
    let sequences: Vec<u64> = signed.iter().map(|tx| frame(tx).sequence).collect();
    assert_eq!(sequences, vec![11, 12, 13]);
    assert_eq!(mock.broadcast_count(), 0);
    assert!(submitter.sequencer().cached(&alice).is_none());
}
