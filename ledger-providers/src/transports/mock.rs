use super::JsonRpcError;
use crate::{BroadcastResponse, ChainTransport, ProviderError};
use async_trait::async_trait;
use ledger_core::{types::BroadcastMode, utils::tx_hash};
use serde::Serialize;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};
use thiserror::Error;

/// A request observed by the [`MockTransport`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockRequest {
    Query { path: String, data: Vec<u8> },
    Broadcast { tx: Vec<u8>, mode: BroadcastMode },
}

#[derive(Debug, Default)]
struct MockState {
    requests: Mutex<Vec<MockRequest>>,
    queries: Mutex<VecDeque<Result<Vec<u8>, JsonRpcError>>>,
    broadcasts: Mutex<VecDeque<Result<BroadcastResponse, JsonRpcError>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Clone, Debug, Default)]
/// Mock transport used in test environments.
///
/// Query and broadcast responses are scripted separately and served in the
/// order they were pushed. Every request is recorded so tests can assert on
/// what reached the "node". Clones share state.
pub struct MockTransport {
    state: Arc<MockState>,
    latency: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Instantiates a mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Every broadcast sleeps for `latency` before answering
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Pushes a raw query answer
    pub fn push_query(&self, data: impl Into<Vec<u8>>) {
        lock(&self.state.queries).push_back(Ok(data.into()));
    }

    /// Pushes a query answer serialized as JSON
    pub fn push_query_json<T: Serialize>(&self, data: &T) -> Result<(), MockError> {
        let data = serde_json::to_vec(data)?;
        self.push_query(data);
        Ok(())
    }

    /// Makes the next query fail with `error`
    pub fn push_query_error(&self, error: JsonRpcError) {
        lock(&self.state.queries).push_back(Err(error));
    }

    /// Pushes the node's answer to the next broadcast
    pub fn push_broadcast(&self, response: BroadcastResponse) {
        lock(&self.state.broadcasts).push_back(Ok(response));
    }

    /// Makes the next broadcast fail at the transport level with `error`
    pub fn push_broadcast_error(&self, error: JsonRpcError) {
        lock(&self.state.broadcasts).push_back(Err(error));
    }

    /// All requests made so far, oldest first
    pub fn requests(&self) -> Vec<MockRequest> {
        lock(&self.state.requests).clone()
    }

    /// The encoded transactions broadcast so far, oldest first
    pub fn broadcast_txs(&self) -> Vec<Vec<u8>> {
        lock(&self.state.requests)
            .iter()
            .filter_map(|req| match req {
                MockRequest::Broadcast { tx, .. } => Some(tx.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn query_count(&self) -> usize {
        lock(&self.state.requests).iter().filter(|r| matches!(r, MockRequest::Query { .. })).count()
    }

    pub fn broadcast_count(&self) -> usize {
        lock(&self.state.requests)
            .iter()
            .filter(|r| matches!(r, MockRequest::Broadcast { .. }))
            .count()
    }

    /// Scripted responses not consumed yet, as `(queries, broadcasts)`
    pub fn pending(&self) -> (usize, usize) {
        (lock(&self.state.queries).len(), lock(&self.state.broadcasts).len())
    }

    /// The highest number of broadcasts that were in progress at once
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainTransport for MockTransport {
    async fn query(&self, path: &str, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        lock(&self.state.requests).push(MockRequest::Query { path: path.to_owned(), data });
        let next = lock(&self.state.queries).pop_front();
        match next {
            Some(Ok(data)) => Ok(data),
            Some(Err(err)) => Err(MockError::JsonRpcError(err).into()),
            None => Err(MockError::EmptyResponses("query").into()),
        }
    }

    async fn broadcast(
        &self,
        tx: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<BroadcastResponse, ProviderError> {
        let hash = tx_hash(&tx);
        lock(&self.state.requests).push(MockRequest::Broadcast { tx, mode });

        let current = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        let next = lock(&self.state.broadcasts).pop_front();
        match next {
            Some(Ok(mut response)) => {
                if response.hash.is_empty() {
                    response.hash = hash;
                }
                Ok(response)
            }
            Some(Err(err)) => Err(MockError::JsonRpcError(err).into()),
            None => Err(MockError::EmptyResponses("broadcast").into()),
        }
    }
}

#[derive(Error, Debug)]
/// Errors for the `MockTransport`
pub enum MockError {
    /// (De)Serialization error
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// No scripted response left
    #[error("empty {0} responses, please push some responses")]
    EmptyResponses(&'static str),

    /// Custom JsonRpcError
    #[error("JSON-RPC error: {0}")]
    JsonRpcError(JsonRpcError),
}

impl crate::RpcError for MockError {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            MockError::JsonRpcError(e) => Some(e),
            _ => None,
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            MockError::SerdeJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MockError> for ProviderError {
    fn from(src: MockError) -> Self {
        ProviderError::JsonRpcClientError(Box::new(src))
    }
}
