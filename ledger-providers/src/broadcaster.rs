use crate::{ChainTransport, JsonRpcError, ProviderError, RpcError};
use ledger_core::types::{BroadcastMode, TxResponse};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Code the ledger uses for a signature over the wrong account sequence
pub const CODE_WRONG_SEQUENCE: u32 = 32;

/// Code the ledger uses for a transaction above its size limit
pub const CODE_TX_TOO_LARGE: u32 = 21;

const STALE_SEQUENCE_LOGS: [&str; 2] = ["account sequence mismatch", "incorrect account sequence"];
const TOO_LARGE_LOGS: [&str; 2] = ["tx too large", "tx too big"];

#[derive(Debug, Error)]
/// Thrown when a broadcast does not yield an accepted transaction
pub enum BroadcastError {
    /// The transport failed: the node was unreachable or answered garbage
    #[error(transparent)]
    Transport(#[from] ProviderError),

    /// The node received the transaction and refused it
    #[error("transaction {hash} rejected with code {code} ({codespace}): {log}")]
    Rejected { hash: String, code: u32, codespace: String, log: String },

    /// The deadline passed before the node answered
    #[error("broadcast did not complete within {0:?}")]
    Timeout(Duration),
}

fn mentions(text: &str, needles: &[&str]) -> bool {
    let text = text.to_ascii_lowercase();
    needles.iter().any(|needle| text.contains(needle))
}

impl BroadcastError {
    /// The node's rejection code, if the node rejected the transaction
    pub fn code(&self) -> Option<u32> {
        match self {
            BroadcastError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    fn rpc_error(&self) -> Option<&JsonRpcError> {
        match self {
            BroadcastError::Transport(err) => err.as_error_response(),
            _ => None,
        }
    }

    /// Returns `true` if the node refused the transaction because its
    /// sequence does not match the account's current sequence
    pub fn is_stale_sequence(&self) -> bool {
        match self {
            BroadcastError::Rejected { code, codespace, log, .. } => {
                (*code == CODE_WRONG_SEQUENCE && (codespace.is_empty() || codespace == "sdk")) ||
                    mentions(log, &STALE_SEQUENCE_LOGS)
            }
            _ => self.rpc_error().map_or(false, |err| mentions(&err.detail(), &STALE_SEQUENCE_LOGS)),
        }
    }

    /// Returns `true` if the node refused the transaction for its size
    pub fn is_too_large(&self) -> bool {
        match self {
            BroadcastError::Rejected { code, codespace, log, .. } => {
                (*code == CODE_TX_TOO_LARGE && (codespace.is_empty() || codespace == "sdk")) ||
                    mentions(log, &TOO_LARGE_LOGS)
            }
            _ => self.rpc_error().map_or(false, |err| mentions(&err.detail(), &TOO_LARGE_LOGS)),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BroadcastError::Timeout(_))
    }
}

/// Submits encoded transactions under a broadcast mode and a deadline.
///
/// The deadline bounds how long the caller waits, not what the node does:
/// when it passes, the in-flight call is dropped, but a transaction that
/// already reached the node may still be admitted and executed afterwards.
/// Callers that retry after a [`BroadcastError::Timeout`] must be prepared for
/// the first attempt to land.
#[derive(Debug, Clone)]
pub struct Broadcaster<T> {
    transport: T,
    timeout: Duration,
}

impl<T: ChainTransport> Broadcaster<T> {
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `tx`, returning the node's result if it accepted the transaction
    #[instrument(skip(self, tx), fields(bytes = tx.len()))]
    pub async fn send(
        &self,
        tx: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<TxResponse, BroadcastError> {
        let response = tokio::time::timeout(self.timeout, self.transport.broadcast(tx, mode))
            .await
            .map_err(|_| BroadcastError::Timeout(self.timeout))??;

        if !response.is_ok() {
            debug!(code = response.code, codespace = %response.codespace, "broadcast rejected");
            return Err(BroadcastError::Rejected {
                hash: response.hash,
                code: response.code,
                codespace: response.codespace,
                log: response.log,
            })
        }

        debug!(hash = %response.hash, height = response.height, "broadcast accepted");
        Ok(response.into_tx_response())
    }
}
