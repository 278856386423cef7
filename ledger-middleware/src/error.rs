use ledger_core::{codec::CodecError, types::{TxResponse, ValidationError}};
use ledger_providers::{BroadcastError, ProviderError};
use std::{error::Error, fmt, time::Duration};
use thiserror::Error;

type BoxError = Box<dyn Error + Send + Sync>;

/// The category of a [`SubmitError`], for callers that branch on the cause
/// rather than on the details.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A message failed its stateless checks, or there was nothing to submit
    Validation,
    /// The sender name or password was not accepted by the key manager
    Resolution,
    /// The sender's account could not be read from the chain
    Sequencing,
    /// The key manager failed to sign
    Signing,
    /// A single message encodes above the transaction size limit
    SizeExceeded,
    /// The chain kept reporting a stale sequence
    StaleSequenceExhausted,
    /// The node could not be reached or answered garbage
    Transport,
    /// The node refused the transaction
    Rejected,
    /// The broadcast deadline passed
    Timeout,
    /// A sign doc or transaction could not be encoded
    Encoding,
    /// The submission panicked and was contained
    Panic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Error)]
/// Thrown when a submission stops before every chunk was broadcast
pub enum SubmitError {
    #[error("no messages to submit")]
    NoMessages,

    #[error("message {index} is invalid: {source}")]
    Validation {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("could not resolve sender `{name}`: {source}")]
    Resolution {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("could not read account {address}: {source}")]
    Sequencing {
        address: String,
        #[source]
        source: ProviderError,
    },

    #[error("signing failed: {0}")]
    Signing(#[source] BoxError),

    #[error(transparent)]
    Encoding(#[from] CodecError),

    #[error("message {index} encodes to {size} bytes on its own, above the limit of {limit}")]
    SizeExceeded { index: usize, size: usize, limit: usize },

    #[error("sequence still stale after {attempts} attempts: {source}")]
    StaleSequenceExhausted {
        attempts: u32,
        #[source]
        source: BroadcastError,
    },

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error("gas simulation failed: {0}")]
    Simulation(#[source] ProviderError),

    #[error("submission panicked: {0}")]
    Panic(String),
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::NoMessages | SubmitError::Validation { .. } => ErrorKind::Validation,
            SubmitError::Resolution { .. } => ErrorKind::Resolution,
            SubmitError::Sequencing { .. } => ErrorKind::Sequencing,
            SubmitError::Signing(_) => ErrorKind::Signing,
            SubmitError::Encoding(_) => ErrorKind::Encoding,
            SubmitError::SizeExceeded { .. } => ErrorKind::SizeExceeded,
            SubmitError::StaleSequenceExhausted { .. } => ErrorKind::StaleSequenceExhausted,
            SubmitError::Broadcast(BroadcastError::Transport(_)) |
            SubmitError::Simulation(_) => ErrorKind::Transport,
            SubmitError::Broadcast(BroadcastError::Rejected { .. }) => ErrorKind::Rejected,
            SubmitError::Broadcast(BroadcastError::Timeout(_)) => ErrorKind::Timeout,
            SubmitError::Panic(_) => ErrorKind::Panic,
        }
    }

    /// The last node error behind a broadcast failure, if there was one
    pub fn broadcast_error(&self) -> Option<&BroadcastError> {
        match self {
            SubmitError::Broadcast(err) | SubmitError::StaleSequenceExhausted { source: err, .. } => {
                Some(err)
            }
            _ => None,
        }
    }

    /// The deadline that passed, if the broadcast timed out. The transaction
    /// may still have been executed.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            SubmitError::Broadcast(BroadcastError::Timeout(timeout)) => Some(*timeout),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SubmitError {
    fn from(src: serde_json::Error) -> Self {
        SubmitError::Encoding(src.into())
    }
}

/// A failed submission together with the transactions that made it onto the
/// chain before the failure, in submission order.
#[derive(Debug, Error)]
#[error("{error} ({} transactions completed before the failure)", .completed.len())]
pub struct SubmitFailure {
    #[source]
    pub error: SubmitError,
    pub completed: Vec<TxResponse>,
}

impl SubmitFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl From<SubmitError> for SubmitFailure {
    fn from(error: SubmitError) -> Self {
        Self { error, completed: Vec::new() }
    }
}
