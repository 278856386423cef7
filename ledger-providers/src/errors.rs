use std::{error::Error, fmt::Debug};
use thiserror::Error;

use crate::JsonRpcError;

/// An `RpcError` is an abstraction over error types returned by a
/// [`crate::ChainTransport`] implementation.
///
/// All transports can return [`JsonRpcError`] responses, as well as serde
/// deserialization errors. Because transport errors are type-erased via the
/// [`ProviderError`], this trait provides access to the underlying error.
pub trait RpcError: Error + Debug + Send + Sync {
    /// Access an underlying JSON-RPC error (if any)
    fn as_error_response(&self) -> Option<&JsonRpcError>;

    /// Returns `true` if the underlying error is a JSON-RPC error response
    fn is_error_response(&self) -> bool {
        self.as_error_response().is_some()
    }

    /// Access an underlying `serde_json` error (if any)
    fn as_serde_error(&self) -> Option<&serde_json::Error>;

    /// Returns `true` if the underlying error is a serde_json (de)serialization
    /// error.
    fn is_serde_error(&self) -> bool {
        self.as_serde_error().is_some()
    }
}

#[derive(Debug, Error)]
/// An error thrown when talking to a ledger node
pub enum ProviderError {
    /// An internal error in the transport, type-erased
    #[error("{0}")]
    JsonRpcClientError(Box<dyn RpcError + Send + Sync>),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    HexError(#[from] hex::FromHexError),

    #[error(transparent)]
    Base64Error(#[from] base64::DecodeError),

    #[error(transparent)]
    HTTPError(#[from] reqwest::Error),

    /// The node answered the query with a non-zero code
    #[error("query `{path}` failed with code {code}: {log}")]
    QueryFailed { path: String, code: u32, log: String },

    #[error("custom error: {0}")]
    CustomError(String),
}

impl RpcError for ProviderError {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        if let ProviderError::JsonRpcClientError(err) = self {
            err.as_error_response()
        } else {
            None
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            ProviderError::JsonRpcClientError(e) => e.as_serde_error(),
            ProviderError::SerdeJson(e) => Some(e),
            _ => None,
        }
    }
}
