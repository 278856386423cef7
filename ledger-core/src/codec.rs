use crate::types::{StdSignDoc, StdTx};
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error)]
/// Thrown when encoding or decoding sign docs and transactions
pub enum CodecError {
    /// (De)Serialization error
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    /// Error raised by a custom codec
    #[error("{0}")]
    Custom(String),
}

/// Turns sign docs and transactions into the bytes that are signed and
/// broadcast.
///
/// The encoding of a sign doc must be deterministic: the same doc always
/// yields the same bytes, otherwise signatures cannot be verified by the node.
pub trait TxCodec: Debug + Send + Sync {
    /// Encodes the bytes a signer signs
    fn encode_sign_doc(&self, doc: &StdSignDoc) -> Result<Vec<u8>, CodecError>;

    /// Encodes a signed transaction for broadcast
    fn encode_tx(&self, tx: &StdTx) -> Result<Vec<u8>, CodecError>;

    /// Decodes a transaction previously produced by [`TxCodec::encode_tx`]
    fn decode_tx(&self, bytes: &[u8]) -> Result<StdTx, CodecError>;
}

/// Canonical JSON encoding: object keys sorted, no insignificant whitespace.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl JsonCodec {
    fn canonical<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        // `serde_json::Map` is ordered by key, so going through `Value` sorts
        // nested objects regardless of struct field order
        let value = serde_json::to_value(value)?;
        Ok(serde_json::to_vec(&value)?)
    }
}

impl TxCodec for JsonCodec {
    fn encode_sign_doc(&self, doc: &StdSignDoc) -> Result<Vec<u8>, CodecError> {
        Self::canonical(doc)
    }

    fn encode_tx(&self, tx: &StdTx) -> Result<Vec<u8>, CodecError> {
        Self::canonical(tx)
    }

    fn decode_tx(&self, bytes: &[u8]) -> Result<StdTx, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
