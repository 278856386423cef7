use super::{serde_helpers::stringified_u64, Fee, Msg};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// How long a broadcast waits before returning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastMode {
    /// Fire-and-forget: returns with the hash only, nothing is guaranteed
    Async,
    /// Returns once the node has admitted the transaction to its mempool
    Sync,
    /// Returns once the transaction is included in a block and executed
    #[default]
    Commit,
}

impl fmt::Display for BroadcastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BroadcastMode::Async => "async",
            BroadcastMode::Sync => "sync",
            BroadcastMode::Commit => "commit",
        };
        f.write_str(s)
    }
}

/// Thrown when parsing an unknown broadcast mode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown broadcast mode `{0}`, expected one of async, sync, commit")]
pub struct ParseModeError(String);

impl FromStr for BroadcastMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "async" => Ok(BroadcastMode::Async),
            "sync" => Ok(BroadcastMode::Sync),
            "commit" | "block" => Ok(BroadcastMode::Commit),
            _ => Err(ParseModeError(s.to_owned())),
        }
    }
}

/// A message tagged with its type, as embedded in sign docs and transactions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypedMsg {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub value: Value,
}

impl TypedMsg {
    pub fn from_msg(msg: &dyn Msg) -> Result<Self, serde_json::Error> {
        Ok(Self { msg_type: msg.msg_type().to_owned(), value: msg.to_value()? })
    }
}

/// The document a sender signs. Binds the messages to the chain, the
/// account number and the sequence so a signature cannot be replayed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StdSignDoc {
    #[serde(with = "stringified_u64")]
    pub account_number: u64,
    pub chain_id: String,
    pub fee: Fee,
    pub memo: String,
    pub msgs: Vec<TypedMsg>,
    #[serde(with = "stringified_u64")]
    pub sequence: u64,
}

impl StdSignDoc {
    pub fn new(
        chain_id: impl Into<String>,
        account_number: u64,
        sequence: u64,
        fee: Fee,
        memo: impl Into<String>,
        msgs: &[Box<dyn Msg>],
    ) -> Result<Self, serde_json::Error> {
        let msgs =
            msgs.iter().map(|msg| TypedMsg::from_msg(msg.as_ref())).collect::<Result<_, _>>()?;
        Ok(Self {
            account_number,
            chain_id: chain_id.into(),
            fee,
            memo: memo.into(),
            msgs,
            sequence,
        })
    }
}

/// A signature over a [`StdSignDoc`] together with the key that produced it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignature {
    /// Base64 of the compressed public key
    pub pub_key: String,
    /// Base64 of the 64-byte signature
    pub signature: String,
    #[serde(with = "stringified_u64")]
    pub account_number: u64,
    #[serde(with = "stringified_u64")]
    pub sequence: u64,
}

/// A signed transaction ready to be encoded and broadcast
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StdTx {
    pub msg: Vec<TypedMsg>,
    pub fee: Fee,
    pub signatures: Vec<StdSignature>,
    pub memo: String,
}

impl StdTx {
    /// Assembles the transaction from the signed doc and its signature
    pub fn new(doc: StdSignDoc, signature: StdSignature) -> Self {
        Self { msg: doc.msgs, fee: doc.fee, signatures: vec![signature], memo: doc.memo }
    }

    /// The sequence of the first signer, if any
    pub fn sequence(&self) -> Option<u64> {
        self.signatures.first().map(|sig| sig.sequence)
    }
}
