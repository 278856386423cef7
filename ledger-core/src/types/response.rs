use super::serde_helpers::stringified_u64;
use serde::{Deserialize, Serialize};

/// A key / value pair emitted during execution
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// An execution event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// The outcome of a transaction that reached the ledger.
///
/// Depending on the broadcast mode only some fields are populated: an async
/// broadcast yields the hash alone, a sync broadcast adds the admission
/// result, a commit broadcast adds the block height and execution results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    pub hash: String,
    #[serde(with = "stringified_u64")]
    pub height: u64,
    #[serde(with = "stringified_u64")]
    pub gas_wanted: u64,
    #[serde(with = "stringified_u64")]
    pub gas_used: u64,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub log: String,
}

impl TxResponse {
    /// Returns the value of the first attribute `key` in the first event of `kind`
    pub fn attribute(&self, kind: &str, key: &str) -> Option<&str> {
        self.events
            .iter()
            .filter(|event| event.kind == kind)
            .flat_map(|event| event.attributes.iter())
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }
}
