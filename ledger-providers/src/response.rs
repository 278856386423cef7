use ledger_core::types::{Event, TxResponse};
use serde::{Deserialize, Serialize};

/// What a node reports after receiving a broadcast.
///
/// A zero `code` means the transaction was accepted for the requested
/// broadcast mode; any other value is a rejection qualified by `codespace`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub hash: String,
    pub height: u64,
    pub code: u32,
    pub codespace: String,
    pub log: String,
    pub gas_wanted: u64,
    pub gas_used: u64,
    pub events: Vec<Event>,
}

impl BroadcastResponse {
    /// An accepted broadcast with the given hash
    pub fn accepted(hash: impl Into<String>) -> Self {
        Self { hash: hash.into(), ..Default::default() }
    }

    /// A rejected broadcast
    pub fn rejected(code: u32, codespace: impl Into<String>, log: impl Into<String>) -> Self {
        Self { code, codespace: codespace.into(), log: log.into(), ..Default::default() }
    }

    #[must_use]
    pub fn height(mut self, height: u64) -> Self {
        self.height = height;
        self
    }

    #[must_use]
    pub fn gas(mut self, wanted: u64, used: u64) -> Self {
        self.gas_wanted = wanted;
        self.gas_used = used;
        self
    }

    #[must_use]
    pub fn event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Drops the rejection fields, keeping what the caller cares about for an
    /// accepted transaction
    pub fn into_tx_response(self) -> TxResponse {
        TxResponse {
            hash: self.hash,
            height: self.height,
            gas_wanted: self.gas_wanted,
            gas_used: self.gas_used,
            events: self.events,
            log: self.log,
        }
    }
}
