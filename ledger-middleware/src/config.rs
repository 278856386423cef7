use crate::locker::DEFAULT_LOCK_SHARDS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables of the [`Submitter`](crate::Submitter).
///
/// Every field has a default, so a configuration file only needs to name what
/// it changes:
///
/// ```
/// use ledger_middleware::SubmitterConfig;
///
/// let config: SubmitterConfig =
///     serde_json::from_str(r#"{ "chain_id": "testnet-1", "try_threshold": 5 }"#).unwrap();
/// assert_eq!(config.try_threshold, 5);
/// assert_eq!(config.max_msgs_per_chunk, 10);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitterConfig {
    /// Chain the sign docs are bound to
    pub chain_id: String,
    /// Upper bound on messages per transaction
    pub max_msgs_per_chunk: usize,
    /// Upper bound on the encoded size of one transaction
    pub max_tx_bytes: usize,
    /// Attempts per chunk before a stale sequence is given up on
    pub try_threshold: u32,
    /// How long a cached account stays valid
    pub account_ttl_secs: u64,
    /// Deadline of one broadcast
    pub broadcast_timeout_ms: u64,
    /// Number of account lock shards
    pub lock_shards: usize,
    /// Multiplier applied to simulated gas
    pub gas_adjustment: f64,
    /// Query path returning an account's number and sequence
    pub account_query_path: String,
    /// Query path simulating an encoded transaction
    pub simulate_path: String,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            chain_id: String::new(),
            max_msgs_per_chunk: 10,
            max_tx_bytes: 1024 * 1024,
            try_threshold: 3,
            account_ttl_secs: 60,
            broadcast_timeout_ms: 30_000,
            lock_shards: DEFAULT_LOCK_SHARDS,
            gas_adjustment: 1.0,
            account_query_path: "custom/auth/account".to_owned(),
            simulate_path: "/app/simulate".to_owned(),
        }
    }
}

impl SubmitterConfig {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self { chain_id: chain_id.into(), ..Default::default() }
    }

    #[must_use]
    pub fn max_msgs_per_chunk(mut self, count: usize) -> Self {
        self.max_msgs_per_chunk = count;
        self
    }

    #[must_use]
    pub fn max_tx_bytes(mut self, bytes: usize) -> Self {
        self.max_tx_bytes = bytes;
        self
    }

    #[must_use]
    pub fn try_threshold(mut self, attempts: u32) -> Self {
        self.try_threshold = attempts;
        self
    }

    #[must_use]
    pub fn account_ttl(mut self, ttl: Duration) -> Self {
        self.account_ttl_secs = ttl.as_secs();
        self
    }

    #[must_use]
    pub fn broadcast_timeout(mut self, timeout: Duration) -> Self {
        self.broadcast_timeout_ms = timeout.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn lock_shards(mut self, shards: usize) -> Self {
        self.lock_shards = shards;
        self
    }

    #[must_use]
    pub fn gas_adjustment(mut self, adjustment: f64) -> Self {
        self.gas_adjustment = adjustment;
        self
    }

    pub fn account_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.account_ttl_secs)
    }

    pub fn broadcast_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.broadcast_timeout_ms)
    }

    /// `max_msgs_per_chunk` and `try_threshold` of zero would never submit
    /// anything; both are treated as one.
    pub(crate) fn effective_max_msgs(&self) -> usize {
        self.max_msgs_per_chunk.max(1)
    }

    pub(crate) fn effective_try_threshold(&self) -> u32 {
        self.try_threshold.max(1)
    }
}
