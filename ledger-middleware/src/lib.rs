#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]
//! # Ledger Middleware
//!
//! The submission pipeline between application code and a ledger node. A
//! [`Submitter`] takes a list of messages and a named sender and produces
//! correctly sequenced, correctly sized, signed transactions:
//!
//! - [`AccountLocker`]: serializes work per sender so that at most one
//!   transaction per account is between sequencing and broadcast
//! - [`AccountSequencer`]: caches account numbers and sequences, and drops
//!   them when the chain reports them stale
//! - [`BatchPlanner`]: splits long message lists into ordered chunks and
//!   shrinks them when a transaction turns out too large
//! - [`Submitter`]: drives every chunk through sequencing, signing and
//!   broadcast, retrying stale sequences a bounded number of times
//!
//! ```no_run
//! use ledger_core::types::{BroadcastMode, Msg, RawMsg};
//! use ledger_middleware::{ErrorKind, SubmitParams, Submitter, SubmitterConfig};
//! use ledger_providers::Http;
//! use ledger_signers::LocalKeyring;
//! use serde_json::json;
//! use std::str::FromStr;
//!
//! # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = LocalKeyring::new();
//! keys.import_hex("alice", "dcf2cbdd171a21c480aa7f53d77f31bb102282b3ff099c78e3118b37348c72f7")?;
//!
//! let config = SubmitterConfig::new("testnet-1").max_msgs_per_chunk(20);
//! let submitter = Submitter::new(Http::from_str("http://localhost:26657")?, keys, config);
//!
//! let msgs: Vec<Box<dyn Msg>> = (0..50)
//!     .map(|i| {
//!         let msg = RawMsg::new("bank/MsgSend", json!({ "to": "bob", "amount": i.to_string() }));
//!         Box::new(msg) as Box<dyn Msg>
//!     })
//!     .collect();
//! let params = SubmitParams::new("alice", "").mode(BroadcastMode::Sync);
//!
//! match submitter.submit(&msgs, &params).await {
//!     Ok(responses) => println!("{} transactions", responses.len()),
//!     Err(failure) if failure.kind() == ErrorKind::Timeout => {
//!         // the last transaction may still land
//!         println!("{} transactions confirmed before the timeout", failure.completed.len());
//!     }
//!     Err(failure) => return Err(failure.into()),
//! }
//! # Ok(())
//! # }
//! ```

mod config;
pub use config::SubmitterConfig;

mod error;
pub use error::{ErrorKind, SubmitError, SubmitFailure};

/// Per-sender mutual exclusion
pub mod locker;
pub use locker::{AccountLocker, LockHandle};

/// Cached account sequences
pub mod sequencer;
pub use sequencer::AccountSequencer;

/// Chunking of message lists
pub mod planner;
pub use planner::{BatchPlanner, Chunk};

mod submitter;
pub use submitter::{SubmitParams, Submitter, DEFAULT_GAS};
