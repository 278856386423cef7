#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # ledger
//!
//! A client for submitting transactions to a remote ledger node. Messages
//! from any number of concurrent callers are grouped into transactions,
//! given the right account sequence, signed and broadcast, with bounded
//! retries when the chain reports a stale sequence.
//!
//! The crate is a facade over its members:
//!
//! - [`core`]: addresses, accounts, fees, messages and the transaction codec
//! - [`providers`]: node transports, the broadcaster and the account cache
//! - [`signers`]: key managers resolving sender names and signing sign docs
//! - [`middleware`]: the locker, the sequencer, the batch planner and the
//!   submitter tying them together
//!
//! ```no_run
//! use ledger::prelude::*;
//! use serde_json::json;
//! use std::str::FromStr;
//!
//! # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = LocalKeyring::new();
//! keys.import_hex("alice", "dcf2cbdd171a21c480aa7f53d77f31bb102282b3ff099c78e3118b37348c72f7")?;
//!
//! let transport = Http::from_str("http://localhost:26657")?;
//! let submitter = Submitter::new(transport, keys, SubmitterConfig::new("testnet-1"));
//!
//! let msgs: Vec<Box<dyn Msg>> =
//!     vec![Box::new(RawMsg::new("bank/MsgSend", json!({ "to": "bob", "amount": "10" })))];
//! for response in submitter.submit(&msgs, &SubmitParams::new("alice", "")).await? {
//!     println!("{} at height {}", response.hash, response.height);
//! }
//! # Ok(())
//! # }
//! ```

#[doc(inline)]
pub use ledger_core as core;

#[doc(inline)]
pub use ledger_providers as providers;

#[doc(inline)]
pub use ledger_signers as signers;

#[doc(inline)]
pub use ledger_middleware as middleware;

/// Easy imports of frequently used type definitions and traits.
pub mod prelude {
    pub use super::core::{codec::*, types::*};

    pub use super::providers::*;

    pub use super::signers::*;

    pub use super::middleware::*;
}
