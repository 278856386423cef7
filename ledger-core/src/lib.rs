#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]
//! # Ledger Core
//!
//! Shared data types for the ledger client: addresses, accounts, fees, the
//! [`Msg`](crate::types::Msg) abstraction implemented by every business module,
//! the sign-doc / transaction envelope and the [`TxCodec`](crate::codec::TxCodec)
//! used to turn them into bytes.
//!
//! ```
//! use ledger_core::{
//!     codec::{JsonCodec, TxCodec},
//!     types::{Fee, Msg, RawMsg, StdSignDoc},
//! };
//! use serde_json::json;
//!
//! let msgs: Vec<Box<dyn Msg>> =
//!     vec![Box::new(RawMsg::new("bank/MsgSend", json!({ "amount": "10" })))];
//! let doc = StdSignDoc::new("test-chain", 7, 3, Fee::new(200_000), "", &msgs).unwrap();
//! let bytes = JsonCodec.encode_sign_doc(&doc).unwrap();
//! assert!(!bytes.is_empty());
//! ```

/// Ledger data types
pub mod types;

/// Encoding of sign docs and transactions
pub mod codec;

/// Hashing and formatting helpers
pub mod utils;
