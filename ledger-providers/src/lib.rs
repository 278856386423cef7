#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]
//! # Clients for interacting with ledger nodes
//!
//! This crate provides the [`ChainTransport`] abstraction the submission
//! pipeline talks to, an [HTTP JSON-RPC implementation](crate::Http), a
//! scriptable [`MockTransport`] for tests, the deadline-enforcing
//! [`Broadcaster`] and the expiring [`MemoryCache`].
//!
//! ```no_run
//! use ledger_core::types::BroadcastMode;
//! use ledger_providers::{Broadcaster, Http};
//! use std::{str::FromStr, time::Duration};
//!
//! # async fn foo(signed_tx: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let http = Http::from_str("http://localhost:26657")?;
//! let broadcaster = Broadcaster::new(http, Duration::from_secs(30));
//! let response = broadcaster.send(signed_tx, BroadcastMode::Commit).await?;
//! println!("included at height {}", response.height);
//! # Ok(())
//! # }
//! ```
mod transports;
pub use transports::*;

mod errors;
pub use errors::{ProviderError, RpcError};

mod broadcaster;
pub use broadcaster::{BroadcastError, Broadcaster, CODE_TX_TOO_LARGE, CODE_WRONG_SEQUENCE};

mod cache;
pub use cache::{Cache, MemoryCache};

mod response;
pub use response::BroadcastResponse;

use async_trait::async_trait;
use auto_impl::auto_impl;
use ledger_core::types::BroadcastMode;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

#[async_trait]
#[auto_impl(&, Box, Arc)]
/// Trait which must be implemented by data transports to reach a ledger node.
///
/// Both calls may fail with a transport-level error. A node that receives a
/// broadcast but refuses the transaction does *not* fail the call: it returns
/// a [`BroadcastResponse`] with a non-zero code, which the [`Broadcaster`]
/// turns into [`BroadcastError::Rejected`].
pub trait ChainTransport: Debug + Send + Sync {
    /// Runs a read-only query against the node's application state
    async fn query(&self, path: &str, data: Vec<u8>) -> Result<Vec<u8>, ProviderError>;

    /// Submits an encoded transaction, waiting as long as `mode` requires
    async fn broadcast(
        &self,
        tx: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<BroadcastResponse, ProviderError>;
}

/// Serializes `params` as JSON, queries `path` and decodes the JSON answer
pub async fn query_json<T, P, R>(transport: &T, path: &str, params: &P) -> Result<R, ProviderError>
where
    T: ChainTransport + ?Sized,
    P: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let data = serde_json::to_vec(params)?;
    let raw = transport.query(path, data).await?;
    Ok(serde_json::from_slice(&raw)?)
}
