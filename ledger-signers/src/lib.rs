//! Provides a unified interface for resolving sender names to addresses and
//! signing the bytes of a sign doc.
//!
//! You can implement the [`KeyManager`] trait to extend functionality to other
//! key stores such as Hardware Security Modules, KMS etc.
//!
//! Supported backends:
//! - [`LocalKeyring`]: raw secp256k1 keys held in memory
//! - [`KeystoreKeyring`]: password-encrypted JSON keystore files on disk
//!
//! ```no_run
//! use ledger_signers::{KeyManager, LocalKeyring};
//!
//! # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! let keyring = LocalKeyring::new();
//! keyring.import_hex("alice", "dcf2cbdd171a21c480aa7f53d77f31bb102282b3ff099c78e3118b37348c72f7")?;
//!
//! let address = keyring.resolve("alice", "").await?;
//! let signature = keyring.sign(&address, "", b"sign doc bytes").await?;
//! signature.verify(b"sign doc bytes")?;
//! # Ok(())
//! # }
//! ```
mod wallet;
pub use wallet::{Keyring, LocalKeyring};

#[cfg(not(target_arch = "wasm32"))]
pub use wallet::KeystoreKeyring;

mod signature;
pub use signature::Signature;

mod error;
pub use error::KeyringError;

use async_trait::async_trait;
use ledger_core::types::Address;
use std::error::Error;

/// Trait for resolving senders and signing on their behalf
///
/// Implement this trait to support different key stores. The submission
/// pipeline resolves a sender once per call and then signs one sign doc per
/// transaction attempt.
#[async_trait]
pub trait KeyManager: std::fmt::Debug + Send + Sync {
    type Error: Error + Send + Sync + 'static;

    /// Returns the address of the key `name`, checking `password` if the
    /// backend protects its keys with one
    async fn resolve(&self, name: &str, password: &str) -> Result<Address, Self::Error>;

    /// Signs `message` with the key owning `address`
    async fn sign(
        &self,
        address: &Address,
        password: &str,
        message: &[u8],
    ) -> Result<Signature, Self::Error>;
}
