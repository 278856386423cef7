use ledger_core::types::Address;
use thiserror::Error;

#[derive(Error, Debug)]
/// Error thrown by the key managers
pub enum KeyringError {
    /// No key is stored under this name
    #[error("no key named `{0}`")]
    UnknownKey(String),
    /// No resolved key owns this address
    #[error("no key for address {0}")]
    UnknownAddress(Address),
    /// A key is already stored under this name
    #[error("a key named `{0}` already exists")]
    DuplicateKey(String),
    /// The name cannot be used as a key file name
    #[error("invalid key name `{0}`")]
    InvalidName(String),
    /// The key could not be decrypted with the given password
    #[error("wrong password for key `{0}`")]
    WrongPassword(String),
    /// The signature does not match the message and public key
    #[error("signature verification failed")]
    InvalidSignature,
    /// Underlying eth keystore error
    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    EthKeystoreError(#[from] eth_keystore::KeystoreError),
    /// Error propagated from k256's ECDSA module
    #[error(transparent)]
    EcdsaError(#[from] k256::ecdsa::Error),
    /// Error propagated from the hex crate.
    #[error(transparent)]
    HexError(#[from] hex::FromHexError),
    /// Error propagated by IO operations
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
