mod local;
pub use local::LocalKeyring;

#[cfg(not(target_arch = "wasm32"))]
mod keystore;
#[cfg(not(target_arch = "wasm32"))]
pub use keystore::KeystoreKeyring;

use crate::{KeyManager, KeyringError, Signature};
use async_trait::async_trait;
use k256::{
    ecdsa::{signature::Signer as _, Signature as K256Signature, SigningKey},
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey as K256PublicKey,
};
use ledger_core::types::Address;

/// SEC1 compressed encoding of the key's public half
pub(crate) fn public_key_bytes(key: &SigningKey) -> Vec<u8> {
    let public_key = K256PublicKey::from(&key.verifying_key());
    public_key.to_encoded_point(/* compress = */ true).as_bytes().to_vec()
}

pub(crate) fn key_to_address(key: &SigningKey) -> Address {
    Address::from_public_key(&public_key_bytes(key))
}

pub(crate) fn sign_bytes(key: &SigningKey, message: &[u8]) -> Signature {
    let signature: K256Signature = key.sign(message);
    Signature { public_key: public_key_bytes(key), signature: signature.as_ref().to_vec() }
}

/// Names end up as file names in the keystore backend, keep them flat
pub(crate) fn check_name(name: &str) -> Result<(), KeyringError> {
    let invalid = name.is_empty() ||
        name.starts_with('.') ||
        name.contains(|c: char| c == '/' || c == '\\' || c.is_control());
    if invalid {
        return Err(KeyringError::InvalidName(name.to_owned()))
    }
    Ok(())
}

/// A key manager whose backend is chosen once, at construction time.
///
/// Useful when the backend comes from configuration; code that knows its
/// backend statically can use [`LocalKeyring`] or [`KeystoreKeyring`]
/// directly.
#[derive(Debug)]
pub enum Keyring {
    Local(LocalKeyring),
    #[cfg(not(target_arch = "wasm32"))]
    Keystore(KeystoreKeyring),
}

impl From<LocalKeyring> for Keyring {
    fn from(src: LocalKeyring) -> Self {
        Keyring::Local(src)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<KeystoreKeyring> for Keyring {
    fn from(src: KeystoreKeyring) -> Self {
        Keyring::Keystore(src)
    }
}

#[async_trait]
impl KeyManager for Keyring {
    type Error = KeyringError;

    async fn resolve(&self, name: &str, password: &str) -> Result<Address, Self::Error> {
        match self {
            Keyring::Local(keys) => keys.resolve(name, password).await,
            #[cfg(not(target_arch = "wasm32"))]
            Keyring::Keystore(keys) => keys.resolve(name, password).await,
        }
    }

    async fn sign(
        &self,
        address: &Address,
        password: &str,
        message: &[u8],
    ) -> Result<Signature, Self::Error> {
        match self {
            Keyring::Local(keys) => keys.sign(address, password, message).await,
            #[cfg(not(target_arch = "wasm32"))]
            Keyring::Keystore(keys) => keys.sign(address, password, message).await,
        }
    }
}
