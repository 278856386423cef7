use super::{check_name, key_to_address, sign_bytes};
use crate::{KeyManager, KeyringError, Signature};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use k256::ecdsa::SigningKey;
use ledger_core::types::Address;
use std::fmt;

/// Raw secp256k1 keys held in memory, looked up by name.
///
/// Keys are stored unencrypted, so the password arguments of [`KeyManager`]
/// are ignored by this backend.
#[derive(Default)]
pub struct LocalKeyring {
    keys: DashMap<String, SigningKey>,
    owners: DashMap<Address, String>,
}

impl LocalKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `key` under `name`, returning its address
    pub fn insert(&self, name: impl Into<String>, key: SigningKey) -> Result<Address, KeyringError> {
        let name = name.into();
        check_name(&name)?;
        let address = key_to_address(&key);
        match self.keys.entry(name.clone()) {
            Entry::Occupied(_) => return Err(KeyringError::DuplicateKey(name)),
            Entry::Vacant(entry) => {
                entry.insert(key);
            }
        }
        self.owners.insert(address, name);
        Ok(address)
    }

    /// Generates a fresh random key under `name`
    pub fn generate(&self, name: impl Into<String>) -> Result<Address, KeyringError> {
        let key = SigningKey::random(&mut rand::thread_rng());
        self.insert(name, key)
    }

    /// Imports a hex-encoded private key under `name`
    pub fn import_hex(&self, name: impl Into<String>, secret: &str) -> Result<Address, KeyringError> {
        let secret = hex::decode(secret.strip_prefix("0x").unwrap_or(secret))?;
        let key = SigningKey::from_bytes(&secret)?;
        self.insert(name, key)
    }

    /// Exports the private key stored under `name` as hex
    pub fn export_hex(&self, name: &str) -> Result<String, KeyringError> {
        let key = self.keys.get(name).ok_or_else(|| KeyringError::UnknownKey(name.to_owned()))?;
        Ok(hex::encode(key.to_bytes()))
    }

    /// Forgets the key stored under `name`
    pub fn remove(&self, name: &str) -> Option<Address> {
        let (_, key) = self.keys.remove(name)?;
        let address = key_to_address(&key);
        self.owners.remove(&address);
        Some(address)
    }

    /// Names of all stored keys
    pub fn names(&self) -> Vec<String> {
        self.keys.iter().map(|entry| entry.key().clone()).collect()
    }
}

// do not log the keys
impl fmt::Debug for LocalKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeyring").field("names", &self.names()).finish()
    }
}

#[async_trait]
impl KeyManager for LocalKeyring {
    type Error = KeyringError;

    async fn resolve(&self, name: &str, _password: &str) -> Result<Address, Self::Error> {
        let key = self.keys.get(name).ok_or_else(|| KeyringError::UnknownKey(name.to_owned()))?;
        Ok(key_to_address(key.value()))
    }

    async fn sign(
        &self,
        address: &Address,
        _password: &str,
        message: &[u8],
    ) -> Result<Signature, Self::Error> {
        let name = self
            .owners
            .get(address)
            .map(|name| name.value().clone())
            .ok_or(KeyringError::UnknownAddress(*address))?;
        let key = self.keys.get(&name).ok_or(KeyringError::UnknownKey(name))?;
        Ok(sign_bytes(key.value(), message))
    }
}
