//! Password-encrypted keys stored as JSON keystore files, one file per name.
use super::{check_name, key_to_address, sign_bytes};
use crate::{KeyManager, KeyringError, Signature};
use async_trait::async_trait;
use dashmap::DashMap;
use eth_keystore::KeystoreError;
use k256::ecdsa::SigningKey;
use ledger_core::types::Address;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keys encrypted at rest in a directory of keystore files.
///
/// Every [`KeyManager::resolve`] and [`KeyManager::sign`] call decrypts the
/// key file with the caller's password; decrypted keys are never retained.
/// `sign` only accepts addresses previously returned by `resolve`.
#[derive(Debug)]
pub struct KeystoreKeyring {
    dir: PathBuf,
    owners: DashMap<Address, String>,
}

impl KeystoreKeyring {
    /// Opens (creating if needed) the keystore directory `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, KeyringError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, owners: DashMap::new() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> Result<PathBuf, KeyringError> {
        check_name(name)?;
        Ok(self.dir.join(name))
    }

    /// Creates a random key encrypted with `password` under `name`
    pub fn new_key(&self, name: &str, password: &str) -> Result<Address, KeyringError> {
        if self.path(name)?.exists() {
            return Err(KeyringError::DuplicateKey(name.to_owned()))
        }
        let (secret, _uuid) =
            eth_keystore::new(&self.dir, &mut rand::thread_rng(), password, Some(name))?;
        let key = SigningKey::from_bytes(&secret)?;
        let address = key_to_address(&key);
        self.owners.insert(address, name.to_owned());
        Ok(address)
    }

    /// Encrypts an existing key with `password` and stores it under `name`
    pub fn import(
        &self,
        name: &str,
        key: &SigningKey,
        password: &str,
    ) -> Result<Address, KeyringError> {
        if self.path(name)?.exists() {
            return Err(KeyringError::DuplicateKey(name.to_owned()))
        }
        eth_keystore::encrypt_key(
            &self.dir,
            &mut rand::thread_rng(),
            key.to_bytes(),
            password,
            Some(name),
        )?;
        let address = key_to_address(key);
        self.owners.insert(address, name.to_owned());
        Ok(address)
    }

    fn decrypt(&self, name: &str, password: &str) -> Result<SigningKey, KeyringError> {
        let path = self.path(name)?;
        if !path.exists() {
            return Err(KeyringError::UnknownKey(name.to_owned()))
        }
        let secret = match eth_keystore::decrypt_key(&path, password) {
            Ok(secret) => secret,
            Err(KeystoreError::MacMismatch) => {
                return Err(KeyringError::WrongPassword(name.to_owned()))
            }
            Err(err) => return Err(err.into()),
        };
        Ok(SigningKey::from_bytes(&secret)?)
    }
}

#[async_trait]
impl KeyManager for KeystoreKeyring {
    type Error = KeyringError;

    async fn resolve(&self, name: &str, password: &str) -> Result<Address, Self::Error> {
        let key = self.decrypt(name, password)?;
        let address = key_to_address(&key);
        self.owners.insert(address, name.to_owned());
        debug!(name, %address, "resolved keystore key");
        Ok(address)
    }

    async fn sign(
        &self,
        address: &Address,
        password: &str,
        message: &[u8],
    ) -> Result<Signature, Self::Error> {
        let name = self
            .owners
            .get(address)
            .map(|name| name.value().clone())
            .ok_or(KeyringError::UnknownAddress(*address))?;
        let key = self.decrypt(&name, password)?;
        if key_to_address(&key) != *address {
            // the file was replaced since it was resolved
            return Err(KeyringError::UnknownAddress(*address))
        }
        Ok(sign_bytes(&key, message))
    }
}
