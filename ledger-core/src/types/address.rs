use crate::utils::sha256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A 20-byte account address.
///
/// Addresses are derived from the compressed secp256k1 public key of the
/// account's signing key (see [`Address::from_public_key`]) and render as
/// lowercase hex without a prefix.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; Address::LEN]);

/// Thrown when parsing an [`Address`] from a string or byte slice
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseAddressError {
    /// The input was not valid hex
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    /// The input decoded to the wrong number of bytes
    #[error("expected {expected} address bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

impl Address {
    /// Length of an address in bytes
    pub const LEN: usize = 20;

    /// Builds an address from exactly [`Address::LEN`] bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseAddressError> {
        let inner: [u8; Self::LEN] = bytes.try_into().map_err(|_| {
            ParseAddressError::InvalidLength { expected: Self::LEN, got: bytes.len() }
        })?;
        Ok(Self(inner))
    }

    /// Derives the address owned by a compressed public key: the first 20
    /// bytes of its SHA-256 digest.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = sha256(public_key);
        let mut inner = [0u8; Self::LEN];
        inner.copy_from_slice(&digest[..Self::LEN]);
        Self(inner)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; Address::LEN]> for Address {
    fn from(src: [u8; Address::LEN]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
