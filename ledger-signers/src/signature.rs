use crate::KeyringError;
use k256::ecdsa::{signature::Verifier, Signature as K256Signature, VerifyingKey};
use ledger_core::{
    types::{Address, StdSignature},
    utils::base64_encode,
};
use std::fmt;

/// A secp256k1 signature together with the compressed public key that made it
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    /// 33-byte SEC1 compressed public key
    pub public_key: Vec<u8>,
    /// 64-byte `r || s`
    pub signature: Vec<u8>,
}

impl Signature {
    /// The address owned by the signing key
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// Verifies the signature over `message`
    pub fn verify(&self, message: impl AsRef<[u8]>) -> Result<(), KeyringError> {
        let key = VerifyingKey::from_sec1_bytes(&self.public_key)?;
        let signature = K256Signature::try_from(self.signature.as_slice())?;
        key.verify(message.as_ref(), &signature).map_err(|_| KeyringError::InvalidSignature)
    }

    /// The transaction-envelope form of this signature
    pub fn to_std_signature(&self, account_number: u64, sequence: u64) -> StdSignature {
        StdSignature {
            pub_key: base64_encode(&self.public_key),
            signature: base64_encode(&self.signature),
            account_number,
            sequence,
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("public_key", &hex::encode(&self.public_key))
            .field("signature", &hex::encode(&self.signature))
            .finish()
    }
}
