use base64::{engine::general_purpose, Engine};
use sha2::{Digest, Sha256};

/// SHA-256 digest of `bytes`
pub fn sha256(bytes: impl AsRef<[u8]>) -> [u8; 32] {
    Sha256::digest(bytes.as_ref()).into()
}

/// The hash a node reports for a transaction: uppercase hex of the SHA-256
/// of its encoded bytes.
pub fn tx_hash(tx: impl AsRef<[u8]>) -> String {
    hex::encode_upper(sha256(tx))
}

/// Standard base64 with padding
pub fn base64_encode(bytes: impl AsRef<[u8]>) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decodes standard base64 with padding
pub fn base64_decode(s: impl AsRef<[u8]>) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}
