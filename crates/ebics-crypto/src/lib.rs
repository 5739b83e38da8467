//! ebics-crypto
//!
//! The cryptographic primitives EBICS mandates: RSA PKCS#1 v1.5 for
//! signatures and session-key wrapping, AES-128-CBC with an all-zero IV for
//! order data, zlib compression, SHA-256 digests, and the EBICS public-key
//! digest rule. Keys are supplied by the caller (PEM); key generation is out
//! of scope.

pub mod cipher;
pub mod compress;
pub mod digest;
pub mod keys;
pub mod random;
pub mod signing;

pub use cipher::{decrypt_aes_cbc, encrypt_aes_cbc, unwrap_key, wrap_key};
pub use compress::{deflate, inflate};
pub use digest::{public_key_digest, sha256};
pub use keys::{certificate_from_pem, public_key_from_raw, KeyPair};
pub use random::{nonce, transaction_key, utc_timestamp};
pub use signing::{sign, verify};

use ebics_core::EbicsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("rsa: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("signing: {0}")]
    Signing(String),

    #[error("decoding key material: {0}")]
    KeyDecode(String),

    #[error("bad AES padding or ciphertext length")]
    Cipher,

    #[error("zlib: {0}")]
    Zlib(String),
}

impl From<CryptoError> for EbicsError {
    fn from(e: CryptoError) -> Self {
        EbicsError::Crypto(e.to_string())
    }
}
