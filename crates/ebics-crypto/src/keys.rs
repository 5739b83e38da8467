use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use ebics_core::constants::{RSA_MAX_BITS, RSA_MIN_BITS};
use ebics_core::types::KeyVersion;

use crate::digest::public_key_digest;
use crate::CryptoError;

/// One user RSA key pair with its EBICS role tag.
///
/// Keys are loaded from PEM supplied by the caller; an optional DER X.509
/// certificate rides along for banks that distribute certificates instead of
/// bare keys.
#[derive(Clone)]
pub struct KeyPair {
    pub version: KeyVersion,
    key: RsaPrivateKey,
    pub timestamp: DateTime<Utc>,
    pub certificate: Option<Vec<u8>>,
}

impl KeyPair {
    /// Wrap an already-decoded RSA private key. Rejects moduli outside the
    /// 2048–4096 bit range EBICS allows.
    pub fn new(version: KeyVersion, key: RsaPrivateKey) -> Result<Self, CryptoError> {
        let bits = key.size() * 8;
        if !(RSA_MIN_BITS..=RSA_MAX_BITS).contains(&bits) {
            return Err(CryptoError::KeyDecode(format!(
                "{version} key is {bits} bit; EBICS allows {RSA_MIN_BITS}-{RSA_MAX_BITS}"
            )));
        }
        Ok(Self {
            version,
            key,
            timestamp: Utc::now(),
            certificate: None,
        })
    }

    /// Load a PKCS#8 or PKCS#1 PEM private key.
    pub fn from_pem(version: KeyVersion, pem: &str) -> Result<Self, CryptoError> {
        let key = match RsaPrivateKey::from_pkcs8_pem(pem) {
            Ok(key) => key,
            Err(_) => RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|e| CryptoError::KeyDecode(format!("{version}: {e}")))?,
        };
        Self::new(version, key)
    }

    pub fn with_certificate(mut self, der: Vec<u8>) -> Self {
        self.certificate = Some(der);
        self
    }

    pub fn private(&self) -> &RsaPrivateKey {
        &self.key
    }

    pub fn public(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }

    /// Big-endian modulus without leading zero bytes.
    pub fn modulus_bytes(&self) -> Vec<u8> {
        self.key.n().to_bytes_be()
    }

    /// Big-endian public exponent without leading zero bytes.
    pub fn exponent_bytes(&self) -> Vec<u8> {
        self.key.e().to_bytes_be()
    }

    /// The EBICS public-key digest of this pair's public half.
    pub fn digest(&self) -> [u8; 32] {
        public_key_digest(&self.exponent_bytes(), &self.modulus_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "KeyPair({}, {} bit{})",
            self.version,
            self.key.size() * 8,
            if self.certificate.is_some() { ", with cert" } else { "" }
        )
    }
}

/// Rebuild an RSA public key from the raw big-endian parameters a bank
/// announces in HPB order data.
pub fn public_key_from_raw(modulus: &[u8], exponent: &[u8]) -> Result<RsaPublicKey, CryptoError> {
    Ok(RsaPublicKey::new(
        BigUint::from_bytes_be(modulus),
        BigUint::from_bytes_be(exponent),
    )?)
}

/// Decode the DER body of a PEM `CERTIFICATE` block.
pub fn certificate_from_pem(pem: &str) -> Result<Vec<u8>, CryptoError> {
    let body: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    BASE64
        .decode(body.trim())
        .map_err(|e| CryptoError::KeyDecode(format!("certificate: {e}")))
}
