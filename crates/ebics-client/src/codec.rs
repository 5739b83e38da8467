//! Order-data codec: zlib → AES-128-CBC under a fresh session key → ≤1 MiB
//! segments → Base64, with the session key RSA-wrapped for the bank; plus the
//! plain zlib+Base64 form used by unsecured key management orders.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::RsaPublicKey;
use zeroize::Zeroizing;

use ebics_core::constants::SEGMENT_SIZE;
use ebics_core::EbicsError;
use ebics_crypto::{
    decrypt_aes_cbc, deflate, encrypt_aes_cbc, inflate, transaction_key, unwrap_key, wrap_key,
    KeyPair,
};

use crate::response::decode_b64;

/// Result of encoding an upload payload: Base64 segments ready for
/// `OrderData` plus the wrapped session key for `DataEncryptionInfo`.
pub struct EncodedOrderData {
    pub segments: Vec<String>,
    pub transaction_key_b64: String,
}

impl EncodedOrderData {
    pub fn num_segments(&self) -> u32 {
        self.segments.len() as u32
    }
}

/// Encode an upload payload under a freshly generated transaction key.
pub fn encode(plain: &[u8], bank_crypt: &RsaPublicKey) -> Result<EncodedOrderData, EbicsError> {
    let key: Zeroizing<[u8; 16]> = transaction_key();
    let compressed = deflate(plain)?;
    let encrypted = encrypt_aes_cbc(&key, &compressed);
    let segments = encrypted
        .chunks(SEGMENT_SIZE)
        .map(|chunk| BASE64.encode(chunk))
        .collect();
    let wrapped = wrap_key(bank_crypt, &key)?;
    Ok(EncodedOrderData {
        segments,
        transaction_key_b64: BASE64.encode(wrapped),
    })
}

/// Decode a download: Base64 segments in ascending order, the bank's wrapped
/// session key, and our encryption private key.
pub fn decode<'a>(
    segments: impl IntoIterator<Item = &'a str>,
    wrapped_key: &[u8],
    crypt_key: &KeyPair,
) -> Result<Vec<u8>, EbicsError> {
    let key = unwrap_key(crypt_key.private(), wrapped_key)?;
    let mut encrypted = Vec::new();
    for segment in segments {
        encrypted.extend(decode_b64(segment)?);
    }
    let compressed = decrypt_aes_cbc(&key, &encrypted)?;
    Ok(inflate(&compressed)?)
}

/// zlib + Base64 without encryption, for `ebicsUnsecuredRequest` order data.
pub fn encode_unsecured(plain: &[u8]) -> Result<String, EbicsError> {
    Ok(BASE64.encode(deflate(plain)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebics_core::types::KeyVersion;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use rsa::RsaPrivateKey;
    use std::sync::OnceLock;

    fn crypt_key() -> &'static KeyPair {
        static KEY: OnceLock<KeyPair> = OnceLock::new();
        KEY.get_or_init(|| {
            let key = RsaPrivateKey::new(&mut StdRng::seed_from_u64(11), 2048).unwrap();
            KeyPair::new(KeyVersion::E002, key).unwrap()
        })
    }

    #[test]
    fn encode_decode_round_trip() {
        let payload = b"<Document>a pain.001 credit transfer</Document>".to_vec();
        let encoded = encode(&payload, &crypt_key().public()).unwrap();
        assert_eq!(encoded.num_segments(), 1);

        let wrapped = decode_b64(&encoded.transaction_key_b64).unwrap();
        let decoded = decode(
            encoded.segments.iter().map(String::as_str),
            &wrapped,
            crypt_key(),
        )
        .unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn incompressible_payloads_split_into_segments() {
        // Random bytes do not deflate, so 2.5 MiB of them must span 3 segments.
        let mut payload = vec![0u8; 5 * SEGMENT_SIZE / 2];
        StdRng::seed_from_u64(12).fill_bytes(&mut payload);

        let encoded = encode(&payload, &crypt_key().public()).unwrap();
        assert_eq!(encoded.num_segments(), 3);

        let wrapped = decode_b64(&encoded.transaction_key_b64).unwrap();
        let decoded = decode(
            encoded.segments.iter().map(String::as_str),
            &wrapped,
            crypt_key(),
        )
        .unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn empty_payload_still_produces_one_segment() {
        let encoded = encode(b"", &crypt_key().public()).unwrap();
        assert_eq!(encoded.num_segments(), 1);
    }

    #[test]
    fn wrong_key_fails_to_decode() {
        let payload = b"statement".to_vec();
        let encoded = encode(&payload, &crypt_key().public()).unwrap();
        let wrapped = decode_b64(&encoded.transaction_key_b64).unwrap();

        let other = KeyPair::new(
            KeyVersion::E002,
            RsaPrivateKey::new(&mut StdRng::seed_from_u64(13), 2048).unwrap(),
        )
        .unwrap();
        assert!(decode(
            encoded.segments.iter().map(String::as_str),
            &wrapped,
            &other
        )
        .is_err());
    }
}
