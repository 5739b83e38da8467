use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::CryptoError;

/// Sign `message` with SHA-256 / RSASSA-PKCS1-v1_5 (the EBICS A005/X002
/// scheme). A006 (PSS) is out of scope.
pub fn sign(key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let signing_key = SigningKey::<Sha256>::new(key.clone());
    let signature = signing_key
        .try_sign(message)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(signature.to_vec())
}

/// Verify a SHA-256 / PKCS#1 v1.5 signature. Malformed input verifies false.
pub fn verify(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let verifying_key = VerifyingKey::<Sha256>::new(key.clone());
    match Signature::try_from(signature) {
        Ok(sig) => verifying_key.verify(message, &sig).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::OnceLock;

    fn test_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| {
            RsaPrivateKey::new(&mut StdRng::seed_from_u64(42), 2048).unwrap()
        })
    }

    #[test]
    fn sign_verify_round_trip() {
        let key = test_key();
        let message = b"ebics request to be authenticated";

        let sig = sign(key, message).unwrap();
        assert!(verify(&key.to_public_key(), message, &sig));
    }

    #[test]
    fn tampered_message_fails() {
        let key = test_key();
        let sig = sign(key, b"original").unwrap();
        assert!(!verify(&key.to_public_key(), b"tampered", &sig));
    }

    #[test]
    fn garbage_signature_fails() {
        let key = test_key();
        assert!(!verify(&key.to_public_key(), b"message", b"not a signature"));
    }
}
