use aes::Aes128;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use crate::CryptoError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// The EBICS transaction-key mode prescribes a zero IV: the key is fresh per
/// transaction, so the IV carries no entropy.
const ZERO_IV: [u8; 16] = [0u8; 16];

/// AES-128-CBC encrypt with PKCS#7 padding and zero IV.
pub fn encrypt_aes_cbc(key: &[u8; 16], plain: &[u8]) -> Vec<u8> {
    Aes128CbcEnc::new(key.into(), &ZERO_IV.into()).encrypt_padded_vec_mut::<Pkcs7>(plain)
}

/// AES-128-CBC decrypt with PKCS#7 padding and zero IV.
pub fn decrypt_aes_cbc(key: &[u8; 16], cipher: &[u8]) -> Result<Vec<u8>, CryptoError> {
    Aes128CbcDec::new(key.into(), &ZERO_IV.into())
        .decrypt_padded_vec_mut::<Pkcs7>(cipher)
        .map_err(|_| CryptoError::Cipher)
}

/// RSA-wrap the 16-byte transaction key for the bank (PKCS#1 v1.5 padding).
pub fn wrap_key(bank_crypt: &RsaPublicKey, key: &[u8; 16]) -> Result<Vec<u8>, CryptoError> {
    Ok(bank_crypt.encrypt(&mut OsRng, Pkcs1v15Encrypt, key)?)
}

/// Unwrap a bank-supplied transaction key with our encryption private key.
pub fn unwrap_key(crypt: &RsaPrivateKey, wrapped: &[u8]) -> Result<[u8; 16], CryptoError> {
    let plain = crypt.decrypt(Pkcs1v15Encrypt, wrapped)?;
    plain
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Cipher)
}
