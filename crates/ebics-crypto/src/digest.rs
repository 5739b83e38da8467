use sha2::{Digest, Sha256};

/// SHA-256 of arbitrary bytes → 32-byte array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// The EBICS public-key digest.
///
/// SHA-256 over the ASCII string `"<exponent> <modulus>"`, where both numbers
/// are lowercase hex of the big-endian unsigned integer with all leading zero
/// digits removed. Exponent 0x010001 therefore contributes `10001`, not
/// `010001`.
pub fn public_key_digest(exponent: &[u8], modulus: &[u8]) -> [u8; 32] {
    let formatted = format!("{} {}", hex_no_leading_zeros(exponent), hex_no_leading_zeros(modulus));
    sha256(formatted.as_bytes())
}

fn hex_no_leading_zeros(number: &[u8]) -> String {
    let encoded = hex::encode(number);
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
