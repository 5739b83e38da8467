//! Protocol-level constants shared across the workspace.

/// Default namespace of EBICS 2.5 (H004) documents.
pub const NS_EBICS_H004: &str = "urn:org:ebics:H004";

/// Default namespace of EBICS 3.0 (H005) documents.
pub const NS_EBICS_H005: &str = "urn:org:ebics:H005";

/// Maximum size of one encrypted order data segment before Base64 wrapping.
pub const SEGMENT_SIZE: usize = 1024 * 1024;

/// Length in bytes of the request nonce.
pub const NONCE_LEN: usize = 16;

/// Length in bytes of the AES-128 transaction (session) key.
pub const TRANSACTION_KEY_LEN: usize = 16;

/// A bank-assigned transaction ID is 8 bytes, rendered as 16 hex characters.
pub const TRANSACTION_ID_HEX_LEN: usize = 16;

/// Accepted RSA modulus sizes in bits.
pub const RSA_MIN_BITS: usize = 2048;
pub const RSA_MAX_BITS: usize = 4096;

/// `SecurityMedium` value for software-held keys.
pub const SECURITY_MEDIUM_SOFTWARE: &str = "0000";
