use chrono::Utc;
use rand::RngCore;
use zeroize::Zeroizing;

use ebics_core::constants::{NONCE_LEN, TRANSACTION_KEY_LEN};

/// Fresh 16-byte request nonce (hex-uppercased by the request builder).
pub fn nonce() -> [u8; NONCE_LEN] {
    let mut out = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut out);
    out
}

/// Fresh 16-byte AES-128 transaction key, wiped on drop.
pub fn transaction_key() -> Zeroizing<[u8; TRANSACTION_KEY_LEN]> {
    let mut out = Zeroizing::new([0u8; TRANSACTION_KEY_LEN]);
    rand::rngs::OsRng.fill_bytes(out.as_mut());
    out
}

/// Current UTC time in the EBICS wire format `yyyy-MM-ddTHH:mm:ss.fffZ`.
pub fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_differ() {
        assert_ne!(nonce(), nonce());
    }

    #[test]
    fn timestamp_has_millisecond_precision() {
        let ts = utc_timestamp();
        // e.g. 2026-08-01T12:34:56.789Z
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[19..20], ".");
    }
}
