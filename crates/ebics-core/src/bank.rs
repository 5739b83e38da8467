use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::KeyVersion;

/// One bank public key as announced via HPB: raw RSA parameters plus the
/// EBICS public-key digest the bank expects to see echoed in
/// `BankPubKeyDigests`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankPublicKey {
    pub version: KeyVersion,
    /// Big-endian modulus, leading zero bytes trimmed.
    #[serde(with = "hex")]
    pub modulus: Vec<u8>,
    /// Big-endian public exponent, leading zero bytes trimmed.
    #[serde(with = "hex")]
    pub exponent: Vec<u8>,
    #[serde(with = "hex")]
    pub digest: [u8; 32],
}

impl fmt::Debug for BankPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BankPublicKey({}, {} bit, digest {}…)",
            self.version,
            self.modulus.len() * 8,
            &hex::encode(self.digest)[..16]
        )
    }
}

/// The bank's authentication (X002) and encryption (E002) public keys.
///
/// `None` on a fresh config; populated once by a successful HPB and treated
/// as read-only afterwards.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BankKeys {
    pub auth: BankPublicKey,
    pub crypt: BankPublicKey,
}
