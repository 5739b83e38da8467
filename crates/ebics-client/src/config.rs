use ebics_core::types::{KeyVersion, SchemaVersion, UserIdent};
use ebics_core::{BankKeys, EbicsError};
use ebics_crypto::KeyPair;

/// Immutable per-client settings, constructed by the caller.
///
/// The bank key slot starts out `None` on a fresh subscription and is
/// populated by the first successful HPB; callers that persisted bank keys
/// elsewhere may seed it up front.
#[derive(Debug, Clone)]
pub struct EbicsConfig {
    /// Bank endpoint URL (HTTPS POST target).
    pub url: String,
    pub version: SchemaVersion,
    pub revision: u32,
    /// Accept invalid TLS certificates. Test systems only.
    pub tls_insecure: bool,
    pub user: UserIdent,
    /// Order signature key (A005).
    pub sign_key: KeyPair,
    /// Authentication key (X002).
    pub auth_key: KeyPair,
    /// Encryption key (E002).
    pub crypt_key: KeyPair,
    pub bank: Option<BankKeys>,
}

impl EbicsConfig {
    /// Check identifiers and key/role assignments before any transaction.
    pub fn validate(&self) -> Result<(), EbicsError> {
        if self.url.is_empty() {
            return Err(EbicsError::Configuration("bank URL is empty".into()));
        }
        for (name, value) in [
            ("HostID", &self.user.host_id),
            ("PartnerID", &self.user.partner_id),
            ("UserID", &self.user.user_id),
        ] {
            if value.is_empty() {
                return Err(EbicsError::Configuration(format!("{name} is empty")));
            }
        }
        for (expected, key) in [
            (KeyVersion::A005, &self.sign_key),
            (KeyVersion::X002, &self.auth_key),
            (KeyVersion::E002, &self.crypt_key),
        ] {
            if key.version != expected {
                return Err(EbicsError::KeyUnusable {
                    version: key.version,
                    reason: format!("configured in the {expected} slot"),
                });
            }
        }
        Ok(())
    }
}
