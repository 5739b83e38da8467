use serde::{Deserialize, Serialize};
use std::fmt;

// ── SchemaVersion ────────────────────────────────────────────────────────────

/// Major version of the EBICS XML schema spoken on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SchemaVersion {
    H004,
    H005,
}

impl SchemaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::H004 => "H004",
            SchemaVersion::H005 => "H005",
        }
    }

    /// Default namespace of request/response documents for this version.
    pub fn namespace(&self) -> &'static str {
        match self {
            SchemaVersion::H004 => crate::constants::NS_EBICS_H004,
            SchemaVersion::H005 => crate::constants::NS_EBICS_H005,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── KeyVersion ───────────────────────────────────────────────────────────────

/// EBICS key version tag: which of the three user keys a key pair is.
///
/// A005 = order signature, X002 = authentication, E002 = encryption.
/// A006 (RSASSA-PSS) is deliberately not modelled.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum KeyVersion {
    A005,
    X002,
    E002,
}

impl KeyVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyVersion::A005 => "A005",
            KeyVersion::X002 => "X002",
            KeyVersion::E002 => "E002",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A005" => Some(KeyVersion::A005),
            "X002" => Some(KeyVersion::X002),
            "E002" => Some(KeyVersion::E002),
            _ => None,
        }
    }
}

impl fmt::Display for KeyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── OrderType ────────────────────────────────────────────────────────────────

/// Three-letter EBICS order type code.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OrderType {
    /// Announce the order signature public key (A005).
    Ini,
    /// Announce the authentication and encryption public keys (X002/E002).
    Hia,
    /// Download the bank's public keys.
    Hpb,
    /// Download bank parameters (supported versions, capabilities).
    Hpd,
    /// Download the customer protocol log.
    Ptk,
    /// Download an account statement (MT940).
    Sta,
    /// Upload a SEPA credit transfer (pain.001).
    Cct,
    /// Upload a SEPA direct debit (pain.008).
    Cdd,
    /// Suspend the user's access (signed space upload).
    Spr,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Ini => "INI",
            OrderType::Hia => "HIA",
            OrderType::Hpb => "HPB",
            OrderType::Hpd => "HPD",
            OrderType::Ptk => "PTK",
            OrderType::Sta => "STA",
            OrderType::Cct => "CCT",
            OrderType::Cdd => "CDD",
            OrderType::Spr => "SPR",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── OrderAttribute ───────────────────────────────────────────────────────────

/// EBICS order attribute: whether the order carries signature and/or data.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OrderAttribute {
    /// Download, no signature, no order data in the request.
    Dzhnn,
    /// Upload with electronic signature and order data.
    Ozhnn,
    /// Upload where the signature itself is the order data.
    Uzhnn,
    /// Key management upload, unsigned (INI/HIA).
    Dznnn,
}

impl OrderAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAttribute::Dzhnn => "DZHNN",
            OrderAttribute::Ozhnn => "OZHNN",
            OrderAttribute::Uzhnn => "UZHNN",
            OrderAttribute::Dznnn => "DZNNN",
        }
    }
}

impl fmt::Display for OrderAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Transaction direction and phase ──────────────────────────────────────────

/// Direction of order data flow for one EBICS transaction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransactionDirection {
    Upload,
    Download,
}

/// Phase of the EBICS transaction dialog, as spelled in `TransactionPhase`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransactionPhase {
    Initialisation,
    Transfer,
    Receipt,
}

impl TransactionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionPhase::Initialisation => "Initialisation",
            TransactionPhase::Transfer => "Transfer",
            TransactionPhase::Receipt => "Receipt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Initialisation" => Some(TransactionPhase::Initialisation),
            "Transfer" => Some(TransactionPhase::Transfer),
            "Receipt" => Some(TransactionPhase::Receipt),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── UserIdent ────────────────────────────────────────────────────────────────

/// The triple identifying one EBICS subscriber at one bank host.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UserIdent {
    pub host_id: String,
    pub partner_id: String,
    pub user_id: String,
}

impl UserIdent {
    pub fn new(
        host_id: impl Into<String>,
        partner_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            host_id: host_id.into(),
            partner_id: partner_id.into(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for UserIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host_id, self.partner_id, self.user_id)
    }
}
