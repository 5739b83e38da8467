use thiserror::Error;

use crate::types::{KeyVersion, TransactionPhase};

/// Library-level error taxonomy.
///
/// Bank-reported return codes are not errors: they are carried in the typed
/// response records for the caller to inspect. Everything here aborts the
/// current transaction.
#[derive(Debug, Error)]
pub enum EbicsError {
    // ── Configuration ────────────────────────────────────────────────────────
    #[error("bank keys unknown; run HPB first")]
    BankKeysMissing,

    #[error("{version} key pair is not usable: {reason}")]
    KeyUnusable { version: KeyVersion, reason: String },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    // ── Request construction ─────────────────────────────────────────────────
    #[error("building request: {0}")]
    CreateRequest(String),

    // ── Transport ────────────────────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(String),

    #[error("bank endpoint returned HTTP status {status}")]
    HttpStatus { status: u16 },

    // ── Protocol ─────────────────────────────────────────────────────────────
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("response authentication signature did not verify")]
    SignatureVerification,

    #[error("unexpected transaction phase: expected {expected}, got {got}")]
    UnexpectedPhase {
        expected: TransactionPhase,
        got: TransactionPhase,
    },

    #[error("segment numbering gap: expected segment {expected}, got {got}")]
    SegmentGap { expected: u32, got: u32 },

    #[error("initialisation response carried no transaction ID")]
    TransactionIdMissing,

    // ── Crypto ───────────────────────────────────────────────────────────────
    #[error("crypto: {0}")]
    Crypto(String),

    // ── Order data ───────────────────────────────────────────────────────────
    #[error("deserializing order data: {0}")]
    Deserialization(String),
}
