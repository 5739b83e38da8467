use std::fmt;

use crate::error::EbicsError;

/// A six-digit EBICS return code, parsed to its integer value.
///
/// Return codes are data, not errors: the caller inspects them on the typed
/// response record. Only transport/crypto/protocol failures raise
/// [`EbicsError`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ReturnCode(pub u32);

impl ReturnCode {
    pub const OK: ReturnCode = ReturnCode(0);
    /// Positive acknowledgement of a completed download (receipt phase).
    pub const DOWNLOAD_POSTPROCESS_DONE: ReturnCode = ReturnCode(11_000);
    pub const DOWNLOAD_POSTPROCESS_SKIPPED: ReturnCode = ReturnCode(11_001);
    pub const TX_SEGMENT_NUMBER_UNDERRUN: ReturnCode = ReturnCode(11_101);
    pub const AUTHENTICATION_FAILED: ReturnCode = ReturnCode(61_001);
    pub const INVALID_REQUEST_CONTENT: ReturnCode = ReturnCode(61_002);
    pub const INVALID_ORDER_DATA_FORMAT: ReturnCode = ReturnCode(90_004);
    pub const TX_UNKNOWN_TXID: ReturnCode = ReturnCode(91_101);
    pub const TX_MESSAGE_REPLAY: ReturnCode = ReturnCode(91_103);
    pub const TX_SEGMENT_NUMBER_EXCEEDED: ReturnCode = ReturnCode(91_104);
    pub const USER_UNKNOWN: ReturnCode = ReturnCode(91_003);

    /// Parse the zero-padded six-digit wire form, e.g. `"000000"` or `"011000"`.
    pub fn parse(s: &str) -> Result<Self, EbicsError> {
        let trimmed = s.trim();
        trimmed
            .parse::<u32>()
            .map(ReturnCode)
            .map_err(|_| EbicsError::MalformedResponse(format!("bad return code {trimmed:?}")))
    }

    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }

    /// Success or an advisory that requires no action from the caller.
    pub fn is_success(&self) -> bool {
        self.is_ok() || *self == Self::DOWNLOAD_POSTPROCESS_DONE
    }

    /// Codes in the 011xxx band report recovery synchronisation state.
    /// They are surfaced as data; the engine never retries on its own.
    pub fn is_recovery_sync(&self) -> bool {
        (11_000..12_000).contains(&self.0)
    }

    /// Symbolic name for the well-known codes, if any.
    pub fn name(&self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "EBICS_OK",
            11_000 => "EBICS_DOWNLOAD_POSTPROCESS_DONE",
            11_001 => "EBICS_DOWNLOAD_POSTPROCESS_SKIPPED",
            11_101 => "EBICS_TX_SEGMENT_NUMBER_UNDERRUN",
            61_001 => "EBICS_AUTHENTICATION_FAILED",
            61_002 => "EBICS_INVALID_REQUEST_CONTENT",
            90_004 => "EBICS_INVALID_ORDER_DATA_FORMAT",
            91_003 => "EBICS_USER_UNKNOWN",
            91_101 => "EBICS_TX_UNKNOWN_TXID",
            91_103 => "EBICS_TX_MESSAGE_REPLAY",
            91_104 => "EBICS_TX_SEGMENT_NUMBER_EXCEEDED",
            _ => return None,
        })
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{:06} ({name})", self.0),
            None => write!(f, "{:06}", self.0),
        }
    }
}

// ── OrderStatus ──────────────────────────────────────────────────────────────

/// The bank's verdict on one order, common to every typed response record.
#[derive(Clone, Debug)]
pub struct OrderStatus {
    /// `header/mutable/ReturnCode` of the final response.
    pub technical_code: ReturnCode,
    /// `body/ReturnCode` of the final response, when present.
    pub business_code: Option<ReturnCode>,
    pub report_text: String,
    /// Bank-assigned order ID, set on accepted uploads.
    pub order_id: Option<String>,
}

impl OrderStatus {
    /// Both codes are success (or an informational advisory).
    pub fn is_success(&self) -> bool {
        self.technical_code.is_success()
            && self.business_code.map(|c| c.is_success()).unwrap_or(true)
    }
}
