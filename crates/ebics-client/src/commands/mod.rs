//! One command object per EBICS order type.
//!
//! A command binds its order type, attribute and direction, knows how to
//! build the three phase requests (via the shared [`RequestFactory`]) and how
//! to turn the transaction outcome into its typed response.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ebics_core::return_code::OrderStatus;
use ebics_core::types::{OrderAttribute, OrderType, TransactionDirection};
use ebics_core::EbicsError;
use ebics_xml::names::{DATE_END, DATE_RANGE, DATE_START, STANDARD_ORDER_PARAMS};
use ebics_xml::Element;

use crate::config::EbicsConfig;
use crate::request::RequestFactory;
use crate::transaction::{TransactionContext, TransactionOutcome};

pub mod cct;
pub mod cdd;
pub mod hia;
pub mod hpb;
pub mod hpd;
pub mod ini;
pub mod key_docs;
pub mod ptk;
pub mod spr;
pub mod sta;

pub use cct::{CctCommand, CctParams, CreditTransfer, PaymentInfo};
pub use cdd::{CddCommand, CddParams, DebitPaymentInfo, DirectDebit};
pub use hia::HiaCommand;
pub use hpb::{HpbCommand, HpbResponse};
pub use hpd::{AccessParams, HpdCommand, HpdResponse, ProtocolParams};
pub use ini::IniCommand;
pub use ptk::PtkCommand;
pub use spr::SprCommand;
pub use sta::StaCommand;

/// Which dialog the engine drives for a command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dialog {
    /// Plain `ebicsUnsecuredRequest`, single round trip (INI, HIA).
    Unsecured,
    /// Signed single round trip without bank key digests (HPB).
    KeyManagement,
    /// Full Initialisation → Transfer → Receipt state machine.
    Transaction,
}

pub trait Command {
    type Response;

    fn order_type(&self) -> OrderType;
    fn order_attribute(&self) -> OrderAttribute;
    fn direction(&self) -> TransactionDirection;

    fn dialog(&self) -> Dialog {
        Dialog::Transaction
    }

    /// Order-specific `OrderParams` fragment for the static header.
    fn order_params(&self) -> Option<Element> {
        None
    }

    /// Plaintext order data for uploads.
    fn payload(&self, _config: &EbicsConfig) -> Result<Vec<u8>, EbicsError> {
        Err(EbicsError::CreateRequest(format!(
            "{} carries no client order data",
            self.order_type()
        )))
    }

    fn build_init_request(
        &self,
        factory: &RequestFactory<'_>,
        ctx: &TransactionContext,
    ) -> Result<Element, EbicsError> {
        factory.init_request(
            self.order_type(),
            self.order_attribute(),
            self.order_params(),
            ctx,
        )
    }

    fn build_transfer_request(
        &self,
        factory: &RequestFactory<'_>,
        ctx: &TransactionContext,
        number: u32,
    ) -> Result<Element, EbicsError> {
        factory.transfer_request(ctx, number)
    }

    fn build_receipt_request(
        &self,
        factory: &RequestFactory<'_>,
        ctx: &TransactionContext,
        code: u32,
    ) -> Result<Element, EbicsError> {
        if self.direction() == TransactionDirection::Upload {
            return Err(EbicsError::CreateRequest(
                "upload transactions have no receipt phase".into(),
            ));
        }
        factory.receipt_request(ctx, code)
    }

    fn deserialize(&self, outcome: TransactionOutcome) -> Result<Self::Response, EbicsError>;
}

// ── Common parameter and response records ────────────────────────────────────

/// Optional statement period for download orders (STA, PTK).
///
/// Both bounds must be given to take effect; the EBICS `DateRange` element
/// has no open end.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct DateRangeParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRangeParams {
    pub(crate) fn to_order_params(self) -> Option<Element> {
        let (start, end) = (self.start?, self.end?);
        Some(
            Element::new(STANDARD_ORDER_PARAMS).child(
                Element::new(DATE_RANGE)
                    .child(Element::with_text(DATE_START, start.format("%Y-%m-%d").to_string()))
                    .child(Element::with_text(DATE_END, end.format("%Y-%m-%d").to_string())),
            ),
        )
    }
}

/// Response to the unsecured key announcements (INI, HIA).
#[derive(Debug, Clone)]
pub struct KeyManagementResponse {
    pub status: OrderStatus,
}

/// Response to data uploads (CCT, CDD, SPR).
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub status: OrderStatus,
}

/// Response to text-payload downloads (STA, PTK).
#[derive(Debug, Clone)]
pub struct DownloadTextResponse {
    pub status: OrderStatus,
    /// Decompressed order data, absent when the bank rejected the order.
    pub content: Option<String>,
}
