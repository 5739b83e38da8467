use ebics_core::types::{OrderAttribute, OrderType, TransactionDirection};
use ebics_core::EbicsError;
use ebics_xml::Element;

use crate::transaction::TransactionOutcome;

use super::{Command, DateRangeParams, DownloadTextResponse};

/// STA: download an account statement (MT940 text), optionally bounded to a
/// statement period.
pub struct StaCommand {
    pub params: DateRangeParams,
}

impl Command for StaCommand {
    type Response = DownloadTextResponse;

    fn order_type(&self) -> OrderType {
        OrderType::Sta
    }

    fn order_attribute(&self) -> OrderAttribute {
        OrderAttribute::Dzhnn
    }

    fn direction(&self) -> TransactionDirection {
        TransactionDirection::Download
    }

    fn order_params(&self) -> Option<Element> {
        self.params.to_order_params()
    }

    fn deserialize(&self, outcome: TransactionOutcome) -> Result<Self::Response, EbicsError> {
        Ok(DownloadTextResponse {
            status: outcome.status,
            // MT940 is latin-leaning text; lossy decoding keeps the statement
            // readable whatever the bank's charset discipline.
            content: outcome
                .payload
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
        })
    }
}
