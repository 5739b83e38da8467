use ebics_core::types::{OrderAttribute, OrderType, TransactionDirection};
use ebics_core::EbicsError;
use ebics_xml::Element;

use crate::transaction::TransactionOutcome;

use super::{Command, DateRangeParams, DownloadTextResponse};

/// PTK: download the customer protocol log (plain text).
pub struct PtkCommand {
    pub params: DateRangeParams,
}

impl Command for PtkCommand {
    type Response = DownloadTextResponse;

    fn order_type(&self) -> OrderType {
        OrderType::Ptk
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
            content: outcome
                .payload
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
        })
    }
}
