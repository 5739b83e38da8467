use ebics_core::types::{OrderAttribute, OrderType, TransactionDirection};
use ebics_core::EbicsError;
use ebics_xml::Element;

use crate::codec;
use crate::config::EbicsConfig;
use crate::request::RequestFactory;
use crate::transaction::{TransactionContext, TransactionOutcome};

use super::{key_docs, Command, Dialog, KeyManagementResponse};

/// HIA: announce the authentication (X002) and encryption (E002) public
/// keys in one unsecured envelope.
pub struct HiaCommand;

impl Command for HiaCommand {
    type Response = KeyManagementResponse;

    fn order_type(&self) -> OrderType {
        OrderType::Hia
    }

    fn order_attribute(&self) -> OrderAttribute {
        OrderAttribute::Dznnn
    }

    fn direction(&self) -> TransactionDirection {
        TransactionDirection::Upload
    }

    fn dialog(&self) -> Dialog {
        Dialog::Unsecured
    }

    fn payload(&self, config: &EbicsConfig) -> Result<Vec<u8>, EbicsError> {
        Ok(key_docs::hia_request_order_data(config)
            .to_document()?
            .into_bytes())
    }

    fn build_init_request(
        &self,
        factory: &RequestFactory<'_>,
        _ctx: &TransactionContext,
    ) -> Result<Element, EbicsError> {
        let order_data = codec::encode_unsecured(&self.payload(factory.config())?)?;
        Ok(factory.unsecured_request(self.order_type(), order_data))
    }

    fn deserialize(&self, outcome: TransactionOutcome) -> Result<Self::Response, EbicsError> {
        Ok(KeyManagementResponse {
            status: outcome.status,
        })
    }
}
