use ebics_core::types::{OrderAttribute, OrderType, TransactionDirection};
use ebics_core::EbicsError;
use ebics_xml::Element;

use crate::codec;
use crate::config::EbicsConfig;
use crate::request::RequestFactory;
use crate::transaction::{TransactionContext, TransactionOutcome};

use super::{key_docs, Command, Dialog, KeyManagementResponse};

/// INI: announce the order signature public key (A005).
///
/// Sent before the bank knows any of our keys, so the envelope is an
/// unsigned, unencrypted `ebicsUnsecuredRequest`.
pub struct IniCommand;

impl Command for IniCommand {
    type Response = KeyManagementResponse;

    fn order_type(&self) -> OrderType {
        OrderType::Ini
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
        Ok(key_docs::signature_pub_key_order_data(config)
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
