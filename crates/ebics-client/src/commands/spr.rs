use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use ebics_core::types::{OrderAttribute, OrderType, TransactionDirection};
use ebics_core::EbicsError;
use ebics_crypto::sign;
use ebics_xml::names::*;
use ebics_xml::Element;

use crate::config::EbicsConfig;
use crate::transaction::TransactionOutcome;

use super::{Command, UploadResponse};

/// SPR: suspend this subscriber's access.
///
/// The order data is a `UserSignatureData` document whose only content is the
/// A005 signature over a single ASCII space.
pub struct SprCommand;

impl Command for SprCommand {
    type Response = UploadResponse;

    fn order_type(&self) -> OrderType {
        OrderType::Spr
    }

    fn order_attribute(&self) -> OrderAttribute {
        OrderAttribute::Uzhnn
    }

    fn direction(&self) -> TransactionDirection {
        TransactionDirection::Upload
    }

    fn payload(&self, config: &EbicsConfig) -> Result<Vec<u8>, EbicsError> {
        let signature = sign(config.sign_key.private(), b" ")?;
        let doc = Element::new(USER_SIGNATURE_DATA)
            .attr("xmlns", NS_SIGNATURE_DATA)
            .child(
                Element::new(ORDER_SIGNATURE_DATA)
                    .child(Element::with_text(
                        SIGNATURE_VERSION,
                        config.sign_key.version.as_str(),
                    ))
                    .child(Element::with_text(SIGNATURE_VALUE, BASE64.encode(signature)))
                    .child(Element::with_text(PARTNER_ID, &config.user.partner_id))
                    .child(Element::with_text(USER_ID, &config.user.user_id)),
            );
        Ok(doc.to_document()?.into_bytes())
    }

    fn deserialize(&self, outcome: TransactionOutcome) -> Result<Self::Response, EbicsError> {
        Ok(UploadResponse {
            status: outcome.status,
        })
    }
}
