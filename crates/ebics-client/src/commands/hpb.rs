use ebics_core::return_code::OrderStatus;
use ebics_core::types::{KeyVersion, OrderAttribute, OrderType, TransactionDirection};
use ebics_core::{BankKeys, BankPublicKey, EbicsError};
use ebics_crypto::{public_key_digest, public_key_from_raw};
use ebics_xml::names::*;
use ebics_xml::{verify_response, Element};

use crate::request::RequestFactory;
use crate::response::decode_b64;
use crate::transaction::{TransactionContext, TransactionOutcome};

use super::{Command, Dialog};

/// HPB: fetch the bank's authentication and encryption public keys.
///
/// The response signature can only be checked after the keys have been
/// extracted from the decrypted order data; a response that does not verify
/// against its own announced authentication key is rejected.
pub struct HpbCommand;

#[derive(Debug, Clone)]
pub struct HpbResponse {
    pub status: OrderStatus,
    /// `None` when the bank rejected the order.
    pub bank_keys: Option<BankKeys>,
}

impl Command for HpbCommand {
    type Response = HpbResponse;

    fn order_type(&self) -> OrderType {
        OrderType::Hpb
    }

    fn order_attribute(&self) -> OrderAttribute {
        OrderAttribute::Dzhnn
    }

    fn direction(&self) -> TransactionDirection {
        TransactionDirection::Download
    }

    fn dialog(&self) -> Dialog {
        Dialog::KeyManagement
    }

    fn build_init_request(
        &self,
        factory: &RequestFactory<'_>,
        _ctx: &TransactionContext,
    ) -> Result<Element, EbicsError> {
        Ok(factory.no_pub_key_digests_request(self.order_type()))
    }

    fn deserialize(&self, outcome: TransactionOutcome) -> Result<Self::Response, EbicsError> {
        let Some(payload) = outcome.payload else {
            return Ok(HpbResponse {
                status: outcome.status,
                bank_keys: None,
            });
        };

        let doc = Element::parse(&payload)?;
        if doc.local_name() != HPB_RESPONSE_ORDER_DATA {
            return Err(EbicsError::Deserialization(format!(
                "expected HPBResponseOrderData, got <{}>",
                doc.name
            )));
        }
        let auth = parse_bank_key(&doc, AUTHENTICATION_PUB_KEY_INFO, AUTHENTICATION_VERSION)?;
        let crypt = parse_bank_key(&doc, ENCRYPTION_PUB_KEY_INFO, ENCRYPTION_VERSION)?;

        // Authenticate the envelope with the key it announced.
        let bank_auth = public_key_from_raw(&auth.modulus, &auth.exponent)?;
        if !verify_response(&outcome.response, &bank_auth) {
            return Err(EbicsError::SignatureVerification);
        }

        Ok(HpbResponse {
            status: outcome.status,
            bank_keys: Some(BankKeys { auth, crypt }),
        })
    }
}

fn parse_bank_key(
    doc: &Element,
    info_name: &str,
    version_name: &str,
) -> Result<BankPublicKey, EbicsError> {
    let info = doc
        .first_child(info_name)
        .ok_or_else(|| EbicsError::Deserialization(format!("missing {info_name}")))?;
    let key_value = info
        .find("RSAKeyValue")
        .ok_or_else(|| EbicsError::Deserialization(format!("{info_name} without RSAKeyValue")))?;
    let modulus = decode_b64(
        &key_value
            .first_child("Modulus")
            .ok_or_else(|| EbicsError::Deserialization("missing Modulus".into()))?
            .text_content(),
    )?;
    let exponent = decode_b64(
        &key_value
            .first_child("Exponent")
            .ok_or_else(|| EbicsError::Deserialization("missing Exponent".into()))?
            .text_content(),
    )?;
    let version_text = info
        .first_child(version_name)
        .map(|el| el.text_content().trim().to_string())
        .ok_or_else(|| EbicsError::Deserialization(format!("missing {version_name}")))?;
    let version = KeyVersion::parse(&version_text).ok_or_else(|| {
        EbicsError::Deserialization(format!("unsupported key version {version_text:?}"))
    })?;

    let digest = public_key_digest(&exponent, &modulus);
    Ok(BankPublicKey {
        version,
        modulus,
        exponent,
        digest,
    })
}
