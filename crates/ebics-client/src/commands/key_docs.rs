//! The key announcement documents carried as order data by INI and HIA.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use ebics_crypto::{utc_timestamp, KeyPair};
use ebics_xml::names::*;
use ebics_xml::Element;

use crate::config::EbicsConfig;

/// `PubKeyValue`: the RSA parameters in XML-DSIG form plus a timestamp.
fn pub_key_value(key: &KeyPair) -> Element {
    Element::new(PUB_KEY_VALUE)
        .child(
            Element::new(DS_RSA_KEY_VALUE)
                .child(Element::with_text(DS_MODULUS, BASE64.encode(key.modulus_bytes())))
                .child(Element::with_text(DS_EXPONENT, BASE64.encode(key.exponent_bytes()))),
        )
        .child(Element::with_text(TIME_STAMP, utc_timestamp()))
}

/// `SignaturePubKeyOrderData` (S001): announces the A005 signature key.
pub fn signature_pub_key_order_data(config: &EbicsConfig) -> Element {
    Element::new(SIGNATURE_PUB_KEY_ORDER_DATA)
        .attr("xmlns", NS_SIGNATURE_DATA)
        .attr("xmlns:ds", NS_XMLDSIG)
        .child(
            Element::new(SIGNATURE_PUB_KEY_INFO)
                .child(pub_key_value(&config.sign_key))
                .child(Element::with_text(
                    SIGNATURE_VERSION,
                    config.sign_key.version.as_str(),
                )),
        )
        .child(Element::with_text(PARTNER_ID, &config.user.partner_id))
        .child(Element::with_text(USER_ID, &config.user.user_id))
}

/// `HIARequestOrderData`: announces the X002 and E002 keys.
pub fn hia_request_order_data(config: &EbicsConfig) -> Element {
    Element::new(HIA_REQUEST_ORDER_DATA)
        .attr("xmlns", config.version.namespace())
        .attr("xmlns:ds", NS_XMLDSIG)
        .child(
            Element::new(AUTHENTICATION_PUB_KEY_INFO)
                .child(pub_key_value(&config.auth_key))
                .child(Element::with_text(
                    AUTHENTICATION_VERSION,
                    config.auth_key.version.as_str(),
                )),
        )
        .child(
            Element::new(ENCRYPTION_PUB_KEY_INFO)
                .child(pub_key_value(&config.crypt_key))
                .child(Element::with_text(
                    ENCRYPTION_VERSION,
                    config.crypt_key.version.as_str(),
                )),
        )
        .child(Element::with_text(PARTNER_ID, &config.user.partner_id))
        .child(Element::with_text(USER_ID, &config.user.user_id))
}
