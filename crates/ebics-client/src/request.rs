//! Typed builders for the EBICS request documents.
//!
//! Element and attribute names are spelled per the EBICS schema via the
//! `ebics-xml` name table. The three authenticated subtrees (`static`,
//! `mutable`, `body`) carry `authenticate="true"`; the signer covers exactly
//! those.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use ebics_core::constants::SECURITY_MEDIUM_SOFTWARE;
use ebics_core::types::{OrderAttribute, OrderType, TransactionPhase};
use ebics_core::{BankKeys, EbicsError};
use ebics_crypto::{nonce, utc_timestamp};
use ebics_xml::names::*;
use ebics_xml::Element;

use crate::config::EbicsConfig;
use crate::transaction::TransactionContext;

/// Builds request documents for one configuration and (optionally) the known
/// bank keys.
pub struct RequestFactory<'a> {
    config: &'a EbicsConfig,
    bank: Option<&'a BankKeys>,
}

impl<'a> RequestFactory<'a> {
    pub fn new(config: &'a EbicsConfig, bank: Option<&'a BankKeys>) -> Self {
        Self { config, bank }
    }

    pub fn config(&self) -> &EbicsConfig {
        self.config
    }

    // ── Envelopes ────────────────────────────────────────────────────────────

    fn envelope(&self, root: &str) -> Element {
        Element::new(root)
            .attr("xmlns", self.config.version.namespace())
            .attr("xmlns:ds", NS_XMLDSIG)
            .attr(ATTR_VERSION, self.config.version.as_str())
            .attr(ATTR_REVISION, self.config.revision.to_string())
    }

    /// Secured download/upload initialisation request.
    pub fn init_request(
        &self,
        order_type: OrderType,
        order_attribute: OrderAttribute,
        order_params: Option<Element>,
        ctx: &TransactionContext,
    ) -> Result<Element, EbicsError> {
        let mut static_el = Element::new(STATIC)
            .attr(ATTR_AUTHENTICATE, "true")
            .child(Element::with_text(HOST_ID, &self.config.user.host_id))
            .child(Element::with_text(NONCE, hex::encode_upper(nonce())))
            .child(Element::with_text(TIMESTAMP, utc_timestamp()))
            .child(Element::with_text(PARTNER_ID, &self.config.user.partner_id))
            .child(Element::with_text(USER_ID, &self.config.user.user_id))
            .child(self.order_details(order_type, order_attribute, order_params))
            .child(self.bank_pub_key_digests()?)
            .child(Element::with_text(SECURITY_MEDIUM, SECURITY_MEDIUM_SOFTWARE));
        if ctx.is_upload() {
            static_el = static_el.child(Element::with_text(
                NUM_SEGMENTS,
                ctx.num_segments.to_string(),
            ));
        }

        let body = if ctx.is_upload() {
            self.upload_body(ctx, 1)?
        } else {
            Element::new(BODY).attr(ATTR_AUTHENTICATE, "true")
        };

        Ok(self
            .envelope(EBICS_REQUEST)
            .child(
                Element::new(HEADER)
                    .attr(ATTR_AUTHENTICATE, "true")
                    .child(static_el)
                    .child(self.mutable(TransactionPhase::Initialisation, None)),
            )
            .child(body))
    }

    /// Transfer-phase request carrying segment `number`.
    pub fn transfer_request(
        &self,
        ctx: &TransactionContext,
        number: u32,
    ) -> Result<Element, EbicsError> {
        let last = number == ctx.num_segments;
        let body = if ctx.is_upload() {
            self.upload_body(ctx, number)?
        } else {
            Element::new(BODY).attr(ATTR_AUTHENTICATE, "true")
        };
        Ok(self
            .envelope(EBICS_REQUEST)
            .child(
                Element::new(HEADER)
                    .attr(ATTR_AUTHENTICATE, "true")
                    .child(self.transaction_static(ctx)?)
                    .child(self.mutable(TransactionPhase::Transfer, Some((number, last)))),
            )
            .child(body))
    }

    /// Receipt-phase request; `code` 0 acknowledges, non-zero reports a
    /// client-side postprocessing failure.
    pub fn receipt_request(
        &self,
        ctx: &TransactionContext,
        code: u32,
    ) -> Result<Element, EbicsError> {
        Ok(self
            .envelope(EBICS_REQUEST)
            .child(
                Element::new(HEADER)
                    .attr(ATTR_AUTHENTICATE, "true")
                    .child(self.transaction_static(ctx)?)
                    .child(self.mutable(TransactionPhase::Receipt, None)),
            )
            .child(
                Element::new(BODY).attr(ATTR_AUTHENTICATE, "true").child(
                    Element::new(TRANSFER_RECEIPT)
                        .attr(ATTR_AUTHENTICATE, "true")
                        .child(Element::with_text(RECEIPT_CODE, code.to_string())),
                ),
            ))
    }

    /// `ebicsUnsecuredRequest` for INI/HIA: not signed, not encrypted, order
    /// data zlib-compressed and Base64-wrapped.
    pub fn unsecured_request(
        &self,
        order_type: OrderType,
        order_data_b64: String,
    ) -> Element {
        self.envelope(EBICS_UNSECURED_REQUEST)
            .child(
                Element::new(HEADER)
                    .attr(ATTR_AUTHENTICATE, "true")
                    .child(
                        Element::new(STATIC)
                            .attr(ATTR_AUTHENTICATE, "true")
                            .child(Element::with_text(HOST_ID, &self.config.user.host_id))
                            .child(Element::with_text(PARTNER_ID, &self.config.user.partner_id))
                            .child(Element::with_text(USER_ID, &self.config.user.user_id))
                            .child(self.order_details(
                                order_type,
                                OrderAttribute::Dznnn,
                                None,
                            ))
                            .child(Element::with_text(
                                SECURITY_MEDIUM,
                                SECURITY_MEDIUM_SOFTWARE,
                            )),
                    )
                    .child(Element::new(MUTABLE).attr(ATTR_AUTHENTICATE, "true")),
            )
            .child(
                Element::new(BODY).attr(ATTR_AUTHENTICATE, "true").child(
                    Element::new(DATA_TRANSFER)
                        .child(Element::with_text(ORDER_DATA, order_data_b64)),
                ),
            )
    }

    /// `ebicsNoPubKeyDigestsRequest` for HPB: signed, but without
    /// `BankPubKeyDigests` since the bank keys are exactly what is being
    /// fetched.
    pub fn no_pub_key_digests_request(&self, order_type: OrderType) -> Element {
        self.envelope(EBICS_NO_PUB_KEY_DIGESTS_REQUEST)
            .child(
                Element::new(HEADER)
                    .attr(ATTR_AUTHENTICATE, "true")
                    .child(
                        Element::new(STATIC)
                            .attr(ATTR_AUTHENTICATE, "true")
                            .child(Element::with_text(HOST_ID, &self.config.user.host_id))
                            .child(Element::with_text(NONCE, hex::encode_upper(nonce())))
                            .child(Element::with_text(TIMESTAMP, utc_timestamp()))
                            .child(Element::with_text(PARTNER_ID, &self.config.user.partner_id))
                            .child(Element::with_text(USER_ID, &self.config.user.user_id))
                            .child(self.order_details(order_type, OrderAttribute::Dzhnn, None))
                            .child(Element::with_text(
                                SECURITY_MEDIUM,
                                SECURITY_MEDIUM_SOFTWARE,
                            )),
                    )
                    .child(Element::new(MUTABLE).attr(ATTR_AUTHENTICATE, "true")),
            )
            .child(Element::new(BODY).attr(ATTR_AUTHENTICATE, "true"))
    }

    // ── Fragments ────────────────────────────────────────────────────────────

    fn order_details(
        &self,
        order_type: OrderType,
        order_attribute: OrderAttribute,
        order_params: Option<Element>,
    ) -> Element {
        let mut details = Element::new(ORDER_DETAILS)
            .child(Element::with_text(ORDER_TYPE, order_type.as_str()))
            .child(Element::with_text(ORDER_ATTRIBUTE, order_attribute.as_str()));
        if order_attribute != OrderAttribute::Dznnn {
            details = details.child(order_params.unwrap_or_else(|| Element::new(STANDARD_ORDER_PARAMS)));
        }
        details
    }

    fn bank_pub_key_digests(&self) -> Result<Element, EbicsError> {
        let bank = self.bank.ok_or(EbicsError::BankKeysMissing)?;
        Ok(Element::new(BANK_PUB_KEY_DIGESTS)
            .child(
                Element::with_text(AUTHENTICATION, BASE64.encode(bank.auth.digest))
                    .attr(ATTR_VERSION, bank.auth.version.as_str())
                    .attr(ATTR_ALGORITHM, ALG_SHA256),
            )
            .child(
                Element::with_text(ENCRYPTION, BASE64.encode(bank.crypt.digest))
                    .attr(ATTR_VERSION, bank.crypt.version.as_str())
                    .attr(ATTR_ALGORITHM, ALG_SHA256),
            ))
    }

    fn transaction_static(&self, ctx: &TransactionContext) -> Result<Element, EbicsError> {
        let transaction_id = ctx
            .transaction_id
            .as_deref()
            .ok_or(EbicsError::TransactionIdMissing)?;
        Ok(Element::new(STATIC)
            .attr(ATTR_AUTHENTICATE, "true")
            .child(Element::with_text(HOST_ID, &self.config.user.host_id))
            .child(Element::with_text(TRANSACTION_ID, transaction_id)))
    }

    fn mutable(&self, phase: TransactionPhase, segment: Option<(u32, bool)>) -> Element {
        let mut mutable = Element::new(MUTABLE)
            .attr(ATTR_AUTHENTICATE, "true")
            .child(Element::with_text(TRANSACTION_PHASE, phase.as_str()));
        if let Some((number, last)) = segment {
            let mut seg = Element::with_text(SEGMENT_NUMBER, number.to_string());
            if last {
                seg = seg.attr(ATTR_LAST_SEGMENT, "true");
            }
            mutable = mutable.child(seg);
        }
        mutable
    }

    fn upload_body(&self, ctx: &TransactionContext, number: u32) -> Result<Element, EbicsError> {
        let segment = ctx.upload_segment(number)?;
        let mut data_transfer = Element::new(DATA_TRANSFER);
        if number == 1 {
            let bank = self.bank.ok_or(EbicsError::BankKeysMissing)?;
            let wrapped = ctx.transaction_key_b64.as_deref().ok_or_else(|| {
                EbicsError::CreateRequest("upload context has no transaction key".into())
            })?;
            data_transfer = data_transfer.child(
                Element::new(DATA_ENCRYPTION_INFO)
                    .attr(ATTR_AUTHENTICATE, "true")
                    .child(
                        Element::with_text(
                            ENCRYPTION_PUB_KEY_DIGEST,
                            BASE64.encode(bank.crypt.digest),
                        )
                        .attr(ATTR_VERSION, bank.crypt.version.as_str())
                        .attr(ATTR_ALGORITHM, ALG_SHA256),
                    )
                    .child(Element::with_text(TRANSACTION_KEY, wrapped)),
            );
        }
        Ok(Element::new(BODY)
            .attr(ATTR_AUTHENTICATE, "true")
            .child(data_transfer.child(Element::with_text(ORDER_DATA, segment))))
    }
}
