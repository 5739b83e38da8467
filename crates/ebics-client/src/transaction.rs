//! The per-transaction state machine: Initialisation → Transfer → Receipt.
//!
//! Strictly sequential; segments are numbered from 1 and never pipelined.
//! Bank return codes are carried as data in the resulting [`OrderStatus`];
//! only transport, crypto and protocol failures abort with an error.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use ebics_core::constants::TRANSACTION_ID_HEX_LEN;
use ebics_core::return_code::OrderStatus;
use ebics_core::types::{TransactionDirection, TransactionPhase};
use ebics_core::{BankKeys, EbicsError};
use ebics_crypto::public_key_from_raw;
use ebics_xml::{sign_request, verify_response, Element};

use crate::codec;
use crate::commands::{Command, Dialog};
use crate::config::EbicsConfig;
use crate::http::HttpTransport;
use crate::request::RequestFactory;
use crate::response::ResponseEnvelope;

/// Short-lived record for one logical EBICS transaction.
pub struct TransactionContext {
    pub direction: TransactionDirection,
    pub phase: TransactionPhase,
    /// Bank-assigned, 16 hex characters; absent until the first response.
    pub transaction_id: Option<String>,
    pub num_segments: u32,
    pub segment_number: u32,
    pub last_segment: bool,
    /// Upload: pre-encrypted Base64 segments, constant for the transaction.
    pub upload_segments: Vec<String>,
    /// Upload: RSA-wrapped session key, Base64.
    pub transaction_key_b64: Option<String>,
    /// Download: accumulated Base64 chunks keyed by segment number.
    pub download_segments: BTreeMap<u32, String>,
    /// Download: the bank's RSA-wrapped session key.
    pub wrapped_key: Option<Vec<u8>>,
}

impl TransactionContext {
    pub fn new(direction: TransactionDirection) -> Self {
        Self {
            direction,
            phase: TransactionPhase::Initialisation,
            transaction_id: None,
            num_segments: 1,
            segment_number: 1,
            last_segment: false,
            upload_segments: Vec::new(),
            transaction_key_b64: None,
            download_segments: BTreeMap::new(),
            wrapped_key: None,
        }
    }

    pub fn is_upload(&self) -> bool {
        self.direction == TransactionDirection::Upload
    }

    /// Base64 upload segment by 1-based number.
    pub fn upload_segment(&self, number: u32) -> Result<&str, EbicsError> {
        (number as usize)
            .checked_sub(1)
            .and_then(|i| self.upload_segments.get(i))
            .map(String::as_str)
            .ok_or_else(|| {
                EbicsError::CreateRequest(format!("no upload segment {number} prepared"))
            })
    }
}

/// What a completed dialog hands to the command's deserializer.
pub struct TransactionOutcome {
    pub status: OrderStatus,
    /// Decrypted, decompressed order data; `None` when the bank rejected the
    /// order or the dialog carries none.
    pub payload: Option<Vec<u8>>,
    /// The final (for key management: only) response document.
    pub response: Element,
}

/// One parsed response together with its document, which deserializers may
/// need for signature verification.
struct Exchange {
    doc: Element,
    envelope: ResponseEnvelope,
}

/// Drives dialogs for one client configuration.
pub struct Engine<'a> {
    pub transport: &'a HttpTransport,
    pub config: &'a EbicsConfig,
    pub bank: Option<BankKeys>,
}

impl Engine<'_> {
    pub async fn run<C: Command>(&self, command: &C) -> Result<TransactionOutcome, EbicsError> {
        match command.dialog() {
            Dialog::Unsecured => self.run_unsecured(command).await,
            Dialog::KeyManagement => self.run_key_management(command).await,
            Dialog::Transaction => self.run_transaction(command).await,
        }
    }

    fn factory(&self) -> RequestFactory<'_> {
        RequestFactory::new(self.config, self.bank.as_ref())
    }

    fn bank(&self) -> Result<&BankKeys, EbicsError> {
        self.bank.as_ref().ok_or(EbicsError::BankKeysMissing)
    }

    // ── Unsecured key management (INI, HIA) ──────────────────────────────────

    async fn run_unsecured<C: Command>(
        &self,
        command: &C,
    ) -> Result<TransactionOutcome, EbicsError> {
        let ctx = TransactionContext::new(command.direction());
        let doc = command.build_init_request(&self.factory(), &ctx)?;
        info!(order = %command.order_type(), "sending unsecured key management order");

        let response = self.post(&doc).await?;
        let envelope = ResponseEnvelope::parse(&response)?;
        debug!(code = %envelope.technical_code, "key management response");
        Ok(TransactionOutcome {
            status: envelope.status(),
            payload: None,
            response,
        })
    }

    // ── Signed key management without bank key digests (HPB) ─────────────────

    async fn run_key_management<C: Command>(
        &self,
        command: &C,
    ) -> Result<TransactionOutcome, EbicsError> {
        let ctx = TransactionContext::new(command.direction());
        let mut doc = command.build_init_request(&self.factory(), &ctx)?;
        sign_request(&mut doc, &self.config.auth_key)?;
        info!(order = %command.order_type(), "sending key management order");

        let response = self.post(&doc).await?;
        let envelope = ResponseEnvelope::parse(&response)?;
        if !envelope.technical_code.is_success() {
            warn!(code = %envelope.technical_code, "bank rejected key management order");
            return Ok(TransactionOutcome {
                status: envelope.status(),
                payload: None,
                response,
            });
        }

        // Order data is wrapped for our encryption key; no transaction phases.
        let order_data = envelope.order_data.as_deref().ok_or_else(|| {
            EbicsError::MalformedResponse("key management response without order data".into())
        })?;
        let wrapped = envelope.transaction_key.as_deref().ok_or_else(|| {
            EbicsError::MalformedResponse("key management response without transaction key".into())
        })?;
        let payload = codec::decode([order_data], wrapped, &self.config.crypt_key)?;

        Ok(TransactionOutcome {
            status: envelope.status(),
            payload: Some(payload),
            response,
        })
    }

    // ── Full transaction dialog ──────────────────────────────────────────────

    async fn run_transaction<C: Command>(
        &self,
        command: &C,
    ) -> Result<TransactionOutcome, EbicsError> {
        let mut ctx = TransactionContext::new(command.direction());

        if ctx.is_upload() {
            let plain = command.payload(self.config)?;
            let bank = self.bank()?;
            let bank_crypt = public_key_from_raw(&bank.crypt.modulus, &bank.crypt.exponent)?;
            let encoded = codec::encode(&plain, &bank_crypt)?;
            ctx.num_segments = encoded.num_segments();
            ctx.upload_segments = encoded.segments;
            ctx.transaction_key_b64 = Some(encoded.transaction_key_b64);
            debug!(segments = ctx.num_segments, "upload payload encoded");
        }

        // ── Initialisation ───────────────────────────────────────────────────
        let init = command.build_init_request(&self.factory(), &ctx)?;
        info!(order = %command.order_type(), phase = %ctx.phase, "starting transaction");
        let mut last = self.exchange(init).await?;
        check_phase(&last.envelope, TransactionPhase::Initialisation)?;
        if !last.envelope.technical_code.is_success() {
            warn!(code = %last.envelope.technical_code, "bank rejected initialisation");
            return Ok(outcome_without_payload(last));
        }
        if last.envelope.technical_code.is_recovery_sync() {
            warn!(code = %last.envelope.technical_code, "recovery synchronisation reported");
        }

        ctx.transaction_id = Some(validated_transaction_id(&last.envelope)?);
        let mut order_id = last.envelope.order_id.clone();

        if ctx.direction == TransactionDirection::Download {
            ctx.num_segments = last.envelope.num_segments.unwrap_or(1);
            ctx.wrapped_key = last.envelope.transaction_key.clone();
            store_download_segment(&mut ctx, &last.envelope, 1)?;
        }

        // ── Transfer ─────────────────────────────────────────────────────────
        ctx.phase = TransactionPhase::Transfer;
        for number in 2..=ctx.num_segments {
            let request = command.build_transfer_request(&self.factory(), &ctx, number)?;
            let exchange = self.exchange(request).await?;
            check_phase(&exchange.envelope, TransactionPhase::Transfer)?;
            if !exchange.envelope.technical_code.is_success() {
                warn!(code = %exchange.envelope.technical_code, "bank aborted transfer");
                return Ok(outcome_without_payload(exchange));
            }
            if let Some(got) = exchange.envelope.segment_number {
                if got != number {
                    return Err(EbicsError::SegmentGap {
                        expected: number,
                        got,
                    });
                }
            }
            if ctx.direction == TransactionDirection::Download {
                store_download_segment(&mut ctx, &exchange.envelope, number)?;
            }
            ctx.segment_number = number;
            ctx.last_segment = number == ctx.num_segments;
            order_id = order_id.or_else(|| exchange.envelope.order_id.clone());
            last = exchange;
        }

        let payload = match ctx.direction {
            TransactionDirection::Upload => {
                info!(
                    order = %command.order_type(),
                    segments = ctx.num_segments,
                    "upload complete"
                );
                None
            }
            TransactionDirection::Download => {
                // ── Decode, then Receipt ─────────────────────────────────────
                ctx.phase = TransactionPhase::Receipt;
                let wrapped = ctx.wrapped_key.clone().ok_or_else(|| {
                    EbicsError::MalformedResponse("download carried no transaction key".into())
                })?;
                let decoded = codec::decode(
                    ctx.download_segments.values().map(String::as_str),
                    &wrapped,
                    &self.config.crypt_key,
                );

                let receipt_code = if decoded.is_ok() { 0 } else { 1 };
                let receipt = command.build_receipt_request(&self.factory(), &ctx, receipt_code)?;
                let receipt_exchange = self.exchange(receipt).await?;
                check_phase(&receipt_exchange.envelope, TransactionPhase::Receipt)?;
                debug!(
                    code = %receipt_exchange.envelope.technical_code,
                    "receipt acknowledged"
                );

                Some(decoded?)
            }
        };

        let mut status = last.envelope.status();
        status.order_id = order_id;
        Ok(TransactionOutcome {
            status,
            payload,
            response: last.doc,
        })
    }

    /// Sign, POST, parse and authenticate one secured request/response pair.
    async fn exchange(&self, mut doc: Element) -> Result<Exchange, EbicsError> {
        sign_request(&mut doc, &self.config.auth_key)?;
        let response = self.post(&doc).await?;

        let bank = self.bank()?;
        let bank_auth = public_key_from_raw(&bank.auth.modulus, &bank.auth.exponent)?;
        if !verify_response(&response, &bank_auth) {
            return Err(EbicsError::SignatureVerification);
        }
        let envelope = ResponseEnvelope::parse(&response)?;
        Ok(Exchange {
            doc: response,
            envelope,
        })
    }

    async fn post(&self, doc: &Element) -> Result<Element, EbicsError> {
        let body = self.transport.post(doc.to_document()?).await?;
        Element::parse(body.as_bytes())
    }
}

fn outcome_without_payload(exchange: Exchange) -> TransactionOutcome {
    TransactionOutcome {
        status: exchange.envelope.status(),
        payload: None,
        response: exchange.doc,
    }
}

fn check_phase(envelope: &ResponseEnvelope, expected: TransactionPhase) -> Result<(), EbicsError> {
    match envelope.phase {
        Some(got) if got != expected => Err(EbicsError::UnexpectedPhase { expected, got }),
        _ => Ok(()),
    }
}

fn validated_transaction_id(envelope: &ResponseEnvelope) -> Result<String, EbicsError> {
    let id = envelope
        .transaction_id
        .clone()
        .ok_or(EbicsError::TransactionIdMissing)?;
    if id.len() != TRANSACTION_ID_HEX_LEN || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EbicsError::MalformedResponse(format!(
            "transaction id {id:?} is not 16 hex characters"
        )));
    }
    Ok(id)
}

fn store_download_segment(
    ctx: &mut TransactionContext,
    envelope: &ResponseEnvelope,
    expected: u32,
) -> Result<(), EbicsError> {
    let number = envelope.segment_number.unwrap_or(expected);
    if number != expected {
        return Err(EbicsError::SegmentGap {
            expected,
            got: number,
        });
    }
    let data = envelope.order_data.clone().ok_or_else(|| {
        EbicsError::MalformedResponse(format!("response carries no segment {number}"))
    })?;
    ctx.download_segments.insert(number, data);
    ctx.last_segment = envelope.last_segment || number == ctx.num_segments;
    Ok(())
}
