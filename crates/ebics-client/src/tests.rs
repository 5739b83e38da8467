//! Dialog tests against a wiremock bank.
//!
//! The mock bank signs its responses with a test authentication key and
//! wraps order data for the client's encryption key, exercising the whole
//! envelope: state machine, codec, signer and verifier.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rsa::RsaPrivateKey;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ebics_core::types::{KeyVersion, SchemaVersion, UserIdent};
use ebics_core::{BankKeys, BankPublicKey, EbicsError};
use ebics_crypto::{deflate, encrypt_aes_cbc, transaction_key, wrap_key, KeyPair};
use ebics_xml::names::{NS_EBICS_H004, NS_XMLDSIG};
use ebics_xml::{sign_request, Element};

use crate::client::EbicsClient;
use crate::commands::{Command, CctParams, CreditTransfer, DateRangeParams, IniCommand, PaymentInfo};
use crate::config::EbicsConfig;
use crate::request::RequestFactory;
use crate::transaction::TransactionContext;

// ── Shared key fixtures ──────────────────────────────────────────────────────

struct TestKeys {
    sign: KeyPair,
    auth: KeyPair,
    crypt: KeyPair,
    bank_auth: KeyPair,
    bank_crypt: KeyPair,
}

fn keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let gen = |seed: u64, version: KeyVersion| {
            let key = RsaPrivateKey::new(&mut StdRng::seed_from_u64(seed), 2048).unwrap();
            KeyPair::new(version, key).unwrap()
        };
        TestKeys {
            sign: gen(21, KeyVersion::A005),
            auth: gen(22, KeyVersion::X002),
            crypt: gen(23, KeyVersion::E002),
            bank_auth: gen(24, KeyVersion::X002),
            bank_crypt: gen(25, KeyVersion::E002),
        }
    })
}

fn bank_public(key: &KeyPair) -> BankPublicKey {
    BankPublicKey {
        version: key.version,
        modulus: key.modulus_bytes(),
        exponent: key.exponent_bytes(),
        digest: key.digest(),
    }
}

pub(crate) fn bank_keys() -> BankKeys {
    BankKeys {
        auth: bank_public(&keys().bank_auth),
        crypt: bank_public(&keys().bank_crypt),
    }
}

pub(crate) fn test_config() -> EbicsConfig {
    EbicsConfig {
        url: "http://127.0.0.1:1/ebics".into(),
        version: SchemaVersion::H004,
        revision: 1,
        tls_insecure: false,
        user: UserIdent::new("EBIXHOST", "PART01", "USER01"),
        sign_key: keys().sign.clone(),
        auth_key: keys().auth.clone(),
        crypt_key: keys().crypt.clone(),
        bank: Some(bank_keys()),
    }
}

fn client_for(server: &MockServer, bank: Option<BankKeys>) -> EbicsClient {
    let mut config = test_config();
    config.url = format!("{}/ebics", server.uri());
    config.bank = bank;
    EbicsClient::new(config).unwrap()
}

// ── Response fixtures ────────────────────────────────────────────────────────

const TXID: &str = "A1B2C3D4E5F60718";

/// Deflate + AES-encrypt a payload the way a bank would for this client,
/// returning the encrypted bytes and the wrapped session key (Base64).
fn encrypt_for_client(payload: &[u8]) -> (Vec<u8>, String) {
    let key = transaction_key();
    let compressed = deflate(payload).unwrap();
    let encrypted = encrypt_aes_cbc(&key, &compressed);
    let wrapped = wrap_key(&keys().crypt.public(), &key).unwrap();
    (encrypted, BASE64.encode(wrapped))
}

struct ResponsePlan<'a> {
    phase: &'a str,
    technical: &'a str,
    num_segments: Option<u32>,
    segment: Option<(u32, bool)>,
    order_id: Option<&'a str>,
    order_data: Option<&'a str>,
    wrapped_key: Option<&'a str>,
    business: Option<&'a str>,
}

impl Default for ResponsePlan<'_> {
    fn default() -> Self {
        Self {
            phase: "Initialisation",
            technical: "000000",
            num_segments: None,
            segment: None,
            order_id: None,
            order_data: None,
            wrapped_key: None,
            business: None,
        }
    }
}

/// Build and bank-sign one `ebicsResponse`.
fn signed_response(plan: ResponsePlan<'_>) -> String {
    let mut static_el = Element::new("static")
        .attr("authenticate", "true")
        .child(Element::with_text("HostID", "EBIXHOST"))
        .child(Element::with_text("TransactionID", TXID));
    if let Some(n) = plan.num_segments {
        static_el = static_el.child(Element::with_text("NumSegments", n.to_string()));
    }

    let mut mutable = Element::new("mutable")
        .attr("authenticate", "true")
        .child(Element::with_text("TransactionPhase", plan.phase));
    if let Some((number, last)) = plan.segment {
        let mut seg = Element::with_text("SegmentNumber", number.to_string());
        if last {
            seg = seg.attr("lastSegment", "true");
        }
        mutable = mutable.child(seg);
    }
    if let Some(order_id) = plan.order_id {
        mutable = mutable.child(Element::with_text("OrderID", order_id));
    }
    mutable = mutable
        .child(Element::with_text("ReturnCode", plan.technical))
        .child(Element::with_text("ReportText", "[TEST] report"));

    let mut body = Element::new("body").attr("authenticate", "true");
    if plan.order_data.is_some() || plan.wrapped_key.is_some() {
        let mut data_transfer = Element::new("DataTransfer");
        if let Some(wrapped) = plan.wrapped_key {
            data_transfer = data_transfer.child(
                Element::new("DataEncryptionInfo")
                    .child(Element::with_text("TransactionKey", wrapped)),
            );
        }
        if let Some(data) = plan.order_data {
            data_transfer = data_transfer.child(Element::with_text("OrderData", data));
        }
        body = body.child(data_transfer);
    }
    if let Some(code) = plan.business {
        body = body.child(Element::with_text("ReturnCode", code));
    }

    let mut doc = Element::new("ebicsResponse")
        .attr("xmlns", NS_EBICS_H004)
        .attr("xmlns:ds", NS_XMLDSIG)
        .attr("Version", "H004")
        .attr("Revision", "1")
        .child(
            Element::new("header")
                .attr("authenticate", "true")
                .child(static_el)
                .child(mutable),
        )
        .child(body);
    sign_request(&mut doc, &keys().bank_auth).unwrap();
    doc.to_document().unwrap()
}

/// Build and bank-sign one `ebicsKeyManagementResponse` carrying order data.
fn signed_key_management_response(order_data_b64: &str, wrapped_key_b64: &str) -> String {
    let mut doc = Element::new("ebicsKeyManagementResponse")
        .attr("xmlns", NS_EBICS_H004)
        .attr("xmlns:ds", NS_XMLDSIG)
        .attr("Version", "H004")
        .attr("Revision", "1")
        .child(
            Element::new("header")
                .attr("authenticate", "true")
                .child(Element::new("static").attr("authenticate", "true"))
                .child(
                    Element::new("mutable")
                        .attr("authenticate", "true")
                        .child(Element::with_text("OrderID", "A0XY"))
                        .child(Element::with_text("ReturnCode", "000000"))
                        .child(Element::with_text("ReportText", "[EBICS_OK] OK")),
                ),
        )
        .child(
            Element::new("body")
                .attr("authenticate", "true")
                .child(
                    Element::new("DataTransfer")
                        .child(
                            Element::new("DataEncryptionInfo")
                                .child(Element::with_text("TransactionKey", wrapped_key_b64)),
                        )
                        .child(Element::with_text("OrderData", order_data_b64)),
                )
                .child(Element::with_text("ReturnCode", "000000")),
        );
    sign_request(&mut doc, &keys().bank_auth).unwrap();
    doc.to_document().unwrap()
}

fn hpb_order_data() -> Vec<u8> {
    fn info(name: &str, key: &KeyPair, version_name: &str) -> Element {
        Element::new(name)
            .child(
                Element::new("PubKeyValue").child(
                    Element::new("ds:RSAKeyValue")
                        .child(Element::with_text("ds:Modulus", BASE64.encode(key.modulus_bytes())))
                        .child(Element::with_text("ds:Exponent", BASE64.encode(key.exponent_bytes()))),
                ),
            )
            .child(Element::with_text(version_name, key.version.as_str()))
    }
    Element::new("HPBResponseOrderData")
        .attr("xmlns", NS_EBICS_H004)
        .attr("xmlns:ds", NS_XMLDSIG)
        .child(info("AuthenticationPubKeyInfo", &keys().bank_auth, "AuthenticationVersion"))
        .child(info("EncryptionPubKeyInfo", &keys().bank_crypt, "EncryptionVersion"))
        .child(Element::with_text("HostID", "EBIXHOST"))
        .to_document()
        .unwrap()
        .into_bytes()
}

async fn mount(server: &MockServer, needle: &str, body: String) {
    Mock::given(method("POST"))
        .and(path("/ebics"))
        .and(body_string_contains(needle))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/xml"))
        .mount(server)
        .await;
}

// ── S1: INI builds an unsecured envelope ─────────────────────────────────────

#[test]
fn ini_request_is_an_unsecured_envelope() {
    let config = test_config();
    let factory = RequestFactory::new(&config, None);
    let ctx = TransactionContext::new(IniCommand.direction());

    let doc = IniCommand.build_init_request(&factory, &ctx).unwrap();
    assert_eq!(doc.local_name(), "ebicsUnsecuredRequest");
    assert!(doc.find("AuthSignature").is_none());
    assert!(doc.find("BankPubKeyDigests").is_none());

    // The body inflates back to the exact signature key announcement.
    let order_data = doc.find("OrderData").unwrap().text_content();
    let inflated = ebics_crypto::inflate(&BASE64.decode(order_data).unwrap()).unwrap();
    let key_doc = Element::parse(&inflated).unwrap();
    assert_eq!(key_doc.local_name(), "SignaturePubKeyOrderData");
    assert_eq!(
        key_doc.find("Modulus").unwrap().text_content(),
        BASE64.encode(config.sign_key.modulus_bytes())
    );
    assert_eq!(
        key_doc.find("Exponent").unwrap().text_content(),
        BASE64.encode(config.sign_key.exponent_bytes())
    );
    assert_eq!(key_doc.find("SignatureVersion").unwrap().text_content(), "A005");
}

// ── S2: HPB round trip ───────────────────────────────────────────────────────

#[tokio::test]
async fn hpb_populates_bank_keys_and_digests() {
    let server = MockServer::start().await;
    let (encrypted, wrapped) = encrypt_for_client(&hpb_order_data());
    mount(
        &server,
        "ebicsNoPubKeyDigestsRequest",
        signed_key_management_response(&BASE64.encode(encrypted), &wrapped),
    )
    .await;

    // Fresh subscription: no bank keys yet.
    let client = client_for(&server, None);
    let response = client.hpb().await.unwrap();
    assert!(response.status.is_success());

    let stored = client.bank_keys().expect("bank keys stored after HPB");
    assert_eq!(stored.auth.digest, keys().bank_auth.digest());
    assert_eq!(stored.crypt.digest, keys().bank_crypt.digest());
    assert_eq!(stored.auth.modulus, keys().bank_auth.modulus_bytes());

    // Subsequent secured requests echo the stored digests.
    let mut config = test_config();
    config.bank = Some(stored.clone());
    let factory = RequestFactory::new(&config, config.bank.as_ref());
    let ctx = TransactionContext::new(ebics_core::types::TransactionDirection::Download);
    let request = factory
        .init_request(
            ebics_core::types::OrderType::Sta,
            ebics_core::types::OrderAttribute::Dzhnn,
            None,
            &ctx,
        )
        .unwrap();
    assert_eq!(
        request.find("Authentication").unwrap().text_content(),
        BASE64.encode(stored.auth.digest)
    );
    assert_eq!(
        request.find("Encryption").unwrap().text_content(),
        BASE64.encode(stored.crypt.digest)
    );
}

// ── S5: tampered response fails verification ─────────────────────────────────

#[tokio::test]
async fn tampered_response_is_rejected() {
    let mt940 = ":20:STARTUMS\n:25:12030000/202051\n:28C:27/01";
    let (encrypted, wrapped) = encrypt_for_client(mt940.as_bytes());
    let response = signed_response(ResponsePlan {
        num_segments: Some(1),
        segment: Some((1, true)),
        order_data: Some(&BASE64.encode(&encrypted)),
        wrapped_key: Some(&wrapped),
        business: Some("000000"),
        ..Default::default()
    });
    // One flipped character inside the authenticated static header.
    let tampered = response.replace("EBIXHOST", "EBIYHOST");
    assert_ne!(response, tampered);

    let server = MockServer::start().await;
    mount(&server, "Initialisation", tampered).await;

    let client = client_for(&server, Some(bank_keys()));
    let err = client.sta(DateRangeParams::default()).await.unwrap_err();
    assert!(matches!(err, EbicsError::SignatureVerification));
}

// ── S4: single-segment STA download with one receipt ─────────────────────────

#[tokio::test]
async fn sta_download_returns_statement_and_issues_one_receipt() {
    let mt940 = ":20:STARTUMS\n:25:12030000/202051\n:28C:27/01\n:60F:C260801EUR1000,00";
    let (encrypted, wrapped) = encrypt_for_client(mt940.as_bytes());

    let server = MockServer::start().await;
    mount(
        &server,
        "Initialisation",
        signed_response(ResponsePlan {
            num_segments: Some(1),
            segment: Some((1, true)),
            order_data: Some(&BASE64.encode(&encrypted)),
            wrapped_key: Some(&wrapped),
            business: Some("000000"),
            ..Default::default()
        }),
    )
    .await;
    mount(
        &server,
        "Receipt",
        signed_response(ResponsePlan {
            phase: "Receipt",
            technical: "011000",
            ..Default::default()
        }),
    )
    .await;

    let client = client_for(&server, Some(bank_keys()));
    let response = client.sta(DateRangeParams::default()).await.unwrap();
    assert!(response.status.is_success());
    assert_eq!(response.content.as_deref(), Some(mt940));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let receipt_body = String::from_utf8_lossy(&requests[1].body).into_owned();
    assert!(receipt_body.contains(">Receipt<"));
    assert!(receipt_body.contains("<ReceiptCode>0</ReceiptCode>"));
    assert!(receipt_body.contains(&format!("<TransactionID>{TXID}</TransactionID>")));
}

// ── Segment assembly across a 3-segment download ─────────────────────────────

#[tokio::test]
async fn multi_segment_download_reassembles_in_order() {
    let mut payload = vec![0u8; 200_000];
    StdRng::seed_from_u64(31).fill_bytes(&mut payload);
    let (encrypted, wrapped) = encrypt_for_client(&payload);

    // The bank splits the ciphertext into three chunks.
    let third = encrypted.len() / 3 + 1;
    let chunks: Vec<String> = encrypted.chunks(third).map(|c| BASE64.encode(c)).collect();
    assert_eq!(chunks.len(), 3);

    let server = MockServer::start().await;
    mount(
        &server,
        "Initialisation",
        signed_response(ResponsePlan {
            num_segments: Some(3),
            segment: Some((1, false)),
            order_data: Some(&chunks[0]),
            wrapped_key: Some(&wrapped),
            business: Some("000000"),
            ..Default::default()
        }),
    )
    .await;
    mount(
        &server,
        ">2</SegmentNumber>",
        signed_response(ResponsePlan {
            phase: "Transfer",
            segment: Some((2, false)),
            order_data: Some(&chunks[1]),
            ..Default::default()
        }),
    )
    .await;
    mount(
        &server,
        ">3</SegmentNumber>",
        signed_response(ResponsePlan {
            phase: "Transfer",
            segment: Some((3, true)),
            order_data: Some(&chunks[2]),
            ..Default::default()
        }),
    )
    .await;
    mount(
        &server,
        "Receipt",
        signed_response(ResponsePlan {
            phase: "Receipt",
            technical: "011000",
            ..Default::default()
        }),
    )
    .await;

    let client = client_for(&server, Some(bank_keys()));
    let response = client.ptk(DateRangeParams::default()).await.unwrap();
    let expected = String::from_utf8_lossy(&payload).into_owned();
    assert_eq!(response.content.as_deref(), Some(expected.as_str()));

    // Every post-initialisation request carries the bank's transaction ID.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 5);
    for request in &requests[1..] {
        let body = String::from_utf8_lossy(&request.body).into_owned();
        assert!(body.contains(&format!("<TransactionID>{TXID}</TransactionID>")));
    }
}

// ── S3: CCT upload spanning two segments ─────────────────────────────────────

fn large_cct_params() -> CctParams {
    let mut rng = StdRng::seed_from_u64(32);
    let transfers = (0..700)
        .map(|i| {
            let mut noise = vec![0u8; 2048];
            rng.fill_bytes(&mut noise);
            CreditTransfer {
                end_to_end_id: format!("E2E-{i}"),
                creditor_name: format!("Creditor {i}"),
                creditor_iban: "FR1420041010050500013M02606".into(),
                creditor_bic: "PSSTFRPP".into(),
                amount: "10.00".into(),
                currency: "EUR".into(),
                // Incompressible remittance text keeps the deflated payload
                // above one segment.
                remittance: Some(hex::encode(noise)),
            }
        })
        .collect();
    CctParams {
        message_id: Some("MSG-BULK".into()),
        initiating_party: "ACME GmbH".into(),
        payment_infos: vec![PaymentInfo {
            payment_info_id: "PMT-BULK".into(),
            debtor_name: "ACME GmbH".into(),
            debtor_iban: "DE02120300000000202051".into(),
            debtor_bic: "BYLADEM1001".into(),
            requested_execution_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
            transfers,
        }],
    }
}

#[tokio::test]
async fn cct_upload_spans_two_segments() {
    let server = MockServer::start().await;
    mount(
        &server,
        "Initialisation",
        signed_response(ResponsePlan {
            segment: Some((1, false)),
            order_id: Some("A0B1"),
            business: Some("000000"),
            ..Default::default()
        }),
    )
    .await;
    mount(
        &server,
        ">Transfer<",
        signed_response(ResponsePlan {
            phase: "Transfer",
            segment: Some((2, true)),
            business: Some("000000"),
            ..Default::default()
        }),
    )
    .await;

    let client = client_for(&server, Some(bank_keys()));
    let response = client.cct(large_cct_params()).await.unwrap();
    assert!(response.status.is_success());
    assert_eq!(response.status.order_id.as_deref(), Some("A0B1"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let init_body = String::from_utf8_lossy(&requests[0].body).into_owned();
    assert!(init_body.contains("<NumSegments>2</NumSegments>"));
    assert!(init_body.contains("<DataEncryptionInfo"));
    assert!(init_body.contains("<OrderType>CCT</OrderType>"));

    let transfer_body = String::from_utf8_lossy(&requests[1].body).into_owned();
    assert!(transfer_body.contains(&format!("<TransactionID>{TXID}</TransactionID>")));
    assert!(transfer_body.contains("<SegmentNumber lastSegment=\"true\">2</SegmentNumber>"));
    assert!(!transfer_body.contains("DataEncryptionInfo"));
}

// ── Bank return codes are data, not errors ───────────────────────────────────

#[tokio::test]
async fn bank_rejection_surfaces_as_return_code() {
    let server = MockServer::start().await;
    mount(
        &server,
        "Initialisation",
        signed_response(ResponsePlan {
            technical: "091003",
            ..Default::default()
        }),
    )
    .await;

    let client = client_for(&server, Some(bank_keys()));
    let response = client.sta(DateRangeParams::default()).await.unwrap();
    assert!(!response.status.is_success());
    assert_eq!(response.status.technical_code.0, 91_003);
    assert!(response.content.is_none());

    // No transfer or receipt was attempted.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

// ── INI over the wire ────────────────────────────────────────────────────────

#[tokio::test]
async fn ini_round_trip_reports_bank_status() {
    let server = MockServer::start().await;
    let response = r#"<?xml version="1.0" encoding="UTF-8"?>
<ebicsKeyManagementResponse xmlns="urn:org:ebics:H004" Version="H004" Revision="1">
  <header authenticate="true">
    <static/>
    <mutable>
      <ReturnCode>000000</ReturnCode>
      <ReportText>[EBICS_OK] OK</ReportText>
    </mutable>
  </header>
  <body>
    <ReturnCode authenticate="true">000000</ReturnCode>
  </body>
</ebicsKeyManagementResponse>"#;
    mount(&server, "ebicsUnsecuredRequest", response.to_string()).await;

    // INI needs no bank keys.
    let client = client_for(&server, None);
    let result = client.ini().await.unwrap();
    assert!(result.status.is_success());
}
