//! Namespace URIs, algorithm identifiers and wire element/attribute names.
//!
//! EBICS XML is small and stable; requests and responses are emitted and
//! parsed directly against this table rather than through a reflective
//! serializer.

pub use ebics_core::constants::{NS_EBICS_H004, NS_EBICS_H005};

// ── Namespaces ───────────────────────────────────────────────────────────────

pub const NS_XMLDSIG: &str = "http://www.w3.org/2000/09/xmldsig#";
pub const NS_SIGNATURE_DATA: &str = "http://www.ebics.org/S001";
pub const NS_PAIN_001: &str = "urn:iso:std:iso:20022:tech:xsd:pain.001.001.03";
pub const NS_PAIN_008: &str = "urn:iso:std:iso:20022:tech:xsd:pain.008.001.02";
pub const NS_XML: &str = "http://www.w3.org/XML/1998/namespace";

// ── XML-DSIG algorithms and the constrained reference ────────────────────────

pub const ALG_C14N: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";
pub const ALG_RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const ALG_SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
pub const REFERENCE_URI: &str = "#xpointer(//*[@authenticate='true'])";

// ── Attributes ───────────────────────────────────────────────────────────────

pub const ATTR_AUTHENTICATE: &str = "authenticate";
pub const ATTR_VERSION: &str = "Version";
pub const ATTR_REVISION: &str = "Revision";
pub const ATTR_ALGORITHM: &str = "Algorithm";
pub const ATTR_URI: &str = "URI";
pub const ATTR_LAST_SEGMENT: &str = "lastSegment";

// ── Envelope roots ───────────────────────────────────────────────────────────

pub const EBICS_REQUEST: &str = "ebicsRequest";
pub const EBICS_RESPONSE: &str = "ebicsResponse";
pub const EBICS_UNSECURED_REQUEST: &str = "ebicsUnsecuredRequest";
pub const EBICS_NO_PUB_KEY_DIGESTS_REQUEST: &str = "ebicsNoPubKeyDigestsRequest";
pub const EBICS_KEY_MANAGEMENT_RESPONSE: &str = "ebicsKeyManagementResponse";

// ── Header and body ──────────────────────────────────────────────────────────

pub const HEADER: &str = "header";
pub const STATIC: &str = "static";
pub const MUTABLE: &str = "mutable";
pub const BODY: &str = "body";
pub const AUTH_SIGNATURE: &str = "AuthSignature";

pub const HOST_ID: &str = "HostID";
pub const NONCE: &str = "Nonce";
pub const TIMESTAMP: &str = "Timestamp";
pub const PARTNER_ID: &str = "PartnerID";
pub const USER_ID: &str = "UserID";
pub const ORDER_DETAILS: &str = "OrderDetails";
pub const ORDER_TYPE: &str = "OrderType";
pub const ORDER_ID: &str = "OrderID";
pub const ORDER_ATTRIBUTE: &str = "OrderAttribute";
pub const STANDARD_ORDER_PARAMS: &str = "StandardOrderParams";
pub const DATE_RANGE: &str = "DateRange";
pub const DATE_START: &str = "Start";
pub const DATE_END: &str = "End";
pub const BANK_PUB_KEY_DIGESTS: &str = "BankPubKeyDigests";
pub const AUTHENTICATION: &str = "Authentication";
pub const ENCRYPTION: &str = "Encryption";
pub const SECURITY_MEDIUM: &str = "SecurityMedium";
pub const NUM_SEGMENTS: &str = "NumSegments";
pub const TRANSACTION_ID: &str = "TransactionID";
pub const TRANSACTION_PHASE: &str = "TransactionPhase";
pub const SEGMENT_NUMBER: &str = "SegmentNumber";
pub const RETURN_CODE: &str = "ReturnCode";
pub const REPORT_TEXT: &str = "ReportText";

// ── Data transfer ────────────────────────────────────────────────────────────

pub const DATA_TRANSFER: &str = "DataTransfer";
pub const ORDER_DATA: &str = "OrderData";
pub const DATA_ENCRYPTION_INFO: &str = "DataEncryptionInfo";
pub const ENCRYPTION_PUB_KEY_DIGEST: &str = "EncryptionPubKeyDigest";
pub const TRANSACTION_KEY: &str = "TransactionKey";
pub const TRANSFER_RECEIPT: &str = "TransferReceipt";
pub const RECEIPT_CODE: &str = "ReceiptCode";

// ── XML-DSIG elements (emitted with the `ds` prefix) ─────────────────────────

pub const DS_SIGNED_INFO: &str = "ds:SignedInfo";
pub const DS_CANONICALIZATION_METHOD: &str = "ds:CanonicalizationMethod";
pub const DS_SIGNATURE_METHOD: &str = "ds:SignatureMethod";
pub const DS_REFERENCE: &str = "ds:Reference";
pub const DS_TRANSFORMS: &str = "ds:Transforms";
pub const DS_TRANSFORM: &str = "ds:Transform";
pub const DS_DIGEST_METHOD: &str = "ds:DigestMethod";
pub const DS_DIGEST_VALUE: &str = "ds:DigestValue";
pub const DS_SIGNATURE_VALUE: &str = "ds:SignatureValue";
pub const DS_RSA_KEY_VALUE: &str = "ds:RSAKeyValue";
pub const DS_MODULUS: &str = "ds:Modulus";
pub const DS_EXPONENT: &str = "ds:Exponent";

// ── Key management order data ────────────────────────────────────────────────

pub const SIGNATURE_PUB_KEY_ORDER_DATA: &str = "SignaturePubKeyOrderData";
pub const SIGNATURE_PUB_KEY_INFO: &str = "SignaturePubKeyInfo";
pub const SIGNATURE_VERSION: &str = "SignatureVersion";
pub const HIA_REQUEST_ORDER_DATA: &str = "HIARequestOrderData";
pub const HPB_RESPONSE_ORDER_DATA: &str = "HPBResponseOrderData";
pub const AUTHENTICATION_PUB_KEY_INFO: &str = "AuthenticationPubKeyInfo";
pub const AUTHENTICATION_VERSION: &str = "AuthenticationVersion";
pub const ENCRYPTION_PUB_KEY_INFO: &str = "EncryptionPubKeyInfo";
pub const ENCRYPTION_VERSION: &str = "EncryptionVersion";
pub const PUB_KEY_VALUE: &str = "PubKeyValue";
pub const TIME_STAMP: &str = "TimeStamp";

// ── User signature data (S001) ───────────────────────────────────────────────

pub const USER_SIGNATURE_DATA: &str = "UserSignatureData";
pub const ORDER_SIGNATURE_DATA: &str = "OrderSignatureData";
pub const SIGNATURE_VALUE: &str = "SignatureValue";

// ── HPD order data ───────────────────────────────────────────────────────────

pub const HPD_RESPONSE_ORDER_DATA: &str = "HPDResponseOrderData";
pub const ACCESS_PARAMS: &str = "AccessParams";
pub const PROTOCOL_PARAMS: &str = "ProtocolParams";
pub const URL: &str = "URL";
pub const INSTITUTE: &str = "Institute";
pub const VERSION: &str = "Version";
pub const PROTOCOL: &str = "Protocol";
pub const RECOVERY: &str = "Recovery";
pub const PRE_VALIDATION: &str = "PreValidation";
pub const X509_DATA: &str = "X509Data";
pub const CLIENT_DATA_DOWNLOAD: &str = "ClientDataDownload";
pub const DOWNLOADABLE_ORDER_DATA: &str = "DownloadableOrderData";
pub const ATTR_SUPPORTED: &str = "supported";
pub const ATTR_PERSISTENT: &str = "persistent";
