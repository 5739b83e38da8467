//! ebics-client
//!
//! The EBICS transaction engine and its public façade. A configured
//! [`EbicsClient`] drives the Initialisation → Transfer → Receipt dialog over
//! HTTPS: requests are built from typed fragments, authenticated with an
//! enveloped XML-DSIG, and order data travels zlib-compressed, AES-128-CBC
//! encrypted under an RSA-wrapped session key, Base64-wrapped and segmented.

pub mod client;
pub mod codec;
pub mod commands;
pub mod config;
pub mod http;
pub mod request;
pub mod response;
pub mod transaction;

#[cfg(test)]
mod tests;

pub use client::EbicsClient;
pub use commands::cct::{CctParams, CreditTransfer, PaymentInfo};
pub use commands::cdd::{CddParams, DebitPaymentInfo, DirectDebit};
pub use commands::hpd::{AccessParams, HpdResponse, ProtocolParams};
pub use commands::hpb::HpbResponse;
pub use commands::{DateRangeParams, DownloadTextResponse, KeyManagementResponse, UploadResponse};
pub use config::EbicsConfig;
