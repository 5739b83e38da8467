//! ebics-cli
//!
//! Command-line front end for the EBICS client library. Loads a JSON
//! configuration (bank endpoint, subscriber identifiers, PEM key paths) and
//! runs one order per invocation.
//!
//! Usage:
//!   ebics-cli --config <path> ini
//!   ebics-cli --config <path> hia
//!   ebics-cli --config <path> hpb
//!   ebics-cli --config <path> hpd
//!   ebics-cli --config <path> sta [--start 2026-01-01 --end 2026-01-31]
//!   ebics-cli --config <path> ptk [--start ... --end ...]
//!   ebics-cli --config <path> cct --order <pain-params.json>
//!   ebics-cli --config <path> cdd --order <pain-params.json>
//!   ebics-cli --config <path> spr

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, warn};

use ebics_client::{
    CctParams, CddParams, DateRangeParams, EbicsClient, EbicsConfig,
};
use ebics_core::return_code::OrderStatus;
use ebics_core::types::{KeyVersion, SchemaVersion, UserIdent};
use ebics_core::BankKeys;
use ebics_crypto::KeyPair;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "ebics-cli",
    version,
    about = "EBICS client — key management, statements and SEPA orders"
)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, global = true, default_value = "ebics.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Announce the order signature public key (first subscription step).
    Ini,

    /// Announce the authentication and encryption public keys.
    Hia,

    /// Download the bank's public keys and store them.
    Hpb,

    /// Download bank parameters (supported versions and capabilities).
    Hpd,

    /// Download an account statement (MT940).
    Sta {
        /// Statement period start (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Statement period end (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Download the customer protocol log.
    Ptk {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Upload a SEPA credit transfer (pain.001 parameters as JSON).
    Cct {
        /// Path to the order parameters JSON.
        #[arg(long)]
        order: PathBuf,
    },

    /// Upload a SEPA direct debit (pain.008 parameters as JSON).
    Cdd {
        #[arg(long)]
        order: PathBuf,
    },

    /// Suspend this subscriber's access at the bank.
    Spr,
}

// ── Configuration file ────────────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct ConfigFile {
    url: String,
    #[serde(default = "default_version")]
    version: SchemaVersion,
    #[serde(default = "default_revision")]
    revision: u32,
    #[serde(default)]
    tls_insecure: bool,
    host_id: String,
    partner_id: String,
    user_id: String,
    sign_key_pem: PathBuf,
    auth_key_pem: PathBuf,
    crypt_key_pem: PathBuf,
    /// Where HPB results are persisted between invocations.
    #[serde(default)]
    bank_keys_file: Option<PathBuf>,
}

fn default_version() -> SchemaVersion {
    SchemaVersion::H004
}

fn default_revision() -> u32 {
    1
}

fn load_key(version: KeyVersion, path: &Path) -> anyhow::Result<KeyPair> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("reading {} key {}", version, path.display()))?;
    KeyPair::from_pem(version, &pem)
        .with_context(|| format!("decoding {} key {}", version, path.display()))
}

fn build_config(file: &ConfigFile) -> anyhow::Result<EbicsConfig> {
    let bank = match &file.bank_keys_file {
        Some(path) if path.exists() => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading bank keys {}", path.display()))?;
            let keys: BankKeys =
                serde_json::from_str(&json).context("parsing persisted bank keys")?;
            info!(path = %path.display(), "loaded persisted bank keys");
            Some(keys)
        }
        _ => None,
    };

    Ok(EbicsConfig {
        url: file.url.clone(),
        version: file.version,
        revision: file.revision,
        tls_insecure: file.tls_insecure,
        user: UserIdent::new(&file.host_id, &file.partner_id, &file.user_id),
        sign_key: load_key(KeyVersion::A005, &file.sign_key_pem)?,
        auth_key: load_key(KeyVersion::X002, &file.auth_key_pem)?,
        crypt_key: load_key(KeyVersion::E002, &file.crypt_key_pem)?,
        bank,
    })
}

fn load_order_params<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading order parameters {}", path.display()))?;
    serde_json::from_str(&json).context("parsing order parameters")
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_status(status: &OrderStatus) {
    println!("technical return code: {}", status.technical_code);
    if let Some(business) = status.business_code {
        println!("business return code:  {business}");
    }
    if !status.report_text.is_empty() {
        println!("report: {}", status.report_text);
    }
    if let Some(order_id) = &status.order_id {
        println!("order id: {order_id}");
    }
    if status.technical_code.is_recovery_sync() {
        warn!("bank reported recovery synchronisation; no automatic retry is performed");
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let file: ConfigFile = {
        let json = std::fs::read_to_string(&args.config)
            .with_context(|| format!("reading config {}", args.config.display()))?;
        serde_json::from_str(&json).context("parsing config")?
    };
    let bank_keys_file = file.bank_keys_file.clone();
    let client = EbicsClient::new(build_config(&file)?).context("building EBICS client")?;

    match args.command {
        Command::Ini => {
            let response = client.ini().await?;
            print_status(&response.status);
        }
        Command::Hia => {
            let response = client.hia().await?;
            print_status(&response.status);
        }
        Command::Hpb => {
            let response = client.hpb().await?;
            print_status(&response.status);
            match (&response.bank_keys, &bank_keys_file) {
                (Some(keys), Some(path)) => {
                    std::fs::write(path, serde_json::to_string_pretty(keys)?)
                        .with_context(|| format!("writing bank keys {}", path.display()))?;
                    info!(path = %path.display(), "bank keys persisted");
                }
                (Some(_), None) => {
                    warn!("no bank_keys_file configured; keys will be fetched again next run");
                }
                (None, _) => bail!("bank rejected HPB; no keys received"),
            }
        }
        Command::Hpd => {
            let response = client.hpd().await?;
            print_status(&response.status);
            if let Some(access) = response.access {
                println!("institute: {}", access.institute);
                println!("host:      {}", access.host_id);
                println!("url:       {}", access.url);
            }
            if let Some(protocol) = response.protocol {
                println!("protocols: {}", protocol.protocols.join(", "));
                println!("recovery supported: {}", protocol.recovery_supported);
            }
        }
        Command::Sta { start, end } => {
            let response = client.sta(DateRangeParams { start, end }).await?;
            print_status(&response.status);
            if let Some(statement) = response.content {
                println!("{statement}");
            }
        }
        Command::Ptk { start, end } => {
            let response = client.ptk(DateRangeParams { start, end }).await?;
            print_status(&response.status);
            if let Some(log) = response.content {
                println!("{log}");
            }
        }
        Command::Cct { order } => {
            let params: CctParams = load_order_params(&order)?;
            let response = client.cct(params).await?;
            print_status(&response.status);
        }
        Command::Cdd { order } => {
            let params: CddParams = load_order_params(&order)?;
            let response = client.cdd(params).await?;
            print_status(&response.status);
        }
        Command::Spr => {
            let response = client.spr().await?;
            print_status(&response.status);
        }
    }

    Ok(())
}
