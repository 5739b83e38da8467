use std::sync::RwLock;

use tracing::info;

use ebics_core::{BankKeys, EbicsError};

use crate::commands::{
    CctCommand, CctParams, CddCommand, CddParams, Command, DateRangeParams, DownloadTextResponse,
    HiaCommand, HpbCommand, HpdCommand, IniCommand, KeyManagementResponse, PtkCommand, SprCommand,
    StaCommand, UploadResponse,
};
use crate::commands::hpb::HpbResponse;
use crate::commands::hpd::HpdResponse;
use crate::config::EbicsConfig;
use crate::http::HttpTransport;
use crate::transaction::Engine;

/// The client façade: one method per order type over a shared configuration
/// and HTTP client.
///
/// The bank key slot is written once by a successful [`hpb`](Self::hpb) and
/// read-only afterwards. The façade itself is a stateless dispatcher and may
/// be shared across tasks.
///
/// Cancelling a future between phases is safe for downloads; cancelling an
/// upload after a successful Initialisation leaves transaction state on the
/// bank side that may require operator intervention.
pub struct EbicsClient {
    config: EbicsConfig,
    transport: HttpTransport,
    bank: RwLock<Option<BankKeys>>,
}

impl EbicsClient {
    pub fn new(config: EbicsConfig) -> Result<Self, EbicsError> {
        config.validate()?;
        let transport = HttpTransport::new(&config.url, config.tls_insecure)?;
        let bank = RwLock::new(config.bank.clone());
        Ok(Self {
            config,
            transport,
            bank,
        })
    }

    /// Bank keys currently in effect (from config seed or HPB).
    pub fn bank_keys(&self) -> Option<BankKeys> {
        read_lock(&self.bank).clone()
    }

    /// Seed bank keys persisted elsewhere, e.g. from an earlier session.
    pub fn set_bank_keys(&self, keys: BankKeys) {
        *write_lock(&self.bank) = Some(keys);
    }

    fn engine(&self) -> Engine<'_> {
        Engine {
            transport: &self.transport,
            config: &self.config,
            bank: self.bank_keys(),
        }
    }

    async fn run<C: Command>(&self, command: C) -> Result<C::Response, EbicsError> {
        let outcome = self.engine().run(&command).await?;
        command.deserialize(outcome)
    }

    // ── Key management ───────────────────────────────────────────────────────

    /// INI: announce the order signature public key.
    pub async fn ini(&self) -> Result<KeyManagementResponse, EbicsError> {
        self.run(IniCommand).await
    }

    /// HIA: announce the authentication and encryption public keys.
    pub async fn hia(&self) -> Result<KeyManagementResponse, EbicsError> {
        self.run(HiaCommand).await
    }

    /// HPB: download the bank keys; stores them on success.
    pub async fn hpb(&self) -> Result<HpbResponse, EbicsError> {
        let response = self.run(HpbCommand).await?;
        if let Some(keys) = &response.bank_keys {
            *write_lock(&self.bank) = Some(keys.clone());
            info!(
                auth_digest = %hex::encode(keys.auth.digest),
                crypt_digest = %hex::encode(keys.crypt.digest),
                "bank keys stored"
            );
        }
        Ok(response)
    }

    /// SPR: suspend this subscriber's access.
    pub async fn spr(&self) -> Result<UploadResponse, EbicsError> {
        self.run(SprCommand).await
    }

    // ── Downloads ────────────────────────────────────────────────────────────

    /// HPD: download bank parameters.
    pub async fn hpd(&self) -> Result<HpdResponse, EbicsError> {
        self.run(HpdCommand).await
    }

    /// PTK: download the customer protocol log.
    pub async fn ptk(&self, params: DateRangeParams) -> Result<DownloadTextResponse, EbicsError> {
        self.run(PtkCommand { params }).await
    }

    /// STA: download an account statement (MT940).
    pub async fn sta(&self, params: DateRangeParams) -> Result<DownloadTextResponse, EbicsError> {
        self.run(StaCommand { params }).await
    }

    // ── Uploads ──────────────────────────────────────────────────────────────

    /// CCT: upload a SEPA credit transfer (pain.001).
    pub async fn cct(&self, params: CctParams) -> Result<UploadResponse, EbicsError> {
        self.run(CctCommand { params }).await
    }

    /// CDD: upload a SEPA direct debit (pain.008).
    pub async fn cdd(&self, params: CddParams) -> Result<UploadResponse, EbicsError> {
        self.run(CddCommand { params }).await
    }
}

// Recover the data on a poisoned lock; bank keys are plain values and cannot
// be left in a torn state.
fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
