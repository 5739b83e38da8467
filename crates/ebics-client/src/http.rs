use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use ebics_core::EbicsError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Thin POST transport shared by all transactions of one client.
///
/// Timeouts surface as [`EbicsError::Transport`]; EBICS has its own recovery
/// protocol, so the transport never retries.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: &str, tls_insecure: bool) -> Result<Self, EbicsError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(tls_insecure)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EbicsError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// POST one EBICS document, returning the response body.
    pub async fn post(&self, xml: String) -> Result<String, EbicsError> {
        debug!(url = %self.url, bytes = xml.len(), "posting ebics request");
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
            .body(xml)
            .send()
            .await
            .map_err(|e| EbicsError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EbicsError::HttpStatus {
                status: status.as_u16(),
            });
        }
        response
            .text()
            .await
            .map_err(|e| EbicsError::Transport(e.to_string()))
    }
}
