// Device-token service HTTP client
//
// Exchanges a subscriber identity for the notification permission state
// and, when granted, an opaque device token.

use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::{TokenRequest, TokenResponse};
use crate::transport::{self, TransportConfig};

/// Async client for the device-token service.
pub struct TokenClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TokenClient {
    pub fn new(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(credentials.headers()?)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: transport::normalize_base_url(base_url)?,
        })
    }

    /// Request permission state and a device token for `subscriber`.
    ///
    /// `POST {base}/v1/tokens` with `{"subscriber": "..."}`
    pub async fn request_token(&self, subscriber: &str) -> Result<TokenResponse, Error> {
        let url = self.base_url.join("v1/tokens")?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(&TokenRequest { subscriber })
            .send()
            .await?;
        transport::handle_json(resp).await
    }
}
