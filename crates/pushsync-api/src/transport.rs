// Shared transport configuration and response handling.
//
// The registry and token clients share TLS, timeout, and error-mapping
// logic through this module, avoiding duplicated builder code.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::Error;

const USER_AGENT: &str = concat!("pushsync/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// TLS verification mode (api-level mirror of core's `TlsVerification`).
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-hosted registries in development).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the given default headers.
    pub fn build_client(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Error body shape shared by Google-style APIs: `{"error": "..."}` or
/// `{"error": {"message": "..."}}`.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Object { message: Option<String> },
}

/// Normalise a base URL so relative paths join beneath it.
pub(crate) fn normalize_base_url(raw: &str) -> Result<url::Url, Error> {
    let mut url = url::Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

/// Decode a successful JSON response, or map the failure status.
pub(crate) async fn handle_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(status, resp).await);
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

/// Map a non-success response into the matching `Error` variant.
pub(crate) async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Error::RateLimited { retry_after_secs };
    }

    let raw = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(ErrorResponse {
            error: ErrorDetail::Message(msg),
        }) => msg,
        Ok(ErrorResponse {
            error: ErrorDetail::Object { message: Some(msg) },
        }) => msg,
        _ if raw.is_empty() => status.to_string(),
        _ => raw.chars().take(200).collect(),
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::Authentication { message };
    }

    Error::Http {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::normalize_base_url;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = normalize_base_url("https://iid.googleapis.com").unwrap();
        assert_eq!(url.as_str(), "https://iid.googleapis.com/");
        assert_eq!(
            url.join("iid/v1:batchAdd").unwrap().as_str(),
            "https://iid.googleapis.com/iid/v1:batchAdd"
        );
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let url = normalize_base_url("http://localhost:8080/push/").unwrap();
        assert_eq!(
            url.join("v1/tokens").unwrap().as_str(),
            "http://localhost:8080/push/v1/tokens"
        );
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(normalize_base_url("not a url").is_err());
    }
}
