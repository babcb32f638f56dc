// ── Runtime sync configuration ──
//
// These types describe *where* the remote collaborators live and how to
// authenticate with them. They carry credential data and connection
// tuning, but never touch disk. The CLI builds a `SyncConfig` and hands
// it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use pushsync_api::{Credentials, TlsMode, TransportConfig};

/// How to authenticate with the registry and token service.
#[derive(Debug, Clone, Default)]
pub enum AuthCredentials {
    /// OAuth2 access token (preferred).
    AccessToken(SecretString),
    /// Legacy server key.
    ServerKey(SecretString),
    /// No authentication.
    #[default]
    None,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-hosted registries in development).
    DangerAcceptInvalid,
}

/// Configuration for talking to the remote collaborators.
///
/// Built by the CLI, passed to [`crate::remote`] -- core never reads config files.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Topic registry base URL.
    pub registry_url: Url,
    /// Device-token service base URL. `None` when tokens come from elsewhere.
    pub token_service_url: Option<Url>,
    /// Authentication method and credentials.
    pub auth: AuthCredentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl SyncConfig {
    /// Config pointing at `registry_url` with no token service, no auth,
    /// strict TLS, and a 30 second timeout.
    pub fn new(registry_url: Url) -> Self {
        Self {
            registry_url,
            token_service_url: None,
            auth: AuthCredentials::None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Transport settings for the API clients.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    /// API-level credentials.
    pub fn credentials(&self) -> Credentials {
        match &self.auth {
            AuthCredentials::AccessToken(token) => Credentials::Bearer {
                token: token.clone(),
            },
            AuthCredentials::ServerKey(key) => Credentials::ServerKey { key: key.clone() },
            AuthCredentials::None => Credentials::Anonymous,
        }
    }
}
