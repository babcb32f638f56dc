// ── Core error types ──
//
// Domain errors surfaced by pushsync-core. Consumers never see raw HTTP
// status codes or JSON parse failures: `From<pushsync_api::Error>`
// translates transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Token provider ───────────────────────────────────────────────
    /// The user declined notification permission. Non-fatal: the engine
    /// turns this into a diagnostic and a clean `PermissionDenied` outcome.
    #[error("Notification permission denied")]
    PermissionDenied,

    #[error("Token service failure: {message}")]
    TokenService { message: String, transient: bool },

    // ── Registry ─────────────────────────────────────────────────────
    #[error("Registry call failed: {message}")]
    Registry {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    /// Returns `true` if re-triggering reconciliation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TokenService { transient, .. } => *transient,
            Self::Registry { status, .. } => status.is_some_and(|s| s >= 500),
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::RateLimited { .. } => {
                true
            }
            _ => false,
        }
    }

    /// Re-tag a transport error raised by the token service.
    pub(crate) fn from_token_service(err: pushsync_api::Error) -> Self {
        let transient = err.is_transient();
        match CoreError::from(err) {
            e @ (CoreError::AuthenticationFailed { .. } | CoreError::Config { .. }) => e,
            other => CoreError::TokenService {
                message: other.to_string(),
                transient,
            },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<pushsync_api::Error> for CoreError {
    fn from(err: pushsync_api::Error) -> Self {
        let status = err.status();
        match err {
            pushsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            pushsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Registry {
                        message: e.to_string(),
                        status,
                    }
                }
            }
            pushsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            pushsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            pushsync_api::Error::RateLimited { retry_after_secs } => {
                CoreError::RateLimited { retry_after_secs }
            }
            pushsync_api::Error::Http { status, message } => CoreError::Registry {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            pushsync_api::Error::Registry { topic, message } => CoreError::Registry {
                message: format!("topic '{topic}': {message}"),
                status: None,
            },
            pushsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn auth_errors_map_to_authentication_failed() {
        let err = CoreError::from(pushsync_api::Error::Authentication {
            message: "nope".into(),
        });
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn token_service_errors_keep_transience() {
        let err = CoreError::from_token_service(pushsync_api::Error::Http {
            status: 503,
            message: "down".into(),
        });
        match err {
            CoreError::TokenService { transient, .. } => assert!(transient),
            other => panic!("expected TokenService, got {other:?}"),
        }
    }

    #[test]
    fn http_status_survives_conversion() {
        let err = CoreError::from(pushsync_api::Error::Http {
            status: 502,
            message: "bad gateway".into(),
        });
        assert!(matches!(err, CoreError::Registry { status: Some(502), .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn rejected_topic_is_registry_error() {
        let err = CoreError::from(pushsync_api::Error::Registry {
            topic: "community_c1".into(),
            message: "INVALID_ARGUMENT".into(),
        });
        assert_eq!(
            err.to_string(),
            "Registry call failed: topic 'community_c1': INVALID_ARGUMENT"
        );
    }
}
