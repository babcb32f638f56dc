//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use pushsync_config::ConfigError;
use pushsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {url}")]
    #[diagnostic(
        code(pushsync::connection_failed),
        help(
            "Check the registry and token service URLs in your profile.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Rate limited by the registry")]
    #[diagnostic(
        code(pushsync::rate_limited),
        help("Retry after {retry_after_secs}s.")
    )]
    RateLimited { retry_after_secs: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(pushsync::auth_failed),
        help(
            "Verify the access token for this profile.\n\
             Store one with: pushsync config set-token --profile <name>\n\
             Or set PUSHSYNC_ACCESS_TOKEN."
        )
    )]
    AuthFailed { message: String },

    // ── Token service ────────────────────────────────────────────────
    #[error("Token service failed: {message}")]
    #[diagnostic(
        code(pushsync::token_service),
        help("{hint}")
    )]
    TokenService { message: String, hint: String },

    #[error("No token service configured")]
    #[diagnostic(
        code(pushsync::no_token_service),
        help(
            "Set token_service_url in your profile, pass --token-service,\n\
             or supply a device token directly with --token."
        )
    )]
    NoTokenService,

    // ── Registry ─────────────────────────────────────────────────────
    #[error("Registry error: {message}")]
    #[diagnostic(code(pushsync::registry))]
    Registry { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pushsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(pushsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: pushsync config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No registry configured")]
    #[diagnostic(
        code(pushsync::no_config),
        help(
            "Create a profile with: pushsync config init\n\
             Expected at: {path}\n\
             Or pass --registry."
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{name}' already exists")]
    #[diagnostic(code(pushsync::profile_exists), help("Use --force to overwrite it."))]
    ProfileExists { name: String },

    #[error(transparent)]
    #[diagnostic(code(pushsync::config))]
    Config(Box<figment::Error>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(pushsync::timeout),
        help("Increase timeout with --timeout or check registry responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(pushsync::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(pushsync::json), help("Each input line must be one JSON object."))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::RateLimited { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::NoTokenService
            | Self::ProfileExists { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::RateLimited { retry_after_secs } => {
                CliError::RateLimited { retry_after_secs }
            }

            CoreError::TokenService { message, transient } => CliError::TokenService {
                message,
                hint: if transient {
                    "The failure looks temporary; run the command again.".into()
                } else {
                    "Check the token service URL and credentials.".into()
                },
            },

            // Only reachable if a caller asks the provider directly.
            CoreError::PermissionDenied => CliError::TokenService {
                message: "notification permission denied".into(),
                hint: "The subscriber has not granted push permission.".into(),
            },

            CoreError::Registry { message, .. } => CliError::Registry { message },

            CoreError::Config { message } => {
                if message.contains("token service") {
                    CliError::NoTokenService
                } else {
                    CliError::Validation {
                        field: "config".into(),
                        reason: message,
                    }
                }
            }

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name, available } => CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            ConfigError::Serialization(e) => CliError::Internal(e.to_string()),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::AuthenticationFailed {
                    message: "bad token".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::ConnectionFailed {
                    url: "https://iid.example.com".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (CoreError::Timeout { timeout_secs: 5 }, exit_code::TIMEOUT),
            (
                CoreError::TokenService {
                    message: "502".into(),
                    transient: true,
                },
                exit_code::GENERAL,
            ),
            (
                CoreError::Config {
                    message: "no token service URL configured".into(),
                },
                exit_code::USAGE,
            ),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn missing_profile_lists_available() {
        let err = CliError::from(ConfigError::ProfileNotFound {
            name: "staging".into(),
            available: vec!["lab".into(), "prod".into()],
        });
        match err {
            CliError::ProfileNotFound { available, .. } => assert_eq!(available, "lab, prod"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
