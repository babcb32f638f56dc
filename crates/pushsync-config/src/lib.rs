//! Shared configuration for pushsync.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `pushsync_core::SyncConfig`. The CLI adds
//! `GlobalOpts`-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pushsync_core::{AuthCredentials, SyncConfig, TlsVerification};

const KEYRING_SERVICE: &str = "pushsync";
pub const DEFAULT_REGISTRY_URL: &str = "https://iid.googleapis.com";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String, available: Vec<String> },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named registry profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named registry profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Topic registry base URL.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Device-token service base URL.
    pub token_service_url: Option<String>,

    /// Auth mode: "access-token", "server-key", or "none".
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,

    /// Access token or server key (plaintext; prefer keyring or env var).
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    pub access_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            token_service_url: None,
            auth_mode: default_auth_mode(),
            access_token: None,
            access_token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

impl Profile {
    /// Check the URLs without touching credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url("registry_url", &self.registry_url)?;
        if let Some(ref raw) = self.token_service_url {
            parse_url("token_service_url", raw)?;
        }
        Ok(())
    }
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.into()
}
fn default_auth_mode() -> String {
    "access-token".into()
}

impl Config {
    /// The profile to use: explicit name, then `default_profile`, then "default".
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles.get(name).ok_or_else(|| {
            let mut available: Vec<String> = self.profiles.keys().cloned().collect();
            available.sort();
            ConfigError::ProfileNotFound {
                name: name.into(),
                available,
            }
        })
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "pushsync", "pushsync").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the CLI keeps its retained-token state.
pub fn state_path() -> PathBuf {
    ProjectDirs::from("com", "pushsync", "pushsync").map_or_else(
        || dirs_fallback().join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("pushsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path, layered over defaults and under
/// `PUSHSYNC_*` environment variables (`__` separates nested keys).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PUSHSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the access token from the credential chain.
///
/// Order: the profile's `access_token_env` variable, the system keyring
/// (`pushsync` / `<profile>/access-token`), then plaintext in config.
pub fn resolve_access_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's access_token_env → env var lookup
    if let Some(ref env_name) = profile.access_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/access-token")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .access_token
        .as_ref()
        .map(|t| SecretString::from(t.clone()))
}

/// Store an access token in the system keyring for `profile_name`.
pub fn store_access_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/access-token"))
        .and_then(|entry| entry.set_password(token))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

/// Resolve `AuthCredentials` from a profile's `auth_mode` field.
///
/// A missing secret is not an error here: some deployments front the
/// registry with an authenticating proxy.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    match profile.auth_mode.as_str() {
        "access-token" => Ok(resolve_access_token(profile, profile_name)
            .map_or(AuthCredentials::None, AuthCredentials::AccessToken)),
        "server-key" => Ok(resolve_access_token(profile, profile_name)
            .map_or(AuthCredentials::None, AuthCredentials::ServerKey)),
        "none" => Ok(AuthCredentials::None),
        other => Err(ConfigError::Validation {
            field: "auth_mode".into(),
            reason: format!("expected 'access-token', 'server-key', or 'none', got '{other}'"),
        }),
    }
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `SyncConfig` from a profile, without CLI flag overrides.
pub fn profile_to_sync_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SyncConfig, ConfigError> {
    let registry_url = parse_url("registry_url", &profile.registry_url)?;
    let token_service_url = profile
        .token_service_url
        .as_deref()
        .map(|raw| parse_url("token_service_url", raw))
        .transpose()?;

    let auth = resolve_auth(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(SyncConfig {
        registry_url,
        token_service_url,
        auth,
        tls,
        timeout,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::result_large_err)]
mod tests {
    use std::path::Path;

    use figment::Jail;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
        default_profile = "prod"

        [defaults]
        timeout = 10

        [profiles.prod]
        registry_url = "https://iid.example.com"
        token_service_url = "https://tokens.example.com/push"
        access_token = "plain-token"
        timeout = 5

        [profiles.lab]
        auth_mode = "none"
        insecure = true
    "#;

    #[test]
    fn loads_profiles_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();

            assert_eq!(cfg.active_profile_name(None), "prod");
            assert_eq!(cfg.active_profile_name(Some("lab")), "lab");
            assert_eq!(cfg.defaults.timeout, 10);
            assert_eq!(cfg.profiles.len(), 2);
            assert_eq!(cfg.profile("lab").unwrap().registry_url, DEFAULT_REGISTRY_URL);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("PUSHSYNC_DEFAULTS__TIMEOUT", "99");
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.defaults.timeout, 99);
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert!(cfg.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn unknown_profile_lists_available() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            match cfg.profile("staging") {
                Err(ConfigError::ProfileNotFound { available, .. }) => {
                    assert_eq!(available, vec!["lab".to_string(), "prod".to_string()]);
                }
                other => panic!("expected ProfileNotFound, got {other:?}"),
            }
            Ok(())
        });
    }

    #[test]
    fn profile_translates_to_sync_config() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            let sync =
                profile_to_sync_config(cfg.profile("lab").unwrap(), "lab", &cfg.defaults).unwrap();

            assert_eq!(sync.tls, TlsVerification::DangerAcceptInvalid);
            assert_eq!(sync.timeout, Duration::from_secs(10));
            assert!(sync.token_service_url.is_none());
            assert!(matches!(sync.auth, AuthCredentials::None));
            Ok(())
        });
    }

    #[test]
    fn access_token_env_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("PUSHSYNC_TEST_TOKEN", "from-env");
            let profile = Profile {
                registry_url: DEFAULT_REGISTRY_URL.into(),
                auth_mode: "access-token".into(),
                access_token: Some("plain".into()),
                access_token_env: Some("PUSHSYNC_TEST_TOKEN".into()),
                ..Profile::default()
            };
            let token = resolve_access_token(&profile, "jail-test-profile").unwrap();
            assert_eq!(token.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn bad_auth_mode_is_rejected() {
        let profile = Profile {
            registry_url: DEFAULT_REGISTRY_URL.into(),
            auth_mode: "oauth1".into(),
            ..Profile::default()
        };
        assert!(matches!(
            resolve_auth(&profile, "x"),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn bad_registry_url_is_rejected() {
        let profile = Profile {
            registry_url: "not a url".into(),
            auth_mode: "none".into(),
            ..Profile::default()
        };
        let err = profile_to_sync_config(&profile, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "registry_url"));
    }
}
