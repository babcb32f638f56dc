//! CLI configuration -- thin wrapper around `pushsync_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--registry, --access-token, etc.).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use pushsync_core::{AuthCredentials, SyncConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use pushsync_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config, state_path,
    store_access_token,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build a `SyncConfig` from the config file, profile, and CLI overrides.
pub fn build_sync_config(global: &GlobalOpts) -> Result<SyncConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        cfg.profile(&profile_name)?;
    }

    // No profile found -- build from CLI flags / env vars alone
    from_flags(global, &cfg.defaults)
}

/// Translate a `Profile` + global flags into a `SyncConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<SyncConfig, CliError> {
    let mut config = pushsync_config::profile_to_sync_config(profile, profile_name, defaults)?;
    apply_overrides(&mut config, global)?;
    Ok(config)
}

fn from_flags(global: &GlobalOpts, defaults: &Defaults) -> Result<SyncConfig, CliError> {
    let url_str = global.registry.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let mut config = SyncConfig::new(parse_url("registry", url_str)?);
    config.timeout = Duration::from_secs(defaults.timeout);
    if defaults.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    apply_overrides(&mut config, global)?;
    Ok(config)
}

fn apply_overrides(config: &mut SyncConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref raw) = global.registry {
        config.registry_url = parse_url("registry", raw)?;
    }
    if let Some(ref raw) = global.token_service {
        config.token_service_url = Some(parse_url("token-service", raw)?);
    }
    if let Some(ref token) = global.access_token {
        config.auth = AuthCredentials::AccessToken(SecretString::from(token.clone()));
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(())
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// State file path: explicit flag, else the platform data directory.
pub fn resolve_state_path(flag: Option<&PathBuf>) -> PathBuf {
    flag.cloned().unwrap_or_else(state_path)
}
