//! Config subcommand handlers.

use std::collections::HashMap;
use std::io::Read as _;

use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const MASK: &str = "****";

/// Copy of the config safe to print: plaintext secrets are masked.
#[derive(Serialize)]
struct RedactedConfig<'a> {
    default_profile: Option<&'a str>,
    defaults: &'a Defaults,
    profiles: HashMap<&'a str, Profile>,
}

impl<'a> From<&'a Config> for RedactedConfig<'a> {
    fn from(cfg: &'a Config) -> Self {
        let profiles = cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                let mut p = p.clone();
                if p.access_token.is_some() {
                    p.access_token = Some(MASK.into());
                }
                (name.as_str(), p)
            })
            .collect();
        Self {
            default_profile: cfg.default_profile.as_deref(),
            defaults: &cfg.defaults,
            profiles,
        }
    }
}

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &RedactedConfig<'_>) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().copied().collect();
    names.sort_unstable();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "registry_url = \"{}\"", p.registry_url);
        if let Some(ref url) = p.token_service_url {
            let _ = writeln!(out, "token_service_url = \"{url}\"");
        }
        let _ = writeln!(out, "auth_mode = \"{}\"", p.auth_mode);
        if let Some(ref token) = p.access_token {
            let _ = writeln!(out, "access_token = \"{token}\"");
        }
        if let Some(ref env) = p.access_token_env {
            let _ = writeln!(out, "access_token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let redacted = RedactedConfig::from(&cfg);
            let out = output::render_single(
                global.output,
                &redacted,
                format_config_redacted,
                |_| "config".into(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init {
            name,
            registry_url,
            token_service_url,
            access_token_env,
            set_default,
            force,
        } => {
            let mut cfg = config::load_config_or_default();
            if cfg.profiles.contains_key(&name) && !force {
                return Err(CliError::ProfileExists { name });
            }

            let defaults = Profile::default();
            let profile = Profile {
                registry_url: registry_url.unwrap_or(defaults.registry_url),
                token_service_url,
                access_token_env,
                ..defaults
            };
            profile.validate()?;

            cfg.profiles.insert(name.clone(), profile);
            if set_default || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(name.clone());
            }
            config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!("✓ Profile '{name}' written to {}", config::config_path().display());
                eprintln!("  Store an access token with: pushsync config set-token --profile {name}");
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: pushsync config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            cfg.profile(&profile_name)?;

            let mut token = String::new();
            std::io::stdin().read_to_string(&mut token)?;
            let token = token.trim();
            if token.is_empty() {
                return Err(CliError::Validation {
                    field: "access_token".into(),
                    reason: "no token on stdin".into(),
                });
            }

            config::store_access_token(&profile_name, token)?;
            if !global.quiet {
                eprintln!("✓ Access token for '{profile_name}' stored in system keyring");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_plaintext_tokens() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "prod".into(),
            Profile {
                registry_url: "https://iid.example.com".into(),
                auth_mode: "access-token".into(),
                access_token: Some("ya29.secret".into()),
                ..Profile::default()
            },
        );

        let redacted = RedactedConfig::from(&cfg);
        let text = format_config_redacted(&redacted);
        assert!(text.contains("[profiles.prod]"));
        assert!(text.contains(MASK));
        assert!(!text.contains("ya29.secret"));

        let json = serde_json::to_string(&redacted).unwrap_or_default();
        assert!(!json.contains("ya29.secret"));
    }
}
