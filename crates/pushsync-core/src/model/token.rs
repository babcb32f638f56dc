// ── Device tokens and permission grants ──

use serde::{Deserialize, Serialize};
use std::fmt;

use pushsync_api::PermissionState;

/// Opaque credential identifying one app installation to the push service.
///
/// `Debug` only shows a short prefix so tokens stay out of logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(String);

impl DeviceToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First few characters, for log lines.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{prefix}…")
    }
}

impl fmt::Debug for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceToken").field(&self.redacted()).finish()
    }
}

/// Notification permission as reported by the platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// The user dismissed the prompt without answering.
    Default,
}

impl From<PermissionState> for Permission {
    fn from(state: PermissionState) -> Self {
        match state {
            PermissionState::Granted => Self::Granted,
            PermissionState::Denied => Self::Denied,
            PermissionState::Default => Self::Default,
        }
    }
}

/// Result of asking the token provider for permission and a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub permission: Permission,
    pub token: Option<DeviceToken>,
}

impl TokenGrant {
    pub fn granted(token: DeviceToken) -> Self {
        Self {
            permission: Permission::Granted,
            token: Some(token),
        }
    }

    pub fn denied() -> Self {
        Self {
            permission: Permission::Denied,
            token: None,
        }
    }

    pub fn is_granted(&self) -> bool {
        self.permission == Permission::Granted
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let token = DeviceToken::new("fcm-abcdefghijklmnop");
        let dbg = format!("{token:?}");
        assert!(dbg.contains("fcm-ab"));
        assert!(!dbg.contains("ghijklmnop"));
    }

    #[test]
    fn permission_parses_lowercase() {
        assert_eq!("granted".parse::<Permission>().unwrap(), Permission::Granted);
        assert_eq!(Permission::Default.to_string(), "default");
        assert!("maybe".parse::<Permission>().is_err());
    }

    #[test]
    fn only_granted_counts_as_granted() {
        assert!(TokenGrant::granted(DeviceToken::new("T1")).is_granted());
        assert!(!TokenGrant::denied().is_granted());
    }
}
