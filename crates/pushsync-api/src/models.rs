// Wire types for the topic registry and device-token service.

use serde::{Deserialize, Serialize};

/// Topic-management operation against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    Add,
    Remove,
}

impl BatchOperation {
    /// Endpoint path relative to the registry base URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::Add => "iid/v1:batchAdd",
            Self::Remove => "iid/v1:batchRemove",
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::Add => "subscribe",
            Self::Remove => "unsubscribe",
        }
    }
}

/// Body of a `batchAdd` / `batchRemove` request.
#[derive(Debug, Serialize)]
pub(crate) struct BatchRequest<'a> {
    /// Always `/topics/<name>`.
    pub to: String,
    pub registration_tokens: &'a [&'a str],
}

/// Response of a batch call: one result per registration token, in order.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BatchResponse {
    #[serde(default)]
    pub results: Vec<BatchResult>,
}

/// A single per-token result. Empty object on success.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BatchResult {
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a token request.
#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub subscriber: &'a str,
}

/// Notification permission as reported by the token service.
///
/// Unknown values decode as [`Default`](Self::Default): the user has not
/// answered the prompt, which the engine treats like a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    #[serde(other)]
    Default,
}

/// Response of the token service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub permission: PermissionState,
    #[serde(default)]
    pub token: Option<String>,
}
