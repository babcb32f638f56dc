// ── Reconciliation outcomes ──

use serde::Serialize;

use super::topic::TopicSet;

/// Which registry operation a pass attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RegistryAction {
    Subscribe,
    Unsubscribe,
}

/// Why a pass made no registry call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// The subscriber belongs to no communities.
    NoTopics,
    /// Permission was granted but the provider returned no token.
    NoToken,
    /// Push is off and no token was ever obtained in this session.
    NoRetainedToken,
}

/// What a single reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Empty subscriber identity; nothing was attempted.
    NotSignedIn,
    /// The user declined notification permission.
    PermissionDenied,
    Subscribed {
        topics: TopicSet,
    },
    Unsubscribed {
        topics: TopicSet,
    },
    Skipped {
        reason: SkipReason,
    },
    /// The registry call failed. Swallowed: a later pass re-issues it.
    RegistryFailed {
        action: RegistryAction,
        topics: TopicSet,
        message: String,
    },
    /// The session was torn down mid-pass; the result was discarded.
    Cancelled,
}

impl ReconcileOutcome {
    /// Short machine-friendly label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotSignedIn => "not_signed_in",
            Self::PermissionDenied => "permission_denied",
            Self::Subscribed { .. } => "subscribed",
            Self::Unsubscribed { .. } => "unsubscribed",
            Self::Skipped { .. } => "skipped",
            Self::RegistryFailed { .. } => "registry_failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// The topics the pass touched (or tried to), if any.
    pub fn topics(&self) -> Option<&TopicSet> {
        match self {
            Self::Subscribed { topics }
            | Self::Unsubscribed { topics }
            | Self::RegistryFailed { topics, .. } => Some(topics),
            _ => None,
        }
    }
}
