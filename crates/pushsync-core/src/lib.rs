//! Push topic subscription reconciliation.
//!
//! This crate owns the domain logic for keeping a subscriber's push topic
//! subscriptions in line with their intent:
//!
//! - **[`TopicSyncEngine`]** -- One reconciliation pass per call to
//!   [`reconcile()`](TopicSyncEngine::reconcile): derive the topic set from
//!   community memberships, obtain a device token when push is on, and
//!   issue idempotent subscribe/unsubscribe calls. Holds no cache of
//!   registry state, only the last device token.
//!
//! - **[`SyncSession`]** -- Reactive driver. The host publishes
//!   [`SyncInputs`] on every sign-in, membership, or preference change and
//!   the session reconciles once per change, publishing
//!   [`SessionEvent`]s on a broadcast channel.
//!
//! - **Collaborator traits** ([`provider`]) -- [`NotificationTokenProvider`]
//!   and [`SubscriptionRegistry`], with HTTP-backed implementations in
//!   [`remote`] built on `pushsync-api`.
//!
//! - **Diagnostics** ([`diagnostics`]) -- side-channel events such as
//!   `push_permission_denied`.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod model;
pub mod provider;
pub mod remote;
pub mod session;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, SyncConfig, TlsVerification};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, RecordingDiagnostics, TracingDiagnostics};
pub use engine::TopicSyncEngine;
pub use error::CoreError;
pub use provider::{
    NotificationTokenProvider, StaticTokenProvider, SubscriptionRegistry, UnconfiguredTokenProvider,
};
pub use remote::{RemoteRegistry, RemoteTokenProvider};
pub use session::{SessionEvent, SyncInputs, SyncSession};

pub use model::{
    CommunityId, DeviceToken, Permission, ReconcileOutcome, RegistryAction, SkipReason,
    Subscriber, SubscriberId, TOPIC_PREFIX, Topic, TokenGrant, TopicSet,
};
