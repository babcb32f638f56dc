// ── Collaborator seams ──
//
// The engine talks to the outside world only through these traits:
// a token provider (platform permission + device token) and a topic
// registry. Remote implementations live in `crate::remote`.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{DeviceToken, Permission, Subscriber, TokenGrant, TopicSet};

/// Asks the platform for notification permission and a device token.
#[async_trait]
pub trait NotificationTokenProvider: Send + Sync {
    /// Request permission for `subscriber` and exchange it for a token.
    ///
    /// A denial may be reported either as a non-granted [`TokenGrant`] or
    /// as [`CoreError::PermissionDenied`]; the engine treats both alike.
    /// Any other error is a token-service failure.
    async fn request_permission_and_token(
        &self,
        subscriber: &Subscriber,
    ) -> Result<TokenGrant, CoreError>;
}

/// Remote registry mapping device tokens to topics.
///
/// Both operations are idempotent and a no-op for an empty topic set.
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    async fn subscribe(&self, token: &DeviceToken, topics: &TopicSet) -> Result<(), CoreError>;

    async fn unsubscribe(&self, token: &DeviceToken, topics: &TopicSet) -> Result<(), CoreError>;
}

// ── StaticTokenProvider ──────────────────────────────────────────────

/// Token provider that always answers with the same grant.
///
/// Used when the device token is already known (e.g. passed on the
/// command line or restored from storage).
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    grant: TokenGrant,
}

impl StaticTokenProvider {
    pub fn new(grant: TokenGrant) -> Self {
        Self { grant }
    }

    pub fn granted(token: DeviceToken) -> Self {
        Self::new(TokenGrant::granted(token))
    }

    pub fn with_permission(permission: Permission, token: Option<DeviceToken>) -> Self {
        Self::new(TokenGrant { permission, token })
    }
}

#[async_trait]
impl NotificationTokenProvider for StaticTokenProvider {
    async fn request_permission_and_token(
        &self,
        _subscriber: &Subscriber,
    ) -> Result<TokenGrant, CoreError> {
        Ok(self.grant.clone())
    }
}

// ── UnconfiguredTokenProvider ────────────────────────────────────────

/// Stand-in for hosts with no token source at all.
///
/// Every request fails with [`CoreError::Config`], so enabling push
/// fails while disable passes (which only use the retained token) work.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredTokenProvider;

#[async_trait]
impl NotificationTokenProvider for UnconfiguredTokenProvider {
    async fn request_permission_and_token(
        &self,
        _subscriber: &Subscriber,
    ) -> Result<TokenGrant, CoreError> {
        Err(CoreError::Config {
            message: "no token service URL configured".into(),
        })
    }
}
