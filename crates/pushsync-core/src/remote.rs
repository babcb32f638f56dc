// ── Remote collaborators ──
//
// Bind the HTTP clients from `pushsync-api` to the engine's traits.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use pushsync_api::{RegistryClient, TokenClient};

use crate::config::SyncConfig;
use crate::engine::TopicSyncEngine;
use crate::error::CoreError;
use crate::model::{DeviceToken, Subscriber, TokenGrant, TopicSet};
use crate::provider::{NotificationTokenProvider, SubscriptionRegistry};

// ── Registry ─────────────────────────────────────────────────────────

/// [`SubscriptionRegistry`] backed by the HTTP topic registry.
pub struct RemoteRegistry {
    client: RegistryClient,
}

impl RemoteRegistry {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, CoreError> {
        let client = RegistryClient::new(
            config.registry_url.as_str(),
            &config.credentials(),
            &config.transport(),
        )?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl SubscriptionRegistry for RemoteRegistry {
    async fn subscribe(&self, token: &DeviceToken, topics: &TopicSet) -> Result<(), CoreError> {
        Ok(self.client.subscribe(token.as_str(), &topics.names()).await?)
    }

    async fn unsubscribe(&self, token: &DeviceToken, topics: &TopicSet) -> Result<(), CoreError> {
        Ok(self
            .client
            .unsubscribe(token.as_str(), &topics.names())
            .await?)
    }
}

// ── Token provider ───────────────────────────────────────────────────

/// [`NotificationTokenProvider`] backed by the HTTP token service.
pub struct RemoteTokenProvider {
    client: TokenClient,
}

impl RemoteTokenProvider {
    pub fn new(client: TokenClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, CoreError> {
        let url = config
            .token_service_url
            .as_ref()
            .ok_or_else(|| CoreError::Config {
                message: "no token service URL configured".into(),
            })?;
        let client = TokenClient::new(url.as_str(), &config.credentials(), &config.transport())?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl NotificationTokenProvider for RemoteTokenProvider {
    async fn request_permission_and_token(
        &self,
        subscriber: &Subscriber,
    ) -> Result<TokenGrant, CoreError> {
        let resp = self
            .client
            .request_token(subscriber.id.as_str())
            .await
            .map_err(CoreError::from_token_service)?;

        debug!(permission = ?resp.permission, has_token = resp.token.is_some(), "token service replied");

        Ok(TokenGrant {
            permission: resp.permission.into(),
            token: resp
                .token
                .filter(|t| !t.is_empty())
                .map(DeviceToken::new),
        })
    }
}

/// Build an engine wired to both remote collaborators.
pub fn connect(config: &SyncConfig) -> Result<TopicSyncEngine, CoreError> {
    let tokens = Arc::new(RemoteTokenProvider::from_config(config)?);
    let registry = Arc::new(RemoteRegistry::from_config(config)?);
    Ok(TopicSyncEngine::new(tokens, registry))
}
