// In-memory collaborators for engine and session tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::model::{CommunityId, DeviceToken, RegistryAction, Subscriber, TokenGrant, TopicSet};
use crate::provider::{NotificationTokenProvider, SubscriptionRegistry};

pub(crate) fn communities(ids: &[&str]) -> Vec<CommunityId> {
    ids.iter().map(|s| CommunityId::from(*s)).collect()
}

// ── Token provider ──────────────────────────────────────────────────

enum Reply {
    Grant(TokenGrant),
    Denied,
    Fail { message: String, transient: bool },
}

impl From<Result<TokenGrant, CoreError>> for Reply {
    fn from(result: Result<TokenGrant, CoreError>) -> Self {
        match result {
            Ok(grant) => Self::Grant(grant),
            Err(CoreError::PermissionDenied) => Self::Denied,
            Err(CoreError::TokenService { message, transient }) => {
                Self::Fail { message, transient }
            }
            Err(other) => Self::Fail {
                message: other.to_string(),
                transient: false,
            },
        }
    }
}

pub(crate) struct FakeTokenProvider {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
    cancel_on_request: Mutex<Option<CancellationToken>>,
}

impl FakeTokenProvider {
    pub(crate) fn new(reply: Result<TokenGrant, CoreError>) -> Self {
        Self {
            reply: Mutex::new(reply.into()),
            calls: AtomicUsize::new(0),
            cancel_on_request: Mutex::new(None),
        }
    }

    pub(crate) fn set(&self, reply: Result<TokenGrant, CoreError>) {
        *self.reply.lock().unwrap_or_else(PoisonError::into_inner) = reply.into();
    }

    /// Cancel `token` while the request is "in flight".
    pub(crate) fn cancel_on_request(&self, token: CancellationToken) {
        *self
            .cancel_on_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationTokenProvider for FakeTokenProvider {
    async fn request_permission_and_token(
        &self,
        _subscriber: &Subscriber,
    ) -> Result<TokenGrant, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self
            .cancel_on_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            token.cancel();
        }

        match &*self.reply.lock().unwrap_or_else(PoisonError::into_inner) {
            Reply::Grant(grant) => Ok(grant.clone()),
            Reply::Denied => Err(CoreError::PermissionDenied),
            Reply::Fail { message, transient } => Err(CoreError::TokenService {
                message: message.clone(),
                transient: *transient,
            }),
        }
    }
}

// ── Registry ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegistryCall {
    pub action: RegistryAction,
    pub token: String,
    pub topics: Vec<String>,
}

impl RegistryCall {
    pub(crate) fn subscribe(token: &str, topics: &[&str]) -> Self {
        Self::new(RegistryAction::Subscribe, token, topics)
    }

    pub(crate) fn unsubscribe(token: &str, topics: &[&str]) -> Self {
        Self::new(RegistryAction::Unsubscribe, token, topics)
    }

    fn new(action: RegistryAction, token: &str, topics: &[&str]) -> Self {
        Self {
            action,
            token: token.to_owned(),
            topics: topics.iter().map(|t| (*t).to_owned()).collect(),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeRegistry {
    calls: Mutex<Vec<RegistryCall>>,
    failure: Mutex<Option<String>>,
}

impl FakeRegistry {
    pub(crate) fn calls(&self) -> Vec<RegistryCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_owned());
    }

    fn record(
        &self,
        action: RegistryAction,
        token: &DeviceToken,
        topics: &TopicSet,
    ) -> Result<(), CoreError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RegistryCall {
                action,
                token: token.as_str().to_owned(),
                topics: topics.names(),
            });

        match self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            Some(message) => Err(CoreError::Registry {
                message,
                status: Some(500),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SubscriptionRegistry for FakeRegistry {
    async fn subscribe(&self, token: &DeviceToken, topics: &TopicSet) -> Result<(), CoreError> {
        self.record(RegistryAction::Subscribe, token, topics)
    }

    async fn unsubscribe(&self, token: &DeviceToken, topics: &TopicSet) -> Result<(), CoreError> {
        self.record(RegistryAction::Unsubscribe, token, topics)
    }
}
