// ── Topic sync engine ──
//
// Reconciles a subscriber's desired push state against the remote topic
// registry. The engine keeps no record of what the registry currently
// holds: every pass recomputes the topic set and re-issues idempotent
// subscribe/unsubscribe calls. The only state carried between passes is
// the most recently obtained device token.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, TracingDiagnostics};
use crate::error::CoreError;
use crate::model::{
    CommunityId, DeviceToken, ReconcileOutcome, RegistryAction, SkipReason, Subscriber,
    TopicSet,
};
use crate::provider::{NotificationTokenProvider, SubscriptionRegistry};

/// Per-subscriber-session reconciliation engine.
///
/// Owns the retained token as an explicit field; create one engine per
/// subscriber session so tokens never leak between subscribers.
pub struct TopicSyncEngine {
    tokens: Arc<dyn NotificationTokenProvider>,
    registry: Arc<dyn SubscriptionRegistry>,
    diagnostics: Arc<dyn DiagnosticSink>,
    retained: Option<DeviceToken>,
    cancel: CancellationToken,
}

impl TopicSyncEngine {
    pub fn new(
        tokens: Arc<dyn NotificationTokenProvider>,
        registry: Arc<dyn SubscriptionRegistry>,
    ) -> Self {
        Self {
            tokens,
            registry,
            diagnostics: Arc::new(TracingDiagnostics),
            retained: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Route diagnostic events to `sink` instead of the tracing default.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Seed the retained token, e.g. from a previous session's storage.
    pub fn with_retained_token(mut self, token: Option<DeviceToken>) -> Self {
        self.retained = token;
        self
    }

    /// Tie this engine to an outer cancellation scope.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn retained_token(&self) -> Option<&DeviceToken> {
        self.retained.as_ref()
    }

    pub fn take_retained_token(&mut self) -> Option<DeviceToken> {
        self.retained.take()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Run one reconciliation pass.
    ///
    /// Only a token-service failure is returned as `Err`. Permission
    /// denial and registry failures are absorbed into the outcome.
    pub async fn reconcile(
        &mut self,
        subscriber: &Subscriber,
        communities: &[CommunityId],
        push_enabled: bool,
    ) -> Result<ReconcileOutcome, CoreError> {
        if !subscriber.is_signed_in() {
            debug!("no signed-in subscriber; skipping reconciliation");
            return Ok(ReconcileOutcome::NotSignedIn);
        }
        if self.cancel.is_cancelled() {
            return Ok(ReconcileOutcome::Cancelled);
        }

        let topics = TopicSet::from_communities(communities);
        debug!(
            subscriber = %subscriber.id,
            push_enabled,
            topics = topics.len(),
            "reconciling push topics"
        );

        if push_enabled {
            self.enable(subscriber, topics).await
        } else {
            Ok(self.disable(topics).await)
        }
    }

    async fn enable(
        &mut self,
        subscriber: &Subscriber,
        topics: TopicSet,
    ) -> Result<ReconcileOutcome, CoreError> {
        let grant = match self.tokens.request_permission_and_token(subscriber).await {
            Ok(grant) if grant.is_granted() => grant,
            Ok(_) | Err(CoreError::PermissionDenied) => {
                self.diagnostics.emit(DiagnosticEvent::PushPermissionDenied);
                return Ok(ReconcileOutcome::PermissionDenied);
            }
            Err(e) => return Err(e),
        };

        // Torn down while waiting for the token: keep nothing.
        if self.cancel.is_cancelled() {
            debug!("session cancelled during token request; discarding token");
            return Ok(ReconcileOutcome::Cancelled);
        }

        let Some(token) = grant.token else {
            debug!("permission granted but no token issued");
            return Ok(ReconcileOutcome::Skipped {
                reason: SkipReason::NoToken,
            });
        };
        self.retained = Some(token.clone());

        if topics.is_empty() {
            return Ok(ReconcileOutcome::Skipped {
                reason: SkipReason::NoTopics,
            });
        }

        Ok(self
            .call_registry(RegistryAction::Subscribe, &token, topics)
            .await)
    }

    async fn disable(&self, topics: TopicSet) -> ReconcileOutcome {
        let Some(token) = self.retained.as_ref() else {
            return ReconcileOutcome::Skipped {
                reason: SkipReason::NoRetainedToken,
            };
        };
        if topics.is_empty() {
            return ReconcileOutcome::Skipped {
                reason: SkipReason::NoTopics,
            };
        }

        self.call_registry(RegistryAction::Unsubscribe, token, topics)
            .await
    }

    /// Issue one best-effort registry call. Failures are logged and folded
    /// into the outcome; nothing about them is remembered.
    async fn call_registry(
        &self,
        action: RegistryAction,
        token: &DeviceToken,
        topics: TopicSet,
    ) -> ReconcileOutcome {
        let result = match action {
            RegistryAction::Subscribe => self.registry.subscribe(token, &topics).await,
            RegistryAction::Unsubscribe => self.registry.unsubscribe(token, &topics).await,
        };

        if self.cancel.is_cancelled() {
            debug!(%action, "session cancelled during registry call; discarding result");
            return ReconcileOutcome::Cancelled;
        }

        match result {
            Ok(()) => {
                info!(%action, token = %token.redacted(), %topics, "registry updated");
                match action {
                    RegistryAction::Subscribe => ReconcileOutcome::Subscribed { topics },
                    RegistryAction::Unsubscribe => ReconcileOutcome::Unsubscribed { topics },
                }
            }
            Err(e) => {
                warn!(%action, error = %e, "registry call failed; will retry on next change");
                ReconcileOutcome::RegistryFailed {
                    action,
                    topics,
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::model::{Permission, TokenGrant};
    use crate::testing::{FakeRegistry, FakeTokenProvider, RegistryCall, communities};

    struct Harness {
        engine: TopicSyncEngine,
        tokens: Arc<FakeTokenProvider>,
        registry: Arc<FakeRegistry>,
        diagnostics: Arc<RecordingDiagnostics>,
    }

    fn harness(grant: Result<TokenGrant, CoreError>) -> Harness {
        let tokens = Arc::new(FakeTokenProvider::new(grant));
        let registry = Arc::new(FakeRegistry::default());
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let engine = TopicSyncEngine::new(tokens.clone(), registry.clone())
            .with_diagnostics(diagnostics.clone());
        Harness {
            engine,
            tokens,
            registry,
            diagnostics,
        }
    }

    fn granted(token: &str) -> Result<TokenGrant, CoreError> {
        Ok(TokenGrant::granted(DeviceToken::new(token)))
    }

    fn user() -> Subscriber {
        Subscriber::new("user-1")
    }

    #[tokio::test]
    async fn signed_out_subscriber_is_a_no_op() {
        let mut h = harness(granted("T1"));

        for enabled in [true, false] {
            let outcome = h
                .engine
                .reconcile(&Subscriber::signed_out(), &communities(&["c1"]), enabled)
                .await
                .unwrap();
            assert_eq!(outcome, ReconcileOutcome::NotSignedIn);
        }

        assert_eq!(h.tokens.calls(), 0);
        assert!(h.registry.calls().is_empty());
    }

    #[tokio::test]
    async fn enabling_subscribes_token_to_all_topics() {
        let mut h = harness(granted("T1"));

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1", "c2"]), true)
            .await
            .unwrap();

        assert_eq!(outcome.label(), "subscribed");
        assert_eq!(
            h.registry.calls(),
            vec![RegistryCall::subscribe("T1", &["community_c1", "community_c2"])]
        );
        assert_eq!(h.engine.retained_token(), Some(&DeviceToken::new("T1")));
    }

    #[tokio::test]
    async fn duplicate_communities_collapse_to_one_topic() {
        let mut h = harness(granted("T1"));

        h.engine
            .reconcile(&user(), &communities(&["c1", "c1"]), true)
            .await
            .unwrap();

        assert_eq!(
            h.registry.calls(),
            vec![RegistryCall::subscribe("T1", &["community_c1"])]
        );
    }

    #[tokio::test]
    async fn permission_denied_skips_registry_and_emits_once() {
        let mut h = harness(Ok(TokenGrant::denied()));

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::PermissionDenied);
        assert!(h.registry.calls().is_empty());
        assert_eq!(
            h.diagnostics.count(DiagnosticEvent::PushPermissionDenied),
            1
        );
        assert!(h.engine.retained_token().is_none());
    }

    #[tokio::test]
    async fn dismissed_prompt_counts_as_denied() {
        let mut h = harness(Ok(TokenGrant {
            permission: Permission::Default,
            token: Some(DeviceToken::new("T1")),
        }));

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::PermissionDenied);
        assert!(h.registry.calls().is_empty());
        assert!(h.engine.retained_token().is_none());
    }

    #[tokio::test]
    async fn permission_denied_error_is_not_propagated() {
        let mut h = harness(Err(CoreError::PermissionDenied));

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::PermissionDenied);
        assert_eq!(h.diagnostics.events().len(), 1);
    }

    #[tokio::test]
    async fn token_service_failure_propagates() {
        let mut h = harness(Err(CoreError::TokenService {
            message: "unreachable".into(),
            transient: true,
        }));

        let err = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::TokenService { .. }));
        assert!(h.registry.calls().is_empty());
        assert!(h.diagnostics.events().is_empty());
    }

    #[tokio::test]
    async fn no_topics_skips_subscribe_but_retains_token() {
        let mut h = harness(granted("T1"));

        let outcome = h.engine.reconcile(&user(), &[], true).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Skipped {
                reason: SkipReason::NoTopics
            }
        );
        assert!(h.registry.calls().is_empty());
        assert_eq!(h.engine.retained_token(), Some(&DeviceToken::new("T1")));
    }

    #[tokio::test]
    async fn granted_without_token_skips() {
        let mut h = harness(Ok(TokenGrant {
            permission: Permission::Granted,
            token: None,
        }));

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Skipped {
                reason: SkipReason::NoToken
            }
        );
        assert!(h.registry.calls().is_empty());
    }

    #[tokio::test]
    async fn disabling_unsubscribes_with_retained_token() {
        let mut h = harness(granted("T1"));

        h.engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();
        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), false)
            .await
            .unwrap();

        assert_eq!(outcome.label(), "unsubscribed");
        assert_eq!(
            h.registry.calls(),
            vec![
                RegistryCall::subscribe("T1", &["community_c1"]),
                RegistryCall::unsubscribe("T1", &["community_c1"]),
            ]
        );
        // Turning push off does not request a new token.
        assert_eq!(h.tokens.calls(), 1);
    }

    #[tokio::test]
    async fn disabling_without_token_makes_no_calls() {
        let mut h = harness(granted("T1"));

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1", "c2"]), false)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Skipped {
                reason: SkipReason::NoRetainedToken
            }
        );
        assert_eq!(h.tokens.calls(), 0);
        assert!(h.registry.calls().is_empty());
    }

    #[tokio::test]
    async fn seeded_token_is_used_for_unsubscribe() {
        let mut h = harness(granted("T2"));
        h.engine = h
            .engine
            .with_retained_token(Some(DeviceToken::new("T-old")));

        h.engine
            .reconcile(&user(), &communities(&["c9"]), false)
            .await
            .unwrap();

        assert_eq!(
            h.registry.calls(),
            vec![RegistryCall::unsubscribe("T-old", &["community_c9"])]
        );
    }

    #[tokio::test]
    async fn repeated_identical_passes_repeat_the_same_call() {
        let mut h = harness(granted("T1"));

        for _ in 0..2 {
            h.engine
                .reconcile(&user(), &communities(&["c1", "c2"]), true)
                .await
                .unwrap();
        }

        let expected = RegistryCall::subscribe("T1", &["community_c1", "community_c2"]);
        assert_eq!(h.registry.calls(), vec![expected.clone(), expected]);
    }

    #[tokio::test]
    async fn newest_token_replaces_retained_one() {
        let mut h = harness(granted("T1"));
        h.engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();

        h.tokens.set(granted("T2"));
        h.engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();

        assert_eq!(h.engine.retained_token(), Some(&DeviceToken::new("T2")));
    }

    #[tokio::test]
    async fn registry_failure_is_swallowed() {
        let mut h = harness(granted("T1"));
        h.registry.fail_with("HTTP 500: boom");

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();

        match outcome {
            ReconcileOutcome::RegistryFailed {
                action, message, ..
            } => {
                assert_eq!(action, RegistryAction::Subscribe);
                assert!(message.contains("boom"));
            }
            other => panic!("expected RegistryFailed, got {other:?}"),
        }
        // The failure leaves the token in place for the next pass.
        assert_eq!(h.engine.retained_token(), Some(&DeviceToken::new("T1")));

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), false)
            .await
            .unwrap();
        assert_eq!(outcome.label(), "registry_failed");
    }

    #[tokio::test]
    async fn cancelled_engine_discards_new_token() {
        let mut h = harness(granted("T1"));
        h.engine.cancellation_token().cancel();

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Cancelled);
        assert_eq!(h.tokens.calls(), 0);
        assert!(h.engine.retained_token().is_none());
        assert!(h.registry.calls().is_empty());
    }

    #[tokio::test]
    async fn cancellation_during_token_request_skips_registry() {
        let mut h = harness(granted("T1"));
        h.tokens
            .cancel_on_request(h.engine.cancellation_token().clone());

        let outcome = h
            .engine
            .reconcile(&user(), &communities(&["c1"]), true)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Cancelled);
        assert_eq!(h.tokens.calls(), 1);
        assert!(h.engine.retained_token().is_none());
        assert!(h.registry.calls().is_empty());
    }
}
