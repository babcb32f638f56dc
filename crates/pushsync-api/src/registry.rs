// Topic registry HTTP client
//
// Instance-ID style topic management: `batchAdd` / `batchRemove` take a
// single topic and a list of registration tokens, so subscribing one token
// to N topics costs N requests. They are issued concurrently and every
// topic is attempted even when an earlier one fails.

use futures_util::future::join_all;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::{BatchOperation, BatchRequest, BatchResponse};
use crate::transport::{self, TransportConfig};

/// Default public endpoint for Firebase topic management.
pub const DEFAULT_REGISTRY_URL: &str = "https://iid.googleapis.com";

/// Async client for the topic subscription registry.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RegistryClient {
    /// Build a client that authenticates every request with `credentials`.
    pub fn new(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(credentials.headers()?)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: transport::normalize_base_url(base_url)?,
        })
    }

    /// The registry base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Subscribe `token` to every topic in `topics`.
    pub async fn subscribe(&self, token: &str, topics: &[String]) -> Result<(), Error> {
        self.apply(BatchOperation::Add, token, topics).await
    }

    /// Unsubscribe `token` from every topic in `topics`.
    pub async fn unsubscribe(&self, token: &str, topics: &[String]) -> Result<(), Error> {
        self.apply(BatchOperation::Remove, token, topics).await
    }

    /// Run one batch operation per topic, returning the first failure.
    async fn apply(&self, op: BatchOperation, token: &str, topics: &[String]) -> Result<(), Error> {
        if topics.is_empty() {
            debug!(op = op.verb(), "no topics; skipping registry call");
            return Ok(());
        }

        let tokens = [token];
        let results = join_all(
            topics
                .iter()
                .map(|topic| self.batch(op, topic, &tokens)),
        )
        .await;

        let mut first_err = None;
        for (topic, result) in topics.iter().zip(results) {
            if let Err(e) = result {
                warn!(op = op.verb(), topic = %topic, error = %e, "registry call failed");
                first_err.get_or_insert(e);
            }
        }

        first_err.map_or(Ok(()), Err)
    }

    /// `POST {base}/iid/v1:batch{Add,Remove}` for a single topic.
    pub async fn batch(
        &self,
        op: BatchOperation,
        topic: &str,
        tokens: &[&str],
    ) -> Result<(), Error> {
        let url = self.base_url.join(op.path())?;
        debug!("POST {url} topic={topic}");

        let body = BatchRequest {
            to: format!("/topics/{topic}"),
            registration_tokens: tokens,
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let parsed: BatchResponse = transport::handle_json(resp).await?;

        // One result per token; any per-token error fails the topic.
        if let Some(message) = parsed.results.into_iter().find_map(|r| r.error) {
            return Err(Error::Registry {
                topic: topic.to_owned(),
                message,
            });
        }

        Ok(())
    }
}
