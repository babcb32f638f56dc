//! Retained-token state between CLI invocations.
//!
//! The engine keeps the last device token in memory for the life of a
//! session. A CLI process is one short session, so the token is written
//! to a small JSON file keyed by subscriber id and seeded back on the
//! next run. Without it `reconcile --disable` could never unsubscribe.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use pushsync_core::{DeviceToken, SubscriberId};

use crate::error::CliError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenState {
    #[serde(default)]
    tokens: BTreeMap<String, DeviceToken>,
}

impl TokenState {
    /// Read the state file. A missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file yet");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), subscribers = self.tokens.len(), "saved token state");
        Ok(())
    }

    pub fn token_for(&self, subscriber: &SubscriberId) -> Option<DeviceToken> {
        self.tokens.get(subscriber.as_str()).cloned()
    }

    /// Record (or with `None`, forget) the token for `subscriber`.
    /// Signed-out identities are never stored.
    pub fn set_token(&mut self, subscriber: &SubscriberId, token: Option<DeviceToken>) {
        if !subscriber.is_signed_in() {
            return;
        }
        match token {
            Some(token) => {
                self.tokens.insert(subscriber.as_str().to_owned(), token);
            }
            None => {
                self.tokens.remove(subscriber.as_str());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = TokenState::load(&dir.path().join("state.json")).unwrap();
        assert!(state.token_for(&SubscriberId::new("u1")).is_none());
    }

    #[test]
    fn tokens_persist_per_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut state = TokenState::default();
        state.set_token(&SubscriberId::new("u1"), Some(DeviceToken::new("tok-1")));
        state.set_token(&SubscriberId::new(""), Some(DeviceToken::new("ignored")));
        state.save(&path).unwrap();

        let loaded = TokenState::load(&path).unwrap();
        assert_eq!(
            loaded.token_for(&SubscriberId::new("u1")),
            Some(DeviceToken::new("tok-1"))
        );
        assert!(loaded.token_for(&SubscriberId::new("u2")).is_none());
        assert!(loaded.token_for(&SubscriberId::new("")).is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(TokenState::load(&path), Err(CliError::Json(_))));
    }
}
