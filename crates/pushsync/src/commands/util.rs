//! Shared helpers for command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use pushsync_core::{
    CommunityId, DeviceToken, NotificationTokenProvider, Permission, RemoteRegistry,
    RemoteTokenProvider, StaticTokenProvider, SyncConfig, TopicSyncEngine,
    UnconfiguredTokenProvider,
};

use crate::cli::{GlobalOpts, PermissionArg, TokenSourceArgs};
use crate::config;
use crate::error::CliError;

impl From<PermissionArg> for Permission {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::Granted => Permission::Granted,
            PermissionArg::Denied => Permission::Denied,
            PermissionArg::Default => Permission::Default,
        }
    }
}

pub fn community_ids(raw: Vec<String>) -> Vec<CommunityId> {
    raw.into_iter().map(CommunityId::from).collect()
}

/// Static provider when `--token` or `--permission` is given, else the
/// profile's token service. With neither, only disable passes can run.
fn token_provider(
    source: &TokenSourceArgs,
    sync: &SyncConfig,
) -> Result<Arc<dyn NotificationTokenProvider>, CliError> {
    if source.token.is_none() && source.permission.is_none() {
        if sync.token_service_url.is_none() {
            return Ok(Arc::new(UnconfiguredTokenProvider));
        }
        return Ok(Arc::new(RemoteTokenProvider::from_config(sync)?));
    }
    let permission = source.permission.map_or(Permission::Granted, Permission::from);
    let token = source
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(DeviceToken::new);
    Ok(Arc::new(StaticTokenProvider::with_permission(permission, token)))
}

/// Wire an engine to the registry and the selected token source.
pub fn build_engine(
    source: &TokenSourceArgs,
    global: &GlobalOpts,
) -> Result<TopicSyncEngine, CliError> {
    let sync = config::build_sync_config(global)?;
    tracing::debug!(registry = %sync.registry_url, "building engine");
    let tokens = token_provider(source, &sync)?;
    let registry = Arc::new(RemoteRegistry::from_config(&sync)?);
    Ok(TopicSyncEngine::new(tokens, registry))
}

/// State file for this invocation, or `None` with `--no-state`.
pub fn state_file(source: &TokenSourceArgs) -> Option<PathBuf> {
    (!source.no_state).then(|| config::resolve_state_path(source.state.as_ref()))
}
