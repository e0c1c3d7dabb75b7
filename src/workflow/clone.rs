//! Host cloning: duplicate a host and republish every scope's configuration
//!
//! Scopes are copied one at a time, in the order the source lists them. A
//! scope must exist on the new host before its configuration can be
//! published, so each scope is created, then filled. The first failure
//! aborts the run; scopes already cloned are left in place.

use tracing::info;

use crate::api::types::{BearerToken, Configuration, Host, HostSpec, Scope, ScopeSpec};
use crate::api::{ApiError, StrikeTrackerClient};

/// A scope created on the destination host with its published configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClonedScope {
    pub scope: Scope,
    pub configuration: Configuration,
}

/// Result of a completed clone
#[derive(Debug, Clone, PartialEq)]
pub struct CloneReport {
    pub source: Host,
    pub host: Host,
    pub scopes: Vec<ClonedScope>,
}

/// Clone host `source_hash` within `account`.
///
/// `on_scope` is called as soon as each scope is fully cloned, so progress
/// is visible even if a later scope fails.
pub async fn clone_host(
    client: &StrikeTrackerClient,
    token: &BearerToken,
    account: &str,
    source_hash: &str,
    mut on_scope: impl FnMut(&ClonedScope),
) -> Result<CloneReport, ApiError> {
    let source = client.fetch_host(token, account, source_hash).await?;

    let host = client
        .create_host(token, account, &HostSpec::copy_of(&source))
        .await?;
    info!(
        "Created host {} ({}) from {}",
        host.name, host.hash_code, source.hash_code
    );

    let mut scopes = Vec::with_capacity(source.scopes.len());
    for source_scope in &source.scopes {
        let scope = client
            .create_scope(token, account, &host.hash_code, &ScopeSpec::from(source_scope))
            .await?;

        let original = client
            .get_configuration(token, account, &source.hash_code, source_scope.id)
            .await?;

        let configuration = client
            .update_configuration(
                token,
                account,
                &host.hash_code,
                scope.id,
                &original.strip_identity(),
            )
            .await?;
        info!(
            "Cloned scope {} {} into scope {}",
            scope.platform, scope.path, scope.id
        );

        let cloned = ClonedScope {
            scope,
            configuration,
        };
        on_scope(&cloned);
        scopes.push(cloned);
    }

    Ok(CloneReport {
        source,
        host,
        scopes,
    })
}
