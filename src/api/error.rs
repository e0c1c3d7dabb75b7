//! API error types

use serde_json::Value;
use thiserror::Error;

/// Raw response captured for diagnostics when an operation fails
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    /// HTTP status, absent when the request never got a response
    pub status: Option<u16>,
    /// Response body text, or the transport error message
    pub body: String,
}

impl ResponseContext {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    /// Context for a request that failed before a response arrived
    pub fn transport(err: &reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }

    /// Best-effort extraction of the `error` field from a JSON body
    pub fn error_message(&self) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        value
            .get("error")
            .and_then(|e| e.as_str())
            .map(|s| s.to_string())
    }
}

/// One failure kind per API operation
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not fetch API version")]
    VersionFetchFailed(ResponseContext),

    #[error("Could not fetch user details")]
    UserFetchFailed(ResponseContext),

    #[error("Could not fetch access token")]
    LoginFailed(ResponseContext),

    #[error("Could not fetch user's root account hash")]
    UserLookupFailed(ResponseContext),

    #[error("Could not generate API token")]
    TokenIssuanceFailed(ResponseContext),

    #[error("Could not fetch host")]
    HostFetchFailed(ResponseContext),

    #[error("Could not create host")]
    HostCreateFailed(ResponseContext),

    #[error("Could not create scope")]
    ScopeCreateFailed(ResponseContext),

    #[error("Could not fetch configuration")]
    ConfigFetchFailed(ResponseContext),

    #[error("Could not update configuration")]
    ConfigUpdateFailed(ResponseContext),

    #[error("Could not send purge batch")]
    PurgeSubmitFailed(ResponseContext),

    #[error("Could not fetch purge status")]
    PurgeStatusFailed(ResponseContext),
}

impl ApiError {
    /// The response that caused this failure
    pub fn context(&self) -> &ResponseContext {
        match self {
            Self::VersionFetchFailed(ctx)
            | Self::UserFetchFailed(ctx)
            | Self::LoginFailed(ctx)
            | Self::UserLookupFailed(ctx)
            | Self::TokenIssuanceFailed(ctx)
            | Self::HostFetchFailed(ctx)
            | Self::HostCreateFailed(ctx)
            | Self::ScopeCreateFailed(ctx)
            | Self::ConfigFetchFailed(ctx)
            | Self::ConfigUpdateFailed(ctx)
            | Self::PurgeSubmitFailed(ctx)
            | Self::PurgeStatusFailed(ctx) => ctx,
        }
    }

    /// Text shown under the message: the server's `error` field, else the raw body
    pub fn detail(&self) -> Option<String> {
        let ctx = self.context();
        ctx.error_message().or_else(|| {
            let body = ctx.body.trim();
            (!body.is_empty()).then(|| body.to_string())
        })
    }
}
