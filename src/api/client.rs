//! HTTP client for the StrikeTracker API

use anyhow::Result;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::api::error::{ApiError, ResponseContext};
use crate::api::types::{
    BearerToken, Configuration, Host, HostSpec, PurgeRequest, Scope, ScopeSpec, User,
};

/// Response header carrying the API version
pub const VERSION_HEADER: &str = "X-Cdnws-Version";

/// Status and body of a completed HTTP exchange
#[derive(Debug)]
pub(crate) struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn context(&self) -> ResponseContext {
        ResponseContext::new(self.status.as_u16(), self.body.clone())
    }

    /// Fail unless the server answered with `expected`
    pub fn expect_status(self, expected: StatusCode) -> Result<Self, ResponseContext> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(self.context())
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ResponseContext> {
        serde_json::from_str(&self.body).map_err(|e| {
            debug!("Undecodable response body: {}", e);
            self.context()
        })
    }

    /// Top-level field of a JSON object body, if present and not null
    pub fn field(&self, name: &str) -> Result<Value, ResponseContext> {
        let value: Value = self.json()?;
        match value.get(name) {
            Some(v) if !v.is_null() => Ok(v.clone()),
            _ => Err(self.context()),
        }
    }

    /// Top-level string field; numbers are rendered as strings
    pub fn string_field(&self, name: &str) -> Result<String, ResponseContext> {
        match self.field(name)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(self.context()),
        }
    }
}

/// StrikeTracker API client
pub struct StrikeTrackerClient {
    client: Client,
    base_url: String,
}

impl StrikeTrackerClient {
    /// Create a new client against `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("striketracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build an unauthenticated request
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    /// Build request with the bearer header attached
    pub(crate) fn authed(&self, method: Method, path: &str, token: &BearerToken) -> RequestBuilder {
        self.request(method, path)
            .header("Authorization", token.header_value())
    }

    /// Send a request and read the whole body
    pub(crate) async fn execute(&self, req: RequestBuilder) -> Result<Reply, ResponseContext> {
        let response = req.send().await.map_err(|e| ResponseContext::transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResponseContext::transport(&e))?;
        trace!("Response ({}): {}", status, body);

        Ok(Reply { status, body })
    }

    /// Send, require `expected`, decode the body
    async fn call<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        expected: StatusCode,
        fail: fn(ResponseContext) -> ApiError,
    ) -> Result<T, ApiError> {
        let reply = self.execute(req).await.map_err(fail)?;
        reply.expect_status(expected).and_then(|r| r.json()).map_err(fail)
    }

    /// Fetch the API version from the version response header
    pub async fn fetch_version(&self) -> Result<String, ApiError> {
        let response = self
            .request(Method::GET, "/version")
            .send()
            .await
            .map_err(|e| ApiError::VersionFetchFailed(ResponseContext::transport(&e)))?;

        let status = response.status().as_u16();
        let version = response
            .headers()
            .get(VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        if let Some(version) = version {
            return Ok(version);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::VersionFetchFailed(ResponseContext::new(status, body)))
    }

    /// Fetch the user owning `token`
    pub async fn fetch_current_user(&self, token: &BearerToken) -> Result<User, ApiError> {
        self.call(
            self.authed(Method::GET, "/api/v1/users/me", token),
            StatusCode::OK,
            ApiError::UserFetchFailed,
        )
        .await
    }

    /// Fetch a host with its scopes
    pub async fn fetch_host(
        &self,
        token: &BearerToken,
        account: &str,
        host: &str,
    ) -> Result<Host, ApiError> {
        let path = format!("/api/v1/accounts/{}/hosts/{}", account, host);
        self.call(
            self.authed(Method::GET, &path, token),
            StatusCode::OK,
            ApiError::HostFetchFailed,
        )
        .await
    }

    /// Create a host under `account`
    pub async fn create_host(
        &self,
        token: &BearerToken,
        account: &str,
        spec: &HostSpec,
    ) -> Result<Host, ApiError> {
        let path = format!("/api/v1/accounts/{}/hosts", account);
        self.call(
            self.authed(Method::POST, &path, token).json(spec),
            StatusCode::CREATED,
            ApiError::HostCreateFailed,
        )
        .await
    }

    /// Create a scope under `host`
    pub async fn create_scope(
        &self,
        token: &BearerToken,
        account: &str,
        host: &str,
        spec: &ScopeSpec,
    ) -> Result<Scope, ApiError> {
        let path = format!(
            "/api/v1/accounts/{}/hosts/{}/configuration/scopes",
            account, host
        );
        self.call(
            self.authed(Method::POST, &path, token).json(spec),
            StatusCode::CREATED,
            ApiError::ScopeCreateFailed,
        )
        .await
    }

    /// Fetch configuration of one scope
    pub async fn get_configuration(
        &self,
        token: &BearerToken,
        account: &str,
        host: &str,
        scope: u64,
    ) -> Result<Configuration, ApiError> {
        let path = format!(
            "/api/v1/accounts/{}/hosts/{}/configuration/{}",
            account, host, scope
        );
        self.call(
            self.authed(Method::GET, &path, token),
            StatusCode::OK,
            ApiError::ConfigFetchFailed,
        )
        .await
    }

    /// Replace configuration of one scope, returning what the server stored
    pub async fn update_configuration(
        &self,
        token: &BearerToken,
        account: &str,
        host: &str,
        scope: u64,
        config: &Configuration,
    ) -> Result<Configuration, ApiError> {
        let path = format!(
            "/api/v1/accounts/{}/hosts/{}/configuration/{}",
            account, host, scope
        );
        debug!(
            "PUT {} with body: {}",
            path,
            serde_json::to_string(config).unwrap_or_default()
        );
        self.call(
            self.authed(Method::PUT, &path, token).json(config),
            StatusCode::OK,
            ApiError::ConfigUpdateFailed,
        )
        .await
    }

    /// Submit a purge batch, returning the job id
    pub async fn submit_purge(
        &self,
        token: &BearerToken,
        account: &str,
        requests: &[PurgeRequest],
    ) -> Result<String, ApiError> {
        let path = format!("/api/v1/accounts/{}/purge", account);
        let body = json!({ "list": requests });
        debug!("POST {} with body: {}", path, body);

        let reply = self
            .execute(self.authed(Method::POST, &path, token).json(&body))
            .await
            .map_err(ApiError::PurgeSubmitFailed)?;
        reply.string_field("id").map_err(ApiError::PurgeSubmitFailed)
    }

    /// Fetch purge progress as a fraction in `[0.0, 1.0]`
    pub async fn fetch_purge_status(
        &self,
        token: &BearerToken,
        account: &str,
        job_id: &str,
    ) -> Result<f64, ApiError> {
        let path = format!("/api/v1/accounts/{}/purge/{}", account, job_id);
        let reply = self
            .execute(self.authed(Method::GET, &path, token))
            .await
            .map_err(ApiError::PurgeStatusFailed)?;

        let progress = reply.field("progress").map_err(ApiError::PurgeStatusFailed)?;
        let fraction = match &progress {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        fraction.ok_or_else(|| ApiError::PurgeStatusFailed(reply.context()))
    }
}
