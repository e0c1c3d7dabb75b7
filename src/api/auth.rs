//! Token acquisition: password login bootstrapping a durable API token

use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use crate::api::client::StrikeTrackerClient;
use crate::api::error::ApiError;
use crate::api::types::BearerToken;

/// Application name registered with new tokens when none is given
pub const DEFAULT_APPLICATION: &str = "StrikeTracker Rust client";

impl StrikeTrackerClient {
    /// Log in with username and password and mint a long-lived API token.
    ///
    /// The short-lived access token from the login step is only used to
    /// look up the user and issue the API token; it is never returned.
    pub async fn create_token(
        &self,
        username: &str,
        password: &str,
        application: Option<&str>,
    ) -> Result<BearerToken, ApiError> {
        let application = application.unwrap_or(DEFAULT_APPLICATION);

        // Grab an access token to use to fetch user
        let login = self
            .request(Method::POST, "/auth/token")
            .header("User-Agent", application)
            .form(&[
                ("username", username),
                ("password", password),
                ("grant_type", "password"),
            ]);
        let reply = self.execute(login).await.map_err(ApiError::LoginFailed)?;
        let access_token = reply
            .string_field("access_token")
            .map(BearerToken::new)
            .map_err(ApiError::LoginFailed)?;
        debug!("Obtained access token for {}", username);

        // Grab user's id and root account hash
        let reply = self
            .execute(self.authed(Method::GET, "/api/v1/users/me", &access_token))
            .await
            .map_err(ApiError::UserLookupFailed)?;
        let account_hash = reply
            .string_field("accountHash")
            .map_err(ApiError::UserLookupFailed)?;
        let user_id = reply
            .string_field("id")
            .map_err(ApiError::UserLookupFailed)?;

        // Generate a new API token
        let path = format!("/api/v1/accounts/{}/users/{}/tokens", account_hash, user_id);
        let issue = self
            .authed(Method::POST, &path, &access_token)
            .json(&json!({ "password": password, "application": application }));
        let reply = self
            .execute(issue)
            .await
            .map_err(ApiError::TokenIssuanceFailed)?;
        let token = reply
            .string_field("token")
            .map(BearerToken::new)
            .map_err(ApiError::TokenIssuanceFailed)?;

        info!("Issued API token for user {} on account {}", user_id, account_hash);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use serde_json::json;

    fn client(server: &MockServer) -> StrikeTrackerClient {
        StrikeTrackerClient::new(&server.base_url()).expect("client")
    }

    #[tokio::test]
    async fn test_create_token() {
        let server = MockServer::start();
        let login = server.mock(|when, then| {
            when.method("POST")
                .path("/auth/token")
                .header("User-Agent", DEFAULT_APPLICATION)
                .form_urlencoded_tuple("username", "bob")
                .form_urlencoded_tuple("password", "password1")
                .form_urlencoded_tuple("grant_type", "password");
            then.status(201).json_body(json!({"access_token": "flargyblarg"}));
        });
        let me = server.mock(|when, then| {
            when.method("GET")
                .path("/api/v1/users/me")
                .header("Authorization", "Bearer flargyblarg");
            then.status(200)
                .json_body(json!({"id": 12345, "accountHash": "x1x2x3x4"}));
        });
        let issue = server.mock(|when, then| {
            when.method("POST")
                .path("/api/v1/accounts/x1x2x3x4/users/12345/tokens")
                .header("Authorization", "Bearer flargyblarg")
                .json_body(json!({"password": "password1", "application": DEFAULT_APPLICATION}));
            then.status(200).json_body(json!({"token": "foo"}));
        });

        let token = client(&server)
            .create_token("bob", "password1", None)
            .await
            .unwrap();

        assert_eq!(token.as_str(), "foo");
        login.assert();
        me.assert();
        issue.assert();
    }

    #[tokio::test]
    async fn test_create_token_custom_application() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST")
                .path("/auth/token")
                .header("User-Agent", "deploy-bot");
            then.status(201).json_body(json!({"access_token": "flargyblarg"}));
        });
        server.mock(|when, then| {
            when.method("GET").path("/api/v1/users/me");
            then.status(200)
                .json_body(json!({"id": 12345, "accountHash": "x1x2x3x4"}));
        });
        let issue = server.mock(|when, then| {
            when.method("POST")
                .path("/api/v1/accounts/x1x2x3x4/users/12345/tokens")
                .json_body_includes(r#"{"application": "deploy-bot"}"#);
            then.status(200).json_body(json!({"token": "bar"}));
        });

        let token = client(&server)
            .create_token("bob", "password1", Some("deploy-bot"))
            .await
            .unwrap();
        assert_eq!(token.as_str(), "bar");
        issue.assert();
    }

    #[tokio::test]
    async fn test_create_token_fails_login() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/auth/token");
            then.status(401)
                .json_body(json!({"error": "This endpoint requires authentication"}));
        });
        let me = server.mock(|when, then| {
            when.method("GET").path("/api/v1/users/me");
            then.status(200)
                .json_body(json!({"id": 12345, "accountHash": "x1x2x3x4"}));
        });
        let issue = server.mock(|when, then| {
            when.method("POST")
                .path("/api/v1/accounts/x1x2x3x4/users/12345/tokens");
            then.status(200).json_body(json!({"token": "foo"}));
        });

        let err = client(&server)
            .create_token("bob", "password1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::LoginFailed(_)));
        assert_eq!(err.to_string(), "Could not fetch access token");
        me.assert_calls(0);
        issue.assert_calls(0);
    }

    #[tokio::test]
    async fn test_create_token_fails_me() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/auth/token");
            then.status(201).json_body(json!({"access_token": "flargyblarg"}));
        });
        server.mock(|when, then| {
            when.method("GET").path("/api/v1/users/me");
            then.status(404).json_body(json!({"error": "User not found"}));
        });
        let issue = server.mock(|when, then| {
            when.method("POST")
                .path("/api/v1/accounts/x1x2x3x4/users/12345/tokens");
            then.status(200).json_body(json!({"token": "foo"}));
        });

        let err = client(&server)
            .create_token("bob", "password1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UserLookupFailed(_)));
        assert_eq!(err.to_string(), "Could not fetch user's root account hash");
        assert_eq!(err.detail().as_deref(), Some("User not found"));
        issue.assert_calls(0);
    }

    #[tokio::test]
    async fn test_create_token_fails_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/auth/token");
            then.status(201).json_body(json!({"access_token": "flargyblarg"}));
        });
        server.mock(|when, then| {
            when.method("GET").path("/api/v1/users/me");
            then.status(200)
                .json_body(json!({"id": 12345, "accountHash": "x1x2x3x4"}));
        });
        server.mock(|when, then| {
            when.method("POST")
                .path("/api/v1/accounts/x1x2x3x4/users/12345/tokens");
            then.status(500)
                .json_body(json!({"error": "Could not write token to database"}));
        });

        let err = client(&server)
            .create_token("bob", "password1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::TokenIssuanceFailed(_)));
        assert_eq!(err.to_string(), "Could not generate API token");
    }
}
