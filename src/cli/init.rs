//! Init command: obtain an API token and cache it locally

use anyhow::{Context as _, Result};
use clap::Args;
use console::Term;
use std::io::BufRead;

use crate::cli::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Name of application with which to register this token
    #[arg(long)]
    pub application: Option<String>,
}

/// Username and password for the password login
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Ask for credentials: the username on stdin, the password without echo
pub fn prompt_credentials() -> Result<Credentials> {
    let term = Term::stderr();
    term.write_str("Username: ")?;
    let username = read_username(std::io::stdin().lock())?;

    term.write_str("Password: ")?;
    let password = term
        .read_secure_line()
        .context("Failed to read password")?;

    Ok(Credentials {
        username,
        password,
    })
}

/// One line of input, trimmed
fn read_username<R: BufRead>(mut input: R) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read username")?;
    Ok(line.trim().to_string())
}

pub async fn execute(ctx: &mut Context, args: InitArgs) -> Result<()> {
    execute_with(ctx, args, prompt_credentials).await
}

/// Run init, calling `prompt` only when no token was supplied
pub async fn execute_with<P>(ctx: &mut Context, args: InitArgs, prompt: P) -> Result<()>
where
    P: FnOnce() -> Result<Credentials>,
{
    println!("Initializing configuration...");

    let token = match ctx.token_override.clone() {
        Some(token) => token,
        None => {
            let creds = prompt()?;
            ctx.client
                .create_token(&creds.username, &creds.password, args.application.as_deref())
                .await?
        }
    };

    ctx.store.set_token(&token)?;
    output::success("Successfully saved token");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::BearerToken;
    use crate::api::ApiError;
    use crate::cli::tests::test_context;
    use crate::config::CredentialStore;
    use httpmock::MockServer;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn bob() -> Result<Credentials> {
        Ok(Credentials {
            username: "bob".to_string(),
            password: "password1".to_string(),
        })
    }

    #[test]
    fn test_read_username_from_input() {
        let input = std::io::Cursor::new("bob\nignored\n");
        assert_eq!(read_username(input).unwrap(), "bob");

        let input = std::io::Cursor::new("  alice  \r\n");
        assert_eq!(read_username(input).unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_init_token_supplied() {
        let cache = NamedTempFile::new().unwrap();
        // Any request would fail: nothing listens here
        let mut ctx = test_context("http://127.0.0.1:1", &cache);
        ctx.token_override = Some(BearerToken::new("foobar"));

        execute_with(&mut ctx, InitArgs { application: None }, || {
            panic!("prompted despite --token")
        })
        .await
        .unwrap();

        let mut fresh = CredentialStore::new(cache.path());
        assert_eq!(fresh.token().unwrap().unwrap().as_str(), "foobar");
    }

    #[tokio::test]
    async fn test_init_prompts_and_saves_token() {
        let server = MockServer::start();
        let login = server.mock(|when, then| {
            when.method("POST")
                .path("/auth/token")
                .form_urlencoded_tuple("username", "bob")
                .form_urlencoded_tuple("password", "password1");
            then.status(200).json_body(json!({"access_token": "flargyblarg"}));
        });
        server.mock(|when, then| {
            when.method("GET")
                .path("/api/v1/users/me")
                .header("Authorization", "Bearer flargyblarg");
            then.status(200)
                .json_body(json!({"id": 12345, "accountHash": "x1x2x3x4"}));
        });
        server.mock(|when, then| {
            when.method("POST")
                .path("/api/v1/accounts/x1x2x3x4/users/12345/tokens");
            then.status(200).json_body(json!({"token": "rikkitikkitavi"}));
        });

        let cache = NamedTempFile::new().unwrap();
        let mut ctx = test_context(&server.base_url(), &cache);

        execute_with(&mut ctx, InitArgs { application: None }, bob)
            .await
            .unwrap();

        login.assert();
        let mut fresh = CredentialStore::new(cache.path());
        assert_eq!(fresh.token().unwrap().unwrap().as_str(), "rikkitikkitavi");
    }

    #[tokio::test]
    async fn test_init_login_failure_saves_nothing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/auth/token");
            then.status(401)
                .json_body(json!({"error": "Invalid username or password"}));
        });

        let cache = NamedTempFile::new().unwrap();
        let mut ctx = test_context(&server.base_url(), &cache);

        let err = execute_with(&mut ctx, InitArgs { application: None }, bob)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::LoginFailed(_))
        ));

        let mut fresh = CredentialStore::new(cache.path());
        assert!(fresh.token().unwrap().is_none());
    }
}
