//! Host commands

use anyhow::Result;
use clap::Args;
use tracing::warn;

use crate::api::types::BearerToken;
use crate::cli::Context;
use crate::output;
use crate::workflow::clone_host;

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Account hash owning the host
    pub account: String,

    /// Host hash code
    pub host: String,
}

pub async fn get(ctx: &Context, token: &BearerToken, args: HostArgs) -> Result<()> {
    let host = ctx
        .client
        .fetch_host(token, &args.account, &args.host)
        .await?;
    output::print_output(&host, ctx.config.output_format)?;
    Ok(())
}

pub async fn clone(ctx: &Context, token: &BearerToken, args: HostArgs) -> Result<()> {
    let format = ctx.config.output_format;

    let report = clone_host(&ctx.client, token, &args.account, &args.host, |cloned| {
        output::heading(&format!("{} {}", cloned.scope.platform, cloned.scope.path));
        if let Err(e) = output::print_output(&cloned.configuration, format) {
            warn!("Could not print configuration of scope {}: {}", cloned.scope.id, e);
        }
    })
    .await?;

    output::success(&format!(
        "Cloned {} into {} ({}) with {} scopes",
        report.source.name,
        report.host.name,
        report.host.hash_code,
        report.scopes.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::cli::tests::test_context;
    use httpmock::MockServer;
    use serde_json::json;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_get_host_hits_endpoint() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/api/v1/accounts/x1x2x3x4/hosts/y2z4a6b8")
                .header("Authorization", "Bearer testtoken");
            then.status(200).json_body(json!({
                "hashCode": "y2z4a6b8",
                "name": "Static assets",
                "services": [],
                "scopes": []
            }));
        });

        let cache = NamedTempFile::new().unwrap();
        let ctx = test_context(&server.base_url(), &cache);
        get(
            &ctx,
            &BearerToken::new("testtoken"),
            HostArgs {
                account: "x1x2x3x4".into(),
                host: "y2z4a6b8".into(),
            },
        )
        .await
        .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_clone_create_failure_reports_server_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/api/v1/accounts/x1x2x3x4/hosts/y2z4a6b8");
            then.status(200)
                .json_body(json!({"hashCode": "y2z4a6b8", "name": "Static assets"}));
        });
        server.mock(|when, then| {
            when.method("POST").path("/api/v1/accounts/x1x2x3x4/hosts");
            then.status(409).json_body(json!({"error": "Host name already exists"}));
        });

        let cache = NamedTempFile::new().unwrap();
        let ctx = test_context(&server.base_url(), &cache);
        let err = clone(
            &ctx,
            &BearerToken::new("testtoken"),
            HostArgs {
                account: "x1x2x3x4".into(),
                host: "y2z4a6b8".into(),
            },
        )
        .await
        .unwrap_err();

        let api = err.downcast_ref::<ApiError>().expect("api error");
        assert!(matches!(api, ApiError::HostCreateFailed(_)));
        assert_eq!(api.detail().as_deref(), Some("Host name already exists"));
    }
}
