//! Version and user commands

use anyhow::Result;

use crate::api::types::BearerToken;
use crate::cli::Context;
use crate::output;

pub async fn version(ctx: &Context) -> Result<()> {
    let version = ctx.client.fetch_version().await?;
    println!("{}", version);
    Ok(())
}

pub async fn me(ctx: &Context, token: &BearerToken) -> Result<()> {
    let user = ctx.client.fetch_current_user(token).await?;
    output::print_output(&user, ctx.config.output_format)?;
    Ok(())
}
