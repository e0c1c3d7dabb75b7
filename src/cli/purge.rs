//! Purge commands

use anyhow::{Context as _, Result};
use clap::Args;

use crate::api::types::{BearerToken, PurgeFlags};
use crate::cli::Context;
use crate::output;
use crate::workflow::purge::read_requests;
use crate::workflow::{PurgeOutcome, PurgeWorkflow};

#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Account from which to purge assets
    pub account: String,

    /// Poll for purge status to be complete instead of returning id
    #[arg(long)]
    pub poll: bool,

    /// Force revalidation on assets instead of removing them
    #[arg(long)]
    pub invalidate_only: bool,

    /// Purge all dynamic version of asset
    #[arg(long)]
    pub purge_all_dynamic: bool,

    /// Purge all assets at this path recursively
    #[arg(long)]
    pub recursive: bool,
}

impl PurgeArgs {
    pub fn flags(&self) -> PurgeFlags {
        PurgeFlags {
            purge_all_dynamic: self.purge_all_dynamic,
            recursive: self.recursive,
            invalidate_only: self.invalidate_only,
        }
    }
}

#[derive(Args, Debug)]
pub struct PurgeStatusArgs {
    /// Account from which to purge assets
    pub account: String,

    /// Job id for which to fetch status
    pub job_id: String,
}

pub async fn execute(ctx: &Context, token: &BearerToken, args: PurgeArgs) -> Result<()> {
    output::status("Reading urls from stdin\n");
    let requests = read_requests(std::io::stdin().lock(), args.flags())
        .context("Failed to read urls from stdin")?;

    let workflow = PurgeWorkflow::new(&ctx.client, token, &args.account);
    if args.poll {
        output::status("Sending purge...");
    }

    let outcome = workflow
        .run(&requests, args.poll, |_| output::tick())
        .await
        .inspect_err(|_| {
            if args.poll {
                output::status("\n");
            }
        })?;

    match outcome {
        PurgeOutcome::Submitted { job_id } => println!("{}", job_id),
        PurgeOutcome::Completed { .. } => output::status("Done!\n"),
    }
    Ok(())
}

pub async fn status(ctx: &Context, token: &BearerToken, args: PurgeStatusArgs) -> Result<()> {
    let progress = ctx
        .client
        .fetch_purge_status(token, &args.account, &args.job_id)
        .await?;
    println!("{:?}", progress);
    Ok(())
}
