//! CLI commands module

pub mod account;
pub mod host;
pub mod init;
pub mod purge;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::api::types::BearerToken;
use crate::api::{ApiError, StrikeTrackerClient};
use crate::config::{Config, CredentialStore};
use crate::output;
use crate::workflow::PurgeError;

/// Printed when an authenticated command runs without a token
pub const AUTH_REQUIRED: &str = "This command requires authentication. Either run `striketracker init` \
to cache credentials locally, or supply the --token parameter on the command line.";

/// StrikeTracker - Highwinds CDN command line client
#[derive(Parser, Debug)]
#[command(name = "striketracker")]
#[command(version)]
#[command(about = "Interface to the Highwinds CDN Web Services", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Token to use for this action
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Turn on verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: yaml, json, compact
    #[arg(short, long, global = true)]
    pub format: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cache an API token locally
    Init(init::InitArgs),

    /// Print the API version
    Version,

    /// Show the authenticated user
    Me,

    /// Purge URLs read from stdin, one per line
    Purge(purge::PurgeArgs),

    /// Show progress of a purge job
    #[command(name = "purge_status", alias = "purge-status")]
    PurgeStatus(purge::PurgeStatusArgs),

    /// Show a host and its scopes
    #[command(name = "get_host", alias = "get-host")]
    GetHost(host::HostArgs),

    /// Copy a host and the configuration of all its scopes
    #[command(name = "clone_host", alias = "clone-host")]
    CloneHost(host::HostArgs),
}

impl Commands {
    /// Whether the command needs a bearer token before it runs
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Commands::Init(_) | Commands::Version)
    }
}

/// Everything a command handler needs for one invocation
pub struct Context {
    pub config: Config,
    pub client: StrikeTrackerClient,
    pub store: CredentialStore,
    /// Token given with `--token`, taking precedence over the cache
    pub token_override: Option<BearerToken>,
}

impl Context {
    pub fn new(config: Config, token_override: Option<String>) -> Result<Self> {
        let client = StrikeTrackerClient::new(&config.base_url)?;
        let store = config.credential_store();
        Ok(Self {
            config,
            client,
            store,
            token_override: token_override.map(BearerToken::new),
        })
    }

    /// Token from `--token`, else from the credential cache
    pub fn resolve_token(&mut self) -> Result<Option<BearerToken>> {
        if let Some(token) = &self.token_override {
            return Ok(Some(token.clone()));
        }
        Ok(self.store.token()?)
    }

    /// Token for an authenticated command, or the authentication error
    pub fn require_token(&mut self) -> Result<BearerToken> {
        match self.resolve_token()? {
            Some(token) => Ok(token),
            None => bail!(AUTH_REQUIRED),
        }
    }
}

/// Run one parsed invocation
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?.with_format(cli.format.as_deref());
    let mut ctx = Context::new(config, cli.token)?;
    dispatch(&mut ctx, cli.command).await
}

/// Apply the authentication gate, then hand off to the command handler
pub async fn dispatch(ctx: &mut Context, command: Commands) -> Result<()> {
    let token = if command.requires_auth() {
        Some(ctx.require_token()?)
    } else {
        None
    };

    match (command, token) {
        (Commands::Init(args), _) => init::execute(ctx, args).await,
        (Commands::Version, _) => account::version(ctx).await,
        (Commands::Me, Some(token)) => account::me(ctx, &token).await,
        (Commands::Purge(args), Some(token)) => purge::execute(ctx, &token, args).await,
        (Commands::PurgeStatus(args), Some(token)) => purge::status(ctx, &token, args).await,
        (Commands::GetHost(args), Some(token)) => host::get(ctx, &token, args).await,
        (Commands::CloneHost(args), Some(token)) => host::clone(ctx, &token, args).await,
        (_, None) => bail!(AUTH_REQUIRED),
    }
}

/// Print a failure the way every command reports it: the message, then
/// the server's `error` field (or raw body) when there is one.
pub fn report(err: &anyhow::Error) {
    let (message, detail) = describe(err);
    output::error(&message);
    if let Some(detail) = detail {
        eprintln!("{}", detail);
    }
}

/// Message and server detail for a failed command
pub fn describe(err: &anyhow::Error) -> (String, Option<String>) {
    let api = err.downcast_ref::<ApiError>().or_else(|| {
        err.downcast_ref::<PurgeError>().and_then(|e| match e {
            PurgeError::Api(api) => Some(api),
            PurgeError::EmptyBatch => None,
        })
    });

    (err.to_string(), api.and_then(|e| e.detail()))
}
