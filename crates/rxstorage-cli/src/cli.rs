//! CLI argument definitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use rxstorage_core::ApiUrl;
use rxstorage_http::ClientConfig;

use crate::commands::auth::AuthCommand;
use crate::commands::get::GetArgs;
use crate::commands::list::ListArgs;

/// Search and browse an RxStorage inventory.
#[derive(Parser, Debug)]
#[command(name = "rxstorage")]
#[command(author, version = env!("RXSTORAGE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage stored OAuth tokens
    Auth(AuthCommand),

    /// List or search entities, one JSON object per line
    List(ListArgs),

    /// Fetch a single entity by id
    Get(GetArgs),
}

/// Connection settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// Base URL of the RxStorage API
    #[arg(long, env = "RXSTORAGE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// OAuth issuer URL (defaults to the API URL)
    #[arg(long, env = "RXSTORAGE_ISSUER", global = true)]
    pub issuer: Option<String>,

    /// OAuth client id used for token refresh
    #[arg(
        long,
        env = "RXSTORAGE_CLIENT_ID",
        global = true,
        default_value = "rxstorage-cli"
    )]
    pub client_id: String,

    /// Token file (defaults to the user data directory)
    #[arg(long, env = "RXSTORAGE_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,
}

impl ApiArgs {
    /// Resolve the client configuration; an API URL is required.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let api_url = self
            .api_url
            .as_deref()
            .context("No API URL. Pass --api-url or set RXSTORAGE_API_URL.")?;
        let api_url = ApiUrl::new(api_url).context("Invalid API URL")?;

        let issuer = self
            .issuer
            .clone()
            .unwrap_or_else(|| api_url.as_str().to_string());

        Ok(ClientConfig::new(api_url, issuer, self.client_id.clone()))
    }
}

/// The searchable entity kinds.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Items,
    Categories,
    Locations,
    Authors,
    PositionSchemas,
}
