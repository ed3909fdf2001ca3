//! Import tokens command implementation.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Args;

use rxstorage_core::{AccessToken, RefreshToken, TokenSet, TokenStore, expiry_after};

use crate::cli::ApiArgs;
use crate::output;
use crate::session::FileTokenStore;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// OAuth access token
    #[arg(long, env = "RXSTORAGE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// OAuth refresh token
    #[arg(long, env = "RXSTORAGE_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Seconds until the access token expires
    #[arg(long)]
    pub expires_in: Option<i64>,
}

pub async fn run(args: ImportArgs, api: &ApiArgs) -> Result<()> {
    if args.access_token.trim().is_empty() {
        bail!("Access token must not be empty");
    }

    let store = FileTokenStore::resolve(api.token_file.as_deref())?;
    let expires_at = match args.expires_in {
        Some(secs) => {
            Some(expiry_after(Utc::now(), secs).context("--expires-in is out of range")?)
        }
        None => None,
    };

    let tokens = TokenSet::new(
        AccessToken::new(args.access_token),
        args.refresh_token.map(RefreshToken::new),
        expires_at,
    );

    store
        .save(&tokens)
        .await
        .context("Failed to save tokens")?;

    output::success("Tokens imported");
    output::field("Token file", &store.path().display().to_string());
    if tokens.refresh_token.is_none() {
        output::hint("No refresh token given; the session ends when the access token expires.");
    }

    Ok(())
}
