//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use rxstorage_core::TokenStore;

use crate::cli::ApiArgs;
use crate::output;
use crate::session::Connection;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(_args: RefreshArgs, api: &ApiArgs) -> Result<()> {
    let conn = Connection::open(api)?;

    eprintln!("{}", "Refreshing tokens...".dimmed());

    let result = conn
        .client
        .auth()
        .force_refresh()
        .await
        .context("Failed to refresh tokens");
    let store = conn.store.clone();
    conn.finish(result).await?;

    output::success("Tokens refreshed");
    if let Some(expires_at) = store.load().await?.and_then(|t| t.expires_at) {
        output::field("Access token expires", &expires_at.to_rfc3339());
    }

    Ok(())
}
