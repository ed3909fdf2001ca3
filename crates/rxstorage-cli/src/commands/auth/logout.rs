//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use rxstorage_core::TokenStore;

use crate::cli::ApiArgs;
use crate::output;
use crate::session::FileTokenStore;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, api: &ApiArgs) -> Result<()> {
    let store = FileTokenStore::resolve(api.token_file.as_deref())?;
    store.clear().await.context("Failed to clear tokens")?;

    output::success("Signed out");
    Ok(())
}
