//! Token status command implementation.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use rxstorage_core::TokenStore;

use crate::cli::ApiArgs;
use crate::output;
use crate::session::FileTokenStore;

#[derive(Args, Debug)]
pub struct StatusArgs {}

pub async fn run(_args: StatusArgs, api: &ApiArgs) -> Result<()> {
    let store = FileTokenStore::resolve(api.token_file.as_deref())?;
    let tokens = store
        .load()
        .await
        .context("Failed to load tokens")?
        .context("No stored tokens. Run 'rxstorage auth import' first.")?;

    let now = Utc::now();
    let expiry = match tokens.expires_at {
        Some(at) if at <= now => format!("{} (expired)", at.to_rfc3339()),
        Some(at) => format!("{} (in {}s)", at.to_rfc3339(), (at - now).num_seconds()),
        None => "unknown".to_string(),
    };

    output::field("Token file", &store.path().display().to_string());
    output::field("Access token expires", &expiry);
    output::field(
        "Refresh token",
        if tokens.refresh_token.is_some() {
            "present"
        } else {
            "absent"
        },
    );

    Ok(())
}
