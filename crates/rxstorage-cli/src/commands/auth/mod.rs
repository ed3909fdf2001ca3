//! Token management subcommands.

mod import;
mod logout;
mod refresh;
mod status;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::ApiArgs;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Store tokens obtained from the identity provider
    Import(import::ImportArgs),

    /// Show token expiry without revealing token values
    Status(status::StatusArgs),

    /// Exchange the refresh token for a new access token
    Refresh(refresh::RefreshArgs),

    /// Delete the stored tokens
    Logout(logout::LogoutArgs),
}

pub async fn handle(cmd: AuthCommand, api: &ApiArgs) -> Result<()> {
    match cmd.command {
        AuthSubcommand::Import(args) => import::run(args, api).await,
        AuthSubcommand::Status(args) => status::run(args, api).await,
        AuthSubcommand::Refresh(args) => refresh::run(args, api).await,
        AuthSubcommand::Logout(args) => logout::run(args, api).await,
    }
}
