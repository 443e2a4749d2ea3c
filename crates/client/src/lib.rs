// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destajo client: authenticated API access for the piece-rate payroll backend.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod identity;
pub mod sessions;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::AuthClient;
pub use error::AuthError;
pub use identity::Identity;
pub use transport::{ApiRequest, ApiResponse};

use crate::config::ClientConfig;

/// Command-line interface of the `destajo` binary.
#[derive(Debug, clap::Parser)]
#[command(name = "destajo", version, about = "Piece-rate payroll API client")]
pub struct Cli {
    #[command(flatten)]
    pub config: ClientConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Print the authenticated user.
    Whoami,
    /// GET a protected endpoint and print the JSON body.
    Get {
        /// Path relative to the API base URL, e.g. `/areas/`.
        path: String,
    },
    /// Manage active sessions.
    Sessions {
        #[command(subcommand)]
        action: SessionsCommand,
    },
    /// End the session on the server.
    Logout,
}

#[derive(Debug, clap::Subcommand)]
pub enum SessionsCommand {
    /// All active sessions (admin).
    List,
    /// Sessions of the current user.
    Mine,
    /// Revoke a session by token id (admin).
    Revoke { token_id: i64 },
    /// Close every session of the current user.
    LogoutAll,
}

/// Run one CLI command.
///
/// Tries to restore an existing session first; falls back to logging in with
/// the configured username and password.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = AuthClient::from_config(&cli.config)?;
    client.bootstrap().await;

    if !client.is_authenticated() {
        match (cli.config.username.as_deref(), cli.config.password.as_deref()) {
            (Some(username), Some(password)) => {
                client
                    .login(username, password)
                    .await
                    .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;
            }
            _ => anyhow::bail!(
                "no existing session; pass --username/--password \
                 (or DESTAJO_USERNAME/DESTAJO_PASSWORD) to sign in"
            ),
        }
    }

    match cli.command {
        Command::Whoami => {
            print_json(&serde_json::to_value(client.current_identity())?)?;
        }
        Command::Get { path } => {
            let resp = client.dispatch(ApiRequest::get(path)).await?;
            print_json(&resp.json_value()?)?;
        }
        Command::Sessions { action } => match action {
            SessionsCommand::List => {
                print_json(&serde_json::to_value(sessions::list_all(&client).await?)?)?;
            }
            SessionsCommand::Mine => {
                print_json(&serde_json::to_value(sessions::list_mine(&client).await?)?)?;
            }
            SessionsCommand::Revoke { token_id } => {
                sessions::revoke(&client, token_id).await?;
                tracing::info!(token_id, "session revoked");
            }
            SessionsCommand::LogoutAll => {
                sessions::logout_all(&client).await?;
                tracing::info!("all sessions closed");
            }
        },
        Command::Logout => client.logout().await,
    }

    Ok(())
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
