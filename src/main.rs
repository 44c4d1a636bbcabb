// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Smart Wardrobe command-line client
//!
//! Logs in against the wardrobe backend, keeps the session on disk between
//! runs and exposes the wardrobe operations as subcommands.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use smart_wardrobe_client::{
    config::Config,
    models::{Credentials, EventType, FileUpload, Gender, Registration},
    services::SessionEvent,
    AppState,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "wardrobe",
    about = "Manage your Smart Wardrobe from the terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,

        /// Password (read from WARDROBE_PASSWORD when omitted)
        #[arg(long, env = "WARDROBE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "WARDROBE_PASSWORD", hide_env_values = true)]
        password: String,
        /// M or F
        #[arg(long)]
        gender: Gender,
        /// Birthday as YYYY-MM-DD
        #[arg(long)]
        birthday: NaiveDate,
        #[arg(long)]
        phone_number: Option<String>,
        /// Profile picture to upload
        #[arg(long)]
        profile_image: Option<PathBuf>,
    },

    /// Forget the stored session
    Logout,

    /// Show whether a session is stored and for whom
    Status,

    /// Force an access token refresh
    Refresh,

    /// List clothing items
    Items,

    /// List clothing categories
    Categories,

    /// Classify an image and add it to the wardrobe
    Upload {
        /// Image file
        path: PathBuf,
    },

    /// Delete a clothing item
    Delete { id: u64 },

    /// Generate an outfit for an occasion
    Outfit {
        #[arg(value_enum)]
        event: EventType,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    init_logging(config.log_json);

    tracing::debug!(api_url = %config.api_url, state = %config.state_path.display(), "Starting");
    let state = AppState::from_config(config).context("Failed to initialize client")?;

    let mut events = state.session.subscribe();
    let result = run(cli.command, &state).await;

    while let Ok(event) = events.try_recv() {
        if event == SessionEvent::Expired {
            eprintln!("Your session has expired. Run `wardrobe login` to sign in again.");
        }
    }

    result
}

async fn run(command: Command, state: &AppState) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let auth = state
                .session
                .login(&Credentials::new(email, password))
                .await
                .context("Login failed")?;
            print_json(&auth.user)?;
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
            gender,
            birthday,
            phone_number,
            profile_image,
        } => {
            let profile_image = match profile_image {
                Some(path) => Some(
                    FileUpload::from_path(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let registration = Registration {
                first_name,
                last_name,
                email,
                password,
                gender,
                birthday,
                phone_number,
                profile_image,
            };
            let auth = state
                .session
                .register(&registration)
                .await
                .context("Registration failed")?;
            print_json(&auth.user)?;
        }
        Command::Logout => {
            state.session.logout()?;
            println!("Logged out");
        }
        Command::Status => {
            #[derive(Serialize)]
            struct Status {
                state: String,
                user: Option<String>,
            }
            print_json(&Status {
                state: format!("{:?}", state.session.auth_state()),
                user: state
                    .session
                    .get_user_profile()
                    .and_then(|p| p.display_name()),
            })?;
        }
        Command::Refresh => {
            state.session.refresh_access_token().await?;
            println!("Access token refreshed");
        }
        Command::Items => print_json(&state.wardrobe.list_items().await?)?,
        Command::Categories => print_json(&state.wardrobe.categories().await?)?,
        Command::Upload { path } => {
            let image = FileUpload::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            print_json(&state.wardrobe.upload_item(image).await?)?;
        }
        Command::Delete { id } => {
            state.wardrobe.delete_item(id).await?;
            println!("Deleted item {}", id);
        }
        Command::Outfit { event } => print_json(&state.wardrobe.generate_outfit(event).await?)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize logging to stderr, JSON or compact text.
fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("smart_wardrobe_client=info,wardrobe=info,warn")
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
