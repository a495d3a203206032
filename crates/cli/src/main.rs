//! IT Helpdesk CLI - Database migrations and profile management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! helpdesk-cli migrate
//!
//! # List profiles
//! helpdesk-cli profile list
//!
//! # Promote someone to admin
//! helpdesk-cli profile set-role -e alice@corp.com -r admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `profile list` - List profiles and their roles
//! - `profile set-role` - Change a profile's role

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "helpdesk-cli")]
#[command(author, version, about = "IT helpdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List every profile
    List,
    /// Change the role of an existing profile
    SetRole {
        /// Profile email address
        #[arg(short, long)]
        email: String,

        /// New role (`user`, `admin`)
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Profile { action } => match action {
            ProfileAction::List => commands::profile::list().await?,
            ProfileAction::SetRole { email, role } => {
                commands::profile::set_role(&email, &role).await?;
            }
        },
    }
    Ok(())
}
