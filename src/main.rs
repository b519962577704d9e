//! FinditBack - community lost-and-found CLI
//!
#![doc = "FinditBack - community lost-and-found CLI"]
#![doc = "Main entry point for the FinditBack terminal client."]

use anyhow::Result;

use finditback::cli::{Cli, Commands};
use finditback::commands;
use finditback::commands::items::ReportArgs;
use finditback::config::Config;
use finditback::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Initialize tracing
    init_logging(&config.logging)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Login { username, password } => {
            tracing::info!("Logging in as {}", username);
            commands::auth::login(&config, &username, password).await?;
        }
        Commands::Signup {
            username,
            email,
            password,
        } => {
            tracing::info!("Registering {}", username);
            commands::auth::signup(&config, &username, &email, password).await?;
        }
        Commands::Logout => {
            commands::auth::logout(&config).await?;
        }
        Commands::Items { kind } => {
            tracing::debug!("Listing {:?} items", kind);
            commands::items::list_items(&config, kind.into()).await?;
        }
        Commands::Report {
            kind,
            title,
            description,
            location,
            category,
            photo,
        } => {
            if let Some(p) = &photo {
                tracing::debug!("Attaching photo {}", p.display());
            }
            let args = ReportArgs {
                kind: kind.into(),
                title,
                description,
                location,
                category: category.as_str().to_string(),
                photo,
            };
            commands::items::report_item(&config, args).await?;
        }
        Commands::Chat { item, kind } => {
            tracing::info!("Starting chat about item {}", item);
            commands::chat::run_chat(&config, &item, kind.map(Into::into)).await?;
        }
    }

    Ok(())
}
