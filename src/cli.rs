//! Command-line interface definition for FinditBack
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for authentication, browsing and reporting items,
//! and chatting about a listing.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::api::ItemKind;

/// FinditBack - community lost-and-found from the terminal
///
/// Browse lost and found listings, report items, and chat with the
/// person who posted a listing.
#[derive(Parser, Debug, Clone)]
#[command(name = "finditback")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Listing type as accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    /// Items someone lost
    Lost,
    /// Items someone found
    Found,
}

impl From<KindArg> for ItemKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Lost => ItemKind::Lost,
            KindArg::Found => ItemKind::Found,
        }
    }
}

/// Item categories offered by the report form
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryArg {
    Mobile,
    Laptop,
    Keychain,
    Wallet,
    Jewelry,
    Documents,
    Other,
}

impl CategoryArg {
    /// Value stored by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryArg::Mobile => "mobile",
            CategoryArg::Laptop => "laptop",
            CategoryArg::Keychain => "keychain",
            CategoryArg::Wallet => "wallet",
            CategoryArg::Jewelry => "jewelry",
            CategoryArg::Documents => "documents",
            CategoryArg::Other => "other",
        }
    }
}

/// Available commands for FinditBack
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store the session in the OS keyring
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password (prompted when omitted)
        #[arg(short, long, env = "FINDITBACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create a new account
    Signup {
        /// Desired username
        #[arg(short, long)]
        username: String,

        /// Contact email
        #[arg(short, long)]
        email: String,

        /// Account password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log out and forget the stored session
    Logout,

    /// List lost or found items
    Items {
        /// Which listing to show
        #[arg(short = 't', long = "type", value_enum, default_value = "lost")]
        kind: KindArg,
    },

    /// Report a lost or found item
    Report {
        /// Whether the item was lost or found
        #[arg(short = 't', long = "type", value_enum)]
        kind: KindArg,

        /// Short title of the item
        #[arg(long)]
        title: String,

        /// Longer description
        #[arg(long)]
        description: String,

        /// Where the item was lost or found
        #[arg(long)]
        location: String,

        /// Item category
        #[arg(long, value_enum, default_value = "other")]
        category: CategoryArg,

        /// Photo of the item to upload
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Chat with the poster of an item
    Chat {
        /// Identifier of the item to chat about
        #[arg(short, long)]
        item: String,

        /// Restrict the item lookup to one listing
        #[arg(short = 't', long = "type", value_enum)]
        kind: Option<KindArg>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::Items {
                kind: KindArg::Lost,
            },
        }
    }
}
