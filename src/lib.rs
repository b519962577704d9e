//! FinditBack - community lost-and-found client library
//!
//! This library provides the client side of the FinditBack platform:
//! account management, browsing and reporting lost or found items, and
//! item-scoped conversations that stay synchronized with the backend.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: Backend HTTP client, wire types and the `ChatApi` seam
//! - `chat`: Chat session controller and transcript rendering
//! - `session`: Login persistence in the OS keyring
//! - `commands`: Handlers behind the CLI commands
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `logging`: Tracing subscriber setup
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use finditback::api::{ApiClient, ItemKind, StaticCredentials};
//! use finditback::{ChatSession, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let client = ApiClient::new(&config.api, Arc::new(StaticCredentials::new("jwt")))?;
//!     let items = client.list_items(ItemKind::Lost).await?;
//!     let session = ChatSession::new(Arc::new(client), config.chat.poll_interval());
//!     if let Some(item) = items.first() {
//!         session.open(item).await;
//!         session.send_text("Is this still available?").await;
//!         session.close();
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use chat::{ChatSession, OpenOutcome, RefreshOutcome, SendOutcome, SessionStatus};
pub use config::Config;
pub use error::{FinditbackError, Result};
