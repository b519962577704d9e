//! Backend request/response layer
//!
//! This module defines the seams the rest of the crate talks to the
//! FinditBack backend through:
//!
//! - [`ChatApi`] -- the three conversation operations the chat session
//!   controller needs (create-or-resume, fetch, send).
//! - [`CredentialProvider`] -- source of the bearer token attached to every
//!   request, injected at construction time instead of read from ambient
//!   state.
//!
//! [`client::ApiClient`] is the `reqwest` implementation of both the chat
//! operations and the account/listing calls used by the CLI.

use std::sync::Mutex;

use crate::error::Result;

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{ChatThread, Item, ItemKind, Message, NewItem, UserRef};

/// Conversation operations against the backend.
///
/// Every call returns the server's complete, ordered message snapshot for
/// the thread; callers replace their local view with it wholesale.
#[async_trait::async_trait]
pub trait ChatApi: Send + Sync + std::fmt::Debug {
    /// Create the thread for `item_id`, or resume the caller's existing one.
    async fn create_or_resume(&self, item_id: &str) -> Result<ChatThread>;

    /// Fetch the full message snapshot of `thread_id`.
    async fn fetch_thread(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Append `text` to `thread_id` and return the resulting snapshot.
    async fn send_message(&self, thread_id: &str, text: &str) -> Result<Vec<Message>>;
}

/// Supplies the bearer credential for outbound requests.
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    /// Current bearer token, if the user is logged in.
    fn bearer_token(&self) -> Option<String>;

    /// Forget the credential after the backend rejected it.
    fn invalidate(&self);
}

/// In-memory credential holder.
///
/// # Examples
///
/// ```
/// use finditback::api::{CredentialProvider, StaticCredentials};
///
/// let creds = StaticCredentials::new("tok");
/// assert_eq!(creds.bearer_token().as_deref(), Some("tok"));
/// creds.invalidate();
/// assert_eq!(creds.bearer_token(), None);
/// ```
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: Mutex<Option<String>>,
}

impl StaticCredentials {
    /// Holder that starts with `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    /// Holder with no credential
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn invalidate(&self) {
        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
