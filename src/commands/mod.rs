/*!
Command handlers for the CLI

- `auth`: login, signup and logout
- `items`: browse listings and report an item
- `chat`: interactive conversation about one item

Handlers print user-facing results on stdout and return errors to the
entrypoint, which reports them and sets the exit status.
*/

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::session::SessionStore;

pub mod auth;
pub mod chat;
pub mod items;

/// Session store and a client that authenticates through it.
pub(crate) fn authenticated_client(config: &Config) -> Result<(Arc<SessionStore>, ApiClient)> {
    let store = Arc::new(SessionStore::new(&config.session));
    let client = ApiClient::new(&config.api, store.clone())?;
    Ok((store, client))
}

/// Print a failure the way the app phrases it and hand the error back.
pub(crate) fn report_failure(err: anyhow::Error, fallback: &str) -> anyhow::Error {
    use colored::Colorize;

    eprintln!("{}", crate::error::user_message(&err, fallback).red());
    err
}
