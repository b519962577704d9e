//! Account commands: login, signup and logout.

use std::sync::Arc;

use rustyline::DefaultEditor;

use crate::api::{ApiClient, StaticCredentials};
use crate::commands::{authenticated_client, report_failure};
use crate::config::Config;
use crate::error::{FinditbackError, Result};
use crate::session::{AuthSession, SessionStore};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

/// Log in and store the issued token in the OS keyring.
///
/// The request is sent without any previously stored credential.
///
/// # Arguments
///
/// * `config` - Global configuration
/// * `username` - Account username
/// * `password` - Password; prompted for when `None`
pub async fn login(config: &Config, username: &str, password: Option<String>) -> Result<()> {
    let password = resolve_password(password)?;
    let client = ApiClient::new(&config.api, Arc::new(StaticCredentials::anonymous()))?;

    let response = client
        .login(username, &password)
        .await
        .map_err(|e| report_failure(e, LOGIN_FAILED))?;

    let store = SessionStore::new(&config.session);
    store.save(&AuthSession {
        token: response.access_token,
        user: response.user,
    })?;

    tracing::info!(username = %username, "Session stored");
    println!("Logged in as {}", username);
    Ok(())
}

/// Create a new account. Does not log in.
pub async fn signup(
    config: &Config,
    username: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = resolve_password(password)?;
    let client = ApiClient::new(&config.api, Arc::new(StaticCredentials::anonymous()))?;

    client
        .register(username, email, &password)
        .await
        .map_err(|e| report_failure(e, REGISTRATION_FAILED))?;

    println!("Account created. Log in with `finditback login -u {}`", username);
    Ok(())
}

/// End the backend session and forget the stored token.
///
/// The local session is cleared even when the backend call fails.
pub async fn logout(config: &Config) -> Result<()> {
    let (store, client) = authenticated_client(config)?;

    if let Err(e) = client.logout().await {
        tracing::warn!("Backend logout failed: {}", e);
    }
    store.clear()?;

    println!("Logged out");
    Ok(())
}

fn resolve_password(password: Option<String>) -> Result<String> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };
    if password.is_empty() {
        return Err(FinditbackError::InvalidInput("password must not be empty".to_string()).into());
    }
    Ok(password)
}

fn prompt_password() -> Result<String> {
    let mut rl = DefaultEditor::new()?;
    Ok(rl.readline("Password: ")?)
}
