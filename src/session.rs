//! Login session persistence via OS keyring
//!
//! The bearer token issued at login is stored, together with the user it
//! belongs to when the backend reports it, in the operating system's native
//! credential store (Keychain on macOS, Secret Service on Linux, Windows
//! Credential Manager on Windows). [`SessionStore`] also acts as the
//! [`CredentialProvider`] handed to the API client.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::api::{CredentialProvider, UserRef};
use crate::config::SessionConfig;
use crate::error::{FinditbackError, Result};

/// A persisted login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token issued by the backend
    pub token: String,

    /// The authenticated user, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
}

#[derive(Debug)]
enum Cached {
    Unloaded,
    Loaded(Option<AuthSession>),
}

/// Keyring-backed session storage.
///
/// The stored session is loaded lazily on first use and cached in memory.
pub struct SessionStore {
    service: String,
    account: String,
    cache: Mutex<Cached>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("service", &self.service)
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Store addressing the keyring entry named in `config`
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            service: config.keyring_service.clone(),
            account: config.account.clone(),
            cache: Mutex::new(Cached::Unloaded),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, &self.account).map_err(FinditbackError::Keyring)?)
    }

    fn set_cache(&self, value: Option<AuthSession>) {
        *self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Cached::Loaded(value);
    }

    /// Persists `session`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`FinditbackError::Keyring`] if the OS credential store
    /// rejects the write.
    pub fn save(&self, session: &AuthSession) -> Result<()> {
        let json = serde_json::to_string(session).map_err(FinditbackError::Serialization)?;
        self.entry()?
            .set_password(&json)
            .map_err(FinditbackError::Keyring)?;
        self.set_cache(Some(session.clone()));
        Ok(())
    }

    /// Loads the stored session, or `None` when nobody is logged in.
    ///
    /// # Errors
    ///
    /// Returns [`FinditbackError::Keyring`] on unexpected keyring errors and
    /// [`FinditbackError::Session`] if the stored value is malformed.
    pub fn load(&self) -> Result<Option<AuthSession>> {
        {
            let cache = self
                .cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Cached::Loaded(session) = &*cache {
                return Ok(session.clone());
            }
        }

        let session = match self.entry()?.get_password() {
            Ok(json) => Some(serde_json::from_str::<AuthSession>(&json).map_err(|e| {
                FinditbackError::Session(format!("stored session is malformed: {}", e))
            })?),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => return Err(FinditbackError::Keyring(e).into()),
        };

        self.set_cache(session.clone());
        Ok(session)
    }

    /// Removes the stored session. A no-op when none exists.
    pub fn clear(&self) -> Result<()> {
        self.set_cache(None);
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(FinditbackError::Keyring(e).into()),
        }
    }

    /// The logged-in user, when the backend reported one at login
    pub fn current_user(&self) -> Option<UserRef> {
        self.load().ok().flatten().and_then(|s| s.user)
    }
}

impl CredentialProvider for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        match self.load() {
            Ok(session) => session.map(|s| s.token),
            Err(e) => {
                tracing::warn!("Could not read stored session: {}", e);
                None
            }
        }
    }

    fn invalidate(&self) {
        if let Err(e) = self.clear() {
            tracing::warn!("Could not clear stored session: {}", e);
        }
    }
}
