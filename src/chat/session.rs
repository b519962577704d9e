//! Chat session controller
//!
//! A [`ChatSession`] owns the visible lifecycle of one conversation thread
//! tied to one item listing:
//!
//! ```text
//! Closed --open--> Initializing --ok--> Active(thread) --close--> Closed
//!                        |
//!                        +--err--> Failed(error) --open--> Initializing
//! ```
//!
//! While `Active`, a background task refreshes the thread immediately and
//! then once per poll interval. Every fetch or send response replaces the
//! local message list wholesale with the server's snapshot.
//!
//! # Stale responses
//!
//! Each open and each close bumps a generation counter. A completion only
//! applies its result when the generation it was issued under is still
//! current and the session is still showing the same thread; anything else
//! is dropped silently.
//!
//! # Concurrency
//!
//! State lives behind a mutex that is never held across an `.await`, so
//! completions are applied one at a time. Between a refresh and a send that
//! are both in flight, whichever response resolves last wins.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ChatApi, Item, Message};
use crate::error::user_message;

const INIT_FAILED: &str = "Failed to initialize chat";
const FETCH_FAILED: &str = "Failed to fetch messages";
const SEND_FAILED: &str = "Failed to send message";

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No conversation open
    Closed,
    /// Create-or-resume request in flight
    Initializing,
    /// Synchronized with the given thread
    Active(String),
    /// Create-or-resume failed with the given message
    Failed(String),
}

/// Result of [`ChatSession::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The thread is now active
    Opened(String),
    /// The session was already initializing or active for this item
    AlreadyOpen,
    /// Create-or-resume failed; the session is `Failed`
    Failed(String),
    /// The session was closed or reopened before the response arrived
    Superseded,
    /// The item has no identifier; nothing was sent
    InvalidItem,
}

/// Result of [`ChatSession::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Local messages replaced with a snapshot of this length
    Refreshed(usize),
    /// Fetch failed; the message is stored as the last error
    Failed(String),
    /// No active thread to refresh
    NotActive,
    /// The session moved on before the response arrived
    Stale,
}

/// Result of [`ChatSession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Sent; local messages replaced with the returned snapshot
    Sent,
    /// Send failed; the draft is kept for retry
    Failed(String),
    /// Draft is empty after trimming; nothing was sent
    Empty,
    /// No active thread to send to
    NotActive,
    /// The session moved on before the response arrived
    Stale,
}

/// Everything a view needs to draw the session, read under one lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Lifecycle state
    pub status: SessionStatus,
    /// Last applied snapshot
    pub messages: Vec<Message>,
    /// Unsent text
    pub draft: String,
    /// Last failure, cleared by the next success
    pub last_error: Option<String>,
}

struct Poller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

struct State {
    status: SessionStatus,
    item_id: Option<String>,
    generation: u64,
    messages: Vec<Message>,
    draft: String,
    last_error: Option<String>,
    poller: Option<Poller>,
}

impl State {
    fn is_current(&self, generation: u64, thread_id: &str) -> bool {
        self.generation == generation
            && matches!(&self.status, SessionStatus::Active(t) if t == thread_id)
    }

    fn active_thread(&self) -> Option<&str> {
        match &self.status {
            SessionStatus::Active(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Stops polling and forgets the thread. Bumps the generation so any
    /// in-flight completion is discarded.
    fn reset(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.generation += 1;
        self.status = SessionStatus::Closed;
        self.item_id = None;
        self.messages.clear();
        self.draft.clear();
        self.last_error = None;
    }
}

struct Shared {
    api: Arc<dyn ChatApi>,
    poll_interval: Duration,
    state: Mutex<State>,
    changes: watch::Sender<u64>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(poller) = state.poller.take() {
            poller.stop();
        }
    }
}

/// Controller for one conversation thread.
///
/// Cloning yields another handle to the same session.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use finditback::api::{ApiClient, StaticCredentials};
/// use finditback::chat::{ChatSession, OpenOutcome};
/// use finditback::config::ApiConfig;
///
/// # async fn example(item: finditback::api::Item) -> anyhow::Result<()> {
/// let api = ApiClient::new(&ApiConfig::default(), Arc::new(StaticCredentials::new("tok")))?;
/// let session = ChatSession::new(Arc::new(api), Duration::from_secs(5));
///
/// if let OpenOutcome::Opened(thread) = session.open(&item).await {
///     println!("chatting in {}", thread);
///     session.set_draft("Is this still available?");
///     session.send().await;
/// }
/// session.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<Shared>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("status", &self.status())
            .field("poll_interval", &self.inner.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Creates a closed session.
    ///
    /// # Arguments
    ///
    /// * `api` - Backend the session talks to
    /// * `poll_interval` - Delay between background refreshes while active
    pub fn new(api: Arc<dyn ChatApi>, poll_interval: Duration) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Shared {
                api,
                poll_interval,
                state: Mutex::new(State {
                    status: SessionStatus::Closed,
                    item_id: None,
                    generation: 0,
                    messages: Vec::new(),
                    draft: String::new(),
                    last_error: None,
                    poller: None,
                }),
                changes,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|version| *version += 1);
    }

    /// Receiver that ticks whenever visible session state changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    /// Opens the conversation about `item`.
    ///
    /// Issues one create-or-resume request. Calling this again for the same
    /// item while initializing or active is a no-op; opening a different
    /// item closes the current conversation first.
    pub async fn open(&self, item: &Item) -> OpenOutcome {
        if item.id.trim().is_empty() {
            warn!("Refusing to open chat for an item without an identifier");
            return OpenOutcome::InvalidItem;
        }

        let generation = {
            let mut state = self.lock();
            let busy = matches!(
                state.status,
                SessionStatus::Initializing | SessionStatus::Active(_)
            );
            if busy && state.item_id.as_deref() == Some(item.id.as_str()) {
                debug!(item_id = %item.id, "Chat already open");
                return OpenOutcome::AlreadyOpen;
            }
            if busy {
                info!(item_id = %item.id, "Switching chat to another item");
                state.reset();
            }

            state.generation += 1;
            state.status = SessionStatus::Initializing;
            state.item_id = Some(item.id.clone());
            state.messages.clear();
            state.last_error = None;
            state.generation
        };
        self.notify();

        let result = self.inner.api.create_or_resume(&item.id).await;

        let outcome = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!(item_id = %item.id, "Discarding stale create-or-resume response");
                return OpenOutcome::Superseded;
            }

            match result {
                Ok(thread) => {
                    info!(
                        item_id = %item.id,
                        thread_id = %thread.id,
                        messages = thread.messages.len(),
                        "Chat session active"
                    );
                    state.status = SessionStatus::Active(thread.id.clone());
                    state.messages = thread.messages;
                    state.last_error = None;
                    let poller = self.spawn_poller(generation);
                    state.poller = Some(poller);
                    OpenOutcome::Opened(thread.id)
                }
                Err(e) => {
                    let message = user_message(&e, INIT_FAILED);
                    warn!(item_id = %item.id, error = %e, "Chat initialization failed");
                    state.status = SessionStatus::Failed(message.clone());
                    state.last_error = Some(message.clone());
                    OpenOutcome::Failed(message)
                }
            }
        };
        self.notify();
        outcome
    }

    fn spawn_poller(&self, generation: u64) -> Poller {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::downgrade(&self.inner),
            generation,
            self.inner.poll_interval,
            cancel.clone(),
        ));
        Poller { cancel, handle }
    }

    /// Replaces local messages with the server's current snapshot.
    ///
    /// Failures are recorded as the last error and never leave `Active`.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (generation, thread_id) = {
            let state = self.lock();
            match state.active_thread() {
                Some(thread) => (state.generation, thread.to_string()),
                None => return RefreshOutcome::NotActive,
            }
        };
        self.refresh_thread(generation, thread_id).await
    }

    /// Refresh issued by the poller that opened under `generation`.
    async fn refresh_generation(&self, generation: u64) -> RefreshOutcome {
        let thread_id = {
            let state = self.lock();
            match state.active_thread() {
                Some(thread) if state.generation == generation => thread.to_string(),
                _ => return RefreshOutcome::Stale,
            }
        };
        self.refresh_thread(generation, thread_id).await
    }

    async fn refresh_thread(&self, generation: u64, thread_id: String) -> RefreshOutcome {
        let result = self.inner.api.fetch_thread(&thread_id).await;

        let outcome = {
            let mut state = self.lock();
            if !state.is_current(generation, &thread_id) {
                debug!(thread_id = %thread_id, "Discarding stale fetch response");
                return RefreshOutcome::Stale;
            }

            match result {
                Ok(messages) => {
                    debug!(thread_id = %thread_id, messages = messages.len(), "Refreshed thread");
                    let count = messages.len();
                    state.messages = messages;
                    state.last_error = None;
                    RefreshOutcome::Refreshed(count)
                }
                Err(e) => {
                    let message = user_message(&e, FETCH_FAILED);
                    warn!(thread_id = %thread_id, error = %e, "Refresh failed");
                    state.last_error = Some(message.clone());
                    RefreshOutcome::Failed(message)
                }
            }
        };
        self.notify();
        outcome
    }

    /// Replaces the unsent draft text.
    pub fn set_draft(&self, text: &str) {
        {
            let mut state = self.lock();
            state.draft = text.to_string();
        }
        self.notify();
    }

    /// Sends the trimmed draft.
    ///
    /// On success the draft and last error are cleared and local messages
    /// become the snapshot the send returned. On failure the draft is kept.
    pub async fn send(&self) -> SendOutcome {
        let (generation, thread_id, text) = {
            let state = self.lock();
            let Some(thread) = state.active_thread() else {
                return SendOutcome::NotActive;
            };
            let text = state.draft.trim();
            if text.is_empty() {
                return SendOutcome::Empty;
            }
            (state.generation, thread.to_string(), text.to_string())
        };

        let result = self.inner.api.send_message(&thread_id, &text).await;

        let outcome = {
            let mut state = self.lock();
            if !state.is_current(generation, &thread_id) {
                debug!(thread_id = %thread_id, "Discarding stale send response");
                return SendOutcome::Stale;
            }

            match result {
                Ok(messages) => {
                    debug!(thread_id = %thread_id, messages = messages.len(), "Message sent");
                    state.messages = messages;
                    state.draft.clear();
                    state.last_error = None;
                    SendOutcome::Sent
                }
                Err(e) => {
                    let message = user_message(&e, SEND_FAILED);
                    warn!(thread_id = %thread_id, error = %e, "Send failed");
                    state.last_error = Some(message.clone());
                    SendOutcome::Failed(message)
                }
            }
        };
        self.notify();
        outcome
    }

    /// Stores `text` as the draft and sends it.
    pub async fn send_text(&self, text: &str) -> SendOutcome {
        self.set_draft(text);
        self.send().await
    }

    /// Stops polling and discards all thread state.
    ///
    /// Safe to call in any state. No response issued before this call can
    /// change the session afterwards.
    pub fn close(&self) {
        {
            let mut state = self.lock();
            if state.status != SessionStatus::Closed {
                info!(item_id = ?state.item_id, "Closing chat session");
            }
            state.reset();
        }
        self.notify();
    }

    /// Current lifecycle state
    pub fn status(&self) -> SessionStatus {
        self.lock().status.clone()
    }

    /// Identifier of the active thread
    pub fn thread_id(&self) -> Option<String> {
        self.lock().active_thread().map(str::to_string)
    }

    /// Item the session was opened for
    pub fn item_id(&self) -> Option<String> {
        self.lock().item_id.clone()
    }

    /// Last applied message snapshot
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Unsent text
    pub fn draft(&self) -> String {
        self.lock().draft.clone()
    }

    /// Last failure message, if the most recent operation failed
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Consistent copy of everything needed to render the session
    pub fn view(&self) -> SessionView {
        let state = self.lock();
        SessionView {
            status: state.status.clone(),
            messages: state.messages.clone(),
            draft: state.draft.clone(),
            last_error: state.last_error.clone(),
        }
    }
}

/// Background refresh loop for one generation of a session.
///
/// The first tick fires immediately. The loop ends when cancelled, when the
/// session is dropped, or when the session has moved past `generation`.
async fn poll_loop(
    session: Weak<Shared>,
    generation: u64,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = session.upgrade() else {
            break;
        };
        let session = ChatSession { inner };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = session.refresh_generation(generation) => outcome,
        };
        if outcome == RefreshOutcome::Stale {
            break;
        }
    }

    debug!(generation, "Poller stopped");
}
