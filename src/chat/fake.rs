//! In-process fake backend for chat session tests
//!
//! [`FakeChatApi`] keeps per-thread message lists in memory and answers the
//! three [`ChatApi`] calls from them, counting each call. Tests can:
//!
//! - seed threads with [`FakeChatApi::add_thread`]
//! - change server-side history behind the client's back
//! - make any call fail, with or without a backend `message`
//! - stall the next create-or-resume for an item, the next fetch or the next
//!   send, until the returned sender fires
//!
//! A held fetch or send is applied on the server at call time and its
//! snapshot returned after the release, like a slow response would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::api::{ChatApi, ChatThread, Message, UserRef};
use crate::error::{FinditbackError, Result};

#[derive(Debug, Default)]
struct Failures {
    create: Option<Option<String>>,
    fetch: Option<Option<String>>,
    send: Option<Option<String>>,
}

#[derive(Debug, Default)]
struct Backend {
    /// item id -> thread id
    threads_by_item: HashMap<String, String>,
    /// thread id -> messages
    messages: HashMap<String, Vec<Message>>,
    sender: Option<String>,
    failures: Failures,
    create_holds: HashMap<String, oneshot::Receiver<()>>,
    fetch_hold: Option<oneshot::Receiver<()>>,
    send_hold: Option<oneshot::Receiver<()>>,
}

/// Scriptable in-memory [`ChatApi`].
#[derive(Debug, Default)]
pub struct FakeChatApi {
    backend: Mutex<Backend>,
    create_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    send_calls: AtomicUsize,
}

fn failure(message: &Option<String>) -> anyhow::Error {
    FinditbackError::Api {
        status: 400,
        message: message.clone(),
    }
    .into()
}

impl FakeChatApi {
    /// Empty backend with no threads
    pub fn new() -> Self {
        Self::default()
    }

    fn backend(&self) -> std::sync::MutexGuard<'_, Backend> {
        self.backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers `thread_id` as the thread for `item_id`.
    pub fn add_thread(&self, item_id: &str, thread_id: &str, messages: Vec<Message>) {
        let mut backend = self.backend();
        backend
            .threads_by_item
            .insert(item_id.to_string(), thread_id.to_string());
        backend.messages.insert(thread_id.to_string(), messages);
    }

    /// User id recorded as the sender of messages sent through the fake.
    pub fn set_sender(&self, user_id: &str) {
        self.backend().sender = Some(user_id.to_string());
    }

    /// Replaces the server-side history of a thread.
    pub fn set_server_messages(&self, thread_id: &str, messages: Vec<Message>) {
        self.backend()
            .messages
            .insert(thread_id.to_string(), messages);
    }

    /// Appends a message to the server-side history, as another participant would.
    pub fn push_server_message(&self, thread_id: &str, message: Message) {
        self.backend()
            .messages
            .entry(thread_id.to_string())
            .or_default()
            .push(message);
    }

    /// Current server-side history of a thread.
    pub fn server_messages(&self, thread_id: &str) -> Vec<Message> {
        self.backend()
            .messages
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes create-or-resume fail.
    pub fn fail_create_with(&self, message: Option<&str>) {
        self.backend().failures.create = Some(message.map(str::to_string));
    }

    /// Makes fetch fail.
    pub fn fail_fetch_with(&self, message: Option<&str>) {
        self.backend().failures.fetch = Some(message.map(str::to_string));
    }

    /// Makes send fail.
    pub fn fail_send_with(&self, message: Option<&str>) {
        self.backend().failures.send = Some(message.map(str::to_string));
    }

    /// Lets every call succeed again.
    pub fn clear_failures(&self) {
        self.backend().failures = Failures::default();
    }

    /// Stalls the next create-or-resume for `item_id` until the sender fires.
    pub fn hold_create(&self, item_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.backend()
            .create_holds
            .insert(item_id.to_string(), rx);
        tx
    }

    /// Stalls the next fetch until the sender fires.
    pub fn hold_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.backend().fetch_hold = Some(rx);
        tx
    }

    /// Stalls the next send until the sender fires.
    pub fn hold_send(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.backend().send_hold = Some(rx);
        tx
    }

    /// Number of create-or-resume calls received
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of fetch calls received
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of send calls received
    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChatApi for FakeChatApi {
    async fn create_or_resume(&self, item_id: &str) -> Result<ChatThread> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.backend().create_holds.remove(item_id);
        if let Some(hold) = hold {
            let _ = hold.await;
        }

        let backend = self.backend();
        if let Some(message) = &backend.failures.create {
            return Err(failure(message));
        }
        let thread_id = backend
            .threads_by_item
            .get(item_id)
            .cloned()
            .ok_or_else(|| FinditbackError::NotFound(format!("item {}", item_id)))?;
        let messages = backend
            .messages
            .get(&thread_id)
            .cloned()
            .unwrap_or_default();
        Ok(ChatThread {
            id: thread_id,
            messages,
        })
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<Vec<Message>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let (result, hold) = {
            let mut backend = self.backend();
            let result = match &backend.failures.fetch {
                Some(message) => Err(failure(message)),
                None => Ok(backend
                    .messages
                    .get(thread_id)
                    .cloned()
                    .unwrap_or_default()),
            };
            (result, backend.fetch_hold.take())
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        result
    }

    async fn send_message(&self, thread_id: &str, text: &str) -> Result<Vec<Message>> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let (result, hold) = {
            let mut guard = self.backend();
            let backend = &mut *guard;
            let hold = backend.send_hold.take();
            let result = match &backend.failures.send {
                Some(message) => Err(failure(message)),
                None => {
                    let sender = backend.sender.clone().unwrap_or_else(|| "me".to_string());
                    let messages = backend.messages.entry(thread_id.to_string()).or_default();
                    messages.push(Message {
                        id: format!("m{}", messages.len() + 1),
                        sender: UserRef::from_id(sender),
                        text: text.to_string(),
                        timestamp: None,
                    });
                    Ok(messages.clone())
                }
            };
            (result, hold)
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        result
    }
}
