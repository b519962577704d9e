//! Interactive chat about one item.
//!
//! Opens a [`ChatSession`] for the item and runs until the user quits.
//! Input is read by rustyline on a dedicated thread and forwarded over a
//! channel so the transcript keeps updating while the prompt waits.

use std::sync::Arc;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;

use crate::api::{ApiClient, CredentialProvider, Item, ItemKind, UserRef};
use crate::chat::view::{align, render_line, render_transcript};
use crate::chat::{ChatSession, OpenOutcome, RefreshOutcome, SendOutcome, SessionStatus, SessionView};
use crate::commands::{authenticated_client, report_failure};
use crate::config::Config;
use crate::error::{FinditbackError, Result};

const FETCH_ITEMS_FAILED: &str = "Failed to fetch items";

/// A line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Text to send
    Message(String),
    /// `/quit` or `/exit`
    Quit,
    /// `/retry`: open again after a failure
    Retry,
    /// `/resend`: send the draft kept after a failed send
    Resend,
    /// `/refresh`: fetch now instead of waiting for the next poll
    Refresh,
    /// `/show`: print the whole conversation again
    Show,
    /// `/help`
    Help,
    /// Unrecognised slash command
    Unknown(String),
    /// Blank line
    Empty,
}

/// Classify one line of input.
pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatInput::Empty;
    }
    match trimmed {
        "/quit" | "/exit" => ChatInput::Quit,
        "/retry" => ChatInput::Retry,
        "/resend" => ChatInput::Resend,
        "/refresh" => ChatInput::Refresh,
        "/show" => ChatInput::Show,
        "/help" => ChatInput::Help,
        other if other.starts_with("//") => ChatInput::Message(other[1..].to_string()),
        other if other.starts_with('/') => ChatInput::Unknown(other.to_string()),
        _ => ChatInput::Message(trimmed.to_string()),
    }
}

/// Incremental transcript output.
///
/// Snapshots replace the conversation wholesale, so each update is compared
/// with what is already on screen: when the screen is a prefix of the new
/// snapshot only the new messages are printed, otherwise the whole
/// conversation is printed again. An emptied snapshot prints nothing.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    shown: Vec<String>,
    status: Option<SessionStatus>,
    error: Option<String>,
}

impl TranscriptPrinter {
    /// Text to print for `view`; empty when nothing visible changed.
    pub fn update(&mut self, view: &SessionView, item: &Item, viewer: Option<&UserRef>) -> String {
        let mut out = String::new();

        if self.status.as_ref() != Some(&view.status) {
            match &view.status {
                SessionStatus::Initializing => {
                    out.push_str(&format!("{}\n", "Connecting...".dimmed()));
                }
                SessionStatus::Active(_) => {
                    out.push_str(&format!(
                        "{}\n",
                        "Connected. Type a message, /help for commands.".dimmed()
                    ));
                }
                SessionStatus::Failed(_) => {
                    out.push_str(&format!("{}\n", "Type /retry to try again.".dimmed()));
                }
                SessionStatus::Closed => {
                    out.push_str(&format!("{}\n", "Chat closed".dimmed()));
                }
            }
            self.status = Some(view.status.clone());
        }

        if view.last_error != self.error {
            if let Some(error) = &view.last_error {
                out.push_str(&format!("{}\n", error.red()));
            }
            self.error = view.last_error.clone();
        }

        let is_prefix = self.shown.len() <= view.messages.len()
            && self
                .shown
                .iter()
                .zip(&view.messages)
                .all(|(shown, message)| *shown == message.id);
        let start = if is_prefix || view.messages.is_empty() {
            self.shown.len().min(view.messages.len())
        } else {
            out.push_str(&format!("{}\n", "--- conversation updated ---".dimmed()));
            0
        };

        for message in &view.messages[start..] {
            out.push_str(&render_line(message, align(message, item, viewer)));
            out.push('\n');
        }
        self.shown = view.messages.iter().map(|m| m.id.clone()).collect();

        out
    }
}

/// Start an interactive chat about `item_id`.
///
/// # Arguments
///
/// * `config` - Global configuration
/// * `item_id` - Identifier of the listing
/// * `kind` - Listing to look the item up in; both when `None`
///
/// # Errors
///
/// Returns an error when nobody is logged in, the item cannot be found, or
/// the terminal cannot be read.
pub async fn run_chat(config: &Config, item_id: &str, kind: Option<ItemKind>) -> Result<()> {
    let (store, client) = authenticated_client(config)?;
    if store.bearer_token().is_none() {
        return Err(FinditbackError::Authentication(Some(
            "not logged in, run `finditback login` first".to_string(),
        ))
        .into());
    }

    let item = find_item(&client, item_id, kind).await?;
    let viewer = store.current_user();
    let session = ChatSession::new(Arc::new(client), config.chat.poll_interval());
    let mut changes = session.subscribe();
    let mut printer = TranscriptPrinter::default();

    println!(
        "{}",
        format!("Chat about {} ({})", item.title, item.location).bold()
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || read_input(tx));

    open_and_report(&session, &item).await;
    print!("{}", printer.update(&session.view(), &item, viewer.as_ref()));

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                print!("{}", printer.update(&session.view(), &item, viewer.as_ref()));
            }
            input = rx.recv() => {
                let Some(line) = input else {
                    break;
                };
                match parse_input(&line) {
                    ChatInput::Quit => break,
                    ChatInput::Empty => {}
                    ChatInput::Help => print_help(),
                    ChatInput::Show => {
                        print!("{}", render_transcript(&session.view(), &item, viewer.as_ref()));
                    }
                    ChatInput::Retry => {
                        if matches!(session.status(), SessionStatus::Failed(_)) {
                            open_and_report(&session, &item).await;
                        } else {
                            println!("Nothing to retry");
                        }
                    }
                    ChatInput::Refresh => {
                        if session.refresh().await == RefreshOutcome::NotActive {
                            println!("Chat is not connected");
                        }
                    }
                    ChatInput::Message(text) => {
                        let outcome = session.send_text(&text).await;
                        report_send(&outcome);
                    }
                    ChatInput::Resend => {
                        let outcome = session.send().await;
                        if outcome == SendOutcome::Empty {
                            println!("Nothing to resend");
                        }
                        report_send(&outcome);
                    }
                    ChatInput::Unknown(command) => {
                        println!("Unknown command {}, try /help", command);
                    }
                }
                print!("{}", printer.update(&session.view(), &item, viewer.as_ref()));
            }
        }
    }

    session.close();
    print!("{}", printer.update(&session.view(), &item, viewer.as_ref()));
    Ok(())
}

fn report_send(outcome: &SendOutcome) {
    match outcome {
        SendOutcome::NotActive => println!("Chat is not connected"),
        SendOutcome::Failed(_) => println!("{}", "Message kept, type /resend to retry".dimmed()),
        SendOutcome::Sent | SendOutcome::Empty | SendOutcome::Stale => {}
    }
}

async fn open_and_report(session: &ChatSession, item: &Item) {
    match session.open(item).await {
        OpenOutcome::Opened(thread_id) => tracing::debug!(thread_id = %thread_id, "Chat opened"),
        OpenOutcome::Failed(message) => tracing::debug!(error = %message, "Chat open failed"),
        OpenOutcome::InvalidItem => println!("This item cannot be chatted about"),
        OpenOutcome::AlreadyOpen | OpenOutcome::Superseded => {}
    }
}

/// Look `item_id` up in one listing, or in both when `kind` is `None`.
async fn find_item(client: &ApiClient, item_id: &str, kind: Option<ItemKind>) -> Result<Item> {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => vec![ItemKind::Lost, ItemKind::Found],
    };

    for kind in kinds {
        let items = client
            .list_items(kind)
            .await
            .map_err(|e| report_failure(e, FETCH_ITEMS_FAILED))?;
        if let Some(item) = items.into_iter().find(|item| item.id == item_id) {
            return Ok(item);
        }
    }

    Err(FinditbackError::NotFound(format!("item {}", item_id)).into())
}

/// Forward lines until EOF, interrupt, quit or a closed channel.
fn read_input(tx: mpsc::UnboundedSender<String>) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            tracing::error!("Cannot read from terminal: {}", e);
            return;
        }
    };

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let quit = parse_input(&line) == ChatInput::Quit;
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.trim());
                }
                if tx.send(line).is_err() || quit {
                    return;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return,
            Err(e) => {
                tracing::error!("Input error: {}", e);
                return;
            }
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /refresh  fetch new messages now");
    println!("  /retry    reconnect after a failure");
    println!("  /resend   send the last failed message again");
    println!("  /show     print the whole conversation");
    println!("  /quit     close the chat");
    println!("  //text    send a message starting with /");
}
