//! Terminal presentation of a conversation
//!
//! Messages are drawn on the left ("theirs") or right ("mine"). When the
//! logged-in user is known the decision compares the sender with that user;
//! otherwise it falls back to comparing the sender with the item's poster,
//! which treats every message from someone other than the poster as mine.

use chrono::{DateTime, Local, Utc};
use colored::Colorize;

use crate::api::{Item, Message, UserRef};
use crate::chat::session::{SessionStatus, SessionView};

/// Which side of the transcript a message belongs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSide {
    /// Sent by the viewer
    Mine,
    /// Sent by the other participant
    Theirs,
}

/// Decides the side of `message` for `viewer` looking at `item`'s thread.
///
/// # Examples
///
/// ```
/// use finditback::api::{Item, Message, UserRef};
/// use finditback::chat::view::{align, MessageSide};
///
/// let item: Item = serde_json::from_value(serde_json::json!({
///     "_id": "42", "title": "Keys", "postedBy": {"_id": "poster"}
/// })).unwrap();
/// let message = Message {
///     id: "m1".into(),
///     sender: UserRef::from_id("poster"),
///     text: "hi".into(),
///     timestamp: None,
/// };
///
/// assert_eq!(align(&message, &item, None), MessageSide::Theirs);
/// assert_eq!(
///     align(&message, &item, Some(&UserRef::from_id("poster"))),
///     MessageSide::Mine
/// );
/// ```
pub fn align(message: &Message, item: &Item, viewer: Option<&UserRef>) -> MessageSide {
    let mine = match viewer {
        Some(viewer) => message.sender.id == viewer.id,
        None => item
            .posted_by
            .as_ref()
            .map_or(true, |poster| message.sender.id != poster.id),
    };
    if mine {
        MessageSide::Mine
    } else {
        MessageSide::Theirs
    }
}

/// Local `HH:MM` for a message timestamp; empty when absent.
pub fn format_time(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}

/// One transcript line for `message`.
pub fn render_line(message: &Message, side: MessageSide) -> String {
    let time = format_time(message.timestamp);
    match side {
        MessageSide::Mine => format!(
            "{:>60} {}",
            message.text.white().on_blue(),
            time.dimmed()
        ),
        MessageSide::Theirs => {
            let name = if message.sender.username.is_empty() {
                message.sender.id.as_str()
            } else {
                message.sender.username.as_str()
            };
            format!("{} {} {}", format!("{}:", name).bold(), message.text, time.dimmed())
        }
    }
}

/// Full transcript of the session, header and error line included.
pub fn render_transcript(view: &SessionView, item: &Item, viewer: Option<&UserRef>) -> String {
    let mut out = format!("{}\n", format!("Chat about {}", item.title).bold());

    match &view.status {
        SessionStatus::Initializing => out.push_str(&format!("{}\n", "Connecting...".dimmed())),
        SessionStatus::Closed => out.push_str(&format!("{}\n", "Chat closed".dimmed())),
        SessionStatus::Active(_) | SessionStatus::Failed(_) => {}
    }

    if let Some(error) = &view.last_error {
        out.push_str(&format!("{}\n", error.red()));
    }

    for message in &view.messages {
        out.push_str(&render_line(message, align(message, item, viewer)));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item_posted_by(poster: Option<&str>) -> Item {
        Item {
            id: "42".to_string(),
            kind: None,
            title: "Umbrella".to_string(),
            description: String::new(),
            location: String::new(),
            category: None,
            posted_by: poster.map(UserRef::from_id),
            image: None,
            created_at: None,
        }
    }

    fn from(sender: &str, text: &str) -> Message {
        Message {
            id: format!("{}-{}", sender, text),
            sender: UserRef::from_id(sender),
            text: text.to_string(),
            timestamp: None,
        }
    }

    #[test]
    fn test_poster_heuristic_without_viewer() {
        let item = item_posted_by(Some("poster"));
        assert_eq!(align(&from("poster", "hi"), &item, None), MessageSide::Theirs);
        assert_eq!(align(&from("visitor", "hi"), &item, None), MessageSide::Mine);
    }

    #[test]
    fn test_viewer_identity_overrides_heuristic() {
        let item = item_posted_by(Some("poster"));
        let poster = UserRef::from_id("poster");
        assert_eq!(
            align(&from("poster", "hi"), &item, Some(&poster)),
            MessageSide::Mine
        );
        assert_eq!(
            align(&from("visitor", "hi"), &item, Some(&poster)),
            MessageSide::Theirs
        );
    }

    #[test]
    fn test_item_without_poster_treats_all_as_mine() {
        let item = item_posted_by(None);
        assert_eq!(align(&from("anyone", "hi"), &item, None), MessageSide::Mine);
    }

    #[test]
    fn test_format_time_empty_when_absent() {
        assert_eq!(format_time(None), "");
    }

    #[test]
    fn test_format_time_is_hours_and_minutes() {
        let t = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        let formatted = format_time(Some(t));
        assert_eq!(formatted.len(), 5);
        assert_eq!(&formatted[2..3], ":");
        assert!(formatted.ends_with("30"));
    }

    #[test]
    fn test_render_transcript_includes_error_and_messages() {
        colored::control::set_override(false);
        let item = item_posted_by(Some("poster"));
        let view = SessionView {
            status: SessionStatus::Active("t1".to_string()),
            messages: vec![from("poster", "still lost?"), from("me", "yes")],
            draft: String::new(),
            last_error: Some("Failed to fetch messages".to_string()),
        };

        let out = render_transcript(&view, &item, None);
        assert!(out.starts_with("Chat about Umbrella"));
        assert!(out.contains("Failed to fetch messages"));
        assert!(out.contains("poster: still lost?"));
        assert!(out.contains("yes"));
    }
}
