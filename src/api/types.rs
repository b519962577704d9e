//! Wire types exchanged with the FinditBack backend
//!
//! Field names follow the backend's JSON (`_id`, `postedBy`, `createdAt`,
//! `accessToken`). Every successful body except login is wrapped in a
//! `{ "data": ... }` envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reference to a user: identity plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Backend user identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub username: String,
}

impl UserRef {
    /// Reference carrying only an identifier
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: String::new(),
        }
    }
}

/// The backend may return a sender either populated (`{_id, username}`) or
/// as a bare identifier string.
fn user_ref_or_id<'de, D>(deserializer: D) -> std::result::Result<UserRef, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Populated(UserRef),
        Id(String),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Populated(user) => user,
        Repr::Id(id) => UserRef::from_id(id),
    })
}

/// One chat message inside a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Backend message identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Author of the message
    #[serde(deserialize_with = "user_ref_or_id")]
    pub sender: UserRef,
    /// Message body
    pub text: String,
    /// Creation time, used for display only
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Whether a listing describes a lost or a found item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Someone lost the item
    Lost,
    /// Someone found the item
    Found,
}

impl ItemKind {
    /// Value used in query strings and request bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }

    /// Label for the person who posted a listing of this kind
    pub fn poster_label(&self) -> &'static str {
        match self {
            Self::Lost => "Owner",
            Self::Found => "Finder",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Lost => "Lost",
            Self::Found => "Found",
        })
    }
}

/// Image attached to a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Public URL of the image
    pub url: String,
}

/// A lost or found listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Backend item identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Listing type, when the backend includes it
    #[serde(rename = "type", default)]
    pub kind: Option<ItemKind>,
    /// Short title
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Where the item was lost or found
    #[serde(default)]
    pub location: String,
    /// Item category
    #[serde(default)]
    pub category: Option<String>,
    /// User who posted the listing
    #[serde(rename = "postedBy", default)]
    pub posted_by: Option<UserRef>,
    /// Attached photo
    #[serde(default)]
    pub image: Option<ImageRef>,
    /// When the listing was created
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A conversation thread as returned by create-or-resume.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatThread {
    /// Backend thread identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Initial message snapshot
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Full message snapshot returned by fetch and send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageSnapshot {
    /// Ordered messages
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// `{ "data": ... }` response envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Wrapped payload
    pub data: T,
}

/// Error body returned by the backend on failure
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable failure description
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body for `POST /chat/create`
#[derive(Debug, Serialize)]
pub struct CreateChatRequest<'a> {
    /// Item the conversation is about
    #[serde(rename = "itemId")]
    pub item_id: &'a str,
}

/// Request body for `POST /chat/{id}/message`
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    /// Message text
    pub text: &'a str,
}

/// Request body for `POST /auth/login`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    /// Account username
    pub username: &'a str,
    /// Account password
    pub password: &'a str,
}

/// Response body of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    #[serde(rename = "accessToken")]
    pub access_token: String,
    /// The authenticated user, when the backend includes it
    #[serde(default)]
    pub user: Option<UserRef>,
}

/// Request body for `POST /auth/register`
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    /// Desired username
    pub username: &'a str,
    /// Contact email
    pub email: &'a str,
    /// Account password
    pub password: &'a str,
}

/// A new lost or found report.
#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
    /// Listing type
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Where the item was lost or found
    pub location: String,
    /// Identifier of a previously uploaded image
    #[serde(rename = "imageId")]
    pub image_id: Option<String>,
    /// Item category
    pub category: String,
}

/// Response payload of `POST /image/upload`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    /// Identifier to reference in [`NewItem::image_id`]
    #[serde(rename = "_id")]
    pub id: String,
    /// Public URL, when returned
    #[serde(default)]
    pub url: Option<String>,
}
