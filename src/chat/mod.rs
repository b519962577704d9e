//! Item-scoped conversations
//!
//! [`session::ChatSession`] keeps one conversation thread synchronized with
//! the backend; [`view`] turns its state into terminal output.

pub mod session;
pub mod view;

#[cfg(test)]
pub mod fake;

pub use session::{
    ChatSession, OpenOutcome, RefreshOutcome, SendOutcome, SessionStatus, SessionView,
};
