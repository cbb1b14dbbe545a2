//! Transport-facing interfaces
//!
//! Platform-agnostic event types, the outbound [`Messenger`] seam, inline
//! keyboards and per-operator conversation sessions.

pub mod keyboard;
pub mod message;
pub mod messenger;
pub mod session;

pub use keyboard::{InlineButton, InlineKeyboard};
pub use message::{Incoming, Operator, PhotoItem};
pub use messenger::Messenger;
pub use session::{
    ConversationSession, ConversationState, InMemoryStorage, LineAction, SessionManager,
    SessionStorage, StateKind,
};
