//! Messaging platforms
//!
//! Each platform turns its native updates into [`Incoming`](crate::interface::Incoming)
//! events and implements [`Messenger`](crate::interface::Messenger) for replies.

pub mod telegram;

pub use telegram::{TelegramApi, TelegramConfig};
