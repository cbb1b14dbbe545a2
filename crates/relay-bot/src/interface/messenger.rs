//! Outbound messaging seam
//!
//! The conversation core only talks to the transport through [`Messenger`],
//! so flows can be exercised without a live bot.

use crate::error::Result;
use crate::interface::InlineKeyboard;
use async_trait::async_trait;

/// Outbound half of a messaging transport. Texts are sent as HTML.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message, returning its message id
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<i64>;

    /// Replace the text (and keyboard) of an earlier bot message
    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()>;

    /// Send photos as one album; `caption` goes on the first item only
    async fn send_media_group(
        &self,
        chat_id: i64,
        media: &[String],
        caption: Option<&str>,
    ) -> Result<()>;

    /// Acknowledge a button press, optionally with a short notice
    async fn answer_callback(&self, callback_id: &str, notice: Option<&str>) -> Result<()>;
}
