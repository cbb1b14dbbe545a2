//! Recording transport used by unit tests

use crate::error::{RelayError, Result};
use crate::interface::{InlineKeyboard, Messenger};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct SentText {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditedText {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentAlbum {
    pub chat_id: i64,
    pub media: Vec<String>,
    pub caption: Option<String>,
}

/// A text either sent as a new message or edited into an existing one
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Sent(SentText),
    Edited(EditedText),
}

impl Output {
    pub fn text(&self) -> &str {
        match self {
            Output::Sent(t) => &t.text,
            Output::Edited(e) => &e.text,
        }
    }

    pub fn keyboard(&self) -> Option<&InlineKeyboard> {
        match self {
            Output::Sent(t) => t.keyboard.as_ref(),
            Output::Edited(e) => e.keyboard.as_ref(),
        }
    }
}

#[derive(Default)]
struct Log {
    outputs: Vec<Output>,
    albums: Vec<SentAlbum>,
    callbacks: Vec<(String, Option<String>)>,
    next_message_id: i64,
}

#[derive(Default)]
pub struct RecordingMessenger {
    log: Mutex<Log>,
    failing_chats: HashSet<i64>,
    failing_prefixes: Vec<String>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make album delivery to `chat_id` fail
    pub fn failing_chat(mut self, chat_id: i64) -> Self {
        self.failing_chats.insert(chat_id);
        self
    }

    /// Make sending any text that starts with `prefix` fail
    pub fn failing_texts(mut self, prefix: &str) -> Self {
        self.failing_prefixes.push(prefix.to_string());
        self
    }

    /// Every text output in order
    pub fn outputs(&self) -> Vec<Output> {
        self.log.lock().unwrap().outputs.clone()
    }

    pub fn texts(&self) -> Vec<SentText> {
        self.outputs()
            .into_iter()
            .filter_map(|o| match o {
                Output::Sent(t) => Some(t),
                Output::Edited(_) => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<EditedText> {
        self.outputs()
            .into_iter()
            .filter_map(|o| match o {
                Output::Edited(e) => Some(e),
                Output::Sent(_) => None,
            })
            .collect()
    }

    pub fn albums(&self) -> Vec<SentAlbum> {
        self.log.lock().unwrap().albums.clone()
    }

    pub fn callbacks(&self) -> Vec<(String, Option<String>)> {
        self.log.lock().unwrap().callbacks.clone()
    }

    /// Text of the last message sent or edited
    pub fn last_text(&self) -> Option<String> {
        self.log
            .lock()
            .unwrap()
            .outputs
            .last()
            .map(|o| o.text().to_string())
    }

    /// Keyboard of the last message sent or edited
    pub fn last_keyboard(&self) -> Option<InlineKeyboard> {
        self.log
            .lock()
            .unwrap()
            .outputs
            .last()
            .and_then(|o| o.keyboard().cloned())
    }

    /// Id of the most recently sent message
    pub fn last_message_id(&self) -> i64 {
        self.log.lock().unwrap().next_message_id
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<i64> {
        if self.failing_prefixes.iter().any(|p| text.starts_with(p.as_str())) {
            return Err(RelayError::Telegram("Bad Request: message is too long".to_string()));
        }
        let mut log = self.log.lock().unwrap();
        log.next_message_id += 1;
        let message_id = log.next_message_id;
        log.outputs.push(Output::Sent(SentText {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        }));
        Ok(message_id)
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .outputs
            .push(Output::Edited(EditedText {
                chat_id,
                message_id,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            }));
        Ok(())
    }

    async fn send_media_group(
        &self,
        chat_id: i64,
        media: &[String],
        caption: Option<&str>,
    ) -> Result<()> {
        if self.failing_chats.contains(&chat_id) {
            return Err(RelayError::Telegram("Bad Request: chat not found".to_string()));
        }
        self.log.lock().unwrap().albums.push(SentAlbum {
            chat_id,
            media: media.to_vec(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, notice: Option<&str>) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .callbacks
            .push((callback_id.to_string(), notice.map(str::to_string)));
        Ok(())
    }
}
