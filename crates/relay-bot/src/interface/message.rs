//! Inbound events delivered by a transport

use serde::{Deserialize, Serialize};

/// The person talking to the bot and the chat to answer in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: i64,
    pub chat_id: i64,
    pub name: Option<String>,
}

impl Operator {
    /// Operator in a private chat (chat id equals user id)
    pub fn private(id: i64) -> Self {
        Self {
            id,
            chat_id: id,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One photo of a single post or an album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoItem {
    /// Transport reference to the largest rendition
    pub photo_ref: String,
    pub caption: Option<String>,
}

impl PhotoItem {
    pub fn new(photo_ref: impl Into<String>) -> Self {
        Self {
            photo_ref: photo_ref.into(),
            caption: None,
        }
    }

    pub fn captioned(photo_ref: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            photo_ref: photo_ref.into(),
            caption: Some(caption.into()),
        }
    }
}

/// Event received from the messaging transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Incoming {
    /// Plain text (commands included)
    Text { operator: Operator, text: String },

    /// A photo post or a whole album
    Photos {
        operator: Operator,
        album_id: Option<String>,
        items: Vec<PhotoItem>,
    },

    /// Inline keyboard button press
    Button {
        operator: Operator,
        message_id: i64,
        callback_id: String,
        token: String,
    },
}

impl Incoming {
    pub fn operator(&self) -> &Operator {
        match self {
            Incoming::Text { operator, .. }
            | Incoming::Photos { operator, .. }
            | Incoming::Button { operator, .. } => operator,
        }
    }

    pub fn text(operator: Operator, text: impl Into<String>) -> Self {
        Incoming::Text {
            operator,
            text: text.into(),
        }
    }

    pub fn button(
        operator: Operator,
        message_id: i64,
        callback_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Incoming::Button {
            operator,
            message_id,
            callback_id: callback_id.into(),
            token: token.into(),
        }
    }
}
