//! Inline keyboards attached to bot messages
//!
//! Serializes directly into the Bot API `reply_markup` shape.

use serde::{Deserialize, Serialize};

const MAX_LABEL_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    /// Create a button; long labels are shortened and blank ones get a placeholder
    pub fn new(label: impl AsRef<str>, token: impl Into<String>) -> Self {
        let label = label.as_ref().trim();
        let text = if label.is_empty() {
            "⏎".to_string()
        } else if label.chars().count() > MAX_LABEL_CHARS {
            let mut short: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
            short.push('…');
            short
        } else {
            label.to_string()
        };

        Self {
            text,
            callback_data: token.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// Lay buttons out `per_row` to a row
    pub fn grid(buttons: Vec<InlineButton>, per_row: usize) -> Self {
        let per_row = per_row.max(1);
        let mut rows = Vec::with_capacity(buttons.len().div_ceil(per_row));
        let mut row = Vec::with_capacity(per_row);

        for button in buttons {
            row.push(button);
            if row.len() == per_row {
                rows.push(std::mem::take(&mut row));
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }

        Self {
            inline_keyboard: rows,
        }
    }

    /// One button per row
    pub fn column(buttons: Vec<InlineButton>) -> Self {
        Self::grid(buttons, 1)
    }

    /// Append a full-width row
    pub fn with_row(mut self, row: Vec<InlineButton>) -> Self {
        if !row.is_empty() {
            self.inline_keyboard.push(row);
        }
        self
    }

    /// All callback tokens, row by row
    pub fn tokens(&self) -> Vec<&str> {
        self.inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.callback_data.as_str())
            .collect()
    }
}
