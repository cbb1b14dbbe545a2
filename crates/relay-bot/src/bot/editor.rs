//! Caption editing
//!
//! A caption is kept as an ordered list of lines. Edits happen in place and
//! there is no undo.

use crate::error::{Result, RelayError};
use serde::{Deserialize, Serialize};

pub const BOLD_OPEN: &str = "<b>";
pub const BOLD_CLOSE: &str = "</b>";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    lines: Vec<String>,
}

impl Caption {
    /// Split `text` on `\n`; a trailing newline yields a trailing empty line
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Insert an empty line at `index` (`0..=len`)
    pub fn insert_blank_line(&mut self, index: usize) -> Result<()> {
        if index > self.lines.len() {
            return Err(RelayError::MalformedInput(format!(
                "line position {index} is outside 0..={}",
                self.lines.len()
            )));
        }
        self.lines.insert(index, String::new());
        Ok(())
    }

    /// Wrap the first occurrence of `fragment` on line `index` in bold tags
    ///
    /// Returns whether the line changed. A fragment that does not occur (or
    /// is empty) leaves the line as it was.
    pub fn apply_bold(&mut self, index: usize, fragment: &str) -> Result<bool> {
        let len = self.lines.len();
        let line = self.lines.get_mut(index).ok_or_else(|| {
            RelayError::MalformedInput(format!("line {index} is outside 0..{len}"))
        })?;

        if fragment.is_empty() || !line.contains(fragment) {
            return Ok(false);
        }

        *line = line.replacen(fragment, &format!("{BOLD_OPEN}{fragment}{BOLD_CLOSE}"), 1);
        Ok(true)
    }

    /// Caption text as it is displayed and broadcast
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    /// Lines prefixed with their 1-based number
    pub fn numbered(&self) -> String {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}. {line}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
