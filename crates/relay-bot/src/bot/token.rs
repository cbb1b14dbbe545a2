//! Button tokens
//!
//! Callback payloads are private to this bot. Each [`Token`] renders to a
//! short string and parses back from it.

use std::fmt;

/// Action attached to an inline button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Convert with a stored rate
    Rate(i64),
    /// Convert with the live bank rate
    LiveRate,
    Edit,
    Send,
    Back,
    Cancel,
    AddLine,
    /// Insert a blank line at this position
    InsertAt(usize),
    AddBold,
    /// Bold a fragment of this 0-based line
    BoldLine(usize),
    RemoveRate(i64),
    EditRate(i64),
    ConfirmRate,
}

/// Data-free discriminant of [`Token`], used for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Rate,
    LiveRate,
    Edit,
    Send,
    Back,
    Cancel,
    AddLine,
    InsertAt,
    AddBold,
    BoldLine,
    RemoveRate,
    EditRate,
    ConfirmRate,
}

impl Token {
    pub fn parse(raw: &str) -> Option<Self> {
        let token = match raw {
            "rate_live" => Token::LiveRate,
            "edit" => Token::Edit,
            "send_to_groups" => Token::Send,
            "back" => Token::Back,
            "cancel" => Token::Cancel,
            "add_line" => Token::AddLine,
            "add_bold" => Token::AddBold,
            "confirm_rate" => Token::ConfirmRate,
            _ => {
                if let Some(n) = raw.strip_prefix("add_bold_") {
                    Token::BoldLine(n.parse().ok()?)
                } else if let Some(n) = raw.strip_prefix("line_") {
                    Token::InsertAt(n.parse().ok()?)
                } else if let Some(id) = raw.strip_prefix("del_rate_") {
                    Token::RemoveRate(id.parse().ok()?)
                } else if let Some(id) = raw.strip_prefix("edit_rate_") {
                    Token::EditRate(id.parse().ok()?)
                } else if let Some(id) = raw.strip_prefix("rate_") {
                    Token::Rate(id.parse().ok()?)
                } else {
                    return None;
                }
            }
        };
        Some(token)
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Rate(_) => TokenKind::Rate,
            Token::LiveRate => TokenKind::LiveRate,
            Token::Edit => TokenKind::Edit,
            Token::Send => TokenKind::Send,
            Token::Back => TokenKind::Back,
            Token::Cancel => TokenKind::Cancel,
            Token::AddLine => TokenKind::AddLine,
            Token::InsertAt(_) => TokenKind::InsertAt,
            Token::AddBold => TokenKind::AddBold,
            Token::BoldLine(_) => TokenKind::BoldLine,
            Token::RemoveRate(_) => TokenKind::RemoveRate,
            Token::EditRate(_) => TokenKind::EditRate,
            Token::ConfirmRate => TokenKind::ConfirmRate,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Rate(id) => write!(f, "rate_{id}"),
            Token::LiveRate => write!(f, "rate_live"),
            Token::Edit => write!(f, "edit"),
            Token::Send => write!(f, "send_to_groups"),
            Token::Back => write!(f, "back"),
            Token::Cancel => write!(f, "cancel"),
            Token::AddLine => write!(f, "add_line"),
            Token::InsertAt(n) => write!(f, "line_{n}"),
            Token::AddBold => write!(f, "add_bold"),
            Token::BoldLine(n) => write!(f, "add_bold_{n}"),
            Token::RemoveRate(id) => write!(f, "del_rate_{id}"),
            Token::EditRate(id) => write!(f, "edit_rate_{id}"),
            Token::ConfirmRate => write!(f, "confirm_rate"),
        }
    }
}
