//! Bot API wire types (only the fields this bot reads or writes)

use crate::interface::InlineKeyboard;
use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Photo message that belongs to an album
    pub fn is_album_part(&self) -> bool {
        self.message
            .as_ref()
            .is_some_and(|m| m.photo.is_some() && m.media_group_id.is_some())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    /// Renditions of one photo, smallest first
    pub photo: Option<Vec<PhotoSize>>,
    pub media_group_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

impl User {
    pub fn display_name(&self) -> Option<String> {
        self.username
            .clone()
            .or_else(|| Some(self.first_name.clone()).filter(|n| !n.is_empty()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct DeleteWebhook {
    pub drop_pending_updates: bool,
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a InlineKeyboard>,
}

#[derive(Debug, Serialize)]
pub struct EditMessageText<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a InlineKeyboard>,
}

#[derive(Debug, Serialize)]
pub struct SendMediaGroup<'a> {
    pub chat_id: i64,
    pub media: Vec<InputMediaPhoto<'a>>,
}

#[derive(Debug, Serialize)]
pub struct InputMediaPhoto<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub media: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    pub callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::InlineButton;

    #[test]
    fn test_parse_photo_update() {
        let body = r#"{
            "ok": true,
            "result": [{
                "update_id": 10,
                "message": {
                    "message_id": 5,
                    "date": 1700000000,
                    "from": {"id": 42, "is_bot": false, "first_name": "Olena", "username": "olena"},
                    "chat": {"id": 42, "type": "private"},
                    "media_group_id": "1357",
                    "caption": "Dress $50",
                    "photo": [
                        {"file_id": "small", "file_unique_id": "a", "width": 90, "height": 90},
                        {"file_id": "large", "file_unique_id": "b", "width": 1280, "height": 1280}
                    ]
                }
            }]
        }"#;

        let response: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        assert!(response.ok);
        let updates = response.result.unwrap();
        assert!(updates[0].is_album_part());

        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.caption.as_deref(), Some("Dress $50"));
        assert_eq!(message.photo.as_ref().unwrap()[1].file_id, "large");
        assert_eq!(
            message.from.as_ref().unwrap().display_name().as_deref(),
            Some("olena")
        );
    }

    #[test]
    fn test_parse_error_envelope() {
        let body = r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let response: ApiResponse<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(400));
        assert_eq!(
            response.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }

    #[test]
    fn test_send_message_serializes_keyboard() {
        let keyboard = InlineKeyboard::column(vec![InlineButton::new("Назад", "back")]);
        let request = SendMessage {
            chat_id: 42,
            text: "hi",
            parse_mode: "HTML",
            reply_markup: Some(&keyboard),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(
            json["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "back"
        );
    }

    #[test]
    fn test_media_caption_only_when_present() {
        let media = InputMediaPhoto {
            kind: "photo",
            media: "file",
            caption: None,
            parse_mode: None,
        };
        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["type"], "photo");
        assert!(json.get("caption").is_none());
    }
}
