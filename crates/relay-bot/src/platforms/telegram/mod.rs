//! Telegram Bot API transport
//!
//! [`TelegramApi`] is a thin JSON client over the handful of Bot API methods
//! the relay needs. Updates are fetched by long polling (see [`polling`]).

pub mod polling;
pub mod types;

pub use polling::{collect_events, run_polling, run_until};

use crate::error::{RelayError, Result};
use crate::interface::{InlineKeyboard, Messenger};
use async_trait::async_trait;
use relay_utils::{EnvError, env_opt, env_parse};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use types::{
    AnswerCallbackQuery, ApiResponse, DeleteWebhook, EditMessageText, GetUpdates,
    InputMediaPhoto, Message, SendMediaGroup, SendMessage, Update,
};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const PARSE_MODE: &str = "HTML";
/// Bot API limit on photos per album
const MAX_ALBUM_SIZE: usize = 10;

/// Telegram bot configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub token: String,

    /// Base URL of the Bot API server
    pub api_base: String,

    /// How long a single getUpdates call may wait for updates
    pub poll_timeout: Duration,

    /// Timeout for every other request
    pub request_timeout: Duration,
}

impl TelegramConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Create config from environment variables
    ///
    /// The token is read from `BOT_TOKEN`, falling back to `TELEGRAM_BOT_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let token = env_opt("BOT_TOKEN")
            .or_else(|| env_opt("TELEGRAM_BOT_TOKEN"))
            .ok_or_else(|| EnvError::Missing("BOT_TOKEN".to_string()))?;

        let mut config = Self::new(token);
        if let Some(api_base) = env_opt("TELEGRAM_API_BASE") {
            config.api_base = api_base;
        }
        if let Some(secs) = env_parse::<u64>("POLL_TIMEOUT_SECS")? {
            config.poll_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

/// Bot API client
pub struct TelegramApi {
    client: Client,
    config: TelegramConfig,
}

impl TelegramApi {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// POST `params` to a Bot API method and unwrap the response envelope
    async fn call<P, R>(&self, method: &str, params: &P, timeout: Option<Duration>) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(self.config.method_url(method)).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: ApiResponse<R> = response.json().await?;

        if !body.ok {
            let description = body
                .description
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(RelayError::Telegram(description));
        }
        body.result
            .ok_or_else(|| RelayError::Telegram(format!("{method} returned no result")))
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: Option<i64>, wait: Duration) -> Result<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout: wait.as_secs(),
            allowed_updates: &["message", "callback_query"],
        };
        // The HTTP request must outlive the server-side wait
        let timeout = wait + self.config.request_timeout;
        self.call("getUpdates", &params, Some(timeout)).await
    }

    /// Switch the bot to polling mode
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        let params = DeleteWebhook {
            drop_pending_updates,
        };
        let _: bool = self.call("deleteWebhook", &params, None).await?;
        Ok(())
    }
}

fn is_not_modified(err: &RelayError) -> bool {
    matches!(err, RelayError::Telegram(description) if description.contains("message is not modified"))
}

/// Split an album into Bot API sized chunks; the caption rides on the very first photo
fn album_chunks<'a>(media: &'a [String], caption: Option<&'a str>) -> Vec<Vec<InputMediaPhoto<'a>>> {
    media
        .chunks(MAX_ALBUM_SIZE)
        .enumerate()
        .map(|(chunk_index, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(|(i, file)| {
                    let caption = if chunk_index == 0 && i == 0 { caption } else { None };
                    InputMediaPhoto {
                        kind: "photo",
                        media: file,
                        caption,
                        parse_mode: caption.map(|_| PARSE_MODE),
                    }
                })
                .collect()
        })
        .collect()
}

#[async_trait]
impl Messenger for TelegramApi {
    #[instrument(skip(self, text, keyboard))]
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<i64> {
        let params = SendMessage {
            chat_id,
            text,
            parse_mode: PARSE_MODE,
            reply_markup: keyboard,
        };
        let message: Message = self.call("sendMessage", &params, None).await?;
        debug!(message_id = message.message_id, "message sent");
        Ok(message.message_id)
    }

    #[instrument(skip(self, text, keyboard))]
    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let params = EditMessageText {
            chat_id,
            message_id,
            text,
            parse_mode: PARSE_MODE,
            reply_markup: keyboard,
        };
        match self
            .call::<_, serde_json::Value>("editMessageText", &params, None)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_modified(&e) => {
                debug!("message already up to date");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, media, caption), fields(photos = media.len()))]
    async fn send_media_group(
        &self,
        chat_id: i64,
        media: &[String],
        caption: Option<&str>,
    ) -> Result<()> {
        if media.is_empty() {
            return Err(RelayError::MalformedInput("album has no photos".to_string()));
        }

        for chunk in album_chunks(media, caption) {
            let params = SendMediaGroup {
                chat_id,
                media: chunk,
            };
            let _: serde_json::Value = self.call("sendMediaGroup", &params, None).await?;
        }
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, notice: Option<&str>) -> Result<()> {
        let params = AnswerCallbackQuery {
            callback_query_id: callback_id,
            text: notice,
        };
        if let Err(e) = self
            .call::<_, bool>("answerCallbackQuery", &params, None)
            .await
        {
            // Queries older than a few minutes can no longer be answered
            warn!(error = %e, "answerCallbackQuery failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let config = TelegramConfig::new("123:abc").with_api_base("http://localhost:8081/");
        assert_eq!(
            config.method_url("getUpdates"),
            "http://localhost:8081/bot123:abc/getUpdates"
        );
    }

    #[test]
    fn test_album_chunks_caption_on_first_photo() {
        let media: Vec<String> = (0..12).map(|i| format!("photo-{i}")).collect();
        let chunks = album_chunks(&media, Some("<b>Dress</b>"));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 2);
        assert_eq!(chunks[0][0].caption, Some("<b>Dress</b>"));
        assert_eq!(chunks[0][0].parse_mode, Some("HTML"));
        assert!(chunks[0][1..].iter().all(|m| m.caption.is_none()));
        assert!(chunks[1].iter().all(|m| m.caption.is_none()));
    }

    #[test]
    fn test_not_modified_is_recognised() {
        let err = RelayError::Telegram(
            "Bad Request: message is not modified: specified new message content".to_string(),
        );
        assert!(is_not_modified(&err));
        assert!(!is_not_modified(&RelayError::Telegram(
            "Bad Request: chat not found".to_string()
        )));
    }

    #[test]
    fn test_config_defaults() {
        let config = TelegramConfig::new("token");
        assert_eq!(config.api_base, "https://api.telegram.org");
        assert_eq!(config.poll_timeout, Duration::from_secs(30));
    }
}
