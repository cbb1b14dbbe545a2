//! Caption relay bot
//!
//! A Telegram bot that takes a photo album with a caption quoting dollar
//! prices, converts the prices to a local currency at a chosen rate, lets the
//! operator touch up the caption, and broadcasts the album to a list of
//! channels.
//!
//! # Architecture
//!
//! - [`pricing`]: price rewriting and the live exchange-rate source
//! - [`store`]: SQLite-backed rates, channels and operators
//! - [`interface`]: transport-neutral events, keyboards, sessions and the
//!   [`Messenger`] seam
//! - [`bot`]: the conversation orchestrator and its dispatch table
//! - [`platforms`]: the Telegram Bot API transport
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_bot::{Database, RelayBot, RelayConfig, TelegramApi, TelegramConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RelayConfig::from_env()?;
//!     let store = Arc::new(Database::open(&config.database_path)?);
//!     let api = Arc::new(TelegramApi::new(TelegramConfig::from_env()?)?);
//!
//!     let bot = RelayBot::new(config, store, api.clone());
//!     relay_bot::platforms::telegram::run_polling(&api, &bot).await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod interface;
pub mod platforms;
pub mod pricing;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use bot::RelayBot;
pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use interface::{Incoming, Messenger};
pub use platforms::{TelegramApi, TelegramConfig};
pub use pricing::{ExchangeRateSource, PriceRewriter, PrivatBankSource};
pub use store::{Database, Store, StoreError};
