//! Persistent storage for rates, channels and operators
//!
//! Every store call is a single statement, so each mutation is atomic on its
//! own. Failures come back as [`StoreError`] with distinct variants for
//! duplicates, misses and backend trouble.

pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sqlite::Database;

/// Storage errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Unique key already taken
    #[error("duplicate {0}")]
    Duplicate(String),

    /// No row matched the key
    #[error("missing {0}")]
    NotFound(String),

    /// Connection, I/O or schema failure
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A named exchange rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub id: i64,
    pub name: String,
    pub rate: f64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// A broadcast destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub identifier: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// A known operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub tg_id: i64,
    pub name: Option<String>,
    pub is_admin: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Named currency rates
pub trait RateStore: Send + Sync {
    fn add_rate(&self, name: &str, rate: f64) -> StoreResult<CurrencyRate>;
    fn get_rate(&self, id: i64) -> StoreResult<CurrencyRate>;
    fn list_rates(&self) -> StoreResult<Vec<CurrencyRate>>;
    fn update_rate(&self, id: i64, rate: f64) -> StoreResult<CurrencyRate>;
    fn remove_rate(&self, id: i64) -> StoreResult<()>;
}

/// Broadcast channels, keyed by their identifier
pub trait ChannelStore: Send + Sync {
    fn add_channel(&self, identifier: &str) -> StoreResult<Channel>;
    fn get_channel(&self, id: i64) -> StoreResult<Channel>;
    fn list_channels(&self) -> StoreResult<Vec<Channel>>;
    fn remove_channel(&self, identifier: &str) -> StoreResult<()>;
}

/// Operator registry
pub trait UserStore: Send + Sync {
    /// Register the operator if unseen and return the stored row
    fn ensure_user(&self, tg_id: i64, name: Option<&str>) -> StoreResult<User>;
    fn is_admin(&self, tg_id: i64) -> StoreResult<bool>;
    fn set_admin(&self, tg_id: i64, is_admin: bool) -> StoreResult<()>;
}

/// Everything the bot needs from persistence
pub trait Store: RateStore + ChannelStore + UserStore {}

impl<T: RateStore + ChannelStore + UserStore> Store for T {}
