//! Configuration for the relay bot

use crate::error::{Result, RelayError};
use relay_utils::{env_list, env_opt, env_parse};
use std::time::Duration;

/// Public PrivatBank endpoint with cashless exchange rates
pub const DEFAULT_RATE_API_URL: &str =
    "https://api.privatbank.ua/p24api/pubinfo?exchange&coursid=11";

/// Configuration for the caption conversion and broadcast flow
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// SQLite database file (`:memory:` for an ephemeral store)
    pub database_path: String,

    /// Telegram user ids allowed to run management commands
    pub admin_ids: Vec<i64>,

    /// Live exchange-rate endpoint; `None` hides the live-rate button
    pub rate_api_url: Option<String>,

    /// Label appended to converted amounts
    pub currency_unit: String,

    /// Request timeout for outbound HTTP calls
    pub request_timeout: Duration,

    /// Idle time after which a conversation is discarded
    pub session_ttl: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            database_path: "relay.db".to_string(),
            admin_ids: Vec::new(),
            rate_api_url: Some(DEFAULT_RATE_API_URL.to_string()),
            currency_unit: "грн".to_string(),
            request_timeout: Duration::from_secs(30),
            session_ttl: Duration::from_secs(3600),
        }
    }
}

impl RelayConfig {
    /// Create a new configuration builder
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// Reads `DATABASE_PATH`, `ADMIN_IDS`, `RATE_API_URL` (set to `off` to
    /// disable the live rate), `CURRENCY_UNIT`, `REQUEST_TIMEOUT_SECS` and
    /// `SESSION_TTL_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder().admin_ids(env_list("ADMIN_IDS")?);

        if let Some(path) = env_opt("DATABASE_PATH") {
            builder = builder.database_path(path);
        }
        if let Some(url) = env_opt("RATE_API_URL") {
            builder = if url.eq_ignore_ascii_case("off") {
                builder.without_live_rate()
            } else {
                builder.rate_api_url(url)
            };
        }
        if let Some(unit) = env_opt("CURRENCY_UNIT") {
            builder = builder.currency_unit(unit);
        }
        if let Some(secs) = env_parse::<u64>("REQUEST_TIMEOUT_SECS")? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("SESSION_TTL_SECS")? {
            builder = builder.session_ttl(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.database_path.trim().is_empty() {
            return Err(RelayError::ConfigError(
                "database path must not be empty".to_string(),
            ));
        }

        if self.currency_unit.trim().is_empty() {
            return Err(RelayError::ConfigError(
                "currency unit must not be empty".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(RelayError::ConfigError(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        if self.session_ttl.is_zero() {
            return Err(RelayError::ConfigError(
                "session ttl must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether `user_id` is listed as an administrator
    pub fn is_configured_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

/// Builder for RelayConfig
#[derive(Debug, Default)]
pub struct RelayConfigBuilder {
    database_path: Option<String>,
    admin_ids: Option<Vec<i64>>,
    rate_api_url: Option<Option<String>>,
    currency_unit: Option<String>,
    request_timeout: Option<Duration>,
    session_ttl: Option<Duration>,
}

impl RelayConfigBuilder {
    /// Set the SQLite database path
    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Set administrator ids
    pub fn admin_ids(mut self, ids: Vec<i64>) -> Self {
        self.admin_ids = Some(ids);
        self
    }

    /// Set the live exchange-rate endpoint
    pub fn rate_api_url(mut self, url: impl Into<String>) -> Self {
        self.rate_api_url = Some(Some(url.into()));
        self
    }

    /// Disable the live exchange rate
    pub fn without_live_rate(mut self) -> Self {
        self.rate_api_url = Some(None);
        self
    }

    /// Set the currency label
    pub fn currency_unit(mut self, unit: impl Into<String>) -> Self {
        self.currency_unit = Some(unit.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set session ttl
    pub fn session_ttl(mut self, duration: Duration) -> Self {
        self.session_ttl = Some(duration);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RelayConfig> {
        let defaults = RelayConfig::default();

        let config = RelayConfig {
            database_path: self.database_path.unwrap_or(defaults.database_path),
            admin_ids: self.admin_ids.unwrap_or(defaults.admin_ids),
            rate_api_url: self.rate_api_url.unwrap_or(defaults.rate_api_url),
            currency_unit: self.currency_unit.unwrap_or(defaults.currency_unit),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            session_ttl: self.session_ttl.unwrap_or(defaults.session_ttl),
        };

        config.validate()?;
        Ok(config)
    }
}
