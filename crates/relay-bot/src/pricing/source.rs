//! Live exchange-rate source
//!
//! The PrivatBank public endpoint returns a JSON array of
//! `{"ccy", "base_ccy", "buy", "sale"}` objects; the USD row sits at index 1.

use crate::error::{Result, RelayError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Source of a current exchange rate
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    /// Fetch the current buy rate
    async fn fetch_rate(&self) -> Result<f64>;
}

#[derive(Debug, Deserialize)]
struct CashRate {
    #[serde(default)]
    ccy: Option<String>,
    buy: String,
}

/// PrivatBank cashless rates
#[derive(Debug, Clone)]
pub struct PrivatBankSource {
    client: Client,
    url: String,
}

impl PrivatBankSource {
    /// Create a source for `url` with the given request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ExchangeRateSource for PrivatBankSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_rate(&self) -> Result<f64> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RelayError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "exchange rate request rejected");
            return Err(RelayError::UpstreamUnavailable(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RelayError::UpstreamUnavailable(e.to_string()))?;
        let rate = parse_buy_rate(&body)?;
        debug!(rate, "fetched live exchange rate");
        Ok(rate)
    }
}

/// Extract the buy rate of the second entry from a PrivatBank response body
pub fn parse_buy_rate(body: &str) -> Result<f64> {
    let rates: Vec<CashRate> = serde_json::from_str(body)
        .map_err(|e| RelayError::UpstreamUnavailable(format!("unexpected payload: {e}")))?;

    let entry = rates.get(1).ok_or_else(|| {
        RelayError::UpstreamUnavailable(format!("expected at least 2 rates, got {}", rates.len()))
    })?;

    let rate: f64 = entry.buy.trim().parse().map_err(|_| {
        RelayError::UpstreamUnavailable(format!(
            "invalid buy rate {:?} for {}",
            entry.buy,
            entry.ccy.as_deref().unwrap_or("?")
        ))
    })?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(RelayError::UpstreamUnavailable(format!(
            "non-positive buy rate {rate}"
        )));
    }

    Ok(rate)
}
