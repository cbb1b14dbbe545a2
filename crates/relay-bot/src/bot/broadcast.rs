//! Broadcast fan-out to channels
//!
//! Delivery is best effort: each channel is tried once, failures are
//! reported per channel and never stop the remaining deliveries.

use crate::error::RelayError;
use crate::interface::Messenger;
use crate::store::Channel;
use futures::future::join_all;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

static NUMERIC_CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("channel id pattern is valid"));

/// Result of delivering to a single channel
#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered,
    /// The transport rejected the album; always a `RelayError::DeliveryFailure`
    Failed(RelayError),
    /// Identifier is not a numeric chat id; nothing was sent
    NotFound,
}

#[derive(Debug)]
pub struct ChannelReport {
    pub identifier: String,
    pub outcome: DeliveryOutcome,
}

/// Per-channel outcomes in channel order
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub channels: Vec<ChannelReport>,
}

impl BroadcastReport {
    pub fn delivered(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| c.is_delivered())
            .count()
    }

    pub fn total(&self) -> usize {
        self.channels.len()
    }

    /// Reports that need the operator's attention
    pub fn problems(&self) -> impl Iterator<Item = &ChannelReport> {
        self.channels
            .iter()
            .filter(|c| !c.is_delivered())
    }
}

impl ChannelReport {
    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered)
    }
}

/// Parse a channel identifier into a chat id, if it is numeric
pub fn numeric_chat_id(identifier: &str) -> Option<i64> {
    let identifier = identifier.trim();
    if !NUMERIC_CHANNEL_ID.is_match(identifier) {
        return None;
    }
    identifier.parse().ok()
}

pub struct BroadcastDispatcher {
    messenger: Arc<dyn Messenger>,
}

impl BroadcastDispatcher {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Send `media` with `caption` on the first photo to every channel
    pub async fn broadcast(
        &self,
        caption: &str,
        media: &[String],
        channels: &[Channel],
    ) -> BroadcastReport {
        let deliveries = channels.iter().map(|channel| async move {
            let outcome = match numeric_chat_id(&channel.identifier) {
                None => {
                    warn!(channel = %channel.identifier, "skipping non-numeric channel id");
                    DeliveryOutcome::NotFound
                }
                Some(chat_id) => match self
                    .messenger
                    .send_media_group(chat_id, media, Some(caption))
                    .await
                {
                    Ok(()) => DeliveryOutcome::Delivered,
                    Err(e) => {
                        warn!(channel = %channel.identifier, error = %e, "delivery failed");
                        DeliveryOutcome::Failed(RelayError::DeliveryFailure {
                            channel: channel.identifier.clone(),
                            reason: e.to_string(),
                        })
                    }
                },
            };

            ChannelReport {
                identifier: channel.identifier.clone(),
                outcome,
            }
        });

        let report = BroadcastReport {
            channels: join_all(deliveries).await,
        };
        info!(
            delivered = report.delivered(),
            total = report.total(),
            "broadcast finished"
        );
        report
    }
}
