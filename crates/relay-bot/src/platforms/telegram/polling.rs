//! Long-polling receive loop
//!
//! Updates are handled one at a time in arrival order. Photo messages that
//! share a `media_group_id` arrive as separate updates and are merged into a
//! single [`Incoming::Photos`] event before dispatch.

use super::TelegramApi;
use super::types::{CallbackQuery, Message, Update, User};
use crate::bot::RelayBot;
use crate::error::Result;
use crate::interface::{Incoming, Operator, PhotoItem};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Short wait used to pick up the rest of an album split across batches
const ALBUM_FOLLOW_UP: Duration = Duration::from_secs(1);
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Poll until Ctrl-C
pub async fn run_polling(api: &TelegramApi, bot: &RelayBot) -> Result<()> {
    run_until(api, bot, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Poll until `shutdown` completes
pub async fn run_until<F>(api: &TelegramApi, bot: &RelayBot, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    api.delete_webhook(true).await?;
    info!("polling for updates");

    let poll_timeout = api.config().poll_timeout;
    let mut offset: Option<i64> = None;
    tokio::pin!(shutdown);

    loop {
        let batch = tokio::select! {
            () = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            batch = api.get_updates(offset, poll_timeout) => batch,
        };

        let mut updates = match batch {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "getUpdates failed");
                tokio::time::sleep(ERROR_BACKOFF).await;
                continue;
            }
        };

        if updates.last().is_some_and(Update::is_album_part) {
            match api.get_updates(next_offset(&updates), ALBUM_FOLLOW_UP).await {
                Ok(more) => updates.extend(more),
                Err(e) => warn!(error = %e, "album follow-up poll failed"),
            }
        }
        if let Some(next) = next_offset(&updates) {
            offset = Some(next);
        }

        for event in collect_events(updates) {
            if let Err(e) = bot.handle(event).await {
                error!(error = %e, "failed to handle update");
            }
        }

        let expired = bot.sessions().cleanup_expired();
        if expired > 0 {
            debug!(expired, "dropped expired sessions");
        }
    }

    Ok(())
}

/// Offset that acknowledges every update in the batch
fn next_offset(updates: &[Update]) -> Option<i64> {
    updates.iter().map(|u| u.update_id + 1).max()
}

fn operator(from: Option<&User>, chat_id: i64) -> Operator {
    match from {
        Some(user) => Operator {
            id: user.id,
            chat_id,
            name: user.display_name(),
        },
        None => Operator::private(chat_id),
    }
}

fn photo_item(message: &Message) -> Option<PhotoItem> {
    // Renditions are ordered by size; keep the largest
    let largest = message.photo.as_ref()?.last()?;
    Some(PhotoItem {
        photo_ref: largest.file_id.clone(),
        caption: message.caption.clone(),
    })
}

fn button_event(query: CallbackQuery) -> Option<Incoming> {
    let Some(message) = query.message else {
        debug!(callback = %query.id, "callback without message");
        return None;
    };
    let Some(token) = query.data else {
        debug!(callback = %query.id, "callback without data");
        return None;
    };

    Some(Incoming::Button {
        operator: operator(Some(&query.from), message.chat.id),
        message_id: message.message_id,
        callback_id: query.id,
        token,
    })
}

/// Turn a batch of updates into events, merging album parts
pub fn collect_events(updates: Vec<Update>) -> Vec<Incoming> {
    let mut events = Vec::with_capacity(updates.len());
    // (chat, media_group_id) -> index of the Photos event in `events`
    let mut albums: HashMap<(i64, String), usize> = HashMap::new();

    for update in updates {
        if let Some(query) = update.callback_query {
            events.extend(button_event(query));
            continue;
        }
        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "ignoring update");
            continue;
        };
        let operator = operator(message.from.as_ref(), message.chat.id);

        if let Some(item) = photo_item(&message) {
            let Some(group) = message.media_group_id else {
                events.push(Incoming::Photos {
                    operator,
                    album_id: None,
                    items: vec![item],
                });
                continue;
            };

            let key = (message.chat.id, group.clone());
            if let Some(&index) = albums.get(&key) {
                if let Incoming::Photos { items, .. } = &mut events[index] {
                    items.push(item);
                }
            } else {
                albums.insert(key, events.len());
                events.push(Incoming::Photos {
                    operator,
                    album_id: Some(group),
                    items: vec![item],
                });
            }
        } else if let Some(text) = message.text {
            events.push(Incoming::Text { operator, text });
        } else {
            // Stickers, documents etc. get the same guidance as stray text
            events.push(Incoming::Text {
                operator,
                text: message.caption.unwrap_or_default(),
            });
        }
    }

    events
}
