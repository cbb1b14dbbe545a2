//! Conversation orchestrator
//!
//! [`RelayBot`] owns the per-operator sessions and routes every inbound event
//! through the dispatch table in [`router`]. Handlers live in
//! `caption_flow` (converting and broadcasting a post) and `admin`
//! (channel and rate management).

mod admin;
pub mod broadcast;
mod caption_flow;
pub mod commands;
pub mod editor;
pub mod menus;
pub mod router;
pub mod token;

pub use broadcast::{BroadcastDispatcher, BroadcastReport, ChannelReport, DeliveryOutcome};
pub use commands::Command;
pub use editor::Caption;
pub use router::{Input, Request, Router, Trigger};
pub use token::{Token, TokenKind};

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::interface::{
    ConversationSession, ConversationState, Incoming, InlineKeyboard, Messenger, SessionManager,
};
use crate::pricing::{ExchangeRateSource, PriceRewriter};
use crate::store::Store;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

const SOMETHING_WENT_WRONG: &str = "Щось пішло не так, спробуйте ще раз";

pub struct RelayBot {
    config: RelayConfig,
    store: Arc<dyn Store>,
    messenger: Arc<dyn Messenger>,
    rate_source: Option<Arc<dyn ExchangeRateSource>>,
    rewriter: PriceRewriter,
    dispatcher: BroadcastDispatcher,
    sessions: SessionManager,
    router: Router,
}

impl RelayBot {
    pub fn new(config: RelayConfig, store: Arc<dyn Store>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            rewriter: PriceRewriter::new(config.currency_unit.clone()),
            dispatcher: BroadcastDispatcher::new(Arc::clone(&messenger)),
            sessions: SessionManager::new(config.session_ttl),
            router: Router::standard(),
            rate_source: None,
            config,
            store,
            messenger,
        }
    }

    /// Offer the live bank rate next to the stored ones
    pub fn with_rate_source(mut self, source: Arc<dyn ExchangeRateSource>) -> Self {
        self.rate_source = Some(source);
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Handle one inbound event to completion
    ///
    /// Handler failures are reported to the operator and then returned so the
    /// caller can log them. The session is saved either way.
    #[instrument(skip(self, event), fields(operator = event.operator().id))]
    pub async fn handle(&self, event: Incoming) -> Result<()> {
        let request = Request::from_event(event);
        let operator = &request.operator;

        if let Err(e) = self.store.ensure_user(operator.id, operator.name.as_deref()) {
            warn!(error = %e, "failed to register operator");
        }

        let mut session = self.sessions.get_or_create(operator.id);
        let state = session.state.kind();
        let route = request
            .trigger()
            .and_then(|trigger| self.router.route(state, trigger));
        debug!(?state, trigger = ?request.trigger(), routed = route.is_some(), "dispatching");

        let outcome = match route {
            Some(route) if route.admin_only && !self.is_admin(operator.id) => {
                debug!("management action denied");
                self.notify(&request, menus::ADMIN_ONLY).await
            }
            Some(route) => {
                // Commands abandon whatever dialog was open
                if matches!(request.input, Input::Command(_)) {
                    session.reset();
                }
                (route.handler)(self, &mut session, &request).await
            }
            None => self.unhandled(&session, &request).await,
        };

        if let Input::Button { callback_id, .. } = &request.input {
            let notice = route.is_none().then_some(menus::STALE_ACTION);
            if let Err(e) = self.messenger.answer_callback(callback_id, notice).await {
                warn!(error = %e, "failed to answer callback");
            }
        }

        self.sessions.update(session)?;

        if let Err(e) = outcome {
            error!(error = %e, "handler failed");
            let text = match e {
                RelayError::Store(_) => menus::STORAGE_FAILED,
                _ => SOMETHING_WENT_WRONG,
            };
            if let Err(notify_err) = self.notify(&request, text).await {
                warn!(error = %notify_err, "failed to report handler error");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Configured administrators plus users flagged in the store
    pub fn is_admin(&self, user_id: i64) -> bool {
        if self.config.is_configured_admin(user_id) {
            return true;
        }
        self.store.is_admin(user_id).unwrap_or_else(|e| {
            warn!(user_id, error = %e, "admin lookup failed");
            false
        })
    }

    async fn unhandled(&self, session: &ConversationSession, request: &Request) -> Result<()> {
        match &request.input {
            // Acknowledged with a notice in `handle`
            Input::Button { .. } => Ok(()),
            Input::Text(_) if session.state == ConversationState::Idle => {
                self.notify(request, menus::PHOTOS_ONLY).await
            }
            _ => self.notify(request, menus::USE_BUTTONS).await,
        }
    }

    /// Send a new message to the operator
    async fn notify(&self, request: &Request, text: &str) -> Result<()> {
        self.messenger.send_text(request.chat_id(), text, None).await?;
        Ok(())
    }

    /// Answer in place: edit the menu the button belongs to, or send a new message
    async fn reply(
        &self,
        request: &Request,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        match request.menu_message_id() {
            Some(message_id) => {
                self.messenger
                    .edit_text(request.chat_id(), message_id, text, keyboard)
                    .await
            }
            None => {
                self.messenger
                    .send_text(request.chat_id(), text, keyboard)
                    .await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{Operator, PhotoItem};
    use crate::pricing::source::MockExchangeRateSource;
    use crate::store::{ChannelStore, Database, RateStore, UserStore};
    use crate::testing::RecordingMessenger;
    use std::time::Duration;

    const ADMIN: i64 = 1;
    const OPERATOR: i64 = 2;

    struct Harness {
        bot: RelayBot,
        store: Arc<Database>,
        messenger: Arc<RecordingMessenger>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_messenger(RecordingMessenger::new())
        }

        fn with_messenger(messenger: RecordingMessenger) -> Self {
            let config = RelayConfig::builder()
                .database_path(":memory:")
                .admin_ids(vec![ADMIN])
                .without_live_rate()
                .session_ttl(Duration::from_secs(600))
                .build()
                .unwrap();
            let store = Arc::new(Database::in_memory().unwrap());
            let messenger = Arc::new(messenger);
            let bot = RelayBot::new(config, store.clone(), messenger.clone());
            Self {
                bot,
                store,
                messenger,
            }
        }

        async fn text(&self, user: i64, text: &str) {
            self.bot
                .handle(Incoming::text(Operator::private(user), text))
                .await
                .unwrap();
        }

        async fn press(&self, user: i64, token: &str) {
            let message_id = self.messenger.last_message_id();
            self.bot
                .handle(Incoming::button(
                    Operator::private(user),
                    message_id,
                    "cb",
                    token,
                ))
                .await
                .unwrap();
        }

        async fn album(&self, user: i64, caption: &str) {
            self.bot
                .handle(Incoming::Photos {
                    operator: Operator::private(user),
                    album_id: Some("album-1".to_string()),
                    items: vec![
                        PhotoItem::captioned("photo-a", caption),
                        PhotoItem::new("photo-b"),
                    ],
                })
                .await
                .unwrap();
        }

        fn state(&self, user: i64) -> ConversationState {
            self.bot.sessions().get_or_create(user).state
        }

        fn last_text(&self) -> String {
            self.messenger.last_text().unwrap_or_default()
        }
    }

    #[tokio::test]
    async fn test_convert_bold_and_broadcast() {
        let h = Harness::new();
        let usd = h.store.add_rate("USD", 40.0).unwrap();
        h.store.add_channel("-1001").unwrap();
        h.store.add_channel("-1002").unwrap();

        h.album(OPERATOR, "Dress $50").await;
        assert_eq!(h.state(OPERATOR), ConversationState::AwaitingRateSelection);
        assert_eq!(h.last_text(), menus::CHOOSE_RATE);

        h.press(OPERATOR, &format!("rate_{}", usd.id)).await;
        assert_eq!(h.state(OPERATOR), ConversationState::Editing);
        assert_eq!(h.last_text(), "Dress 2000 грн + вага\n");
        // Converted preview album goes back to the operator
        let preview = &h.messenger.albums()[0];
        assert_eq!(preview.chat_id, OPERATOR);
        assert_eq!(preview.media, vec!["photo-a", "photo-b"]);

        h.press(OPERATOR, "add_bold").await;
        h.press(OPERATOR, "add_bold_0").await;
        assert_eq!(h.state(OPERATOR), ConversationState::AwaitingBoldText);

        h.text(OPERATOR, "Dress").await;
        assert_eq!(h.state(OPERATOR), ConversationState::Editing);
        assert_eq!(h.last_text(), "<b>Dress</b> 2000 грн + вага\n");

        h.press(OPERATOR, "send_to_groups").await;
        assert_eq!(h.state(OPERATOR), ConversationState::Idle);
        assert_eq!(h.last_text(), menus::SENT);

        let delivered: Vec<_> = h
            .messenger
            .albums()
            .into_iter()
            .filter(|a| a.chat_id < 0)
            .collect();
        assert_eq!(delivered.len(), 2);
        for album in delivered {
            assert_eq!(album.caption.as_deref(), Some("<b>Dress</b> 2000 грн + вага\n"));
            assert_eq!(album.media, vec!["photo-a", "photo-b"]);
        }
    }

    #[tokio::test]
    async fn test_broadcast_reports_problem_channels() {
        let h = Harness::with_messenger(RecordingMessenger::new().failing_chat(-1002));
        let usd = h.store.add_rate("USD", 40.0).unwrap();
        h.store.add_channel("-1001").unwrap();
        h.store.add_channel("-1002").unwrap();
        h.store.add_channel("@shop").unwrap();

        h.album(OPERATOR, "Bag $10").await;
        h.press(OPERATOR, &format!("rate_{}", usd.id)).await;
        h.press(OPERATOR, "send_to_groups").await;

        let texts: Vec<String> = h.messenger.texts().into_iter().map(|t| t.text).collect();
        let failure = RelayError::DeliveryFailure {
            channel: "-1002".to_string(),
            reason: RelayError::Telegram("Bad Request: chat not found".to_string()).to_string(),
        };
        assert!(texts.contains(&menus::delivery_failed("-1002", &failure)));
        assert!(texts.contains(&menus::channel_missing("@shop")));
        assert_eq!(h.last_text(), menus::SENT);
        assert_eq!(h.state(OPERATOR), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_failed_problem_report_still_clears_session() {
        let h = Harness::with_messenger(RecordingMessenger::new().failing_texts("Канал"));
        let usd = h.store.add_rate("USD", 40.0).unwrap();
        h.store.add_channel("-1001").unwrap();
        h.store.add_channel("@bad").unwrap();

        h.album(OPERATOR, "Bag $10").await;
        h.press(OPERATOR, &format!("rate_{}", usd.id)).await;
        h.press(OPERATOR, "send_to_groups").await;
        assert_eq!(h.state(OPERATOR), ConversationState::Idle);
        assert_eq!(h.last_text(), menus::SENT);

        // A second press finds nothing to send
        h.press(OPERATOR, "send_to_groups").await;
        let to_channel = h
            .messenger
            .albums()
            .iter()
            .filter(|a| a.chat_id == -1001)
            .count();
        assert_eq!(to_channel, 1);
        assert_eq!(
            h.messenger.callbacks().last().map(|(_, notice)| notice.clone()),
            Some(Some(menus::STALE_ACTION.to_string()))
        );
    }

    #[tokio::test]
    async fn test_out_of_range_bold_line_reopens_picker() {
        let h = Harness::new();
        let usd = h.store.add_rate("USD", 40.0).unwrap();

        h.album(OPERATOR, "Dress $50\nSize M").await;
        h.press(OPERATOR, &format!("rate_{}", usd.id)).await;
        h.press(OPERATOR, "add_bold").await;
        h.press(OPERATOR, "add_bold_99").await;

        let bold_target = ConversationState::AwaitingLineTarget(crate::interface::LineAction::Bold);
        assert_eq!(h.state(OPERATOR), bold_target);
        let edit = h.messenger.edits().pop().unwrap();
        assert_eq!(edit.text, menus::LINE_NOT_FOUND);
        assert_eq!(
            edit.keyboard.unwrap().tokens(),
            vec!["add_bold_0", "add_bold_1", "add_bold_2", "back"]
        );
        assert!(h.bot.sessions().get_or_create(OPERATOR).pending_edit_target.is_none());
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_a_dialog_answer() {
        let h = Harness::new();
        h.text(ADMIN, "/add_channel").await;
        h.text(ADMIN, "/foo").await;
        assert_eq!(h.last_text(), menus::ENTER_CHANNEL_ID);
        assert_eq!(h.state(ADMIN), ConversationState::AwaitingChannelToAdd);
        assert!(h.store.list_channels().unwrap().is_empty());

        h.text(ADMIN, "/add_rate").await;
        h.text(ADMIN, "/usd").await;
        assert_eq!(h.last_text(), menus::BAD_RATE_NAME);
        assert_eq!(h.state(ADMIN), ConversationState::AwaitingRateName);

        let usd = h.store.add_rate("USD", 40.0).unwrap();
        h.album(OPERATOR, "Dress $50").await;
        h.press(OPERATOR, &format!("rate_{}", usd.id)).await;
        h.press(OPERATOR, "add_bold").await;
        h.press(OPERATOR, "add_bold_0").await;

        h.text(OPERATOR, "/bold").await;
        assert_eq!(h.state(OPERATOR), ConversationState::AwaitingBoldText);
        assert_eq!(h.last_text(), menus::bold_prompt("Dress 2000 грн + вага"));

        h.text(OPERATOR, "Dress").await;
        assert_eq!(h.last_text(), "<b>Dress</b> 2000 грн + вага\n");
    }

    #[tokio::test]
    async fn test_insert_blank_line_and_out_of_range_token() {
        let h = Harness::new();
        let usd = h.store.add_rate("USD", 40.0).unwrap();

        h.album(OPERATOR, "Dress $50\nSize M").await;
        h.press(OPERATOR, &format!("rate_{}", usd.id)).await;
        h.press(OPERATOR, "add_line").await;
        assert_eq!(
            h.state(OPERATOR),
            ConversationState::AwaitingLineTarget(crate::interface::LineAction::InsertBlank)
        );

        h.press(OPERATOR, "line_99").await;
        assert_eq!(h.last_text(), menus::LINE_NOT_FOUND);
        assert_eq!(
            h.state(OPERATOR),
            ConversationState::AwaitingLineTarget(crate::interface::LineAction::InsertBlank)
        );

        h.press(OPERATOR, "line_1").await;
        assert_eq!(h.state(OPERATOR), ConversationState::Editing);
        assert_eq!(h.last_text(), "Dress 2000 грн + вага\n\n\nSize M");
    }

    #[tokio::test]
    async fn test_stale_button_is_acknowledged() {
        let h = Harness::new();
        h.press(OPERATOR, "send_to_groups").await;

        assert_eq!(
            h.messenger.callbacks(),
            vec![("cb".to_string(), Some(menus::STALE_ACTION.to_string()))]
        );
        assert!(h.messenger.albums().is_empty());
        assert_eq!(h.state(OPERATOR), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_text_without_photo_gets_guidance() {
        let h = Harness::new();
        h.text(OPERATOR, "Dress $50").await;
        assert_eq!(h.last_text(), menus::PHOTOS_ONLY);

        h.bot
            .handle(Incoming::Photos {
                operator: Operator::private(OPERATOR),
                album_id: None,
                items: vec![PhotoItem::new("photo-a")],
            })
            .await
            .unwrap();
        assert_eq!(h.last_text(), menus::PHOTOS_ONLY);
        assert_eq!(h.state(OPERATOR), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_resets_session() {
        let h = Harness::new();
        h.store.add_rate("USD", 40.0).unwrap();
        h.album(OPERATOR, "Dress $50").await;

        h.text(OPERATOR, "/cancel").await;
        assert_eq!(h.state(OPERATOR), ConversationState::Idle);
        assert_eq!(h.last_text(), menus::CANCELLED);
        assert!(h.bot.sessions().get_or_create(OPERATOR).media_refs.is_empty());
    }

    #[tokio::test]
    async fn test_management_requires_admin() {
        let h = Harness::new();
        h.text(OPERATOR, "/add_channel").await;
        assert_eq!(h.last_text(), menus::ADMIN_ONLY);
        assert_eq!(h.state(OPERATOR), ConversationState::Idle);

        h.store.set_admin(OPERATOR, true).unwrap();
        h.text(OPERATOR, "/add_channel").await;
        assert_eq!(h.last_text(), menus::ENTER_CHANNEL_ID);
        assert_eq!(h.state(OPERATOR), ConversationState::AwaitingChannelToAdd);
    }

    #[tokio::test]
    async fn test_channel_dialogs() {
        let h = Harness::new();

        h.text(ADMIN, "/add_channel").await;
        h.text(ADMIN, "-1001").await;
        assert_eq!(h.last_text(), menus::CHANNEL_ADDED);
        assert_eq!(h.state(ADMIN), ConversationState::Idle);

        h.text(ADMIN, "/add_channel").await;
        h.text(ADMIN, "-1001").await;
        assert_eq!(h.last_text(), menus::CHANNEL_EXISTS);

        h.text(ADMIN, "/list").await;
        assert_eq!(h.last_text(), "-1001");

        h.text(ADMIN, "/remove_channel").await;
        h.text(ADMIN, "-1001").await;
        assert_eq!(h.last_text(), menus::CHANNEL_REMOVED);

        h.text(ADMIN, "/remove_channel").await;
        h.text(ADMIN, "-1001").await;
        assert_eq!(h.last_text(), menus::CHANNEL_NOT_FOUND);
        assert!(h.store.list_channels().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_rate_dialog_reprompts_on_bad_value() {
        let h = Harness::new();

        h.text(ADMIN, "/add_rate").await;
        assert_eq!(h.state(ADMIN), ConversationState::AwaitingRateName);
        h.text(ADMIN, "USD").await;
        assert_eq!(
            h.state(ADMIN),
            ConversationState::AwaitingRateValue {
                name: "USD".to_string()
            }
        );

        h.text(ADMIN, "forty").await;
        assert_eq!(h.last_text(), menus::BAD_RATE_VALUE);
        h.text(ADMIN, "-3").await;
        assert_eq!(h.last_text(), menus::BAD_RATE_VALUE);

        h.text(ADMIN, "41,5").await;
        assert_eq!(h.last_text(), menus::confirm_rate_prompt("USD", 41.5));
        h.press(ADMIN, "confirm_rate").await;
        assert_eq!(h.last_text(), menus::rate_added("USD"));
        assert_eq!(h.state(ADMIN), ConversationState::Idle);

        let rates = h.store.list_rates().unwrap();
        assert_eq!(rates.len(), 1);
        assert!((rates[0].rate - 41.5).abs() < f64::EPSILON);

        // Same name again is a duplicate
        h.text(ADMIN, "/add_rate").await;
        h.text(ADMIN, "USD").await;
        h.text(ADMIN, "42").await;
        h.press(ADMIN, "confirm_rate").await;
        assert_eq!(h.last_text(), menus::rate_exists("USD"));
    }

    #[tokio::test]
    async fn test_edit_and_remove_rate() {
        let h = Harness::new();
        let usd = h.store.add_rate("USD", 40.0).unwrap();

        h.text(ADMIN, "/edit_rate").await;
        h.press(ADMIN, &format!("edit_rate_{}", usd.id)).await;
        assert_eq!(h.state(ADMIN).kind(), crate::interface::StateKind::AwaitingRateUpdate);
        h.text(ADMIN, "42.25").await;
        let updated = h.store.get_rate(usd.id).unwrap();
        assert!((updated.rate - 42.25).abs() < f64::EPSILON);
        assert_eq!(h.last_text(), menus::rate_updated(&updated));

        h.text(ADMIN, "/rates").await;
        assert_eq!(h.last_text(), "USD — 42.25");

        h.text(ADMIN, "/remove_rate").await;
        h.press(ADMIN, &format!("del_rate_{}", usd.id)).await;
        assert_eq!(h.last_text(), menus::RATE_REMOVED);
        assert!(h.store.list_rates().unwrap().is_empty());

        h.text(ADMIN, "/remove_rate").await;
        assert_eq!(h.last_text(), menus::NO_RATES);
    }

    #[tokio::test]
    async fn test_unknown_rate_keeps_selection_open() {
        let h = Harness::new();
        h.store.add_rate("USD", 40.0).unwrap();
        h.album(OPERATOR, "Dress $50").await;

        h.press(OPERATOR, "rate_999").await;
        assert_eq!(h.last_text(), menus::RATE_NOT_FOUND);
        assert_eq!(h.state(OPERATOR), ConversationState::AwaitingRateSelection);
    }

    #[tokio::test]
    async fn test_live_rate_from_source() {
        let h = Harness::new();
        let mut source = MockExchangeRateSource::new();
        source.expect_fetch_rate().times(1).returning(|| Ok(40.0));
        let bot = RelayBot::new(
            h.bot.config().clone(),
            h.store.clone(),
            h.messenger.clone(),
        )
        .with_rate_source(Arc::new(source));

        bot.handle(Incoming::Photos {
            operator: Operator::private(OPERATOR),
            album_id: None,
            items: vec![PhotoItem::captioned("photo-a", "Dress $50")],
        })
        .await
        .unwrap();
        let keyboard = h.messenger.last_keyboard().unwrap();
        assert!(keyboard.tokens().contains(&"rate_live"));

        let message_id = h.messenger.last_message_id();
        bot.handle(Incoming::button(
            Operator::private(OPERATOR),
            message_id,
            "cb",
            "rate_live",
        ))
        .await
        .unwrap();
        assert_eq!(h.messenger.last_text().unwrap(), "Dress 2000 грн + вага\n");
    }

    #[tokio::test]
    async fn test_live_rate_failure_keeps_state() {
        let h = Harness::new();
        let mut source = MockExchangeRateSource::new();
        source
            .expect_fetch_rate()
            .returning(|| Err(RelayError::UpstreamUnavailable("HTTP 503".to_string())));
        let bot = RelayBot::new(
            h.bot.config().clone(),
            h.store.clone(),
            h.messenger.clone(),
        )
        .with_rate_source(Arc::new(source));

        bot.handle(Incoming::Photos {
            operator: Operator::private(OPERATOR),
            album_id: None,
            items: vec![PhotoItem::captioned("photo-a", "Dress $50")],
        })
        .await
        .unwrap();
        let message_id = h.messenger.last_message_id();
        bot.handle(Incoming::button(
            Operator::private(OPERATOR),
            message_id,
            "cb",
            "rate_live",
        ))
        .await
        .unwrap();

        assert_eq!(h.messenger.last_text().unwrap(), menus::RATE_FETCH_FAILED);
        assert_eq!(
            bot.sessions().get_or_create(OPERATOR).state,
            ConversationState::AwaitingRateSelection
        );
    }
}
