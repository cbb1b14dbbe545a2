//! Converting a post and sending it out

use super::RelayBot;
use super::broadcast::DeliveryOutcome;
use super::editor::Caption;
use super::menus;
use super::router::{Input, Request};
use super::token::Token;
use crate::error::{RelayError, Result};
use crate::interface::{ConversationSession, ConversationState, LineAction};
use crate::pricing::PriceRewriter;
use crate::store::StoreError;
use tracing::{debug, info, warn};

impl RelayBot {
    /// A photo or album arrived: start over with its caption
    pub(super) async fn start_conversion(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let Input::Photos { items, album_id } = &request.input else {
            return Ok(());
        };

        let caption = items
            .iter()
            .filter_map(|item| item.caption.as_deref())
            .find(|caption| !caption.trim().is_empty());
        let Some(caption) = caption else {
            return self.notify(request, menus::PHOTOS_ONLY).await;
        };

        let media = items.iter().map(|item| item.photo_ref.clone()).collect();
        session.begin_conversion(caption, media);
        info!(
            album = album_id.as_deref().unwrap_or("-"),
            photos = items.len(),
            "conversion started"
        );

        let rates = self.store.list_rates()?;
        if rates.is_empty() && self.rate_source.is_none() {
            session.reset();
            return self.notify(request, menus::NO_RATES).await;
        }

        let keyboard = menus::rate_picker(&rates, self.rate_source.is_some());
        self.messenger
            .send_text(request.chat_id(), menus::CHOOSE_RATE, Some(&keyboard))
            .await?;
        Ok(())
    }

    pub(super) async fn reject_non_photo(
        &self,
        _session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        self.notify(request, menus::PHOTOS_ONLY).await
    }

    pub(super) async fn select_rate(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let Some(Token::Rate(rate_id)) = request.token() else {
            return Ok(());
        };

        match self.store.get_rate(rate_id) {
            Ok(rate) => self.apply_rate(session, request, &rate.name, rate.rate).await,
            Err(StoreError::NotFound(_)) => {
                let rates = self.store.list_rates()?;
                let keyboard = menus::rate_picker(&rates, self.rate_source.is_some());
                self.reply(request, menus::RATE_NOT_FOUND, Some(&keyboard))
                    .await
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(super) async fn select_live_rate(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let fetched = match &self.rate_source {
            Some(source) => source.fetch_rate().await,
            None => Err(RelayError::UpstreamUnavailable(
                "live rate disabled".to_string(),
            )),
        };

        match fetched {
            Ok(rate) => self.apply_rate(session, request, "ПриватБанк", rate).await,
            Err(e) => {
                warn!(error = %e, "live rate unavailable");
                let rates = self.store.list_rates()?;
                let keyboard = menus::rate_picker(&rates, self.rate_source.is_some());
                self.reply(request, menus::RATE_FETCH_FAILED, Some(&keyboard))
                    .await
            }
        }
    }

    /// Rewrite prices, echo the album back and show the caption with the main menu
    async fn apply_rate(
        &self,
        session: &mut ConversationSession,
        request: &Request,
        name: &str,
        rate: f64,
    ) -> Result<()> {
        let text = self.rewriter.rewrite(&session.source_caption, rate);
        debug!(
            prices = PriceRewriter::count_prices(&session.source_caption),
            rate,
            "caption converted"
        );
        session.caption = Caption::from_text(&text);
        session.state = ConversationState::Editing;

        self.reply(request, &menus::rate_chosen(name, rate), None)
            .await?;
        if let Err(e) = self
            .messenger
            .send_media_group(request.chat_id(), &session.media_refs, None)
            .await
        {
            warn!(error = %e, "failed to send album preview");
        }
        self.messenger
            .send_text(
                request.chat_id(),
                &session.caption.render(),
                Some(&menus::main_menu()),
            )
            .await?;
        Ok(())
    }

    pub(super) async fn show_edit_menu(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        self.reply(request, &session.caption.numbered(), Some(&menus::edit_menu()))
            .await
    }

    pub(super) async fn back_to_caption(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        session.state = ConversationState::Editing;
        session.pending_edit_target = None;
        self.show_caption(session, request).await
    }

    async fn show_caption(&self, session: &ConversationSession, request: &Request) -> Result<()> {
        self.reply(request, &session.caption.render(), Some(&menus::main_menu()))
            .await
    }

    async fn show_line_picker(
        &self,
        session: &mut ConversationSession,
        request: &Request,
        action: LineAction,
        text: &str,
    ) -> Result<()> {
        session.state = ConversationState::AwaitingLineTarget(action);
        let keyboard = menus::line_picker(&session.caption, action);
        self.reply(request, text, Some(&keyboard)).await
    }

    pub(super) async fn choose_insert_line(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        self.show_line_picker(session, request, LineAction::InsertBlank, menus::CHOOSE_LINE)
            .await
    }

    pub(super) async fn insert_blank_line(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let Some(Token::InsertAt(index)) = request.token() else {
            return Ok(());
        };

        match session.caption.insert_blank_line(index) {
            Ok(()) => {
                session.state = ConversationState::Editing;
                self.show_caption(session, request).await
            }
            Err(RelayError::MalformedInput(reason)) => {
                warn!(index, %reason, "line token out of range");
                self.show_line_picker(
                    session,
                    request,
                    LineAction::InsertBlank,
                    menus::LINE_NOT_FOUND,
                )
                .await
            }
            Err(e) => Err(e),
        }
    }

    pub(super) async fn choose_bold_line(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        self.show_line_picker(session, request, LineAction::Bold, menus::CHOOSE_LINE)
            .await
    }

    pub(super) async fn begin_bold(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let Some(Token::BoldLine(index)) = request.token() else {
            return Ok(());
        };

        let Some(line) = session.caption.line(index) else {
            warn!(index, "bold target out of range");
            return self
                .show_line_picker(session, request, LineAction::Bold, menus::LINE_NOT_FOUND)
                .await;
        };

        let prompt = menus::bold_prompt(line);
        session.pending_edit_target = Some(index);
        session.state = ConversationState::AwaitingBoldText;
        self.reply(request, &prompt, None).await
    }

    /// The operator typed the fragment to bold
    pub(super) async fn apply_bold(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        if request.dialog_text().is_none() {
            let line = session
                .pending_edit_target
                .and_then(|index| session.caption.line(index));
            let prompt = line.map_or_else(|| menus::ENTER_BOLD.to_string(), menus::bold_prompt);
            return self.reply(request, &prompt, None).await;
        }
        let fragment = request.text().unwrap_or_default();

        if let Some(index) = session.pending_edit_target.take() {
            match session.caption.apply_bold(index, fragment) {
                Ok(true) => {}
                Ok(false) => info!(index, "fragment not found, caption unchanged"),
                Err(e) => warn!(index, error = %e, "bold target vanished"),
            }
        }

        session.state = ConversationState::Editing;
        self.show_caption(session, request).await
    }

    /// Fan the album out to every channel
    pub(super) async fn broadcast(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        if session.media_refs.is_empty() {
            return self.notify(request, menus::ALBUM_MISSING).await;
        }

        let channels = self.store.list_channels()?;
        if channels.is_empty() {
            return self.notify(request, menus::NO_CHANNELS).await;
        }

        let caption = session.caption.render();
        let report = self
            .dispatcher
            .broadcast(&caption, &session.media_refs, &channels)
            .await;

        // Cleared before the per-channel notices go out
        session.reset();

        for problem in report.problems() {
            let text = match &problem.outcome {
                DeliveryOutcome::Failed(failure) => {
                    menus::delivery_failed(&problem.identifier, failure)
                }
                _ => menus::channel_missing(&problem.identifier),
            };
            if let Err(e) = self.notify(request, &text).await {
                warn!(channel = %problem.identifier, error = %e, "could not report channel problem");
            }
        }

        self.reply(request, menus::SENT, None).await
    }

    pub(super) async fn cancel(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        session.reset();
        self.reply(request, menus::CANCELLED, None).await
    }
}
