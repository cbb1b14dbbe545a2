//! Channel and rate management dialogs

use super::RelayBot;
use super::broadcast::numeric_chat_id;
use super::commands::Command;
use super::menus;
use super::router::Request;
use super::token::Token;
use crate::error::Result;
use crate::interface::{ConversationSession, ConversationState};
use crate::pricing::parse_rate;
use crate::store::StoreError;
use tracing::{debug, info};

const MAX_RATE_NAME_CHARS: usize = 32;

impl RelayBot {
    pub(super) async fn cmd_start(
        &self,
        _session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        self.notify(request, menus::GREETING).await
    }

    pub(super) async fn cmd_help(
        &self,
        _session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        self.notify(request, Command::help_text()).await
    }

    pub(super) async fn cmd_add_channel(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        session.state = ConversationState::AwaitingChannelToAdd;
        self.notify(request, menus::ENTER_CHANNEL_ID).await
    }

    pub(super) async fn add_channel(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let Some(identifier) = request.dialog_text() else {
            return self.notify(request, menus::ENTER_CHANNEL_ID).await;
        };
        session.reset();

        let text = match self.store.add_channel(identifier) {
            Ok(channel) => {
                info!(channel = %channel.identifier, "channel added");
                if numeric_chat_id(&channel.identifier).is_some() {
                    menus::CHANNEL_ADDED.to_string()
                } else {
                    format!("{}\n{}", menus::CHANNEL_ADDED, menus::CHANNEL_NOT_NUMERIC)
                }
            }
            Err(StoreError::Duplicate(_)) => menus::CHANNEL_EXISTS.to_string(),
            Err(e) => return Err(e.into()),
        };
        self.notify(request, &text).await
    }

    pub(super) async fn cmd_remove_channel(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        session.state = ConversationState::AwaitingChannelToRemove;
        self.notify(request, menus::ENTER_CHANNEL_ID).await
    }

    pub(super) async fn remove_channel(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let Some(identifier) = request.dialog_text() else {
            return self.notify(request, menus::ENTER_CHANNEL_ID).await;
        };
        session.reset();

        let text = match self.store.remove_channel(identifier) {
            Ok(()) => {
                info!(channel = identifier, "channel removed");
                menus::CHANNEL_REMOVED
            }
            Err(StoreError::NotFound(_)) => menus::CHANNEL_NOT_FOUND,
            Err(e) => return Err(e.into()),
        };
        self.notify(request, text).await
    }

    pub(super) async fn cmd_list_channels(
        &self,
        _session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let channels = self.store.list_channels()?;
        self.notify(request, &menus::channels_listing(&channels))
            .await
    }

    pub(super) async fn cmd_add_rate(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        session.state = ConversationState::AwaitingRateName;
        self.notify(request, menus::ENTER_RATE_NAME).await
    }

    pub(super) async fn enter_rate_name(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let name = request.dialog_text().unwrap_or_default();
        let chars = name.chars().count();
        if chars == 0 || chars > MAX_RATE_NAME_CHARS {
            return self.notify(request, menus::BAD_RATE_NAME).await;
        }

        session.state = ConversationState::AwaitingRateValue {
            name: name.to_string(),
        };
        self.notify(request, &menus::rate_value_prompt(name)).await
    }

    pub(super) async fn enter_rate_value(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let ConversationState::AwaitingRateValue { name } = &session.state else {
            return Ok(());
        };
        let name = name.clone();

        let rate = match parse_rate(request.dialog_text().unwrap_or_default()) {
            Ok(rate) => rate,
            Err(e) => {
                debug!(error = %e, "rejected rate value");
                return self.notify(request, menus::BAD_RATE_VALUE).await;
            }
        };

        let prompt = menus::confirm_rate_prompt(&name, rate);
        session.state = ConversationState::AwaitingRateConfirm { name, rate };
        self.messenger
            .send_text(request.chat_id(), &prompt, Some(&menus::confirm_rate_menu()))
            .await?;
        Ok(())
    }

    pub(super) async fn confirm_rate(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let ConversationState::AwaitingRateConfirm { name, rate } = &session.state else {
            return Ok(());
        };
        let (name, rate) = (name.clone(), *rate);
        session.reset();

        let text = match self.store.add_rate(&name, rate) {
            Ok(added) => {
                info!(rate_id = added.id, name = %added.name, rate = added.rate, "rate added");
                menus::rate_added(&name)
            }
            Err(StoreError::Duplicate(_)) => menus::rate_exists(&name),
            Err(e) => return Err(e.into()),
        };
        self.reply(request, &text, None).await
    }

    pub(super) async fn cmd_remove_rate(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let rates = self.store.list_rates()?;
        if rates.is_empty() {
            return self.notify(request, menus::NO_RATES).await;
        }

        session.state = ConversationState::AwaitingRateRemoval;
        let keyboard = menus::rate_admin_picker(&rates, Token::RemoveRate);
        self.messenger
            .send_text(request.chat_id(), menus::CHOOSE_RATE_TO_REMOVE, Some(&keyboard))
            .await?;
        Ok(())
    }

    pub(super) async fn remove_rate(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let Some(Token::RemoveRate(rate_id)) = request.token() else {
            return Ok(());
        };
        session.reset();

        let text = match self.store.remove_rate(rate_id) {
            Ok(()) => {
                info!(rate_id, "rate removed");
                menus::RATE_REMOVED
            }
            Err(StoreError::NotFound(_)) => menus::RATE_NOT_FOUND,
            Err(e) => return Err(e.into()),
        };
        self.reply(request, text, None).await
    }

    pub(super) async fn cmd_edit_rate(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let rates = self.store.list_rates()?;
        if rates.is_empty() {
            return self.notify(request, menus::NO_RATES).await;
        }

        session.state = ConversationState::AwaitingRateEditTarget;
        let keyboard = menus::rate_admin_picker(&rates, Token::EditRate);
        self.messenger
            .send_text(request.chat_id(), menus::CHOOSE_RATE_TO_EDIT, Some(&keyboard))
            .await?;
        Ok(())
    }

    pub(super) async fn choose_rate_to_edit(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let Some(Token::EditRate(rate_id)) = request.token() else {
            return Ok(());
        };

        match self.store.get_rate(rate_id) {
            Ok(rate) => {
                session.state = ConversationState::AwaitingRateUpdate {
                    rate_id: rate.id,
                    name: rate.name.clone(),
                };
                self.reply(request, &menus::rate_edit_prompt(&rate), None)
                    .await
            }
            Err(StoreError::NotFound(_)) => {
                session.reset();
                self.reply(request, menus::RATE_NOT_FOUND, None).await
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(super) async fn update_rate(
        &self,
        session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let ConversationState::AwaitingRateUpdate { rate_id, .. } = session.state else {
            return Ok(());
        };

        let value = match parse_rate(request.dialog_text().unwrap_or_default()) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "rejected rate value");
                return self.notify(request, menus::BAD_RATE_VALUE).await;
            }
        };
        session.reset();

        let text = match self.store.update_rate(rate_id, value) {
            Ok(rate) => {
                info!(rate_id, name = %rate.name, rate = rate.rate, "rate updated");
                menus::rate_updated(&rate)
            }
            Err(StoreError::NotFound(_)) => menus::RATE_NOT_FOUND.to_string(),
            Err(e) => return Err(e.into()),
        };
        self.notify(request, &text).await
    }

    pub(super) async fn cmd_list_rates(
        &self,
        _session: &mut ConversationSession,
        request: &Request,
    ) -> Result<()> {
        let rates = self.store.list_rates()?;
        self.notify(request, &menus::rates_listing(&rates)).await
    }
}
