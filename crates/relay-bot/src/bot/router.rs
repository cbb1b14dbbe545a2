//! Explicit dispatch table
//!
//! Every interaction is resolved to a [`Trigger`] and looked up together with
//! the operator's current [`StateKind`]. The table is built once, and the
//! first matching route wins.

use crate::bot::RelayBot;
use crate::bot::commands::Command;
use crate::bot::token::{Token, TokenKind};
use crate::error::Result;
use crate::interface::{ConversationSession, Incoming, LineAction, Operator, PhotoItem, StateKind};
use futures::future::BoxFuture;

/// Operator input after command and token parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Text(String),
    Photos {
        album_id: Option<String>,
        items: Vec<PhotoItem>,
    },
    Button {
        message_id: i64,
        callback_id: String,
        /// `None` when the payload is not a token this bot issues
        token: Option<Token>,
    },
}

/// A routed interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub operator: Operator,
    pub input: Input,
}

impl Request {
    pub fn from_event(event: Incoming) -> Self {
        match event {
            Incoming::Text { operator, text } => {
                let input = match Command::parse(&text) {
                    Some(command) => Input::Command(command),
                    None => Input::Text(text),
                };
                Self { operator, input }
            }
            Incoming::Photos {
                operator,
                album_id,
                items,
            } => Self {
                operator,
                input: Input::Photos { album_id, items },
            },
            Incoming::Button {
                operator,
                message_id,
                callback_id,
                token,
            } => Self {
                operator,
                input: Input::Button {
                    message_id,
                    callback_id,
                    token: Token::parse(&token),
                },
            },
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.operator.chat_id
    }

    pub fn trigger(&self) -> Option<Trigger> {
        match &self.input {
            Input::Command(command) => Some(Trigger::Command(*command)),
            Input::Text(_) => Some(Trigger::Text),
            Input::Photos { .. } => Some(Trigger::Photos),
            Input::Button { token, .. } => token.map(|t| Trigger::Button(t.kind())),
        }
    }

    pub fn token(&self) -> Option<Token> {
        match &self.input {
            Input::Button { token, .. } => *token,
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.input {
            Input::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Trimmed dialog answer; unknown `/commands` and blank text don't count
    pub fn dialog_text(&self) -> Option<&str> {
        self.text()
            .map(str::trim)
            .filter(|text| !text.is_empty() && !text.starts_with('/'))
    }

    /// Message carrying the pressed button, if any
    pub fn menu_message_id(&self) -> Option<i64> {
        match &self.input {
            Input::Button { message_id, .. } => Some(*message_id),
            _ => None,
        }
    }
}

/// What kind of interaction arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Command(Command),
    Text,
    Photos,
    Button(TokenKind),
}

pub type Handler = for<'a> fn(
    &'a RelayBot,
    &'a mut ConversationSession,
    &'a Request,
) -> BoxFuture<'a, Result<()>>;

#[derive(Clone, Copy)]
pub struct Route {
    /// `None` matches any state
    pub state: Option<StateKind>,
    pub trigger: Trigger,
    pub admin_only: bool,
    pub handler: Handler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("state", &self.state)
            .field("trigger", &self.trigger)
            .field("admin_only", &self.admin_only)
            .finish_non_exhaustive()
    }
}

macro_rules! handler {
    ($method:ident) => {{
        fn call<'a>(
            bot: &'a RelayBot,
            session: &'a mut ConversationSession,
            request: &'a Request,
        ) -> BoxFuture<'a, Result<()>> {
            Box::pin(bot.$method(session, request))
        }
        call as Handler
    }};
}

#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, state: Option<StateKind>, trigger: Trigger, handler: Handler) -> &mut Self {
        let admin_only = match trigger {
            Trigger::Command(command) => command.is_admin_only(),
            _ => false,
        };
        self.routes.push(Route {
            state,
            trigger,
            admin_only,
            handler,
        });
        self
    }

    /// Route reachable only by administrators
    fn add_admin(&mut self, state: StateKind, trigger: Trigger, handler: Handler) -> &mut Self {
        self.add(Some(state), trigger, handler);
        if let Some(route) = self.routes.last_mut() {
            route.admin_only = true;
        }
        self
    }

    pub fn route(&self, state: StateKind, trigger: Trigger) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| r.trigger == trigger && r.state.is_none_or(|s| s == state))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The full conversation table
    pub fn standard() -> Self {
        use StateKind as S;
        use Trigger::{Button, Command as Cmd, Photos, Text};

        let mut router = Self::new();

        // Top-level commands work from any state
        router
            .add(None, Cmd(Command::Start), handler!(cmd_start))
            .add(None, Cmd(Command::Help), handler!(cmd_help))
            .add(None, Cmd(Command::Cancel), handler!(cancel))
            .add(None, Cmd(Command::AddChannel), handler!(cmd_add_channel))
            .add(None, Cmd(Command::RemoveChannel), handler!(cmd_remove_channel))
            .add(None, Cmd(Command::ListChannels), handler!(cmd_list_channels))
            .add(None, Cmd(Command::AddRate), handler!(cmd_add_rate))
            .add(None, Cmd(Command::RemoveRate), handler!(cmd_remove_rate))
            .add(None, Cmd(Command::EditRate), handler!(cmd_edit_rate))
            .add(None, Cmd(Command::ListRates), handler!(cmd_list_rates));

        // Caption conversion
        router
            .add(None, Photos, handler!(start_conversion))
            .add(Some(S::Idle), Text, handler!(reject_non_photo))
            .add(None, Button(TokenKind::Cancel), handler!(cancel))
            .add(
                Some(S::AwaitingRateSelection),
                Button(TokenKind::Rate),
                handler!(select_rate),
            )
            .add(
                Some(S::AwaitingRateSelection),
                Button(TokenKind::LiveRate),
                handler!(select_live_rate),
            )
            .add(Some(S::Editing), Button(TokenKind::Edit), handler!(show_edit_menu))
            .add(Some(S::Editing), Button(TokenKind::AddLine), handler!(choose_insert_line))
            .add(Some(S::Editing), Button(TokenKind::AddBold), handler!(choose_bold_line))
            .add(Some(S::Editing), Button(TokenKind::Send), handler!(broadcast))
            .add(Some(S::Editing), Button(TokenKind::Back), handler!(back_to_caption))
            .add(
                Some(S::AwaitingLineTarget(LineAction::InsertBlank)),
                Button(TokenKind::InsertAt),
                handler!(insert_blank_line),
            )
            .add(
                Some(S::AwaitingLineTarget(LineAction::InsertBlank)),
                Button(TokenKind::Back),
                handler!(back_to_caption),
            )
            .add(
                Some(S::AwaitingLineTarget(LineAction::Bold)),
                Button(TokenKind::BoldLine),
                handler!(begin_bold),
            )
            .add(
                Some(S::AwaitingLineTarget(LineAction::Bold)),
                Button(TokenKind::Back),
                handler!(back_to_caption),
            )
            .add(Some(S::AwaitingBoldText), Text, handler!(apply_bold));

        // Management sub-dialogs
        router
            .add_admin(S::AwaitingChannelToAdd, Text, handler!(add_channel))
            .add_admin(S::AwaitingChannelToRemove, Text, handler!(remove_channel))
            .add_admin(S::AwaitingRateName, Text, handler!(enter_rate_name))
            .add_admin(S::AwaitingRateValue, Text, handler!(enter_rate_value))
            .add_admin(
                S::AwaitingRateConfirm,
                Button(TokenKind::ConfirmRate),
                handler!(confirm_rate),
            )
            .add_admin(
                S::AwaitingRateRemoval,
                Button(TokenKind::RemoveRate),
                handler!(remove_rate),
            )
            .add_admin(
                S::AwaitingRateEditTarget,
                Button(TokenKind::EditRate),
                handler!(choose_rate_to_edit),
            )
            .add_admin(S::AwaitingRateUpdate, Text, handler!(update_rate));

        router
    }
}
