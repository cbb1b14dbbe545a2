//! Session management for operators
//!
//! Each operator owns one [`ConversationSession`]; sessions of different
//! operators never share state, so the store only needs a map lock.

use crate::bot::editor::Caption;
use crate::error::{Result, RelayError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// What a line picker is choosing a line for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineAction {
    InsertBlank,
    Bold,
}

/// Where the operator is in a conversation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingRateSelection,
    Editing,
    AwaitingLineTarget(LineAction),
    AwaitingBoldText,
    AwaitingChannelToAdd,
    AwaitingChannelToRemove,
    AwaitingRateName,
    AwaitingRateValue { name: String },
    AwaitingRateConfirm { name: String, rate: f64 },
    AwaitingRateRemoval,
    AwaitingRateEditTarget,
    AwaitingRateUpdate { rate_id: i64, name: String },
}

/// Data-free discriminant of [`ConversationState`], used for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Idle,
    AwaitingRateSelection,
    Editing,
    AwaitingLineTarget(LineAction),
    AwaitingBoldText,
    AwaitingChannelToAdd,
    AwaitingChannelToRemove,
    AwaitingRateName,
    AwaitingRateValue,
    AwaitingRateConfirm,
    AwaitingRateRemoval,
    AwaitingRateEditTarget,
    AwaitingRateUpdate,
}

impl ConversationState {
    pub fn kind(&self) -> StateKind {
        match self {
            ConversationState::Idle => StateKind::Idle,
            ConversationState::AwaitingRateSelection => StateKind::AwaitingRateSelection,
            ConversationState::Editing => StateKind::Editing,
            ConversationState::AwaitingLineTarget(action) => StateKind::AwaitingLineTarget(*action),
            ConversationState::AwaitingBoldText => StateKind::AwaitingBoldText,
            ConversationState::AwaitingChannelToAdd => StateKind::AwaitingChannelToAdd,
            ConversationState::AwaitingChannelToRemove => StateKind::AwaitingChannelToRemove,
            ConversationState::AwaitingRateName => StateKind::AwaitingRateName,
            ConversationState::AwaitingRateValue { .. } => StateKind::AwaitingRateValue,
            ConversationState::AwaitingRateConfirm { .. } => StateKind::AwaitingRateConfirm,
            ConversationState::AwaitingRateRemoval => StateKind::AwaitingRateRemoval,
            ConversationState::AwaitingRateEditTarget => StateKind::AwaitingRateEditTarget,
            ConversationState::AwaitingRateUpdate { .. } => StateKind::AwaitingRateUpdate,
        }
    }
}

/// Per-operator conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub operator_id: i64,
    pub state: ConversationState,
    /// Caption as the operator posted it
    pub source_caption: String,
    /// Converted caption being edited
    pub caption: Caption,
    pub media_refs: Vec<String>,
    /// Line chosen for the pending bold edit
    pub pending_edit_target: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(operator_id: i64) -> Self {
        let now = Utc::now();
        Self {
            operator_id,
            state: ConversationState::Idle,
            source_caption: String::new(),
            caption: Caption::default(),
            media_refs: Vec::new(),
            pending_edit_target: None,
            created_at: now,
            last_active: now,
        }
    }

    /// Drop everything and return to idle
    pub fn reset(&mut self) {
        self.state = ConversationState::Idle;
        self.source_caption.clear();
        self.caption = Caption::default();
        self.media_refs.clear();
        self.pending_edit_target = None;
    }

    /// Start over with a freshly received album
    pub fn begin_conversion(&mut self, caption: impl Into<String>, media_refs: Vec<String>) {
        self.reset();
        self.source_caption = caption.into();
        self.media_refs = media_refs;
        self.state = ConversationState::AwaitingRateSelection;
    }

    pub fn update_activity(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        Utc::now() - self.last_active > max_age
    }
}

pub trait SessionStorage: Send + Sync {
    fn get(&self, operator_id: i64) -> Option<ConversationSession>;
    fn set(&self, session: ConversationSession) -> Result<()>;
    fn delete(&self, operator_id: i64) -> bool;
    fn cleanup_expired(&self, max_age: Duration) -> usize;
    fn active_sessions(&self) -> Vec<ConversationSession>;
}

pub struct InMemoryStorage {
    sessions: Arc<RwLock<HashMap<i64, ConversationSession>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStorage for InMemoryStorage {
    fn get(&self, operator_id: i64) -> Option<ConversationSession> {
        self.sessions.read().ok()?.get(&operator_id).cloned()
    }

    fn set(&self, session: ConversationSession) -> Result<()> {
        self.sessions
            .write()
            .map_err(|e| RelayError::Other(format!("Lock error: {e}")))?
            .insert(session.operator_id, session);
        Ok(())
    }

    fn delete(&self, operator_id: i64) -> bool {
        self.sessions
            .write()
            .ok()
            .and_then(|mut sessions| sessions.remove(&operator_id))
            .is_some()
    }

    fn cleanup_expired(&self, max_age: Duration) -> usize {
        let Ok(mut sessions) = self.sessions.write() else {
            return 0;
        };

        let initial_count = sessions.len();
        sessions.retain(|_, session| !session.is_expired(max_age));
        initial_count - sessions.len()
    }

    fn active_sessions(&self) -> Vec<ConversationSession> {
        self.sessions
            .read()
            .ok()
            .map(|sessions| sessions.values().cloned().collect())
            .unwrap_or_default()
    }
}

pub struct SessionManager {
    storage: Box<dyn SessionStorage>,
    session_ttl: Duration,
}

impl SessionManager {
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            storage: Box::new(InMemoryStorage::new()),
            session_ttl,
        }
    }

    /// Current session of the operator, or a fresh idle one if missing or expired
    pub fn get_or_create(&self, operator_id: i64) -> ConversationSession {
        match self.storage.get(operator_id) {
            Some(session) if !session.is_expired(self.session_ttl) => session,
            _ => ConversationSession::new(operator_id),
        }
    }

    pub fn get(&self, operator_id: i64) -> Option<ConversationSession> {
        self.storage.get(operator_id)
    }

    pub fn update(&self, mut session: ConversationSession) -> Result<()> {
        session.update_activity();
        self.storage.set(session)
    }

    pub fn delete(&self, operator_id: i64) -> bool {
        self.storage.delete(operator_id)
    }

    pub fn cleanup_expired(&self) -> usize {
        self.storage.cleanup_expired(self.session_ttl)
    }

    pub fn active_count(&self) -> usize {
        self.storage.active_sessions().len()
    }
}
