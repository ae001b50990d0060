//! In-memory reactive store.
//!
//! Holds the slice of application state the presence client reads and
//! reduces the actions it dispatches.

use parking_lot::RwLock;
use presence_core::{
    ActiveUser, ActiveUsers, PresenceStatus, ReactiveStore, StoreAction, StoreSnapshot, UserId,
};
use std::collections::VecDeque;
use std::sync::Arc;

/// Dispatched actions retained by default
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Authenticated user as seen by the login slice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginUser {
    pub id: UserId,
    pub status: PresenceStatus,
    pub status_text: Option<String>,
}

impl LoginUser {
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            status: PresenceStatus::Offline,
            status_text: None,
        }
    }
}

/// Full store state
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub server_version: Option<String>,
    pub login: Option<LoginUser>,
    pub active_users: ActiveUsers,
}

impl StoreState {
    fn reduce(&mut self, action: &StoreAction) {
        match action {
            StoreAction::SetActiveUsers { users } => {
                self.active_users.merge(users.clone());
            }
            StoreAction::SetUser {
                status,
                status_text,
            } => {
                if let Some(login) = self.login.as_mut() {
                    login.status = *status;
                    login.status_text.clone_from(status_text);
                }
            }
        }
    }
}

/// In-memory store implementing [`ReactiveStore`]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    /// Most recent actions, oldest first
    history: RwLock<VecDeque<StoreAction>>,
    history_limit: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store keeping at most `limit` dispatched actions
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            history: RwLock::new(VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT))),
            history_limit: limit,
        }
    }

    /// Create an empty store wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Record the version of the server the client connected to
    pub fn set_server_version(&self, version: impl Into<String>) {
        self.state.write().server_version = Some(version.into());
    }

    /// Forget the server version (disconnect)
    pub fn clear_server_version(&self) {
        self.state.write().server_version = None;
    }

    /// Mark a user as authenticated
    pub fn login(&self, id: UserId) {
        self.state.write().login = Some(LoginUser::new(id));
    }

    pub fn logout(&self) {
        self.state.write().login = None;
    }

    /// Clone the full state
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.state.read().clone()
    }

    /// Current active-users map
    #[must_use]
    pub fn active_users(&self) -> ActiveUsers {
        self.state.read().active_users.clone()
    }

    /// Status of one user in the active-users map
    #[must_use]
    pub fn active_user(&self, id: &UserId) -> Option<ActiveUser> {
        self.state.read().active_users.get(id).cloned()
    }

    /// Current login slice
    #[must_use]
    pub fn login_user(&self) -> Option<LoginUser> {
        self.state.read().login.clone()
    }

    /// Most recent dispatched actions, oldest first
    #[must_use]
    pub fn dispatched(&self) -> Vec<StoreAction> {
        self.history.read().iter().cloned().collect()
    }
}

impl ReactiveStore for MemoryStore {
    fn state(&self) -> StoreSnapshot {
        let state = self.state.read();
        StoreSnapshot {
            server_version: state.server_version.clone(),
            login_user: state.login.as_ref().map(|login| login.id.clone()),
        }
    }

    fn dispatch(&self, action: StoreAction) {
        self.state.write().reduce(&action);

        tracing::trace!(action = ?action, "Store action dispatched");

        if self.history_limit == 0 {
            return;
        }
        let mut history = self.history.write();
        if history.len() == self.history_limit {
            history.pop_front();
        }
        history.push_back(action);
    }
}
