//! In-memory session state with a best-effort durable mirror.
//!
//! The memory copy is authoritative. Storage is read once by
//! [`SessionStore::initialize`] and written on every mutation; a failed write is
//! logged and never rolls back memory. Every mutation bumps a generation counter
//! so responses that started before a newer mutation can be discarded.

use super::{
    storage::{MemoryStorage, Storage, StorageError},
    types::{Role, UserProfile},
};
use secrecy::{ExposeSecret, SecretString};
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info, warn};

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the serialized user profile.
pub const USER_KEY: &str = "user";

/// Point-in-time view of the session used by the route guard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub role: Option<Role>,
}

/// Generation observed when a session-mutating operation started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionTicket(u64);

#[derive(Default)]
struct SessionState {
    token: Option<SecretString>,
    user: Option<UserProfile>,
    generation: u64,
}

impl SessionState {
    fn has_token(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|token| !token.expose_secret().is_empty())
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Shared handle to the process-wide session. Clones refer to the same state.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<Mutex<SessionState>>,
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    /// Creates an empty store backed by `storage`. Call [`Self::initialize`] to
    /// hydrate it.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            storage,
        }
    }

    /// Creates a store without durability, mostly for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hydrates memory from durable storage. Never fails: unreadable entries are
    /// logged and treated as absent, and a corrupt user record is removed from
    /// storage without touching the token.
    pub fn initialize(&self) {
        let token = match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(err) => {
                warn!("failed to read stored token: {err}");
                None
            }
        };

        let user = match self.storage.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!("discarding malformed stored user record: {err}");
                    if let Err(err) = self.storage.remove(USER_KEY) {
                        warn!("failed to remove malformed user record: {err}");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(err @ StorageError::Corrupt(_)) => {
                warn!("discarding malformed stored user record: {err}");
                if let Err(err) = self.storage.remove(USER_KEY) {
                    warn!("failed to remove malformed user record: {err}");
                }
                None
            }
            Err(err) => {
                warn!("failed to read stored user record: {err}");
                None
            }
        };

        let mut state = self.state();
        state.token = token.map(SecretString::from);
        state.user = user;
        state.bump();
        debug!(
            authenticated = state.has_token(),
            has_user = state.user.is_some(),
            "session hydrated"
        );
    }

    /// Replaces the token in memory and storage. The value is opaque.
    pub fn set_token(&self, token: impl Into<SecretString>) {
        let mut state = self.state();
        self.write_token(&mut state, token.into());
    }

    /// Replaces the cached user profile in memory and storage.
    pub fn set_user(&self, user: UserProfile) {
        let mut state = self.state();
        self.write_user(&mut state, user);
    }

    /// Clears token and user everywhere. Safe to call on an empty store.
    pub fn clear_token(&self) {
        let mut state = self.state();
        let was_authenticated = state.has_token();
        state.token = None;
        state.user = None;
        state.bump();

        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                warn!(key, "failed to clear stored session entry: {err}");
            }
        }

        if was_authenticated {
            info!("session cleared");
        }
    }

    /// True iff a non-empty token is held in memory. Storage is not consulted.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().has_token()
    }

    /// Current token, if any. Only the HTTP client should need this.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        let state = self.state();
        if state.has_token() {
            state.token.clone()
        } else {
            None
        }
    }

    /// Cached user profile. Always `None` while unauthenticated, whatever was
    /// stored before.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        let state = self.state();
        if state.has_token() {
            state.user.clone()
        } else {
            None
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user().map(|user| user.role)
    }

    /// Authentication flag and role taken under a single lock, so a concurrent
    /// `clear_token` cannot produce a mixed view.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        let authenticated = state.has_token();
        let role = if authenticated {
            state.user.as_ref().map(|user| user.role.clone())
        } else {
            None
        };
        SessionSnapshot {
            authenticated,
            role,
        }
    }

    /// Captures the current generation before starting an operation whose
    /// result will mutate the session.
    #[must_use]
    pub fn begin_mutation(&self) -> SessionTicket {
        SessionTicket(self.state().generation)
    }

    /// Applies `token` only if nothing mutated the session since `ticket`.
    /// Returns whether the token was applied.
    pub fn set_token_with_ticket(
        &self,
        ticket: SessionTicket,
        token: impl Into<SecretString>,
    ) -> bool {
        let mut state = self.state();
        if !Self::is_current(&state, ticket) {
            return false;
        }
        self.write_token(&mut state, token.into());
        true
    }

    /// Applies `user` only if nothing mutated the session since `ticket`.
    pub fn set_user_with_ticket(&self, ticket: SessionTicket, user: UserProfile) -> bool {
        let mut state = self.state();
        if !Self::is_current(&state, ticket) {
            return false;
        }
        self.write_user(&mut state, user);
        true
    }

    /// Applies a login result (token plus optional profile) as one mutation.
    /// Any previously cached profile is dropped when `user` is `None`.
    pub fn establish_with_ticket(
        &self,
        ticket: SessionTicket,
        token: impl Into<SecretString>,
        user: Option<UserProfile>,
    ) -> bool {
        let mut state = self.state();
        if !Self::is_current(&state, ticket) {
            return false;
        }

        self.write_token(&mut state, token.into());
        match user {
            Some(user) => {
                state.user = Some(user.clone());
                self.persist_user(&user);
            }
            None => {
                state.user = None;
                if let Err(err) = self.storage.remove(USER_KEY) {
                    warn!("failed to clear stored user record: {err}");
                }
            }
        }
        true
    }

    fn is_current(state: &SessionState, ticket: SessionTicket) -> bool {
        if state.generation == ticket.0 {
            true
        } else {
            debug!(
                ticket = ticket.0,
                generation = state.generation,
                "discarding superseded session update"
            );
            false
        }
    }

    fn write_token(&self, state: &mut SessionState, token: SecretString) {
        if let Err(err) = self.storage.set(TOKEN_KEY, token.expose_secret()) {
            warn!("failed to persist token: {err}");
        }
        state.token = Some(token);
        state.bump();
    }

    fn write_user(&self, state: &mut SessionState, user: UserProfile) {
        self.persist_user(&user);
        state.user = Some(user);
        state.bump();
    }

    fn persist_user(&self, user: &UserProfile) {
        match serde_json::to_string(user) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(USER_KEY, &raw) {
                    warn!("failed to persist user record: {err}");
                }
            }
            Err(err) => warn!("failed to encode user record: {err}"),
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("SessionStore")
            .field("token", &state.token.as_ref().map(|_| "***"))
            .field("user", &state.user)
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}
