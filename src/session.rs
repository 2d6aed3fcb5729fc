use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::ApiClient;
use crate::models::{Session, User};
use crate::storage::{SessionStorage, TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Persisted state has not been read yet.
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(session) => Some(&session.user),
            _ => None,
        }
    }
}

/// Result of a session operation. Failures carry a message ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome<T = ()> {
    Success(T),
    Failure(String),
}

impl<T> AuthOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success(_))
    }
}

/// Process-wide owner of the login. The persisted record is the source of
/// truth: state is re-derived from it on every read, so a 401 that wipes
/// storage inside the HTTP adapter is visible here immediately.
pub struct SessionStore {
    client: ApiClient,
    restored: AtomicBool,
}

impl SessionStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            restored: AtomicBool::new(false),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn storage(&self) -> &Arc<dyn SessionStorage> {
        self.client.storage()
    }

    /// Read the persisted session. Does not contact the server; a stale token
    /// is discovered on its first use.
    pub fn restore(&self) -> SessionState {
        match (self.storage().get(TOKEN_KEY), self.storage().get(USER_KEY)) {
            (Ok(token), Ok(user)) if token.is_some() != user.is_some() => {
                tracing::warn!("Found half of a persisted session, discarding it");
                if let Err(e) = self.storage().clear_session() {
                    tracing::error!("Failed to clear orphaned session: {}", e);
                }
            }
            (Ok(Some(_)), Ok(Some(user))) if serde_json::from_str::<User>(&user).is_err() => {
                tracing::warn!("Persisted user record is unreadable, discarding session");
                if let Err(e) = self.storage().clear_session() {
                    tracing::error!("Failed to clear unreadable session: {}", e);
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Could not read persisted session: {}", e);
            }
            _ => {}
        }
        self.restored.store(true, Ordering::SeqCst);
        let state = self.state();
        if let Some(user) = state.user() {
            tracing::info!("Restored session for {}", user.username);
        }
        state
    }

    pub fn state(&self) -> SessionState {
        if !self.restored.load(Ordering::SeqCst) {
            return SessionState::Loading;
        }
        match self.storage().load_session() {
            Ok(Some(session)) => SessionState::Authenticated(session),
            Ok(None) => SessionState::Unauthenticated,
            Err(e) => {
                tracing::warn!("Could not read persisted session: {}", e);
                SessionState::Unauthenticated
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> AuthOutcome<User> {
        let result = self.client.register(username, email, password).await;
        self.adopt(result.map(Session::from), "Registration failed")
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome<User> {
        let result = self.client.login(email, password).await;
        self.adopt(result.map(Session::from), "Login failed")
    }

    fn adopt(&self, result: crate::error::ClientResult<Session>, fallback: &str) -> AuthOutcome<User> {
        let session = match result {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!("{}: {}", fallback, e);
                return AuthOutcome::Failure(e.user_message(fallback));
            }
        };
        if let Err(e) = self.storage().save_session(&session) {
            tracing::error!("Failed to persist session: {}", e);
            return AuthOutcome::Failure(e.user_message(fallback));
        }
        self.restored.store(true, Ordering::SeqCst);
        tracing::info!("Logged in as {}", session.user.username);
        AuthOutcome::Success(session.user)
    }

    pub fn logout(&self) {
        if let Err(e) = self.storage().clear_session() {
            tracing::error!("Failed to clear persisted session: {}", e);
        }
        self.restored.store(true, Ordering::SeqCst);
    }

    /// Best effort; a failure here never undoes the login that preceded it.
    pub async fn update_location(&self, latitude: f64, longitude: f64) -> AuthOutcome {
        match self.client.update_location(latitude, longitude).await {
            Ok(()) => AuthOutcome::Success(()),
            Err(e) => {
                tracing::warn!("Location update failed: {}", e);
                AuthOutcome::Failure(e.user_message("Failed to update location"))
            }
        }
    }
}
