//! Public authentication surface of the client.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::dto::AuthResponse;
use crate::application::services::TokenStore;
use crate::application::use_cases::{LoginUseCase, RestoreSessionUseCase};
use crate::domain::entities::{LoginCredentials, Registration, UserProfile};
use crate::domain::errors::ApiError;
use crate::domain::ports::AuthPort;
use crate::domain::{SessionEvent, SessionState};

/// Drives the session state machine on top of the token store.
pub struct SessionManager {
    token_store: Arc<TokenStore>,
    login_use_case: LoginUseCase,
    restore_use_case: RestoreSessionUseCase,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    #[must_use]
    pub fn new(auth_port: Arc<dyn AuthPort>, token_store: Arc<TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            login_use_case: LoginUseCase::new(auth_port, token_store.clone()),
            restore_use_case: RestoreSessionUseCase::new(token_store.clone()),
            token_store,
            state,
        }
    }

    /// Authenticates with username and password.
    ///
    /// # Errors
    ///
    /// Returns the validation, credential or transport failure. The state
    /// is left as it was before the attempt.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let previous = self.begin();
        let result = self.login_use_case.execute(credentials).await;
        self.finish(previous, result)
    }

    /// Creates an account and authenticates as it.
    ///
    /// # Errors
    ///
    /// Same contract as [`SessionManager::login`].
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let previous = self.begin();
        let result = self.login_use_case.register(registration).await;
        self.finish(previous, result)
    }

    /// Ends the session. Calling it without a session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if persisted credentials could not be removed; the
    /// session is over in memory regardless.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let was = self.state.send_replace(SessionState::Unauthenticated);
        debug!(previous = %was, "Logging out");

        self.token_store.clear().await?;
        info!("Logged out");
        Ok(())
    }

    /// Adopts a persisted session without revalidating it.
    pub async fn restore(&self) -> Option<AuthResponse> {
        let response = self.restore_use_case.execute().await?;
        self.state.send_replace(SessionState::Authenticated);
        info!(source = %response.source, "Session restored");
        Some(response)
    }

    /// Marks the session as expired after a failed credential refresh.
    pub fn expire(&self) {
        let was = self.state.send_replace(SessionState::Unauthenticated);
        if was != SessionState::Unauthenticated {
            warn!("Session expired, login required");
        }
    }

    /// Forwards gateway expiry events into [`SessionManager::expire`].
    pub fn follow_events(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<SessionEvent>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired) => manager.expire(),
                    Ok(SessionEvent::Refreshed) => debug!("Credentials refreshed"),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session events lagged");
                        if !manager.token_store.is_present() {
                            manager.expire();
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Current state, reconciled against the token store.
    #[must_use]
    pub fn state(&self) -> SessionState {
        let present = self.token_store.is_present();
        self.state.send_if_modified(|state| {
            if *state == SessionState::Authenticated && !present {
                *state = SessionState::Unauthenticated;
                true
            } else {
                false
            }
        });
        *self.state.borrow()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        if self.is_authenticated() {
            self.token_store.user()
        } else {
            None
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn begin(&self) -> SessionState {
        self.state.send_replace(SessionState::Authenticating)
    }

    fn finish(
        &self,
        previous: SessionState,
        result: Result<AuthResponse, ApiError>,
    ) -> Result<AuthResponse, ApiError> {
        match &result {
            Ok(_) => {
                self.state.send_replace(SessionState::Authenticated);
            }
            Err(_) => {
                self.state.send_replace(previous);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{MockAuthPort, MockCredentialStorage};
    use crate::domain::entities::{Credential, CredentialPair, StoredSession};

    fn manager_with(
        auth_port: Arc<MockAuthPort>,
        storage: Arc<MockCredentialStorage>,
    ) -> (Arc<SessionManager>, Arc<TokenStore>) {
        let token_store = Arc::new(TokenStore::new(storage));
        (
            Arc::new(SessionManager::new(auth_port, token_store.clone())),
            token_store,
        )
    }

    fn manager(succeed: bool) -> (Arc<SessionManager>, Arc<TokenStore>) {
        manager_with(
            Arc::new(MockAuthPort::new(succeed)),
            Arc::new(MockCredentialStorage::new()),
        )
    }

    #[tokio::test]
    async fn test_login_transitions_to_authenticated() {
        let (manager, _) = manager(true);
        let mut states = manager.subscribe();

        manager
            .login(&LoginCredentials::new("user", "user123"))
            .await
            .unwrap();

        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), SessionState::Authenticated);
        assert!(manager.is_authenticated());
        assert_eq!(manager.current_user().unwrap().username, "user");
    }

    #[tokio::test]
    async fn test_failed_login_restores_previous_state() {
        let (manager, _) = manager(false);

        let result = manager.login(&LoginCredentials::new("user", "nope")).await;

        assert!(matches!(result, Err(ApiError::InvalidCredentials { .. })));
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_failed_relogin_keeps_existing_session() {
        let auth_port = Arc::new(MockAuthPort::new(true));
        let (manager, _) = manager_with(auth_port.clone(), Arc::new(MockCredentialStorage::new()));
        manager
            .login(&LoginCredentials::new("user", "user123"))
            .await
            .unwrap();

        auth_port.set_should_succeed(false);
        let result = manager.login(&LoginCredentials::new("user", "nope")).await;

        assert!(result.is_err());
        assert_eq!(manager.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (manager, token_store) = manager(true);
        manager
            .login(&LoginCredentials::new("user", "user123"))
            .await
            .unwrap();

        manager.logout().await.unwrap();
        manager.logout().await.unwrap();

        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert!(!token_store.is_present());
        assert!(manager.current_user().is_none());
    }

    #[tokio::test]
    async fn test_restore_is_optimistic() {
        let storage = Arc::new(MockCredentialStorage::with_session(StoredSession::new(
            CredentialPair::new(
                Credential::new_unchecked("possibly-expired"),
                Credential::new_unchecked("refresh"),
            ),
            None,
        )));
        let auth_port = Arc::new(MockAuthPort::new(true));
        let (manager, _) = manager_with(auth_port.clone(), storage);

        assert!(manager.restore().await.is_some());

        assert!(manager.is_authenticated());
        assert_eq!(auth_port.call_count(), 0);
    }

    #[tokio::test]
    async fn test_restore_without_session() {
        let (manager, _) = manager(true);

        assert!(manager.restore().await.is_none());
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_state_reconciles_with_cleared_store() {
        let (manager, token_store) = manager(true);
        manager
            .login(&LoginCredentials::new("user", "user123"))
            .await
            .unwrap();

        token_store.clear().await.unwrap();

        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_expiry_event_ends_session() {
        let (manager, _) = manager(true);
        manager
            .login(&LoginCredentials::new("user", "user123"))
            .await
            .unwrap();
        let (events, receiver) = broadcast::channel(4);
        let mut states = manager.subscribe();
        states.mark_unchanged();
        let handle = manager.follow_events(receiver);

        events.send(SessionEvent::Expired).unwrap();
        states.changed().await.unwrap();

        assert_eq!(*states.borrow(), SessionState::Unauthenticated);
        drop(events);
        handle.await.unwrap();
    }
}
