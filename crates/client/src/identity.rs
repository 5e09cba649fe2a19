//! Identity provider: who is signed in.
//!
//! The current [`AuthState`] is published on a `tokio::sync::watch`
//! channel. It starts out [`AuthState::Resolving`]; the cart store does not
//! load anything until it has moved on to `Guest` or `SignedIn`.

use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use shopfront_core::{Email, EmailError, Identity};

use crate::api::{ApiClient, ApiError, BearerToken};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::storage::{LocalStore, Storage, StorageError};

/// A signed-in shopper and the token proving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub token: BearerToken,
}

/// Where identity resolution stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Stored credentials have not been looked at yet.
    #[default]
    Resolving,
    /// Nobody is signed in.
    Guest,
    /// A shopper is signed in.
    SignedIn(Session),
}

impl AuthState {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Resolving)
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) => Some(session),
            Self::Resolving | Self::Guest => None,
        }
    }
}

/// Errors that can occur when signing in or registering.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The server refused the request; the message is meant for the shopper.
    #[error("{0}")]
    Rejected(String),

    #[error("Request failed: {0}")]
    Api(ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ApiError> for IdentityError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized(_) => Self::InvalidCredentials,
            ApiError::Rejected { message, .. } | ApiError::NotFound(message) => {
                Self::Rejected(message)
            }
            err => Self::Api(err),
        }
    }
}

/// Resolves, establishes and ends sessions.
pub struct IdentityProvider<S> {
    api: ApiClient,
    store: LocalStore<S>,
    state: watch::Sender<AuthState>,
}

impl<S: Storage> IdentityProvider<S> {
    /// A provider in the `Resolving` state.
    #[must_use]
    pub fn new(api: ApiClient, store: LocalStore<S>) -> Self {
        let (state, _) = watch::channel(AuthState::Resolving);
        Self { api, store, state }
    }

    /// Follow identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The current state.
    #[must_use]
    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Resolve identity from the stored token and cached profile.
    ///
    /// The token is not checked against the server here; an expired token
    /// shows up as `Unauthorized` on the first authenticated call.
    pub fn restore(&self) -> AuthState {
        let state = match self.store.session() {
            Some((token, identity)) => {
                set_sentry_user(&identity.id, Some(identity.email.as_str()));
                info!(user_id = %identity.id, "Restored session");
                AuthState::SignedIn(Session { identity, token })
            }
            None => AuthState::Guest,
        };
        self.state.send_replace(state.clone());
        state
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` for a wrong email or
    /// password, or another error if the request or storing the session
    /// fails.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Identity, IdentityError> {
        let email = Email::parse(email)?;
        let session = self.api.login(&email, password).await?;
        self.establish(session)
    }

    /// Create an account and sign in to it.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Rejected` with the server's message (for
    /// example an email that is already registered), or another error if
    /// the request or storing the session fails.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, IdentityError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IdentityError::Rejected("Name is required".to_string()));
        }
        let email = Email::parse(email)?;
        let session = self.api.register(name, &email, password).await?;
        self.establish(session)
    }

    /// Forget the session.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear_session() {
            warn!(error = %e, "Failed to remove stored session");
        }
        clear_sentry_user();
        add_breadcrumb("auth", "Logged out", None);
        self.state.send_replace(AuthState::Guest);
    }

    fn establish(&self, session: Session) -> Result<Identity, IdentityError> {
        self.store.save_session(&session.token, &session.identity)?;

        let identity = session.identity.clone();
        set_sentry_user(&identity.id, Some(identity.email.as_str()));
        add_breadcrumb("auth", "Signed in", Some(&[("user_id", identity.id.as_str())]));
        info!(user_id = %identity.id, "Signed in");

        self.state.send_replace(AuthState::SignedIn(session));
        Ok(identity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::storage::MemoryStorage;
    use shopfront_core::UserId;

    fn provider(storage: MemoryStorage) -> IdentityProvider<MemoryStorage> {
        // Nothing listens here; these tests never reach the network.
        let api = ApiClient::new(&ApiConfig::new("http://127.0.0.1:9/api").unwrap());
        IdentityProvider::new(api, LocalStore::new(storage))
    }

    fn identity() -> Identity {
        Identity {
            id: UserId::new("u1"),
            name: "Asha".into(),
            email: Email::parse("asha@example.com").unwrap(),
        }
    }

    #[test]
    fn test_starts_resolving() {
        let provider = provider(MemoryStorage::new());
        assert_eq!(provider.current(), AuthState::Resolving);
        assert!(!provider.current().is_resolved());
    }

    #[test]
    fn test_restore_without_session_is_guest() {
        let provider = provider(MemoryStorage::new());
        let mut rx = provider.subscribe();
        assert_eq!(provider.restore(), AuthState::Guest);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::Guest);
    }

    #[test]
    fn test_restore_stored_session() {
        let storage = MemoryStorage::new();
        LocalStore::new(storage.clone())
            .save_session(&BearerToken::new("tok"), &identity())
            .unwrap();

        let provider = provider(storage);
        let state = provider.restore();
        let session = state.session().unwrap();
        assert_eq!(session.identity, identity());
        assert_eq!(session.token.expose(), "tok");
    }

    #[test]
    fn test_logout_clears_session() {
        let storage = MemoryStorage::new();
        LocalStore::new(storage.clone())
            .save_session(&BearerToken::new("tok"), &identity())
            .unwrap();

        let provider = provider(storage.clone());
        provider.restore();
        provider.logout();

        assert_eq!(provider.current(), AuthState::Guest);
        assert!(LocalStore::new(storage).session().is_none());
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_email_before_calling_server() {
        let provider = provider(MemoryStorage::new());
        let err = provider
            .login("not-an-email", &SecretString::from("pw".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidEmail(EmailError::AtSymbol)));
    }

    #[test]
    fn test_api_error_mapping() {
        assert!(matches!(
            IdentityError::from(ApiError::Unauthorized("Invalid email or password".into())),
            IdentityError::InvalidCredentials
        ));
        let err = IdentityError::from(ApiError::Rejected {
            status: 400,
            message: "User already exists".into(),
        });
        assert_eq!(err.to_string(), "User already exists");
    }
}
