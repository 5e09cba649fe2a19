//! Sign-in and registration.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use shopfront_core::{Email, Identity};

use super::wire::{AuthResponse, LoginBody, RegisterBody};
use super::{ApiClient, ApiError, BearerToken};
use crate::identity::Session;

impl ApiClient {
    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for wrong credentials, or an error
    /// if the API request fails.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<Session, ApiError> {
        let url = self.endpoint(&["users", "login"])?;
        let body = LoginBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let response: AuthResponse = self
            .execute(self.request(Method::POST, url, None).json(&body))
            .await?;
        Ok(response.into())
    }

    /// Create an account and sign in to it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the server's message (for example
    /// an email that is already registered), or an error if the API request
    /// fails.
    #[instrument(skip(self, name, email, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<Session, ApiError> {
        let url = self.endpoint(&["users", "register"])?;
        let body = RegisterBody {
            name,
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let response: AuthResponse = self
            .execute(self.request(Method::POST, url, None).json(&body))
            .await?;
        Ok(response.into())
    }
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            identity: Identity {
                id: response.id,
                name: response.name,
                email: response.email,
            },
            token: BearerToken::new(response.token),
        }
    }
}
