//! Account endpoints: login, registration, profile.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use sandpiper_core::Email;

use crate::session::User;
use crate::storage::StorageError;
use crate::tokens::CredentialPair;

use super::{ApiClient, ApiError};

/// Payload returned by `/auth/login` and `/auth/register`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

impl ApiClient {
    /// Log in with email and password.
    ///
    /// On success the returned credential pair is persisted into the token
    /// store and the normalized user is returned.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Remote` with the backend's message on rejected
    /// credentials, or any other pipeline error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<User, ApiError> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            email: &'a str,
            password: &'a str,
        }

        let payload: AuthPayload = self
            .post(
                "/auth/login",
                &LoginRequest {
                    email: email.as_str(),
                    password,
                },
            )
            .await?;

        self.tokens().set(CredentialPair::new(
            payload.access_token,
            payload.refresh_token,
        ))?;

        Ok(payload.user)
    }

    /// Register a new account and log it in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Remote` with the backend's message if the account
    /// cannot be created, or any other pipeline error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &Email,
        password: &str,
    ) -> Result<User, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct RegisterRequest<'a> {
            first_name: &'a str,
            last_name: &'a str,
            email: &'a str,
            password: &'a str,
        }

        let payload: AuthPayload = self
            .post(
                "/auth/register",
                &RegisterRequest {
                    first_name,
                    last_name,
                    email: email.as_str(),
                    password,
                },
            )
            .await?;

        self.tokens().set(CredentialPair::new(
            payload.access_token,
            payload.refresh_token,
        ))?;

        Ok(payload.user)
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` when no session is held.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/auth/me").await
    }

    /// Log out locally by discarding the credential pair.
    ///
    /// The cart is deliberately untouched: cart persistence is independent
    /// of session state.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted credentials cannot be removed.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.tokens().clear()
    }
}
