//! Runtime aggregate wiring the client together.
//!
//! Replaces ambient singletons with an explicitly constructed object: config
//! builds the storage backend, the token store loads from it, and the API
//! client, cart engine, and session are assembled around them. Callers own
//! the runtime and inject it where state is needed.

use std::sync::Arc;

use thiserror::Error;

use sandpiper_core::Email;

use crate::api::{ApiClient, ApiError};
use crate::cart::CartEngine;
use crate::config::ClientConfig;
use crate::session::{Session, User};
use crate::storage::{FileStorage, StorageBackend, StorageError};
use crate::tokens::TokenStore;

/// Errors that can occur while assembling the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The storage backend could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The API client could not be built.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
}

/// The assembled storefront client runtime.
pub struct StorefrontRuntime {
    config: ClientConfig,
    api: ApiClient,
    cart: CartEngine,
    session: Session,
}

impl StorefrontRuntime {
    /// Initialize the runtime with file-backed persistence under the
    /// configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or HTTP client cannot be set
    /// up.
    pub fn init(config: ClientConfig) -> Result<Self, RuntimeError> {
        let storage: Arc<dyn StorageBackend> = Arc::new(FileStorage::open(&config.data_dir)?);
        Self::with_storage(config, storage)
    }

    /// Initialize the runtime over an explicit storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(
        config: ClientConfig,
        storage: Arc<dyn StorageBackend>,
    ) -> Result<Self, RuntimeError> {
        let tokens = Arc::new(TokenStore::load(Arc::clone(&storage)));
        let api = ApiClient::new(&config, tokens)?;
        let cart = CartEngine::load(storage);

        Ok(Self {
            config,
            api,
            cart,
            session: Session::new(),
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The authenticated API client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The cart engine.
    #[must_use]
    pub const fn cart(&self) -> &CartEngine {
        &self.cart
    }

    /// The cart engine, mutably.
    pub const fn cart_mut(&mut self) -> &mut CartEngine {
        &mut self.cart
    }

    /// The current session identity.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Log in and populate the session identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the login request fails.
    pub async fn login(&mut self, email: &Email, password: &str) -> Result<User, ApiError> {
        let user = self.api.login(email, password).await?;
        self.session.set_user(Some(user.clone()));
        Ok(user)
    }

    /// Restore the session identity from the backend, if credentials are
    /// held.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile request fails; the session is left
    /// unauthenticated in that case.
    pub async fn restore_session(&mut self) -> Result<Option<&User>, ApiError> {
        if !self.api.tokens().is_authenticated() {
            self.session.clear();
            return Ok(None);
        }
        let user = self.api.current_user().await?;
        self.session.set_user(Some(user));
        Ok(self.session.user())
    }

    /// Tear down the session: discard credentials and identity.
    ///
    /// The cart is untouched; its persistence is independent of the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted credentials cannot be removed.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.api.logout()?;
        self.session.clear();
        Ok(())
    }
}
