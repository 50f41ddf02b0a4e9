//! Credential pair ownership and persistence.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{self, StorageBackend, StorageError};

/// An access/refresh credential pair issued by the remote API.
///
/// The access token authorizes individual API calls and is short-lived; the
/// refresh token is used solely to obtain a replacement pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    /// Short-lived token attached as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Longer-lived token exchanged at `/auth/refresh`.
    pub refresh_token: String,
    /// Unix timestamp recording when this pair was issued.
    pub obtained_at: i64,
}

impl CredentialPair {
    /// Create a pair stamped with the current time.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            obtained_at: Utc::now().timestamp(),
        }
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Exclusive owner of the current credential pair.
///
/// `set` and `clear` write through to durable storage before updating the
/// in-memory copy, so a restart reflects the latest state. The store itself
/// carries no refresh logic: it is mutated only by the auth endpoints on
/// login/logout and by the refresh protocol's success and failure paths.
pub struct TokenStore {
    storage: Arc<dyn StorageBackend>,
    current: RwLock<Option<CredentialPair>>,
}

impl TokenStore {
    /// Open the store, loading any persisted pair.
    ///
    /// A missing or unreadable snapshot starts the store empty rather than
    /// failing session start.
    #[must_use]
    pub fn load(storage: Arc<dyn StorageBackend>) -> Self {
        let current = match storage.load(storage::keys::AUTH) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(pair) => Some(pair),
                Err(error) => {
                    warn!(%error, "discarding unreadable credential snapshot");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                warn!(%error, "credential snapshot unavailable");
                None
            }
        };

        Self {
            storage,
            current: RwLock::new(current),
        }
    }

    /// The current pair, if any.
    #[must_use]
    pub fn get(&self) -> Option<CredentialPair> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a credential pair is currently held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the stored pair, persisting before the in-memory swap.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair cannot be persisted; the in-memory pair
    /// is left unchanged in that case.
    pub fn set(&self, pair: CredentialPair) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&pair)?;
        self.storage.store(storage::keys::AUTH, &raw)?;
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(pair);
        Ok(())
    }

    /// Drop the stored pair.
    ///
    /// The in-memory pair is cleared first so that no caller can observe a
    /// credential after the decision to discard it, even if the durable
    /// removal fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted snapshot cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.storage.remove(storage::keys::AUTH)
    }
}
