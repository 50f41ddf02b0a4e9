//! Authenticated HTTP client for the remote storefront API.
//!
//! # Architecture
//!
//! Every outbound call flows through a single pipeline:
//!
//! 1. attach `Authorization: Bearer <access>` when a credential is held;
//! 2. dispatch and decode the `{ success, data, message? }` envelope;
//! 3. on HTTP 401, run the refresh protocol once and replay the original
//!    request with the new access token, returning the replay's result to
//!    the caller as if no failure occurred.
//!
//! Replay state travels as an explicit [`RequestAttempt`] field rather than
//! hidden mutation of a shared request object, so a request is refreshed at
//! most once and the exchange can never recurse.
//!
//! # Single-flight refresh
//!
//! Concurrent 401s coalesce into one exchange: the first failing request
//! takes the refresh latch and performs the exchange; requests that were
//! waiting on the latch observe the rotated credential and replay without a
//! second exchange. A failed exchange clears the credential store in the
//! same path and notifies the registered session-expired hook.

mod auth;
mod catalog;
mod orders;

pub use auth::AuthPayload;
pub use catalog::{PageInfo, Product, ProductPage, ProductVariant};
pub use orders::{Order, OrderInput, OrderItemInput, ShippingAddress};

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::storage::StorageError;
use crate::tokens::{CredentialPair, TokenStore};

use catalog::CatalogCacheValue;

/// Errors surfaced by the request pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable credential: nothing stored, or the retried request was
    /// rejected again.
    #[error("not authenticated")]
    Unauthenticated,

    /// The refresh exchange was rejected; the credential store has been
    /// cleared and the caller must re-authenticate.
    #[error("session expired: refresh was rejected")]
    RefreshExpired,

    /// Transport-level failure, including timeouts. Never retried by the
    /// pipeline.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-401 error response, passed through verbatim.
    #[error("remote error ({status}): {message}")]
    Remote {
        status: StatusCode,
        message: String,
    },

    /// The response body did not match the envelope contract.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Persisting or clearing credentials failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Response envelope returned by every resource endpoint.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

/// One outbound request, with its replay state.
#[derive(Debug, Clone)]
struct RequestAttempt {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    /// Set once the request has been replayed after a refresh; a marked
    /// attempt that still gets a 401 fails instead of looping.
    is_retry: bool,
}

impl RequestAttempt {
    fn new(method: Method, path: &str, body: Option<serde_json::Value>) -> Self {
        Self {
            method,
            path: path.to_string(),
            body,
            is_retry: false,
        }
    }
}

type SessionExpiredHook = Box<dyn Fn() + Send + Sync>;

/// Client for the remote storefront API.
///
/// Cheaply cloneable; clones share the credential store, the refresh latch,
/// and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    /// Serializes refresh exchanges (single-flight).
    refresh_latch: Mutex<()>,
    on_session_expired: OnceLock<SessionExpiredHook>,
    catalog_cache: Cache<String, CatalogCacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let catalog_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                tokens,
                refresh_latch: Mutex::new(()),
                on_session_expired: OnceLock::new(),
                catalog_cache,
            }),
        })
    }

    /// The credential store backing this client.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Register the hook invoked when the session becomes unrecoverable
    /// (refresh rejected). The UI layer uses this to route back to its login
    /// entry point. Only the first registration takes effect.
    pub fn set_session_expired_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        let _ = self.inner.on_session_expired.set(Box::new(hook));
    }

    // =========================================================================
    // Typed verbs
    // =========================================================================

    /// `GET` a resource.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the pipeline rules.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(RequestAttempt::new(Method::GET, path, None)).await
    }

    /// `POST` a resource.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the pipeline rules.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        self.send(RequestAttempt::new(Method::POST, path, Some(body)))
            .await
    }

    /// `PUT` a resource.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the pipeline rules.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        self.send(RequestAttempt::new(Method::PUT, path, Some(body)))
            .await
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the pipeline rules.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(RequestAttempt::new(Method::DELETE, path, None))
            .await
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Run one attempt through the pipeline, refreshing and replaying at
    /// most once on 401.
    async fn send<T: DeserializeOwned>(&self, mut attempt: RequestAttempt) -> Result<T, ApiError> {
        let stale = self.inner.tokens.get().map(|pair| pair.access_token);

        let response = self.dispatch(&attempt, stale.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return decode_envelope(response).await;
        }

        if attempt.is_retry {
            return Err(ApiError::Unauthenticated);
        }
        attempt.is_retry = true;

        let fresh = self.refresh_access_token(stale.as_deref()).await?;
        debug!(path = %attempt.path, "replaying request with refreshed credential");

        let response = self.dispatch(&attempt, Some(&fresh)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthenticated);
        }
        decode_envelope(response).await
    }

    /// Dispatch one attempt over the wire with the given access token.
    async fn dispatch(
        &self,
        attempt: &RequestAttempt,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(&attempt.path);

        let mut request = self.inner.http.request(attempt.method.clone(), url);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &attempt.body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Obtain an access token known to be newer than `stale`.
    ///
    /// Takes the refresh latch, then re-reads the store: if the credential
    /// already changed, a concurrent caller completed the exchange while we
    /// waited and its result is reused. Otherwise the refresh token is
    /// exchanged; N concurrent 401s therefore produce exactly one exchange.
    #[instrument(skip_all)]
    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let _guard = self.inner.refresh_latch.lock().await;

        let current = self.inner.tokens.get();
        if let Some(pair) = &current
            && Some(pair.access_token.as_str()) != stale
        {
            debug!("reusing credential refreshed by a concurrent request");
            return Ok(pair.access_token.clone());
        }

        let Some(pair) = current else {
            // Nothing to exchange; the store stays empty.
            return Err(ApiError::Unauthenticated);
        };

        debug!("exchanging refresh token");
        match self.exchange_refresh_token(&pair.refresh_token).await {
            Ok(new_pair) => {
                let access = new_pair.access_token.clone();
                self.inner.tokens.set(new_pair)?;
                Ok(access)
            }
            Err(error) => {
                // A failed refresh invalidates the whole pair: clear in the
                // same path so the stale access token can never be reused.
                warn!(%error, "refresh exchange failed, clearing credentials");
                if let Err(storage_error) = self.inner.tokens.clear() {
                    warn!(%storage_error, "failed to remove persisted credentials");
                }
                if let Some(hook) = self.inner.on_session_expired.get() {
                    hook();
                }
                Err(error)
            }
        }
    }

    /// Exchange the refresh token for a new credential pair.
    ///
    /// Issued as a bare request, outside `send`: the exchange carries no
    /// bearer token and is never itself refreshed or replayed.
    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<CredentialPair, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct RefreshRequest<'a> {
            refresh_token: &'a str,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RefreshPayload {
            access_token: String,
            refresh_token: String,
        }

        let response = self
            .inner
            .http
            .post(self.endpoint("/auth/refresh"))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::RefreshExpired);
        }

        let envelope: ApiEnvelope<RefreshPayload> =
            response.json().await.map_err(|_| ApiError::RefreshExpired)?;
        let payload = match envelope {
            ApiEnvelope {
                success: true,
                data: Some(payload),
                ..
            } => payload,
            _ => return Err(ApiError::RefreshExpired),
        };

        Ok(CredentialPair::new(
            payload.access_token,
            payload.refresh_token,
        ))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    pub(crate) fn catalog_cache(&self) -> &Cache<String, CatalogCacheValue> {
        &self.inner.catalog_cache
    }
}

/// Decode a non-401 response into the envelope's payload.
async fn decode_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&text)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        return Err(ApiError::Remote { status, message });
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(&text)?;
    if !envelope.success {
        return Err(ApiError::Remote {
            status,
            message: envelope
                .message
                .unwrap_or_else(|| "request failed".to_string()),
        });
    }

    envelope.data.ok_or_else(|| ApiError::Remote {
        status,
        message: "no data in response".to_string(),
    })
}
