//! In-process mock of the remote storefront API.
//!
//! Spins up an `axum` server on an ephemeral port exposing the endpoints the
//! client runtime talks to: login, refresh, profile, catalog, and orders.
//! Token state lives in [`MockState`], which tests poke to simulate access
//! token expiry, refresh rejection, and to count refresh exchanges.
//!
//! The mock validates bearer tokens exactly: only the most recently issued
//! access token is accepted, and only the most recently issued refresh token
//! can be exchanged. A client that refreshes twice with the same token
//! therefore fails loudly.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

/// Email accepted by the mock login endpoint.
pub const TEST_EMAIL: &str = "shopper@example.com";

/// Password accepted by the mock login endpoint.
pub const TEST_PASSWORD: &str = "correct-horse";

/// Handle to a running mock API.
pub struct MockApi {
    /// Base URL of the listening server (e.g. `http://127.0.0.1:PORT`).
    pub base_url: String,
    /// Shared token state, for tests to inspect and manipulate.
    pub state: Arc<MockState>,
}

impl MockApi {
    /// Start the mock server on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock listener addr");

        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock api");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }
}

/// Token and counter state behind the mock endpoints.
pub struct MockState {
    valid_access: Mutex<String>,
    valid_refresh: Mutex<String>,
    generation: AtomicUsize,
    refresh_calls: AtomicUsize,
    reject_refresh: AtomicBool,
}

impl MockState {
    fn new() -> Self {
        Self {
            valid_access: Mutex::new("access-1".to_string()),
            valid_refresh: Mutex::new("refresh-1".to_string()),
            generation: AtomicUsize::new(1),
            refresh_calls: AtomicUsize::new(0),
            reject_refresh: AtomicBool::new(false),
        }
    }

    /// How many refresh exchanges the server has processed.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent refresh exchange fail, as if the refresh token
    /// had expired server-side.
    pub fn reject_refresh(&self) {
        self.reject_refresh.store(true, Ordering::SeqCst);
    }

    /// Invalidate the currently issued access token, as if it had expired.
    ///
    /// The refresh token stays valid; the next exchange issues the new
    /// access token.
    pub fn expire_access(&self) {
        let next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&self.valid_access) = format!("access-{next}");
    }

    fn rotate(&self) -> (String, String) {
        let next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{next}");
        let refresh = format!("refresh-{next}");
        *lock(&self.valid_access) = access.clone();
        *lock(&self.valid_refresh) = refresh.clone();
        (access, refresh)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", lock(&self.valid_access));
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == expected)
    }
}

fn lock(value: &Mutex<String>) -> std::sync::MutexGuard<'_, String> {
    value.lock().unwrap_or_else(PoisonError::into_inner)
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .route("/products/{slug}", get(product))
        .route("/orders", post(place_order))
        .with_state(state)
}

fn ok(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

fn fail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "success": false, "data": null, "message": message })),
    )
}

fn test_user() -> Value {
    json!({
        "_id": "u1",
        "email": TEST_EMAIL,
        "firstName": "Sand",
        "lastName": "Piper",
        "role": "user"
    })
}

async fn login(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    if email != Some(TEST_EMAIL) || password != Some(TEST_PASSWORD) {
        return fail(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let (access, refresh) = state.rotate();
    ok(json!({
        "user": test_user(),
        "accessToken": access,
        "refreshToken": refresh
    }))
}

async fn refresh(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    if state.reject_refresh.load(Ordering::SeqCst) {
        return fail(StatusCode::UNAUTHORIZED, "Refresh token expired");
    }

    let presented = body.get("refreshToken").and_then(Value::as_str);
    if presented != Some(lock(&state.valid_refresh).as_str()) {
        return fail(StatusCode::UNAUTHORIZED, "Unknown refresh token");
    }

    let access = lock(&state.valid_access).clone();
    let next = state.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let refresh = format!("refresh-{next}");
    *lock(&state.valid_refresh) = refresh.clone();

    ok(json!({ "accessToken": access, "refreshToken": refresh }))
}

async fn me(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Token expired");
    }
    ok(test_user())
}

async fn product(
    State(state): State<Arc<MockState>>,
    Path(slug): Path<String>,
) -> (StatusCode, Json<Value>) {
    // Catalog reads are public; auth state is irrelevant here.
    let _ = state;
    if slug != "desk-lamp" {
        return fail(StatusCode::NOT_FOUND, "Product not found");
    }
    ok(json!({
        "id": "p1",
        "name": "Desk Lamp",
        "slug": "desk-lamp",
        "description": "An articulated desk lamp.",
        "price": "49.00",
        "images": ["https://cdn.example/lamp.jpg"],
        "stock": 12,
        "variants": [
            { "id": "v1", "name": "Walnut", "price": "59.00", "stock": 3 }
        ]
    }))
}

async fn place_order(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Token expired");
    }
    let lines = body
        .get("items")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if lines == 0 {
        return fail(StatusCode::BAD_REQUEST, "Order has no items");
    }

    ok(json!({
        "id": "o1",
        "orderNumber": "SP-1001",
        "total": "42.00",
        "status": "pending",
        "paymentStatus": "pending"
    }))
}
