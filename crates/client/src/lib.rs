//! Sandpiper storefront client runtime.
//!
//! Manages the two stateful concerns every surface of the storefront shares:
//!
//! - an authenticated request pipeline that attaches the current access
//!   token, coalesces concurrent 401s into a single-flight refresh exchange,
//!   and transparently replays the failed request ([`api::ApiClient`]);
//! - a cart engine with deterministic merge semantics and write-through
//!   persistence ([`cart::CartEngine`]).
//!
//! Around them sit the credential store ([`tokens::TokenStore`]), durable
//! key-value storage ([`storage`]), and the derived session identity
//! ([`session::Session`]). [`runtime::StorefrontRuntime`] assembles the
//! whole client with an explicit lifecycle: init at session start, logout
//! teardown, no ambient globals.
//!
//! # Example
//!
//! ```rust,ignore
//! use sandpiper_client::{ClientConfig, StorefrontRuntime};
//! use sandpiper_core::Email;
//!
//! let mut runtime = StorefrontRuntime::init(ClientConfig::from_env()?)?;
//!
//! let email = Email::parse("shopper@example.com")?;
//! let user = runtime.login(&email, "hunter2!").await?;
//!
//! let product = runtime.api().get_product("desk-lamp").await?;
//! runtime.cart_mut().add_item(product.snapshot(None), 1, None)?;
//! println!("subtotal: {}", runtime.cart().subtotal());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod tokens;

pub use api::{ApiClient, ApiError, Order, OrderInput, Product, ShippingAddress};
pub use cart::{CartEngine, LineItem, ProductSnapshot};
pub use config::{ClientConfig, ConfigError};
pub use runtime::{RuntimeError, StorefrontRuntime};
pub use session::{Session, User};
pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
pub use tokens::{CredentialPair, TokenStore};
