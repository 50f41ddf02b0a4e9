//! Sandpiper Core - Shared types library.
//!
//! This crate provides common types used across all Sandpiper components:
//! - `client` - Storefront client runtime (request pipeline, cart engine)
//! - `cli` - Command-line driver for the client runtime
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
