//! Maisha Cart - cart synchronizer for the Maisha Boutique storefront.
//!
//! The cart lives in two places: a local store that answers immediately, and
//! the remote cart API that is authoritative across devices. This crate keeps
//! them eventually consistent with an "optimistic local update, then
//! best-effort remote sync" policy.
//!
//! # Architecture
//!
//! - [`sync::CartSynchronizer`] - the function-call API a UI layer drives
//! - [`store`] - local key/value persistence (`cart_<identity>`, `sessionId`)
//! - [`api`] - `reqwest` client for the remote cart endpoints
//! - [`session`] - anonymous session id and logged-in user
//! - [`checkout`] - WhatsApp order hand-off and shopper notices
//! - [`config`] - environment configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use maisha_cart::{CartApi, CartConfig, CartSynchronizer, FileStore, SyncOptions};
//!
//! let config = CartConfig::from_env()?;
//! let remote = Arc::new(CartApi::new(&config.api)?);
//! let store = Arc::new(FileStore::new(&config.data_dir));
//! let sync = CartSynchronizer::new(remote, store, SyncOptions::default());
//!
//! let cart = sync.load().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod sync;

pub use api::{CartApi, CartMutation, CartOwner, RemoteCart};
pub use checkout::{Notice, OrderFormat, WhatsAppOrder};
pub use config::{CartApiConfig, CartConfig, ConfigError};
pub use error::{CheckoutError, StoreError, SyncError};
pub use session::SessionContext;
pub use store::{CartCache, FileStore, LocalStore, MemoryStore};
pub use sync::{CartSynchronizer, SyncOptions};
