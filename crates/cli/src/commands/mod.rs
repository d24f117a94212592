//! Command implementations.
//!
//! Every command opens a [`Session`] first: configuration is read from the
//! environment, the cart for the chosen identity is loaded (remote first,
//! local fallback), and mutations are flushed to the API before the command
//! prints its result.

use std::io;
use std::sync::Arc;

use maisha_cart::{
    CartApi, CartConfig, CartSynchronizer, ConfigError, FileStore, SyncError, SyncOptions,
};
use maisha_core::UserId;
use thiserror::Error;

pub mod cart;
pub mod checkout;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Environment configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("Cart API client error: {0}")]
    Client(#[from] SyncError),

    /// Writing to the terminal failed.
    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

/// A loaded cart plus the configuration it was opened with.
pub struct Session {
    pub sync: CartSynchronizer,
    pub config: CartConfig,
}

impl Session {
    /// Read configuration, build the synchronizer and load the cart for
    /// `user` (or the anonymous session when `None`).
    pub async fn open(user: Option<String>) -> Result<Self, CommandError> {
        let config = CartConfig::from_env()?;
        tracing::debug!(
            base_url = %config.api.base_url,
            data_dir = %config.data_dir.display(),
            "Opening cart"
        );

        let remote = Arc::new(CartApi::new(&config.api)?);
        let store = Arc::new(FileStore::new(config.data_dir.clone()));
        let options = SyncOptions {
            discard_stale_responses: config.discard_stale_responses,
        };
        let sync = CartSynchronizer::new(remote, store, options);

        let cart = match user {
            Some(id) => sync.login(UserId::new(id)).await,
            None => sync.load().await,
        };
        tracing::debug!(items = cart.len(), "Cart loaded");

        Ok(Self { sync, config })
    }
}
