//! Error types for the cart synchronizer.
//!
//! None of these ever reach the shopper: the synchronizer logs remote and
//! storage failures and keeps serving the local cart. They exist so that the
//! lower layers can report precisely what went wrong.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the remote cart API.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request never produced a response (connection refused, DNS,
    /// timeout when one is configured).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Server error: HTTP {status}: {body}")]
    Server {
        /// Response status.
        status: StatusCode,
        /// First part of the response body.
        body: String,
    },

    /// The body parsed as JSON but has no usable `data` cart.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The body is not valid JSON for the expected envelope.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SyncError {
    /// Short label for structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Server { .. } => "server",
            Self::MalformedResponse(_) | Self::Parse(_) => "malformed",
        }
    }
}

/// Errors that can occur when reading or writing the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The key is empty.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Errors from the checkout hand-off.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("Your cart is empty!")]
    EmptyCart,
}
