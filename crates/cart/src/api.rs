//! Remote cart API client.
//!
//! # Endpoints
//!
//! - `GET    /cart?user=<id>` or `/cart?sessionId=<id>` - fetch
//! - `POST   /cart/add`    `{ user, sessionId, name, price, image, quantity }`
//! - `DELETE /cart/remove` `{ user, sessionId, name }`
//! - `PUT    /cart/update` `{ user, sessionId, name, quantity }`
//! - `DELETE /cart/clear`  `{ user, sessionId }`
//!
//! Every endpoint answers `{ "data": <cart> }`. `user` is `null` for anonymous
//! shoppers and `sessionId` is always sent.

use std::sync::Arc;

use async_trait::async_trait;
use maisha_core::{Cart, IdentityKey, Price, Quantity, SessionId, UserId};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::config::CartApiConfig;
use crate::error::SyncError;
use crate::session::SessionContext;

/// How much of an error body to keep for diagnostics.
const ERROR_BODY_LIMIT: usize = 200;

/// The cart owner fields sent with every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartOwner {
    pub user: Option<UserId>,
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
}

impl From<&SessionContext> for CartOwner {
    fn from(context: &SessionContext) -> Self {
        Self {
            user: context.user_id().cloned(),
            session_id: context.session_id().clone(),
        }
    }
}

/// A cart change to mirror remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CartMutation {
    Add {
        #[serde(flatten)]
        owner: CartOwner,
        name: String,
        price: Price,
        image: String,
        quantity: Quantity,
    },
    Remove {
        #[serde(flatten)]
        owner: CartOwner,
        name: String,
    },
    Update {
        #[serde(flatten)]
        owner: CartOwner,
        name: String,
        quantity: Quantity,
    },
    Clear {
        #[serde(flatten)]
        owner: CartOwner,
    },
}

impl CartMutation {
    /// HTTP method and path relative to the API root.
    #[must_use]
    pub fn endpoint(&self) -> (Method, &'static str) {
        match self {
            Self::Add { .. } => (Method::POST, "cart/add"),
            Self::Remove { .. } => (Method::DELETE, "cart/remove"),
            Self::Update { .. } => (Method::PUT, "cart/update"),
            Self::Clear { .. } => (Method::DELETE, "cart/clear"),
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Update { .. } => "update",
            Self::Clear { .. } => "clear",
        }
    }
}

/// The authoritative cart store.
#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// Fetch the cart stored for `identity`.
    async fn fetch(&self, identity: &IdentityKey) -> Result<Cart, SyncError>;

    /// Apply a mutation and return the resulting cart.
    async fn apply(&self, mutation: &CartMutation) -> Result<Cart, SyncError>;
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Decode a `{ "data": <cart> }` response body.
///
/// # Errors
///
/// Returns `SyncError::Parse` if the body is not a JSON object, or
/// `SyncError::MalformedResponse` if `data` is missing or not a valid cart.
pub fn decode_envelope(body: &str) -> Result<Cart, SyncError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let data = envelope
        .data
        .filter(|value| !value.is_null())
        .ok_or_else(|| SyncError::MalformedResponse("missing `data` field".to_string()))?;
    serde_json::from_value(data).map_err(|e| SyncError::MalformedResponse(e.to_string()))
}

// =============================================================================
// CartApi
// =============================================================================

/// HTTP client for the remote cart API.
#[derive(Clone)]
pub struct CartApi {
    inner: Arc<CartApiInner>,
}

struct CartApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl CartApi {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Network` if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &CartApiConfig) -> Result<Self, SyncError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(CartApiInner {
                client: builder.build()?,
                base_url: config.base_url.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| SyncError::MalformedResponse(format!("invalid endpoint {path}: {e}")))
    }

    /// Send a request and decode the cart envelope.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Cart, SyncError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SyncError::Server {
                status,
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let cart = decode_envelope(&body)?;
        debug!(items = cart.len(), "Decoded remote cart");
        Ok(cart)
    }
}

#[async_trait]
impl RemoteCart for CartApi {
    #[instrument(skip(self), fields(identity = %identity))]
    async fn fetch(&self, identity: &IdentityKey) -> Result<Cart, SyncError> {
        let mut url = self.endpoint("cart")?;
        let (key, value) = identity.query_pair();
        url.query_pairs_mut().append_pair(key, value);
        self.execute(self.inner.client.get(url)).await
    }

    #[instrument(skip(self, mutation), fields(op = mutation.label()))]
    async fn apply(&self, mutation: &CartMutation) -> Result<Cart, SyncError> {
        let (method, path) = mutation.endpoint();
        let url = self.endpoint(path)?;
        self.execute(self.inner.client.request(method, url).json(mutation))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn owner(user: Option<&str>) -> CartOwner {
        CartOwner {
            user: user.map(UserId::new),
            session_id: SessionId::new("session_abc"),
        }
    }

    #[test]
    fn test_add_body_shape() {
        let mutation = CartMutation::Add {
            owner: owner(None),
            name: "Shoes".to_string(),
            price: Price::from_shillings(7199),
            image: "shoes.jpg".to_string(),
            quantity: Quantity::ONE,
        };
        let body = serde_json::to_value(&mutation).unwrap();
        assert_eq!(body["user"], json!(null));
        assert_eq!(body["sessionId"], "session_abc");
        assert_eq!(body["name"], "Shoes");
        assert_eq!(body["price"].as_f64().unwrap(), 7199.0);
        assert_eq!(body["image"], "shoes.jpg");
        assert_eq!(body["quantity"], 1);
        assert_eq!(mutation.endpoint(), (Method::POST, "cart/add"));
    }

    #[test]
    fn test_clear_body_shape() {
        let mutation = CartMutation::Clear {
            owner: owner(Some("u-1")),
        };
        let body = serde_json::to_value(&mutation).unwrap();
        assert_eq!(body, json!({"user": "u-1", "sessionId": "session_abc"}));
        assert_eq!(mutation.endpoint(), (Method::DELETE, "cart/clear"));
    }

    #[test]
    fn test_update_body_shape() {
        let mutation = CartMutation::Update {
            owner: owner(None),
            name: "Shoes".to_string(),
            quantity: Quantity::new(4).unwrap(),
        };
        let body = serde_json::to_value(&mutation).unwrap();
        assert_eq!(
            body,
            json!({"user": null, "sessionId": "session_abc", "name": "Shoes", "quantity": 4})
        );
        assert_eq!(mutation.endpoint(), (Method::PUT, "cart/update"));
    }

    #[test]
    fn test_decode_envelope() {
        let body = r#"{"data": {"items": [{"name": "Hat", "price": 900, "image": "h.jpg", "quantity": 2}], "totalPrice": 1800}}"#;
        let cart = decode_envelope(body).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_decode_envelope_missing_data() {
        assert!(matches!(
            decode_envelope(r#"{"message": "ok"}"#),
            Err(SyncError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_envelope(r#"{"data": null}"#),
            Err(SyncError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_decode_envelope_bad_cart() {
        assert!(matches!(
            decode_envelope(r#"{"data": {"items": "nope"}}"#),
            Err(SyncError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_decode_envelope_total_out_of_range() {
        let body = r#"{"data": {"items": [
            {"name": "A", "price": 50000000000000000000000000000, "image": "", "quantity": 2}
        ]}}"#;
        assert!(matches!(
            decode_envelope(body),
            Err(SyncError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_decode_envelope_not_json() {
        assert!(matches!(
            decode_envelope("<html>502</html>"),
            Err(SyncError::Parse(_))
        ));
    }
}
