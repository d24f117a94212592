//! Newtype identifiers for cart namespaces.
//!
//! Use the `define_string_id!` macro to create type-safe ID wrappers that
//! prevent accidentally mixing a user id with an anonymous session id.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use maisha_core::define_string_id;
/// define_string_id!(ShopperId);
/// define_string_id!(DeviceId);
///
/// let shopper = ShopperId::new("abc");
/// let device = DeviceId::new("abc");
///
/// // These are different types, so this won't compile:
/// // let _: ShopperId = device;
/// ```
#[macro_export]
macro_rules! define_string_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(UserId);
define_string_id!(SessionId);

/// Number of random base-36 characters in a generated session id.
const SESSION_RANDOM_LEN: usize = 9;

impl SessionId {
    /// Prefix of every generated session id.
    pub const PREFIX: &'static str = "session_";

    /// Generate a fresh anonymous session id.
    ///
    /// Format: `session_` + 9 random base-36 characters + the current Unix
    /// time in milliseconds rendered in base 36.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let random: String = (0..SESSION_RANDOM_LEN)
            .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
            .collect();
        let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        Self(format!("{}{random}{}", Self::PREFIX, to_base36(millis)))
    }
}

/// Render an unsigned integer in lowercase base 36.
fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        #[allow(clippy::cast_possible_truncation)] // remainder is always < 36
        digits.extend(char::from_digit((value % 36) as u32, 36));
        value /= 36;
    }
    digits.iter().rev().collect()
}

/// The key a cart is namespaced under.
///
/// A logged-in shopper's cart lives under their [`UserId`]; an anonymous
/// shopper's cart lives under their [`SessionId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum IdentityKey {
    User(UserId),
    Session(SessionId),
}

impl IdentityKey {
    /// Raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User(id) => id.as_str(),
            Self::Session(id) => id.as_str(),
        }
    }

    /// Local storage key holding this identity's cart (`cart_<id>`).
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("cart_{}", self.as_str())
    }

    /// Query parameter selecting this identity's cart on the remote API.
    #[must_use]
    pub fn query_pair(&self) -> (&'static str, &str) {
        match self {
            Self::User(id) => ("user", id.as_str()),
            Self::Session(id) => ("sessionId", id.as_str()),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Session(id) => write!(f, "session:{id}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_session_id_format() {
        let id = SessionId::generate();
        let rest = id.as_str().strip_prefix(SessionId::PREFIX).unwrap();
        // 9 random chars plus at least 8 timestamp chars for any date after 1973
        assert!(rest.len() > SESSION_RANDOM_LEN + 7);
        assert!(
            rest.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_generated_session_ids_differ() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn test_storage_key() {
        let user = IdentityKey::User(UserId::new("u-42"));
        let session = IdentityKey::Session(SessionId::new("session_abc"));
        assert_eq!(user.storage_key(), "cart_u-42");
        assert_eq!(session.storage_key(), "cart_session_abc");
    }

    #[test]
    fn test_query_pair() {
        let user = IdentityKey::User(UserId::new("u-42"));
        let session = IdentityKey::Session(SessionId::new("session_abc"));
        assert_eq!(user.query_pair(), ("user", "u-42"));
        assert_eq!(session.query_pair(), ("sessionId", "session_abc"));
    }

    #[test]
    fn test_string_id_serde_transparent() {
        let id = UserId::new("jane@example.com");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"jane@example.com\"");
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
