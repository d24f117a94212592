//! Shopper identity for cart namespacing.

use maisha_core::{IdentityKey, SessionId, UserId};
use tracing::{info, warn};

use crate::store::LocalStore;

/// Local storage key holding the anonymous session id.
pub const SESSION_ID_KEY: &str = "sessionId";

/// Who the cart belongs to.
///
/// Every shopper has an anonymous session id for the life of their local
/// store. Logging in adds a user id, which then takes precedence as the
/// identity key; the session id is still sent to the API alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session_id: SessionId,
    user_id: Option<UserId>,
}

impl SessionContext {
    /// Anonymous context with the given session id.
    #[must_use]
    pub const fn anonymous(session_id: SessionId) -> Self {
        Self {
            session_id,
            user_id: None,
        }
    }

    /// Reuse the session id persisted in `store`, or generate and persist a
    /// new one.
    ///
    /// Storage failures are logged; a fresh id is used for this process when
    /// the stored one cannot be read.
    #[must_use]
    pub fn restore_or_generate(store: &dyn LocalStore) -> Self {
        match store.get(SESSION_ID_KEY) {
            Ok(Some(raw)) if !raw.trim().is_empty() => {
                return Self::anonymous(SessionId::new(raw.trim()));
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Error reading session id"),
        }

        let session_id = SessionId::generate();
        if let Err(e) = store.set(SESSION_ID_KEY, session_id.as_str()) {
            warn!(error = %e, "Error saving session id");
        }
        info!(session_id = %session_id, "Generated new session id");
        Self::anonymous(session_id)
    }

    /// Anonymous session id.
    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Logged-in user, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// The key the cart is currently namespaced under.
    #[must_use]
    pub fn identity(&self) -> IdentityKey {
        self.user_id.as_ref().map_or_else(
            || IdentityKey::Session(self.session_id.clone()),
            |user| IdentityKey::User(user.clone()),
        )
    }

    /// Switch to the user's cart namespace.
    pub fn login(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
    }

    /// Return to the anonymous session namespace.
    pub fn logout(&mut self) {
        self.user_id = None;
    }
}
