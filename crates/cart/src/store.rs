//! Local persistence for carts and the anonymous session id.
//!
//! [`LocalStore`] is a plain string key/value store with the same contract as
//! browser local storage. [`CartCache`] layers the cart record format on top:
//! one JSON record per identity, keyed `cart_<identity>`.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use maisha_core::{Cart, IdentityKey};
use tracing::{debug, warn};

use crate::error::StoreError;

/// String key/value storage.
pub trait LocalStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// One file per key under a directory.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so a reader never observes a half-written record.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `key`. Keys are percent-encoded, so any non-empty key maps
    /// to a single file name inside the store directory.
    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", urlencoding::encode(key))))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// CartCache
// =============================================================================

/// Cart records on top of a [`LocalStore`].
///
/// Reads and writes never fail from the caller's point of view: a missing or
/// unreadable record reads as an empty cart, and a failed write is logged.
#[derive(Clone)]
pub struct CartCache {
    store: Arc<dyn LocalStore>,
}

impl CartCache {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    /// Decode the stored cart for `identity`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the record cannot be read or decoded.
    pub fn try_read(&self, identity: &IdentityKey) -> Result<Option<Cart>, StoreError> {
        self.store
            .get(&identity.storage_key())?
            .map(|raw| serde_json::from_str(&raw).map_err(StoreError::from))
            .transpose()
    }

    /// Stored cart for `identity`, or an empty cart.
    #[must_use]
    pub fn read(&self, identity: &IdentityKey) -> Cart {
        match self.try_read(identity) {
            Ok(cart) => cart.unwrap_or_default(),
            Err(e) => {
                warn!(identity = %identity, error = %e, "Error reading local cart");
                Cart::new()
            }
        }
    }

    /// Persist `cart` as the record for `identity`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the cart cannot be encoded or written.
    pub fn try_write(&self, identity: &IdentityKey, cart: &Cart) -> Result<(), StoreError> {
        let raw = serde_json::to_string(cart)?;
        self.store.set(&identity.storage_key(), &raw)
    }

    /// Persist `cart`, logging instead of failing.
    pub fn write(&self, identity: &IdentityKey, cart: &Cart) {
        match self.try_write(identity, cart) {
            Ok(()) => debug!(identity = %identity, items = cart.len(), "Saved local cart"),
            Err(e) => warn!(identity = %identity, error = %e, "Error saving local cart"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maisha_core::{CartItem, Price, Quantity, SessionId, UserId};

    use super::*;

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem::new(
            "Shoes",
            Price::from_shillings(7199),
            "shoes.jpg",
            Quantity::new(2).unwrap(),
        ));
        cart.add(CartItem::new(
            "Denim Jacket",
            Price::from_shillings(4799),
            "jacket.jpg",
            Quantity::ONE,
        ));
        cart
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.get("sessionId").unwrap(), None);
        store.set("sessionId", "session_abc").unwrap();
        assert_eq!(
            store.get("sessionId").unwrap().as_deref(),
            Some("session_abc")
        );
        store.remove("sessionId").unwrap();
        assert_eq!(store.get("sessionId").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_empty_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.set("", "x"), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_file_store_encodes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("carts"));

        for key in ["cart_jane+shop@example.com", "cart_Jane Doe", "../escape"] {
            store.set(key, key).unwrap();
            assert_eq!(store.get(key).unwrap().as_deref(), Some(key));
        }
        assert_eq!(store.get("cart_jane shop@example.com").unwrap(), None);

        // Every record stays inside the store directory
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(fs::read_dir(dir.path().join("carts")).unwrap().count(), 3);

        store.remove("cart_Jane Doe").unwrap();
        assert_eq!(store.get("cart_Jane Doe").unwrap(), None);
    }

    #[test]
    fn test_cache_roundtrip_for_email_user() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CartCache::new(Arc::new(FileStore::new(dir.path())));
        let identity = IdentityKey::User(UserId::new("jane+shop@example.com"));

        cache.try_write(&identity, &sample_cart()).unwrap();
        assert_eq!(cache.try_read(&identity).unwrap(), Some(sample_cart()));
    }

    #[test]
    fn test_cache_roundtrip_preserves_order_and_total() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CartCache::new(Arc::new(FileStore::new(dir.path())));
        let identity = IdentityKey::Session(SessionId::new("session_abc"));
        let cart = sample_cart();

        cache.write(&identity, &cart);
        let restored = cache.read(&identity);

        assert_eq!(restored, cart);
        assert_eq!(restored.total_price(), cart.total_price());
        assert_eq!(restored.items()[0].name, "Shoes");
    }

    #[test]
    fn test_cache_namespaces_by_identity() {
        let cache = CartCache::new(Arc::new(MemoryStore::new()));
        let anon = IdentityKey::Session(SessionId::new("session_abc"));
        let user = IdentityKey::User(UserId::new("u-1"));

        cache.write(&anon, &sample_cart());
        assert!(cache.read(&user).is_empty());
        assert_eq!(cache.read(&anon).len(), 2);
    }

    #[test]
    fn test_cache_corrupt_record_reads_empty() {
        let store = Arc::new(MemoryStore::new());
        let identity = IdentityKey::Session(SessionId::new("session_abc"));
        store.set(&identity.storage_key(), "{not json").unwrap();

        let cache = CartCache::new(store);
        assert!(cache.try_read(&identity).is_err());
        assert!(cache.read(&identity).is_empty());
    }
}
