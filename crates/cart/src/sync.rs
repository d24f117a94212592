//! The cart synchronizer.
//!
//! Every mutation is applied to the locally persisted cart first and returned
//! immediately, then mirrored to the remote API on a background task. When a
//! remote call succeeds its cart replaces the local record; when it fails the
//! failure is logged and the local cart stands. There is no retry and no
//! rollback.
//!
//! Remote responses are applied in completion order, not issue order, so two
//! quick mutations can race and the last response to arrive wins. Enable
//! [`SyncOptions::discard_stale_responses`] to drop responses that were
//! superseded by a newer local mutation.
//!
//! # Example
//!
//! ```rust,ignore
//! let sync = CartSynchronizer::new(remote, store, SyncOptions::default());
//! let mut updates = sync.subscribe();
//!
//! let cart = sync.add_item("Denim Jacket", Price::from_shillings(4799), "img.jpg", Quantity::ONE);
//! assert_eq!(cart.len(), 1);
//!
//! // Wait for the remote copy to come back before exiting
//! sync.flush().await;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use maisha_core::{Cart, CartItem, IdentityKey, Price, Quantity, UserId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{CartMutation, CartOwner, RemoteCart};
use crate::session::SessionContext;
use crate::store::{CartCache, LocalStore};

/// Behaviour switches for [`CartSynchronizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Drop a remote response if a newer local mutation happened after its
    /// request was issued. Off means last-response-wins.
    pub discard_stale_responses: bool,
}

/// Keeps a local cart and the remote cart API eventually consistent.
///
/// Mutating methods are synchronous and must be called from within a Tokio
/// runtime, since they spawn the remote sync.
pub struct CartSynchronizer {
    shared: Arc<Shared>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

struct Shared {
    remote: Arc<dyn RemoteCart>,
    cache: CartCache,
    options: SyncOptions,
    local: Mutex<LocalState>,
    updates: watch::Sender<Cart>,
}

struct LocalState {
    context: SessionContext,
    /// Bumped on every local mutation and identity change.
    version: u64,
}

/// What a remote response must still match to be applied.
#[derive(Debug, Clone)]
struct Ticket {
    identity: IdentityKey,
    version: u64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, cart: &Cart) {
        self.updates.send_replace(cart.clone());
    }

    /// Store a remote cart unless the ticket has been superseded.
    ///
    /// A response for a different identity is always dropped: the shopper
    /// logged in or out while the request was in flight, and the cart
    /// belongs to the other namespace.
    fn apply_remote(&self, ticket: &Ticket, cart: &Cart) -> bool {
        let state = self.lock();
        if state.context.identity() != ticket.identity {
            debug!(identity = %ticket.identity, "Dropping remote cart for previous identity");
            return false;
        }
        if self.options.discard_stale_responses && state.version != ticket.version {
            debug!(
                issued = ticket.version,
                current = state.version,
                "Dropping stale remote cart"
            );
            return false;
        }
        self.cache.write(&ticket.identity, cart);
        self.publish(cart);
        true
    }
}

impl CartSynchronizer {
    /// Create a synchronizer whose session id is restored from (or generated
    /// into) `store`.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteCart>, store: Arc<dyn LocalStore>, options: SyncOptions) -> Self {
        let context = SessionContext::restore_or_generate(store.as_ref());
        Self::with_context(remote, store, context, options)
    }

    /// Create a synchronizer for an explicit session context.
    #[must_use]
    pub fn with_context(
        remote: Arc<dyn RemoteCart>,
        store: Arc<dyn LocalStore>,
        context: SessionContext,
        options: SyncOptions,
    ) -> Self {
        let cache = CartCache::new(store);
        let initial = cache.read(&context.identity());
        let (updates, _) = watch::channel(initial);

        Self {
            shared: Arc::new(Shared {
                remote,
                cache,
                options,
                local: Mutex::new(LocalState {
                    context,
                    version: 0,
                }),
                updates,
            }),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Observe every cart this synchronizer publishes, local or remote.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.shared.updates.subscribe()
    }

    /// Current session context.
    #[must_use]
    pub fn session(&self) -> SessionContext {
        self.shared.lock().context.clone()
    }

    /// The locally persisted cart, without touching the network.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        let state = self.shared.lock();
        self.shared.cache.read(&state.context.identity())
    }

    /// Fetch the remote cart, falling back to the local one.
    ///
    /// On success the remote cart overwrites the local record. Any failure
    /// (network, non-2xx status, malformed body) is logged and the last
    /// locally persisted cart is returned instead.
    pub async fn load(&self) -> Cart {
        let ticket = self.ticket();
        match self.shared.remote.fetch(&ticket.identity).await {
            Ok(cart) => {
                if self.shared.apply_remote(&ticket, &cart) {
                    info!(identity = %ticket.identity, items = cart.len(), "Loaded remote cart");
                    cart
                } else {
                    self.snapshot()
                }
            }
            Err(e) => {
                warn!(
                    identity = %ticket.identity,
                    error = %e,
                    kind = e.kind(),
                    "Error fetching cart, using local copy"
                );
                let cart = self.snapshot();
                self.shared.publish(&cart);
                cart
            }
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line with the same name has its quantity increased;
    /// otherwise a new line is appended.
    pub fn add_item(
        &self,
        name: impl Into<String>,
        price: Price,
        image: impl Into<String>,
        quantity: Quantity,
    ) -> Cart {
        self.add(CartItem::new(name, price, image, quantity))
    }

    /// Add a fully specified line (with size or color).
    ///
    /// An add that would push the cart total out of range is ignored: the
    /// cart is returned unchanged and nothing is sent.
    pub fn add(&self, item: CartItem) -> Cart {
        info!(cart.item = %item.name, quantity = item.quantity.get(), "Adding to cart");
        let remote_item = item.clone();
        self.mutate(
            |cart| {
                let name = item.name.clone();
                let added = cart.add(item);
                if !added {
                    warn!(cart.item = %name, "Cart total out of range, ignoring add");
                }
                added.then_some(())
            },
            move |owner, ()| CartMutation::Add {
                owner,
                name: remote_item.name,
                price: remote_item.price,
                image: remote_item.image,
                quantity: remote_item.quantity,
            },
        )
    }

    /// Remove a line. Removing an absent line leaves the cart unchanged.
    pub fn remove_item(&self, name: &str) -> Cart {
        info!(cart.item = name, "Removing from cart");
        self.mutate(
            |cart| {
                cart.remove(name);
                Some(())
            },
            |owner, ()| CartMutation::Remove {
                owner,
                name: name.to_string(),
            },
        )
    }

    /// Set a line's quantity.
    ///
    /// The update is sent remotely even when the line is absent locally, so
    /// a cart that only exists on the server can still be edited.
    pub fn set_quantity(&self, name: &str, quantity: Quantity) -> Cart {
        info!(cart.item = name, quantity = quantity.get(), "Updating cart quantity");
        self.mutate(
            |cart| {
                if cart.get(name).is_none() || cart.set_quantity(name, quantity) {
                    Some(quantity)
                } else {
                    warn!(cart.item = name, "Cart total out of range, ignoring update");
                    None
                }
            },
            |owner, quantity| CartMutation::Update {
                owner,
                name: name.to_string(),
                quantity,
            },
        )
    }

    /// One more unit of a line. No-op if the line is absent.
    pub fn increment(&self, name: &str) -> Cart {
        debug!(cart.item = name, "Incrementing cart quantity");
        self.step_quantity(name, Cart::incremented_quantity)
    }

    /// One fewer unit of a line. No-op at one unit; never removes the line.
    pub fn decrement(&self, name: &str) -> Cart {
        debug!(cart.item = name, "Decrementing cart quantity");
        self.step_quantity(name, Cart::decremented_quantity)
    }

    /// Empty the cart.
    pub fn clear(&self) -> Cart {
        info!("Clearing cart");
        self.mutate(
            |cart| {
                cart.clear();
                Some(())
            },
            |owner, ()| CartMutation::Clear { owner },
        )
    }

    /// Move a line to the quantity `next` computes from the current cart,
    /// sending nothing when it yields `None`.
    fn step_quantity(&self, name: &str, next: fn(&Cart, &str) -> Option<Quantity>) -> Cart {
        self.mutate(
            |cart| {
                let quantity = next(cart, name)?;
                cart.set_quantity(name, quantity).then_some(quantity)
            },
            |owner, quantity| CartMutation::Update {
                owner,
                name: name.to_string(),
                quantity,
            },
        )
    }

    /// Switch to the user's cart and load it.
    pub async fn login(&self, user_id: UserId) -> Cart {
        {
            let mut state = self.shared.lock();
            info!(user_id = %user_id, "Switching cart to user");
            state.context.login(user_id);
            state.version += 1;
        }
        self.load().await
    }

    /// Switch back to the anonymous session cart and load it.
    pub async fn logout(&self) -> Cart {
        {
            let mut state = self.shared.lock();
            info!("Switching cart to anonymous session");
            state.context.logout();
            state.version += 1;
        }
        self.load().await
    }

    /// Wait for every remote sync issued so far to finish.
    pub async fn flush(&self) {
        loop {
            let pending = std::mem::take(&mut *self.lock_in_flight());
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Cart sync task failed");
                }
            }
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ticket(&self) -> Ticket {
        let state = self.shared.lock();
        Ticket {
            identity: state.context.identity(),
            version: state.version,
        }
    }

    /// Apply `change` to the local cart, persist and publish it, then mirror
    /// the mutation built by `to_remote` in the background.
    ///
    /// The read, change and write happen under one lock. When `change`
    /// returns `None` the cart is left as it was and nothing is sent.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Cart) -> Option<T>,
        to_remote: impl FnOnce(CartOwner, T) -> CartMutation,
    ) -> Cart {
        let (cart, ticket, mutation) = {
            let mut state = self.shared.lock();
            let identity = state.context.identity();
            let mut cart = self.shared.cache.read(&identity);
            let Some(outcome) = change(&mut cart) else {
                return cart;
            };
            self.shared.cache.write(&identity, &cart);
            self.shared.publish(&cart);
            state.version += 1;
            let ticket = Ticket {
                identity,
                version: state.version,
            };
            (
                cart,
                ticket,
                to_remote(CartOwner::from(&state.context), outcome),
            )
        };

        self.spawn_sync(ticket, mutation);
        cart
    }

    fn spawn_sync(&self, ticket: Ticket, mutation: CartMutation) {
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            match shared.remote.apply(&mutation).await {
                Ok(cart) => {
                    if shared.apply_remote(&ticket, &cart) {
                        debug!(op = mutation.label(), items = cart.len(), "Synced cart");
                    }
                }
                Err(e) => {
                    warn!(
                        op = mutation.label(),
                        identity = %ticket.identity,
                        error = %e,
                        kind = e.kind(),
                        "Error syncing cart, keeping local copy"
                    );
                }
            }
        });

        let mut in_flight = self.lock_in_flight();
        in_flight.retain(|handle| !handle.is_finished());
        in_flight.push(handle);
    }
}
