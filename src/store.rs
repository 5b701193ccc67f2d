//! Cart store
//!
//! [`CartStore`] owns the lines of the active identity's cart. Every change
//! runs the same cycle: recompute the totals from the full line list, write
//! the list to the identity's storage partition, then hand the new snapshot
//! to every observer.
//!
//! Storage problems never fail a cart operation. They are logged through
//! `tracing` and kept for [`CartStore::take_last_error`], and the in-memory
//! cart (and what observers see) reflects the change regardless.
//!
//! Observers run synchronously inside the call that triggered them. They
//! receive a shared reference to the snapshot and cannot reach the store
//! mutably while it is notifying.

use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    config::CartConfig,
    identity::Identity,
    lines::{CartLine, position_of},
    observers::{Observers, Subscription},
    persistence::{PersistenceError, decode_lines, encode_lines},
    pricing::PricingError,
    products::{Product, ProductId},
    snapshot::CartSnapshot,
    storage::{KeyValueStore, StorageError},
};

/// Errors related to cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// A quantity below one was passed where at least one unit is required.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// The change would make a quantity or the cart total overflow.
    #[error("cart total would overflow when changing product {0}")]
    PriceOverflow(ProductId),

    /// Reading or writing the storage partition failed.
    #[error("cart persistence failed for {key}: {source}")]
    Persistence {
        /// Partition key
        key: String,

        /// Underlying storage error
        #[source]
        source: StorageError,
    },

    /// The stored partition could not be read back as a cart.
    #[error("stored cart {key} is malformed: {source}")]
    MalformedPersistedData {
        /// Partition key
        key: String,

        /// Why the data was rejected
        #[source]
        source: PersistenceError,
    },
}

/// Shopping cart for the active identity.
#[derive(Debug)]
pub struct CartStore<S: KeyValueStore, C: Clock = SystemClock> {
    storage: S,
    clock: C,
    config: CartConfig,
    identity: Identity,
    lines: Vec<CartLine>,
    current: CartSnapshot,
    observers: Observers<CartSnapshot>,
    last_error: Option<CartError>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Create a store on the wall clock, starting with the guest cart.
    pub fn new(storage: S, config: CartConfig) -> Self {
        Self::with_clock(storage, config, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> CartStore<S, C> {
    /// Create a store with an explicit clock, starting with the guest cart.
    ///
    /// The guest partition is loaded immediately.
    pub fn with_clock(storage: S, config: CartConfig, clock: C) -> Self {
        let currency = config.currency();

        let mut store = Self {
            storage,
            clock,
            config,
            identity: Identity::Guest,
            lines: Vec::new(),
            current: CartSnapshot::empty(currency),
            observers: Observers::new(),
            last_error: None,
        };

        store.reload();

        store
    }

    /// Switch to `identity`, replacing the cart with that identity's stored cart.
    ///
    /// Missing, unreadable or malformed partitions load as an empty cart.
    /// Loading never writes back to storage.
    pub fn set_identity(&mut self, identity: Identity) {
        let from = self.storage_key();
        self.identity = identity;

        info!(%from, to = %self.storage_key(), "switching cart identity");

        self.reload();
    }

    /// Switch back to the guest cart.
    pub fn clear_identity(&mut self) {
        self.set_identity(Identity::Guest);
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line keeps its position and `added_at`; otherwise a new
    /// line is appended.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::PriceOverflow`]: the new total cannot be represented.
    pub fn add_item(&mut self, product: Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let product_id = product.id;
        let mut lines = self.lines.clone();

        match position_of(&lines, product_id).and_then(|idx| lines.get_mut(idx)) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::PriceOverflow(product_id))?;

                debug!(product = %product_id, quantity = line.quantity, "increased line quantity");
            }
            None => {
                debug!(product = %product_id, title = %product.title, quantity, "added line");

                lines.push(CartLine::new(product, quantity, self.clock.now()));
            }
        }

        self.commit(lines, product_id)
    }

    /// Add a single unit of `product`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::PriceOverflow`] if the new total cannot be represented.
    pub fn add_one(&mut self, product: Product) -> Result<(), CartError> {
        self.add_item(product, 1)
    }

    /// Remove the line for `product`. Does nothing if it is not in the cart.
    pub fn remove_item(&mut self, product: ProductId) {
        let Some(idx) = position_of(&self.lines, product) else {
            debug!(product = %product, "remove ignored, product not in cart");
            return;
        };

        let mut lines = self.lines.clone();
        lines.remove(idx);

        debug!(product = %product, "removed line");

        // Dropping a line only lowers the total, so this cannot overflow.
        if let Err(error) = self.commit(lines, product) {
            warn!(%error, "failed to remove line");
        }
    }

    /// Set the quantity of `product` to exactly `quantity`.
    ///
    /// Zero removes the line. Does nothing if the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::PriceOverflow`] if the new total cannot be represented.
    pub fn set_quantity(&mut self, product: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            self.remove_item(product);
            return Ok(());
        }

        let Some(idx) = position_of(&self.lines, product) else {
            debug!(product = %product, "quantity update ignored, product not in cart");
            return Ok(());
        };

        let mut lines = self.lines.clone();

        if let Some(line) = lines.get_mut(idx) {
            line.quantity = quantity;
        }

        debug!(product = %product, quantity, "set line quantity");

        self.commit(lines, product)
    }

    /// Empty the active cart.
    pub fn clear(&mut self) {
        debug!(key = %self.storage_key(), "clearing cart");

        self.lines.clear();
        self.current = CartSnapshot::empty(self.currency());
        self.persist();
        self.publish();
    }

    /// Current snapshot, identical to the last one published.
    pub fn snapshot(&self) -> CartSnapshot {
        self.current.clone()
    }

    /// Register `observer` for snapshots.
    ///
    /// The observer is called at once with the current snapshot, then after
    /// every change until the returned handle is unsubscribed.
    pub fn subscribe(&self, mut observer: impl FnMut(&CartSnapshot) + 'static) -> Subscription {
        observer(&self.current);

        self.observers.subscribe(observer)
    }

    /// Identity whose cart is active.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns `true` if `product` is in the cart.
    pub fn contains(&self, product: ProductId) -> bool {
        self.current.contains(product)
    }

    /// Quantity of `product` in the cart, zero if absent.
    pub fn quantity_of(&self, product: ProductId) -> u32 {
        self.current.quantity_of(product)
    }

    /// Currency of prices and totals.
    pub fn currency(&self) -> &'static Currency {
        self.config.currency()
    }

    /// Storage key of the active partition.
    pub fn storage_key(&self) -> String {
        self.identity
            .storage_key(self.config.key_prefix(), self.config.guest_name())
    }

    /// Most recent storage or load problem since the last call, if any.
    pub fn take_last_error(&mut self) -> Option<CartError> {
        self.last_error.take()
    }

    /// The injected storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Recompute totals for `lines` and, if they are representable, make them
    /// the cart, persist and publish.
    fn commit(&mut self, lines: Vec<CartLine>, changed: ProductId) -> Result<(), CartError> {
        self.current = CartSnapshot::from_lines(lines.clone(), self.currency())
            .map_err(|PricingError::Overflow| CartError::PriceOverflow(changed))?;
        self.lines = lines;

        debug!(
            total_items = self.current.total_items(),
            total_price = %self.current.total_price(),
            "cart recomputed"
        );

        self.persist();
        self.publish();

        Ok(())
    }

    fn persist(&mut self) {
        let key = self.storage_key();

        let result = encode_lines(&self.lines)
            .map_err(|error| StorageError::Rejected(format!("could not encode cart: {error}")))
            .and_then(|bytes| self.storage.set(&key, &bytes))
            .map_err(|source| CartError::Persistence {
                key: key.clone(),
                source,
            });

        match result {
            Ok(()) => debug!(%key, lines = self.lines.len(), "saved cart"),
            Err(error) => self.record(error),
        }
    }

    fn reload(&mut self) {
        let key = self.storage_key();

        let lines = match self.load(&key) {
            Ok(Some(lines)) => {
                info!(%key, lines = lines.len(), "loaded saved cart");
                lines
            }
            Ok(None) => {
                info!(%key, "no saved cart");
                Vec::new()
            }
            Err(error) => {
                self.record(error);
                Vec::new()
            }
        };

        self.current = match CartSnapshot::from_lines(lines, self.currency()) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                self.record(CartError::MalformedPersistedData {
                    key,
                    source: error.into(),
                });
                CartSnapshot::empty(self.currency())
            }
        };
        self.lines = self.current.lines().to_vec();

        self.publish();
    }

    fn load(&self, key: &str) -> Result<Option<Vec<CartLine>>, CartError> {
        let bytes = self
            .storage
            .get(key)
            .map_err(|source| CartError::Persistence {
                key: key.to_string(),
                source,
            })?;

        bytes
            .map(|bytes| {
                decode_lines(&bytes).map_err(|source| CartError::MalformedPersistedData {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn record(&mut self, error: CartError) {
        warn!(key = %self.storage_key(), %error, "cart storage problem");

        self.last_error = Some(error);
    }

    fn publish(&self) {
        self.observers.notify(&self.current);
    }
}
