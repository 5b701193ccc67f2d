//! Trolley prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{Catalog, CatalogError},
    clock::{Clock, FixedClock, SystemClock},
    config::{CartConfig, ConfigError},
    identity::Identity,
    lines::CartLine,
    observers::{Observers, Subscription},
    persistence::PersistenceError,
    pricing::PricingError,
    products::{Product, ProductId},
    session::{Session, SessionError},
    snapshot::{CartSnapshot, RenderError},
    storage::{FileStore, KeyValueStore, MemoryStore, StorageError},
    store::{CartError, CartStore},
};
