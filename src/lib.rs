//! Trolley
//!
//! Trolley is a storefront shopping cart state store: one cart per identity,
//! totals recomputed on every change, persisted to an injected key-value store
//! and broadcast to synchronous observers.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod identity;
pub mod lines;
pub mod observers;
pub mod persistence;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod store;
