//! Observers
//!
//! Synchronous broadcast of values to registered callbacks.
//!
//! Callbacks run inline, in registration order, on the thread that triggered
//! the notification. A registry is single-threaded: it is built on `Rc` and is
//! neither `Send` nor `Sync`.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use tracing::warn;

type Callback<T> = RefCell<Box<dyn FnMut(&T)>>;

struct Entry<T> {
    id: u64,
    active: Rc<Cell<bool>>,
    callback: Rc<Callback<T>>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            active: Rc::clone(&self.active),
            callback: Rc::clone(&self.callback),
        }
    }
}

struct Registry<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

/// Ordered registry of observer callbacks.
pub struct Observers<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Observers<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register `callback` for every subsequent notification.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let active = Rc::new(Cell::new(true));

        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;

        registry.entries.push(Entry {
            id,
            active: Rc::clone(&active),
            callback: Rc::new(RefCell::new(Box::new(callback))),
        });

        let registry_ref: Rc<RefCell<dyn Prune>> = self.registry.clone();

        Subscription {
            id,
            active,
            registry: Rc::downgrade(&registry_ref),
        }
    }

    /// Call every active callback with `value`, in registration order.
    ///
    /// The set of callbacks is fixed when the call starts: callbacks added
    /// during delivery first hear the next value, and callbacks removed during
    /// delivery are skipped if they have not run yet.
    pub fn notify(&self, value: &T) {
        let entries = self.registry.borrow().entries.clone();

        for entry in entries {
            if !entry.active.get() {
                continue;
            }

            match entry.callback.try_borrow_mut() {
                Ok(mut callback) => (*callback)(value),
                Err(_busy) => warn!(
                    subscription = entry.id,
                    "observer re-entered during its own notification; skipped"
                ),
            }
        }

        if let Ok(mut registry) = self.registry.try_borrow_mut() {
            registry.prune();
        }
    }

    /// Number of active callbacks.
    pub fn len(&self) -> usize {
        self.registry
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.active.get())
            .count()
    }

    /// Returns `true` if no callbacks are active.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("active", &self.len())
            .finish_non_exhaustive()
    }
}

trait Prune {
    fn prune(&mut self);
}

impl<T> Prune for Registry<T> {
    fn prune(&mut self) {
        self.entries.retain(|entry| entry.active.get());
    }
}

/// Handle returned by [`Observers::subscribe`].
///
/// Dropping the handle leaves the callback registered; call
/// [`Subscription::unsubscribe`] to stop deliveries.
pub struct Subscription {
    id: u64,
    active: Rc<Cell<bool>>,
    registry: Weak<RefCell<dyn Prune>>,
}

impl Subscription {
    /// Stop delivering values to the callback.
    ///
    /// Safe to call from inside a callback; the removal takes effect
    /// immediately for values not yet delivered.
    pub fn unsubscribe(self) {
        self.active.set(false);

        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        if let Ok(mut registry) = registry.try_borrow_mut() {
            registry.prune();
        }
    }

    /// Returns `true` while the callback is still registered.
    pub fn is_active(&self) -> bool {
        self.active.get() && self.registry.strong_count() > 0
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
