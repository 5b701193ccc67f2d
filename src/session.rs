//! Session
//!
//! Trivial login state kept in a session store. Logging in or out switches
//! the cart to the matching identity; carts are never merged.

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    clock::Clock,
    identity::Identity,
    storage::{KeyValueStore, StorageError},
    store::CartStore,
};

const AUTH_KEY: &str = "isLoggedIn";
const USER_KEY: &str = "currentUser";

/// Errors related to session changes.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Username or password was blank.
    #[error("username and password are required")]
    MissingCredentials,

    /// The session store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Login state backed by a session store.
#[derive(Debug)]
pub struct Session<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Session<S> {
    /// Create a session over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Log `username` in and switch `cart` to their cart.
    ///
    /// Any non-blank username and password are accepted.
    ///
    /// # Errors
    ///
    /// - [`SessionError::MissingCredentials`]: username or password is blank.
    /// - [`SessionError::Storage`]: the session flags could not be written.
    pub fn login<K: KeyValueStore, C: Clock>(
        &mut self,
        username: &str,
        password: &str,
        cart: &mut CartStore<K, C>,
    ) -> Result<Identity, SessionError> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        // The login flag is only ever set with a user recorded.
        self.store.set(USER_KEY, username.as_bytes())?;

        if let Err(error) = self.store.set(AUTH_KEY, b"true") {
            if let Err(cleanup) = self.store.remove(USER_KEY) {
                warn!(error = %cleanup, "failed to roll back session user");
            }

            return Err(error.into());
        }

        let identity = Identity::user(username);
        cart.set_identity(identity.clone());

        info!(user = username, "logged in");

        Ok(identity)
    }

    /// Log out, switching `cart` back to the guest cart first.
    ///
    /// The user's stored cart is kept for their next login.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the session flags could not be removed.
    pub fn logout<K: KeyValueStore, C: Clock>(
        &mut self,
        cart: &mut CartStore<K, C>,
    ) -> Result<(), SessionError> {
        let user = self.current_user()?;

        cart.clear_identity();

        self.store.remove(AUTH_KEY)?;
        self.store.remove(USER_KEY)?;

        info!(user = user.as_deref().unwrap_or_default(), "logged out");

        Ok(())
    }

    /// Restore a session left over from a previous run, switching `cart` to
    /// that user's cart. Returns the restored identity, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the session flags could not be read.
    pub fn restore<K: KeyValueStore, C: Clock>(
        &self,
        cart: &mut CartStore<K, C>,
    ) -> Result<Option<Identity>, SessionError> {
        if !self.is_logged_in()? {
            return Ok(None);
        }

        let Some(user) = self.current_user()? else {
            return Ok(None);
        };

        let identity = Identity::user(user);
        if identity.is_guest() {
            return Ok(None);
        }

        info!(user = %identity, "restoring session");
        cart.set_identity(identity.clone());

        Ok(Some(identity))
    }

    /// Returns `true` if the login flag is set.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the flag could not be read.
    pub fn is_logged_in(&self) -> Result<bool, SessionError> {
        Ok(self.store.get(AUTH_KEY)?.as_deref() == Some(b"true".as_slice()))
    }

    /// Username of the logged-in user, if one is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the value could not be read.
    pub fn current_user(&self) -> Result<Option<String>, SessionError> {
        Ok(self
            .store
            .get(USER_KEY)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// The underlying session store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        config::CartConfig,
        products::{Product, ProductId},
        storage::MemoryStore,
    };

    fn cart() -> CartStore<MemoryStore> {
        CartStore::new(MemoryStore::new(), CartConfig::default())
    }

    /// Session store that refuses to set the login flag.
    #[derive(Debug, Default)]
    struct NoFlagStore(MemoryStore);

    impl KeyValueStore for NoFlagStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
            if key == AUTH_KEY {
                return Err(StorageError::Rejected("flag writes disabled".to_string()));
            }

            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn login_rejects_blank_credentials() {
        let mut session = Session::new(MemoryStore::new());
        let mut cart = cart();

        assert!(matches!(
            session.login(" ", "secret", &mut cart),
            Err(SessionError::MissingCredentials)
        ));
        assert!(matches!(
            session.login("alice", "", &mut cart),
            Err(SessionError::MissingCredentials)
        ));
        assert!(cart.identity().is_guest());
    }

    #[test]
    fn login_switches_cart_and_records_session() -> TestResult {
        let mut session = Session::new(MemoryStore::new());
        let mut cart = cart();

        let identity = session.login("alice", "secret", &mut cart)?;

        assert_eq!(identity, Identity::user("alice"));
        assert_eq!(cart.identity(), &identity);
        assert!(session.is_logged_in()?);
        assert_eq!(session.current_user()?.as_deref(), Some("alice"));

        Ok(())
    }

    #[test]
    fn logout_returns_to_guest_cart_and_keeps_user_cart() -> TestResult {
        let mut session = Session::new(MemoryStore::new());
        let mut cart = cart();
        let scarf = Product::new(ProductId(4), "Scarf", Decimal::new(1250, 2));

        session.login("alice", "secret", &mut cart)?;
        cart.add_item(scarf, 2)?;
        session.logout(&mut cart)?;

        assert!(cart.identity().is_guest());
        assert!(cart.snapshot().is_empty());
        assert!(!session.is_logged_in()?);
        assert_eq!(session.current_user()?, None);
        assert!(cart.storage().contains_key("cart_alice"));

        session.login("alice", "secret", &mut cart)?;
        assert_eq!(cart.quantity_of(ProductId(4)), 2);

        Ok(())
    }

    #[test]
    fn failed_login_leaves_no_partial_session() -> TestResult {
        let mut session = Session::new(NoFlagStore::default());
        let mut cart = cart();

        assert!(matches!(
            session.login("alice", "secret", &mut cart),
            Err(SessionError::Storage(StorageError::Rejected(_)))
        ));

        assert!(!session.is_logged_in()?);
        assert_eq!(session.current_user()?, None);
        assert!(session.store().0.is_empty());
        assert!(cart.identity().is_guest());

        Ok(())
    }

    #[test]
    fn restore_resumes_recorded_user() -> TestResult {
        let mut session_store = MemoryStore::new();
        session_store.set(AUTH_KEY, b"true")?;
        session_store.set(USER_KEY, b"bob")?;

        let session = Session::new(session_store);
        let mut cart = cart();

        assert_eq!(session.restore(&mut cart)?, Some(Identity::user("bob")));
        assert_eq!(cart.identity(), &Identity::user("bob"));

        Ok(())
    }

    #[test]
    fn restore_without_login_flag_keeps_guest() -> TestResult {
        let mut session_store = MemoryStore::new();
        session_store.set(USER_KEY, b"bob")?;

        let session = Session::new(session_store);
        let mut cart = cart();

        assert_eq!(session.restore(&mut cart)?, None);
        assert!(cart.identity().is_guest());

        Ok(())
    }
}
