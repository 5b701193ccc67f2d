//! Identities

use std::fmt;

/// Who the active cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Identity {
    /// No session is active.
    #[default]
    Guest,

    /// A logged-in user, by username.
    User(String),
}

impl Identity {
    /// Identity for a username. Blank usernames map to [`Identity::Guest`].
    pub fn user(username: impl Into<String>) -> Self {
        let username = username.into();

        if username.trim().is_empty() {
            Self::Guest
        } else {
            Self::User(username)
        }
    }

    /// Returns `true` for the guest identity.
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// Username, or `None` for the guest.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Guest => None,
            Self::User(name) => Some(name),
        }
    }

    /// Storage key of this identity's cart partition.
    ///
    /// A user literally named after the guest sentinel shares the guest partition.
    pub fn storage_key(&self, prefix: &str, guest_name: &str) -> String {
        format!("{prefix}{}", self.username().unwrap_or(guest_name))
    }
}

/// Shows the username, or the literal `guest` sentinel for [`Identity::Guest`].
///
/// This is not the partition name: the guest's storage key uses the configured
/// guest name (see [`Identity::storage_key`]).
impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => f.write_str("guest"),
            Self::User(name) => f.write_str(name),
        }
    }
}
