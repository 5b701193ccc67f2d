//! Cart configuration

use std::{fs, io, path::Path};

use rusty_money::{Findable, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_KEY_PREFIX: &str = "cart_";
const DEFAULT_GUEST_NAME: &str = "guest";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Key prefix or guest name is empty
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Raw, as-written configuration
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CartConfigFile {
    currency: String,
    key_prefix: String,
    guest_name: String,
}

impl Default for CartConfigFile {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            guest_name: DEFAULT_GUEST_NAME.to_string(),
        }
    }
}

/// Settings for a cart store.
#[derive(Debug, Clone, PartialEq)]
pub struct CartConfig {
    currency: &'static Currency,
    key_prefix: String,
    guest_name: String,
}

impl CartConfig {
    /// Configuration with the given currency and default keys.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            guest_name: DEFAULT_GUEST_NAME.to_string(),
        }
    }

    /// Parse configuration from YAML. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid, the currency is unknown, or a
    /// key component is empty.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: CartConfigFile = serde_norway::from_str(contents)?;

        file.try_into()
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Use a different storage key prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] if `prefix` is empty.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Result<Self, ConfigError> {
        self.key_prefix = non_empty(prefix.into(), "key_prefix")?;

        Ok(self)
    }

    /// Currency of product prices and totals.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Prefix of every cart partition key.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Name used for the guest partition.
    pub fn guest_name(&self) -> &str {
        &self.guest_name
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self::new(rusty_money::iso::USD)
    }
}

impl TryFrom<CartConfigFile> for CartConfig {
    type Error = ConfigError;

    fn try_from(file: CartConfigFile) -> Result<Self, Self::Error> {
        let code = file.currency.trim().to_uppercase();
        let currency =
            Currency::find(&code).ok_or_else(|| ConfigError::UnknownCurrency(file.currency))?;

        Ok(Self {
            currency,
            key_prefix: non_empty(file.key_prefix, "key_prefix")?,
            guest_name: non_empty(file.guest_name, "guest_name")?,
        })
    }
}

fn non_empty(value: String, field: &'static str) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Empty(field))
    } else {
        Ok(value)
    }
}
