//! Cache configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{check_capacity, Error, Result};

/// Default number of cached statements per cache
pub const DEFAULT_CAPACITY: usize = 10;

/// Internal layout of a cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Fixed slot array, reordered by shifting
    #[default]
    Array,
    /// Doubly-linked list with a hash index
    List,
}

impl Strategy {
    /// Lowercase name, as accepted by [`FromStr`]
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Array => "array",
            Strategy::List => "list",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "array" => Ok(Strategy::Array),
            "list" => Ok(Strategy::List),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

/// Configuration for a statement cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub capacity: usize,
    /// Which layout to build
    pub strategy: Strategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            strategy: Strategy::default(),
        }
    }
}

impl CacheConfig {
    /// Creates a new config with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Sets the strategy
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check that the config can build a cache
    pub fn validate(&self) -> Result<()> {
        check_capacity(self.capacity).map(|_| ())
    }
}
