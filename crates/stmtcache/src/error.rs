//! Error types for stmtcache

use std::fmt;
use std::mem;

use crate::key::Entry;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache construction and reconfiguration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Capacity must be at least 1
    InvalidCapacity(usize),

    /// Capacity cannot be allocated
    CapacityTooLarge(usize),

    /// Strategy name not recognised
    UnknownStrategy(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(cap) => {
                write!(f, "Invalid capacity: {} (must be at least 1)", cap)
            }
            Error::CapacityTooLarge(cap) => {
                write!(f, "Capacity too large: {} entries cannot be allocated", cap)
            }
            Error::UnknownStrategy(name) => {
                write!(f, "Unknown strategy: {:?} (expected \"array\" or \"list\")", name)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Reject a zero capacity
pub(crate) fn check_capacity(capacity: usize) -> Result<usize> {
    if capacity == 0 {
        Err(Error::InvalidCapacity(capacity))
    } else {
        Ok(capacity)
    }
}

/// Reject zero, and anything more entries of `V` than one allocation can address
pub(crate) fn check_entry_capacity<V>(capacity: usize) -> Result<usize> {
    let limit = isize::MAX as usize / mem::size_of::<Entry<V>>().max(1);
    if check_capacity(capacity)? > limit {
        Err(Error::CapacityTooLarge(capacity))
    } else {
        Ok(capacity)
    }
}
