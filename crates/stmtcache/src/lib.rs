//! # stmtcache
//!
//! Bounded, thread-safe LRU cache for prepared statements.
//!
//! Entries are keyed by a connection address plus the statement text and
//! hold an opaque value (usually a statement handle). Two layouts share one
//! contract, [`StatementCache`]:
//!
//! - **ArrayLru**: fixed slot array, shift-based reordering, O(n) per call,
//!   no allocation at steady state
//! - **ListLru**: doubly-linked list with an AHash index, O(1) promotion,
//!   cheap growth and shrink
//!
//! Each cache holds its state behind a single `parking_lot` mutex, so one
//! instance can be shared across connection workers through an `Arc`.
//!
//! ```
//! use stmtcache::{PreparedCache, StatementCache, Strategy};
//!
//! let cache = PreparedCache::new(Strategy::List, 2).unwrap();
//! cache.set("10.0.0.1:5432", "SELECT 1", 1);
//! cache.set("10.0.0.1:5432", "SELECT 2", 2);
//! cache.get("10.0.0.1:5432", "SELECT 1");
//!
//! // "SELECT 2" is least recently used and makes room
//! let evicted = cache.set("10.0.0.1:5432", "SELECT 3", 3).unwrap();
//! assert_eq!(evicted.key().statement(), "SELECT 2");
//! ```

#![warn(missing_docs)]

mod array;
mod cache;
mod config;
mod error;
mod key;
mod list;
mod stats;

pub use array::ArrayLru;
pub use cache::{PreparedCache, StatementCache};
pub use config::{CacheConfig, Strategy, DEFAULT_CAPACITY};
pub use error::{Error, Result};
pub use key::{Entry, StatementKey};
pub use list::ListLru;
pub use stats::{CacheStats, StatsSnapshot};
