//! Statement identity and cached entries

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a cached statement: the connection address plus the SQL text.
///
/// The two parts are kept apart, so `("ab", "c")` and `("a", "bc")` name
/// different statements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatementKey {
    address: String,
    statement: String,
}

impl StatementKey {
    /// Build a key from an address and a statement
    pub fn new(address: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            statement: statement.into(),
        }
    }

    /// Connection address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Statement text
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Compare against borrowed parts without allocating
    pub fn matches(&self, address: &str, statement: &str) -> bool {
        self.address == address && self.statement == statement
    }
}

/// Borrowed view of a key, so an index keyed by [`StatementKey`] can be
/// probed with `(&str, &str)` without allocating
pub trait KeyParts {
    /// `(address, statement)`
    fn parts(&self) -> (&str, &str);
}

impl KeyParts for StatementKey {
    fn parts(&self) -> (&str, &str) {
        (&self.address, &self.statement)
    }
}

impl KeyParts for (&str, &str) {
    fn parts(&self) -> (&str, &str) {
        (self.0, self.1)
    }
}

// Must hash exactly like `dyn KeyParts` below
impl Hash for StatementKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.as_str().hash(state);
        self.statement.as_str().hash(state);
    }
}

impl Hash for dyn KeyParts + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (address, statement) = self.parts();
        address.hash(state);
        statement.hash(state);
    }
}

impl PartialEq for dyn KeyParts + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.parts() == other.parts()
    }
}

impl Eq for dyn KeyParts + '_ {}

impl<'a> Borrow<dyn KeyParts + 'a> for StatementKey {
    fn borrow(&self) -> &(dyn KeyParts + 'a) {
        self
    }
}

impl fmt::Display for StatementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.statement)
    }
}

/// A cached binding, handed back whenever the cache gives one up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    key: StatementKey,
    value: V,
}

impl<V> Entry<V> {
    pub(crate) fn new(key: StatementKey, value: V) -> Self {
        Self { key, value }
    }

    /// Identity of the entry
    pub fn key(&self) -> &StatementKey {
        &self.key
    }

    /// Cached value
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Split into key and value
    pub fn into_parts(self) -> (StatementKey, V) {
        (self.key, self.value)
    }

    /// Take the value, dropping the key
    pub fn into_value(self) -> V {
        self.value
    }

    pub(crate) fn replace_value(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }
}
