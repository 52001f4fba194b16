//! Ordered header storage shared by requests and responses.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::HeaderError;

/// Maximum inline headers before heap allocation. Most requests carry 16 or
/// fewer headers, so the common case stays on the stack.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Default hard ceiling on header count; configurable per store.
pub const DEFAULT_MAX_HEADER_COUNT: usize = 64;

/// A single HTTP header name/value pair.
///
/// Names are compared case-insensitively everywhere; values are opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    /// Create a header from any string-like name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered, growable collection of headers with case-insensitive lookup.
///
/// Duplicates are permitted by design to support multi-valued headers such
/// as repeated `Set-Cookie`; callers that want replace semantics use
/// [`update_or_add`](Self::update_or_add). Insertion order is preserved.
///
/// Growth is geometric (SmallVec doubling) up to a hard count ceiling;
/// exceeding the ceiling is a recoverable error, not a panic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderStore {
    entries: SmallVec<[Header; MAX_INLINE_HEADERS]>,
    max_count: usize,
}

impl Default for HeaderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderStore {
    /// Create an empty store with the default count ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_count(DEFAULT_MAX_HEADER_COUNT)
    }

    /// Create an empty store with an explicit count ceiling.
    #[must_use]
    pub fn with_max_count(max_count: usize) -> Self {
        Self {
            entries: SmallVec::new(),
            max_count,
        }
    }

    /// Find the first header with the given name, case-insensitively.
    #[inline]
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Whether any header with the given name exists.
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Append a header, even if the name already exists.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::LimitExceeded`] when the store is at its
    /// count ceiling; the store is left unchanged.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), HeaderError> {
        if self.entries.len() >= self.max_count {
            return Err(HeaderError::LimitExceeded(self.max_count));
        }
        self.entries.push(Header::new(name, value));
        Ok(())
    }

    /// Replace the value of the first header with this name, or append if
    /// no such header exists.
    pub fn update_or_add(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), HeaderError> {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|h| h.name.eq_ignore_ascii_case(&name))
        {
            existing.value = value;
            return Ok(());
        }
        self.add(name, value)
    }

    /// Remove the first header with the given name.
    ///
    /// Returns `true` if a header was removed. Later duplicates survive.
    pub fn remove(&mut self, name: &str) -> bool {
        if let Some(idx) = self
            .entries
            .iter()
            .position(|h| h.name.eq_ignore_ascii_case(name))
        {
            self.entries.remove(idx);
            true
        } else {
            false
        }
    }

    /// Iterate headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    /// Number of stored headers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all headers, keeping the ceiling.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a HeaderStore {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<Header> for HeaderStore {
    fn from_iter<T: IntoIterator<Item = Header>>(iter: T) -> Self {
        let mut store = Self::new();
        for h in iter {
            // Ceiling overflow during collection drops the tail rather
            // than panicking; explicit add() reports the error.
            if store.add(h.name, h.value).is_err() {
                break;
            }
        }
        store
    }
}
