//! Type-safe identifiers using the newtype pattern
//!
//! Request and resource-method identities are wrapped in newtypes to
//! prevent mixing them up with ordinary integers and strings.

use std::fmt;
use std::sync::Arc;

/// Opaque identity of a single request
///
/// Supplied by the dispatch layer and bound to that request's event
/// stream. Ids are never reused for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identity of a matched resource method, e.g. `ItemsResource.get`
///
/// Cheap to clone; the underlying string is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceMethodId(Arc<str>);

impl ResourceMethodId {
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceMethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceMethodId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
