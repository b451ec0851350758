//! Status-class and tag resolution for recorded requests
//!
//! Pure helpers that derive metric tag values from an observable request
//! outcome. No side effects, safe for any input.

use crate::constants::tag;
use crate::types::ResourceMethodId;
use std::collections::BTreeMap;
use std::fmt;

/// Status-code class of a completed request
///
/// The first digit of an HTTP status code, used as a metric tag. Codes
/// outside 200..=599 (and requests with no status at all) map to
/// [`StatusClass::Unknown`] rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// 200..=299
    Success,
    /// 300..=399
    Redirection,
    /// 400..=499
    ClientError,
    /// 500..=599
    ServerError,
    /// Anything else, including an absent status code
    Unknown,
}

impl StatusClass {
    /// All classes, in tag order
    pub const ALL: [Self; 5] = [
        Self::Success,
        Self::Redirection,
        Self::ClientError,
        Self::ServerError,
        Self::Unknown,
    ];

    /// Classify a raw HTTP status code
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Success,
            300..=399 => Self::Redirection,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Classify an optional status code; absence is `Unknown`
    #[must_use]
    pub const fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(code) => Self::from_code(code),
            None => Self::Unknown,
        }
    }

    /// Tag value for this class
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "2xx",
            Self::Redirection => "3xx",
            Self::ClientError => "4xx",
            Self::ServerError => "5xx",
            Self::Unknown => "unknown",
        }
    }

    /// Stable index into per-class sensor arrays
    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Success => 0,
            Self::Redirection => 1,
            Self::ClientError => 2,
            Self::ServerError => 3,
            Self::Unknown => 4,
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the tag set for a per-method metric variant
///
/// Configured global tags come first; the `method` tag is added on top.
#[must_use]
pub fn method_tags(
    global: &BTreeMap<String, String>,
    method: &ResourceMethodId,
) -> BTreeMap<String, String> {
    let mut tags = global.clone();
    tags.insert(tag::METHOD.to_string(), method.as_str().to_string());
    tags
}

/// Build the tag set for a status-class metric variant
#[must_use]
pub fn status_class_tags(
    base: &BTreeMap<String, String>,
    class: StatusClass,
) -> BTreeMap<String, String> {
    let mut tags = base.clone();
    tags.insert(tag::STATUS_CLASS.to_string(), class.as_str().to_string());
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_classes() {
        assert_eq!(StatusClass::from_code(200), StatusClass::Success);
        assert_eq!(StatusClass::from_code(204), StatusClass::Success);
        assert_eq!(StatusClass::from_code(301), StatusClass::Redirection);
        assert_eq!(StatusClass::from_code(404), StatusClass::ClientError);
        assert_eq!(StatusClass::from_code(500), StatusClass::ServerError);
        assert_eq!(StatusClass::from_code(599), StatusClass::ServerError);
    }

    #[test]
    fn test_from_code_out_of_range() {
        // 1xx is informational and outside the mapped 200..=599 range
        assert_eq!(StatusClass::from_code(100), StatusClass::Unknown);
        assert_eq!(StatusClass::from_code(199), StatusClass::Unknown);
        assert_eq!(StatusClass::from_code(0), StatusClass::Unknown);
        assert_eq!(StatusClass::from_code(600), StatusClass::Unknown);
        assert_eq!(StatusClass::from_code(u16::MAX), StatusClass::Unknown);
    }

    #[test]
    fn test_from_status_absent() {
        assert_eq!(StatusClass::from_status(None), StatusClass::Unknown);
        assert_eq!(StatusClass::from_status(Some(503)), StatusClass::ServerError);
    }

    #[test]
    fn test_tag_values() {
        assert_eq!(StatusClass::Success.as_str(), "2xx");
        assert_eq!(StatusClass::Redirection.as_str(), "3xx");
        assert_eq!(StatusClass::ClientError.as_str(), "4xx");
        assert_eq!(StatusClass::ServerError.as_str(), "5xx");
        assert_eq!(StatusClass::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_indices_match_all_order() {
        for (i, class) in StatusClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
        }
    }

    #[test]
    fn test_method_tags_layering() {
        let mut global = BTreeMap::new();
        global.insert("service".to_string(), "orders".to_string());

        let method = ResourceMethodId::new("OrdersResource.create");
        let tags = method_tags(&global, &method);

        assert_eq!(tags.get("service").map(String::as_str), Some("orders"));
        assert_eq!(
            tags.get(tag::METHOD).map(String::as_str),
            Some("OrdersResource.create")
        );
    }

    #[test]
    fn test_status_class_tags() {
        let base = BTreeMap::new();
        let tags = status_class_tags(&base, StatusClass::ClientError);
        assert_eq!(tags.get(tag::STATUS_CLASS).map(String::as_str), Some("4xx"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        for code in [0u16, 100, 200, 302, 404, 500, 999] {
            assert_eq!(StatusClass::from_code(code), StatusClass::from_code(code));
        }
    }
}
