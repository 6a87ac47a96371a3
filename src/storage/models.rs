use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A persisted `shortCode -> originalURL` association
///
/// Immutable once created; changing a mapping means delete + recreate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub short_code: String,
    #[serde(rename = "originalURL")]
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Mapping {
    pub fn new(short_code: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            short_code: short_code.into(),
            original_url: original_url.into(),
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Set `expires_at` to `created_at + ttl`
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.expires_at = ttl.map(|ttl| self.created_at + ttl);
        self
    }

    pub fn with_expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Live mappings are the only ones lookups may return
    #[inline]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }

    /// Whether this mapping binds exactly `code` to `url`
    pub fn binds(&self, code: &str, url: &str) -> bool {
        self.short_code == code && self.original_url == url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_sets_expiry_from_creation() {
        let m = Mapping::new("abc", "https://example.com").with_ttl(Some(Duration::days(7)));
        assert_eq!(m.expires_at, Some(m.created_at + Duration::days(7)));
        assert!(m.is_live(Utc::now()));
        assert!(!m.is_live(m.created_at + Duration::days(8)));
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let m = Mapping::new("abc", "https://example.com").with_ttl(None);
        assert!(m.is_live(Utc::now() + Duration::days(36500)));
    }

    #[test]
    fn test_wire_field_names() {
        let m = Mapping::new("abc", "https://example.com");
        let json = serde_json::to_value(&m).expect("serialize");
        assert_eq!(json["shortCode"], "abc");
        assert_eq!(json["originalURL"], "https://example.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("expiresAt").is_none());
    }
}
