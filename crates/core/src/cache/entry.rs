//! Persisted cache entry model and merge semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hash::sha1_hex;

/// A cached response body together with its digest.
///
/// The digest is computed once at write time so revalidation by digest
/// comparison does not have to rehash the body on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBody {
    pub value: String,
    /// Lowercase hex SHA-1 of `value`.
    pub sha1: String,
}

impl CacheBody {
    pub fn new(value: String) -> Self {
        let sha1 = sha1_hex(value.as_bytes());
        Self { value, sha1 }
    }
}

/// Persisted record for one cache key.
///
/// An entry may exist with only validators (a metadata probe) or with a
/// full body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<CacheBody>,
}

impl CacheEntry {
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Apply a partial write on top of this entry.
    ///
    /// Validators merge field-by-field: a field the update does not
    /// supply keeps its previously stored value. A body, once written,
    /// is replaced wholesale on the next body-bearing write.
    pub fn merged(self, update: CacheUpdate) -> CacheEntry {
        CacheEntry {
            e_tag: update.e_tag.or(self.e_tag),
            last_modified: update.last_modified.or(self.last_modified),
            body: update.body.map(CacheBody::new).or(self.body),
        }
    }
}

/// Partial entry supplied to a write. Absent fields keep their stored
/// values; a present `body` replaces the old one and gets a fresh digest.
#[derive(Debug, Clone, Default)]
pub struct CacheUpdate {
    pub e_tag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub body: Option<String>,
}

impl CacheUpdate {
    /// A validators-only update (used by the HEAD path).
    pub fn validators(e_tag: Option<String>, last_modified: Option<DateTime<Utc>>) -> Self {
        Self { e_tag, last_modified, body: None }
    }

    /// A full update with a new body.
    pub fn with_body(e_tag: Option<String>, last_modified: Option<DateTime<Utc>>, body: String) -> Self {
        Self { e_tag, last_modified, body: Some(body) }
    }
}
