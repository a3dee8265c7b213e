//! Cache revalidation strategies.

use metagen_core::cache::hash::sha256_bytes;
use metagen_core::{CacheBody, Error};

/// Digest algorithm used by [`FreshnessStrategy::CompareLocalDigest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
}

/// The digest an upstream index claims for a resource, in either of the
/// forms indexes commonly carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedDigest {
    /// Lowercase or uppercase hex string.
    Hex(String),
    /// Raw digest bytes.
    Raw(Vec<u8>),
}

impl ExpectedDigest {
    /// Canonical byte form of the digest. A malformed hex string is a
    /// [`Error::Validation`]: the upstream index itself is broken and
    /// retrying will not fix it.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        match self {
            ExpectedDigest::Hex(hex) => hex::decode(hex)
                .map_err(|err| Error::Validation(format!("malformed expected digest '{hex}': {err}"))),
            ExpectedDigest::Raw(bytes) => Ok(bytes.clone()),
        }
    }
}

/// How a cached entry is revalidated before being served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FreshnessStrategy {
    /// A cached body is always current. Immutable upstream resources.
    Eternal,
    /// Revalidate with `If-None-Match` / `If-Modified-Since`, preferring
    /// the entity tag when both validators are stored.
    #[default]
    ConditionalRequest,
    /// Compare the cached body against a digest the caller already knows
    /// (e.g. from a manifest) without any network traffic.
    CompareLocalDigest { algorithm: DigestAlgorithm, expected: ExpectedDigest },
}

/// Whether `body` matches `expected` under `algorithm`.
///
/// The SHA-1 case reuses the digest stored alongside the body instead of
/// rehashing; SHA-256 is computed on demand.
pub(crate) fn body_matches(
    body: &CacheBody,
    algorithm: DigestAlgorithm,
    expected: &ExpectedDigest,
) -> Result<bool, Error> {
    let expected = expected.to_bytes()?;
    let actual = match algorithm {
        DigestAlgorithm::Sha1 => hex::decode(&body.sha1)
            .map_err(|err| Error::Validation(format!("corrupt stored digest '{}': {err}", body.sha1)))?,
        DigestAlgorithm::Sha256 => sha256_bytes(body.value.as_bytes()),
    };
    Ok(actual == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: &str) -> CacheBody {
        CacheBody::new(value.into())
    }

    #[test]
    fn test_sha1_hex_match() {
        let matched = body_matches(
            &body("abc"),
            DigestAlgorithm::Sha1,
            &ExpectedDigest::Hex("a9993e364706816aba3e25717850c26c9cd0d89d".into()),
        )
        .unwrap();
        assert!(matched);
    }

    #[test]
    fn test_sha1_raw_match() {
        let raw = hex::decode("a9993e364706816aba3e25717850c26c9cd0d89d").unwrap();
        let matched =
            body_matches(&body("abc"), DigestAlgorithm::Sha1, &ExpectedDigest::Raw(raw)).unwrap();
        assert!(matched);
    }

    #[test]
    fn test_sha256_mismatch() {
        let matched = body_matches(
            &body("abc"),
            DigestAlgorithm::Sha256,
            &ExpectedDigest::Hex("00".repeat(32)),
        )
        .unwrap();
        assert!(!matched);
    }

    #[test]
    fn test_malformed_hex_is_validation_error() {
        let err = body_matches(
            &body("abc"),
            DigestAlgorithm::Sha1,
            &ExpectedDigest::Hex("not-hex".into()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
