//! Cache Key Module
//!
//! Derives the storage location name for a resolved upstream URL.

use std::fmt;

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
const KEY_LENGTH: usize = 64;

// == Cache Key ==
/// Hex SHA-256 of a fully resolved upstream URL.
///
/// Stable across calls and process restarts, and safe to use as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Computes the key for a resolved upstream URL.
    pub fn for_url(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        Self(hex::encode(digest))
    }

    /// Recognises a file name previously produced by [`CacheKey::as_str`].
    ///
    /// Returns `None` for temp files and anything else sharing the directory.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let is_key = name.len() == KEY_LENGTH
            && name
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        is_key.then(|| Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = CacheKey::for_url("https://example.org/api/blocks");
        let b = CacheKey::for_url("https://example.org/api/blocks");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_known_digest() {
        // sha256("") is a fixed, well-known value
        assert_eq!(
            CacheKey::for_url("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_distinct_urls_distinct_keys() {
        let a = CacheKey::for_url("https://example.org/api/a");
        let b = CacheKey::for_url("https://example.org/api/b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_file_name_roundtrip() {
        let key = CacheKey::for_url("https://example.org/");
        assert_eq!(CacheKey::from_file_name(key.as_str()), Some(key));
    }

    #[test]
    fn test_from_file_name_rejects_temp_files() {
        let key = CacheKey::for_url("https://example.org/");
        let temp = format!("{}.tmp.1234", key);
        assert!(CacheKey::from_file_name(&temp).is_none());
        assert!(CacheKey::from_file_name("README").is_none());
        assert!(CacheKey::from_file_name(&key.as_str().to_uppercase()).is_none());
    }
}
