//! Request fingerprint and cache key derivation.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Deterministic identity of a logical request: method, URL, and the
/// serialized body. Two calls with the same fingerprint share one transport
/// and one cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    raw: String,
    digest: String,
}

impl Fingerprint {
    pub fn new(method: &str, url: &str, body: Option<&Value>) -> Self {
        let body_repr = match body {
            Some(value) => serde_json::to_string(value).unwrap_or_default(),
            None => "null".to_string(),
        };
        let raw = format!("{}:{}:{}", method.to_uppercase(), url, body_repr);

        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        let digest: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();

        Self { raw, digest }
    }

    /// Human-readable form, for logs.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Hex digest used as the cache and pending-table key.
    pub fn cache_key(&self) -> &str {
        &self.digest
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
