//! Tag- and pattern-based bulk invalidation.

use super::store::CacheStore;
use crate::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

impl CacheStore {
    /// Remove every entry whose tag set intersects `tags`; returns the
    /// number removed. Tags are non-owning labels, so untagged entries and
    /// entries tagged differently are left untouched.
    pub fn invalidate_by_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> usize {
        let wanted: HashSet<&str> = tags.iter().map(AsRef::as_ref).collect();
        if wanted.is_empty() {
            return 0;
        }

        let matched: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.tags.iter().any(|t| wanted.contains(t.as_str())))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &matched {
            self.remove_entry(key);
        }
        if !matched.is_empty() {
            debug!(count = matched.len(), "invalidated entries by tag");
        }
        matched.len()
    }

    /// Remove every entry whose key matches the regular expression
    /// `pattern`; returns the number removed. An unparseable pattern is an
    /// error, not an empty match.
    pub fn invalidate_by_pattern(&mut self, pattern: &str) -> Result<usize> {
        let re = Regex::new(pattern).map_err(|e| Error::InvalidPattern(e.to_string()))?;

        let matched: Vec<String> = self
            .entries
            .keys()
            .filter(|key| re.is_match(key))
            .cloned()
            .collect();
        for key in &matched {
            self.remove_entry(key);
        }
        if !matched.is_empty() {
            debug!(count = matched.len(), pattern, "invalidated entries by pattern");
        }
        Ok(matched.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, SetOptions};
    use serde_json::json;

    fn seeded() -> CacheStore {
        let mut store = CacheStore::new(CacheConfig::default());
        store.set(
            "user_1",
            json!(1),
            SetOptions::new().with_tags(["users"]),
        );
        store.set(
            "user_2",
            json!(2),
            SetOptions::new().with_tags(["users", "admins"]),
        );
        store.set(
            "order_1",
            json!(3),
            SetOptions::new().with_tags(["orders"]),
        );
        store.set("plain", json!(4), SetOptions::new());
        store
    }

    #[test]
    fn test_tag_invalidation_is_precise() {
        let mut store = seeded();
        let removed = store.invalidate_by_tags(&["users"]);
        assert_eq!(removed, 2);
        assert!(!store.has("user_1"));
        assert!(!store.has("user_2"));
        assert!(store.has("order_1"));
        assert!(store.has("plain"));
    }

    #[test]
    fn test_tag_invalidation_intersects_any() {
        let mut store = seeded();
        let removed = store.invalidate_by_tags(&["admins", "orders"]);
        assert_eq!(removed, 2);
        assert!(store.has("user_1"));
        assert!(!store.has("user_2"));
        assert!(!store.has("order_1"));
    }

    #[test]
    fn test_empty_tag_set_removes_nothing() {
        let mut store = seeded();
        let empty: [&str; 0] = [];
        assert_eq!(store.invalidate_by_tags(&empty), 0);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_pattern_invalidation() {
        let mut store = seeded();
        let removed = store.invalidate_by_pattern("^user_").unwrap();
        assert_eq!(removed, 2);
        assert!(store.has("order_1"));
        assert!(store.has("plain"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let mut store = seeded();
        let result = store.invalidate_by_pattern("[unclosed");
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
        assert_eq!(store.len(), 4);
    }
}
