//! Flat key/value entity cache with manual invalidation.
//!
//! No eviction, no expiry, no TTL: an entry lives until something clears it.
//! The contract callers rely on is that `get` returns the last value `set`
//! for a key until that key (or its table) is cleared.

use std::{fmt, sync::Arc};

use dashmap::DashMap;
use serde_json::Value;

/// Cache keys are scoped by table so writes can invalidate everything the
/// table contributed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Record { table: String, id: String },
    List { table: String, fingerprint: String },
}

impl CacheKey {
    pub fn record(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Record {
            table: table.into(),
            id: id.into(),
        }
    }

    pub fn list(table: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self::List {
            table: table.into(),
            fingerprint: fingerprint.into(),
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::Record { table, .. } | Self::List { table, .. } => table,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record { table, id } => write!(f, "{table}/{id}"),
            Self::List { table, fingerprint } => write!(f, "{table}/list/{fingerprint}"),
        }
    }
}

#[derive(Clone, Default)]
pub struct EntityCache {
    entries: Arc<DashMap<CacheKey, Value>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: CacheKey, payload: Value) {
        self.entries.insert(key, payload);
    }

    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn is_cached(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove one entry. Returns whether anything was stored under the key.
    pub fn clear(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry belonging to a table, record and list keys alike.
    pub fn clear_table(&self, table: &str) {
        self.entries.retain(|key, _| key.table() != table);
    }

    pub fn clear_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_returns_last_set_value_until_cleared() {
        let cache = EntityCache::new();
        let key = CacheKey::record("customers", "1");

        assert!(!cache.is_cached(&key));
        cache.set(key.clone(), json!({"name": "Ada"}));
        assert_eq!(cache.get(&key), Some(json!({"name": "Ada"})));

        cache.set(key.clone(), json!({"name": "Grace"}));
        assert_eq!(cache.get(&key), Some(json!({"name": "Grace"})));

        assert!(cache.clear(&key));
        assert!(cache.get(&key).is_none());
        assert!(!cache.clear(&key));
    }

    #[test]
    fn test_clear_table_scopes_to_that_table() {
        let cache = EntityCache::new();
        cache.set(CacheKey::record("customers", "1"), json!(1));
        cache.set(CacheKey::list("customers", "abc"), json!(2));
        cache.set(CacheKey::record("orders", "1"), json!(3));

        cache.clear_table("customers");
        assert_eq!(cache.len(), 1);
        assert!(cache.is_cached(&CacheKey::record("orders", "1")));
    }

    #[test]
    fn test_clear_all() {
        let cache = EntityCache::new();
        cache.set(CacheKey::record("a", "1"), json!(1));
        cache.set(CacheKey::record("b", "2"), json!(2));
        cache.clear_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_record_and_list_keys_are_distinct() {
        let cache = EntityCache::new();
        cache.set(CacheKey::record("customers", "list"), json!(1));
        assert!(!cache.is_cached(&CacheKey::list("customers", "list")));
    }
}
