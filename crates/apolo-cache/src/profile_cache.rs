//! In-process attribute profile cache
//!
//! Owned by a [`DataManager`](crate::DataManager) instance; there is no
//! process-wide cache. Misses are cached too, so repeated lookups of an
//! unknown ID do not go back to storage until the entry is invalidated.

use apolo_core::models::AttributeProfile;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Cached lookup result: `None` records a known miss
pub type CachedProfile = Option<Arc<AttributeProfile>>;

#[derive(Debug, Default)]
pub struct ProfileCache {
    items: RwLock<HashMap<String, CachedProfile>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the key was never looked up
    pub fn get(&self, key: &str) -> Option<CachedProfile> {
        self.items.read().get(key).cloned()
    }

    pub fn set(&self, key: String, value: CachedProfile) {
        self.items.write().insert(key, value);
    }

    pub fn remove(&self, key: &str) {
        self.items.write().remove(key);
    }

    pub fn clear(&self) {
        self.items.write().clear();
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_miss_and_negative_entry() {
        let cache = ProfileCache::new();
        assert!(cache.get("alp_cgrates.org:ATTR_1").is_none());

        cache.set("alp_cgrates.org:ATTR_1".into(), None);
        assert_eq!(cache.get("alp_cgrates.org:ATTR_1"), Some(None));

        let prf = Arc::new(AttributeProfile {
            tenant: "cgrates.org".into(),
            id: "ATTR_1".into(),
            ..Default::default()
        });
        cache.set("alp_cgrates.org:ATTR_1".into(), Some(prf.clone()));
        assert_eq!(cache.get("alp_cgrates.org:ATTR_1"), Some(Some(prf)));
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = ProfileCache::new();
        cache.set("a".into(), None);
        cache.set("b".into(), None);
        cache.remove("a");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
