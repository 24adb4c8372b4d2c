//! In-memory data DB
//!
//! Default profile store when no Redis backend is configured, and the store
//! used by tests.

use crate::keys::attribute_profile_key;
use apolo_core::models::AttributeProfile;
use apolo_core::traits::AttributeProfileStore;
use apolo_core::AppResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/// Attribute profiles kept in process memory
#[derive(Debug, Default)]
pub struct InternalDataDb {
    // ordered so that ID listings come back sorted
    profiles: RwLock<BTreeMap<String, AttributeProfile>>,
}

impl InternalDataDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

#[async_trait]
impl AttributeProfileStore for InternalDataDb {
    async fn get_attribute_profile(
        &self,
        tenant: &str,
        id: &str,
    ) -> AppResult<Option<AttributeProfile>> {
        Ok(self
            .profiles
            .read()
            .get(&attribute_profile_key(tenant, id))
            .cloned())
    }

    async fn set_attribute_profile(&self, profile: &AttributeProfile) -> AppResult<()> {
        let key = attribute_profile_key(&profile.tenant, &profile.id);
        debug!("SET {}", key);
        self.profiles.write().insert(key, profile.clone());
        Ok(())
    }

    async fn remove_attribute_profile(&self, tenant: &str, id: &str) -> AppResult<bool> {
        let key = attribute_profile_key(tenant, id);
        debug!("DEL {}", key);
        Ok(self.profiles.write().remove(&key).is_some())
    }

    async fn attribute_profile_ids(&self, tenant: &str) -> AppResult<Vec<String>> {
        let prefix = attribute_profile_key(tenant, "");
        Ok(self
            .profiles
            .read()
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, prf)| prf.id.clone())
            .collect())
    }
}
