//! Cache-through access to attribute profiles
//!
//! `DataManager` sits between the engine and a data DB. Reads go through
//! the profile cache; writes hash `*password` literals before they reach
//! storage and invalidate the cached entry.

use crate::keys::attribute_profile_key;
use crate::profile_cache::ProfileCache;
use apolo_auth::PasswordService;
use apolo_core::consts::{META_CONSTANT, META_PASSWORD};
use apolo_core::models::{AttributeProfile, ExternalAttributeProfile, ValueExpr};
use apolo_core::traits::AttributeProfileStore;
use apolo_core::AppResult;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

pub struct DataManager {
    store: Arc<dyn AttributeProfileStore>,
    cache: Option<ProfileCache>,
    passwords: PasswordService,
}

impl DataManager {
    pub fn new(store: Arc<dyn AttributeProfileStore>, cache_enabled: bool) -> Self {
        Self {
            store,
            cache: cache_enabled.then(ProfileCache::new),
            passwords: PasswordService::new(),
        }
    }

    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }

    pub fn cache(&self) -> Option<&ProfileCache> {
        self.cache.as_ref()
    }

    /// Load a profile, consulting the cache first when `cache_read` is set
    #[instrument(skip(self))]
    pub async fn get_attribute_profile(
        &self,
        tenant: &str,
        id: &str,
        cache_read: bool,
    ) -> AppResult<Option<Arc<AttributeProfile>>> {
        let key = attribute_profile_key(tenant, id);

        if cache_read {
            if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&key)) {
                debug!("Profile cache HIT: {}", key);
                return Ok(cached);
            }
        }

        debug!("Profile cache MISS: {}", key);
        let prf = self
            .store
            .get_attribute_profile(tenant, id)
            .await?
            .map(Arc::new);

        if let Some(cache) = &self.cache {
            cache.set(key, prf.clone());
        }
        Ok(prf)
    }

    /// Validate and store a profile
    ///
    /// Constant `*password` directives are hashed and turned into
    /// `*constant` directives before the write.
    #[instrument(skip(self, profile), fields(tenant = %profile.tenant, id = %profile.id))]
    pub async fn set_attribute_profile(&self, mut profile: AttributeProfile) -> AppResult<()> {
        profile.validate()?;
        self.hash_password_directives(&mut profile)?;
        self.replace_attribute_profile(&profile).await
    }

    /// Store a profile exactly as given
    pub async fn replace_attribute_profile(&self, profile: &AttributeProfile) -> AppResult<()> {
        self.store.set_attribute_profile(profile).await?;
        self.invalidate(&profile.tenant, &profile.id);
        Ok(())
    }

    pub async fn remove_attribute_profile(&self, tenant: &str, id: &str) -> AppResult<bool> {
        let removed = self.store.remove_attribute_profile(tenant, id).await?;
        self.invalidate(tenant, id);
        Ok(removed)
    }

    pub async fn attribute_profile_ids(&self, tenant: &str) -> AppResult<Vec<String>> {
        self.store.attribute_profile_ids(tenant).await
    }

    /// Load a JSON array of profiles in their external form
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn load_profiles_file(&self, path: impl AsRef<Path>) -> AppResult<usize> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let profiles: Vec<ExternalAttributeProfile> = serde_json::from_str(&raw)?;

        let count = profiles.len();
        for ext in profiles {
            let prf = AttributeProfile::try_from(ext)?;
            self.set_attribute_profile(prf).await?;
        }
        info!(count, "Attribute profiles loaded");
        Ok(count)
    }

    fn invalidate(&self, tenant: &str, id: &str) {
        if let Some(cache) = &self.cache {
            cache.remove(&attribute_profile_key(tenant, id));
        }
    }

    fn hash_password_directives(&self, profile: &mut AttributeProfile) -> AppResult<()> {
        for attr in profile
            .attributes
            .iter_mut()
            .filter(|a| a.attr_type == META_PASSWORD)
        {
            // references are only known per event
            if !attr.value.tokens().iter().all(|t| t.is_constant()) {
                continue;
            }
            let literal = attr.value.parse_constant();
            let hash = if self.passwords.is_hash(&literal) {
                literal
            } else {
                self.passwords.hash_password(&literal)?
            };
            attr.attr_type = META_CONSTANT.to_string();
            attr.value = ValueExpr::constant(&hash);
        }
        Ok(())
    }
}

impl std::fmt::Debug for DataManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataManager")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InternalDataDb;
    use apolo_core::models::Attribute;
    use apolo_core::AppError;
    use std::io::Write;

    fn password_profile(literal: &str) -> AttributeProfile {
        AttributeProfile {
            tenant: "cgrates.org".into(),
            id: "ATTR_PASS".into(),
            attributes: vec![Attribute {
                path: "*req.Password".into(),
                attr_type: META_PASSWORD.into(),
                value: ValueExpr::parse(literal).unwrap(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cache_through_and_invalidation() {
        let db = Arc::new(InternalDataDb::new());
        let dm = DataManager::new(db.clone(), true);

        assert!(dm
            .get_attribute_profile("cgrates.org", "ATTR_1", true)
            .await
            .unwrap()
            .is_none());
        assert_eq!(dm.cache().unwrap().len(), 1);

        // written behind the manager's back: the cached miss still answers
        let prf = AttributeProfile {
            tenant: "cgrates.org".into(),
            id: "ATTR_1".into(),
            ..Default::default()
        };
        db.set_attribute_profile(&prf).await.unwrap();
        assert!(dm
            .get_attribute_profile("cgrates.org", "ATTR_1", true)
            .await
            .unwrap()
            .is_none());
        assert!(dm
            .get_attribute_profile("cgrates.org", "ATTR_1", false)
            .await
            .unwrap()
            .is_some());

        dm.remove_attribute_profile("cgrates.org", "ATTR_1")
            .await
            .unwrap();
        assert!(dm
            .get_attribute_profile("cgrates.org", "ATTR_1", true)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_set_hashes_password_directives() {
        let db = Arc::new(InternalDataDb::new());
        let dm = DataManager::new(db.clone(), false);

        dm.set_attribute_profile(password_profile("CGRateS.org"))
            .await
            .unwrap();

        let stored = db
            .get_attribute_profile("cgrates.org", "ATTR_PASS")
            .await
            .unwrap()
            .unwrap();
        let attr = &stored.attributes[0];
        assert_eq!(attr.attr_type, META_CONSTANT);
        assert!(dm
            .passwords()
            .verify_password("CGRateS.org", &attr.value.parse_constant())
            .unwrap());
    }

    #[tokio::test]
    async fn test_set_keeps_dynamic_password_directives() {
        let db = Arc::new(InternalDataDb::new());
        let dm = DataManager::new(db.clone(), false);

        dm.set_attribute_profile(password_profile("~*req.Secret"))
            .await
            .unwrap();

        let stored = db
            .get_attribute_profile("cgrates.org", "ATTR_PASS")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.attributes[0].attr_type, META_PASSWORD);
    }

    #[tokio::test]
    async fn test_set_rejects_invalid_profile() {
        let dm = DataManager::new(Arc::new(InternalDataDb::new()), true);
        let err = dm
            .set_attribute_profile(AttributeProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_load_profiles_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("apolo_profiles_{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"[{{"Tenant":"cgrates.org","ID":"ATTR_1","Attributes":[{{"Path":"*req.Account","Type":"*constant","Value":"1001"}}]}},
               {{"Tenant":"cgrates.org","ID":"ATTR_2"}}]"#
        )
        .unwrap();

        let dm = DataManager::new(Arc::new(InternalDataDb::new()), true);
        assert_eq!(dm.load_profiles_file(&path).await.unwrap(), 2);
        assert_eq!(
            dm.attribute_profile_ids("cgrates.org").await.unwrap(),
            vec!["ATTR_1", "ATTR_2"]
        );

        std::fs::remove_file(&path).unwrap();
    }
}
