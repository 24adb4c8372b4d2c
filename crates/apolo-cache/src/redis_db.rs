//! Redis data DB
//!
//! Profiles are stored as JSON strings under `alp_{tenant}:{id}`; a set per
//! tenant tracks the IDs so listing never has to scan the keyspace.

use crate::keys::{attribute_profile_ids_key, attribute_profile_key};
use apolo_core::error::AppError;
use apolo_core::models::AttributeProfile;
use apolo_core::traits::AttributeProfileStore;
use apolo_core::AppResult;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use tracing::{debug, error, warn};

/// Redis-backed attribute profile store
///
/// Wraps a Redis ConnectionManager to provide multiplexed access. All
/// operations are async and return Results with AppError.
#[derive(Clone)]
pub struct RedisDataDb {
    manager: ConnectionManager,
}

impl RedisDataDb {
    /// Connect to Redis
    ///
    /// # Errors
    ///
    /// Returns `AppError::NoDatabaseConn` if the connection fails
    pub async fn new(url: &str) -> Result<Self, AppError> {
        debug!("Connecting to Redis at {}", url);

        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            AppError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to establish Redis connection: {}", e);
            AppError::NoDatabaseConn
        })?;

        debug!("Redis connection established successfully");
        Ok(Self { manager })
    }

    /// Ping the Redis server to check connectivity
    pub async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    /// Flush all keys from the current database
    #[cfg(test)]
    pub async fn flush_db(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}

/// Convert RedisError to AppError
///
/// Lost connections surface as `NO_DATABASE_CONNECTION`, which the engine
/// passes to callers unwrapped.
pub fn map_redis_error(err: RedisError) -> AppError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        error!("Redis connection error: {}", err);
        return AppError::NoDatabaseConn;
    }
    match err.kind() {
        redis::ErrorKind::TypeError => {
            warn!("Redis type error: {}", err);
            AppError::Cache(format!("Type mismatch: {}", err))
        }
        _ => {
            error!("Redis error: {}", err);
            AppError::Cache(err.to_string())
        }
    }
}

#[async_trait]
impl AttributeProfileStore for RedisDataDb {
    async fn get_attribute_profile(
        &self,
        tenant: &str,
        id: &str,
    ) -> AppResult<Option<AttributeProfile>> {
        let key = attribute_profile_key(tenant, id);
        debug!("GET {}", key);
        let mut conn = self.manager.clone();

        let result: Option<String> = conn.get(&key).await.map_err(map_redis_error)?;

        match result {
            Some(json) => {
                let prf = serde_json::from_str::<AttributeProfile>(&json).map_err(|e| {
                    error!("Failed to deserialize profile {}: {}", key, e);
                    AppError::Serialization(format!("Deserialization failed: {}", e))
                })?;
                Ok(Some(prf))
            }
            None => Ok(None),
        }
    }

    async fn set_attribute_profile(&self, profile: &AttributeProfile) -> AppResult<()> {
        let key = attribute_profile_key(&profile.tenant, &profile.id);
        debug!("SET {}", key);
        let mut conn = self.manager.clone();

        let json = serde_json::to_string(profile)?;

        let _: () = redis::pipe()
            .atomic()
            .set(&key, json)
            .ignore()
            .sadd(attribute_profile_ids_key(&profile.tenant), &profile.id)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        Ok(())
    }

    async fn remove_attribute_profile(&self, tenant: &str, id: &str) -> AppResult<bool> {
        let key = attribute_profile_key(tenant, id);
        debug!("DEL {}", key);
        let mut conn = self.manager.clone();

        let (deleted, _): (i64, i64) = redis::pipe()
            .atomic()
            .del(&key)
            .srem(attribute_profile_ids_key(tenant), id)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        Ok(deleted > 0)
    }

    async fn attribute_profile_ids(&self, tenant: &str) -> AppResult<Vec<String>> {
        let mut conn = self.manager.clone();

        let mut ids: Vec<String> = conn
            .smembers(attribute_profile_ids_key(tenant))
            .await
            .map_err(map_redis_error)?;
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> RedisDataDb {
        let db = RedisDataDb::new("redis://127.0.0.1:6379")
            .await
            .expect("Failed to connect to Redis");
        db.flush_db().await.expect("Failed to flush DB");
        db
    }

    fn profile(id: &str) -> AttributeProfile {
        serde_json::from_value(serde_json::json!({
            "Tenant": "cgrates.org",
            "ID": id,
            "Attributes": [{"Path": "*req.Account", "Type": "*constant", "Value": "1001"}]
        }))
        .unwrap()
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_ping() {
        let db = setup_db().await;
        assert!(db.ping().await.is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_set_and_get() {
        let db = setup_db().await;
        let prf = profile("ATTR_1");

        db.set_attribute_profile(&prf).await.unwrap();

        let found = db
            .get_attribute_profile("cgrates.org", "ATTR_1")
            .await
            .unwrap();
        assert_eq!(found, Some(prf));
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_ids_and_remove() {
        let db = setup_db().await;
        db.set_attribute_profile(&profile("ATTR_2")).await.unwrap();
        db.set_attribute_profile(&profile("ATTR_1")).await.unwrap();

        assert_eq!(
            db.attribute_profile_ids("cgrates.org").await.unwrap(),
            vec!["ATTR_1", "ATTR_2"]
        );

        assert!(db
            .remove_attribute_profile("cgrates.org", "ATTR_1")
            .await
            .unwrap());
        assert_eq!(
            db.attribute_profile_ids("cgrates.org").await.unwrap(),
            vec!["ATTR_2"]
        );
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_get_nonexistent() {
        let db = setup_db().await;
        let found = db
            .get_attribute_profile("cgrates.org", "MISSING")
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
