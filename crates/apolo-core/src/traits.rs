//! Collaborator contracts of the attribute engine
//!
//! The engine never reaches storage or filter rules directly; it goes
//! through these traits so that backends can be swapped and mocked.

use crate::models::{AttributeProfile, DataPoint};
use crate::AppResult;
use async_trait::async_trait;

/// Evaluates filter IDs against an event
#[async_trait]
pub trait FilterPass: Send + Sync {
    /// Returns true when every filter passes; an empty list always passes
    async fn pass(&self, tenant: &str, filter_ids: &[String], dp: &DataPoint) -> AppResult<bool>;
}

/// Attribute profile persistence
#[async_trait]
pub trait AttributeProfileStore: Send + Sync {
    /// Find profile by tenant and ID
    async fn get_attribute_profile(
        &self,
        tenant: &str,
        id: &str,
    ) -> AppResult<Option<AttributeProfile>>;

    /// Insert or replace a profile
    async fn set_attribute_profile(&self, profile: &AttributeProfile) -> AppResult<()>;

    /// Delete a profile, returning whether it existed
    async fn remove_attribute_profile(&self, tenant: &str, id: &str) -> AppResult<bool>;

    /// IDs of every profile stored for a tenant
    async fn attribute_profile_ids(&self, tenant: &str) -> AppResult<Vec<String>>;
}

/// Narrows the candidate profiles for an event
#[async_trait]
pub trait AttributeIndexer: Send + Sync {
    async fn matching_profile_ids(&self, tenant: &str, dp: &DataPoint) -> AppResult<Vec<String>>;
}
