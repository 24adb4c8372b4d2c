//! Candidate selection by tenant scan

use apolo_cache::DataManager;
use apolo_core::models::DataPoint;
use apolo_core::traits::AttributeIndexer;
use apolo_core::AppResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Returns every profile stored for the tenant, sorted by ID
///
/// Filter evaluation is left entirely to the selector.
#[derive(Debug, Clone)]
pub struct TenantIndexer {
    dm: Arc<DataManager>,
}

impl TenantIndexer {
    pub fn new(dm: Arc<DataManager>) -> Self {
        Self { dm }
    }
}

#[async_trait]
impl AttributeIndexer for TenantIndexer {
    async fn matching_profile_ids(&self, tenant: &str, _dp: &DataPoint) -> AppResult<Vec<String>> {
        let mut ids = self.dm.attribute_profile_ids(tenant).await?;
        ids.sort();
        debug!(tenant, candidates = ids.len(), "Indexed attribute profiles");
        Ok(ids)
    }
}
