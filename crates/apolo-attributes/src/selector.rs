//! Profile selection
//!
//! Picks the single best profile for one pass: highest weight among the
//! candidates whose filters pass, ties going to the lexically smallest
//! `tenant:ID`.

use crate::dynamics::weight_from_dynamics;
use apolo_cache::DataManager;
use apolo_core::consts::{META_VARS, NESTING_SEP, VAR_AP_TENANT_ID};
use apolo_core::models::{AttributeProfile, DataPoint};
use apolo_core::traits::{AttributeIndexer, FilterPass};
use apolo_core::{AppError, AppResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Per-pass selection inputs
#[derive(Debug, Clone, Copy)]
pub struct SelectRequest<'a> {
    pub tenant: &'a str,
    /// Bypasses the indexer when not empty
    pub profile_ids: &'a [String],
    /// Honoured only together with `profile_ids`
    pub ignore_filters: bool,
    /// Profile applied in the previous pass, never picked twice in a row
    pub last_id: Option<&'a str>,
    /// Times each `tenant:ID` was applied in this call
    pub processed: &'a HashMap<String, usize>,
    /// Cap on `processed`, 0 or less meaning unlimited
    pub profile_runs: i64,
}

pub struct ProfileSelector {
    dm: Arc<DataManager>,
    filters: Arc<dyn FilterPass>,
    indexer: Arc<dyn AttributeIndexer>,
}

impl ProfileSelector {
    pub fn new(
        dm: Arc<DataManager>,
        filters: Arc<dyn FilterPass>,
        indexer: Arc<dyn AttributeIndexer>,
    ) -> Self {
        Self {
            dm,
            filters,
            indexer,
        }
    }

    /// Select the profile to apply
    ///
    /// `*vars.*apTenantID` is updated while candidates are evaluated and
    /// holds the winner on return. Returns `NotFound` when nothing matches.
    #[instrument(skip(self, req, dp), fields(tenant = %req.tenant))]
    pub async fn select(
        &self,
        req: &SelectRequest<'_>,
        dp: &mut DataPoint,
    ) -> AppResult<Arc<AttributeProfile>> {
        let (candidates, ignore_filters) = if req.profile_ids.is_empty() {
            (
                self.indexer.matching_profile_ids(req.tenant, dp).await?,
                false,
            )
        } else {
            (req.profile_ids.to_vec(), req.ignore_filters)
        };

        let mut best: Option<(f64, String, Arc<AttributeProfile>)> = None;
        for id in &candidates {
            let Some(prf) = self.dm.get_attribute_profile(req.tenant, id, true).await? else {
                continue;
            };
            let tnt_id = prf.tenant_id();
            set_ap_tenant_id(dp, &tnt_id)?;

            if !ignore_filters && !self.filters.pass(req.tenant, &prf.filter_ids, dp).await? {
                continue;
            }
            let weight =
                weight_from_dynamics(self.filters.as_ref(), req.tenant, &prf.weights, dp).await?;

            if req.last_id == Some(tnt_id.as_str()) {
                continue;
            }
            if req.profile_runs > 0
                && req.processed.get(&tnt_id).copied().unwrap_or(0) as i64 >= req.profile_runs
            {
                continue;
            }

            let better = match &best {
                None => true,
                Some((w, bid, _)) => weight > *w || (weight == *w && tnt_id < *bid),
            };
            if better {
                best = Some((weight, tnt_id, prf));
            }
        }

        let (weight, tnt_id, prf) = best.ok_or(AppError::NotFound)?;
        set_ap_tenant_id(dp, &tnt_id)?;
        debug!(profile = %tnt_id, weight, "Attribute profile selected");
        Ok(prf)
    }
}

fn set_ap_tenant_id(dp: &mut DataPoint, tnt_id: &str) -> AppResult<()> {
    let path = format!("{}{}{}", META_VARS, NESTING_SEP, VAR_AP_TENANT_ID);
    dp.set(&path, Value::String(tnt_id.to_string()))?;
    Ok(())
}
