//! Filter-conditioned weights and blockers
//!
//! Entries are checked in order and the first one whose filters pass wins.
//! An entry without filters always passes.

use apolo_core::models::{DataPoint, DynamicBlocker, DynamicWeight};
use apolo_core::traits::FilterPass;
use apolo_core::AppResult;

pub async fn weight_from_dynamics(
    filters: &dyn FilterPass,
    tenant: &str,
    weights: &[DynamicWeight],
    dp: &DataPoint,
) -> AppResult<f64> {
    for w in weights {
        if filters.pass(tenant, &w.filter_ids, dp).await? {
            return Ok(w.weight);
        }
    }
    Ok(0.0)
}

pub async fn blocker_from_dynamics(
    filters: &dyn FilterPass,
    tenant: &str,
    blockers: &[DynamicBlocker],
    dp: &DataPoint,
) -> AppResult<bool> {
    for b in blockers {
        if filters.pass(tenant, &b.filter_ids, dp).await? {
            return Ok(b.blocker);
        }
    }
    Ok(false)
}
