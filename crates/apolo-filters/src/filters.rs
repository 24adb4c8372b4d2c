//! Filter service
//!
//! A filter ID starting with `*` is an inline rule. Any other ID names a
//! filter registered for the tenant, whose rules must all pass.

use crate::rule::FilterRule;
use apolo_core::models::{tenant_id, DataPoint};
use apolo_core::traits::FilterPass;
use apolo_core::{AppError, AppResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const INLINE_PREFIX: char = '*';

/// Named filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Filter {
    #[serde(rename = "Tenant")]
    pub tenant: String,

    #[serde(rename = "ID")]
    pub id: String,

    /// Inline rules, all of which must pass
    #[serde(rename = "Rules", default)]
    pub rules: Vec<String>,
}

#[derive(Debug)]
struct CompiledFilter {
    rules: Vec<FilterRule>,
}

/// Reference filter evaluator
#[derive(Debug, Default)]
pub struct FilterS {
    named: RwLock<HashMap<String, Arc<CompiledFilter>>>,
    inline: RwLock<HashMap<String, Arc<FilterRule>>>,
}

impl FilterS {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a named filter
    ///
    /// Rules are compiled up front; a bad rule rejects the whole filter.
    pub fn set_filter(&self, filter: Filter) -> AppResult<()> {
        let rules = filter
            .rules
            .iter()
            .map(|r| FilterRule::parse(r))
            .collect::<AppResult<Vec<_>>>()?;
        self.named.write().insert(
            tenant_id(&filter.tenant, &filter.id),
            Arc::new(CompiledFilter { rules }),
        );
        Ok(())
    }

    pub fn remove_filter(&self, tenant: &str, id: &str) -> bool {
        self.named.write().remove(&tenant_id(tenant, id)).is_some()
    }

    /// Load a JSON array of named filters
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn load_filters_file(&self, path: impl AsRef<Path>) -> AppResult<usize> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let filters: Vec<Filter> = serde_json::from_str(&raw)?;

        let count = filters.len();
        for fltr in filters {
            self.set_filter(fltr)?;
        }
        info!(count, "Filters loaded");
        Ok(count)
    }

    fn inline_rule(&self, id: &str) -> AppResult<Arc<FilterRule>> {
        if let Some(rule) = self.inline.read().get(id) {
            return Ok(rule.clone());
        }
        let rule = Arc::new(FilterRule::parse(id)?);
        self.inline.write().insert(id.to_string(), rule.clone());
        Ok(rule)
    }

    fn pass_one(&self, tenant: &str, id: &str, dp: &DataPoint) -> AppResult<bool> {
        if id.starts_with(INLINE_PREFIX) {
            return self.inline_rule(id)?.pass(dp);
        }

        let filter = self
            .named
            .read()
            .get(&tenant_id(tenant, id))
            .cloned()
            .ok_or_else(|| AppError::Parse(format!("NOT_FOUND:{}", id)))?;
        for rule in &filter.rules {
            if !rule.pass(dp)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl FilterPass for FilterS {
    async fn pass(&self, tenant: &str, filter_ids: &[String], dp: &DataPoint) -> AppResult<bool> {
        for id in filter_ids {
            if !self.pass_one(tenant, id, dp)? {
                debug!(filter = %id, "Filter did not pass");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dp() -> DataPoint {
        let mut dp = DataPoint::new();
        dp.set_namespace("*req", json!({"Account": "1001", "Destination": "+491234"}));
        dp.set_namespace("*opts", json!({"*context": "*sessions"}));
        dp
    }

    #[tokio::test]
    async fn test_empty_list_passes() {
        let fs = FilterS::new();
        assert!(fs.pass("cgrates.org", &[], &dp()).await.unwrap());
    }

    #[tokio::test]
    async fn test_inline_rules_all_must_pass() {
        let fs = FilterS::new();
        let ids = vec![
            "*string:~*req.Account:1001".to_string(),
            "*string:~*opts.*context:*sessions;*cdrs".to_string(),
        ];
        assert!(fs.pass("cgrates.org", &ids, &dp()).await.unwrap());

        let ids = vec![
            "*string:~*req.Account:1001".to_string(),
            "*prefix:~*req.Destination:+40".to_string(),
        ];
        assert!(!fs.pass("cgrates.org", &ids, &dp()).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_kind_is_not_implemented() {
        let fs = FilterS::new();
        let ids = vec!["*rsr:~*req.Account:1001".to_string()];
        let err = fs.pass("cgrates.org", &ids, &dp()).await.unwrap_err();
        assert_eq!(err, AppError::NotImplemented("*rsr".into()));
        assert_eq!(err.to_string(), "NOT_IMPLEMENTED:*rsr");
    }

    #[tokio::test]
    async fn test_named_filter() {
        let fs = FilterS::new();
        fs.set_filter(Filter {
            tenant: "cgrates.org".into(),
            id: "FLTR_ACNT_1001".into(),
            rules: vec![
                "*string:~*req.Account:1001".into(),
                "*prefix:~*req.Destination:+49".into(),
            ],
        })
        .unwrap();

        let ids = vec!["FLTR_ACNT_1001".to_string()];
        assert!(fs.pass("cgrates.org", &ids, &dp()).await.unwrap());

        // named filters are tenant scoped
        let err = fs.pass("cgrates.net", &ids, &dp()).await.unwrap_err();
        assert_eq!(err.to_string(), "NOT_FOUND:FLTR_ACNT_1001");

        assert!(fs.remove_filter("cgrates.org", "FLTR_ACNT_1001"));
        assert!(fs.pass("cgrates.org", &ids, &dp()).await.is_err());
    }

    #[test]
    fn test_set_filter_rejects_bad_rule() {
        let fs = FilterS::new();
        let err = fs
            .set_filter(Filter {
                tenant: "cgrates.org".into(),
                id: "FLTR_BAD".into(),
                rules: vec!["*regexp:~*req.Account:.*".into()],
            })
            .unwrap_err();
        assert!(matches!(err, AppError::NotImplemented(_)));
    }

    #[tokio::test]
    async fn test_inline_rules_are_compiled_once() {
        let fs = FilterS::new();
        let ids = vec!["*string:~*req.Account:1001".to_string()];
        fs.pass("cgrates.org", &ids, &dp()).await.unwrap();
        fs.pass("cgrates.org", &ids, &dp()).await.unwrap();
        assert_eq!(fs.inline.read().len(), 1);
    }
}
