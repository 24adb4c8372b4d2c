//! Events and attribute replies
//!
//! `CgrEvent` is the generic event envelope exchanged by CGRateS services.

use crate::consts::{META_OPTS, META_REQ, META_TENANT, META_VARS, NESTING_SEP};
use crate::models::datapoint::{value_as_string, DataPoint};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Generic event envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CgrEvent {
    #[serde(rename = "Tenant", default)]
    pub tenant: String,

    #[serde(rename = "ID", default)]
    pub id: String,

    #[serde(rename = "Event", default)]
    pub event: Map<String, Value>,

    #[serde(rename = "APIOpts", default)]
    pub api_opts: Map<String, Value>,
}

impl CgrEvent {
    /// Event view used while processing: `*req`, `*opts`, `*vars`, `*tenant`
    pub fn as_data_point(&self) -> DataPoint {
        let mut root = Map::new();
        root.insert(META_REQ.to_string(), Value::Object(self.event.clone()));
        root.insert(META_OPTS.to_string(), Value::Object(self.api_opts.clone()));
        root.insert(META_VARS.to_string(), Value::Object(Map::new()));
        root.insert(META_TENANT.to_string(), Value::String(self.tenant.clone()));
        DataPoint::from_map(root)
    }

    /// Copy the `*req` and `*opts` namespaces back into the envelope
    pub fn update_from(&mut self, dp: &DataPoint) {
        self.event = dp.namespace(META_REQ).cloned().unwrap_or_default();
        self.api_opts = dp.namespace(META_OPTS).cloned().unwrap_or_default();
    }

    pub fn field_as_string(&self, field: &str) -> Option<String> {
        self.event.get(field).map(value_as_string)
    }
}

/// Paths altered by one matched profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FieldsAltered {
    #[serde(rename = "MatchedProfileID")]
    pub matched_profile_id: String,

    #[serde(rename = "Fields")]
    pub fields: Vec<String>,
}

/// Reply of `AttributeSv1.ProcessEvent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcessEventReply {
    #[serde(rename = "AlteredFields")]
    pub altered_fields: Vec<FieldsAltered>,

    #[serde(rename = "CGREvent")]
    pub cgr_event: CgrEvent,
}

impl ProcessEventReply {
    /// Every altered path, once
    pub fn unique_altered_fields(&self) -> BTreeSet<String> {
        self.altered_fields
            .iter()
            .flat_map(|a| a.fields.iter().cloned())
            .collect()
    }

    /// Render the altered request fields as `Field:value,Field2:value`
    ///
    /// Fields removed from the event in a later pass are skipped.
    pub fn digest(&self) -> String {
        let req_prefix = format!("{}{}", META_REQ, NESTING_SEP);
        let mut parts = Vec::new();
        for altered in &self.altered_fields {
            for path in &altered.fields {
                let name = path.strip_prefix(&req_prefix).unwrap_or(path);
                if let Some(val) = self.cgr_event.field_as_string(name) {
                    parts.push(format!("{}:{}", name, val));
                }
            }
        }
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply() -> ProcessEventReply {
        let mut ev = CgrEvent {
            tenant: "cgrates.org".into(),
            id: "ev1".into(),
            ..Default::default()
        };
        ev.event.insert("Account".into(), json!("1001"));
        ev.event.insert("Usage".into(), json!(20));
        ProcessEventReply {
            altered_fields: vec![
                FieldsAltered {
                    matched_profile_id: "cgrates.org:ATTR_1".into(),
                    fields: vec!["*req.Account".into(), "*req.Removed".into()],
                },
                FieldsAltered {
                    matched_profile_id: "cgrates.org:ATTR_2".into(),
                    fields: vec!["*req.Usage".into(), "*req.Account".into()],
                },
            ],
            cgr_event: ev,
        }
    }

    #[test]
    fn test_digest() {
        assert_eq!(reply().digest(), "Account:1001,Usage:20,Account:1001");
        assert_eq!(ProcessEventReply::default().digest(), "");
    }

    #[test]
    fn test_unique_altered_fields() {
        let fields = reply().unique_altered_fields();
        assert_eq!(fields.len(), 3);
        assert!(fields.contains("*req.Removed"));
    }

    #[test]
    fn test_data_point_round_trip() {
        let mut ev = reply().cgr_event;
        let mut dp = ev.as_data_point();
        assert_eq!(dp.field_as_string("*tenant").unwrap(), "cgrates.org");
        dp.set("*req.Extra", json!("x")).unwrap();
        ev.update_from(&dp);
        assert_eq!(ev.field_as_string("Extra").as_deref(), Some("x"));
    }

    #[test]
    fn test_wire_names() {
        let ev: CgrEvent = serde_json::from_value(json!({
            "Tenant": "cgrates.org",
            "Event": {"Account": "1001"},
            "APIOpts": {"*context": "*sessions"}
        }))
        .unwrap();
        assert!(ev.id.is_empty());
        assert_eq!(ev.api_opts["*context"], json!("*sessions"));
    }
}
