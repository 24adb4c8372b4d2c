//! Attribute profiles
//!
//! Declarative rules telling the engine which event fields to rewrite and
//! how. Wire names follow the CGRateS JSON layout.

use crate::consts::CONCATENATED_KEY_SEP;
use crate::models::expr::ValueExpr;
use crate::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Weight entry, applied when its filters pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DynamicWeight {
    #[serde(rename = "FilterIDs", default)]
    pub filter_ids: Vec<String>,

    #[serde(rename = "Weight")]
    pub weight: f64,
}

/// Blocker entry, applied when its filters pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DynamicBlocker {
    #[serde(rename = "FilterIDs", default)]
    pub filter_ids: Vec<String>,

    #[serde(rename = "Blocker")]
    pub blocker: bool,
}

pub type DynamicWeights = Vec<DynamicWeight>;
pub type DynamicBlockers = Vec<DynamicBlocker>;

/// One mutation directive of a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Attribute {
    #[serde(rename = "FilterIDs", default)]
    pub filter_ids: Vec<String>,

    #[serde(rename = "Blockers", default)]
    pub blockers: DynamicBlockers,

    #[serde(rename = "Path", default)]
    pub path: String,

    /// Empty means `*variable`
    #[serde(rename = "Type", default)]
    pub attr_type: String,

    #[serde(rename = "Value", default)]
    pub value: ValueExpr,
}

/// Attribute profile as stored and matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, Validate)]
pub struct AttributeProfile {
    #[serde(rename = "Tenant")]
    #[validate(length(min = 1))]
    pub tenant: String,

    #[serde(rename = "ID")]
    #[validate(length(min = 1))]
    pub id: String,

    #[serde(rename = "FilterIDs", default)]
    pub filter_ids: Vec<String>,

    #[serde(rename = "Weights", default)]
    pub weights: DynamicWeights,

    #[serde(rename = "Blockers", default)]
    pub blockers: DynamicBlockers,

    #[serde(rename = "Attributes", default)]
    pub attributes: Vec<Attribute>,
}

impl AttributeProfile {
    /// Inline identifier, `tenant:ID`
    pub fn tenant_id(&self) -> String {
        tenant_id(&self.tenant, &self.id)
    }
}

/// Build the inline `tenant:ID` identifier
pub fn tenant_id(tenant: &str, id: &str) -> String {
    format!("{}{}{}", tenant, CONCATENATED_KEY_SEP, id)
}

/// Attribute rendered for API replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExternalAttribute {
    #[serde(rename = "FilterIDs", default)]
    pub filter_ids: Vec<String>,

    #[serde(rename = "Blockers", default)]
    pub blockers: DynamicBlockers,

    #[serde(rename = "Path", default)]
    pub path: String,

    #[serde(rename = "Type", default)]
    pub attr_type: String,

    #[serde(rename = "Value", default)]
    pub value: String,
}

/// Attribute profile with every value expression rendered as its rule string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExternalAttributeProfile {
    #[serde(rename = "Tenant")]
    pub tenant: String,

    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "FilterIDs", default)]
    pub filter_ids: Vec<String>,

    #[serde(rename = "Weights", default)]
    pub weights: DynamicWeights,

    #[serde(rename = "Blockers", default)]
    pub blockers: DynamicBlockers,

    #[serde(rename = "Attributes", default)]
    pub attributes: Vec<ExternalAttribute>,
}

impl From<&AttributeProfile> for ExternalAttributeProfile {
    fn from(prf: &AttributeProfile) -> Self {
        Self {
            tenant: prf.tenant.clone(),
            id: prf.id.clone(),
            filter_ids: prf.filter_ids.clone(),
            weights: prf.weights.clone(),
            blockers: prf.blockers.clone(),
            attributes: prf
                .attributes
                .iter()
                .map(|a| ExternalAttribute {
                    filter_ids: a.filter_ids.clone(),
                    blockers: a.blockers.clone(),
                    path: a.path.clone(),
                    attr_type: a.attr_type.clone(),
                    value: a.value.rule().to_string(),
                })
                .collect(),
        }
    }
}

impl TryFrom<ExternalAttributeProfile> for AttributeProfile {
    type Error = AppError;

    fn try_from(ext: ExternalAttributeProfile) -> AppResult<Self> {
        let attributes = ext
            .attributes
            .into_iter()
            .map(|a| {
                Ok(Attribute {
                    value: ValueExpr::parse(&a.value)?,
                    filter_ids: a.filter_ids,
                    blockers: a.blockers,
                    path: a.path,
                    attr_type: a.attr_type,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let prf = AttributeProfile {
            tenant: ext.tenant,
            id: ext.id,
            filter_ids: ext.filter_ids,
            weights: ext.weights,
            blockers: ext.blockers,
            attributes,
        };
        prf.validate()?;
        Ok(prf)
    }
}
