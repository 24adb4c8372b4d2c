//! Domain models for the attribute engine

pub mod datapoint;
pub mod event;
pub mod expr;
pub mod profile;

pub use datapoint::{split_path, value_as_string, DataPoint};
pub use event::{CgrEvent, FieldsAltered, ProcessEventReply};
pub use expr::{SearchReplace, ValueExpr, ValueToken};
pub use profile::{
    tenant_id, Attribute, AttributeProfile, DynamicBlocker, DynamicBlockers, DynamicWeight,
    DynamicWeights, ExternalAttribute, ExternalAttributeProfile,
};
