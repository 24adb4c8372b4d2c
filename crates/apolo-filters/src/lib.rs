//! Filter evaluation for ApoloBilling
//!
//! Reference collaborators of the attribute engine:
//!
//! - `FilterS`: evaluates inline rules (`*string:~*req.Account:1001`) and
//!   named filters registered in memory
//! - `TenantIndexer`: lists every profile stored for a tenant as candidates

pub mod filters;
pub mod indexer;
pub mod rule;

pub use filters::{Filter, FilterS};
pub use indexer::TenantIndexer;
pub use rule::{FilterKind, FilterRule};
