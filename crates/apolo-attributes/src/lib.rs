//! Attribute engine for ApoloBilling
//!
//! Matches events against attribute profiles and rewrites their fields.
//!
//! # Components
//!
//! - `compute`: evaluates a directive's value expression (`ValueComputer`)
//! - `mutator`: applies a computed value to the event
//! - `selector`: picks the best matching profile for one pass
//! - `service`: `process_event` / `get_attribute_for_event`
//!
//! # Example
//!
//! ```no_run
//! use apolo_attributes::AttributeService;
//! use apolo_cache::{DataManager, InternalDataDb};
//! use apolo_core::models::CgrEvent;
//! use apolo_core::AppConfig;
//! use apolo_filters::{FilterS, TenantIndexer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dm = Arc::new(DataManager::new(Arc::new(InternalDataDb::new()), true));
//!     dm.load_profiles_file("config/attributes.json").await?;
//!
//!     let svc = AttributeService::new(
//!         dm.clone(),
//!         Arc::new(FilterS::new()),
//!         Arc::new(TenantIndexer::new(dm)),
//!         &AppConfig::default(),
//!     )?;
//!     let reply = svc.process_event(&CgrEvent::default()).await?;
//!     println!("{}", reply.digest());
//!     Ok(())
//! }
//! ```

pub mod compute;
pub mod dynamics;
pub mod mutator;
pub mod opts;
pub mod selector;
pub mod service;
pub mod timeutil;

pub use compute::{CcUsageStrategy, ComputeRequest, DefaultCcUsage, ValueComputer};
pub use selector::{ProfileSelector, SelectRequest};
pub use service::AttributeService;
