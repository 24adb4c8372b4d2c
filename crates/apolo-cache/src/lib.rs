//! Attribute profile storage for ApoloBilling
//!
//! Provides the data DBs behind the attribute engine and the cache-through
//! manager the engine talks to.
//!
//! # Features
//!
//! - `InternalDataDb`: in-memory store, the default backend
//! - `RedisDataDb`: JSON documents in Redis via a ConnectionManager
//! - `ProfileCache`: per-manager cache of loaded profiles, misses included
//! - `DataManager`: cache-through reads, password hashing on write
//!
//! # Example
//!
//! ```no_run
//! use apolo_cache::{DataManager, InternalDataDb};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dm = DataManager::new(Arc::new(InternalDataDb::new()), true);
//!     dm.load_profiles_file("config/attributes.json").await?;
//!
//!     let prf = dm.get_attribute_profile("cgrates.org", "ATTR_1", true).await?;
//!     println!("{:?}", prf);
//!     Ok(())
//! }
//! ```

pub mod internal;
pub mod keys;
pub mod manager;
pub mod profile_cache;
pub mod redis_db;

pub use internal::InternalDataDb;
pub use manager::DataManager;
pub use profile_cache::ProfileCache;
pub use redis_db::RedisDataDb;
