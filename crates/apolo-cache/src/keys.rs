//! Storage key constants and builders for attribute profiles
//!
//! Provides standardized key naming so that the Redis data DB and the
//! in-process cache address profiles the same way.
//!
//! # Key Patterns
//!
//! - `alp_{tenant}:{id}` - Serialized attribute profile
//! - `alp_ids:{tenant}` - Set of profile IDs stored for a tenant
//!
//! # Example
//!
//! ```
//! use apolo_cache::keys;
//!
//! let key = keys::attribute_profile_key("cgrates.org", "ATTR_1");
//! assert_eq!(key, "alp_cgrates.org:ATTR_1");
//!
//! let ids = keys::attribute_profile_ids_key("cgrates.org");
//! assert_eq!(ids, "alp_ids:cgrates.org");
//! ```

/// Prefix for attribute profiles
///
/// Format: `alp_{tenant}:{id}`
pub const ATTRIBUTE_PROFILE_PREFIX: &str = "alp_";

/// Prefix for the per-tenant ID set
///
/// Format: `alp_ids:{tenant}`
pub const ATTRIBUTE_PROFILE_IDS_PREFIX: &str = "alp_ids";

/// Build the storage key of an attribute profile
///
/// # Example
///
/// ```
/// use apolo_cache::keys::attribute_profile_key;
///
/// assert_eq!(attribute_profile_key("cgrates.org", "ATTR_1"), "alp_cgrates.org:ATTR_1");
/// ```
pub fn attribute_profile_key(tenant: &str, id: &str) -> String {
    format!("{}{}:{}", ATTRIBUTE_PROFILE_PREFIX, tenant, id)
}

/// Build the key of the set holding a tenant's profile IDs
pub fn attribute_profile_ids_key(tenant: &str) -> String {
    format!("{}:{}", ATTRIBUTE_PROFILE_IDS_PREFIX, tenant)
}
