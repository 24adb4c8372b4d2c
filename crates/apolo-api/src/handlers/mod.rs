//! HTTP request handlers

pub mod attributes;
pub mod health;

pub use attributes::configure as configure_attributes;
pub use attributes::configure_jsonrpc;
pub use health::configure as configure_health;
