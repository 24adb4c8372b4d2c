//! Data Transfer Objects (DTOs) for API requests and responses

pub mod health;
pub mod jsonrpc;

pub use health::*;
pub use jsonrpc::*;
