//! ApoloBilling Attribute Engine Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! shared by the attribute engine crates. It includes:
//!
//! - Domain models (AttributeProfile, CgrEvent, value expressions)
//! - Collaborator traits for profile storage, indexing and filters
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod consts;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
