//! Password hashing for ApoloBilling
//!
//! `*password` attribute directives store an Argon2id hash of their literal
//! value. This crate owns hashing and verification so that profiles written
//! by any service can be checked the same way.
//!
//! ```no_run
//! use apolo_auth::PasswordService;
//!
//! let password_service = PasswordService::new();
//! let hash = password_service.hash_password("secure_password")?;
//! let is_valid = password_service.verify_password("secure_password", &hash)?;
//! assert!(is_valid);
//! # Ok::<(), apolo_core::error::AppError>(())
//! ```

pub mod password;

pub use password::PasswordService;
