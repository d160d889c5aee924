//! Clinic core types and utilities

pub mod config;
pub mod error;
pub mod types;

pub use config::{ApiConfig, ClinicConfig, StorageConfig};
pub use error::{CoreError, CoreResult};
pub use types::{Role, SessionTokens, TokenExpiry, User};
