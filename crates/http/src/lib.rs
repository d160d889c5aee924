//! Clinic HTTP client
//!
//! Typed clients for the clinic REST API. Public endpoints (login,
//! registration, token refresh) live on [`client::PublicClinicClient`];
//! endpoints that need a bearer token live on
//! [`client::AuthenticatedClinicClient`].

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::{AuthenticatedClinicClient, PublicClinicClient, TypedClientBuilder};
