//! Client configuration and initialization

use clinic_core::ApiConfig;
use clinic_http::{PublicClinicClient, TypedClientBuilder};
use std::time::Duration;

pub use clinic_http::ClientError;
pub use reqwest::Method;

/// Build the public client for the configured API
pub fn create_public_client(config: &ApiConfig) -> Result<PublicClinicClient, ClientError> {
    let mut builder = TypedClientBuilder::new()
        .base_url(config.base_url.clone())
        .user_agent(config.user_agent.clone());

    if config.timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.timeout_secs));
    }

    builder.build_public()
}
