//! Configuration for the clinic session client

use crate::CoreResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment prefix used for overrides, e.g. `CLINIC_API__BASE_URL`
pub const ENV_PREFIX: &str = "CLINIC";

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    /// REST API configuration
    pub api: ApiConfig,

    /// Token storage configuration
    pub storage: StorageConfig,

    /// Directory holding the persistent key-value store
    pub data_dir: PathBuf,
}

/// REST API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the clinic API, without a trailing slash
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Storage keys and defaults for the token store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub access_key: String,
    pub refresh_key: String,
    pub expiry_key: String,

    /// Whether logins persist across restarts when the caller does not say
    pub remember_me_default: bool,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("clinic"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 30,
            user_agent: concat!("clinic-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            access_key: "clinic_access_token".to_string(),
            refresh_key: "clinic_refresh_token".to_string(),
            expiry_key: "clinic_token_expiry".to_string(),
            remember_me_default: false,
        }
    }
}

impl ClinicConfig {
    /// Load configuration from file, with `CLINIC_` environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> CoreResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> CoreResult<Self> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("api.user_agent", defaults.api.user_agent)?
            .set_default("storage.access_key", defaults.storage.access_key)?
            .set_default("storage.refresh_key", defaults.storage.refresh_key)?
            .set_default("storage.expiry_key", defaults.storage.expiry_key)?
            .set_default(
                "storage.remember_me_default",
                defaults.storage.remember_me_default,
            )?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the file backing the persistent key-value store
    pub fn local_store_path(&self) -> PathBuf {
        self.data_dir.join("local-storage.json")
    }

    fn validate(&self) -> CoreResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(crate::CoreError::invalid_config("api.base_url is empty"));
        }
        let keys = [
            &self.storage.access_key,
            &self.storage.refresh_key,
            &self.storage.expiry_key,
        ];
        if keys.iter().any(|key| key.is_empty()) {
            return Err(crate::CoreError::invalid_config("storage keys must not be empty"));
        }
        if keys[0] == keys[1] || keys[1] == keys[2] || keys[0] == keys[2] {
            return Err(crate::CoreError::invalid_config("storage keys must be distinct"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[api]\nbase_url = \"https://clinic.example/api\"").unwrap();

        let config = ClinicConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://clinic.example/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_duplicate_storage_keys_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[storage]\naccess_key = \"token\"\nrefresh_key = \"token\""
        )
        .unwrap();

        let err = ClinicConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, crate::CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn test_local_store_path_under_data_dir() {
        let config = ClinicConfig {
            data_dir: PathBuf::from("/tmp/clinic-test"),
            ..ClinicConfig::default()
        };
        assert_eq!(
            config.local_store_path(),
            PathBuf::from("/tmp/clinic-test/local-storage.json")
        );
    }
}
