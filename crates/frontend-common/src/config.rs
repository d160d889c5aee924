//! Frontend configuration

use clinic_core::StorageConfig;

/// Keys under which the token store writes its three values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access: String,
    pub refresh: String,
    pub expiry: String,
}

impl StorageKeys {
    pub fn all(&self) -> [&str; 3] {
        [&self.access, &self.refresh, &self.expiry]
    }
}

impl From<&StorageConfig> for StorageKeys {
    fn from(config: &StorageConfig) -> Self {
        Self {
            access: config.access_key.clone(),
            refresh: config.refresh_key.clone(),
            expiry: config.expiry_key.clone(),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}
