//! CLI configuration loading

use anyhow::{Context, Result, bail};
use clinic_core::ClinicConfig;
use std::path::{Path, PathBuf};

/// Load configuration, then apply command-line overrides
pub fn load(
    path: Option<&Path>,
    data_dir: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<ClinicConfig> {
    let mut config = match path {
        Some(path) => ClinicConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClinicConfig::from_env().context("loading configuration from environment")?,
    };

    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    if let Some(base_url) = base_url {
        if base_url.trim().is_empty() {
            bail!("--base-url must not be empty");
        }
        config.api.base_url = base_url;
    }

    Ok(config)
}
