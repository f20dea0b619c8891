use super::models::TourConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> TourConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return TourConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            TourConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<TourConfig> {
    let config: TourConfig = toml::from_str(contents).context("failed to parse config TOML")?;
    Ok(config.sanitized())
}

pub fn serialize_config(config: &TourConfig) -> Result<String> {
    toml::to_string_pretty(config).context("failed to serialize config")
}
