//! Configuration file loading

use std::path::Path;

use tracing::{debug, info};

use super::simulator::SimulatorConfig;
use crate::error::{Error, Result};

/// Default location of the simulator configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/app/config/example-config.json";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`]
pub const CONFIG_PATH_ENV: &str = "SIMULATOR_CONFIG_PATH";

/// Supported configuration encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the file extension. Anything that is not
    /// `.yaml`/`.yml` is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Read, decode and validate the configuration file at `path`
pub fn load_from_path(path: impl AsRef<Path>) -> Result<SimulatorConfig> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path_str.clone(),
        source,
    })?;

    let format = ConfigFormat::from_path(path);
    debug!(path = %path_str, ?format, bytes = raw.len(), "Decoding simulator config");

    let config = parse_str(&raw, format).map_err(|reason| Error::ConfigParse {
        path: path_str.clone(),
        reason,
    })?;
    config.validate()?;

    info!(
        path = %path_str,
        clouds = config.clouds.len(),
        microservices = config.microservices.len(),
        "Loaded simulator config"
    );
    Ok(config)
}

/// Decode a configuration document without validating it
pub fn parse_str(raw: &str, format: ConfigFormat) -> std::result::Result<SimulatorConfig, String> {
    match format {
        ConfigFormat::Json => serde_json::from_str(raw).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
    }
}
