use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::download::archive_name;

/// Default location of the data configuration, relative to the project root
pub const DEFAULT_CONFIG_PATH: &str = "config/data.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Core tabular dataset
    pub url_core: String,
    /// Storage key (file stem) for the core dataset
    pub key_core: String,
    /// Zipped geographic framework
    pub url_geo: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub raw: PathBuf,
    pub interim: PathBuf,
    pub figures: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw: PathBuf::from("data/raw"),
            interim: PathBuf::from("data/interim"),
            figures: PathBuf::from("reports/figures"),
        }
    }
}

/// HTTP settings handed to the fetch transport
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TransportConfig {
    /// Skip TLS certificate verification. Only for hosts with broken chains.
    pub accept_invalid_certs: bool,
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            timeout_secs: 300,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn raw_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.raw)
    }

    pub fn interim_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.interim)
    }

    pub fn figures_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.figures)
    }

    /// Directory the geographic archive is extracted into
    pub fn geographic_dir(&self, root: &Path) -> Result<PathBuf> {
        let name = archive_name(&self.data.url_geo)?;
        let stem = name.strip_suffix(".zip").unwrap_or(&name);
        Ok(self.raw_dir(root).join(stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [data]
            url_core = "https://example.org/core/ITER_NALXLSX20.xlsx"
            key_core = "core"
            url_geo = "https://example.org/geo/mg_2020_integrado.zip"
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.raw, PathBuf::from("data/raw"));
        assert!(!config.transport.accept_invalid_certs);
        assert_eq!(
            config.geographic_dir(Path::new("/project")).unwrap(),
            PathBuf::from("/project/data/raw/mg_2020_integrado")
        );
    }

    #[test]
    fn test_missing_data_section_is_error() {
        let result: Result<Config, _> = toml::from_str("[paths]\nraw = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_file(dir.path().join("nope.toml")).is_err());
    }
}
