// ⚙️ Configuration
// Defaults <- optional TOML file <- environment <- CLI flags (applied by the binaries)

use crate::aggregate::BarMode;
use crate::dataset::Encoding;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "SALES_DASHBOARD_CONFIG";
pub const DATA_ENV: &str = "SALES_DASHBOARD_DATA";
pub const ADDR_ENV: &str = "SALES_DASHBOARD_ADDR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Sales CSV export
    pub data_path: PathBuf,

    /// Text encoding of the CSV
    pub encoding: Encoding,

    /// Web server listen address
    pub bind_addr: String,

    /// Initial control values (fall back to the first option when absent from the data)
    pub default_year: i32,
    pub default_country: String,
    pub default_bar_mode: BarMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_path: PathBuf::from("sales_data_sample.csv"),
            encoding: Encoding::Latin1,
            bind_addr: "0.0.0.0:8050".to_string(),
            default_year: 2003,
            default_country: "USA".to_string(),
            default_bar_mode: BarMode::Group,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Resolve configuration from an explicit file, `SALES_DASHBOARD_CONFIG`,
    /// or built-in defaults, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = env::var_os(CONFIG_ENV).map(PathBuf::from);

        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };

        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(data) = lookup(DATA_ENV) {
            self.data_path = PathBuf::from(data);
        }
        if let Some(addr) = lookup(ADDR_ENV) {
            self.bind_addr = addr;
        }
    }

    /// CLI flags take precedence over everything else
    pub fn with_overrides(mut self, data_path: Option<PathBuf>, bind_addr: Option<String>) -> Self {
        if let Some(data_path) = data_path {
            self.data_path = data_path;
        }
        if let Some(bind_addr) = bind_addr {
            self.bind_addr = bind_addr;
        }
        self
    }
}
