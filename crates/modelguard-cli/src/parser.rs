use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::errors::ConfigError;

fn default_results_dir() -> String {
    "data/quality_results".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
    pub table: Vec<Table>,
    #[serde(default)]
    pub consistency: Vec<Consistency>,
}

#[derive(Debug, Deserialize)]
pub struct Table {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub check: Vec<CheckConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckConfig {
    Null {
        threshold: Option<f64>,
    },
    Schema {
        expected: Vec<String>,
        #[serde(default)]
        required: Vec<String>,
        #[serde(default)]
        types: BTreeMap<String, String>,
    },
    Anomaly {
        z_threshold: Option<f64>,
        columns: Option<Vec<String>>,
    },
    Range {
        bounds: BTreeMap<String, [f64; 2]>,
    },
}

#[derive(Debug, Deserialize)]
pub struct Consistency {
    pub child_table: String,
    pub child_column: String,
    pub parent_table: String,
    pub parent_column: String,
}

pub fn parse_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    if config.table.is_empty() {
        return Err(ConfigError::NoTable.into());
    }
    Ok(config)
}
