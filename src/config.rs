//! Strategy configuration — TOML-backed, runtime-loadable.
//!
//! Every strategy is one `[[strategies]]` entry. The engine treats entries it
//! cannot build as diagnostics, not fatal errors, so one bad entry never
//! takes down the rest of the book.

use serde::Deserialize;
use std::path::Path;

use crate::bar::Timeframe;
use crate::error::{Error, Result};
use crate::indicator::ParamValue;

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyEntry {
    pub id: String,
    /// Strategy kind tag: "PairTrade" | "Butterfly" | "DblMaPsar" | future kinds
    pub kind: String,
    /// Ordered legs (1 for trend strategies, 2-3 for arbitrage)
    pub instruments: Vec<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub min_position: i32,
    #[serde(default)]
    pub max_position: i32,
    #[serde(default)]
    pub open_threshold: f64,
    #[serde(default)]
    pub close_threshold: f64,
    #[serde(default = "default_open_volume")]
    pub open_volume: i32,
    /// Bar interval for bar-driven strategies
    #[serde(default)]
    pub timeframe: Option<String>,
    /// Positional variant-typed parameters for late binding
    #[serde(default)]
    pub params: Vec<toml::Value>,
}

fn default_open_volume() -> i32 {
    1
}

impl StrategyEntry {
    pub fn timeframe(&self) -> Result<Timeframe> {
        self.timeframe
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{}: missing timeframe", self.id)))?
            .parse()
    }

    pub fn param_values(&self) -> Result<Vec<ParamValue>> {
        self.params.iter().map(ParamValue::try_from).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub strategies: Vec<StrategyEntry>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the given path, or `config.toml` in the working directory.
    /// A missing or unreadable file degrades to an empty strategy book.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new("config.toml"));
        match Self::load(path) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "loaded config");
                cfg
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e,
                    "config not usable, starting with an empty strategy book");
                Self::default()
            }
        }
    }
}
