//! Producer topic list, read from YAML through the `config` crate.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{WorkerError, WorkerResult};

/// Location used when `TOPICS_CONFIG` is unset.
pub const DEFAULT_TOPICS_PATH: &str = "config/topics.yaml";

/// A ticker-style topic (crypto or stock).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SymbolTopic {
    pub symbol: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// An economic indicator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndicatorTopic {
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProducerSettings {
    #[serde(default = "default_videos_per_day")]
    pub videos_per_day: usize,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            videos_per_day: default_videos_per_day(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_videos_per_day() -> usize {
    3
}

/// Contents of the topics file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TopicsConfig {
    #[serde(default)]
    pub crypto: Vec<SymbolTopic>,
    #[serde(default)]
    pub stocks: Vec<SymbolTopic>,
    #[serde(default)]
    pub economic: Vec<IndicatorTopic>,
    #[serde(default)]
    pub settings: ProducerSettings,
}

/// One thing to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    Crypto { symbol: String, name: String },
    Stock { symbol: String, name: String },
    Economic { id: String, name: String },
}

impl Topic {
    pub fn name(&self) -> &str {
        match self {
            Topic::Crypto { name, .. } | Topic::Stock { name, .. } | Topic::Economic { name, .. } => {
                name
            }
        }
    }
}

impl TopicsConfig {
    /// Read `path`, with `DATAVIZ__SETTINGS__VIDEOS_PER_DAY`-style
    /// environment overrides layered on top.
    pub fn load(path: &Path) -> WorkerResult<Self> {
        if !path.is_file() {
            return Err(WorkerError::config_error(format!(
                "topics file not found: {}",
                path.display()
            )));
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix("DATAVIZ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| WorkerError::config_error(format!("{}: {}", path.display(), e)))?;

        settings
            .try_deserialize()
            .map_err(|e| WorkerError::config_error(format!("{}: {}", path.display(), e)))
    }

    /// Load from `TOPICS_CONFIG` or the default location.
    pub fn from_env() -> WorkerResult<Self> {
        let path = std::env::var("TOPICS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOPICS_PATH));
        Self::load(&path)
    }

    /// Enabled topics in file order: crypto, then stocks, then indicators.
    pub fn enabled_topics(&self) -> Vec<Topic> {
        let crypto = self.crypto.iter().filter(|t| t.enabled).map(|t| Topic::Crypto {
            symbol: t.symbol.clone(),
            name: t.name.clone(),
        });
        let stocks = self.stocks.iter().filter(|t| t.enabled).map(|t| Topic::Stock {
            symbol: t.symbol.clone(),
            name: t.name.clone(),
        });
        let economic = self.economic.iter().filter(|t| t.enabled).map(|t| Topic::Economic {
            id: t.id.clone(),
            name: t.name.clone(),
        });
        crypto.chain(stocks).chain(economic).collect()
    }
}
