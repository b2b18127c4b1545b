use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clustering::DEFAULT_MAX_ITERATIONS;
use crate::error::DiscoveryError;
use crate::scoring::{TrendConfig, ViabilityConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub k: usize,
    pub max_iterations: usize,
    pub seed: Option<u64>,
    pub time_budget_ms: Option<u64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: 5,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: None,
            time_budget_ms: None,
        }
    }
}

impl ClusteringConfig {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
    pub max_products_per_cluster: usize,
    pub fallback_slice: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_products_per_cluster: 3,
            fallback_slice: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub clustering: ClusteringConfig,
    pub trend: TrendConfig,
    pub viability: ViabilityConfig,
    pub catalog: CatalogConfig,
    pub vocabulary: VocabularyConfig,
    pub logging: LoggingConfig,
}

impl DiscoveryConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), DiscoveryError> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents =
                    std::fs::read_to_string(path).map_err(|source| DiscoveryError::ReadFile {
                        path: path.clone(),
                        source,
                    })?;
                Self::from_toml(&contents)?
            }
            _ => DiscoveryConfig::default(),
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn from_toml(contents: &str) -> Result<Self, DiscoveryError> {
        let config: DiscoveryConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn write(&self, path: &Path) -> Result<(), DiscoveryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| DiscoveryError::WriteFile {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let payload = toml::to_string_pretty(self)?;
        std::fs::write(path, payload).map_err(|source| DiscoveryError::WriteFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_parse::<usize>("DISCOVERY_K") {
            self.clustering.k = value;
        }
        if let Some(value) = env_parse::<u64>("DISCOVERY_SEED") {
            self.clustering.seed = Some(value);
        }
        if let Some(value) = env_parse::<usize>("DISCOVERY_MAX_ITERATIONS") {
            self.clustering.max_iterations = value;
        }
        if let Some(value) = env_parse::<u64>("DISCOVERY_TIME_BUDGET_MS") {
            self.clustering.time_budget_ms = Some(value);
        }
        if let Some(path) = env_non_empty("DISCOVERY_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(path));
        }
        if let Some(path) = env_non_empty("DISCOVERY_VOCABULARY_PATH") {
            self.vocabulary.path = Some(PathBuf::from(path));
        }
        if let Some(level) = env_non_empty("DISCOVERY_LOG") {
            self.logging.level = level;
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_non_empty(key).and_then(|value| value.trim().parse::<T>().ok())
}

fn default_config_path() -> Option<PathBuf> {
    env_non_empty("DISCOVERY_CONFIG_PATH")
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/discovery.toml")))
}
