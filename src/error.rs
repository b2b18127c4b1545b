use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),

    #[error("failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("server error: {0}")]
    Server(String),
}
