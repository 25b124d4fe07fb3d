//! Engine configuration and JSON helpers.
//!
//! Config files are plain JSON. Every field has a default, so an empty object (`{}`) is a valid
//! config and a missing file is the caller's decision, not ours.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// How a node reached through several parents in the same frame resolves its activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPolicy {
    /// The path visited last in traversal order decides.
    #[default]
    LastWriterWins,
    /// A node is active if any path visiting it this frame is active.
    AnyPath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub activity_policy: ActivityPolicy,
    /// Prefetch on demand when `update` reaches a node the reconcile pass did not promote.
    pub lazy_prefetch: bool,
    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            activity_policy: ActivityPolicy::LastWriterWins,
            lazy_prefetch: true,
            log_filter: "info".to_string(),
        }
    }
}

/// A parsed JSON document together with the path it came from (for error reporting).
#[derive(Debug, Clone)]
pub struct LoadedJson {
    pub path: PathBuf,
    pub value: serde_json::Value,
}

pub fn load_json_value(path: impl AsRef<Path>) -> Result<LoadedJson, EngineError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_slice(&bytes).map_err(|source| EngineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LoadedJson {
        path: path.to_path_buf(),
        value,
    })
}

/// Deserialize an already loaded document into `T`.
pub fn parse_loaded_json<T: DeserializeOwned>(loaded: LoadedJson) -> Result<T, EngineError> {
    serde_json::from_value(loaded.value).map_err(|source| EngineError::Json {
        path: loaded.path,
        source,
    })
}

pub fn load_typed_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, EngineError> {
    parse_loaded_json(load_json_value(path)?)
}

/// Load and validate an [`EngineConfig`].
pub fn load_engine_config_from(path: impl AsRef<Path>) -> Result<EngineConfig, EngineError> {
    let path = path.as_ref();
    let cfg: EngineConfig = load_typed_json(path)?;
    if cfg.log_filter.trim().is_empty() {
        return Err(EngineError::InvalidConfig {
            path: path.to_path_buf(),
            msg: "log_filter must not be empty".to_string(),
        });
    }
    Ok(cfg)
}
