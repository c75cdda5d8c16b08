//! Engine configuration.
//!
//! Loaded from YAML, from `NODE_ENGINE_*` environment variables, or both
//! (file first, env on top). Every field has a default, so an empty file is
//! a valid config.

use crate::actions::StatusCycle;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reuse a node's view when the same node renders at the same position.
    pub memoize: bool,
    /// Statuses walked by the default cycle-status behavior.
    pub status_cycle: StatusCycle,
    /// Tab shown when the shell has no target. First tab if unset.
    pub default_tab: Option<String>,
    /// Deepest depth rendered; deeper subtrees render as a truncation marker.
    pub max_depth: usize,
    /// Refuse to render trees with blocking validation errors.
    pub strict_validation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memoize: true,
            status_cycle: StatusCycle::default(),
            default_tab: None,
            max_depth: 64,
            strict_validation: false,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded engine config");
        Ok(config)
    }

    /// Defaults overridden by `NODE_ENGINE_*` variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `NODE_ENGINE_*` variables on top of this config.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("NODE_ENGINE_MEMOIZE") {
            self.memoize = parse_bool(&v).unwrap_or(self.memoize);
        }
        if let Some(v) = lookup("NODE_ENGINE_STATUS_CYCLE") {
            let statuses: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            self.status_cycle = StatusCycle::new(statuses);
        }
        if let Some(v) = lookup("NODE_ENGINE_DEFAULT_TAB") {
            let v = v.trim();
            self.default_tab = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = lookup("NODE_ENGINE_MAX_DEPTH") {
            match v.trim().parse() {
                Ok(depth) => self.max_depth = depth,
                Err(_) => tracing::warn!(value = %v, "Ignoring invalid NODE_ENGINE_MAX_DEPTH"),
            }
        }
        if let Some(v) = lookup("NODE_ENGINE_STRICT") {
            self.strict_validation = parse_bool(&v).unwrap_or(self.strict_validation);
        }
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
