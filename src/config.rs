// SPDX-License-Identifier: Apache-2.0

//! Structure configuration
//!
//! Loaded from `structure.json` in the data directory, then adjusted by
//! environment overrides. A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::error::{EngineError, EngineResult};

const CONFIG_FILE: &str = "structure.json";
const APP_DIR: &str = "QoreDB";

/// Constraint naming policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingPolicy {
    pub foreign_key_prefix: String,
    pub unique_key_prefix: String,
    /// Upper bound on candidate names tried before giving up
    pub max_attempts: u32,
    /// Hard cap applied on top of the dialect's identifier limit
    pub max_identifier_length: usize,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            foreign_key_prefix: "FK".to_string(),
            unique_key_prefix: "UK".to_string(),
            max_attempts: 100,
            max_identifier_length: 128,
        }
    }
}

/// Virtual schema storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OverlayConfig {
    /// Directory holding one JSON file per container; defaults under the data dir
    pub storage_dir: Option<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_dir: Option<PathBuf>,
    pub log_filter: String,
    pub retention_days: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            log_filter: "qore_structure=info".to_string(),
            retention_days: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StructureConfig {
    pub naming: NamingPolicy,
    pub overlay: OverlayConfig,
    pub observability: ObservabilityConfig,
}

impl StructureConfig {
    /// Loads configuration from `data_dir`, falling back to defaults
    pub fn load(data_dir: &Path) -> EngineResult<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| EngineError::internal(format!("Failed to read config: {}", e)))?;
            let config: StructureConfig = serde_json::from_str(&content)
                .map_err(|e| EngineError::internal(format!("Failed to parse config: {}", e)))?;
            info!("Loaded structure configuration from {:?}", path);
            config
        } else {
            debug!("No structure config file found, using defaults");
            StructureConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Saves configuration to `data_dir`
    pub fn save(&self, data_dir: &Path) -> EngineResult<()> {
        fs::create_dir_all(data_dir).map_err(|e| {
            EngineError::internal(format!("Failed to create config directory: {}", e))
        })?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::internal(format!("Failed to serialize config: {}", e)))?;
        fs::write(data_dir.join(CONFIG_FILE), content)
            .map_err(|e| EngineError::internal(format!("Failed to write config: {}", e)))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(attempts) = std::env::var("QORE_STRUCTURE_MAX_NAME_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
        {
            self.naming.max_attempts = attempts;
        }
        if let Ok(filter) = std::env::var("QORE_STRUCTURE_LOG_FILTER") {
            if !filter.trim().is_empty() {
                self.observability.log_filter = filter;
            }
        }
    }

    /// Directory for virtual schema files
    pub fn overlay_dir(&self, data_dir: &Path) -> PathBuf {
        self.overlay
            .storage_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("virtual_schema"))
    }

    /// Directory for log files
    pub fn log_dir(&self, data_dir: &Path) -> PathBuf {
        self.observability
            .log_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("logs"))
    }
}

/// Per-user data directory (e.g. `~/.local/share/QoreDB`)
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
