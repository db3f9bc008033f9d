/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Configuration for a message bus
///
/// Loaded from `courier/config.toml` in the XDG config directories. Every
/// field is optional in the file; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Behavioral configuration switches
    pub behavior: BehaviorConfig,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Default deadline for a tracked activity in milliseconds
    pub tracking_timeout_ms: u64,
}

/// Behavioral configuration switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Raise the first captured handler failure from tracked activities
    pub fail_on_handler_errors: bool,
    /// Log message payloads at debug level when they are admitted
    pub log_payloads: bool,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            tracking_timeout_ms: 5_000,
        }
    }
}

impl CourierConfig {
    /// Default tracked activity deadline as a Duration
    pub const fn tracking_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.tracking_timeout_ms)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `courier/config.toml` under `$XDG_CONFIG_HOME` and then the
    /// XDG config dirs. Falls back to defaults when no file exists or the file
    /// cannot be read or parsed.
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("courier") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        match xdg_dirs.find_config_file("config.toml") {
            Some(path) => Self::load_from(&path),
            None => {
                info!("No configuration file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(path) {
            Ok(config_str) => match Self::load_from_str(&config_str) {
                Ok(config) => config,
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse configuration from TOML source
    pub fn load_from_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}
