// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration file support
//!
//! ```toml
//! [memory]
//! ram_size = 2097152
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Missing sections and keys fall back to their defaults.

use super::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding the configured log level
pub const LOG_ENV_VAR: &str = "PSX_DMA_LOG";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory settings
    pub memory: MemoryConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Memory settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Main RAM size in bytes (power of two)
    pub ram_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ram_size: 2 * 1024 * 1024,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter string (e.g. `"info"`, `"psx_dma=trace"`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| EmulatorError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| EmulatorError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let size = self.memory.ram_size;
        if size < 4 || !size.is_power_of_two() || size > 0x80_0000 {
            return Err(EmulatorError::Config(format!(
                "memory.ram_size must be a power of two between 4 bytes and 8MB, got {}",
                size
            )));
        }
        Ok(())
    }

    /// Log filter, preferring the environment override
    pub fn log_filter(&self) -> String {
        std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| self.logging.level.clone())
    }
}
