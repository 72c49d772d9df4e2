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

//! DMA controller save states
//!
//! A save state is the full register file plus a small header. States are
//! stored with `bincode`; [`SaveState::to_json`] gives a readable dump for
//! debugging.

use super::dma::DMA;
use super::error::{EmulatorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Snapshot of the DMA controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    /// Format version
    pub version: u32,
    /// Capture time
    pub saved_at: DateTime<Utc>,
    /// Controller registers
    pub dma: DMA,
}

impl SaveState {
    /// Current format version
    pub const VERSION: u32 = 1;

    /// Capture the current controller state
    pub fn capture(dma: &DMA) -> Self {
        Self {
            version: Self::VERSION,
            saved_at: Utc::now(),
            dma: dma.clone(),
        }
    }

    /// Extract the controller state
    ///
    /// # Errors
    ///
    /// Returns `SaveStateVersion` if the snapshot was written by another
    /// format version.
    pub fn restore(self) -> Result<DMA> {
        if self.version != Self::VERSION {
            return Err(EmulatorError::SaveStateVersion {
                expected: Self::VERSION,
                found: self.version,
            });
        }
        Ok(self.dma)
    }

    /// Encode to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| EmulatorError::SaveState(format!("Failed to encode: {}", e)))
    }

    /// Decode from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (state, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| EmulatorError::SaveState(format!("Failed to decode: {}", e)))?;
        Ok(state)
    }

    /// Write to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        log::info!("Saved DMA state to {}", path.as_ref().display());
        Ok(())
    }

    /// Read from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let state = Self::from_bytes(&bytes)?;
        log::info!(
            "Loaded DMA state from {} (saved {})",
            path.as_ref().display(),
            state.saved_at
        );
        Ok(state)
    }

    /// Pretty-printed JSON dump
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EmulatorError::SaveState(format!("Failed to serialize: {}", e)))
    }
}
