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

//! Register-write replay scripts
//!
//! A script is a TOML list of steps executed in order against a [`System`].
//! It is a convenient way to reproduce the register sequence a game issues
//! without running a CPU.
//!
//! ```toml
//! [[step]]
//! action = "poke"          # store words in RAM
//! address = 0x100
//! values = [0x01FFFFFF, 0xE1000000]
//!
//! [[step]]
//! action = "gpuread"       # queue words on GPUREAD
//! values = [1, 2, 3]
//!
//! [[step]]
//! action = "write"         # CPU store
//! address = 0x1F8010F0
//! value = 0x00000800
//!
//! [[step]]
//! action = "read"          # CPU load, optionally checked
//! address = 0x1F8010A8
//! expect = 0x00000401
//!
//! [[step]]
//! action = "peek"          # RAM word, optionally checked
//! address = 0x100
//! ```

use super::System;
use crate::core::dma::DMA;
use crate::core::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One replay step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Store consecutive words in RAM starting at `address`
    Poke { address: u32, values: Vec<u32> },
    /// Queue words to be returned by GPUREAD
    Gpuread { values: Vec<u32> },
    /// 32-bit CPU store
    Write { address: u32, value: u32 },
    /// 32-bit CPU load
    Read {
        address: u32,
        #[serde(default)]
        expect: Option<u32>,
    },
    /// RAM word inspection
    Peek {
        address: u32,
        #[serde(default)]
        expect: Option<u32>,
    },
}

/// Parsed replay script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

/// Value observed by a `read` or `peek` step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadRecord {
    pub address: u32,
    pub value: u32,
}

/// Outcome of running a script
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Number of steps executed
    pub steps: usize,
    /// Values seen by `read` and `peek` steps, in order
    pub reads: Vec<ReadRecord>,
    /// Words the GPU received on GP0
    pub gp0: Vec<u32>,
    /// I_STAT after the last step
    pub irq_status: u32,
    /// Final DMA register file
    pub dma: DMA,
}

impl Script {
    /// Parse a script from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| EmulatorError::Replay(format!("Failed to parse script: {}", e)))
    }

    /// Load a script from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&contents)
    }

    /// Execute every step against `system`
    ///
    /// # Errors
    ///
    /// Stops at the first failing step: an `expect` that does not match, or
    /// a `poke`/`peek` outside RAM.
    pub fn run(&self, system: &mut System) -> Result<ReplayReport> {
        let mut reads = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            log::debug!("Replay step {}: {:?}", index, step);

            match step {
                Step::Poke { address, values } => {
                    for (i, &value) in values.iter().enumerate() {
                        let addr = address.wrapping_add((i as u32) * 4);
                        system.bus_mut().poke32(addr, value)?;
                    }
                }
                Step::Gpuread { values } => system.bus_mut().push_gpuread(values),
                Step::Write { address, value } => system.write32(*address, *value),
                Step::Read { address, expect } => {
                    let value = system.read32(*address);
                    check(index, *address, value, *expect)?;
                    reads.push(ReadRecord {
                        address: *address,
                        value,
                    });
                }
                Step::Peek { address, expect } => {
                    let value = system.bus().peek32(*address)?;
                    check(index, *address, value, *expect)?;
                    reads.push(ReadRecord {
                        address: *address,
                        value,
                    });
                }
            }
        }

        Ok(ReplayReport {
            steps: self.steps.len(),
            reads,
            gp0: system.bus().gp0_words().to_vec(),
            irq_status: system.interrupts().read_status(),
            dma: system.dma().clone(),
        })
    }
}

fn check(index: usize, address: u32, value: u32, expect: Option<u32>) -> Result<()> {
    match expect {
        Some(expected) if expected != value => Err(EmulatorError::Replay(format!(
            "step {}: 0x{:08X} read 0x{:08X}, expected 0x{:08X}",
            index, address, value, expected
        ))),
        _ => Ok(()),
    }
}
