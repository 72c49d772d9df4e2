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

//! Error types
//!
//! Hardware register accesses are infallible; these errors only surface from
//! host-side operations such as RAM inspection, configuration, save states
//! and replay scripts.

use thiserror::Error;

/// Emulator error type
#[derive(Error, Debug)]
pub enum EmulatorError {
    /// Address does not map to RAM
    #[error("Invalid memory access at 0x{address:08X}")]
    InvalidMemoryAccess { address: u32 },

    /// Address is not aligned for the access width
    #[error("Unaligned access at 0x{address:08X}")]
    UnalignedAccess { address: u32 },

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or is invalid
    #[error("Config error: {0}")]
    Config(String),

    /// Save state could not be encoded or decoded
    #[error("Save state error: {0}")]
    SaveState(String),

    /// Save state was written by an incompatible version
    #[error("Save state version mismatch: expected {expected}, found {found}")]
    SaveStateVersion { expected: u32, found: u32 },

    /// Replay script failed to parse or an expectation did not hold
    #[error("Replay error: {0}")]
    Replay(String),
}

/// Result type alias for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;
