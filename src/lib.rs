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

//! psx-dma: PlayStation (PSX) DMA controller emulation
//!
//! This crate emulates the PSX DMA controller: its memory-mapped register file,
//! channel scheduling, the GPU and OTC transfer algorithms, and the DICR
//! interrupt aggregation that drives IRQ3.
//!
//! # Architecture
//!
//! - [`core::dma`]: The DMA controller itself
//! - [`core::memory`]: Bus capability used by transfers, plus a RAM/GPU-port bus
//! - [`core::interrupt`]: Interrupt line capability and the I_STAT/I_MASK controller
//! - [`core::system`]: Machine that owns all of the above and routes CPU accesses
//!
//! # Example
//!
//! ```
//! use psx_dma::core::system::System;
//!
//! let mut system = System::new();
//!
//! // Build a 4-entry ordering table at 0x1000 with channel 6
//! system.write32(0x1F8010E0, 0x0000_1000);
//! system.write32(0x1F8010E4, 4);
//! system.write32(0x1F8010E8, 0x1100_0002);
//! system.write32(0x1F8010F0, 0x0800_0000);
//!
//! assert_eq!(system.bus().peek32(0x1000)?, 0x0000_0FFC);
//! assert_eq!(system.bus().peek32(0x0FF4)?, 0x00FF_FFFF);
//! # Ok::<(), psx_dma::EmulatorError>(())
//! ```
//!
//! # Error Handling
//!
//! Register accesses never fail. Host-side operations (RAM inspection, config,
//! save states, replay scripts) return [`core::error::Result<T>`], an alias for
//! `Result<T, EmulatorError>`.

pub mod core;

// Re-export commonly used types
pub use core::error::{EmulatorError, Result};
