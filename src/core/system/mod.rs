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

//! System integration module
//!
//! Ties the DMA controller to a bus and an interrupt controller and routes
//! CPU-side loads and stores between them.

pub mod replay;

pub use replay::{ReplayReport, Script, Step};

use super::config::Config;
use super::dma::registers::{DMA_BASE, DMA_WINDOW_SIZE};
use super::dma::DMA;
use super::error::Result;
use super::interrupt::InterruptController;
use super::memory::{AccessWidth, MemoryBus, SystemBus};
use super::savestate::SaveState;

/// Emulated machine owning the DMA controller and its collaborators
///
/// The DMA state lives here and is lent to the controller on each access;
/// nothing is global, so any number of machines can coexist.
///
/// # Example
/// ```
/// use psx_dma::core::system::System;
///
/// let mut system = System::new();
/// system.write32(0x1F8010F4, 0x0000_8000); // force IRQ
/// assert_eq!(system.interrupts().read_status(), 1 << 3);
/// ```
pub struct System {
    /// DMA controller state
    dma: DMA,
    /// RAM and GPU port
    bus: SystemBus,
    /// Interrupt controller receiving IRQ3
    interrupts: InterruptController,
}

impl System {
    /// Create a machine with 2MB RAM and all registers in power-on state
    pub fn new() -> Self {
        Self {
            dma: DMA::new(),
            bus: SystemBus::new(),
            interrupts: InterruptController::new(),
        }
    }

    /// Create a machine from a configuration
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::Config` if the configured RAM size is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            dma: DMA::new(),
            bus: SystemBus::with_ram_size(config.memory.ram_size)?,
            interrupts: InterruptController::new(),
        })
    }

    /// Whether an address falls in the DMA register window
    #[inline(always)]
    fn is_dma_address(address: u32) -> bool {
        let paddr = address & 0x1FFF_FFFF;
        (DMA_BASE..DMA_BASE + DMA_WINDOW_SIZE).contains(&paddr)
    }

    /// CPU load
    pub fn read(&mut self, width: AccessWidth, address: u32) -> u32 {
        if Self::is_dma_address(address) {
            self.dma.read(width, address)
        } else {
            self.bus.read(width, address)
        }
    }

    /// CPU store
    pub fn write(&mut self, width: AccessWidth, address: u32, value: u32) {
        if Self::is_dma_address(address) {
            self.dma
                .write(&mut self.bus, &mut self.interrupts, width, address, value);
        } else {
            self.bus.write(width, address, value);
        }
    }

    /// 32-bit CPU load
    pub fn read32(&mut self, address: u32) -> u32 {
        self.read(AccessWidth::Word, address)
    }

    /// 32-bit CPU store
    pub fn write32(&mut self, address: u32, value: u32) {
        self.write(AccessWidth::Word, address, value)
    }

    /// Reset the DMA controller and interrupt controller (RAM is kept)
    pub fn reset(&mut self) {
        self.dma.reset();
        self.interrupts = InterruptController::new();
    }

    /// DMA controller
    pub fn dma(&self) -> &DMA {
        &self.dma
    }

    /// Bus
    pub fn bus(&self) -> &SystemBus {
        &self.bus
    }

    /// Mutable bus access (loading RAM, queueing GPUREAD data)
    pub fn bus_mut(&mut self) -> &mut SystemBus {
        &mut self.bus
    }

    /// Interrupt controller
    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    /// Mutable interrupt controller access
    pub fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    /// Snapshot the DMA controller
    pub fn save_state(&self) -> SaveState {
        SaveState::capture(&self.dma)
    }

    /// Restore the DMA controller from a snapshot
    pub fn load_state(&mut self, state: SaveState) -> Result<()> {
        self.dma = state.restore()?;
        Ok(())
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}
