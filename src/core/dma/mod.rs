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

//! DMA (Direct Memory Access) Controller
//!
//! This module implements the PlayStation's DMA controller, which moves words
//! between main RAM and peripheral FIFOs without CPU intervention.
//!
//! # DMA Channels
//!
//! | Channel | Device      | Base Address |
//! |---------|-------------|--------------|
//! | 0       | MDEC In     | 0x1F801080   |
//! | 1       | MDEC Out    | 0x1F801090   |
//! | 2       | GPU         | 0x1F8010A0   |
//! | 3       | CD-ROM      | 0x1F8010B0   |
//! | 4       | SPU         | 0x1F8010C0   |
//! | 5       | PIO         | 0x1F8010D0   |
//! | 6       | OTC         | 0x1F8010E0   |
//!
//! # Global Registers
//!
//! - **DPCR** (0x1F8010F0): DMA control register (channel priorities/enables)
//! - **DICR** (0x1F8010F4): DMA interrupt register
//! - 0x1F8010F8 / 0x1F8010FC: read-only status words with fixed values
//!
//! # Execution Model
//!
//! Transfers are not timed. Every register write re-runs the scheduler, and
//! any enabled channel whose CHCR holds a recognised start pattern runs to
//! completion before the write returns. Only the GPU (2) and OTC (6)
//! channels have transfer bodies; the rest are plain register storage.
//!
//! The controller does not own memory or the interrupt controller. Both are
//! passed into every write as [`MemoryBus`] and [`InterruptLine`]
//! capabilities.
//!
//! # References
//!
//! - [PSX-SPX: DMA Controller](http://problemkaputt.de/psx-spx.htm#dmacontroller)

mod channel;
mod irq;
pub mod registers;
mod transfer;

pub use channel::{DMAChannel, Port};
pub use transfer::TransferKind;

use crate::core::interrupt::InterruptLine;
use crate::core::memory::{AccessWidth, MemoryBus};
use registers::{
    channel_enable_bit, ChannelRegister, GlobalRegister, Register, CHANNEL_COUNT, DMA_STATUS_A,
    DMA_STATUS_B,
};
use serde::{Deserialize, Serialize};

/// DMA Controller with 7 channels
///
/// # Examples
///
/// ```
/// use psx_dma::core::dma::DMA;
/// use psx_dma::core::interrupt::InterruptController;
/// use psx_dma::core::memory::{AccessWidth, SystemBus};
///
/// let mut dma = DMA::new();
/// let mut bus = SystemBus::new();
/// let mut ic = InterruptController::new();
///
/// dma.write(&mut bus, &mut ic, AccessWidth::Word, 0x1F8010A0, 0xFF00_1000);
/// assert_eq!(dma.read(AccessWidth::Word, 0x1F8010A0), 0x0000_1000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DMA {
    /// 7 DMA channels (MDEC In/Out, GPU, CD-ROM, SPU, PIO, OTC)
    channels: [DMAChannel; CHANNEL_COUNT],

    /// DMA Control Register (DPCR) at 0x1F8010F0
    ///
    /// Channel N owns bits 4N..4N+3: a 3-bit priority and an enable bit.
    control: u32,

    /// DMA Interrupt Register (DICR) at 0x1F8010F4
    ///
    /// - Bits 0-5: stored, no function
    /// - Bit 15: force IRQ
    /// - Bits 16-22: per-channel interrupt enable
    /// - Bit 23: master enable
    /// - Bits 24-30: per-channel interrupt flags (write 1 to clear)
    /// - Bit 31: master flag (computed)
    interrupt: u32,
}

impl DMA {
    /// Channel 2: GPU (graphics)
    pub const CH_GPU: usize = 2;

    /// Channel 6: OTC (ordering table clear)
    pub const CH_OTC: usize = 6;

    /// Create a new DMA controller in its power-on state (all registers zero)
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|id| DMAChannel::new(id as u8)),
            control: 0,
            interrupt: 0,
        }
    }

    /// Return every register to its power-on value
    pub fn reset(&mut self) {
        *self = Self::new();
        log::debug!("DMA reset");
    }

    /// Read a register in the DMA window
    ///
    /// Reads have no side effects. The access width is ignored since all
    /// registers are word-wide.
    pub fn read(&self, width: AccessWidth, address: u32) -> u32 {
        let value = match Register::decode(address) {
            Register::Global(GlobalRegister::Dpcr) => self.control,
            Register::Global(GlobalRegister::Dicr) => self.interrupt,
            Register::Global(GlobalRegister::StatusA) => DMA_STATUS_A,
            Register::Global(GlobalRegister::StatusB) => DMA_STATUS_B,
            Register::Channel(ch, ChannelRegister::Madr) => self.channels[ch].base_address(),
            Register::Channel(ch, ChannelRegister::Bcr) => self.channels[ch].block_control(),
            Register::Channel(ch, ChannelRegister::Chcr) => self.channels[ch].channel_control(),
            Register::Channel(ch, ChannelRegister::Unused) => {
                log::warn!("DMA{} read from unused register slot 0x{:08X}", ch, address);
                0
            }
        };

        log::trace!(
            "DMA read{} 0x{:08X} -> 0x{:08X}",
            width.bytes() * 8,
            address,
            value
        );
        value
    }

    /// Write a register in the DMA window
    ///
    /// The value is masked according to the register, stored, and then the
    /// scheduler runs. Any transfer it starts completes before this returns.
    pub fn write<B, I>(
        &mut self,
        bus: &mut B,
        irq: &mut I,
        width: AccessWidth,
        address: u32,
        value: u32,
    ) where
        B: MemoryBus + ?Sized,
        I: InterruptLine + ?Sized,
    {
        log::trace!(
            "DMA write{} 0x{:08X} = 0x{:08X}",
            width.bytes() * 8,
            address,
            value
        );

        match Register::decode(address) {
            Register::Global(GlobalRegister::Dpcr) => self.control = value,
            Register::Global(GlobalRegister::Dicr) => self.write_interrupt(irq, value),
            Register::Global(GlobalRegister::StatusA | GlobalRegister::StatusB) => {
                log::trace!("DMA write to read-only status 0x{:08X} ignored", address);
            }
            Register::Channel(ch, ChannelRegister::Madr) => {
                self.channels[ch].set_base_address(value)
            }
            Register::Channel(ch, ChannelRegister::Bcr) => {
                self.channels[ch].set_block_control(value)
            }
            Register::Channel(ch, ChannelRegister::Chcr) => {
                self.channels[ch].set_channel_control(value);
                if self.channels[ch].is_busy() {
                    log::debug!(
                        "DMA{} ({}) CHCR=0x{:08X} madr=0x{:06X} bcr=0x{:08X}",
                        ch,
                        channel_port(ch),
                        self.channels[ch].channel_control(),
                        self.channels[ch].base_address(),
                        self.channels[ch].block_control()
                    );
                }
            }
            Register::Channel(ch, ChannelRegister::Unused) => {
                log::warn!("DMA{} write to unused register slot 0x{:08X}", ch, address);
            }
        }

        self.run_scheduler(bus, irq);
    }

    /// Scan channels from 6 down to 0 and run every enabled one
    ///
    /// A channel whose CHCR does not match a known start pattern is left
    /// untouched. Nothing is carried over between scans.
    pub fn run_scheduler<B, I>(&mut self, bus: &mut B, irq: &mut I)
    where
        B: MemoryBus + ?Sized,
        I: InterruptLine + ?Sized,
    {
        for ch in (0..CHANNEL_COUNT).rev() {
            if self.is_channel_enabled(ch) {
                self.run_channel(ch, bus, irq);
            }
        }
    }

    /// Check if a channel's enable bit is set in DPCR
    #[inline(always)]
    pub fn is_channel_enabled(&self, channel: usize) -> bool {
        (self.control & channel_enable_bit(channel)) != 0
    }

    /// Channel register state
    pub fn channel(&self, channel: usize) -> &DMAChannel {
        &self.channels[channel]
    }

    /// Read channel MADR register
    pub fn read_madr(&self, channel: usize) -> u32 {
        self.channels[channel].base_address()
    }

    /// Read channel BCR register
    pub fn read_bcr(&self, channel: usize) -> u32 {
        self.channels[channel].block_control()
    }

    /// Read channel CHCR register
    pub fn read_chcr(&self, channel: usize) -> u32 {
        self.channels[channel].channel_control()
    }

    /// Read DMA Control Register (DPCR)
    pub fn read_control(&self) -> u32 {
        self.control
    }

    /// Read DMA Interrupt Register (DICR)
    pub fn read_interrupt(&self) -> u32 {
        self.interrupt
    }
}

impl Default for DMA {
    fn default() -> Self {
        Self::new()
    }
}

/// Display name of a channel for log messages
fn channel_port(channel: usize) -> String {
    Port::from_index(channel)
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string())
}
