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

//! DMA register layout and address decoding
//!
//! The controller occupies a 128-byte window. Bits 6-4 of the address select
//! the block (channels 0-6, or 7 for the global registers) and bits 3-2
//! select the register inside that block.
//!
//! ```text
//! Block | +0x0   | +0x4   | +0x8     | +0xC
//! ------|--------|--------|----------|---------
//! 0-6   | MADR   | BCR    | CHCR     | (unused)
//! 7     | DPCR   | DICR   | status A | status B
//! ```

use bitflags::bitflags;

/// Start of the DMA register window
pub const DMA_BASE: u32 = 0x1F80_1080;

/// Size of the DMA register window in bytes
pub const DMA_WINDOW_SIZE: u32 = 0x80;

/// Number of DMA channels
pub const CHANNEL_COUNT: usize = 7;

/// MADR write mask (top byte always reads as zero)
pub const MADR_MASK: u32 = 0x00FF_FFFF;

/// BCR write mask
pub const BCR_MASK: u32 = 0xFFFF_FFFF;

/// CHCR write mask (reserved bits forced to zero)
pub const CHCR_MASK: u32 = 0x7177_0703;

/// DICR bits taken verbatim from a write
pub const DICR_WRITE_MASK: u32 = 0x00FF_803F;

/// DICR per-channel flag bits (write 1 to acknowledge)
pub const DICR_FLAGS_MASK: u32 = 0x7F00_0000;

/// Fixed value of the first read-only status word (0x1F8010F8)
pub const DMA_STATUS_A: u32 = 0x7FFA_C68B;

/// Fixed value of the second read-only status word (0x1F8010FC)
pub const DMA_STATUS_B: u32 = 0x00FF_FFF7;

/// End-of-chain marker for linked lists and ordering tables
pub const LIST_TERMINATOR: u32 = 0x00FF_FFFF;

bitflags! {
    /// Single-bit fields of DICR
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterruptFlags: u32 {
        /// Bit 15: force IRQ regardless of channel state
        const FORCE_IRQ = 1 << 15;
        /// Bit 23: master enable for channel interrupts
        const MASTER_ENABLE = 1 << 23;
        /// Bit 31: master flag (read-only, computed)
        const MASTER_FLAG = 1 << 31;
    }
}

bitflags! {
    /// CHCR bits the transfer engine clears on completion
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelFlags: u32 {
        /// Bit 24: start/busy
        const START_BUSY = 1 << 24;
        /// Bit 28: manual trigger
        const TRIGGER = 1 << 28;
    }
}

/// Register inside a channel block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRegister {
    /// Memory address register (+0x0)
    Madr,
    /// Block control register (+0x4)
    Bcr,
    /// Channel control register (+0x8)
    Chcr,
    /// Unused slot (+0xC)
    Unused,
}

/// Register inside the global block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalRegister {
    /// Priority/enable (0x1F8010F0)
    Dpcr,
    /// Interrupt control (0x1F8010F4)
    Dicr,
    /// Read-only status word (0x1F8010F8)
    StatusA,
    /// Read-only status word (0x1F8010FC)
    StatusB,
}

/// Decoded DMA register address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Per-channel register
    Channel(usize, ChannelRegister),
    /// Controller-wide register
    Global(GlobalRegister),
}

impl Register {
    /// Decode an address inside the DMA window
    ///
    /// Only bits 6-2 are looked at, so both absolute addresses and window
    /// offsets decode the same way.
    ///
    /// # Example
    ///
    /// ```
    /// use psx_dma::core::dma::registers::{ChannelRegister, GlobalRegister, Register};
    ///
    /// assert_eq!(Register::decode(0x1F8010A8), Register::Channel(2, ChannelRegister::Chcr));
    /// assert_eq!(Register::decode(0x1F8010F4), Register::Global(GlobalRegister::Dicr));
    /// ```
    pub fn decode(address: u32) -> Self {
        let block = channel_index(address);
        let index = register_index(address);

        if block == 7 {
            Register::Global(match index {
                0 => GlobalRegister::Dpcr,
                1 => GlobalRegister::Dicr,
                2 => GlobalRegister::StatusA,
                _ => GlobalRegister::StatusB,
            })
        } else {
            Register::Channel(
                block,
                match index {
                    0 => ChannelRegister::Madr,
                    1 => ChannelRegister::Bcr,
                    2 => ChannelRegister::Chcr,
                    _ => ChannelRegister::Unused,
                },
            )
        }
    }
}

/// Block index (bits 6-4)
#[inline(always)]
pub fn channel_index(address: u32) -> usize {
    ((address >> 4) & 7) as usize
}

/// Register index within a block (bits 3-2)
#[inline(always)]
pub fn register_index(address: u32) -> u32 {
    (address >> 2) & 3
}

/// DPCR enable bit for a channel (bit 3 of its nibble)
#[inline(always)]
pub fn channel_enable_bit(channel: usize) -> u32 {
    0x8 << (channel * 4)
}

/// DICR interrupt-enable bit for a channel (bits 16-22)
#[inline(always)]
pub fn channel_irq_enable_bit(channel: usize) -> u32 {
    1 << (16 + channel)
}

/// DICR interrupt flag bit for a channel (bits 24-30)
#[inline(always)]
pub fn channel_irq_flag_bit(channel: usize) -> u32 {
    1 << (24 + channel)
}
