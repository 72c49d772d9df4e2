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

//! Per-channel register state

use super::registers::{ChannelFlags, BCR_MASK, CHCR_MASK, MADR_MASK};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Peripheral attached to each DMA channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    /// Channel 0: MDEC In (compression input)
    MdecIn = 0,
    /// Channel 1: MDEC Out (decompression output)
    MdecOut = 1,
    /// Channel 2: GPU (graphics)
    Gpu = 2,
    /// Channel 3: CD-ROM (disc drive)
    CdRom = 3,
    /// Channel 4: SPU (sound)
    Spu = 4,
    /// Channel 5: PIO (expansion port)
    Pio = 5,
    /// Channel 6: OTC (ordering table clear)
    Otc = 6,
}

impl Port {
    /// Port for a channel index (0-6)
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Port::MdecIn),
            1 => Some(Port::MdecOut),
            2 => Some(Port::Gpu),
            3 => Some(Port::CdRom),
            4 => Some(Port::Spu),
            5 => Some(Port::Pio),
            6 => Some(Port::Otc),
            _ => None,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Port::MdecIn => "MDEC In",
            Port::MdecOut => "MDEC Out",
            Port::Gpu => "GPU",
            Port::CdRom => "CD-ROM",
            Port::Spu => "SPU",
            Port::Pio => "PIO",
            Port::Otc => "OTC",
        };
        f.write_str(name)
    }
}

/// Single DMA channel
///
/// Holds the three registers software programs before starting a transfer.
/// The channel has no behaviour of its own beyond masking on write; the
/// controller decides when and how it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DMAChannel {
    /// Memory Address Register (MADR), 24 bits
    base_address: u32,

    /// Block Control Register (BCR)
    ///
    /// - Bits 0-15: Block size (words), or word count for OTC
    /// - Bits 16-31: Block count
    block_control: u32,

    /// Channel Control Register (CHCR)
    ///
    /// - Bit 0: Direction (0=to RAM, 1=from RAM)
    /// - Bit 1: Address step (0=forward, 1=backward)
    /// - Bits 9-10: Sync mode (0=immediate, 1=block, 2=linked-list)
    /// - Bit 24: Start/busy flag
    /// - Bit 28: Manual trigger
    channel_control: u32,

    /// Channel ID (0-6)
    channel_id: u8,
}

impl DMAChannel {
    /// Create a channel with all registers cleared
    pub(super) fn new(channel_id: u8) -> Self {
        Self {
            base_address: 0,
            block_control: 0,
            channel_control: 0,
            channel_id,
        }
    }

    /// Channel ID (0-6)
    pub fn id(&self) -> u8 {
        self.channel_id
    }

    /// MADR
    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    /// BCR
    pub fn block_control(&self) -> u32 {
        self.block_control
    }

    /// CHCR
    pub fn channel_control(&self) -> u32 {
        self.channel_control
    }

    pub(super) fn set_base_address(&mut self, value: u32) {
        self.base_address = value & MADR_MASK;
    }

    pub(super) fn set_block_control(&mut self, value: u32) {
        self.block_control = value & BCR_MASK;
    }

    pub(super) fn set_channel_control(&mut self, value: u32) {
        self.channel_control = value & CHCR_MASK;
    }

    /// Check if the start/busy bit (24) is set
    #[inline(always)]
    pub fn is_busy(&self) -> bool {
        ChannelFlags::from_bits_retain(self.channel_control).contains(ChannelFlags::START_BUSY)
    }

    /// Block size in words (BCR bits 0-15, 0 means 0x10000)
    #[inline(always)]
    pub fn block_size(&self) -> u32 {
        match self.block_control & 0xFFFF {
            0 => 0x10000,
            n => n,
        }
    }

    /// Block count (BCR bits 16-31, 0 means 0x10000)
    #[inline(always)]
    pub fn block_count(&self) -> u32 {
        match self.block_control >> 16 {
            0 => 0x10000,
            n => n,
        }
    }

    /// Word count for single-block transfers (same field as block size)
    #[inline(always)]
    pub fn word_count(&self) -> u32 {
        self.block_size()
    }

    /// Clear CHCR bits at the end of a transfer
    pub(super) fn finish(&mut self, flags: ChannelFlags) {
        self.channel_control &= !flags.bits();
        log::trace!(
            "DMA channel {} finished, CHCR=0x{:08X}",
            self.channel_id,
            self.channel_control
        );
    }
}
