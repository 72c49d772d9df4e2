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

//! Memory bus used by DMA transfers
//!
//! The DMA controller never owns memory. Every word it moves goes through the
//! [`MemoryBus`] capability, which the emulated machine provides. This module
//! defines that capability and [`SystemBus`], a concrete bus with main RAM and
//! the GPU data port.
//!
//! # Memory Map
//!
//! | Physical Address Range | Region       | Access |
//! |------------------------|--------------|--------|
//! | 0x00000000-0x007FFFFF  | RAM (mirrored) | R/W  |
//! | 0x1F801810             | GP0 / GPUREAD  | R/W  |
//!
//! # Address Translation
//!
//! KUSEG, KSEG0 and KSEG1 all mirror physical memory, so the top three
//! address bits are stripped before decoding.
//!
//! # Example
//!
//! ```
//! use psx_dma::core::memory::{AccessWidth, MemoryBus, SystemBus};
//!
//! let mut bus = SystemBus::new();
//!
//! // Write to RAM via KSEG0
//! bus.write(AccessWidth::Word, 0x8000_0100, 0x12345678);
//!
//! // Read from same location via KSEG1 (mirrors)
//! assert_eq!(bus.read(AccessWidth::Word, 0xA000_0100), 0x12345678);
//! ```

use crate::core::error::{EmulatorError, Result};
use std::collections::VecDeque;

/// Width of a single bus access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessWidth {
    /// 8-bit access
    Byte,
    /// 16-bit access
    Half,
    /// 32-bit access
    Word,
}

impl AccessWidth {
    /// Number of bytes moved by one access of this width
    #[inline(always)]
    pub fn bytes(self) -> u32 {
        match self {
            AccessWidth::Byte => 1,
            AccessWidth::Half => 2,
            AccessWidth::Word => 4,
        }
    }
}

/// Word-oriented memory/IO access used by DMA transfers
///
/// Reads take `&mut self` because reading a device FIFO (e.g. GPUREAD)
/// consumes data.
pub trait MemoryBus {
    /// Read a value of the given width from `address`
    fn read(&mut self, width: AccessWidth, address: u32) -> u32;

    /// Write a value of the given width to `address`
    fn write(&mut self, width: AccessWidth, address: u32, value: u32);
}

/// GPU data port (GP0 on write, GPUREAD on read)
pub const GPU_DATA_PORT: u32 = 0x1F80_1810;

/// Physical RAM mirror region covers the first 8MB
const RAM_REGION_END: u32 = 0x0080_0000;

/// Concrete bus with main RAM and the GPU data port
///
/// The GPU itself is not emulated: words written to GP0 are collected in a
/// log, and GPUREAD is served from a queue the host fills beforehand.
pub struct SystemBus {
    /// Main RAM (little-endian)
    ram: Vec<u8>,

    /// `ram.len() - 1`, used for mirroring
    ram_mask: u32,

    /// Words received on GP0, in arrival order
    gp0: Vec<u32>,

    /// Words waiting to be read from GPUREAD
    gpuread: VecDeque<u32>,
}

impl SystemBus {
    /// Default main RAM size (2MB)
    pub const RAM_SIZE: usize = 2 * 1024 * 1024;

    /// Create a bus with 2MB of zeroed RAM
    pub fn new() -> Self {
        Self::allocate(Self::RAM_SIZE)
    }

    /// Create a bus with a custom RAM size
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::Config` if `size` is not a power of two of
    /// at least 4 bytes.
    pub fn with_ram_size(size: usize) -> Result<Self> {
        if size < 4 || !size.is_power_of_two() || size > RAM_REGION_END as usize {
            return Err(EmulatorError::Config(format!(
                "RAM size must be a power of two between 4 bytes and 8MB, got {}",
                size
            )));
        }
        Ok(Self::allocate(size))
    }

    fn allocate(size: usize) -> Self {
        Self {
            ram: vec![0; size],
            ram_mask: (size - 1) as u32,
            gp0: Vec::new(),
            gpuread: VecDeque::new(),
        }
    }

    /// Size of main RAM in bytes
    pub fn ram_size(&self) -> usize {
        self.ram.len()
    }

    /// Strip the segment bits (KUSEG/KSEG0/KSEG1 mirror physical memory)
    #[inline(always)]
    fn physical(address: u32) -> u32 {
        address & 0x1FFF_FFFF
    }

    /// RAM byte offset for a physical address, if it falls in the RAM region
    #[inline(always)]
    fn ram_offset(&self, paddr: u32) -> Option<usize> {
        if paddr < RAM_REGION_END {
            Some((paddr & self.ram_mask) as usize)
        } else {
            None
        }
    }

    /// Read a 32-bit word from RAM
    ///
    /// # Errors
    ///
    /// - `UnalignedAccess` if `address` is not 4-byte aligned
    /// - `InvalidMemoryAccess` if `address` does not map to RAM
    pub fn peek32(&self, address: u32) -> Result<u32> {
        if address & 3 != 0 {
            return Err(EmulatorError::UnalignedAccess { address });
        }
        let offset = self
            .ram_offset(Self::physical(address))
            .ok_or(EmulatorError::InvalidMemoryAccess { address })?;
        Ok(u32::from_le_bytes([
            self.ram[offset],
            self.ram[offset + 1],
            self.ram[offset + 2],
            self.ram[offset + 3],
        ]))
    }

    /// Write a 32-bit word to RAM
    ///
    /// # Errors
    ///
    /// - `UnalignedAccess` if `address` is not 4-byte aligned
    /// - `InvalidMemoryAccess` if `address` does not map to RAM
    pub fn poke32(&mut self, address: u32, value: u32) -> Result<()> {
        if address & 3 != 0 {
            return Err(EmulatorError::UnalignedAccess { address });
        }
        let offset = self
            .ram_offset(Self::physical(address))
            .ok_or(EmulatorError::InvalidMemoryAccess { address })?;
        self.ram[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Queue words to be returned by GPUREAD
    pub fn push_gpuread(&mut self, words: &[u32]) {
        self.gpuread.extend(words.iter().copied());
    }

    /// Number of words still queued on GPUREAD
    pub fn gpuread_len(&self) -> usize {
        self.gpuread.len()
    }

    /// Words received on GP0 so far
    pub fn gp0_words(&self) -> &[u32] {
        &self.gp0
    }

    /// Drain the GP0 log
    pub fn take_gp0(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.gp0)
    }

    fn read_ram(&self, width: AccessWidth, offset: usize) -> u32 {
        let offset = offset & !(width.bytes() as usize - 1);
        match width {
            AccessWidth::Byte => self.ram[offset] as u32,
            AccessWidth::Half => u16::from_le_bytes([self.ram[offset], self.ram[offset + 1]]) as u32,
            AccessWidth::Word => u32::from_le_bytes([
                self.ram[offset],
                self.ram[offset + 1],
                self.ram[offset + 2],
                self.ram[offset + 3],
            ]),
        }
    }

    fn write_ram(&mut self, width: AccessWidth, offset: usize, value: u32) {
        let offset = offset & !(width.bytes() as usize - 1);
        match width {
            AccessWidth::Byte => self.ram[offset] = value as u8,
            AccessWidth::Half => {
                self.ram[offset..offset + 2].copy_from_slice(&(value as u16).to_le_bytes())
            }
            AccessWidth::Word => self.ram[offset..offset + 4].copy_from_slice(&value.to_le_bytes()),
        }
    }
}

impl MemoryBus for SystemBus {
    fn read(&mut self, width: AccessWidth, address: u32) -> u32 {
        let paddr = Self::physical(address);

        if let Some(offset) = self.ram_offset(paddr) {
            return self.read_ram(width, offset);
        }

        if paddr == GPU_DATA_PORT {
            return match self.gpuread.pop_front() {
                Some(word) => word,
                None => {
                    log::warn!("GPUREAD read with empty FIFO");
                    0
                }
            };
        }

        log::error!("Bus read from unmapped address 0x{:08X}", address);
        0
    }

    fn write(&mut self, width: AccessWidth, address: u32, value: u32) {
        let paddr = Self::physical(address);

        if let Some(offset) = self.ram_offset(paddr) {
            self.write_ram(width, offset, value);
            return;
        }

        if paddr == GPU_DATA_PORT {
            log::trace!("GP0 <- 0x{:08X}", value);
            self.gp0.push(value);
            return;
        }

        log::error!(
            "Bus write to unmapped address 0x{:08X} (value 0x{:08X})",
            address,
            value
        );
    }
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_word_read_write() {
        let mut bus = SystemBus::new();

        bus.write(AccessWidth::Word, 0x0000_1000, 0xDEADBEEF);
        assert_eq!(
            bus.read(AccessWidth::Word, 0x0000_1000),
            0xDEADBEEF,
            "Word should read back as written"
        );
    }

    #[test]
    fn test_segment_mirroring() {
        let mut bus = SystemBus::new();

        bus.write(AccessWidth::Word, 0x8000_0040, 0x11223344);
        assert_eq!(bus.read(AccessWidth::Word, 0x0000_0040), 0x11223344);
        assert_eq!(bus.read(AccessWidth::Word, 0xA000_0040), 0x11223344);
    }

    #[test]
    fn test_ram_mirrors_within_region() {
        let mut bus = SystemBus::new();

        // 2MB RAM is mirrored four times across the first 8MB
        bus.write(AccessWidth::Word, 0x0020_0010, 0xCAFEBABE);
        assert_eq!(
            bus.read(AccessWidth::Word, 0x0000_0010),
            0xCAFEBABE,
            "Second 2MB mirror should alias the first"
        );
    }

    #[test]
    fn test_narrow_accesses() {
        let mut bus = SystemBus::new();

        bus.write(AccessWidth::Word, 0x100, 0x44332211);
        assert_eq!(bus.read(AccessWidth::Byte, 0x101), 0x22);
        assert_eq!(bus.read(AccessWidth::Half, 0x102), 0x4433);

        bus.write(AccessWidth::Byte, 0x100, 0xAA);
        bus.write(AccessWidth::Half, 0x102, 0xBBCC);
        assert_eq!(bus.read(AccessWidth::Word, 0x100), 0xBBCC22AA);
    }

    #[test]
    fn test_gp0_log() {
        let mut bus = SystemBus::new();

        bus.write(AccessWidth::Word, GPU_DATA_PORT, 0xE100_0000);
        bus.write(AccessWidth::Word, GPU_DATA_PORT | 0xA000_0000, 0x0200_0000);

        assert_eq!(bus.gp0_words(), &[0xE100_0000, 0x0200_0000]);
        assert_eq!(bus.take_gp0(), vec![0xE100_0000, 0x0200_0000]);
        assert!(bus.gp0_words().is_empty(), "take_gp0 should drain the log");
    }

    #[test]
    fn test_gpuread_fifo_order() {
        let mut bus = SystemBus::new();

        bus.push_gpuread(&[1, 2, 3]);
        assert_eq!(bus.read(AccessWidth::Word, GPU_DATA_PORT), 1);
        assert_eq!(bus.read(AccessWidth::Word, GPU_DATA_PORT), 2);
        assert_eq!(bus.gpuread_len(), 1);
        assert_eq!(bus.read(AccessWidth::Word, GPU_DATA_PORT), 3);
        assert_eq!(
            bus.read(AccessWidth::Word, GPU_DATA_PORT),
            0,
            "Empty GPUREAD should read as 0"
        );
    }

    #[test]
    fn test_unmapped_access_is_ignored() {
        let mut bus = SystemBus::new();

        bus.write(AccessWidth::Word, 0x1F00_0000, 0x12345678);
        assert_eq!(bus.read(AccessWidth::Word, 0x1F00_0000), 0);
    }

    #[test]
    fn test_peek_poke() {
        let mut bus = SystemBus::new();

        bus.poke32(0x8000_2000, 0x0BADF00D).unwrap();
        assert_eq!(bus.peek32(0x2000).unwrap(), 0x0BADF00D);

        assert!(matches!(
            bus.peek32(0x2002),
            Err(EmulatorError::UnalignedAccess { address: 0x2002 })
        ));
        assert!(matches!(
            bus.poke32(0x1F80_1810, 0),
            Err(EmulatorError::InvalidMemoryAccess { .. })
        ));
    }

    #[test]
    fn test_custom_ram_size() {
        let mut bus = SystemBus::with_ram_size(0x1000).unwrap();
        assert_eq!(bus.ram_size(), 0x1000);

        bus.write(AccessWidth::Word, 0x1004, 0x55);
        assert_eq!(bus.read(AccessWidth::Word, 0x0004), 0x55, "Small RAM mirrors");

        assert!(SystemBus::with_ram_size(0).is_err());
        assert!(SystemBus::with_ram_size(3000).is_err());
    }
}
