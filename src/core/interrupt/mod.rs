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

//! Interrupt line capability and the PSX interrupt controller
//!
//! Peripherals such as the DMA controller only need to pulse a numbered
//! interrupt line. That is expressed by the [`InterruptLine`] trait so the
//! peripheral can be driven by the real [`InterruptController`] or by a
//! recording stub in tests.
//!
//! ## Registers
//!
//! - **I_STAT** (0x1F801070): writing 0 to a bit acknowledges it, 1 leaves it
//! - **I_MASK** (0x1F801074): 1 = interrupt can reach the CPU
//!
//! ## References
//!
//! - [PSX-SPX: Interrupt Control](http://problemkaputt.de/psx-spx.htm#interruptcontrol)

/// Interrupt line numbers
pub mod lines {
    /// Vertical blank
    pub const VBLANK: u32 = 0;

    /// GPU
    pub const GPU: u32 = 1;

    /// CD-ROM controller
    pub const CDROM: u32 = 2;

    /// DMA controller (DICR master flag rising edge)
    pub const DMA: u32 = 3;
}

/// Edge-triggered interrupt request capability
pub trait InterruptLine {
    /// Raise interrupt line `line`
    fn raise(&mut self, line: u32);
}

/// PlayStation Interrupt Controller
///
/// # Example
///
/// ```
/// use psx_dma::core::interrupt::{lines, InterruptController, InterruptLine};
///
/// let mut ic = InterruptController::new();
/// ic.write_mask(1 << lines::DMA);
///
/// ic.raise(lines::DMA);
/// assert!(ic.is_pending());
///
/// // Acknowledge by writing 0 to the bit
/// ic.write_status(!(1 << lines::DMA));
/// assert!(!ic.is_pending());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterruptController {
    /// I_STAT: pending interrupt bits
    status: u16,

    /// I_MASK: enabled interrupt bits
    mask: u16,
}

impl InterruptController {
    /// Create a controller with nothing pending and everything masked
    pub fn new() -> Self {
        Self { status: 0, mask: 0 }
    }

    /// Set interrupt bit(s) in I_STAT
    pub fn request(&mut self, bits: u16) {
        self.status |= bits;
        log::trace!("IRQ requested: 0x{:04X}, status=0x{:04X}", bits, self.status);
    }

    /// Whether any unmasked interrupt is pending
    pub fn is_pending(&self) -> bool {
        (self.status & self.mask) != 0
    }

    /// Read I_STAT
    pub fn read_status(&self) -> u32 {
        self.status as u32
    }

    /// Write I_STAT (bits written as 0 are acknowledged)
    pub fn write_status(&mut self, value: u32) {
        self.status &= value as u16;
        log::trace!("IRQ acknowledged, status=0x{:04X}", self.status);
    }

    /// Read I_MASK
    pub fn read_mask(&self) -> u32 {
        self.mask as u32
    }

    /// Write I_MASK
    pub fn write_mask(&mut self, value: u32) {
        self.mask = value as u16;
        log::debug!("IRQ mask set: 0x{:04X}", self.mask);
    }
}

impl InterruptLine for InterruptController {
    fn raise(&mut self, line: u32) {
        if line >= 16 {
            log::warn!("Ignoring request for nonexistent IRQ line {}", line);
            return;
        }
        self.request(1 << line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_initializes_to_zero() {
        let ic = InterruptController::new();
        assert_eq!(ic.read_status(), 0, "Status should be 0 on initialization");
        assert_eq!(ic.read_mask(), 0, "Mask should be 0 on initialization");
        assert!(!ic.is_pending(), "No interrupts should be pending");
    }

    #[test]
    fn test_raise_sets_status_bit() {
        let mut ic = InterruptController::new();

        ic.raise(lines::DMA);
        assert_eq!(ic.read_status(), 1 << 3, "DMA is bit 3 of I_STAT");

        ic.raise(lines::VBLANK);
        assert_eq!(ic.read_status(), (1 << 3) | 1);
    }

    #[test]
    fn test_masked_interrupt_not_pending() {
        let mut ic = InterruptController::new();

        ic.raise(lines::DMA);
        assert!(!ic.is_pending(), "Masked interrupt should not be pending");

        ic.write_mask(1 << lines::DMA);
        assert!(ic.is_pending(), "Unmasked interrupt should be pending");
    }

    #[test]
    fn test_acknowledge_writes_zero_to_clear() {
        let mut ic = InterruptController::new();
        ic.raise(lines::DMA);
        ic.raise(lines::GPU);

        ic.write_status(!(1u32 << lines::DMA));
        assert_eq!(
            ic.read_status(),
            1 << lines::GPU,
            "Only the bit written as 0 should be cleared"
        );
    }

    #[test]
    fn test_out_of_range_line_ignored() {
        let mut ic = InterruptController::new();
        ic.raise(16);
        assert_eq!(ic.read_status(), 0);
    }

    #[test]
    fn test_only_lower_16_bits_used() {
        let mut ic = InterruptController::new();
        ic.write_mask(0xFFFF_FFFF);
        assert_eq!(ic.read_mask(), 0xFFFF);
    }
}
