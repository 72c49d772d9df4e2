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

//! DICR interrupt aggregation
//!
//! The master flag (bit 31) is set when:
//! - Force flag (bit 15) is set, OR
//! - Master enable (bit 23) is set AND any channel has both its enable
//!   (bit 16+N) and its flag (bit 24+N) set
//!
//! IRQ3 is raised only when the master flag goes from 0 to 1.

use super::registers::{
    channel_irq_enable_bit, channel_irq_flag_bit, InterruptFlags, DICR_FLAGS_MASK,
    DICR_WRITE_MASK,
};
use super::DMA;
use crate::core::interrupt::{lines, InterruptLine};

impl DMA {
    /// Write DMA Interrupt Register (DICR)
    ///
    /// Flags (bits 24-30) are kept unless written as 1, which clears them.
    /// Bits covered by `DICR_WRITE_MASK` are ORed in. Bit 31 is recomputed.
    pub(super) fn write_interrupt<I>(&mut self, irq: &mut I, value: u32)
    where
        I: InterruptLine + ?Sized,
    {
        self.interrupt &= 0xFF00_0000;
        self.interrupt |= value & DICR_WRITE_MASK;
        self.interrupt &= !(value & DICR_FLAGS_MASK);

        self.update_master_flag(irq);

        log::trace!("DICR = 0x{:08X}", self.interrupt);
    }

    /// Set a channel's completion flag (if enabled) and recompute bit 31
    ///
    /// The flag is only latched when the channel's enable bit (16+N) is set.
    pub fn irq_channel<I>(&mut self, irq: &mut I, channel: usize)
    where
        I: InterruptLine + ?Sized,
    {
        if self.interrupt & channel_irq_enable_bit(channel) != 0 {
            self.interrupt |= channel_irq_flag_bit(channel);
            log::trace!("DMA{} interrupt flag set in DICR", channel);
        }

        self.update_master_flag(irq);
    }

    /// Recompute the DICR master flag, raising IRQ3 on a rising edge
    fn update_master_flag<I>(&mut self, irq: &mut I)
    where
        I: InterruptLine + ?Sized,
    {
        let flags = InterruptFlags::from_bits_retain(self.interrupt);
        let forced = flags.contains(InterruptFlags::FORCE_IRQ);
        let master_enable = flags.contains(InterruptFlags::MASTER_ENABLE);
        let signal = ((self.interrupt >> 16) & (self.interrupt >> 24) & 0x7F) != 0;

        if forced || (master_enable && signal) {
            if !flags.contains(InterruptFlags::MASTER_FLAG) {
                log::debug!("DMA IRQ raised (DICR=0x{:08X})", self.interrupt);
                irq.raise(lines::DMA);
            }
            self.interrupt |= InterruptFlags::MASTER_FLAG.bits();
        } else {
            self.interrupt &= !InterruptFlags::MASTER_FLAG.bits();
        }
    }
}
