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

//! Register masking and DICR acknowledge properties

use proptest::prelude::*;
use psx_dma::core::dma::DMA;
use psx_dma::core::interrupt::InterruptLine;
use psx_dma::core::memory::{AccessWidth, SystemBus};

#[derive(Default)]
struct CountingIrq(usize);

impl InterruptLine for CountingIrq {
    fn raise(&mut self, _line: u32) {
        self.0 += 1;
    }
}

const DICR: u32 = 0x1F80_10F4;

/// DMA with every channel interrupt enabled and the given channels flagged
fn dma_with_flags(flags: u8) -> (DMA, SystemBus, CountingIrq) {
    let mut dma = DMA::new();
    let mut bus = SystemBus::with_ram_size(0x1000).unwrap();
    let mut irq = CountingIrq::default();

    dma.write(&mut bus, &mut irq, AccessWidth::Word, DICR, 0x007F_0000);
    for ch in 0..7 {
        if flags & (1 << ch) != 0 {
            dma.irq_channel(&mut irq, ch);
        }
    }
    (dma, bus, irq)
}

proptest! {
    #[test]
    fn prop_madr_top_byte_always_clear(ch in 0u32..7, value in any::<u32>()) {
        let mut dma = DMA::new();
        let mut bus = SystemBus::with_ram_size(0x1000).unwrap();
        let mut irq = CountingIrq::default();
        let addr = 0x1F80_1080 + ch * 0x10;

        dma.write(&mut bus, &mut irq, AccessWidth::Word, addr, value);
        prop_assert_eq!(dma.read(AccessWidth::Word, addr) & 0xFF00_0000, 0);
        prop_assert_eq!(dma.read(AccessWidth::Word, addr), value & 0x00FF_FFFF);
    }

    #[test]
    fn prop_chcr_equals_masked_input(ch in 0u32..7, value in any::<u32>()) {
        let mut dma = DMA::new();
        let mut bus = SystemBus::with_ram_size(0x1000).unwrap();
        let mut irq = CountingIrq::default();
        let addr = 0x1F80_1088 + ch * 0x10;

        // DPCR is zero, so no transfer can consume the start bit
        dma.write(&mut bus, &mut irq, AccessWidth::Word, addr, value);
        prop_assert_eq!(dma.read(AccessWidth::Word, addr), value & 0x7177_0703);
    }

    #[test]
    fn prop_dicr_ack_clears_only_written_flags(flags in 0u8..0x80, w in any::<u32>()) {
        let (mut dma, mut bus, mut irq) = dma_with_flags(flags);
        let before = dma.read_interrupt() & 0x7F00_0000;

        dma.write(&mut bus, &mut irq, AccessWidth::Word, DICR, w);

        let after = dma.read_interrupt() & 0x7F00_0000;
        prop_assert_eq!(after, before & !(w & 0x7F00_0000));
    }

    #[test]
    fn prop_dicr_master_flag_is_computed(flags in 0u8..0x80, w in any::<u32>()) {
        let (mut dma, mut bus, mut irq) = dma_with_flags(flags);

        dma.write(&mut bus, &mut irq, AccessWidth::Word, DICR, w);

        let dicr = dma.read_interrupt();
        let forced = dicr & (1 << 15) != 0;
        let master = dicr & (1 << 23) != 0;
        let signal = ((dicr >> 16) & (dicr >> 24) & 0x7F) != 0;
        prop_assert_eq!(dicr & (1 << 31) != 0, forced || (master && signal));
        prop_assert_eq!(dicr & 0x0000_7FC0, 0, "Bits 6-14 are never stored");
    }

    #[test]
    fn prop_irq_raised_at_most_once_while_active(writes in proptest::collection::vec(any::<u32>(), 1..20)) {
        let mut dma = DMA::new();
        let mut bus = SystemBus::with_ram_size(0x1000).unwrap();
        let mut irq = CountingIrq::default();
        let mut rising_edges = 0;

        for w in writes {
            let was_active = dma.read_interrupt() & (1 << 31) != 0;
            dma.write(&mut bus, &mut irq, AccessWidth::Word, DICR, w);
            let is_active = dma.read_interrupt() & (1 << 31) != 0;
            if !was_active && is_active {
                rising_edges += 1;
            }
        }

        prop_assert_eq!(irq.0, rising_edges);
    }
}
