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

//! Transfer engine
//!
//! Transfers are selected by the exact CHCR value rather than by decoding
//! its fields. Only the start patterns software actually issues are known:
//!
//! | Channel | CHCR       | Transfer                          |
//! |---------|------------|-----------------------------------|
//! | 2       | 0x01000200 | GPUREAD → RAM, block mode         |
//! | 2       | 0x01000201 | RAM → GP0, block mode             |
//! | 2       | 0x01000401 | RAM → GP0, linked list            |
//! | 6       | 0x11000002 | Ordering table clear              |
//!
//! Every transfer runs to completion in one call.

use super::registers::{ChannelFlags, LIST_TERMINATOR};
use super::DMA;
use crate::core::interrupt::InterruptLine;
use crate::core::memory::{AccessWidth, MemoryBus, GPU_DATA_PORT};

/// Recognised transfer shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// GPU → RAM in blocks
    GpuBlockRead,
    /// RAM → GPU in blocks
    GpuBlockWrite,
    /// RAM → GPU following a linked list of packets
    GpuLinkedList,
    /// Reverse-linked ordering table build in RAM
    OrderingTableClear,
}

/// (channel, CHCR, transfer)
const TRANSFER_TABLE: [(usize, u32, TransferKind); 4] = [
    (DMA::CH_GPU, 0x0100_0200, TransferKind::GpuBlockRead),
    (DMA::CH_GPU, 0x0100_0201, TransferKind::GpuBlockWrite),
    (DMA::CH_GPU, 0x0100_0401, TransferKind::GpuLinkedList),
    (DMA::CH_OTC, 0x1100_0002, TransferKind::OrderingTableClear),
];

impl TransferKind {
    /// Look up the transfer started by `control` on `channel`, if any
    ///
    /// # Example
    ///
    /// ```
    /// use psx_dma::core::dma::TransferKind;
    ///
    /// assert_eq!(TransferKind::lookup(6, 0x1100_0002), Some(TransferKind::OrderingTableClear));
    /// assert_eq!(TransferKind::lookup(2, 0x1100_0002), None);
    /// ```
    pub fn lookup(channel: usize, control: u32) -> Option<Self> {
        TRANSFER_TABLE
            .iter()
            .find(|&&(ch, chcr, _)| ch == channel && chcr == control)
            .map(|&(_, _, kind)| kind)
    }
}

impl DMA {
    /// Run the transfer matching a channel's current CHCR, if any
    pub(super) fn run_channel<B, I>(&mut self, ch_id: usize, bus: &mut B, irq: &mut I)
    where
        B: MemoryBus + ?Sized,
        I: InterruptLine + ?Sized,
    {
        let Some(kind) = TransferKind::lookup(ch_id, self.channels[ch_id].channel_control())
        else {
            return;
        };

        log::debug!(
            "DMA{} transfer {:?}: addr=0x{:06X} bcr=0x{:08X}",
            ch_id,
            kind,
            self.channels[ch_id].base_address(),
            self.channels[ch_id].block_control()
        );

        match kind {
            TransferKind::GpuBlockRead => self.transfer_gpu_read(bus),
            TransferKind::GpuBlockWrite => self.transfer_gpu_write(bus),
            TransferKind::GpuLinkedList => self.transfer_gpu_list(bus),
            TransferKind::OrderingTableClear => self.transfer_otc(bus),
        }

        // CH2 only drops the busy bit; OTC also drops the trigger bit
        let done = match kind {
            TransferKind::OrderingTableClear => ChannelFlags::START_BUSY | ChannelFlags::TRIGGER,
            _ => ChannelFlags::START_BUSY,
        };
        self.channels[ch_id].finish(done);

        self.irq_channel(irq, ch_id);
    }

    /// GPUREAD → RAM, `block_count` blocks of `block_size` words
    fn transfer_gpu_read<B: MemoryBus + ?Sized>(&self, bus: &mut B) {
        let channel = &self.channels[Self::CH_GPU];
        let mut addr = channel.base_address();
        let block_size = channel.block_size();
        let block_count = channel.block_count();

        for _ in 0..block_count {
            for _ in 0..block_size {
                let word = bus.read(AccessWidth::Word, GPU_DATA_PORT);
                bus.write(AccessWidth::Word, addr, word);
                addr = addr.wrapping_add(4);
            }
        }

        log::debug!(
            "GPU DMA read complete ({} blocks × {} words)",
            block_count,
            block_size
        );
    }

    /// RAM → GP0, `block_count` blocks of `block_size` words
    fn transfer_gpu_write<B: MemoryBus + ?Sized>(&self, bus: &mut B) {
        let channel = &self.channels[Self::CH_GPU];
        let mut addr = channel.base_address();
        let block_size = channel.block_size();
        let block_count = channel.block_count();

        for _ in 0..block_count {
            for _ in 0..block_size {
                let word = bus.read(AccessWidth::Word, addr);
                bus.write(AccessWidth::Word, GPU_DATA_PORT, word);
                addr = addr.wrapping_add(4);
            }
        }

        log::debug!(
            "GPU DMA write complete ({} blocks × {} words)",
            block_count,
            block_size
        );
    }

    /// RAM → GP0 following a packet chain
    ///
    /// Each packet starts with a header word: bits 24-31 are the number of
    /// payload words that follow, bits 0-23 the address of the next header.
    /// The walk stops once the next address is `0xFFFFFF`. A chain without
    /// the terminator never ends, exactly like on hardware.
    fn transfer_gpu_list<B: MemoryBus + ?Sized>(&self, bus: &mut B) {
        let mut addr = self.channels[Self::CH_GPU].base_address();
        let mut packets = 0u32;

        while addr != LIST_TERMINATOR {
            let header = bus.read(AccessWidth::Word, addr);
            let count = header >> 24;
            let mut cursor = addr.wrapping_add(4);

            for _ in 0..count {
                let word = bus.read(AccessWidth::Word, cursor);
                bus.write(AccessWidth::Word, GPU_DATA_PORT, word);
                cursor = cursor.wrapping_add(4);
            }

            addr = header & LIST_TERMINATOR;
            packets += 1;
        }

        log::debug!("GPU DMA linked-list transfer complete ({} packets)", packets);
    }

    /// Ordering table clear
    ///
    /// Writes `count - 1` entries each pointing 4 bytes below itself,
    /// walking downwards from MADR, then terminates the last entry.
    fn transfer_otc<B: MemoryBus + ?Sized>(&self, bus: &mut B) {
        let channel = &self.channels[Self::CH_OTC];
        let mut addr = channel.base_address();
        let count = channel.word_count();

        for _ in 1..count {
            let prev = addr.wrapping_sub(4);
            bus.write(AccessWidth::Word, addr, prev);
            addr = prev;
        }

        bus.write(AccessWidth::Word, addr, LIST_TERMINATOR);

        log::debug!("OTC DMA transfer complete ({} entries)", count);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{write, IrqLog};
    use super::*;
    use crate::core::interrupt::lines;
    use crate::core::memory::SystemBus;

    const GPU_MADR: u32 = 0x1F80_10A0;
    const GPU_BCR: u32 = 0x1F80_10A4;
    const GPU_CHCR: u32 = 0x1F80_10A8;
    const OTC_MADR: u32 = 0x1F80_10E0;
    const OTC_BCR: u32 = 0x1F80_10E4;
    const OTC_CHCR: u32 = 0x1F80_10E8;
    const DPCR: u32 = 0x1F80_10F0;
    const DICR: u32 = 0x1F80_10F4;

    fn setup() -> (DMA, SystemBus, IrqLog) {
        let mut dma = DMA::new();
        let mut bus = SystemBus::new();
        let mut irq = IrqLog::default();
        write(&mut dma, &mut bus, &mut irq, DPCR, 0x0800_0800);
        (dma, bus, irq)
    }

    #[test]
    fn test_lookup_table() {
        assert_eq!(
            TransferKind::lookup(2, 0x0100_0200),
            Some(TransferKind::GpuBlockRead)
        );
        assert_eq!(
            TransferKind::lookup(2, 0x0100_0201),
            Some(TransferKind::GpuBlockWrite)
        );
        assert_eq!(
            TransferKind::lookup(2, 0x0100_0401),
            Some(TransferKind::GpuLinkedList)
        );
        assert_eq!(
            TransferKind::lookup(6, 0x1100_0002),
            Some(TransferKind::OrderingTableClear)
        );

        // Exact match only: extra trigger bit on CH2 is not recognised
        assert_eq!(TransferKind::lookup(2, 0x1100_0401), None);
        for ch in [0, 1, 3, 4, 5] {
            assert_eq!(TransferKind::lookup(ch, 0x0100_0201), None);
        }
    }

    #[test]
    fn test_gpu_block_read() {
        let (mut dma, mut bus, mut irq) = setup();
        bus.push_gpuread(&[10, 11, 12, 13, 14, 15, 16, 17]);

        write(&mut dma, &mut bus, &mut irq, DICR, (1 << 23) | (1 << 18));
        write(&mut dma, &mut bus, &mut irq, GPU_MADR, 0x0000_4000);
        write(&mut dma, &mut bus, &mut irq, GPU_BCR, 0x0002_0004);
        write(&mut dma, &mut bus, &mut irq, GPU_CHCR, 0x0100_0200);

        for i in 0..8u32 {
            assert_eq!(
                bus.peek32(0x4000 + i * 4).unwrap(),
                10 + i,
                "Word {} should land in port-read order",
                i
            );
        }
        assert_eq!(bus.gpuread_len(), 0);
        assert_eq!(dma.read_chcr(DMA::CH_GPU), 0x0000_0200, "Busy bit cleared");
        assert_ne!(dma.read_interrupt() & (1 << 26), 0, "Channel 2 flag set");
        assert_eq!(irq.raised, vec![lines::DMA]);
    }

    #[test]
    fn test_gpu_block_read_without_irq_enable() {
        let (mut dma, mut bus, mut irq) = setup();
        bus.push_gpuread(&[1, 2]);

        write(&mut dma, &mut bus, &mut irq, GPU_MADR, 0x0000_4000);
        write(&mut dma, &mut bus, &mut irq, GPU_BCR, 0x0001_0002);
        write(&mut dma, &mut bus, &mut irq, GPU_CHCR, 0x0100_0200);

        assert_eq!(bus.peek32(0x4004).unwrap(), 2);
        assert_eq!(dma.read_interrupt(), 0, "Masked channel must not latch a flag");
        assert!(irq.raised.is_empty());
    }

    #[test]
    fn test_gpu_block_write() {
        let (mut dma, mut bus, mut irq) = setup();
        for i in 0..6u32 {
            bus.poke32(0x8000 + i * 4, 0xA0 + i).unwrap();
        }

        write(&mut dma, &mut bus, &mut irq, GPU_MADR, 0x0000_8000);
        write(&mut dma, &mut bus, &mut irq, GPU_BCR, 0x0003_0002);
        write(&mut dma, &mut bus, &mut irq, GPU_CHCR, 0x0100_0201);

        assert_eq!(
            bus.gp0_words(),
            &[0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5],
            "RAM words should reach GP0 in order"
        );
        assert_eq!(dma.read_chcr(DMA::CH_GPU), 0x0000_0201);
        assert_eq!(
            dma.read_madr(DMA::CH_GPU),
            0x0000_8000,
            "MADR is not written back"
        );
    }

    #[test]
    fn test_gpu_linked_list() {
        let (mut dma, mut bus, mut irq) = setup();

        // Packet at 0x100: 2 words, next at 0x200
        bus.poke32(0x100, 0x0200_0200).unwrap();
        bus.poke32(0x104, 0xE100_0001).unwrap();
        bus.poke32(0x108, 0xE200_0002).unwrap();
        // Packet at 0x200: empty, next at 0x300
        bus.poke32(0x200, 0x0000_0300).unwrap();
        // Packet at 0x300: 1 word, end of list
        bus.poke32(0x300, 0x01FF_FFFF).unwrap();
        bus.poke32(0x304, 0xE300_0003).unwrap();

        write(&mut dma, &mut bus, &mut irq, DICR, (1 << 23) | (1 << 18));
        write(&mut dma, &mut bus, &mut irq, GPU_MADR, 0x100);
        write(&mut dma, &mut bus, &mut irq, GPU_CHCR, 0x0100_0401);

        assert_eq!(bus.gp0_words(), &[0xE100_0001, 0xE200_0002, 0xE300_0003]);
        assert_eq!(dma.read_chcr(DMA::CH_GPU), 0x0000_0401);
        assert_eq!(irq.raised, vec![lines::DMA]);
    }

    #[test]
    fn test_gpu_linked_list_starting_at_terminator() {
        let (mut dma, mut bus, mut irq) = setup();

        write(&mut dma, &mut bus, &mut irq, GPU_MADR, 0x00FF_FFFF);
        write(&mut dma, &mut bus, &mut irq, GPU_CHCR, 0x0100_0401);

        assert!(bus.gp0_words().is_empty());
        assert_eq!(dma.read_chcr(DMA::CH_GPU), 0x0000_0401, "Still completes");
    }

    #[test]
    fn test_ordering_table_clear() {
        let (mut dma, mut bus, mut irq) = setup();

        write(&mut dma, &mut bus, &mut irq, DICR, (1 << 23) | (1 << 22));
        write(&mut dma, &mut bus, &mut irq, OTC_MADR, 0x1000);
        write(&mut dma, &mut bus, &mut irq, OTC_BCR, 4);
        write(&mut dma, &mut bus, &mut irq, OTC_CHCR, 0x1100_0002);

        assert_eq!(bus.peek32(0x1000).unwrap(), 0x0000_0FFC);
        assert_eq!(bus.peek32(0x0FFC).unwrap(), 0x0000_0FF8);
        assert_eq!(bus.peek32(0x0FF8).unwrap(), 0x0000_0FF4);
        assert_eq!(bus.peek32(0x0FF4).unwrap(), 0x00FF_FFFF);
        assert_eq!(bus.peek32(0x0FF0).unwrap(), 0, "Nothing below the table");
        assert_eq!(
            dma.read_chcr(DMA::CH_OTC),
            0x0000_0002,
            "Busy and trigger bits cleared"
        );
        assert_ne!(dma.read_interrupt() & (1 << 30), 0);
        assert_eq!(irq.raised, vec![lines::DMA]);
    }

    #[test]
    fn test_ordering_table_single_entry() {
        let (mut dma, mut bus, mut irq) = setup();

        write(&mut dma, &mut bus, &mut irq, OTC_MADR, 0x2000);
        write(&mut dma, &mut bus, &mut irq, OTC_BCR, 1);
        write(&mut dma, &mut bus, &mut irq, OTC_CHCR, 0x1100_0002);

        assert_eq!(bus.peek32(0x2000).unwrap(), 0x00FF_FFFF);
        assert_eq!(bus.peek32(0x1FFC).unwrap(), 0);
    }

    #[test]
    fn test_scheduler_runs_otc_before_gpu() {
        let (mut dma, mut bus, mut irq) = setup();

        // Arm both channels while disabled
        write(&mut dma, &mut bus, &mut irq, DPCR, 0);
        write(&mut dma, &mut bus, &mut irq, OTC_MADR, 0x108);
        write(&mut dma, &mut bus, &mut irq, OTC_BCR, 3);
        write(&mut dma, &mut bus, &mut irq, OTC_CHCR, 0x1100_0002);
        write(&mut dma, &mut bus, &mut irq, GPU_MADR, 0x108);
        write(&mut dma, &mut bus, &mut irq, GPU_CHCR, 0x0100_0401);

        // One write enables both. If OTC runs first, the GPU walks the fresh
        // table (3 empty packets) and terminates.
        write(&mut dma, &mut bus, &mut irq, DPCR, 0x0800_0800);

        assert_eq!(dma.read_chcr(DMA::CH_OTC), 0x0000_0002);
        assert_eq!(dma.read_chcr(DMA::CH_GPU), 0x0000_0401);
        assert!(bus.gp0_words().is_empty());
    }
}
