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

//! psx-dma-replay entry point
//!
//! Runs a register-write replay script against a fresh machine and prints a
//! summary (or the full report as JSON).

use clap::Parser;
use psx_dma::core::config::Config;
use psx_dma::core::system::{Script, System};
use std::path::PathBuf;

/// Replay DMA register writes against an emulated PSX DMA controller
#[derive(Parser, Debug)]
#[command(name = "psx-dma-replay", version, about)]
struct Args {
    /// Replay script (TOML)
    script: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the final DMA state to this file
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_filters(&config.log_filter())
        .init();

    log::info!("Loading script {}", args.script.display());
    let script = Script::load(&args.script)?;

    let mut system = System::from_config(&config)?;
    let report = script.run(&mut system)?;

    if let Some(path) = &args.save_state {
        system.save_state().save_to_file(path)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("steps:    {}", report.steps);
        println!("gp0:      {} words", report.gp0.len());
        println!("I_STAT:   0x{:04X}", report.irq_status);
        println!("DPCR:     0x{:08X}", report.dma.read_control());
        println!("DICR:     0x{:08X}", report.dma.read_interrupt());
        for ch in 0..7 {
            println!(
                "DMA{}:     MADR=0x{:08X} BCR=0x{:08X} CHCR=0x{:08X}",
                ch,
                report.dma.read_madr(ch),
                report.dma.read_bcr(ch),
                report.dma.read_chcr(ch)
            );
        }
        for read in &report.reads {
            println!("read      0x{:08X} = 0x{:08X}", read.address, read.value);
        }
    }

    Ok(())
}
