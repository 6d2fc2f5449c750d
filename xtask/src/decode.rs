//! `cargo xtask decode --dump fault.json`
//!
//! Rebuilds the firmware's bus-fault report on the host from a register dump,
//! e.g. one copied out of a debugger after the target halted in `BusFault`.
//!
//! ```json
//! {
//!   "lr": "0xFFFFFFFD",
//!   "fault_address": "0x4006A004",
//!   "cfsr": "0x00008200",
//!   "psp": "0x20007FC0",
//!   "stack": ["0x0", "0x1", "0x2", "0x3", "0xC", "0x401", "0x1234", "0x01000000"],
//!   "mpu": {
//!     "cesr": "0x80815101",
//!     "ear": ["0x4006A004"],
//!     "edr": ["0x00020001"],
//!     "regions": [["0x0", "0xFFFFFFFF", "0x0061F7DF", "0x1"]]
//!   }
//! }
//! ```
//!
//! Every word may be a JSON number or a `0x`-prefixed hex string. `cfsr` and
//! `mpu` are optional; missing SYSMPU registers read as zero.

use std::path::Path;

use anyhow::{Context, Result};
use busfault::{k64f, BusFaultStatus, CapturedStack, FaultReport, ProtectionUnit};
use colored::Colorize;
use serde::Deserialize;

/// A 32-bit register value as written in a dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawWord")]
pub struct Word(pub u32);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWord {
    Number(u64),
    Text(String),
}

impl TryFrom<RawWord> for Word {
    type Error = String;

    fn try_from(raw: RawWord) -> Result<Self, Self::Error> {
        match raw {
            RawWord::Number(n) => u32::try_from(n)
                .map(Word)
                .map_err(|_| format!("{n} does not fit in 32 bits")),
            RawWord::Text(text) => parse_word(&text).map(Word),
        }
    }
}

fn parse_word(text: &str) -> Result<u32, String> {
    let trimmed = text.trim();
    let cleaned = trimmed.replace('_', "");
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => cleaned.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid register value '{trimmed}': {e}"))
}

/// SYSMPU registers as captured.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MpuDump {
    #[serde(default)]
    pub cesr: Word,
    #[serde(default)]
    pub ear: Vec<Word>,
    #[serde(default)]
    pub edr: Vec<Word>,
    #[serde(default)]
    pub regions: Vec<[Word; 4]>,
}

impl ProtectionUnit for MpuDump {
    fn cesr(&self) -> u32 {
        self.cesr.0
    }

    fn ear(&self, port: usize) -> u32 {
        self.ear.get(port).map_or(0, |w| w.0)
    }

    fn edr(&self, port: usize) -> u32 {
        self.edr.get(port).map_or(0, |w| w.0)
    }

    fn region_word(&self, region: usize, word: usize) -> u32 {
        self.regions
            .get(region)
            .and_then(|words| words.get(word))
            .map_or(0, |w| w.0)
    }
}

/// Everything the BusFault handler reads from hardware.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaultDump {
    /// EXC_RETURN as seen in `lr` on handler entry.
    pub lr: Word,
    /// BFAR.
    #[serde(alias = "bfar")]
    pub fault_address: Word,
    /// CFSR, if captured.
    #[serde(default)]
    pub cfsr: Option<Word>,
    /// PSP at fault time.
    pub psp: Word,
    /// Words at PSP, lowest address first (8, or 9 with the alignment pad).
    #[serde(default)]
    pub stack: Vec<Word>,
    #[serde(default)]
    pub mpu: MpuDump,
}

impl FaultDump {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid fault dump")
    }

    pub fn status(&self) -> Option<BusFaultStatus> {
        self.cfsr.map(|cfsr| BusFaultStatus::from_cfsr(cfsr.0))
    }

    /// The report text the firmware would print for this dump.
    pub fn render(&self) -> String {
        let words: Vec<u32> = self.stack.iter().map(|w| w.0).collect();
        let stack = CapturedStack::new(self.psp.0, &words);
        FaultReport::collect(
            self.lr.0,
            self.fault_address.0,
            &k64f::MEMORY_MAP,
            &stack,
            &self.mpu,
        )
        .to_string()
    }
}

pub fn run(path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dump {}", path.display()))?;
    let dump = FaultDump::parse(&json)?;

    println!();
    println!(
        "{}",
        format!("🔎 Decoding {}", path.display()).cyan().bold()
    );

    match dump.status() {
        Some(status) if status.address_valid() => {
            println!("   {}", format!("BFSR: {}", status.cause()).green());
        }
        Some(status) => {
            println!(
                "   {}",
                format!(
                    "BFSR: {} (BFARVALID clear, fault address is stale)",
                    status.cause()
                )
                .yellow()
                .bold()
            );
        }
        None => println!("   {}", "No CFSR in dump".dimmed()),
    }

    print!("{}", dump.render());
    Ok(())
}
