//! Fault report assembly.
//!
//! [`FaultReport::collect`] runs the decoders in a fixed order and keeps the
//! results; rendering is separate so the firmware can stream the text to a
//! line sink and host tools can print it.
//!
//! # Sequence
//!
//! 1. Exception frame (privilege gate first, see [`crate::frame`])
//! 2. Fault address against the memory map, plus AIPS slot / bit-band detail
//! 3. SYSMPU snapshot
//!
//! A refused step never stops the later ones: a privileged-origin fault still
//! gets its address resolved and the MPU state dumped.
//!
//! # Layout
//!
//! ```text
//! ***********************************************************
//!                     BUS FAULT
//! ***********************************************************
//!
//! * EXCEPTION STACK FRAME
//!   ...
//!
//! * MEMORY MAP
//!   ...
//!
//! * MPU CONFIGURATION
//!   ...
//!
//! ***********************************************************
//! ```

use core::fmt::{self, Write};

use crate::bitband::{is_bitband_alias, is_peripheral, slot_from_addr, BitBandTarget};
use crate::config::REPORT_TITLE;
use crate::frame::{ExceptionFrame, FrameDecode, ProcessStack};
use crate::memory_map::{MemoryMap, RegionMatch};
use crate::mpu::{MpuSnapshot, ProtectionUnit};

const RULE: &str = "***********************************************************";
const TITLE_INDENT: &str = "                    ";

/// Writes the banner, labelled sections and closing rule of a report.
pub struct ReportWriter<'w, W: Write + ?Sized> {
    out: &'w mut W,
}

impl<'w, W: Write + ?Sized> ReportWriter<'w, W> {
    /// Start a report on `out`.
    pub fn new(out: &'w mut W) -> Self {
        Self { out }
    }

    /// Rule, centred title, rule, blank line.
    pub fn banner(&mut self, title: &str) -> fmt::Result {
        writeln!(self.out)?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "{TITLE_INDENT}{title}")?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out)
    }

    /// `* TITLE`, then whatever `body` writes, then a blank line.
    pub fn section<F>(&mut self, title: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut W) -> fmt::Result,
    {
        writeln!(self.out, "* {title}")?;
        body(&mut *self.out)?;
        writeln!(self.out)
    }

    /// Closing rule.
    pub fn finish(self) -> fmt::Result {
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out)
    }
}

/// What is known about the fault address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressReport<'a> {
    /// The latched fault address.
    pub address: u32,
    /// Memory-map classification.
    pub region: RegionMatch<'a>,
    /// AIPS slot of the matched region, when the address is a peripheral.
    pub slot: Option<u32>,
    /// Underlying register and bit, when the address is a bit-band alias.
    pub bitband: Option<BitBandTarget>,
}

impl<'a> AddressReport<'a> {
    /// Resolve `address` and derive slot / bit-band detail.
    pub fn resolve(address: u32, map: &MemoryMap<'a>) -> Self {
        let region = map.resolve(address);
        let slot = match region {
            RegionMatch::Found(found) if is_peripheral(address) => Some(slot_from_addr(found.base)),
            _ => None,
        };
        let bitband = is_bitband_alias(address).then(|| BitBandTarget::from_alias(address));
        Self {
            address,
            region,
            slot,
            bitband,
        }
    }

    fn write_body<W: Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "  Address:           {:#010X}", self.address)?;
        match self.region {
            RegionMatch::Found(region) => {
                writeln!(out, "  Region/Peripheral: {}", region.name)?;
                writeln!(out, "    Base address:    {:#010X}", region.base)?;
                writeln!(out, "    End address:     {:#010X}", region.end)?;
            }
            RegionMatch::Reserved => writeln!(out, "  Reserved memory region")?,
            RegionMatch::Unlisted => {
                writeln!(out, "  No region/peripheral found in the memory map")?;
            }
        }
        if let Some(slot) = self.slot {
            writeln!(out, "    AIPS slot:       {slot}")?;
        }
        if let Some(target) = self.bitband {
            writeln!(out, "    Before bitband:  {:#010X}", target.address)?;
            writeln!(out, "    Accessed bit:    {}", target.bit)?;
            writeln!(out, "    AIPS slot:       {}", target.slot)?;
        }
        Ok(())
    }
}

fn write_frame<W: Write + ?Sized>(decode: &FrameDecode, out: &mut W) -> fmt::Result {
    match decode {
        FrameDecode::Privileged(exc_return) => {
            writeln!(out, "  Exception from privileged code")?;
            writeln!(out, "    lr:      {:#010X}", exc_return.bits())?;
            writeln!(out, "  Cannot print exception stack frame.")
        }
        FrameDecode::Unprivileged(frame) => write_unprivileged_frame(frame, out),
    }
}

fn write_unprivileged_frame<W: Write + ?Sized>(frame: &ExceptionFrame, out: &mut W) -> fmt::Result {
    writeln!(out, "  Exception from unprivileged code")?;
    writeln!(out, "    psp:     {:#010X}", frame.psp)?;
    writeln!(out, "    lr:      {:#010X}", frame.exc_return.bits())?;
    writeln!(out, "  Exception stack frame:")?;
    for entry in &frame.entries() {
        writeln!(
            out,
            "    psp[{:02}]: {:#010X} | {}",
            entry.index, entry.value, entry.register
        )?;
    }
    Ok(())
}

fn write_mpu<W: Write + ?Sized>(mpu: &MpuSnapshot, out: &mut W) -> fmt::Result {
    writeln!(out, "  CESR: {:#010X}", mpu.cesr.bits())?;

    write!(out, "      ")?;
    for port in 0..mpu.ports.len() {
        write!(out, " Slave {port:<4}")?;
    }
    writeln!(out)?;

    write!(out, "  EAR:")?;
    for port in &mpu.ports {
        write!(out, " {:#010X}", port.address)?;
    }
    writeln!(out)?;

    write!(out, "  EDR:")?;
    for port in &mpu.ports {
        write!(out, " {:#010X}", port.detail.bits())?;
    }
    writeln!(out)?;

    writeln!(out, "       Start      End        Perm.      Valid")?;
    for (index, region) in mpu.regions.iter().enumerate() {
        write!(out, "  R{index:02}:")?;
        for word in &region.words {
            write!(out, " {word:#010X}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Everything the decoder found out about one bus fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultReport<'a> {
    /// Exception frame, or the privileged-origin refusal.
    pub frame: FrameDecode,
    /// Fault address classification.
    pub address: AddressReport<'a>,
    /// Protection-unit state.
    pub mpu: MpuSnapshot,
}

impl<'a> FaultReport<'a> {
    /// Run every decoding step for a fault with EXC_RETURN `lr` at `fault_address`.
    pub fn collect<S, P>(
        lr: u32,
        fault_address: u32,
        map: &MemoryMap<'a>,
        stack: &S,
        mpu: &P,
    ) -> Self
    where
        S: ProcessStack,
        P: ProtectionUnit,
    {
        let frame = FrameDecode::decode(lr, stack);
        let address = AddressReport::resolve(fault_address, map);
        let mpu = MpuSnapshot::capture(mpu);
        Self {
            frame,
            address,
            mpu,
        }
    }

    /// Render the full report to `out`.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        let mut report = ReportWriter::new(out);
        report.banner(REPORT_TITLE)?;
        report.section("EXCEPTION STACK FRAME", |w| write_frame(&self.frame, w))?;
        report.section("MEMORY MAP", |w| self.address.write_body(w))?;
        report.section("MPU CONFIGURATION", |w| write_mpu(&self.mpu, w))?;
        report.finish()
    }
}

impl fmt::Display for FaultReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}
