//! Cortex-M exception handlers for the K64F bus-fault reporter.
//!
//! - **BusFault**: a tiny assembly trampoline captures EXC_RETURN (the `lr`
//!   value on exception entry) and tail-calls [`bus_fault_entry`], which
//!   collects a [`FaultReport`] from live hardware, streams it line by line to
//!   the defmt console, and halts.
//! - **HardFault**: anything that escalates (a fault inside the BusFault
//!   handler, or a bus fault before `boot::hardware::init` enabled the
//!   exception) halts with the stacked frame address.
//!
//! # Why a trampoline
//!
//! `#[cortex_m_rt::exception]` does not expose the raw EXC_RETURN value, and
//! the first Rust instruction of a handler may already have clobbered `lr`.
//! Two instructions of assembly move it into `r0` before anything else runs.
//!
//! # Hardware-only handler
//!
//! The handlers need ARM target intrinsics and are therefore gated behind
//! `#[cfg(feature = "hardware")]`. [`stream_report`] and `BUSFAULT_DEFINED`
//! compile unconditionally so host tests can exercise the output path.

#![allow(clippy::doc_markdown)] // Exception handler docs use hardware terminology (HardFault, BusFault) as plain text

use core::fmt;

use busfault::config::REPORT_LINE_CAPACITY;
use busfault::FaultReport;

use crate::sink::LineSink;

/// Marker constant, confirmed by arch tests to verify this module exists.
pub const BUSFAULT_DEFINED: bool = true;

/// Render `report` and hand each line to `emit`.
///
/// Lines longer than [`REPORT_LINE_CAPACITY`] are split.
pub fn stream_report<F>(report: &FaultReport<'_>, emit: F) -> fmt::Result
where
    F: FnMut(&str),
{
    let mut sink = LineSink::<F, REPORT_LINE_CAPACITY>::new(emit);
    let result = report.write_to(&mut sink);
    sink.flush();
    result
}

#[cfg(feature = "hardware")]
pub use self::hardware::{bus_fault_entry, ActiveProcessStack};

#[cfg(feature = "hardware")]
mod hardware {
    use busfault::{k64f, BusFaultStatus, FaultReport, ProcessStack, SysMpu};
    use cortex_m::peripheral::SCB;

    use super::stream_report;

    // EXC_RETURN is only valid in `lr` at the very first instruction.
    core::arch::global_asm!(
        ".section .text.BusFault,\"ax\",%progbits",
        ".global BusFault",
        ".type BusFault,%function",
        ".thumb_func",
        "BusFault:",
        "    mov r0, lr",
        "    b {entry}",
        entry = sym bus_fault_entry,
    );

    /// The process stack of the interrupted thread, read on demand.
    ///
    /// Nothing is read until the frame decoder asks, so a fault from
    /// privileged code never touches PSP.
    #[derive(Debug, Clone, Copy)]
    pub struct ActiveProcessStack;

    impl ProcessStack for ActiveProcessStack {
        fn pointer(&self) -> u32 {
            cortex_m::register::psp::read()
        }

        fn word(&self, index: usize) -> u32 {
            let offset = index.wrapping_mul(core::mem::size_of::<u32>());
            let addr = (self.pointer() as usize).wrapping_add(offset) as *const u32;
            // SAFETY: only called for EXC_RETURN values that stacked on PSP,
            // so PSP points at a hardware-written exception frame. Volatile
            // because the frame was written by the core, not by Rust.
            #[allow(unsafe_code)]
            unsafe {
                addr.read_volatile()
            }
        }
    }

    /// BusFault body. Entered from the `BusFault` trampoline with EXC_RETURN
    /// in `r0`; never returns.
    pub extern "C" fn bus_fault_entry(lr: u32) -> ! {
        // SAFETY: SCB::PTR is the architecturally fixed SCB address; the
        // reads below have no side effects.
        #[allow(unsafe_code)]
        let scb = unsafe { &*SCB::PTR };
        let bfar = scb.bfar.read();
        let status = BusFaultStatus::from_cfsr(scb.cfsr.read());

        defmt::info!("BusFault: {=str} ({})", status.cause(), status);
        if !status.address_valid() {
            defmt::warn!("BFARVALID clear, fault address {=u32:#010x} is stale", bfar);
        }

        // SAFETY: this firmware only runs on the K64F.
        #[allow(unsafe_code)]
        let mpu = unsafe { SysMpu::k64f() };
        let report = FaultReport::collect(lr, bfar, &k64f::MEMORY_MAP, &ActiveProcessStack, &mpu);

        if stream_report(&report, |line| defmt::println!("{=str}", line)).is_err() {
            defmt::warn!("fault report truncated");
        }

        if let Some(frame) = report.frame.frame() {
            defmt::error!(
                "faulting pc {=u32:#010x}, lr {=u32:#010x}, xpsr {=u32:#010x}",
                frame.pc(),
                frame.lr(),
                frame.xpsr()
            );
        }

        let cesr = report.mpu.cesr;
        defmt::info!(
            "SYSMPU rev {=u32}: enabled {=bool}, {=u32} regions, {=u32} slave ports",
            cesr.revision(),
            cesr.enabled(),
            cesr.region_descriptors(),
            cesr.slave_ports()
        );
        for (port, error) in report.mpu.faulting_ports() {
            let detail = error.detail;
            defmt::error!(
                "slave port {=usize}: {=str} of {=u32:#010x} by master {=u32} (attr {=u32:#x}, pid {=u32}), denied by RGD mask {=u32:#06x}",
                port,
                if detail.is_write() { "write" } else { "read" },
                error.address,
                detail.master(),
                detail.attributes(),
                detail.process_id(),
                detail.access_control_detail()
            );
        }

        defmt::panic!("unrecoverable bus fault at {=u32:#010x}", bfar);
    }

    /// HardFault exception handler.
    ///
    /// # Safety
    ///
    /// Returning from a HardFault handler is undefined behavior; `-> !`
    /// enforces this.
    #[cortex_m_rt::exception]
    #[allow(unsafe_code)]
    unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
        defmt::panic!(
            "HardFault! Stacked frame at 0x{:08X}, pc 0x{:08X}. \
             Possible causes: fault inside BusFault handler, BusFault not yet enabled.",
            ef as *const _ as u32,
            ef.pc()
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use busfault::{k64f, CapturedStack, MpuSnapshot};

    fn lines(lr: u32, address: u32) -> Vec<std::string::String> {
        let words = [0, 1, 2, 3, 12, 0x0000_0401, 0x0000_1234, 0x0100_0000];
        let stack = CapturedStack::new(0x2000_1000, &words);
        let report = FaultReport::collect(
            lr,
            address,
            &k64f::MEMORY_MAP,
            &stack,
            &MpuSnapshot::default(),
        );
        let mut out = Vec::new();
        stream_report(&report, |line| out.push(line.to_owned())).unwrap();
        out
    }

    #[test]
    fn test_stream_report_emits_whole_lines() {
        let out = lines(0xFFFF_FFFD, 0x4006_A004);
        assert!(out.iter().all(|line| !line.contains('\n')));
        assert!(out.iter().any(|line| line == "  Region/Peripheral: UART0"));
        assert!(out.iter().any(|line| line == "    psp[06]: 0x00001234 | pc"));
    }

    #[test]
    fn test_stream_report_matches_display() {
        let words = [0u32; 8];
        let stack = CapturedStack::new(0x2000_1000, &words);
        let report = FaultReport::collect(
            0xFFFF_FFF9,
            0x4005_0000,
            &k64f::MEMORY_MAP,
            &stack,
            &MpuSnapshot::default(),
        );
        let mut out = Vec::new();
        stream_report(&report, |line| out.push(line.to_owned())).unwrap();
        let joined: std::string::String = out.iter().map(|l| format!("{l}\n")).collect();
        assert_eq!(joined, report.to_string());
    }

    #[test]
    fn test_no_line_exceeds_capacity() {
        let out = lines(0xFFFF_FFFD, 0x4200_0010);
        assert!(out.iter().all(|line| line.len() <= REPORT_LINE_CAPACITY));
    }

    #[test]
    fn test_marker() {
        assert!(BUSFAULT_DEFINED);
    }
}
