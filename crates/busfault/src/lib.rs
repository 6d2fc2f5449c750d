//! Bus-fault diagnosis for the Kinetis K64F memory-protection subsystem
//!
//! This crate turns raw hardware state captured at a bus-fault exception into
//! a human-readable report. Everything here is pure computation over a small
//! set of hardware seams, so the whole decoder is host-testable.
//!
//! # Architecture Layers
//!
//! ```text
//! Fault trampoline (firmware crate, captures EXC_RETURN)
//!         ↓
//! Report orchestrator ([`report`])
//!         ↓
//! Frame decoder · Region resolver · Bit-band translator · SYSMPU snapshot
//!         ↓
//! Hardware seams ([`ProcessStack`], [`ProtectionUnit`])
//! ```
//!
//! # Modules
//!
//! - [`memory_map`] - Ordered address-range table and resolver
//! - [`bitband`] - Peripheral bit-band alias arithmetic and AIPS slots
//! - [`frame`] - Exception stack frame decoding with privilege gate
//! - [`mpu`] - SYSMPU register view and snapshot
//! - [`status`] - Bus-fault status flags (CFSR.BFSR)
//! - [`report`] - Report builder and orchestrator
//! - [`k64f`] - K64F memory map table
//! - [`config`] - Address windows and register geometry
//!
//! # Features
//!
//! - `std`: `std::error::Error` impls (host tooling)
//! - `defmt`: `defmt::Format` derives on public types
//!
//! # Example
//!
//! ```
//! use busfault::{k64f, CapturedStack, FaultReport, MpuSnapshot};
//!
//! let words = [0, 1, 2, 3, 12, 0x0000_0401, 0x0000_1234, 0x0100_0000];
//! let stack = CapturedStack::new(0x2000_1000, &words);
//! let mpu = MpuSnapshot::default();
//!
//! let report = FaultReport::collect(0xFFFF_FFFD, 0x4006_A004, &k64f::MEMORY_MAP, &stack, &mpu);
//! let text = format!("{report}");
//! assert!(text.contains("UART0"));
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() inside a fault handler path
#![deny(clippy::unreachable)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)]
// Pedantic lints suppressed for this register-decoding crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // register accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod bitband;
pub mod config;
pub mod frame;
pub mod k64f;
pub mod memory_map;
pub mod mpu;
pub mod report;
pub mod status;

pub use bitband::BitBandTarget;
pub use frame::{
    CapturedStack, ExcReturn, ExceptionFrame, FrameDecode, FrameEntry, FrameRegister, ProcessStack,
};
pub use memory_map::{MapError, MemoryMap, MemoryRegion, RegionMatch};
pub use mpu::{
    Cesr, ErrorDetail, MpuSnapshot, ProtectionUnit, RegionDescriptor, SlavePortError, SysMpu,
    SysMpuRegisterBlock,
};
pub use report::{AddressReport, FaultReport, ReportWriter};
pub use status::BusFaultStatus;
