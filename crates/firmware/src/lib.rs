//! K64F bus-fault reporter firmware
//!
//! Binds the `busfault` decoder to real hardware: a BusFault handler that
//! streams a diagnostic report over defmt/RTT, and the boot steps that make
//! those reports trustworthy.
//!
//! # Architecture
//!
//! ```text
//! Application (main.rs)
//!         ↓
//! Boot sequence (boot) · Exception handlers (exception_handlers)
//!         ↓
//! Report output (sink)
//!         ↓
//! busfault (decoder, host-testable)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the K64F target (cortex-m, defmt, probe-rs)
//! - `std` - Enable standard library (host testing)
//!
//! # Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod boot;
pub mod exception_handlers;
pub mod sink;

pub use exception_handlers::stream_report;
pub use sink::LineSink;

#[cfg(feature = "hardware")]
pub use exception_handlers::{bus_fault_entry, ActiveProcessStack};
