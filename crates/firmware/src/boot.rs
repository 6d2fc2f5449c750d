//! Boot-time setup that makes bus faults diagnosable.
//!
//! Initialization order (MUST be respected):
//!   1. Disable the default write buffer (ACTLR.DISDEFWBUF)
//!   2. Enable the BusFault exception (SHCSR.BUSFAULTENA)
//!   3. Validate the memory map the fault handler will consult
//!
//! With write buffering on, a store to a protected peripheral completes from
//! the core's point of view before the bus error comes back. The fault is then
//! imprecise: BFAR is not latched and the stacked PC points past the store.
//! Disabling the buffer costs some store throughput for the lifetime of the
//! firmware; it is never re-enabled.
//!
//! Without step 2 every bus fault escalates to HardFault and the BusFault
//! handler never runs.
//!
//! # Safety
//! These steps must run from privileged mode before any unprivileged code.

use busfault::{k64f, MapError};

/// Ordered list of boot sequence steps for documentation and testing.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. ACTLR.DISDEFWBUF: disable write buffering so data bus faults are precise",
    "2. SHCSR.BUSFAULTENA: route bus faults to BusFault instead of HardFault",
    "3. Memory map: validate ordering before any fault handler consults it",
];

/// ACTLR bit 1: disable write buffer use during default memory map accesses.
pub const ACTLR_DISDEFWBUF: u32 = 1 << 1;

/// ACTLR value with write buffering disabled, other bits preserved.
#[must_use]
pub const fn actlr_with_precise_faults(actlr: u32) -> u32 {
    actlr | ACTLR_DISDEFWBUF
}

/// Check the K64F memory map ordering the resolver relies on.
pub fn validate_memory_map() -> Result<(), MapError> {
    k64f::MEMORY_MAP.validate()
}

#[cfg(feature = "hardware")]
pub mod hardware {
    //! Actual hardware register writes.
    //! Only compiled when targeting real hardware (`--features hardware`).

    use cortex_m::peripheral::scb::Exception;
    use cortex_m::peripheral::{ICB, SCB};

    use super::{actlr_with_precise_faults, validate_memory_map};

    /// Set ACTLR.DISDEFWBUF.
    ///
    /// # Safety
    ///
    /// Must be called from privileged mode. Read-modify-write of a core
    /// register; nothing else may write ACTLR concurrently.
    #[allow(unsafe_code)]
    pub unsafe fn disable_write_buffer(icb: &mut ICB) {
        // SAFETY: ACTLR is always present on ARMv7-M; the caller guarantees
        // privileged execution.
        unsafe {
            icb.actlr.modify(actlr_with_precise_faults);
        }
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }

    /// Run the boot sequence. Call as the first statement in `main`.
    pub fn init(icb: &mut ICB, scb: &mut SCB) {
        // SAFETY: called once from the reset handler's thread, privileged.
        #[allow(unsafe_code)]
        unsafe {
            disable_write_buffer(icb);
        }
        defmt::info!("ACTLR.DISDEFWBUF set: bus faults are precise");

        scb.enable(Exception::BusFault);
        defmt::info!("BusFault exception enabled");

        match validate_memory_map() {
            Ok(()) => defmt::info!(
                "memory map: {=usize} regions",
                busfault::k64f::MEMORY_MAP.len()
            ),
            Err(e) => defmt::warn!("memory map invalid, fault reports may misclassify: {}", e),
        }
    }
}
