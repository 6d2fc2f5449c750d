//! Bus Fault Status Register (BFSR) flags.
//!
//! BFSR is byte 1 of the Configurable Fault Status Register (CFSR,
//! `0xE000_ED28`). The firmware reads it on fault entry to tell whether BFAR
//! holds a usable address: only precise faults latch it, and only while
//! write buffering is disabled do data writes fault precisely.
//!
//! Reference: ARMv7-M ARM (DDI0403E) §B3.2.15 "Configurable Fault Status Register".

use bitflags::bitflags;

bitflags! {
    /// BFSR bits, already shifted down from CFSR[15:8].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BusFaultStatus: u8 {
        /// Bus error on an instruction prefetch.
        const IBUSERR = 1 << 0;
        /// Precise data bus error; BFAR holds the address.
        const PRECISERR = 1 << 1;
        /// Imprecise data bus error; the address is lost.
        const IMPRECISERR = 1 << 2;
        /// Bus error while unstacking on exception return.
        const UNSTKERR = 1 << 3;
        /// Bus error while stacking on exception entry.
        const STKERR = 1 << 4;
        /// Bus error during lazy floating-point state preservation.
        const LSPERR = 1 << 5;
        /// BFAR contains the faulting address.
        const BFARVALID = 1 << 7;
    }
}

impl BusFaultStatus {
    /// Extract BFSR from a full CFSR value.
    #[must_use]
    pub const fn from_cfsr(cfsr: u32) -> Self {
        Self::from_bits_truncate(((cfsr >> 8) & 0xFF) as u8)
    }

    /// `true` if the fault address register can be trusted.
    #[must_use]
    pub const fn address_valid(self) -> bool {
        self.contains(Self::BFARVALID)
    }

    /// Short description of the most specific cause flag.
    #[must_use]
    pub fn cause(self) -> &'static str {
        if self.contains(Self::STKERR) {
            "stacking error on exception entry"
        } else if self.contains(Self::UNSTKERR) {
            "unstacking error on exception return"
        } else if self.contains(Self::LSPERR) {
            "lazy FP state preservation error"
        } else if self.contains(Self::IBUSERR) {
            "instruction prefetch bus error"
        } else if self.contains(Self::PRECISERR) {
            "precise data bus error"
        } else if self.contains(Self::IMPRECISERR) {
            "imprecise data bus error"
        } else {
            "no bus fault recorded"
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BusFaultStatus {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "BFSR({=u8:#04x})", self.bits());
    }
}
