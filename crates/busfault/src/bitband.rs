//! Peripheral bit-band alias arithmetic and AIPS slot extraction.
//!
//! The Cortex-M4 maps every bit of the peripheral window
//! `[PERIPH_START, PERIPH_END]` to its own word in the alias window
//! `[BITBAND_START, BITBAND_END]`. A load/store to an alias word reads or
//! writes exactly one bit of the underlying peripheral register.
//!
//! # Encoding used here
//!
//! The underlying side is expressed as a **word-aligned** register address
//! plus a bit index `0..=31` within that word:
//!
//! ```text
//! alias = BITBAND_START + ((underlying - PERIPH_START) << 5) + (bit << 2)
//! ```
//!
//! Going back from an alias, `(alias - BITBAND_START) >> 2` is the absolute
//! bit number inside the peripheral window. Clearing its low five bits and
//! dividing by eight gives the byte offset of the containing word; what the
//! word accounts for of the alias offset leaves `bit << 2`.
//!
//! # Domain
//!
//! None of these functions check their input. Arithmetic wraps, so an
//! address outside the windows yields a meaningless number instead of a
//! panic. Callers test [`is_bitband_alias`] / [`is_peripheral`] first.
//!
//! # References
//!
//! - ARM Cortex-M4 TRM (DDI0439) §3.7 "Bit-banding"
//! - K64 RM §4.6.4 "Peripheral bridge bit-band alias region"

use crate::config::{
    AIPS_SLOT_MASK, AIPS_SLOT_SHIFT, BITBAND_END, BITBAND_START, PERIPH_END, PERIPH_START,
};

/// `true` if `addr` lies in the bit-bandable peripheral window.
#[must_use]
pub const fn is_peripheral(addr: u32) -> bool {
    addr >= PERIPH_START && addr <= PERIPH_END
}

/// `true` if `addr` lies in the peripheral bit-band alias window.
#[must_use]
pub const fn is_bitband_alias(addr: u32) -> bool {
    addr >= BITBAND_START && addr <= BITBAND_END
}

/// AIPS slot (4 KB peripheral page) that `addr` belongs to.
///
/// `slot_from_addr(0x4001_2000) == 0x012`
#[must_use]
pub const fn slot_from_addr(addr: u32) -> u32 {
    (addr & AIPS_SLOT_MASK) >> AIPS_SLOT_SHIFT
}

/// Word-aligned peripheral register address that `alias` points into.
#[must_use]
pub const fn underlying_addr_from_alias(alias: u32) -> u32 {
    let bit_number = alias.wrapping_sub(BITBAND_START) >> 2;
    ((bit_number & !0x1F) >> 3).wrapping_add(PERIPH_START)
}

/// Bit index `0..=31` that `alias` selects inside `underlying`.
///
/// `underlying` must be [`underlying_addr_from_alias`] of the same `alias`.
#[must_use]
pub const fn bit_index_from_alias(alias: u32, underlying: u32) -> u32 {
    let alias_offset = alias.wrapping_sub(BITBAND_START);
    let word_offset = underlying.wrapping_sub(PERIPH_START) << 5;
    alias_offset.wrapping_sub(word_offset) >> 2
}

/// Alias word for bit `bit` of the word-aligned register at `underlying`.
#[must_use]
pub const fn alias_from_bit(underlying: u32, bit: u32) -> u32 {
    BITBAND_START
        .wrapping_add(underlying.wrapping_sub(PERIPH_START) << 5)
        .wrapping_add(bit << 2)
}

/// The peripheral bit an alias address stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitBandTarget {
    /// Word-aligned peripheral register address.
    pub address: u32,
    /// Bit within that word, `0..=31`.
    pub bit: u32,
    /// AIPS slot of `address`.
    pub slot: u32,
}

impl BitBandTarget {
    /// Decode `alias`. Out-of-window input produces garbage, not an error.
    #[must_use]
    pub const fn from_alias(alias: u32) -> Self {
        let address = underlying_addr_from_alias(alias);
        Self {
            address,
            bit: bit_index_from_alias(alias, address),
            slot: slot_from_addr(address),
        }
    }

    /// Re-encode as an alias address.
    #[must_use]
    pub const fn alias(&self) -> u32 {
        alias_from_bit(self.address, self.bit)
    }
}
