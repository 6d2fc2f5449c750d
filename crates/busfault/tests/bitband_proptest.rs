//! Property-based tests for bit-band arithmetic and region resolution.
//! Verifies invariants hold for ALL valid inputs, not just fixed examples.

#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use busfault::bitband::{
    alias_from_bit, bit_index_from_alias, is_bitband_alias, slot_from_addr,
    underlying_addr_from_alias,
};
use busfault::config::{PERIPH_END, PERIPH_START};
use busfault::{k64f, BitBandTarget, MemoryRegion, RegionMatch};

proptest::proptest! {
    /// Every (word, bit) in the peripheral window maps to an alias and back.
    #[test]
    fn alias_round_trip(word in 0u32..=((PERIPH_END - PERIPH_START) >> 2), bit in 0u32..=31) {
        let underlying = PERIPH_START + (word << 2);
        let alias = alias_from_bit(underlying, bit);
        assert!(is_bitband_alias(alias), "alias {alias:#010X} left the alias window");
        assert_eq!(underlying_addr_from_alias(alias), underlying);
        assert_eq!(bit_index_from_alias(alias, underlying), bit);
    }

    /// Decoding a word-aligned alias and re-encoding it is the identity.
    #[test]
    fn target_re_encodes(offset in 0u32..(1 << 23)) {
        let alias = 0x4200_0000 + (offset << 2);
        let target = BitBandTarget::from_alias(alias);
        assert!(target.bit <= 31);
        assert_eq!(target.address & 0x3, 0, "underlying address must be word aligned");
        assert_eq!(target.slot, slot_from_addr(target.address));
        assert_eq!(target.alias(), alias);
    }

    /// Translation never panics, whatever the input.
    #[test]
    fn translation_never_panics(addr in 0u32..=u32::MAX) {
        let _ = BitBandTarget::from_alias(addr);
        let _ = slot_from_addr(addr);
    }

    /// Resolution depends only on the address and the table.
    #[test]
    fn resolve_is_deterministic(addr in 0u32..=u32::MAX) {
        let first = k64f::MEMORY_MAP.resolve(addr);
        let second = k64f::MEMORY_MAP.resolve(addr);
        assert_eq!(first, second);
    }

    /// A found region always contains the address.
    #[test]
    fn found_region_contains_address(addr in 0u32..=u32::MAX) {
        if let RegionMatch::Found(region) = k64f::MEMORY_MAP.resolve(addr) {
            assert!(region.contains(addr),
                "{} [{:#010X}, {:#010X}] returned for {addr:#010X}",
                region.name, region.base, region.end);
        }
    }

    /// Every address just below a region's base, above its predecessor, is reserved.
    #[test]
    fn gap_below_every_base_is_reserved(index in 1usize..k64f::REGIONS.len()) {
        let regions: &[MemoryRegion] = k64f::REGIONS;
        let (prev, region) = (regions[index - 1], regions[index]);
        if region.base > prev.end + 1 {
            assert_eq!(k64f::MEMORY_MAP.resolve(region.base - 1), RegionMatch::Reserved);
        }
        assert_eq!(k64f::MEMORY_MAP.resolve(region.base), RegionMatch::Found(&regions[index]));
    }
}
