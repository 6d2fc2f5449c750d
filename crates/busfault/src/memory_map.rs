//! Ordered memory-map table and address resolver.
//!
//! The map is a static, ascending list of named inclusive address ranges. It
//! does not have to cover the whole 32-bit space: gaps between entries are
//! reported as reserved memory.
//!
//! # Ordering precondition
//!
//! [`MemoryMap::resolve`] walks the table once and stops at the first entry
//! whose base lies above the address. That entry, and everything after it,
//! can no longer match, so the address is classified [`RegionMatch::Reserved`].
//! The walk is only correct if entries are sorted by `base` and do not
//! overlap. `resolve` never checks this; a mis-ordered table silently reports
//! reserved memory for mapped addresses. Use [`MemoryMap::validate`] once at
//! boot or in tests to catch a bad table.
//!
//! ```text
//! base0──end0   base1──end1        base2──end2
//!  [ entry 0 ]   [ entry 1 ]  gap   [ entry 2 ]
//!                          ^  ^
//!                          |  └ first base above addr → Reserved
//!                          └ addr
//! ```

use core::fmt;

/// One named, inclusive address range of the memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryRegion {
    /// Region or peripheral name, as printed in the report.
    pub name: &'static str,
    /// First byte of the region.
    pub base: u32,
    /// Last byte of the region (inclusive).
    pub end: u32,
}

impl MemoryRegion {
    /// Create a region covering `base..=end`.
    pub const fn new(name: &'static str, base: u32, end: u32) -> Self {
        Self { name, base, end }
    }

    /// `true` if `address` lies within `base..=end`.
    #[must_use]
    pub const fn contains(&self, address: u32) -> bool {
        address >= self.base && address <= self.end
    }
}

/// Outcome of resolving an address against the memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegionMatch<'a> {
    /// The address lies inside this entry.
    Found(&'a MemoryRegion),
    /// The address falls in a gap below the next entry's base.
    Reserved,
    /// The address lies above every entry; the table does not describe it.
    Unlisted,
}

impl<'a> RegionMatch<'a> {
    /// The matched region, if any.
    pub fn region(&self) -> Option<&'a MemoryRegion> {
        match self {
            Self::Found(region) => Some(region),
            Self::Reserved | Self::Unlisted => None,
        }
    }
}

/// Memory-map table errors found by [`MemoryMap::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MapError {
    /// Entry `index` ends before it starts.
    Inverted {
        /// Offending entry.
        index: usize,
    },
    /// Entry `index` starts below its predecessor's base.
    Unordered {
        /// Offending entry.
        index: usize,
    },
    /// Entry `index` starts at or before its predecessor's end.
    Overlapping {
        /// Offending entry.
        index: usize,
    },
}

#[cfg(feature = "std")]
impl std::error::Error for MapError {}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inverted { index } => write!(f, "memory map entry {index} ends before it starts"),
            Self::Unordered { index } => {
                write!(f, "memory map entry {index} is below its predecessor")
            }
            Self::Overlapping { index } => {
                write!(f, "memory map entry {index} overlaps its predecessor")
            }
        }
    }
}

/// A borrowed, ascending memory-map table.
#[derive(Debug, Clone, Copy)]
pub struct MemoryMap<'a> {
    regions: &'a [MemoryRegion],
}

impl<'a> MemoryMap<'a> {
    /// Wrap an existing table. The table is expected to be sorted by `base`
    /// and non-overlapping (see the module docs); nothing is checked here.
    pub const fn new(regions: &'a [MemoryRegion]) -> Self {
        Self { regions }
    }

    /// Number of entries.
    pub const fn len(&self) -> usize {
        self.regions.len()
    }

    /// `true` if the table has no entries.
    pub const fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Entries in table order.
    pub fn iter(&self) -> core::slice::Iter<'a, MemoryRegion> {
        self.regions.iter()
    }

    /// Classify `address`.
    ///
    /// Entries are examined in order. An entry whose base is at or below the
    /// address either contains it (`Found`) or lies wholly below it and the
    /// walk continues. The first entry whose base is above the address ends
    /// the walk with `Reserved`. Running off the end yields `Unlisted`.
    pub fn resolve(&self, address: u32) -> RegionMatch<'a> {
        for region in self.regions {
            if address < region.base {
                return RegionMatch::Reserved;
            }
            if address <= region.end {
                return RegionMatch::Found(region);
            }
        }
        RegionMatch::Unlisted
    }

    /// Look up an entry by name.
    pub fn by_name(&self, name: &str) -> Option<&'a MemoryRegion> {
        self.regions.iter().find(|region| region.name == name)
    }

    /// Check the ordering precondition [`resolve`](Self::resolve) relies on.
    ///
    /// Reports the first inverted, unordered or overlapping entry.
    pub fn validate(&self) -> Result<(), MapError> {
        let mut previous: Option<&MemoryRegion> = None;
        for (index, region) in self.regions.iter().enumerate() {
            if region.end < region.base {
                return Err(MapError::Inverted { index });
            }
            if let Some(prev) = previous {
                if region.base < prev.base {
                    return Err(MapError::Unordered { index });
                }
                if region.base <= prev.end {
                    return Err(MapError::Overlapping { index });
                }
            }
            previous = Some(region);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &MemoryMap<'a> {
    type Item = &'a MemoryRegion;
    type IntoIter = core::slice::Iter<'a, MemoryRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const TABLE: &[MemoryRegion] = &[
        MemoryRegion::new("Flash", 0x0000_0000, 0x000F_FFFF),
        MemoryRegion::new("SRAM_U", 0x2000_0000, 0x2002_FFFF),
        MemoryRegion::new("UART0", 0x4001_2000, 0x4001_2FFF),
        MemoryRegion::new("UART1", 0x4001_3000, 0x4001_3FFF),
        MemoryRegion::new("PPB", 0xE000_0000, 0xE00F_FFFF),
    ];

    #[test]
    fn test_found_uart0() {
        let map = MemoryMap::new(TABLE);
        let hit = map.resolve(0x4001_2000);
        assert_eq!(hit, RegionMatch::Found(&TABLE[2]));
        assert_eq!(hit.region().unwrap().name, "UART0");
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let map = MemoryMap::new(TABLE);
        for region in TABLE {
            assert_eq!(map.resolve(region.base), RegionMatch::Found(region));
            assert_eq!(map.resolve(region.end), RegionMatch::Found(region));
        }
    }

    #[test]
    fn test_end_plus_one_leaves_region() {
        let map = MemoryMap::new(TABLE);
        // UART0 end + 1 is UART1's base: adjacent entries.
        assert_eq!(map.resolve(0x4001_3000), RegionMatch::Found(&TABLE[3]));
        // SRAM_U end + 1 falls into the gap below UART0.
        assert_eq!(map.resolve(0x2003_0000), RegionMatch::Reserved);
    }

    #[test]
    fn test_gap_is_reserved() {
        let map = MemoryMap::new(TABLE);
        assert_eq!(map.resolve(0x1000_0000), RegionMatch::Reserved);
        assert_eq!(map.resolve(0x4001_4000), RegionMatch::Reserved);
    }

    #[test]
    fn test_below_every_base_is_reserved() {
        let table = [MemoryRegion::new("PERIPH", 0x4000_0000, 0x400F_FFFF)];
        let map = MemoryMap::new(&table);
        assert_eq!(map.resolve(0x0000_0000), RegionMatch::Reserved);
        assert_eq!(map.resolve(0x3FFF_FFFF), RegionMatch::Reserved);
    }

    #[test]
    fn test_above_every_entry_is_unlisted() {
        let map = MemoryMap::new(TABLE);
        assert_eq!(map.resolve(0xE010_0000), RegionMatch::Unlisted);
        assert_eq!(map.resolve(u32::MAX), RegionMatch::Unlisted);
    }

    #[test]
    fn test_empty_table_is_unlisted() {
        let map = MemoryMap::new(&[]);
        assert!(map.is_empty());
        assert_eq!(map.resolve(0x4000_0000), RegionMatch::Unlisted);
    }

    #[test]
    fn test_descending_table_misreports_reserved() {
        // Documented precondition violation: the walk stops at the first
        // entry whose base is above the address, so UART0 is never examined.
        let table = [
            MemoryRegion::new("PPB", 0xE000_0000, 0xE00F_FFFF),
            MemoryRegion::new("UART0", 0x4001_2000, 0x4001_2FFF),
        ];
        let map = MemoryMap::new(&table);
        assert_eq!(map.resolve(0x4001_2000), RegionMatch::Reserved);
        assert_eq!(map.validate(), Err(MapError::Unordered { index: 1 }));
    }

    #[test]
    fn test_validate_accepts_sorted_table() {
        assert_eq!(MemoryMap::new(TABLE).validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let table = [
            MemoryRegion::new("A", 0x4000_0000, 0x4000_1FFF),
            MemoryRegion::new("B", 0x4000_1000, 0x4000_2FFF),
        ];
        assert_eq!(
            MemoryMap::new(&table).validate(),
            Err(MapError::Overlapping { index: 1 })
        );
    }

    #[test]
    fn test_validate_rejects_inverted_entry() {
        let table = [MemoryRegion::new("A", 0x4000_1000, 0x4000_0FFF)];
        assert_eq!(
            MemoryMap::new(&table).validate(),
            Err(MapError::Inverted { index: 0 })
        );
    }

    #[test]
    fn test_by_name() {
        let map = MemoryMap::new(TABLE);
        assert_eq!(map.by_name("UART1").map(|r| r.base), Some(0x4001_3000));
        assert!(map.by_name("SPI9").is_none());
    }

    #[test]
    fn test_map_error_display() {
        let text = format!("{}", MapError::Overlapping { index: 4 });
        assert_eq!(text, "memory map entry 4 overlaps its predecessor");
    }
}
