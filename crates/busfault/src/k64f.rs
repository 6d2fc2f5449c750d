//! K64F (MK64FN1M0VLL12) memory map.
//!
//! Peripheral slots follow the K64 Sub-Family Reference Manual, chapter 4
//! "Memory Map". Every AIPS peripheral owns one 4 KB page except SIM, which
//! spans two. Unpopulated slots are left out so that an access to them
//! resolves as reserved.
//!
//! The table is ascending and non-overlapping; `test_map_is_valid` guards it.

use crate::memory_map::{MemoryMap, MemoryRegion};

/// Regions of the K64F address space, ascending by base.
pub const REGIONS: &[MemoryRegion] = &[
    MemoryRegion::new("Flash", 0x0000_0000, 0x000F_FFFF),
    MemoryRegion::new("SRAM_L", 0x1FFF_0000, 0x1FFF_FFFF),
    MemoryRegion::new("SRAM_U", 0x2000_0000, 0x2002_FFFF),
    MemoryRegion::new("SRAM bit-band alias", 0x2200_0000, 0x23FF_FFFF),
    // AIPS-0 peripheral bridge
    MemoryRegion::new("AIPS0", 0x4000_0000, 0x4000_0FFF),
    MemoryRegion::new("AXBS", 0x4000_4000, 0x4000_4FFF),
    MemoryRegion::new("DMA", 0x4000_8000, 0x4000_8FFF),
    MemoryRegion::new("DMA TCD", 0x4000_9000, 0x4000_9FFF),
    MemoryRegion::new("FB", 0x4000_C000, 0x4000_CFFF),
    MemoryRegion::new("SYSMPU", 0x4000_D000, 0x4000_DFFF),
    MemoryRegion::new("FMC", 0x4001_F000, 0x4001_FFFF),
    MemoryRegion::new("FTFE", 0x4002_0000, 0x4002_0FFF),
    MemoryRegion::new("DMAMUX", 0x4002_1000, 0x4002_1FFF),
    MemoryRegion::new("CAN0", 0x4002_4000, 0x4002_4FFF),
    MemoryRegion::new("RNG", 0x4002_9000, 0x4002_9FFF),
    MemoryRegion::new("SPI0", 0x4002_C000, 0x4002_CFFF),
    MemoryRegion::new("SPI1", 0x4002_D000, 0x4002_DFFF),
    MemoryRegion::new("I2S0", 0x4002_F000, 0x4002_FFFF),
    MemoryRegion::new("CRC", 0x4003_2000, 0x4003_2FFF),
    MemoryRegion::new("USBDCD", 0x4003_5000, 0x4003_5FFF),
    MemoryRegion::new("PDB0", 0x4003_6000, 0x4003_6FFF),
    MemoryRegion::new("PIT", 0x4003_7000, 0x4003_7FFF),
    MemoryRegion::new("FTM0", 0x4003_8000, 0x4003_8FFF),
    MemoryRegion::new("FTM1", 0x4003_9000, 0x4003_9FFF),
    MemoryRegion::new("FTM2", 0x4003_A000, 0x4003_AFFF),
    MemoryRegion::new("ADC0", 0x4003_B000, 0x4003_BFFF),
    MemoryRegion::new("RTC", 0x4003_D000, 0x4003_DFFF),
    MemoryRegion::new("RFVBAT", 0x4003_E000, 0x4003_EFFF),
    MemoryRegion::new("LPTMR0", 0x4004_0000, 0x4004_0FFF),
    MemoryRegion::new("RFSYS", 0x4004_1000, 0x4004_1FFF),
    MemoryRegion::new("SIM", 0x4004_7000, 0x4004_8FFF),
    MemoryRegion::new("PORTA", 0x4004_9000, 0x4004_9FFF),
    MemoryRegion::new("PORTB", 0x4004_A000, 0x4004_AFFF),
    MemoryRegion::new("PORTC", 0x4004_B000, 0x4004_BFFF),
    MemoryRegion::new("PORTD", 0x4004_C000, 0x4004_CFFF),
    MemoryRegion::new("PORTE", 0x4004_D000, 0x4004_DFFF),
    MemoryRegion::new("WDOG", 0x4005_2000, 0x4005_2FFF),
    MemoryRegion::new("EWM", 0x4006_1000, 0x4006_1FFF),
    MemoryRegion::new("CMT", 0x4006_2000, 0x4006_2FFF),
    MemoryRegion::new("MCG", 0x4006_4000, 0x4006_4FFF),
    MemoryRegion::new("OSC", 0x4006_5000, 0x4006_5FFF),
    MemoryRegion::new("I2C0", 0x4006_6000, 0x4006_6FFF),
    MemoryRegion::new("I2C1", 0x4006_7000, 0x4006_7FFF),
    MemoryRegion::new("UART0", 0x4006_A000, 0x4006_AFFF),
    MemoryRegion::new("UART1", 0x4006_B000, 0x4006_BFFF),
    MemoryRegion::new("UART2", 0x4006_C000, 0x4006_CFFF),
    MemoryRegion::new("UART3", 0x4006_D000, 0x4006_DFFF),
    MemoryRegion::new("USB0", 0x4007_2000, 0x4007_2FFF),
    MemoryRegion::new("CMP", 0x4007_3000, 0x4007_3FFF),
    MemoryRegion::new("VREF", 0x4007_4000, 0x4007_4FFF),
    MemoryRegion::new("LLWU", 0x4007_C000, 0x4007_CFFF),
    MemoryRegion::new("PMC", 0x4007_D000, 0x4007_DFFF),
    MemoryRegion::new("SMC", 0x4007_E000, 0x4007_EFFF),
    MemoryRegion::new("RCM", 0x4007_F000, 0x4007_FFFF),
    // AIPS-1 peripheral bridge
    MemoryRegion::new("AIPS1", 0x4008_0000, 0x4008_0FFF),
    MemoryRegion::new("SPI2", 0x400A_C000, 0x400A_CFFF),
    MemoryRegion::new("SDHC", 0x400B_1000, 0x400B_1FFF),
    MemoryRegion::new("FTM3", 0x400B_9000, 0x400B_9FFF),
    MemoryRegion::new("ADC1", 0x400B_B000, 0x400B_BFFF),
    MemoryRegion::new("ENET", 0x400C_0000, 0x400C_0FFF),
    MemoryRegion::new("DAC0", 0x400C_C000, 0x400C_CFFF),
    MemoryRegion::new("DAC1", 0x400C_D000, 0x400C_DFFF),
    MemoryRegion::new("I2C2", 0x400E_6000, 0x400E_6FFF),
    MemoryRegion::new("UART4", 0x400E_A000, 0x400E_AFFF),
    MemoryRegion::new("UART5", 0x400E_B000, 0x400E_BFFF),
    MemoryRegion::new("GPIO", 0x400F_F000, 0x400F_FFFF),
    // System windows
    MemoryRegion::new("AIPS bit-band alias", 0x4200_0000, 0x43FF_FFFF),
    MemoryRegion::new("FlexBus", 0x6000_0000, 0x9FFF_FFFF),
    MemoryRegion::new("PPB", 0xE000_0000, 0xE00F_FFFF),
];

/// [`REGIONS`] wrapped for resolution.
pub const MEMORY_MAP: MemoryMap<'static> = MemoryMap::new(REGIONS);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::bitband::{alias_from_bit, is_peripheral, slot_from_addr};
    use crate::memory_map::RegionMatch;

    #[test]
    fn test_map_is_valid() {
        assert_eq!(MEMORY_MAP.validate(), Ok(()));
    }

    #[test]
    fn test_peripheral_pages_match_their_slot() {
        // A 4 KB page's base and end must land in the same AIPS slot.
        for region in MEMORY_MAP.iter().filter(|r| is_peripheral(r.base)) {
            if region.name == "SIM" {
                continue;
            }
            assert_eq!(
                slot_from_addr(region.base),
                slot_from_addr(region.end),
                "{} spans more than one slot",
                region.name
            );
        }
    }

    #[test]
    fn test_uart0_lookup() {
        let region = MEMORY_MAP.resolve(0x4006_A004).region().unwrap();
        assert_eq!(region.name, "UART0");
        assert_eq!(slot_from_addr(region.base), 0x06A);
    }

    #[test]
    fn test_unpopulated_slot_is_reserved() {
        // Slot 0x050 has no peripheral.
        assert_eq!(MEMORY_MAP.resolve(0x4005_0000), RegionMatch::Reserved);
    }

    #[test]
    fn test_alias_and_system_windows() {
        let alias = alias_from_bit(0x4006_A004, 7);
        assert_eq!(
            MEMORY_MAP.resolve(alias).region().unwrap().name,
            "AIPS bit-band alias"
        );
        assert_eq!(MEMORY_MAP.resolve(0xE000_ED28).region().unwrap().name, "PPB");
        assert_eq!(MEMORY_MAP.resolve(0xF000_0000), RegionMatch::Unlisted);
    }

    #[test]
    fn test_sysmpu_entry_matches_register_base() {
        let region = MEMORY_MAP.by_name("SYSMPU").unwrap();
        assert_eq!(region.base as usize, crate::config::MPU_BASE);
    }
}
