//! K64F bus-fault reporter - Main Entry Point
//!
//! Hardware-only entry point for MK64FN1M0VLL12.

#![no_std]
#![no_main]

use cortex_m_rt::entry;

// Logging transport + panic handler
use defmt_rtt as _;
use panic_probe as _;

/// Flash configuration field (K64 RM §29.3.1), placed at 0x400 by memory.x.
///
/// Backdoor key and FPROT all erased; FSEC = 0xFE keeps the part unsecured,
/// FOPT = 0xFF keeps NMI and EzPort enabled.
#[link_section = ".flash_config"]
#[used]
static FLASH_CONFIG: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // backdoor key
    0xFF, 0xFF, 0xFF, 0xFF, // FPROT3..0
    0xFE, // FSEC
    0xFF, // FOPT
    0xFF, // FEPROT
    0xFF, // FDPROT
];

#[entry]
fn main() -> ! {
    defmt::info!("K64F bus-fault reporter v{=str}", env!("CARGO_PKG_VERSION"));

    // Take the core peripherals exactly once; the BusFault handler reads the
    // SCB through its fixed address and never needs ownership.
    let Some(mut core) = cortex_m::Peripherals::take() else {
        defmt::panic!("core peripherals already taken");
    };

    // See: firmware::boot::BOOT_SEQUENCE_STEPS for the ordered sequence.
    firmware::boot::hardware::init(&mut core.ICB, &mut core.SCB);
    defmt::info!("boot complete, waiting for faults");

    loop {
        cortex_m::asm::wfi();
    }
}
