//! Address windows and register geometry for the K64F fault decoder.
//!
//! All values are compile-time constants. Nothing in this module touches
//! hardware; it only names the numbers the rest of the crate relies on.
//!
//! # Sources
//!
//! - NXP K64 Sub-Family Reference Manual (K64P144M120SF5RM) §4.6 "System
//!   memory map", §4.7 "Peripheral bridge (AIPS-Lite 0/1) memory map"
//! - K64 RM §18 "Memory Protection Unit (MPU)": register offsets
//! - ARMv7-M ARM (DDI0403E) §B1.5.6 "Exception entry behavior": frame layout,
//!   §B1.5.8 "Exception return behavior": EXC_RETURN encoding

// ---------------------------------------------------------------------------
// Address windows
// ---------------------------------------------------------------------------

/// First byte of the bit-bandable peripheral window (AIPS-0 base).
pub const PERIPH_START: u32 = 0x4000_0000;

/// Last byte of the bit-bandable peripheral window (end of AIPS-1 / GPIO).
pub const PERIPH_END: u32 = 0x400F_FFFF;

/// First byte of the peripheral bit-band alias window.
///
/// Each word in `[BITBAND_START, BITBAND_END]` aliases one bit of the
/// peripheral window: 32 alias bytes per underlying byte.
pub const BITBAND_START: u32 = 0x4200_0000;

/// Last byte of the peripheral bit-band alias window.
pub const BITBAND_END: u32 = 0x43FF_FFFF;

/// Mask isolating the 12-bit AIPS slot field of a peripheral address.
pub const AIPS_SLOT_MASK: u32 = 0x00FF_F000;

/// Shift that brings the AIPS slot field down to bit 0.
pub const AIPS_SLOT_SHIFT: u32 = 12;

// ---------------------------------------------------------------------------
// Exception entry
// ---------------------------------------------------------------------------

/// EXC_RETURN bit 2: `1` = the frame was stacked on the process stack (PSP).
pub const EXC_RETURN_PROCESS_STACK: u32 = 1 << 2;

/// xPSR bit 9: `1` = the hardware inserted a pad word to 8-byte align the frame.
pub const XPSR_STACK_ALIGN: u32 = 1 << 9;

/// Number of words in the basic (non-FPU) exception frame.
pub const EXC_FRAME_WORDS: usize = 8;

/// Basic frame plus the optional alignment pad.
pub const EXC_FRAME_MAX_WORDS: usize = EXC_FRAME_WORDS + 1;

/// Word index of the stacked xPSR within the basic frame.
pub const EXC_FRAME_XPSR_INDEX: usize = 7;

// ---------------------------------------------------------------------------
// SYSMPU
// ---------------------------------------------------------------------------

/// SYSMPU register block base address.
pub const MPU_BASE: usize = 0x4000_D000;

/// Region descriptors implemented on the K64F SYSMPU.
pub const MPU_REGION_COUNT: usize = 12;

/// Slave ports with an EAR/EDR error-capture pair.
pub const MPU_SLAVE_PORT_COUNT: usize = 5;

/// Configuration words per region descriptor (start, end, permissions, valid).
pub const MPU_WORDS_PER_REGION: usize = 4;

/// Hardware region-descriptor slots in the register block (the K64F populates 12).
pub const MPU_REGION_SLOTS: usize = 16;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Longest line the report produces, in bytes.
///
/// The MPU EAR/EDR rows are the widest at 62 characters; sinks that buffer a
/// line at a time size their buffer from this.
pub const REPORT_LINE_CAPACITY: usize = 96;

/// Title printed in the report banner.
pub const REPORT_TITLE: &str = "BUS FAULT";
