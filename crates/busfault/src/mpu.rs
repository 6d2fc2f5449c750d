//! K64F system memory protection unit (SYSMPU) register view and snapshot.
//!
//! The SYSMPU sits between the crossbar masters and the slave ports. It holds
//! up to 16 region descriptors (the K64F implements 12) and, per slave port,
//! an error address / error detail register pair that latches the first
//! access violation seen on that port.
//!
//! # Register block (K64 RM §18.3)
//!
//! ```text
//! 0x000  CESR                    control / error status
//! 0x010  EAR0, EDR0              slave port 0 error address / detail
//! 0x018  EAR1, EDR1
//!  ...
//! 0x030  EAR4, EDR4              slave port 4
//! 0x400  RGD0_WORD0..WORD3       region descriptor 0 (start, end, perm, valid)
//!  ...
//! 0x4B0  RGD11_WORD0..WORD3
//! ```
//!
//! The fault decoder only ever reads these registers. The alternate access
//! control view at 0x800 (RGDAACn) mirrors WORD2 and is not captured.

use crate::config::{
    MPU_BASE, MPU_REGION_COUNT, MPU_REGION_SLOTS, MPU_SLAVE_PORT_COUNT, MPU_WORDS_PER_REGION,
};

/// Read access to the protection-unit registers.
///
/// Out-of-range `port` / `region` / `word` indices read as 0.
pub trait ProtectionUnit {
    /// Control/Error Status Register.
    fn cesr(&self) -> u32;

    /// Error Address Register of slave port `port`.
    fn ear(&self, port: usize) -> u32;

    /// Error Detail Register of slave port `port`.
    fn edr(&self, port: usize) -> u32;

    /// Word `word` (0 = start, 1 = end, 2 = permissions, 3 = valid) of
    /// region descriptor `region`.
    fn region_word(&self, region: usize, word: usize) -> u32;
}

impl<T: ProtectionUnit + ?Sized> ProtectionUnit for &T {
    fn cesr(&self) -> u32 {
        (**self).cesr()
    }

    fn ear(&self, port: usize) -> u32 {
        (**self).ear(port)
    }

    fn edr(&self, port: usize) -> u32 {
        (**self).edr(port)
    }

    fn region_word(&self, region: usize, word: usize) -> u32 {
        (**self).region_word(region, word)
    }
}

// ─── Memory-mapped view ──────────────────────────────────────────────────────

/// EAR/EDR pair of one slave port.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SlavePortRegisters {
    /// Error Address Register.
    pub ear: u32,
    /// Error Detail Register.
    pub edr: u32,
}

/// SYSMPU register layout, offsets per K64 RM §18.3.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SysMpuRegisterBlock {
    /// 0x000 Control/Error Status Register.
    pub cesr: u32,
    _reserved0: [u32; 3],
    /// 0x010 Slave port error registers.
    pub sp: [SlavePortRegisters; MPU_SLAVE_PORT_COUNT],
    _reserved1: [u32; 242],
    /// 0x400 Region descriptors, four words each.
    pub word: [[u32; MPU_WORDS_PER_REGION]; MPU_REGION_SLOTS],
}

impl SysMpuRegisterBlock {
    /// An all-zero block; useful as backing memory in host tests.
    pub const fn zeroed() -> Self {
        Self {
            cesr: 0,
            _reserved0: [0; 3],
            sp: [SlavePortRegisters { ear: 0, edr: 0 }; MPU_SLAVE_PORT_COUNT],
            _reserved1: [0; 242],
            word: [[0; MPU_WORDS_PER_REGION]; MPU_REGION_SLOTS],
        }
    }
}

/// Volatile, read-only view over a SYSMPU register block.
#[derive(Debug, Clone, Copy)]
pub struct SysMpu {
    regs: *const SysMpuRegisterBlock,
}

impl SysMpu {
    /// Address of the K64F SYSMPU.
    pub const PTR: *const SysMpuRegisterBlock = MPU_BASE as *const SysMpuRegisterBlock;

    /// View the block at `regs`.
    ///
    /// # Safety
    ///
    /// `regs` must point to a `SysMpuRegisterBlock` that stays readable for as
    /// long as the returned view is used.
    pub const unsafe fn from_ptr(regs: *const SysMpuRegisterBlock) -> Self {
        Self { regs }
    }

    /// View the K64F SYSMPU at [`MPU_BASE`].
    ///
    /// # Safety
    ///
    /// Only valid on a K64F target, where the SYSMPU is always mapped and its
    /// clock is always enabled.
    pub const unsafe fn k64f() -> Self {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_ptr(Self::PTR) }
    }

    /// Volatile read of one register.
    ///
    /// # Safety
    ///
    /// `field` must point at a readable, aligned word inside the block this
    /// view was constructed over.
    unsafe fn load(field: *const u32) -> u32 {
        // SAFETY: forwarded to the caller.
        unsafe { core::ptr::read_volatile(field) }
    }
}

impl ProtectionUnit for SysMpu {
    fn cesr(&self) -> u32 {
        // SAFETY: `self.regs` is a readable block (see `from_ptr`); addr_of!
        // does not create a reference.
        unsafe { Self::load(core::ptr::addr_of!((*self.regs).cesr)) }
    }

    fn ear(&self, port: usize) -> u32 {
        if port >= MPU_SLAVE_PORT_COUNT {
            return 0;
        }
        // SAFETY: `port` was bounds-checked against the `sp` array above.
        let pair = unsafe {
            core::ptr::addr_of!((*self.regs).sp)
                .cast::<SlavePortRegisters>()
                .add(port)
        };
        // SAFETY: `pair` points inside the block.
        unsafe { Self::load(core::ptr::addr_of!((*pair).ear)) }
    }

    fn edr(&self, port: usize) -> u32 {
        if port >= MPU_SLAVE_PORT_COUNT {
            return 0;
        }
        // SAFETY: `port` was bounds-checked against the `sp` array above.
        let pair = unsafe {
            core::ptr::addr_of!((*self.regs).sp)
                .cast::<SlavePortRegisters>()
                .add(port)
        };
        // SAFETY: `pair` points inside the block.
        unsafe { Self::load(core::ptr::addr_of!((*pair).edr)) }
    }

    fn region_word(&self, region: usize, word: usize) -> u32 {
        if region >= MPU_REGION_COUNT || word >= MPU_WORDS_PER_REGION {
            return 0;
        }
        #[allow(clippy::arithmetic_side_effects)] // both factors bounded above
        let offset = region * MPU_WORDS_PER_REGION + word;
        // SAFETY: `offset` < MPU_REGION_COUNT * MPU_WORDS_PER_REGION, inside
        // the `word` array.
        let field = unsafe {
            core::ptr::addr_of!((*self.regs).word)
                .cast::<u32>()
                .add(offset)
        };
        // SAFETY: `field` points inside the block.
        unsafe { Self::load(field) }
    }
}

// ─── Decoded register values ─────────────────────────────────────────────────

/// CESR: Control/Error Status Register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cesr(pub u32);

impl Cesr {
    /// Raw value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// VLD: the MPU is enabled.
    pub const fn enabled(self) -> bool {
        self.0 & 1 != 0
    }

    /// NRGD: number of region descriptors implemented (8, 12 or 16).
    pub const fn region_descriptors(self) -> u32 {
        match (self.0 >> 8) & 0xF {
            0 => 8,
            1 => 12,
            _ => 16,
        }
    }

    /// NSP: number of slave ports implemented.
    pub const fn slave_ports(self) -> u32 {
        (self.0 >> 12) & 0xF
    }

    /// HRL: hardware revision level.
    pub const fn revision(self) -> u32 {
        (self.0 >> 16) & 0xF
    }

    /// SPERR: slave port `port` has latched an error (bit 31 is port 0).
    pub const fn slave_port_error(self, port: usize) -> bool {
        if port >= MPU_SLAVE_PORT_COUNT {
            return false;
        }
        let mask = 0x8000_0000u32.wrapping_shr(port as u32);
        self.0 & mask != 0
    }
}

/// EDR: Error Detail Register of one slave port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorDetail(pub u32);

impl ErrorDetail {
    /// Raw value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// ERW: the faulting access was a write.
    pub const fn is_write(self) -> bool {
        self.0 & 1 != 0
    }

    /// EATTR: user/supervisor, instruction/data attributes of the access.
    pub const fn attributes(self) -> u32 {
        (self.0 >> 1) & 0x7
    }

    /// EMN: bus master number.
    pub const fn master(self) -> u32 {
        (self.0 >> 4) & 0xF
    }

    /// EPID: process identifier of the access.
    pub const fn process_id(self) -> u32 {
        (self.0 >> 8) & 0xFF
    }

    /// EACD: one bit per region descriptor that denied the access, bit 0 for
    /// RGD0. Zero means no descriptor matched the address at all.
    pub const fn access_control_detail(self) -> u32 {
        self.0 >> 16
    }
}

/// Error capture registers of one slave port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlavePortError {
    /// Faulting address.
    pub address: u32,
    /// Access details.
    pub detail: ErrorDetail,
}

/// The four raw words of one region descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegionDescriptor {
    /// WORD0..WORD3 as read.
    pub words: [u32; MPU_WORDS_PER_REGION],
}

impl RegionDescriptor {
    /// WORD0: start address field.
    pub fn start(&self) -> u32 {
        self.words.first().copied().unwrap_or(0)
    }

    /// WORD1: end address field.
    pub fn end(&self) -> u32 {
        self.words.get(1).copied().unwrap_or(0)
    }

    /// WORD3: valid flag and process-id match.
    pub fn valid_word(&self) -> u32 {
        self.words.get(3).copied().unwrap_or(0)
    }

    /// VLD bit of WORD3.
    pub fn is_valid(&self) -> bool {
        self.valid_word() & 1 != 0
    }

    /// Inclusive address range covered by this descriptor (32-byte granular).
    pub fn range(&self) -> (u32, u32) {
        (self.start() & !0x1F, self.end() | 0x1F)
    }
}

/// A copy of the protection-unit state taken at fault time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MpuSnapshot {
    /// Control/Error Status Register.
    pub cesr: Cesr,
    /// Error capture registers, one entry per slave port.
    pub ports: [SlavePortError; MPU_SLAVE_PORT_COUNT],
    /// Region descriptors 0..12.
    pub regions: [RegionDescriptor; MPU_REGION_COUNT],
}

impl MpuSnapshot {
    /// Read every register the report prints.
    pub fn capture<P: ProtectionUnit>(unit: &P) -> Self {
        let mut snapshot = Self {
            cesr: Cesr(unit.cesr()),
            ..Self::default()
        };
        for (port, entry) in snapshot.ports.iter_mut().enumerate() {
            *entry = SlavePortError {
                address: unit.ear(port),
                detail: ErrorDetail(unit.edr(port)),
            };
        }
        for (region, descriptor) in snapshot.regions.iter_mut().enumerate() {
            for (word, value) in descriptor.words.iter_mut().enumerate() {
                *value = unit.region_word(region, word);
            }
        }
        snapshot
    }

    /// Slave ports whose CESR error flag is set.
    pub fn faulting_ports(&self) -> impl Iterator<Item = (usize, &SlavePortError)> + '_ {
        self.ports
            .iter()
            .enumerate()
            .filter(|(port, _)| self.cesr.slave_port_error(*port))
    }
}

impl ProtectionUnit for MpuSnapshot {
    fn cesr(&self) -> u32 {
        self.cesr.bits()
    }

    fn ear(&self, port: usize) -> u32 {
        self.ports.get(port).map_or(0, |p| p.address)
    }

    fn edr(&self, port: usize) -> u32 {
        self.ports.get(port).map_or(0, |p| p.detail.bits())
    }

    fn region_word(&self, region: usize, word: usize) -> u32 {
        self.regions
            .get(region)
            .and_then(|r| r.words.get(word))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::large_stack_arrays
)]
mod tests {
    use super::*;
    use core::mem::offset_of;

    fn populated_block() -> Box<SysMpuRegisterBlock> {
        let mut block = Box::new(SysMpuRegisterBlock::zeroed());
        block.cesr = 0x8081_4101;
        for (i, sp) in block.sp.iter_mut().enumerate() {
            sp.ear = 0x4000_0000 + i as u32;
            sp.edr = 0x1000_0000 + i as u32;
        }
        for (r, words) in block.word.iter_mut().enumerate() {
            for (w, value) in words.iter_mut().enumerate() {
                *value = ((r as u32) << 8) | w as u32;
            }
        }
        block
    }

    #[test]
    fn test_register_block_offsets() {
        assert_eq!(offset_of!(SysMpuRegisterBlock, cesr), 0x000);
        assert_eq!(offset_of!(SysMpuRegisterBlock, sp), 0x010);
        assert_eq!(offset_of!(SysMpuRegisterBlock, word), 0x400);
        assert_eq!(core::mem::size_of::<SlavePortRegisters>(), 8);
        assert_eq!(core::mem::size_of::<SysMpuRegisterBlock>(), 0x500);
    }

    #[test]
    fn test_sysmpu_view_reads_block() {
        let block = populated_block();
        // SAFETY: `block` outlives `mpu` and is a valid register block.
        let mpu = unsafe { SysMpu::from_ptr(&*block) };

        assert_eq!(mpu.cesr(), 0x8081_4101);
        assert_eq!(mpu.ear(3), 0x4000_0003);
        assert_eq!(mpu.edr(4), 0x1000_0004);
        assert_eq!(mpu.region_word(11, 2), 0x0B02);
    }

    #[test]
    fn test_sysmpu_view_out_of_range_reads_zero() {
        let block = populated_block();
        // SAFETY: `block` outlives `mpu`.
        let mpu = unsafe { SysMpu::from_ptr(&*block) };

        assert_eq!(mpu.ear(5), 0);
        assert_eq!(mpu.edr(7), 0);
        // Slots 12..16 exist in the block but the K64F only implements 12.
        assert_eq!(mpu.region_word(12, 0), 0);
        assert_eq!(mpu.region_word(0, 4), 0);
    }

    #[test]
    fn test_capture_copies_every_register() {
        let block = populated_block();
        // SAFETY: `block` outlives `mpu`.
        let mpu = unsafe { SysMpu::from_ptr(&*block) };
        let snapshot = MpuSnapshot::capture(&mpu);

        assert_eq!(snapshot.cesr, Cesr(0x8081_4101));
        assert_eq!(snapshot.ports[2].address, 0x4000_0002);
        assert_eq!(snapshot.ports[2].detail, ErrorDetail(0x1000_0002));
        assert_eq!(snapshot.regions[5].words, [0x0500, 0x0501, 0x0502, 0x0503]);

        // Replaying the snapshot gives the same snapshot back.
        assert_eq!(MpuSnapshot::capture(&snapshot), snapshot);
    }

    #[test]
    fn test_cesr_fields() {
        // SPERR0 + SPERR4, HRL=1, NSP=5, NRGD=12, VLD
        let cesr = Cesr(0x8800_0000 | 0x0001_0000 | 0x0000_5000 | 0x0000_0100 | 1);
        assert!(cesr.enabled());
        assert_eq!(cesr.region_descriptors(), 12);
        assert_eq!(cesr.slave_ports(), 5);
        assert_eq!(cesr.revision(), 1);
        assert!(cesr.slave_port_error(0));
        assert!(!cesr.slave_port_error(1));
        assert!(cesr.slave_port_error(4));
        assert!(!cesr.slave_port_error(5));
    }

    #[test]
    fn test_faulting_ports() {
        let mut snapshot = MpuSnapshot {
            cesr: Cesr(1 << 30),
            ..MpuSnapshot::default()
        };
        snapshot.ports[1].address = 0x4006_A000;
        let faulting: Vec<usize> = snapshot.faulting_ports().map(|(p, _)| p).collect();
        assert_eq!(faulting, vec![1]);
    }

    #[test]
    fn test_error_detail_fields() {
        // EACD=RGD0|RGD2, EPID=0x2A, EMN=3, EATTR=0b010, ERW=1
        let edr = ErrorDetail((0b101 << 16) | (0x2A << 8) | (3 << 4) | (0b010 << 1) | 1);
        assert!(edr.is_write());
        assert_eq!(edr.attributes(), 0b010);
        assert_eq!(edr.master(), 3);
        assert_eq!(edr.process_id(), 0x2A);
        assert_eq!(edr.access_control_detail(), 0b101);
    }

    #[test]
    fn test_error_detail_access_control_covers_every_descriptor() {
        // Denied by RGD0 alone.
        assert_eq!(ErrorDetail(0x0001_0000).access_control_detail(), 0x1);
        // Denied by RGD11, the last descriptor the K64F implements.
        assert_eq!(ErrorDetail(0x0800_0000).access_control_detail(), 0x800);
        // No descriptor hit: EACD clear, low fields ignored.
        assert_eq!(ErrorDetail(0x0000_FFFF).access_control_detail(), 0);
    }

    #[test]
    fn test_region_descriptor_range() {
        let rgd = RegionDescriptor {
            words: [0x2000_0000, 0x2000_7FE0, 0x0061_F7DF, 0x0000_0001],
        };
        assert!(rgd.is_valid());
        assert_eq!(rgd.range(), (0x2000_0000, 0x2000_7FFF));
    }
}
