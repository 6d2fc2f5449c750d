//! Exception stack frame decoding.
//!
//! On exception entry the Cortex-M pushes eight words onto the stack that was
//! active when the exception hit, and sets `lr` to an EXC_RETURN value that
//! says which stack that was. If the stack pointer was not 8-byte aligned the
//! hardware first inserts a pad word and records the fact in bit 9 of the
//! stacked xPSR.
//!
//! ```text
//!  PSP + 0x20  [align]   ← only when xPSR[9] = 1
//!  PSP + 0x1C  xPSR
//!  PSP + 0x18  pc
//!  PSP + 0x14  lr
//!  PSP + 0x10  r12
//!  PSP + 0x0C  r3
//!  PSP + 0x08  r2
//!  PSP + 0x04  r1
//!  PSP + 0x00  r0
//! ```
//!
//! # Privilege gate
//!
//! Only frames stacked on the process stack (unprivileged thread code) are
//! decoded. When EXC_RETURN bit 2 is clear the frame lives on the main stack
//! and [`FrameDecode::decode`] returns [`FrameDecode::Privileged`] without
//! touching any stack memory.
//!
//! FPU extended frames are not decoded; only the basic eight words are read.

use core::fmt;

use heapless::Vec;

use crate::config::{
    EXC_FRAME_MAX_WORDS, EXC_FRAME_WORDS, EXC_FRAME_XPSR_INDEX, EXC_RETURN_PROCESS_STACK,
    XPSR_STACK_ALIGN,
};

/// Read access to the process stack at fault time.
///
/// On hardware this wraps `PSP` and volatile loads; in tests and in offline
/// decoding it is backed by captured words.
pub trait ProcessStack {
    /// Current process stack pointer.
    fn pointer(&self) -> u32;

    /// Word at `pointer() + 4 * index`.
    fn word(&self, index: usize) -> u32;
}

impl<T: ProcessStack + ?Sized> ProcessStack for &T {
    fn pointer(&self) -> u32 {
        (**self).pointer()
    }

    fn word(&self, index: usize) -> u32 {
        (**self).word(index)
    }
}

/// A process stack captured earlier: the PSP value and the words above it.
///
/// Words past the end of the capture read as zero.
#[derive(Debug, Clone, Copy)]
pub struct CapturedStack<'a> {
    pointer: u32,
    words: &'a [u32],
}

impl<'a> CapturedStack<'a> {
    /// Wrap a PSP value and the words starting at it.
    pub const fn new(pointer: u32, words: &'a [u32]) -> Self {
        Self { pointer, words }
    }
}

impl ProcessStack for CapturedStack<'_> {
    fn pointer(&self) -> u32 {
        self.pointer
    }

    fn word(&self, index: usize) -> u32 {
        self.words.get(index).copied().unwrap_or(0)
    }
}

/// The EXC_RETURN value found in `lr` on exception entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExcReturn(pub u32);

impl ExcReturn {
    /// Raw value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// `true` if the frame was pushed onto the process stack.
    pub const fn uses_process_stack(self) -> bool {
        self.0 & EXC_RETURN_PROCESS_STACK != 0
    }
}

/// Name of one word of the exception frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameRegister {
    /// Argument / scratch register r0.
    R0,
    /// r1
    R1,
    /// r2
    R2,
    /// r3
    R3,
    /// Intra-procedure scratch register.
    R12,
    /// Link register of the interrupted code.
    Lr,
    /// Return address (the faulting instruction for precise faults).
    Pc,
    /// Program status register.
    Xpsr,
    /// Stack-alignment pad word.
    Align,
}

impl FrameRegister {
    /// Frame words in stacking order; `ORDER[i]` sits at `PSP + 4 * i`.
    pub const ORDER: [Self; EXC_FRAME_MAX_WORDS] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R12,
        Self::Lr,
        Self::Pc,
        Self::Xpsr,
        Self::Align,
    ];

    /// Label used in the report.
    pub const fn name(self) -> &'static str {
        match self {
            Self::R0 => "r0",
            Self::R1 => "r1",
            Self::R2 => "r2",
            Self::R3 => "r3",
            Self::R12 => "r12",
            Self::Lr => "lr",
            Self::Pc => "pc",
            Self::Xpsr => "xPSR",
            Self::Align => "align",
        }
    }
}

impl fmt::Display for FrameRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded frame word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameEntry {
    /// Word index above the stack pointer.
    pub index: usize,
    /// Which register the word holds.
    pub register: FrameRegister,
    /// Stacked value.
    pub value: u32,
}

/// A decoded basic exception frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExceptionFrame {
    /// Process stack pointer the frame was read from.
    pub psp: u32,
    /// EXC_RETURN that selected the process stack.
    pub exc_return: ExcReturn,
    /// r0, r1, r2, r3, r12, lr, pc, xPSR.
    pub words: [u32; EXC_FRAME_WORDS],
    /// Alignment pad word, present when xPSR bit 9 is set.
    pub align: Option<u32>,
}

impl ExceptionFrame {
    /// Read the frame at the current process stack pointer.
    pub fn read<S: ProcessStack>(exc_return: ExcReturn, stack: &S) -> Self {
        let mut words = [0u32; EXC_FRAME_WORDS];
        for (index, word) in words.iter_mut().enumerate() {
            *word = stack.word(index);
        }
        let xpsr = words.get(EXC_FRAME_XPSR_INDEX).copied().unwrap_or(0);
        let align = (xpsr & XPSR_STACK_ALIGN != 0).then(|| stack.word(EXC_FRAME_WORDS));
        Self {
            psp: stack.pointer(),
            exc_return,
            words,
            align,
        }
    }

    /// Stacked link register of the interrupted code.
    pub fn lr(&self) -> u32 {
        self.get(FrameRegister::Lr)
    }

    /// Stacked program counter.
    pub fn pc(&self) -> u32 {
        self.get(FrameRegister::Pc)
    }

    /// Stacked xPSR.
    pub fn xpsr(&self) -> u32 {
        self.get(FrameRegister::Xpsr)
    }

    /// Value of `register`; `Align` reads 0 when no pad was stacked.
    pub fn get(&self, register: FrameRegister) -> u32 {
        match register {
            FrameRegister::Align => self.align.unwrap_or(0),
            other => FrameRegister::ORDER
                .iter()
                .position(|r| *r == other)
                .and_then(|index| self.words.get(index).copied())
                .unwrap_or(0),
        }
    }

    /// Number of words the hardware stacked (8, or 9 with the pad).
    pub fn word_count(&self) -> usize {
        if self.align.is_some() {
            EXC_FRAME_MAX_WORDS
        } else {
            EXC_FRAME_WORDS
        }
    }

    /// Frame words, highest address first: the pad (if any), xPSR, … r0.
    pub fn entries(&self) -> Vec<FrameEntry, EXC_FRAME_MAX_WORDS> {
        let mut entries = Vec::new();
        if let Some(value) = self.align {
            // Capacity is EXC_FRAME_MAX_WORDS; at most nine pushes happen.
            let _ = entries.push(FrameEntry {
                index: EXC_FRAME_WORDS,
                register: FrameRegister::Align,
                value,
            });
        }
        for (index, (register, value)) in FrameRegister::ORDER
            .iter()
            .zip(self.words.iter())
            .enumerate()
            .rev()
        {
            let _ = entries.push(FrameEntry {
                index,
                register: *register,
                value: *value,
            });
        }
        entries
    }
}

/// Result of running the frame decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameDecode {
    /// The fault came from privileged code on the main stack; not decoded.
    Privileged(ExcReturn),
    /// The fault came from unprivileged code; frame decoded from PSP.
    Unprivileged(ExceptionFrame),
}

impl FrameDecode {
    /// Apply the privilege gate, then read the frame from `stack` if allowed.
    ///
    /// `stack` is not touched at all for main-stack frames.
    pub fn decode<S: ProcessStack>(lr: u32, stack: &S) -> Self {
        let exc_return = ExcReturn(lr);
        if exc_return.uses_process_stack() {
            Self::Unprivileged(ExceptionFrame::read(exc_return, stack))
        } else {
            Self::Privileged(exc_return)
        }
    }

    /// The decoded frame, if the gate allowed decoding.
    pub fn frame(&self) -> Option<&ExceptionFrame> {
        match self {
            Self::Unprivileged(frame) => Some(frame),
            Self::Privileged(_) => None,
        }
    }
}
