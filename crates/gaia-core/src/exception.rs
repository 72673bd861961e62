//! Fatal simulator exceptions.
//!
//! Every error that stops the simulation is an [`Exception`]. Translation
//! failures are a distinct variant carrying a [`TranslationFault`], so that
//! the top-level reporter can tell whether it is safe to translate the
//! program counter while printing the machine status.

use crate::loader::LoaderError;
use thiserror::Error;

/// Which decoder rejected the instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePhase {
    Alu,
    Fpu,
    Debug,
    Misc,
}

impl DecodePhase {
    fn suffix(&self) -> &'static str {
        match self {
            DecodePhase::Alu => " (ALU)",
            DecodePhase::Fpu => " (FPU)",
            DecodePhase::Debug => " (debug)",
            DecodePhase::Misc => "",
        }
    }
}

/// Memory access kind, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Load,
    Store,
    LoadByte,
    StoreByte,
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Access::Load => "load",
            Access::Store => "store",
            Access::LoadByte => "load_byte",
            Access::StoreByte => "store_byte",
        };
        f.write_str(name)
    }
}

/// Reason a virtual address failed to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TranslationFault {
    #[error("PDE address error: {addr:#010x}")]
    PdeAddress { addr: u32 },
    #[error("invalid PDE")]
    InvalidPde,
    #[error("PTE address error: {addr:#010x}")]
    PteAddress { addr: u32 },
    #[error("invalid PTE")]
    InvalidPte,
    #[error("invalid page color: physical address: {paddr:#010x}")]
    PageColor { paddr: u32 },
}

#[derive(Debug, Error)]
pub enum Exception {
    #[error("instruction decode error{}", .phase.suffix())]
    Decode { phase: DecodePhase },

    #[error("{access}: address must be a multiple of 4: {addr:#010x}")]
    MisalignedAccess { access: Access, addr: u32 },

    #[error("{access}: exceeded {}MB limit: {addr:#010x}", .mem_size >> 20)]
    OutOfRange {
        access: Access,
        addr: u32,
        mem_size: u32,
    },

    #[error("to_physical: {fault}, requested virtual address: {vaddr:#010x}")]
    Translation {
        fault: TranslationFault,
        vaddr: u32,
    },

    #[error("jr: register corrupted: r{reg}")]
    JumpUnaligned { reg: usize },

    #[error("jr: jump destination out of range: r{reg}")]
    JumpOutOfRange { reg: usize },

    #[error("program counter out of range")]
    PcOutOfRange,

    #[error("r0 is not zero")]
    RegisterZeroClobbered,

    #[error("serial_read: unexpected end of input")]
    SerialEof,

    #[error(transparent)]
    Loader(#[from] LoaderError),
}

impl Exception {
    /// True when the error came out of the address-translation path itself.
    /// The status reporter must not re-translate the PC in that case.
    pub fn is_translation_fault(&self) -> bool {
        matches!(self, Exception::Translation { .. })
    }
}
