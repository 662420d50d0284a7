//! x86 Architecture backend.
//!
//! Implements the `Architecture` trait for 32-bit and 64-bit x86. Both PE32 and
//! PE32+ images share the same one-byte encodings.

use super::Architecture;

/// `int3`
const INT3: u8 = 0xCC;
/// `ret` (near return, no immediate)
const RET: u8 = 0xC3;
/// `nop`
const NOP: u8 = 0x90;

/// The x86 architecture backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct X86;

impl Architecture for X86 {
    fn trap_byte(&self) -> u8 {
        INT3
    }

    fn return_byte(&self) -> u8 {
        RET
    }

    fn nop_byte(&self) -> u8 {
        NOP
    }
}
