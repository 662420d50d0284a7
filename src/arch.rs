//! Architecture abstraction.
//!
//! This module defines the `Architecture` trait, which names the handful of
//! instruction encodings the padding scanner and patcher depend on. The core
//! stays generic while a backend decides what "filler", "return" and "no-op"
//! look like in machine code.

pub mod x86;

/// A trait representing a target instruction set (e.g., x86).
pub trait Architecture {
    /// Single-byte breakpoint instruction the toolchain uses as inter-function filler.
    fn trap_byte(&self) -> u8;

    /// Single-byte return instruction.
    fn return_byte(&self) -> u8;

    /// Single-byte no-operation instruction used to build the sled.
    fn nop_byte(&self) -> u8;

    /// Whether `byte` is the filler sentinel.
    fn is_trap(&self, byte: u8) -> bool {
        byte == self.trap_byte()
    }

    /// Whether `byte` ends a function with a plain return.
    fn is_return(&self, byte: u8) -> bool {
        byte == self.return_byte()
    }
}
