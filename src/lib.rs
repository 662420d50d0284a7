//! Padding smasher library.
//!
//! Rewrites the breakpoint filler between functions of a PE image as no-op
//! sleds, using the linker map file to find where functions start.
//! It is organized into several modules:
//! - `config`: CLI configuration.
//! - `arch`: Instruction encodings for the target architecture.
//! - `image`: PE header navigation and address translation.
//! - `mapfile`: Map file parsing.
//! - `symbol`: Symbol records.
//! - `padding`: Padding measurement and rewriting.
//! - `smasher`: The main orchestration.
//! - `loader` / `writer`: File input and output.
//! - `app`: A complete run, as driven by the binary.

pub mod app;
pub mod arch;
pub mod config;
pub mod error;
pub mod image;
pub mod loader;
pub mod mapfile;
pub mod padding;
pub mod smasher;
pub mod symbol;
pub mod writer;

#[cfg(test)]
mod testutil;
