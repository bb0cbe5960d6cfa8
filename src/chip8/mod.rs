//! The full implementation of the chip8 virtual machine core, from the
//! machine state to the execution of the decoded opcodes.
mod chipset;
mod opcodes;

/// reexport chipset structs and data for simpler usage
pub use chipset::*;
