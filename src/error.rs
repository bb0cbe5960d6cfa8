use thiserror::Error;

use crate::opcode::Opcode;

/// The umbrella error used during the processing of a single cycle.
///
/// The variants split into two tiers, the fatal ones after which the
/// emulation can not continue (stack discipline violations and addressing
/// faults) and the recoverable ones (an unrecognized sub-opcode) after
/// which the caller may log the diagnostic and keep stepping. The
/// classification is encoded in [`is_recoverable`](ProcessError::is_recoverable).
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ProcessError {
    #[error("Invalid opcode state '{0}'.")]
    Opcode(#[from] OpcodeError),
    #[error("Invalid stack state '{0}'.")]
    Stack(#[from] StackError),
    #[error("Invalid memory access '{0}'.")]
    Address(#[from] AddressError),
}

impl ProcessError {
    /// Checks if execution may continue after the given error.
    ///
    /// Only an unrecognized sub-opcode is recoverable, the program counter
    /// is left unmodified in that case so that the behavior stays
    /// deterministic and reproducible.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProcessError::Opcode(OpcodeError::InvalidOpcode(_)))
    }
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum OpcodeError {
    #[error("An unsupported opcode was used {0:#06X?}.")]
    InvalidOpcode(Opcode),
    #[error("Pointer location invalid there can not be an opcode at {pointer}, if data len is {len}")]
    MemoryInvalid { pointer: usize, len: usize },
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Full,
    #[error("Stack is empty!")]
    Empty,
}

/// Raised when an instruction dereferences memory outside of the
/// addressable range, instead of silently wrapping around.
#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum AddressError {
    #[error("Memory access at {address:#06X} of size {size} is out of bounds for memory of len {len}.")]
    OutOfBounds {
        address: usize,
        size: usize,
        len: usize,
    },
}

/// Raised while writing a program image into memory.
#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum LoadError {
    #[error("Program image of {len} bytes is larger than the max capacity of {capacity} bytes.")]
    Oversize { len: usize, capacity: usize },
}
