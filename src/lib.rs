pub mod chip8;
pub mod definitions;
pub mod devices;
pub mod opcode;
mod error;

// reexporting for convinience
pub use chip8::ChipSet;
pub use error::*;
