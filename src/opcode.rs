//! Opcode abstractions, functionality and constants.
use std::convert::TryFrom;

use crate::{definitions::memory, OpcodeError};

/// the base mask used for generating all the other sub masks
pub(crate) const OPCODE_MASK_FFFF: u16 = u16::MAX;

/// the mask for the first twelve bits
pub(crate) const OPCODE_MASK_FFF0: u16 = OPCODE_MASK_FFFF << 4;

/// the mask for the first eight bits
pub(crate) const OPCODE_MASK_FF00: u16 = OPCODE_MASK_FFFF << 8;

/// the mask for the first four bits
pub(crate) const OPCODE_MASK_F000: u16 = OPCODE_MASK_FFFF << 12;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FFF0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FF00;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_F000;

/// the size of a single byte
const BYTE_SIZE: u16 = 0x8;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
///
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1`
/// make the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, OpcodeError> {
    // controlling that there is no illegal access here
    if pointer + 1 < data.len() {
        Ok(Opcode::from_be_bytes([data[pointer], data[pointer + 1]]))
    } else {
        Err(OpcodeError::MemoryInvalid {
            pointer,
            len: data.len(),
        })
    }
}

/// These are special traits used to filter out information
/// from opcodes
pub trait OpcodeTrait {
    /// this is an opcode extractor that will return the
    /// opcode number from any opcode
    /// - `T` is the opcode type
    fn t(&self) -> usize;

    /// this is an opcode extractor for the opcode type `TNNN`
    /// - `NNN` is an address
    fn nnn(&self) -> usize;

    /// this is an opcode extractor for the opcode type `TXNN`
    /// - `X` is a register index
    /// - `NN` is a constant
    fn xnn(&self) -> (usize, u8);

    /// this is an opcode extractor for the opcode type `TXYN`
    /// - `X` is a register index
    /// - `Y` is a register index
    /// - `N` is an opcode subtype
    fn xyn(&self) -> (usize, usize, usize);

    /// this is an opcode extractor for the opcode type `TXYT`
    /// - `X` is a register index
    /// - `Y` is a register index
    fn xy(&self) -> (usize, usize);

    /// this is an opcode extractor for the opcode type `TXTT`
    /// - `X` is a register index
    fn x(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.t(), 0x1000);
    /// ```
    fn t(&self) -> usize {
        (self & OPCODE_MASK_F000) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.nnn(), 0xEDA)
    /// ```
    fn nnn(&self) -> usize {
        (self & OPCODE_MASK_0FFF) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xnn(), (0xE, 0xDA));
    /// ```
    fn xnn(&self) -> (usize, u8) {
        let x = self.x();
        let nn = (self & OPCODE_MASK_00FF) as u8;
        (x, nn)
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.xyn(), (0xE, 0xD, 0xA));
    /// ```
    fn xyn(&self) -> (usize, usize, usize) {
        let (x, y) = self.xy();
        let n = (self & OPCODE_MASK_000F) as usize;
        (x, y, n)
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.xy(), (0xE, 0xD));
    /// ```
    fn xy(&self) -> (usize, usize) {
        let x = self.x();
        const MASK: u16 = OPCODE_MASK_00FF ^ OPCODE_MASK_000F;
        const NIBBLE: u16 = BYTE_SIZE / 2;
        let y = ((self & MASK) >> NIBBLE) as usize;
        (x, y)
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.x(), 0xE);
    /// ```
    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0FFF & OPCODE_MASK_FF00) >> BYTE_SIZE) as usize
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents the program counter steps that the chip
/// can take.
pub enum ProgramCounterStep {
    /// Will not change the program counter
    None,
    /// Will increment the program counter by a single opcode
    Next,
    /// Will increment the program counter by two opcodes
    Skip,
    /// Will simply move the program counter to the given location.
    Jump(usize),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// Maps the [`ProgramCounterStep`](ProgramCounterStep) to the corresponding movement distance.
    #[inline]
    pub fn step(&self) -> usize {
        match *self {
            ProgramCounterStep::Next => memory::opcodes::SIZE,
            ProgramCounterStep::Skip => 2 * memory::opcodes::SIZE,
            ProgramCounterStep::None => 0,
            ProgramCounterStep::Jump(pointer) => pointer,
        }
    }
}

/// Represents a step of the program counter
/// this requires the enum ProgramCounterStep
/// to work.
pub trait ProgramCounter {
    /// will move the program counter forward by a step.
    fn step(&mut self, step: ProgramCounterStep);
}

/// The register to register ALU operations of the `8XYN` opcode family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    /// `8XY0` - Sets VX to the value of VY.
    Copy,
    /// `8XY1` - Sets VX to VX or VY. (Bitwise OR operation)
    Or,
    /// `8XY2` - Sets VX to VX and VY. (Bitwise AND operation)
    And,
    /// `8XY3` - Sets VX to VX xor VY.
    Xor,
    /// `8XY4` - Adds VY to VX. VF is set to 1 when there's a carry, and to
    /// 0 when there isn't.
    Add,
    /// `8XY5` - VY is subtracted from VX. VF is set to 0 when there's a
    /// borrow, and 1 when there isn't.
    Sub,
    /// `8XY6` - Stores the least significant bit of VY in VF and then
    /// writes VY shifted to the right by 1 into VX.
    ShiftRight,
    /// `8XY7` - Sets VX to VY minus VX. VF is set to 0 when there's a
    /// borrow, and 1 when there isn't.
    SubReverse,
    /// `8XYE` - Stores the most significant bit of VY in VF and then
    /// writes VY shifted to the left by 1 into VX.
    ShiftLeft,
}

/// A fully decoded instruction of the chip8 instruction set.
///
/// Decoding happens in one place through the [`TryFrom<Opcode>`](TryFrom)
/// implementation, so that an unrecognized sub-opcode is a single well
/// defined error path instead of one per dispatch group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0` - Clears the screen.
    ClearDisplay,
    /// `00EE` - Returns from a subroutine.
    Return,
    /// `1NNN` - Jumps to address `NNN`.
    Jump { nnn: usize },
    /// `2NNN` - Calls subroutine at `NNN`.
    Call { nnn: usize },
    /// `3XNN` - Skips the next instruction if `VX` equals `NN`.
    SkipEqImm { x: usize, nn: u8 },
    /// `4XNN` - Skips the next instruction if `VX` doesn't equal `NN`.
    SkipNeImm { x: usize, nn: u8 },
    /// `5XY0` - Skips the next instruction if `VX` equals `VY`.
    SkipEqReg { x: usize, y: usize },
    /// `6XNN` - Sets `VX` to `NN`.
    LoadImm { x: usize, nn: u8 },
    /// `7XNN` - Adds `NN` to `VX`. (Carry flag is not changed)
    AddImm { x: usize, nn: u8 },
    /// `8XYN` - Register to register ALU operation.
    Alu { op: AluOp, x: usize, y: usize },
    /// `9XY0` - Skips the next instruction if `VX` doesn't equal `VY`.
    SkipNeReg { x: usize, y: usize },
    /// `ANNN` - Sets `I` to the address `NNN`.
    LoadIndex { nnn: usize },
    /// `BNNN` - Jumps to the address `NNN` plus `V0`.
    JumpOffset { nnn: usize },
    /// `CXNN` - Sets `VX` to the result of a bitwise and operation on a
    /// random number and `NN`.
    Random { x: usize, nn: u8 },
    /// `DXYN` - Draws a sprite at coordinate `(VY, VX)` that has a width of
    /// 8 pixels and a height of `N` pixels.
    Draw { x: usize, y: usize, n: usize },
    /// `EX9E` - Skips the next instruction if the key stored in `VX` is
    /// pressed.
    SkipKeyPressed { x: usize },
    /// `EXA1` - Skips the next instruction if the key stored in `VX` isn't
    /// pressed.
    SkipKeyNotPressed { x: usize },
    /// `FX07` - Sets `VX` to the value of the delay timer.
    ReadDelay { x: usize },
    /// `FX0A` - A key press is awaited, and then stored in `VX`. (Blocking
    /// Operation. All instruction halted until next key event)
    WaitKey { x: usize },
    /// `FX15` - Sets the delay timer to `VX`.
    SetDelay { x: usize },
    /// `FX18` - Sets the sound timer to `VX`.
    SetSound { x: usize },
    /// `FX1E` - Adds `VX` to `I`. `VF` is not affected.
    AddIndex { x: usize },
    /// `FX29` - Sets `I` to the location of the sprite for the character
    /// in `VX`. Characters 0-F (in hexadecimal) are represented by a 4x5
    /// font.
    FontSprite { x: usize },
    /// `FX33` - Stores the binary-coded decimal representation of `VX`,
    /// with the hundreds digit at the address in `I`, the tens digit at
    /// `I` plus 1, and the ones digit at `I` plus 2.
    StoreBcd { x: usize },
    /// `FX55` - Stores `V0` to `VX` (including `VX`) in memory starting at
    /// address `I`. `I` itself is left unmodified.
    StoreRegisters { x: usize },
    /// `FX65` - Fills `V0` to `VX` (including `VX`) with values from
    /// memory starting at address `I`. `I` itself is left unmodified.
    LoadRegisters { x: usize },
}

impl TryFrom<Opcode> for Instruction {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        // shifting t here so that match can use a lookup table instead of
        // 'if else' - blocks
        const SHIFT: usize = 4 * 3;
        let invalid = || OpcodeError::InvalidOpcode(value);

        let res = match value.t() >> SHIFT {
            0x0 => match value {
                0x00E0 => Instruction::ClearDisplay,
                0x00EE => Instruction::Return,
                _ => return Err(invalid()),
            },
            0x1 => Instruction::Jump { nnn: value.nnn() },
            0x2 => Instruction::Call { nnn: value.nnn() },
            0x3 => {
                let (x, nn) = value.xnn();
                Instruction::SkipEqImm { x, nn }
            }
            0x4 => {
                let (x, nn) = value.xnn();
                Instruction::SkipNeImm { x, nn }
            }
            0x5 => match value.xyn() {
                (x, y, 0) => Instruction::SkipEqReg { x, y },
                _ => return Err(invalid()),
            },
            0x6 => {
                let (x, nn) = value.xnn();
                Instruction::LoadImm { x, nn }
            }
            0x7 => {
                let (x, nn) = value.xnn();
                Instruction::AddImm { x, nn }
            }
            0x8 => {
                let (x, y, n) = value.xyn();
                let op = match n {
                    0x0 => AluOp::Copy,
                    0x1 => AluOp::Or,
                    0x2 => AluOp::And,
                    0x3 => AluOp::Xor,
                    0x4 => AluOp::Add,
                    0x5 => AluOp::Sub,
                    0x6 => AluOp::ShiftRight,
                    0x7 => AluOp::SubReverse,
                    0xE => AluOp::ShiftLeft,
                    _ => return Err(invalid()),
                };
                Instruction::Alu { op, x, y }
            }
            0x9 => match value.xyn() {
                (x, y, 0) => Instruction::SkipNeReg { x, y },
                _ => return Err(invalid()),
            },
            0xA => Instruction::LoadIndex { nnn: value.nnn() },
            0xB => Instruction::JumpOffset { nnn: value.nnn() },
            0xC => {
                let (x, nn) = value.xnn();
                Instruction::Random { x, nn }
            }
            0xD => {
                let (x, y, n) = value.xyn();
                Instruction::Draw { x, y, n }
            }
            0xE => {
                let (x, nn) = value.xnn();
                match nn {
                    0x9E => Instruction::SkipKeyPressed { x },
                    0xA1 => Instruction::SkipKeyNotPressed { x },
                    _ => return Err(invalid()),
                }
            }
            0xF => {
                let (x, nn) = value.xnn();
                match nn {
                    0x07 => Instruction::ReadDelay { x },
                    0x0A => Instruction::WaitKey { x },
                    0x15 => Instruction::SetDelay { x },
                    0x18 => Instruction::SetSound { x },
                    0x1E => Instruction::AddIndex { x },
                    0x29 => Instruction::FontSprite { x },
                    0x33 => Instruction::StoreBcd { x },
                    0x55 => Instruction::StoreRegisters { x },
                    0x65 => Instruction::LoadRegisters { x },
                    _ => return Err(invalid()),
                }
            }
            _ => unreachable!("a nibble can not be larger than 0xF"),
        };
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use super::*;

    #[test]
    fn test_tryfrom_opcode_simple() {
        let value = 0x00E0;
        let res = Ok(Instruction::ClearDisplay);
        let conv = value.try_into();
        assert_eq!(conv, res);
    }

    #[test]
    fn test_tryfrom_opcode_simple_fail() {
        let value: Opcode = 0x00E1;
        let conv: Result<Instruction, _> = value.try_into();
        assert!(conv.is_err());
    }

    #[test]
    fn test_tryfrom_opcode_multiple() {
        let tests = [
            // Zero
            (0x00E0, Ok(Instruction::ClearDisplay)),
            (0x00EE, Ok(Instruction::Return)),
            (0x00E1, Err("")),
            // One
            (0x1919, Ok(Instruction::Jump { nnn: 0x919 })),
            // Two
            (0x2222, Ok(Instruction::Call { nnn: 0x222 })),
            // Three
            (0x3123, Ok(Instruction::SkipEqImm { x: 0x1, nn: 0x23 })),
            // Four
            (0x4123, Ok(Instruction::SkipNeImm { x: 0x1, nn: 0x23 })),
            // Five
            (0x5120, Ok(Instruction::SkipEqReg { x: 0x1, y: 0x2 })),
            (0x5121, Err("")),
            // Six
            (0x6123, Ok(Instruction::LoadImm { x: 0x1, nn: 0x23 })),
            // Seven
            (0x7123, Ok(Instruction::AddImm { x: 0x1, nn: 0x23 })),
            // Eight
            (
                0x8120,
                Ok(Instruction::Alu {
                    op: AluOp::Copy,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8121,
                Ok(Instruction::Alu {
                    op: AluOp::Or,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8122,
                Ok(Instruction::Alu {
                    op: AluOp::And,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8123,
                Ok(Instruction::Alu {
                    op: AluOp::Xor,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8124,
                Ok(Instruction::Alu {
                    op: AluOp::Add,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8125,
                Ok(Instruction::Alu {
                    op: AluOp::Sub,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8126,
                Ok(Instruction::Alu {
                    op: AluOp::ShiftRight,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8127,
                Ok(Instruction::Alu {
                    op: AluOp::SubReverse,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x812E,
                Ok(Instruction::Alu {
                    op: AluOp::ShiftLeft,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (0x8128, Err("")),
            // Nine
            (0x9120, Ok(Instruction::SkipNeReg { x: 0x1, y: 0x2 })),
            (0x9121, Err("")),
            // A
            (0xA222, Ok(Instruction::LoadIndex { nnn: 0x222 })),
            // B
            (0xB222, Ok(Instruction::JumpOffset { nnn: 0x222 })),
            // C
            (0xC123, Ok(Instruction::Random { x: 0x1, nn: 0x23 })),
            // D
            (
                0xD123,
                Ok(Instruction::Draw {
                    x: 0x1,
                    y: 0x2,
                    n: 0x3,
                }),
            ),
            // E
            (0xE19E, Ok(Instruction::SkipKeyPressed { x: 0x1 })),
            (0xE1A1, Ok(Instruction::SkipKeyNotPressed { x: 0x1 })),
            (0xE111, Err("")),
            // F
            (0xF007, Ok(Instruction::ReadDelay { x: 0x0 })),
            (0xF00A, Ok(Instruction::WaitKey { x: 0x0 })),
            (0xF015, Ok(Instruction::SetDelay { x: 0x0 })),
            (0xF018, Ok(Instruction::SetSound { x: 0x0 })),
            (0xF01E, Ok(Instruction::AddIndex { x: 0x0 })),
            (0xF029, Ok(Instruction::FontSprite { x: 0x0 })),
            (0xF033, Ok(Instruction::StoreBcd { x: 0x0 })),
            (0xF055, Ok(Instruction::StoreRegisters { x: 0x0 })),
            (0xF065, Ok(Instruction::LoadRegisters { x: 0x0 })),
            (0xF0AA, Err("")),
        ];
        for (value, res) in tests.iter().copied() {
            let conv: Result<Instruction, _> = value.try_into();
            assert_eq!(conv, res.map_err(|_| OpcodeError::InvalidOpcode(value)));
        }
    }
}
