use crate::{
    definitions::{cpu, display, keyboard, memory},
    devices::{DisplayCommands, InputCommands, KeyInput},
    opcode::{AluOp, Instruction, ProgramCounterStep},
    ProcessError,
};

use super::ChipSet;

impl<D, I> ChipSet<D, I>
where
    D: DisplayCommands,
    I: InputCommands,
{
    /// Will execute a single decoded instruction and return the program
    /// counter movement it produced.
    ///
    /// Every instruction is a total function over the machine state except
    /// for the stack discipline violations, addressing faults and the
    /// blocking branch of the key wait.
    pub(super) fn execute(
        &mut self,
        instruction: Instruction,
    ) -> Result<ProgramCounterStep, ProcessError> {
        let step = match instruction {
            Instruction::ClearDisplay => {
                // 00E0
                // clear display
                self.display.clear();
                self.draw_requested = true;
                ProgramCounterStep::Next
            }
            Instruction::Return => {
                // 00EE
                // Return from sub routine => pop from stack
                let pointer = self.pop_stack()?;
                ProgramCounterStep::Jump(pointer)
            }
            Instruction::Jump { nnn } => {
                // 1NNN
                // Jumps to address NNN.
                ProgramCounterStep::Jump(nnn)
            }
            Instruction::Call { nnn } => {
                // 2NNN
                // Calls subroutine at NNN and pushes the return address,
                // which is the opcode after the call
                self.push_stack(self.program_counter + ProgramCounterStep::Next.step())?;
                ProgramCounterStep::Jump(nnn)
            }
            Instruction::SkipEqImm { x, nn } => {
                // 3XNN
                // Skips the next instruction if VX equals NN.
                ProgramCounterStep::cond(self.registers[x] == nn)
            }
            Instruction::SkipNeImm { x, nn } => {
                // 4XNN
                // Skips the next instruction if VX doesn't equal NN.
                ProgramCounterStep::cond(self.registers[x] != nn)
            }
            Instruction::SkipEqReg { x, y } => {
                // 5XY0
                // Skips the next instruction if VX equals VY.
                ProgramCounterStep::cond(self.registers[x] == self.registers[y])
            }
            Instruction::LoadImm { x, nn } => {
                // 6XNN
                // Sets VX to NN.
                self.registers[x] = nn;
                ProgramCounterStep::Next
            }
            Instruction::AddImm { x, nn } => {
                // 7XNN
                // Adds NN to VX. (Carry flag is not changed)
                self.registers[x] = self.registers[x].wrapping_add(nn);
                ProgramCounterStep::Next
            }
            Instruction::Alu { op, x, y } => {
                self.alu(op, x, y);
                ProgramCounterStep::Next
            }
            Instruction::SkipNeReg { x, y } => {
                // 9XY0
                // Skips the next instruction if VX doesn't equal VY.
                ProgramCounterStep::cond(self.registers[x] != self.registers[y])
            }
            Instruction::LoadIndex { nnn } => {
                // ANNN
                // Sets I to the address NNN.
                self.index_register = nnn;
                ProgramCounterStep::Next
            }
            Instruction::JumpOffset { nnn } => {
                // BNNN
                // Jumps to the address NNN plus V0. The target has to hold
                // a fetchable opcode, anything past that is a fault.
                let pointer = self.registers[0] as usize + nnn;
                self.check_mem_range(pointer, memory::opcodes::SIZE)?;
                ProgramCounterStep::Jump(pointer)
            }
            Instruction::Random { x, nn } => {
                // CXNN
                // Sets VX to the result of a bitwise and operation on a
                // random number and NN.
                // using a fill bytes call here, as the trait RngCore does
                // not support random u8.
                let mut rand: [u8; 1] = [0];
                self.rng.fill_bytes(&mut rand);
                self.registers[x] = nn & rand[0];
                ProgramCounterStep::Next
            }
            Instruction::Draw { x, y, n } => self.draw_sprite(x, y, n)?,
            Instruction::SkipKeyPressed { x } => {
                // EX9E
                // Skips the next instruction if the key stored in VX is
                // pressed, consuming the key latch when it was set.
                let key = (self.registers[x] & 0x0F) as usize;
                let pressed = self.keyboard.is_pressed(key);
                if pressed {
                    self.keyboard.consume(key);
                }
                ProgramCounterStep::cond(pressed)
            }
            Instruction::SkipKeyNotPressed { x } => {
                // EXA1
                // Skips the next instruction if the key stored in VX isn't
                // pressed, a set latch is consumed without skipping.
                let key = (self.registers[x] & 0x0F) as usize;
                let pressed = self.keyboard.is_pressed(key);
                if pressed {
                    self.keyboard.consume(key);
                }
                ProgramCounterStep::cond(!pressed)
            }
            Instruction::ReadDelay { x } => {
                // FX07
                // Sets VX to the value of the delay timer.
                self.registers[x] = self.delay_timer;
                ProgramCounterStep::Next
            }
            Instruction::WaitKey { x } => return self.wait_key(x),
            Instruction::SetDelay { x } => {
                // FX15
                // Sets the delay timer to VX.
                self.delay_timer = self.registers[x];
                ProgramCounterStep::Next
            }
            Instruction::SetSound { x } => {
                // FX18
                // Sets the sound timer to VX.
                self.sound_timer = self.registers[x];
                ProgramCounterStep::Next
            }
            Instruction::AddIndex { x } => {
                // FX1E
                // Adds VX to I. VF is not affected.
                let xi = self.registers[x] as usize;
                self.index_register = self.index_register.wrapping_add(xi);
                ProgramCounterStep::Next
            }
            Instruction::FontSprite { x } => {
                // FX29
                // Sets I to the location of the sprite for the character in
                // VX. The register content is masked to its low nibble, the
                // font table only supports hex digits.
                let val = self.registers[x] as usize;
                let digit = val & 0x0F;
                if val != digit {
                    log::warn!(
                        "font sprite lookup for non hex value {:#04X}, using the low nibble",
                        val
                    );
                }
                self.index_register =
                    display::fontset::LOCATION + display::fontset::GLYPH_SIZE * digit;
                ProgramCounterStep::Next
            }
            Instruction::StoreBcd { x } => {
                // FX33
                // Stores the binary-coded decimal representation of VX, with
                // the hundreds digit at the address in I, the tens digit at
                // I plus 1, and the ones digit at I plus 2.
                let i = self.index_register;
                self.check_mem_range(i, 3)?;
                let r = self.registers[x];

                self.memory[i] = r / 100; // 246u8 / 100 => 2
                self.memory[i + 1] = r / 10 % 10; // 246u8 / 10 => 24 % 10 => 4
                self.memory[i + 2] = r % 10; // 246u8 % 10 => 6
                ProgramCounterStep::Next
            }
            Instruction::StoreRegisters { x } => {
                // FX55
                // Stores V0 to VX (including VX) in memory starting at
                // address I. I itself is left unmodified.
                let index = self.index_register;
                self.check_mem_range(index, x + 1)?;
                self.memory[index..=(index + x)].copy_from_slice(&self.registers[..=x]);
                ProgramCounterStep::Next
            }
            Instruction::LoadRegisters { x } => {
                // FX65
                // Fills V0 to VX (including VX) with values from memory
                // starting at address I. I itself is left unmodified.
                let index = self.index_register;
                self.check_mem_range(index, x + 1)?;
                self.registers[..=x].copy_from_slice(&self.memory[index..=(index + x)]);
                ProgramCounterStep::Next
            }
        };
        Ok(step)
    }

    /// The register to register operations of the `8XYN` opcode family.
    fn alu(&mut self, op: AluOp, x: usize, y: usize) {
        match op {
            AluOp::Copy => {
                // 8XY0
                // Sets VX to the value of VY.
                self.registers[x] = self.registers[y];
            }
            AluOp::Or => {
                // 8XY1
                // Sets VX to VX or VY. (Bitwise OR operation)
                self.registers[x] |= self.registers[y];
            }
            AluOp::And => {
                // 8XY2
                // Sets VX to VX and VY. (Bitwise AND operation)
                self.registers[x] &= self.registers[y];
            }
            AluOp::Xor => {
                // 8XY3
                // Sets VX to VX xor VY.
                self.registers[x] ^= self.registers[y];
            }
            AluOp::Add => {
                // 8XY4
                // Adds VY to VX. VF is set to 1 when there's a carry, and to
                // 0 when there isn't.
                let (res, carry) = self.registers[x].overflowing_add(self.registers[y]);
                self.registers[x] = res;
                self.registers[cpu::register::LAST] = carry as u8;
            }
            AluOp::Sub => {
                // 8XY5
                // VY is subtracted from VX. VF is set to 0 when there's a
                // borrow, and 1 when there isn't.
                let no_borrow = self.registers[x] >= self.registers[y];
                self.registers[x] = self.registers[x].wrapping_sub(self.registers[y]);
                self.registers[cpu::register::LAST] = no_borrow as u8;
            }
            AluOp::ShiftRight => {
                // 8XY6
                // Stores the least significant bit of VY in VF and then
                // writes VY shifted to the right by 1 into VX. This is the
                // cross register form, the legacy shift-in-place on VX
                // variant is intentionally not implemented.
                let source = self.registers[y];
                self.registers[cpu::register::LAST] = source & 1;
                self.registers[x] = source >> 1;
            }
            AluOp::SubReverse => {
                // 8XY7
                // Sets VX to VY minus VX. VF is set to 0 when there's a
                // borrow, and 1 when there isn't.
                let no_borrow = self.registers[y] >= self.registers[x];
                self.registers[x] = self.registers[y].wrapping_sub(self.registers[x]);
                self.registers[cpu::register::LAST] = no_borrow as u8;
            }
            AluOp::ShiftLeft => {
                // 8XYE
                // Stores the most significant bit of VY in VF and then
                // writes VY shifted to the left by 1 into VX. Mirror of the
                // right shift, same cross register form.
                const SHIFT_SIGNIFICANT: u8 = 7;
                const AND_SIGNIFICANT: u8 = 1 << SHIFT_SIGNIFICANT;
                let source = self.registers[y];
                self.registers[cpu::register::LAST] =
                    (source & AND_SIGNIFICANT) >> SHIFT_SIGNIFICANT;
                self.registers[x] = source << 1;
            }
        }
    }

    /// `DXYN` - Draws a sprite of N rows read from memory at I at
    /// coordinate (VY, VX). Every set bit requests a pixel toggle from the
    /// display collaborator, both axes wrap per pixel. VF is set to 1 if
    /// any toggle turned a lit pixel off.
    fn draw_sprite(
        &mut self,
        x: usize,
        y: usize,
        n: usize,
    ) -> Result<ProgramCounterStep, ProcessError> {
        let index = self.index_register;
        self.check_mem_range(index, n)?;

        let row_base = self.registers[y] as usize % display::HEIGHT;
        let col_base = self.registers[x] as usize % display::WIDTH;

        // Set VF to 0
        self.registers[cpu::register::LAST] = 0;

        const BYTE: usize = 8;

        // Get one byte of sprite data from the memory address in the I
        // register, a sprite of zero rows is legal and draws nothing.
        for r in 0..n {
            let bits = self.memory[index + r];
            if bits == 0x00 {
                // no pixels to draw, can skip
                continue;
            }

            let row = (row_base + r) % display::HEIGHT;

            // check bits from left to right (high to low)
            for c in 0..BYTE {
                let mask = 1 << (BYTE - 1 - c);
                if bits & mask != mask {
                    continue;
                }

                let col = (col_base + c) % display::WIDTH;

                // - If the current pixel in the sprite row is 'on' and the
                //   pixel on the screen is also 'on', the toggle turns it
                //   'off' and VF is set to '1'.
                // - Or if the screen pixel is 'off', the toggle draws it.
                let was_lit = self.display.toggle_pixel(row, col);
                if was_lit {
                    self.registers[cpu::register::LAST] = 1;
                }
            }
        }

        self.draw_requested = true;
        Ok(ProgramCounterStep::Next)
    }

    /// `FX0A` - The blocking key wait, the single suspension point of the
    /// chip.
    ///
    /// A buffered key down event is consumed immediately without blocking.
    /// Only with an empty queue does the chip block on the input
    /// collaborator; a quit interrupt raises the halt request and leaves
    /// VX unspecified, the driver has to check the halt signal before
    /// trusting the register.
    fn wait_key(&mut self, x: usize) -> Result<ProgramCounterStep, ProcessError> {
        let key = match self.keyboard.pop_event() {
            Some(key) => key,
            None => match self.input.blocking_read_key() {
                KeyInput::Key(key) => key,
                KeyInput::Quit => {
                    log::debug!("quit interrupt during key wait");
                    self.halt_requested = true;
                    return Ok(ProgramCounterStep::None);
                }
            },
        };

        debug_assert!((key as usize) < keyboard::SIZE);
        self.registers[x] = key;
        Ok(ProgramCounterStep::Next)
    }
}
