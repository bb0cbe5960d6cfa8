use std::convert::TryFrom;

use {
    crate::{
        definitions::{cpu, display, keyboard, memory},
        devices::{DisplayCommands, InputCommands, Keyboard},
        opcode::{self, Instruction, ProgramCounter, ProgramCounterStep},
        AddressError, LoadError, ProcessError, StackError,
    },
    rand::RngCore,
    tinyvec::ArrayVec,
};

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant on the
/// Chip8 CPU.
///
/// It is an explicitly owned value created by the caller, so multiple
/// independent instances can run side by side. The display and input
/// devices are external collaborators behind the
/// [`DisplayCommands`](DisplayCommands) and [`InputCommands`](InputCommands)
/// traits.
pub struct ChipSet<D, I>
where
    D: DisplayCommands,
    I: InputCommands,
{
    /// - `0x000-0x04F` - Used for the built in `4x5` pixel font set (`0-F`)
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Vec<u8>,
    /// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
    /// instructions; thus, it should be avoided. In an addition operation, `VF` is the carry flag,
    /// while in subtraction, it is the "no borrow" flag. In the draw instruction `VF` is set upon
    /// pixel collision.
    pub(super) registers: [u8; cpu::register::SIZE],
    /// The index for the register, this is a special register entry
    /// called index `I`. It is not range-checked on assignment, an out of
    /// range dereference by a memory instruction is an addressing fault.
    pub(super) index_register: usize,
    /// The program counter is a CPU register in the computer processor which has the address of the
    /// next instruction to be executed from memory.
    pub(super) program_counter: usize,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting; modern implementations usually have more.
    /// (here we are using `16`)
    pub(super) stack: ArrayVec<[usize; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    /// Counts down until it reaches 0, driven by [`tick_timers`](ChipSet::tick_timers).
    pub(super) delay_timer: u8,
    /// Sound timer: This timer is used for sound effects. When its value is nonzero, a beeping
    /// sound is made.
    /// Counts down until it reaches 0, driven by [`tick_timers`](ChipSet::tick_timers).
    pub(super) sound_timer: u8,
    /// Input is done with a hex keyboard that has 16 keys ranging `0-F`. Three opcodes are used
    /// to detect input. Two skip an instruction depending on a pressed-unconsumed key latch,
    /// the third waits for a key press, fed from a bounded queue of buffered key down events.
    pub(super) keyboard: Keyboard,
    /// The display collaborator, it receives pixel toggles and full clear
    /// requests and reports prior pixel state for the collision flag.
    pub(super) display: D,
    /// The input collaborator, polled once per cycle for key down states
    /// and used as the single blocking suspension point of the chip.
    pub(super) input: I,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
    /// Raised by any instruction that changed display contents, consumed
    /// by the driver after each cycle to decide whether to repaint.
    pub(super) draw_requested: bool,
    /// Raised when the input collaborator reported a quit interrupt while
    /// the chip was blocking on a key, terminal for the run.
    pub(super) halt_requested: bool,
}

impl<D, I> ChipSet<D, I>
where
    D: DisplayCommands,
    I: InputCommands,
{
    /// will create a new chipset object with the font set loaded and the
    /// program counter at the program start
    pub fn new(display: D, input: I) -> Self {
        Self::with_rng(display, input, Box::new(rand::rngs::OsRng))
    }

    /// will create a new chipset object with the given random number
    /// generator, mainly useful to make the `CXNN` opcode deterministic
    /// during testing
    pub fn with_rng(display: D, input: I, rng: Box<dyn RngCore + Send>) -> Self {
        // initialize all the memory with 0
        let mut ram = vec![0; memory::SIZE];

        // load fonts
        ram[display::fontset::LOCATION
            ..(display::fontset::LOCATION + display::fontset::FONTSET.len())]
            .copy_from_slice(&display::fontset::FONTSET);

        Self {
            memory: ram,
            registers: [0; cpu::register::SIZE],
            index_register: 0,
            program_counter: cpu::PROGRAM_COUNTER,
            stack: ArrayVec::new(),
            delay_timer: 0,
            sound_timer: 0,
            keyboard: Keyboard::new(),
            display,
            input,
            rng,
            draw_requested: false,
            halt_requested: false,
        }
    }

    /// Will write the program image into memory starting at the program
    /// start address.
    ///
    /// Fails with an oversize error if the image does not fit into the
    /// program space, in which case the machine state is left untouched.
    pub fn load_program(&mut self, data: &[u8]) -> Result<(), LoadError> {
        if data.len() > cpu::PROGRAM_SIZE {
            return Err(LoadError::Oversize {
                len: data.len(),
                capacity: cpu::PROGRAM_SIZE,
            });
        }
        self.memory[cpu::PROGRAM_COUNTER..(cpu::PROGRAM_COUNTER + data.len())]
            .copy_from_slice(data);
        Ok(())
    }

    /// will advance the program by a single cycle
    ///
    /// The cycle polls the input collaborator for key down edges, fetches
    /// the two opcode bytes at the program counter, decodes them into an
    /// [`Instruction`](Instruction) and executes it. Every handler decides
    /// its own program counter movement, applied at the end of the cycle.
    ///
    /// An unrecognized sub-opcode is recoverable, it is returned as a
    /// diagnostic and the program counter is left unmodified, so the
    /// behavior stays deterministic for the caller.
    pub fn next(&mut self) -> Result<(), ProcessError> {
        self.poll_keys();

        // get next opcode
        let opcode = opcode::build_opcode(&self.memory, self.program_counter)?;
        log::debug!(
            "opcode {:#06X} at pc {:#06X}",
            opcode,
            self.program_counter
        );

        let instruction = Instruction::try_from(opcode).map_err(|err| {
            log::warn!("{}", err);
            err
        })?;

        // run the opcode
        let step = self.execute(instruction)?;
        self.step(step);
        Ok(())
    }

    /// Will decrement the delay and the sound timer each by one if they
    /// are nonzero.
    ///
    /// This is invoked by the external cadence driver and not by
    /// [`next`](ChipSet::next), the chip itself does not own a clock and
    /// the step to tick ratio is a driver policy.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Asks the input collaborator for every logical key and feeds the
    /// detected down states into the keyboard state machine.
    fn poll_keys(&mut self) {
        for key in 0..keyboard::SIZE {
            if self.input.is_key_down(key) {
                self.keyboard.press(key);
            }
        }
    }

    /// Will consume the redraw signal, returning if any instruction since
    /// the last call changed display contents.
    pub fn take_draw_request(&mut self) -> bool {
        std::mem::take(&mut self.draw_requested)
    }

    /// Checks if the chip requested the end of the emulation, once set
    /// this is terminal for the run.
    pub fn halt_requested(&self) -> bool {
        self.halt_requested
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.delay_timer
    }

    /// Will return the current register bank
    pub fn get_registers(&self) -> &[u8] {
        &self.registers
    }

    /// Will return the current program counter
    pub fn get_program_counter(&self) -> usize {
        self.program_counter
    }

    /// Will return the current index register
    pub fn get_index_register(&self) -> usize {
        self.index_register
    }

    /// Will get the current latch state of the keyboard
    pub fn get_keyboard(&self) -> &[bool] {
        self.keyboard.get_keys()
    }

    /// Will return the display collaborator, needed by the driver to
    /// issue the repaint after a consumed draw request.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Will push the current pointer to the stack
    pub(super) fn push_stack(&mut self, pointer: usize) -> Result<(), StackError> {
        if self.stack.try_push(pointer).is_some() {
            Err(StackError::Full)
        } else {
            Ok(())
        }
    }

    /// Will pop from the stack
    pub(super) fn pop_stack(&mut self) -> Result<usize, StackError> {
        self.stack.pop().ok_or(StackError::Empty)
    }

    /// Controls that the given memory range can be dereferenced, so that
    /// a stray index register surfaces as an addressing fault instead of
    /// silently wrapping.
    pub(super) fn check_mem_range(&self, address: usize, size: usize) -> Result<(), AddressError> {
        if address + size <= self.memory.len() {
            Ok(())
        } else {
            Err(AddressError::OutOfBounds {
                address,
                size,
                len: self.memory.len(),
            })
        }
    }
}

impl<D: DisplayCommands, I: InputCommands> ProgramCounter for ChipSet<D, I> {
    fn step(&mut self, step: ProgramCounterStep) {
        self.program_counter = if let ProgramCounterStep::Jump(_) = step {
            step.step()
        } else {
            self.program_counter + step.step()
        }
    }
}
