/// The definitions

pub mod memory {
    /// The size of the chipset ram
    pub const SIZE: usize = 0x1000; // 4096

    /// opcode information
    pub mod opcodes {
        /// The step used for calculating the program counter increments
        pub const SIZE: usize = 2;
    }
}

/// The definitions for the cpu
pub mod cpu {
    /// The starting point for the program
    pub const PROGRAM_COUNTER: usize = 0x0200;

    /// The maximum size a program image may have, as everything
    /// below [`PROGRAM_COUNTER`](PROGRAM_COUNTER) is reserved for
    /// the interpreter.
    pub const PROGRAM_SIZE: usize = super::memory::SIZE - PROGRAM_COUNTER;

    /// The definitions needed for the register
    pub mod register {
        /// The size of the chip set registers
        pub const SIZE: usize = 16;
        /// The last entry of the registers, doubles as the
        /// carry / borrow / collision flag `VF`
        pub const LAST: usize = SIZE - 1;
    }

    /// The stack definitions
    pub mod stack {
        /// The count of nesting entries
        pub const SIZE: usize = 16;
    }
}

/// The timer definitions
pub mod timer {
    /// The amount of hertz the countdown timers are expected to be
    /// ticked at by the cadence driver
    pub const HERTZ: u8 = 60;
}

/// The display definitions
pub mod display {
    /// The amount of pixel rows
    pub const HEIGHT: usize = 32;
    /// The amount of pixel columns
    pub const WIDTH: usize = 64;
    /// The amount of pixels the display has
    pub const RESOLUTION: usize = HEIGHT * WIDTH;

    /// The fontset information
    pub mod fontset {
        /// Is the location of the beginning of the font in memory
        pub const LOCATION: usize = 0x0;
        /// The amount of bytes a single font glyph takes up
        pub const GLYPH_SIZE: usize = 5;
        /// The font set characters to be rendered on the screen
        pub const FONTSET: [u8; 80] = [
            0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
            0x20, 0x60, 0x20, 0x20, 0x70, // 1
            0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
            0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
            0x90, 0x90, 0xF0, 0x10, 0x10, // 4
            0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
            0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
            0xF0, 0x10, 0x20, 0x40, 0x40, // 7
            0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
            0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
            0xF0, 0x90, 0xF0, 0x90, 0x90, // A
            0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
            0xF0, 0x80, 0x80, 0x80, 0xF0, // C
            0xE0, 0x90, 0x90, 0x90, 0xE0, // D
            0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
            0xF0, 0x80, 0xF0, 0x80, 0x80, // F
        ];
    }
}

/// The definitions needed for correct keyboard handling.
pub mod keyboard {
    /// all the different keyboard entries
    pub const SIZE: usize = 16;
    /// The capacity of the buffered key event queue, a full queue
    /// silently drops further events for the given poll
    pub const QUEUE_SIZE: usize = SIZE;
    /// The keyboard layout requested by the chipset
    pub const LAYOUT: [[usize; 4]; 4] = [
        [0x1, 0x2, 0x3, 0xC],
        [0x4, 0x5, 0x6, 0xD],
        [0x7, 0x8, 0x9, 0xE],
        [0xA, 0x0, 0xB, 0xF],
    ];
}
