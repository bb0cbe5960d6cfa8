use chip::{
    definitions::display,
    devices::{DisplayCommands, InputCommands, KeyInput},
    ChipSet,
};
use criterion::{criterion_group, criterion_main, Criterion};

/// A display that tracks the pixel state without rendering anywhere.
struct BufferDisplay {
    pixels: Vec<Vec<bool>>,
}

impl BufferDisplay {
    fn new() -> Self {
        Self {
            pixels: vec![vec![false; display::WIDTH]; display::HEIGHT],
        }
    }
}

impl DisplayCommands for BufferDisplay {
    fn toggle_pixel(&mut self, row: usize, col: usize) -> bool {
        let was_lit = self.pixels[row][col];
        self.pixels[row][col] = !was_lit;
        was_lit
    }

    fn clear(&mut self) {
        for row in self.pixels.iter_mut() {
            for pixel in row.iter_mut() {
                *pixel = false;
            }
        }
    }

    fn refresh(&mut self) {}
}

/// An input that never reports a key, the benched program never waits.
struct IdleInput;

impl InputCommands for IdleInput {
    fn is_key_down(&self, _key: usize) -> bool {
        false
    }

    fn blocking_read_key(&mut self) -> KeyInput {
        KeyInput::Quit
    }
}

/// A small endless program, it keeps drawing font glyphs at a moving
/// column and jumps back.
const PROGRAM: [u8; 12] = [
    0xA0, 0x00, // I = 0
    0x60, 0x05, // V0 = 5
    0x61, 0x05, // V1 = 5
    0xD0, 0x15, // draw 5 rows at (V1, V0)
    0x70, 0x01, // V0 += 1
    0x12, 0x02, // jump back to the draw setup
];

fn get_default_chip() -> ChipSet<BufferDisplay, IdleInput> {
    let mut chip = ChipSet::new(BufferDisplay::new(), IdleInput);
    chip.load_program(&PROGRAM)
        .expect("the benchmark program has to fit into memory");
    chip
}

pub fn cycle_bench(c: &mut Criterion) {
    let mut chip = get_default_chip();
    c.bench_function("cycle_bench", |b| {
        b.iter(|| {
            chip.next().expect("the benchmark program has to execute");
            let _ = chip.take_draw_request();
        });
    });
}

criterion_group!(benches, cycle_bench);
criterion_main!(benches);
