use crate::definitions::keyboard;

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for the display based code
///
/// The chipset never renders anything itself, it only requests pixel
/// toggles and full clears, the collaborator decides how those end up on
/// an actual screen.
pub trait DisplayCommands {
    /// Will toggle the pixel at the given coordinates and report if the
    /// pixel was lit before the toggle, which the draw instruction uses
    /// for its collision flag.
    fn toggle_pixel(&mut self, row: usize, col: usize) -> bool;
    /// Will clear the display
    fn clear(&mut self);
    /// Will repaint the display surface from its current pixel state
    fn refresh(&mut self);
}

/// The result of a blocking read on the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A logical hex key in `0x0..=0xF`
    Key(u8),
    /// The user requested to end the emulation while the chip was
    /// blocking on a key press
    Quit,
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for reading the keyboard data
pub trait InputCommands {
    /// Checks if the given logical key is currently held down.
    fn is_key_down(&self, key: usize) -> bool;
    /// Blocks until the next key press and returns it, or returns
    /// [`KeyInput::Quit`](KeyInput::Quit) on an explicit quit interrupt.
    fn blocking_read_key(&mut self) -> KeyInput;
}

/// The internal keyboard representation of the chipset.
///
/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. Each
/// key holds a pressed-unconsumed latch that is set on a key down edge and
/// cleared only by the instruction that consumes it. In addition every
/// down edge is buffered in a bounded FIFO, so that a key pressed between
/// two cycles is not lost for a later blocking key wait.
#[derive(Debug, Clone)]
pub struct Keyboard {
    /// the pressed-unconsumed latches, one per logical key
    keys: [bool; keyboard::SIZE],
    /// circular buffer of key down events
    queue: [u8; keyboard::QUEUE_SIZE],
    read: usize,
    write: usize,
    len: usize,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            keys: [false; keyboard::SIZE],
            queue: [0; keyboard::QUEUE_SIZE],
            read: 0,
            write: 0,
            len: 0,
        }
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    /// Will record a key down observation.
    ///
    /// Only a released to pressed edge sets the latch and buffers the
    /// event, a key that is still latched from an earlier cycle is ignored
    /// until an instruction consumed it. A full queue drops the event
    /// silently, which can only happen if every key produces a fresh edge
    /// within a single poll.
    pub fn press(&mut self, key: usize) {
        debug_assert!(key < keyboard::SIZE);
        if self.keys[key] {
            return;
        }
        self.keys[key] = true;
        self.enqueue(key as u8);
    }

    /// Checks the pressed-unconsumed latch of the given key.
    pub fn is_pressed(&self, key: usize) -> bool {
        debug_assert!(key < keyboard::SIZE);
        self.keys[key]
    }

    /// Will clear the latch of the given key, used by the skip
    /// instructions that consume the key state they tested.
    pub fn consume(&mut self, key: usize) {
        debug_assert!(key < keyboard::SIZE);
        self.keys[key] = false;
    }

    /// Will dequeue the oldest buffered key down event if any.
    pub fn pop_event(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        let key = self.queue[self.read];
        self.read = (self.read + 1) % keyboard::QUEUE_SIZE;
        self.len -= 1;
        Some(key)
    }

    /// Will get the current latch state of all keys
    pub fn get_keys(&self) -> &[bool] {
        &self.keys
    }

    fn enqueue(&mut self, key: u8) {
        if self.len == keyboard::QUEUE_SIZE {
            log::warn!("key event queue is full, dropping key {:#X}", key);
            return;
        }
        self.queue[self.write] = key;
        self.write = (self.write + 1) % keyboard::QUEUE_SIZE;
        self.len += 1;
    }
}
