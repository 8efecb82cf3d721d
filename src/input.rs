use crossterm::event::{poll, read, Event, KeyCode, KeyEvent};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crate::shutdown::Shutdown;

pub const KEY_COUNT: usize = 16;

/// hex keypad mapped onto the left-hand side of a qwerty keyboard
///
/// ```text
///  1 2 3 C        1 2 3 4
///  4 5 6 D        q w e r
///  7 8 9 E        a s d f
///  A 0 B F        z x c v
/// ```
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// reads keypresses
pub trait Input {
    /// is `key` (0x0..=0xF) held right now. anything above 0xF is never pressed
    fn is_pressed(&mut self, key: u8) -> bool;

    /// block until a fresh key press and return it. None means the wait was
    /// abandoned because of a shutdown
    fn wait_for_key(&mut self) -> Option<u8>;

    /// stop reading and release anyone waiting
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct PadState {
    pressed_at: [Option<Instant>; KEY_COUNT],
    presses: u64,
    last_key: Option<u8>,
    closed: bool,
}

/// Shared key state, fed by whatever reads the real keyboard.
///
/// Terminals only report key-down, so a key counts as held for `hold` after
/// its last press (auto-repeat keeps it held). `wait_for_press` sleeps on a
/// condvar and is woken by a press, by `close`, or by the shutdown signal.
pub struct KeyPad {
    state: Mutex<PadState>,
    changed: Condvar,
    hold: Duration,
}

impl KeyPad {
    pub fn new(hold: Duration, shutdown: &Shutdown) -> Arc<Self> {
        let pad = Arc::new(KeyPad {
            state: Mutex::new(PadState::default()),
            changed: Condvar::new(),
            hold,
        });
        let weak: Weak<KeyPad> = Arc::downgrade(&pad);
        shutdown.on_trigger(move || {
            if let Some(pad) = weak.upgrade() {
                pad.close();
            }
        });
        pad
    }

    fn lock(&self) -> MutexGuard<'_, PadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn press(&self, key: u8) {
        let slot = usize::from(key);
        if slot >= KEY_COUNT {
            return;
        }
        let mut state = self.lock();
        state.pressed_at[slot] = Some(Instant::now());
        state.presses += 1;
        state.last_key = Some(key);
        self.changed.notify_all();
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        let state = self.lock();
        match state.pressed_at.get(usize::from(key)) {
            Some(Some(at)) => at.elapsed() < self.hold,
            _ => false,
        }
    }

    /// only presses that land after the call count
    pub fn wait_for_press(&self) -> Option<u8> {
        let state = self.lock();
        let seen = state.presses;
        let state = self
            .changed
            .wait_while(state, |s| !s.closed && s.presses == seen)
            .unwrap_or_else(PoisonError::into_inner);
        if state.presses == seen {
            return None;
        }
        state.last_key
    }

    /// release all waiters for good
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// how long the reader thread blocks in poll before checking if it should stop
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// reads the terminal in raw mode on a background thread
pub struct StdinInput {
    pad: Arc<KeyPad>,
    stop: Arc<AtomicBool>,
    reader: Option<thread::JoinHandle<()>>,
}

impl StdinInput {
    /// Escape triggers `shutdown`
    pub fn new(hold: Duration, shutdown: Shutdown) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let pad = KeyPad::new(hold, &shutdown);
        let stop = Arc::new(AtomicBool::new(false));
        let keymap: HashMap<char, u8> = HashMap::from(CHIP8_CONVENTIONAL_KEYMAP);

        let reader = {
            let pad = pad.clone();
            let stop = stop.clone();
            thread::Builder::new()
                .name("stdin-input".into())
                .spawn(move || read_stdin(&pad, &keymap, &stop, &shutdown))?
        };

        Ok(StdinInput {
            pad,
            stop,
            reader: Some(reader),
        })
    }
}

fn read_stdin(pad: &KeyPad, keymap: &HashMap<char, u8>, stop: &AtomicBool, shutdown: &Shutdown) {
    while !stop.load(Ordering::SeqCst) {
        let event = match poll(POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => read(),
            Err(e) => Err(e),
        };
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                log::warn!("can't read the terminal: {}", e);
                shutdown.trigger();
                return;
            }
        };
        match event {
            Event::Key(KeyEvent {
                code: KeyCode::Char(key),
                ..
            }) => match keymap.get(&key.to_ascii_lowercase()) {
                Some(&mapped_key) => pad.press(mapped_key),
                None => log::debug!("can't map {:?} to a COSMAC key", key),
            },
            Event::Key(KeyEvent {
                code: KeyCode::Esc, ..
            }) => shutdown.trigger(),
            _ => log::trace!("ignored terminal event {:?}", event),
        }
    }
}

impl Input for StdinInput {
    fn is_pressed(&mut self, key: u8) -> bool {
        self.pad.is_pressed(key)
    }

    fn wait_for_key(&mut self) -> Option<u8> {
        self.pad.wait_for_press()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.pad.close();
        self.stop.store(true, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                log::warn!("stdin reader thread panicked");
            }
        }
        terminal::disable_raw_mode()
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        if self.reader.is_some() {
            if let Err(e) = Input::shutdown(self) {
                log::warn!("couldn't restore the terminal: {}", e);
            }
        }
    }
}

/// dummy Input implementation for testing: a fixed set of held keys, plus a
/// queue of presses handed out one per wait_for_key
pub struct DummyInput {
    held: Vec<u8>,
    presses: Vec<u8>,
}

impl DummyInput {
    pub fn new(held: &[u8]) -> Self {
        DummyInput {
            held: Vec::from(held),
            presses: Vec::new(),
        }
    }

    pub fn with_presses(mut self, presses: &[u8]) -> Self {
        self.presses = presses.iter().rev().copied().collect();
        self
    }
}

impl Input for DummyInput {
    fn is_pressed(&mut self, key: u8) -> bool {
        self.held.contains(&key)
    }

    /// None once the queue runs dry, as if shut down
    fn wait_for_key(&mut self) -> Option<u8> {
        self.presses.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_millis(200);

    #[test]
    fn test_keymap_covers_keypad() {
        let keymap: HashMap<char, u8> = HashMap::from(CHIP8_CONVENTIONAL_KEYMAP);
        let mut keys: Vec<u8> = keymap.values().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_press_is_held_then_released() {
        let pad = KeyPad::new(Duration::from_millis(5), &Shutdown::new());
        pad.press(0xA);
        assert!(pad.is_pressed(0xA));
        assert!(!pad.is_pressed(0xB));
        thread::sleep(Duration::from_millis(10));
        assert!(!pad.is_pressed(0xA));
    }

    #[test]
    fn test_out_of_range_keys_ignored() {
        let pad = KeyPad::new(HOLD, &Shutdown::new());
        pad.press(0x10);
        assert!(!pad.is_pressed(0x10));
        assert!(!pad.is_pressed(0xFF));
    }

    #[test]
    fn test_wait_for_press_gets_key() {
        let pad = KeyPad::new(HOLD, &Shutdown::new());
        let presser = {
            let pad = pad.clone();
            thread::spawn(move || {
                // keep pressing until the waiter has definitely started
                for _ in 0..50 {
                    pad.press(0x7);
                    thread::sleep(Duration::from_millis(5));
                }
            })
        };
        assert_eq!(pad.wait_for_press(), Some(0x7));
        presser.join().unwrap();
    }

    #[test]
    fn test_wait_for_press_released_by_shutdown() {
        let shutdown = Shutdown::new();
        let pad = KeyPad::new(HOLD, &shutdown);
        let waiter = {
            let pad = pad.clone();
            thread::spawn(move || pad.wait_for_press())
        };
        thread::sleep(Duration::from_millis(20));
        shutdown.trigger();
        assert_eq!(waiter.join().unwrap(), None);
        assert!(pad.is_closed());
    }

    #[test]
    fn test_wait_after_close_returns_at_once() {
        let pad = KeyPad::new(HOLD, &Shutdown::new());
        pad.close();
        assert_eq!(pad.wait_for_press(), None);
    }

    #[test]
    fn test_dummy_input() {
        let mut input = DummyInput::new(&[0x1, 0x2]).with_presses(&[0x5, 0x6]);
        assert!(input.is_pressed(0x1));
        assert!(!input.is_pressed(0x3));
        assert_eq!(input.wait_for_key(), Some(0x5));
        assert_eq!(input.wait_for_key(), Some(0x6));
        assert_eq!(input.wait_for_key(), None);
    }
}
