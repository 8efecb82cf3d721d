//! # chip8
//!
//! A CHIP-8 virtual machine: 4K of RAM, sixteen 8bit registers, a 64x32
//! monochrome screen, a hex keypad and two 60Hz timers.
//!
//! ## Design
//!
//! * the interpreter core is plain single-threaded state; one `step()` is one
//!   fetch/decode/execute/render
//! * abstract display, input and sound so can plug alternatives; TUI
//!   in-console, raw-mode stdin and `beep` to start with, dummies for tests
//! * timers run on their own threads and only exist while counting
//! * instructions run as fast as possible then sleep, to hit the configured
//!   rate; so not quite authentic
//! * one shutdown signal that anything can trigger (Esc, a blocked key wait,
//!   the caller) and everything watches
//!
//! Model
//!
//! ```text
//! main
//!  |-- config, display, input, sound, shutdown
//!  |-- interpreter(display, input, sound, shutdown, config)
//!  |    |-- memory (font at 0x000, program at 0x200)
//!  |    |-- registers, call stack, framebuffer
//!  |    `-- delay timer, sound timer(sound)
//!  `-- main loop
//!       |-- stop if shutdown or step limit
//!       |-- step: fetch, decode, execute, render
//!       `-- sleep until the next step is due
//! ```
pub mod config;
pub mod cpu;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod opcode;
pub mod shutdown;
pub mod sound;
pub mod timer;

pub use config::Config;
pub use error::Chip8Error;
pub use interpreter::{Chip8Interpreter, Halt, RunSummary, Step};
pub use shutdown::Shutdown;
