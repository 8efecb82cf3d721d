/// # interpreter
///
/// fetch, decode, execute, render; one instruction per `step`.
///
///  * fetch    two bytes at PC, big-endian. if that would read past the top
///             of RAM the program is finished
///  * decode   `Instruction::decode`, pure and total
///  * execute  mutates registers/RAM/framebuffer, talks to the drivers
///  * render   the framebuffer goes to the display after every step
///
/// the two timers run on their own threads (see `timer`); everything else is
/// touched only from here, strictly one step at a time.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::cpu::{CallStack, Registers, FLAG_REGISTER};
use crate::display::Display;
use crate::error::Chip8Error;
use crate::framebuffer::Framebuffer;
use crate::input::Input;
use crate::instruction::Instruction;
use crate::memory::{Memory, FONT_ADDR, GLYPH_HEIGHT};
use crate::shutdown::Shutdown;
use crate::sound::Sound;
use crate::timer::CountdownTimer;

/// every instruction is two bytes
pub const INSTRUCTION_LEN: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// PC ran off the top of RAM
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    EndOfMemory,
    Shutdown,
    StepLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: u64,
    pub halt: Halt,
}

pub struct Chip8Interpreter<'a> {
    memory: Memory,
    registers: Registers,
    stack: CallStack,
    framebuffer: Framebuffer,
    delay_timer: CountdownTimer,
    sound_timer: CountdownTimer,
    rng: StdRng,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: Arc<dyn Sound>,
    shutdown: Shutdown,
    config: Config,
}

impl<'a> Chip8Interpreter<'a> {
    /// the drivers belong to the caller; the interpreter only borrows them
    /// (the sound driver is shared with the sound timer's thread)
    pub fn new(
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: Arc<dyn Sound>,
        shutdown: Shutdown,
        config: Config,
    ) -> Chip8Interpreter<'a> {
        let seed = config.seed.unwrap_or_else(rand::random);
        log::debug!("random source seeded with {:#x}", seed);
        Chip8Interpreter {
            memory: Memory::new(),
            registers: Registers::new(),
            stack: CallStack::new(),
            framebuffer: Framebuffer::new(),
            delay_timer: CountdownTimer::new("delay"),
            sound_timer: CountdownTimer::with_sound("sound", sound.clone()),
            rng: StdRng::seed_from_u64(seed),
            display,
            input,
            sound,
            shutdown,
            config,
        }
    }

    /// load a chip8 program
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        let size = self.memory.load_program(reader)?;
        log::debug!("loaded {} byte program at {:#05X}", size, self.registers.pc);
        Ok(size)
    }

    pub fn load_image(&mut self, image: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load_image(image)
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn delay_timer(&self) -> &CountdownTimer {
        &self.delay_timer
    }

    pub fn sound_timer(&self) -> &CountdownTimer {
        &self.sound_timer
    }

    /// a handle other threads can use to stop the loop
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Step until the program runs off the end of RAM, something asks for a
    /// shutdown, the step limit is hit, or an instruction fails.
    ///
    /// However it ends, the timers are stopped and every driver is shut down
    /// before this returns.
    pub fn main_loop(&mut self) -> Result<RunSummary, Chip8Error> {
        let result = self.run_steps();
        match &result {
            Ok(summary) => log::debug!("halted after {} steps: {:?}", summary.steps, summary.halt),
            Err(e) => log::debug!("aborted at {:#05X}: {}", self.registers.pc, e),
        }
        self.release_drivers();
        result
    }

    fn run_steps(&mut self) -> Result<RunSummary, Chip8Error> {
        let interval = self.config.step_interval();
        let mut deadline = Instant::now();
        let mut steps = 0;
        let halt = loop {
            if self.shutdown.is_triggered() {
                break Halt::Shutdown;
            }
            if self.config.max_steps.is_some_and(|max| steps >= max) {
                break Halt::StepLimit;
            }
            if self.step()? == Step::Finished {
                break Halt::EndOfMemory;
            }
            steps += 1;

            if let Some(interval) = interval {
                deadline += interval;
                let now = Instant::now();
                if deadline > now {
                    spin_sleep::sleep(deadline - now);
                } else {
                    // running behind; don't try to catch up in a burst
                    deadline = now;
                }
            }
        };
        Ok(RunSummary { steps, halt })
    }

    fn release_drivers(&mut self) {
        self.delay_timer.disarm();
        self.sound_timer.disarm();
        self.shutdown.trigger();
        if let Err(e) = self.input.shutdown() {
            log::warn!("input shutdown failed: {}", e);
        }
        if let Err(e) = self.display.shutdown() {
            log::warn!("display shutdown failed: {}", e);
        }
        if let Err(e) = self.sound.shutdown() {
            log::warn!("sound shutdown failed: {}", e);
        }
    }

    /// one fetch/decode/execute cycle, then a render
    pub fn step(&mut self) -> Result<Step, Chip8Error> {
        let pc = self.registers.pc;
        let op = match self.memory.get_word(pc) {
            Some(op) => op,
            None => return Ok(Step::Finished),
        };
        self.registers.pc += INSTRUCTION_LEN;

        let instruction = Instruction::decode(op);
        log::trace!("{:03X}: {:04X} {}", pc, op, instruction);
        self.execute(instruction, pc)?;

        self.display
            .render(&self.framebuffer)
            .map_err(Chip8Error::Display)?;
        Ok(Step::Continue)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.registers.pc += INSTRUCTION_LEN;
        }
    }

    /// `at` is where the instruction was fetched from; PC is already past it
    fn execute(&mut self, instruction: Instruction, at: u16) -> Result<(), Chip8Error> {
        use Instruction::*;

        let v = &mut self.registers.v;
        match instruction {
            ClearScreen => self.framebuffer.clear(),
            Return => {
                self.registers.pc = self
                    .stack
                    .pop()
                    .ok_or(Chip8Error::StackUnderflow { pc: at })?;
                self.registers.sp = self.stack.depth() as u8;
            }
            Jump { addr } => self.registers.pc = addr,
            Call { addr } => {
                let depth = self.stack.depth();
                self.stack
                    .push(self.registers.pc)
                    .map_err(|_| Chip8Error::StackOverflow { pc: at, depth })?;
                self.registers.sp = self.stack.depth() as u8;
                self.registers.pc = addr;
            }
            SkipIfEqual { x, kk } => {
                let hit = v[x as usize] == kk;
                self.skip_if(hit);
            }
            SkipIfNotEqual { x, kk } => {
                let hit = v[x as usize] != kk;
                self.skip_if(hit);
            }
            SkipIfRegistersEqual { x, y } => {
                let hit = v[x as usize] == v[y as usize];
                self.skip_if(hit);
            }
            SkipIfRegistersNotEqual { x, y } => {
                let hit = v[x as usize] != v[y as usize];
                self.skip_if(hit);
            }
            Load { x, kk } => v[x as usize] = kk,
            AddImmediate { x, kk } => v[x as usize] = v[x as usize].wrapping_add(kk),
            Move { x, y } => v[x as usize] = v[y as usize],
            Or { x, y } => v[x as usize] |= v[y as usize],
            And { x, y } => v[x as usize] &= v[y as usize],
            Xor { x, y } => v[x as usize] ^= v[y as usize],

            // flag ops: result and flag both come from the old values, then
            // Vx is written before VF so the flag wins when x is F
            Add { x, y } => {
                let (sum, carry) = v[x as usize].overflowing_add(v[y as usize]);
                v[x as usize] = sum;
                v[FLAG_REGISTER] = carry as u8;
            }
            Sub { x, y } => {
                let (vx, vy) = (v[x as usize], v[y as usize]);
                v[x as usize] = vx.wrapping_sub(vy);
                v[FLAG_REGISTER] = (vx > vy) as u8;
            }
            ShiftRight { x } => {
                let vx = v[x as usize];
                v[x as usize] = vx >> 1;
                v[FLAG_REGISTER] = vx & 0x01;
            }
            SubReverse { x, y } => {
                let (vx, vy) = (v[x as usize], v[y as usize]);
                v[x as usize] = vy.wrapping_sub(vx);
                v[FLAG_REGISTER] = (vy > vx) as u8;
            }
            ShiftLeft { x } => {
                let vx = v[x as usize];
                v[x as usize] = vx << 1;
                v[FLAG_REGISTER] = vx >> 7;
            }

            LoadIndex { addr } => self.registers.i = addr,
            JumpOffset { addr } => self.registers.pc = u16::from(v[0]) + addr,
            Random { x, kk } => v[x as usize] = self.rng.random::<u8>() & kk,
            Draw { x, y, rows } => {
                let (vx, vy) = (v[x as usize], v[y as usize]);
                let addr = self.registers.i;
                let sprite = self
                    .memory
                    .get_ro_slice(addr, rows as usize)
                    .ok_or(Chip8Error::SpriteOutOfBounds { addr, rows })?;
                self.registers.set_flag(false);
                let collision = self
                    .framebuffer
                    .draw_sprite(vx as usize, vy as usize, sprite);
                self.registers.set_flag(collision);
            }

            SkipIfKeyPressed { x } => {
                let pressed = self.input.is_pressed(v[x as usize]);
                self.skip_if(pressed);
            }
            SkipIfKeyNotPressed { x } => {
                let pressed = self.input.is_pressed(v[x as usize]);
                self.skip_if(!pressed);
            }
            ReadDelay { x } => v[x as usize] = self.delay_timer.get(),
            WaitKey { x } => match self.input.wait_for_key() {
                Some(key) => self.registers.v[x as usize] = key,
                None => {
                    // abandoned by a shutdown; park on this instruction
                    self.registers.pc = at;
                    self.shutdown.trigger();
                }
            },
            SetDelay { x } => self.delay_timer.set(v[x as usize]),
            SetSound { x } => self.sound_timer.set(v[x as usize]),
            AddIndex { x } => {
                self.registers.i = self.registers.i.wrapping_add(u16::from(v[x as usize]));
            }
            LoadGlyph { x } => {
                self.registers.i = FONT_ADDR + u16::from(v[x as usize]) * GLYPH_HEIGHT;
            }
            StoreBcd { x } => {
                let n = v[x as usize];
                let addr = self.registers.i;
                self.memory
                    .get_rw_slice(addr, 3)
                    .ok_or(Chip8Error::BcdOutOfBounds { addr, reg: x })?
                    .copy_from_slice(&[n / 100, n / 10 % 10, n % 10]);
            }
            StoreRegisters { x } => {
                let count = x as usize + 1;
                let addr = self.registers.i;
                self.memory
                    .get_rw_slice(addr, count)
                    .ok_or(Chip8Error::RegisterStoreOutOfBounds { addr, last: x })?
                    .copy_from_slice(&v[..count]);
            }
            LoadRegisters { x } => {
                let count = x as usize + 1;
                let addr = self.registers.i;
                let src = self
                    .memory
                    .get_ro_slice(addr, count)
                    .ok_or(Chip8Error::RegisterLoadOutOfBounds { addr, last: x })?;
                v[..count].copy_from_slice(src);
            }

            Unknown(op) => log::warn!("unknown instruction {:04X} at {:03X}, skipped", op, at),
        }
        Ok(())
    }
}
