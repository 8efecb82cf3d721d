use crate::memory::PROGRAM_ADDR;

pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;

/// VF doubles as carry/borrow/collision output, so programs can't count on
/// it surviving arithmetic, shifts or DRW
pub const FLAG_REGISTER: usize = 0xF;

/// # registers
///
///  * V0..VF  16 general 8bit registers
///  * I       16bit index register, mostly a pointer into RAM
///  * PC      program counter, starts where the program is loaded
///  * SP      stack pointer; number of return addresses on the call stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_ADDR,
            sp: 0,
        }
    }

    pub fn set_flag(&mut self, flag: bool) {
        self.v[FLAG_REGISTER] = flag as u8;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded stack of return addresses. It only grows on CALL and shrinks on RET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    frames: [u16; STACK_DEPTH],
    depth: usize,
}

/// returned by push when all STACK_DEPTH slots are taken
#[derive(Debug, PartialEq, Eq)]
pub struct StackFull;

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            frames: [0; STACK_DEPTH],
            depth: 0,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<(), StackFull> {
        let slot = self.frames.get_mut(self.depth).ok_or(StackFull)?;
        *slot = addr;
        self.depth += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<u16> {
        self.depth = self.depth.checked_sub(1)?;
        Some(self.frames[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}
