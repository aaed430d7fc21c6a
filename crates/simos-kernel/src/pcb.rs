//! Process control block: the unit the scheduler queues and the syscall
//! dispatcher looks up by PID.

use simos_vm::Program;

use crate::mm::Mm;
use crate::types::Pid;

/// A simulated process: its code, program counter, scheduling priority, a
/// small general-purpose register file, and its own address-space map.
#[derive(Debug, Clone)]
pub struct Pcb {
    pub pid: Pid,
    pub priority: u32,
    pub pc: u32,
    pub code: Program,
    pub regs: [u32; 8],
    pub mm: Mm,
}

impl Pcb {
    pub fn new(pid: Pid, priority: u32, code: Program) -> Self {
        Self {
            pid,
            priority,
            pc: 0,
            code,
            regs: [0; 8],
            mm: Mm::init(),
        }
    }

    /// The CPU driver retires a process once `pc` runs off the end of its
    /// code stream.
    pub fn finished(&self) -> bool {
        self.pc as usize >= self.code.len()
    }
}
