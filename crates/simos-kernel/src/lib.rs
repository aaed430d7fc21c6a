//! Top-level kernel: owns RAM, the swap devices, the process table, and
//! wires the MLQ scheduler to syscall dispatch.
//!
//! `Mm` (a process's address-space map) lives inside its `Pcb`, and every
//! `Pcb` lives in a single process table guarded by one mutex alongside RAM
//! and swap — so a syscall handler can borrow a process's `Mm` and the
//! physical memory it maps in the same critical section. Scheduling
//! membership (which PID is ready/running at which priority) is a second,
//! independent lock living inside [`sched::Mlq`].

pub mod error;
pub mod mm;
pub mod pager;
pub mod pcb;
pub mod sched;
pub mod syscall;
pub mod types;
pub mod vma;

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use simos_vm::{Instruction, MemPhy, Program};

use error::{KernelError, SyscallError};
use pcb::Pcb;
use sched::Mlq;
use types::Pid;

struct MemState {
    ram: MemPhy,
    swap: Vec<MemPhy>,
    active_swap: usize,
    procs: HashMap<Pid, Pcb>,
}

/// The simulated machine: one RAM device, one or more swap devices, the
/// process table, and the MLQ scheduler.
pub struct Kernel {
    mem: Mutex<MemState>,
    sched: Mlq,
    next_pid: Mutex<u32>,
}

impl Kernel {
    /// `ram_size` and each entry of `swap_sizes` are byte capacities; every
    /// device is frame-formatted on construction.
    pub fn new(ram_size: u32, swap_sizes: &[u32]) -> Self {
        let swap = swap_sizes.iter().map(|&s| MemPhy::new(s, true)).collect();
        Self {
            mem: Mutex::new(MemState {
                ram: MemPhy::new(ram_size, true),
                swap,
                active_swap: 0,
                procs: HashMap::new(),
            }),
            sched: Mlq::new(),
            next_pid: Mutex::new(1),
        }
    }

    /// Allocates the next PID; PIDs are assigned once, monotonically, and
    /// never reused within a run.
    pub fn next_pid(&self) -> Pid {
        let mut n = self.next_pid.lock().expect("pid counter mutex poisoned");
        let pid = Pid::new(*n).expect("pid counter starts at 1 and only grows");
        *n += 1;
        pid
    }

    /// Inserts a fresh [`Pcb`] into the process table and admits `pid` to
    /// the scheduler at `priority`.
    pub fn add_proc(&self, pid: Pid, priority: u32, code: Program) -> Result<(), KernelError> {
        {
            let mut mem = self.mem.lock().expect("process-memory mutex poisoned");
            mem.procs.insert(pid, Pcb::new(pid, priority, code));
        }
        self.sched.add_proc(pid, priority)?;
        debug!("admitted pid {pid} at priority {priority}");
        Ok(())
    }

    /// Dispatches the next ready PID, if any.
    pub fn get_proc(&self) -> Option<Pid> {
        self.sched.get_proc()
    }

    /// Returns a preempted PID to its ready queue.
    pub fn put_proc(&self, pid: Pid) -> Result<(), KernelError> {
        self.sched.put_proc(pid)?;
        Ok(())
    }

    /// Retires `pid`: drops it from the scheduler and removes (and returns)
    /// its process-table entry.
    pub fn finish_proc(&self, pid: Pid) -> Result<Pcb, KernelError> {
        self.sched.finish_proc(pid)?;
        let mut mem = self.mem.lock().expect("process-memory mutex poisoned");
        mem.procs
            .remove(&pid)
            .ok_or_else(|| KernelError::Init(format!("pid {pid} missing from process table")))
    }

    /// True once every ready queue is empty — the driver's run-to-completion
    /// signal.
    pub fn queue_empty(&self) -> bool {
        self.sched.queue_empty()
    }

    /// The program counter `pid` is about to execute, if it is still live.
    pub fn pc_of(&self, pid: Pid) -> Option<u32> {
        let mem = self.mem.lock().expect("process-memory mutex poisoned");
        mem.procs.get(&pid).map(|p| p.pc)
    }

    /// Advances `pid`'s program counter by one instruction.
    pub fn advance_pc(&self, pid: Pid) {
        let mut mem = self.mem.lock().expect("process-memory mutex poisoned");
        if let Some(p) = mem.procs.get_mut(&pid) {
            p.pc += 1;
        }
    }

    /// Forces `pid`'s program counter to the end of its code stream — the
    /// `Halt` instruction's effect, ahead of the driver's next `finished`
    /// check.
    pub fn halt(&self, pid: Pid) {
        let mut mem = self.mem.lock().expect("process-memory mutex poisoned");
        if let Some(p) = mem.procs.get_mut(&pid) {
            p.pc = p.code.len() as u32;
        }
    }

    /// The instruction at `pid`'s current program counter, if `pid` is live
    /// and its code stream has not run off the end.
    pub fn instruction_at(&self, pid: Pid) -> Option<Instruction> {
        let mem = self.mem.lock().expect("process-memory mutex poisoned");
        mem.procs.get(&pid).and_then(|p| p.code.get(p.pc as usize))
    }

    /// True once `pid`'s program counter has run off the end of its code.
    pub fn finished(&self, pid: Pid) -> bool {
        let mem = self.mem.lock().expect("process-memory mutex poisoned");
        mem.procs.get(&pid).map(Pcb::finished).unwrap_or(true)
    }

    /// Grants a closure exclusive access to `pid`'s [`Pcb`] together with
    /// RAM, every swap device, and the index of the currently active one —
    /// the single critical section syscall handlers run inside.
    pub(crate) fn with_proc_mut<T>(
        &self,
        pid: Pid,
        f: impl FnOnce(&mut Pcb, &mut MemPhy, &mut [MemPhy], &mut usize) -> Result<T, SyscallError>,
    ) -> Result<T, SyscallError> {
        let mut mem = self.mem.lock().expect("process-memory mutex poisoned");
        let MemState {
            ram,
            swap,
            active_swap,
            procs,
        } = &mut *mem;
        let pcb = procs
            .get_mut(&pid)
            .ok_or(SyscallError::UnknownPid(pid.get()))?;
        f(pcb, ram, swap, active_swap)
    }
}
