//! CPU-thread and loader-thread bodies (C8): spec.md's external interface,
//! concretized just enough to drive the C1-C7 core end to end.
//!
//! Each simulated CPU runs its own OS thread; one loader thread admits
//! processes to the kernel as their configured start time arrives. Both
//! bodies mirror the original driver's two-phase loop (retire-or-requeue,
//! then dispatch-or-wait, then run one instruction) rather than collapsing
//! it, since the phase split is what keeps a just-dispatched process from
//! immediately being time-sliced away.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};
use simos_kernel::types::Pid;
use simos_kernel::Kernel;
use simos_vm::{Instruction, SyscallRegs};

use crate::clock::SimClock;
use crate::error::RuntimeError;
use crate::loader;

/// One process the loader thread will admit once the clock reaches its
/// `start_time`.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub start_time: u64,
    pub path: PathBuf,
    pub priority: u32,
}

/// Executes one instruction for `pid`, routing memory-bearing instructions
/// through the syscall dispatcher. A failed syscall is logged and does not
/// stop the process — spec.md §7: the driver logs and continues with the
/// next instruction.
fn step(kernel: &Kernel, pid: Pid) {
    match kernel.instruction_at(pid) {
        Some(Instruction::Nop) => kernel.advance_pc(pid),
        Some(Instruction::Halt) => kernel.halt(pid),
        Some(Instruction::MemMap { op, a2, a3 }) => {
            let mut regs = SyscallRegs {
                a1: op as u32,
                a2,
                a3,
            };
            if let Err(e) = simos_kernel::syscall::sys_memmap(kernel, pid, &mut regs) {
                warn!("pid {pid}: memmap syscall failed: {e}");
            }
            kernel.advance_pc(pid);
        }
        None => kernel.halt(pid),
    }
}

/// One simulated CPU's thread body.
pub fn cpu_routine(
    id: usize,
    kernel: Arc<Kernel>,
    clock: Arc<SimClock>,
    time_slot: u32,
    loader_done: Arc<AtomicBool>,
) {
    let mut current: Option<Pid> = None;
    let mut time_left = 0u32;

    loop {
        if current.is_none() {
            current = kernel.get_proc();
        } else {
            let pid = current.expect("checked Some above");
            if kernel.finished(pid) {
                info!("CPU {id}: Processed {pid} has finished");
                let _ = kernel.finish_proc(pid);
                current = kernel.get_proc();
                time_left = 0;
            } else if time_left == 0 {
                info!("CPU {id}: Put process {pid} to run queue");
                let _ = kernel.put_proc(pid);
                current = kernel.get_proc();
            }
        }

        match current {
            None if loader_done.load(Ordering::SeqCst) && kernel.queue_empty() => {
                info!("CPU {id} stopped");
                break;
            }
            None => {
                clock.next_slot();
                continue;
            }
            Some(pid) if time_left == 0 => {
                info!("CPU {id}: Dispatched process {pid}");
                time_left = time_slot;
                step(&kernel, pid);
            }
            Some(pid) => step(&kernel, pid),
        }

        time_left -= 1;
        clock.next_slot();
    }
}

/// The loader thread body: waits for each process's `start_time`, reads its
/// bytecode stream, and admits it to the kernel.
pub fn ld_routine(
    processes: Vec<ProcessSpec>,
    kernel: Arc<Kernel>,
    clock: Arc<SimClock>,
    loader_done: Arc<AtomicBool>,
) -> Result<(), RuntimeError> {
    let result = ld_routine_inner(&processes, &kernel, &clock);
    // CPU threads block on `loader_done` to know when the ready queue can
    // never refill again; it must be set on every exit path, including a
    // load failure, or they spin forever.
    loader_done.store(true, Ordering::SeqCst);
    result
}

fn ld_routine_inner(
    processes: &[ProcessSpec],
    kernel: &Arc<Kernel>,
    clock: &Arc<SimClock>,
) -> Result<(), RuntimeError> {
    for spec in processes {
        while clock.current_time() < spec.start_time {
            if clock.stopped() {
                return Ok(());
            }
            clock.next_slot();
        }

        let program = loader::load_program(&spec.path)?;
        let pid = kernel.next_pid();
        kernel.add_proc(pid, spec.priority, program)?;
        info!(
            "Loaded a process at {:?}, PID: {pid} PRIO: {}",
            spec.path, spec.priority
        );
        clock.next_slot();
    }

    Ok(())
}
