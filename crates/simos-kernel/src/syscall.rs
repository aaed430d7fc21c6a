//! Syscall dispatcher (C6): the single `sys_memmap` entry point that routes
//! the memory-op group to the VMA allocator, the demand pager, or a raw
//! `MemPhy` byte access, for whichever process `pid` names.

use simos_vm::{swap_cp, MemOp, SyscallRegs, SyscallResult};

use crate::error::SyscallError;
use crate::pager;
use crate::types::Pid;
use crate::vma;
use crate::Kernel;

/// Looks up `pid`'s PCB and switches on `regs.a1`. `IO_READ` also writes its
/// result back into `regs.a3`, matching the original call convention.
pub fn sys_memmap(
    kernel: &Kernel,
    pid: Pid,
    regs: &mut SyscallRegs,
) -> Result<SyscallResult, SyscallError> {
    let op = MemOp::from_u32(regs.a1).ok_or(SyscallError::UnknownOpcode(regs.a1))?;
    let a2 = regs.a2;
    let a3 = regs.a3;

    let result = kernel.with_proc_mut(pid, |pcb, ram, swap, active_swap| {
        let active = &mut swap[*active_swap];
        match op {
            MemOp::Map => {
                let start_pgn = a2;
                let npages = a3;
                for i in 0..npages {
                    pager::pg_getpage(&mut pcb.mm, ram, active, start_pgn + i)?;
                }
                Ok(SyscallResult::default())
            }
            MemOp::Inc => {
                let vma_id = a2;
                let size = a3;
                let extended = vma::inc_vma_limit(&mut pcb.mm, ram, active, vma_id, size)?;
                Ok(SyscallResult { a3: extended })
            }
            MemOp::Swp => {
                swap_cp(ram, a2, active, a3)?;
                Ok(SyscallResult::default())
            }
            MemOp::IoRead => {
                let byte = ram.read(a2)?;
                Ok(SyscallResult { a3: byte as u32 })
            }
            MemOp::IoWrite => {
                ram.write(a2, a3 as u8)?;
                Ok(SyscallResult::default())
            }
        }
    })?;

    if op == MemOp::IoRead {
        regs.a3 = result.a3;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simos_vm::Program;

    fn setup() -> (Kernel, Pid) {
        let kernel = Kernel::new(4096, &[4096]);
        let pid = kernel.next_pid();
        kernel.add_proc(pid, 0, Program::default()).unwrap();
        (kernel, pid)
    }

    #[test]
    fn unknown_pid_is_rejected() {
        let (kernel, _pid) = setup();
        let unknown = crate::types::Pid::new(999).unwrap();
        let mut regs = SyscallRegs {
            a1: MemOp::IoRead as u32,
            a2: 0,
            a3: 0,
        };
        assert!(matches!(
            sys_memmap(&kernel, unknown, &mut regs),
            Err(SyscallError::UnknownPid(999))
        ));
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let (kernel, pid) = setup();
        let mut regs = SyscallRegs {
            a1: 999,
            a2: 0,
            a3: 0,
        };
        assert!(matches!(
            sys_memmap(&kernel, pid, &mut regs),
            Err(SyscallError::UnknownOpcode(999))
        ));
    }

    #[test]
    fn io_write_then_io_read_round_trips_and_fills_a3() {
        let (kernel, pid) = setup();
        let mut write_regs = SyscallRegs {
            a1: MemOp::IoWrite as u32,
            a2: 10,
            a3: 0x41,
        };
        sys_memmap(&kernel, pid, &mut write_regs).unwrap();

        let mut read_regs = SyscallRegs {
            a1: MemOp::IoRead as u32,
            a2: 10,
            a3: 0,
        };
        let result = sys_memmap(&kernel, pid, &mut read_regs).unwrap();
        assert_eq!(result.byte(), 0x41);
        assert_eq!(read_regs.a3, 0x41);
    }

    #[test]
    fn inc_op_grows_the_vma_and_returns_aligned_size() {
        let (kernel, pid) = setup();
        let mut regs = SyscallRegs {
            a1: MemOp::Inc as u32,
            a2: 0,
            a3: 10,
        };
        let result = sys_memmap(&kernel, pid, &mut regs).unwrap();
        assert_eq!(result.a3, simos_vm::PAGE_SIZE);
    }
}
