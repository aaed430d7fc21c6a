use thiserror::Error;

/// Errors raised by the address-space map and VMA allocator (C3/C4).
#[derive(Debug, Error)]
pub enum MmError {
    #[error("vma {0} does not exist")]
    InvalidVma(u32),

    #[error("symbol region index {0} is out of range")]
    InvalidSymbolIndex(i64),

    #[error("symbol slot {0} has no allocated region")]
    SymbolNotAllocated(usize),

    #[error("extending vma {0} would overlap an existing vma")]
    OverlappingVma(u32),

    #[error("out of memory: no free frame and no victim page available")]
    OutOfMemory,

    #[error(transparent)]
    Memphy(#[from] simos_vm::MemPhyError),

    #[error(transparent)]
    Pte(#[from] simos_vm::PteError),

    #[error(transparent)]
    Pager(#[from] PagerError),
}

/// Errors raised by the demand pager (C5).
#[derive(Debug, Error)]
pub enum PagerError {
    #[error("out of memory: no free frame and no victim page available")]
    OutOfMemory,

    #[error("no free swap slot available")]
    NoFreeSwapSlot,

    #[error(transparent)]
    Memphy(#[from] simos_vm::MemPhyError),
}

/// Errors raised by the MLQ scheduler (C7).
#[derive(Debug, Error)]
pub enum SchedError {
    #[error("priority {0} is not below MAX_PRIO")]
    InvalidPriority(u32),

    #[error("process {0} not found")]
    NotFound(u32),
}

/// Errors raised by the syscall dispatcher (C6).
#[derive(Debug, Error)]
pub enum SyscallError {
    #[error("unknown memory-op opcode {0}")]
    UnknownOpcode(u32),

    #[error("process {0} not found")]
    UnknownPid(u32),

    #[error(transparent)]
    Mm(#[from] MmError),

    #[error(transparent)]
    Pager(#[from] PagerError),

    #[error(transparent)]
    Memphy(#[from] simos_vm::MemPhyError),
}

/// Top-level error, wrapping every subsystem's taxonomy for `Kernel`-level
/// operations (process bootstrap, shutdown).
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("initialization error: {0}")]
    Init(String),

    #[error(transparent)]
    Mm(#[from] MmError),

    #[error(transparent)]
    Pager(#[from] PagerError),

    #[error(transparent)]
    Sched(#[from] SchedError),

    #[error(transparent)]
    Syscall(#[from] SyscallError),
}
