use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the loader-thread glue (C8) while reading a process's
/// bytecode stream or admitting it to the kernel.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("cannot read process file {0:?}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("process file {0:?} line {1}: unrecognized instruction {2:?}")]
    BadInstruction(PathBuf, usize, String),

    #[error(transparent)]
    Kernel(#[from] simos_kernel::error::KernelError),
}
