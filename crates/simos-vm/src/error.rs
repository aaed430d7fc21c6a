use thiserror::Error;

/// Errors raised by a [`crate::memory::MemPhy`] device.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemPhyError {
    #[error("address {0:#x} out of bounds")]
    OutOfBounds(u32),

    #[error("sequential op attempted on a random-access device")]
    NotSequential,

    #[error("random-access op attempted on a sequential device")]
    NotRandomAccess,

    #[error("no free frame available")]
    OutOfFrames,
}

/// Errors raised while encoding or decoding a page-table entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PteError {
    #[error("frame number {0:#x} does not fit in the FPN field")]
    FpnOverflow(u32),

    #[error("swap offset {0:#x} does not fit in the SWPOFF field")]
    SwpOffOverflow(u32),

    #[error("swap type {0:#x} does not fit in the SWPTYP field")]
    SwpTypeOverflow(u32),
}
