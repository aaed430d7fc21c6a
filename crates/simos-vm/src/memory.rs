//! Simulated physical memory device (C1).
//!
//! A [`MemPhy`] is a flat byte array partitioned into fixed-size frames, with
//! a free/used frame list on top. The same type backs both simulated RAM and
//! simulated swap devices — the only behavioral difference is the
//! `random_access` flag, which selects between direct indexing and a
//! cursor-advancing sequential device (modeling tape-like swap media).

use std::collections::VecDeque;

use crate::error::MemPhyError;
use log::{debug, trace};

/// Byte size of one frame/page. Chosen to match the 22-bit single-level
/// profile's page size; the 64-bit profile's frame size is independent and
/// tracked by its own `Mm64` (simos-kernel), not by this device.
pub const PAGE_SIZE: u32 = 256;

/// A physical frame number.
pub type Fpn = u32;

/// Simulated physical memory / swap device.
#[derive(Debug)]
pub struct MemPhy {
    storage: Vec<u8>,
    max_size: u32,
    random_access: bool,
    cursor: u32,
    free_frames: VecDeque<Fpn>,
    used_frames: Vec<Fpn>,
}

impl MemPhy {
    /// Allocates a device with `max_size` bytes of backing storage and
    /// formats it into [`PAGE_SIZE`] frames.
    pub fn new(max_size: u32, random_access: bool) -> Self {
        let mut mp = Self {
            storage: vec![0u8; max_size as usize],
            max_size,
            random_access,
            cursor: 0,
            free_frames: VecDeque::new(),
            used_frames: Vec::new(),
        };
        mp.format(PAGE_SIZE);
        mp
    }

    /// Number of [`PAGE_SIZE`]-sized frames this device holds.
    pub fn num_frames(&self) -> u32 {
        self.max_size / PAGE_SIZE
    }

    pub fn random_access(&self) -> bool {
        self.random_access
    }

    /// Partitions storage into frames, rebuilding the free list in ascending
    /// order and clearing the used list.
    pub fn format(&mut self, page_size: u32) {
        let numfp = self.max_size / page_size;
        self.free_frames = (0..numfp).collect();
        self.used_frames.clear();
        self.cursor = 0;
        debug!("memphy: formatted {} frames of {} bytes", numfp, page_size);
    }

    /// Detaches the head of the free list. Returns `OutOfFrames` when empty
    /// — the trigger for eviction at the caller (the demand pager).
    pub fn get_freefp(&mut self) -> Result<Fpn, MemPhyError> {
        let fpn = self.free_frames.pop_front().ok_or(MemPhyError::OutOfFrames)?;
        self.used_frames.push(fpn);
        Ok(fpn)
    }

    /// Returns a frame to the free list by prepending it to the head, so the
    /// most recently freed frame is the next one handed out — matching the
    /// original device's `MEMPHY_put_freefp`. Callers must not double-free;
    /// no duplicate check is performed on the free list itself.
    pub fn put_freefp(&mut self, fpn: Fpn) {
        if let Some(pos) = self.used_frames.iter().position(|&f| f == fpn) {
            self.used_frames.swap_remove(pos);
        }
        self.free_frames.push_front(fpn);
    }

    pub fn is_used(&self, fpn: Fpn) -> bool {
        self.used_frames.contains(&fpn)
    }

    pub fn free_frame_count(&self) -> usize {
        self.free_frames.len()
    }

    pub fn used_frame_count(&self) -> usize {
        self.used_frames.len()
    }

    fn advance_cursor(&mut self, addr: u32) {
        self.cursor = 0;
        let mut numstep = 0;
        while numstep < addr && numstep < self.max_size {
            self.cursor = (self.cursor + 1) % self.max_size;
            numstep += 1;
        }
    }

    /// Reads one byte. Random devices index directly; sequential devices
    /// advance an internal cursor to `addr` first.
    pub fn read(&mut self, addr: u32) -> Result<u8, MemPhyError> {
        if addr >= self.max_size {
            return Err(MemPhyError::OutOfBounds(addr));
        }
        if self.random_access {
            Ok(self.storage[addr as usize])
        } else {
            self.advance_cursor(addr);
            Ok(self.storage[self.cursor as usize])
        }
    }

    /// Writes one byte, with the same random/sequential dispatch as `read`.
    pub fn write(&mut self, addr: u32, byte: u8) -> Result<(), MemPhyError> {
        if addr >= self.max_size {
            return Err(MemPhyError::OutOfBounds(addr));
        }
        if self.random_access {
            self.storage[addr as usize] = byte;
        } else {
            self.advance_cursor(addr);
            self.storage[self.cursor as usize] = byte;
        }
        Ok(())
    }

    /// Explicit sequential read, failing if this device is random-access.
    pub fn seq_read(&mut self, addr: u32) -> Result<u8, MemPhyError> {
        if self.random_access {
            return Err(MemPhyError::NotSequential);
        }
        self.read(addr)
    }

    /// Explicit sequential write, failing if this device is random-access.
    pub fn seq_write(&mut self, addr: u32, byte: u8) -> Result<(), MemPhyError> {
        if self.random_access {
            return Err(MemPhyError::NotSequential);
        }
        self.write(addr, byte)
    }

    /// Explicit random-access read, failing if this device is sequential.
    pub fn random_read(&self, addr: u32) -> Result<u8, MemPhyError> {
        if !self.random_access {
            return Err(MemPhyError::NotRandomAccess);
        }
        if addr >= self.max_size {
            return Err(MemPhyError::OutOfBounds(addr));
        }
        Ok(self.storage[addr as usize])
    }

    /// Debug-emits nonzero bytes via `trace!`.
    pub fn dump(&self) {
        trace!("===== PHYSICAL MEMORY DUMP =====");
        for (i, &b) in self.storage.iter().enumerate() {
            if b != 0 {
                trace!("BYTE {:08x}: {}", i, b);
            }
        }
        trace!("===== PHYSICAL MEMORY END-DUMP =====");
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Copies exactly [`PAGE_SIZE`] bytes, cell by cell, from one device's frame
/// to another's. Errors propagate; a partial copy leaves the caller
/// responsible for cleanup.
pub fn swap_cp(
    src: &mut MemPhy,
    src_fpn: Fpn,
    dst: &mut MemPhy,
    dst_fpn: Fpn,
) -> Result<(), MemPhyError> {
    for cell in 0..PAGE_SIZE {
        let byte = src.read(src_fpn * PAGE_SIZE + cell)?;
        dst.write(dst_fpn * PAGE_SIZE + cell, byte)?;
    }
    Ok(())
}
