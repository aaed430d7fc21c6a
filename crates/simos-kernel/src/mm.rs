//! Address-space map: page directories, the VMA list, the per-process
//! symbol→region table, and the FIFO resident-page queue.
//!
//! Free regions and VMAs are `Vec`-backed lists rather than linked chains —
//! easier to splice and reuse without a separate allocator.

use std::collections::VecDeque;

use simos_vm::{Pte, PAGE_SIZE};

use crate::error::MmError;
use crate::types::{Pgn, VmaId, MAX_SYMBOL_REGIONS};

/// A half-open `[start, end)` range inside some VMA. Used both as a free-list
/// node and as a symbol-table cell. An unallocated symbol slot is `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VmRegion {
    pub start: u32,
    pub end: u32,
}

impl VmRegion {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A contiguous virtual-memory area. Invariant: `vm_start <= sbrk <= vm_end`,
/// and VMAs never overlap within one address space.
#[derive(Debug, Clone)]
pub struct VmArea {
    pub id: VmaId,
    pub vm_start: u32,
    pub vm_end: u32,
    pub sbrk: u32,
    /// First-fit free-region list, head first.
    pub free_regions: Vec<VmRegion>,
}

impl VmArea {
    fn new(id: VmaId, vm_start: u32) -> Self {
        Self {
            id,
            vm_start,
            vm_end: vm_start,
            sbrk: vm_start,
            free_regions: Vec::new(),
        }
    }
}

/// The address-space map owned by one process: page table(s), the VMA list,
/// the symbol→region table, and the FIFO page queue used for victim
/// selection by the demand pager (C5).
#[derive(Debug, Clone)]
pub struct Mm {
    /// Leaf page table, indexed by page number. Lazily grown as pages are
    /// mapped; unmapped entries read back as `Pte::empty()`.
    page_table: Vec<Pte>,
    vmas: Vec<VmArea>,
    symrg_table: [VmRegion; MAX_SYMBOL_REGIONS],
    /// Page numbers currently resident in RAM, oldest-in at the front —
    /// the victim for the next eviction.
    pub fifo_pgn: VecDeque<Pgn>,
}

impl Mm {
    /// `init_mm`: one empty VMA with id 0, `vm_start = vm_end = sbrk = 0`,
    /// a zero-length free region, and a zeroed symbol table.
    pub fn init() -> Self {
        let mut vma0 = VmArea::new(0, 0);
        vma0.free_regions.push(VmRegion::new(0, 0));
        Self {
            page_table: Vec::new(),
            vmas: vec![vma0],
            symrg_table: [VmRegion::default(); MAX_SYMBOL_REGIONS],
            fifo_pgn: VecDeque::new(),
        }
    }

    pub fn vmas(&self) -> &[VmArea] {
        &self.vmas
    }

    pub fn get_vma_by_id(&self, id: VmaId) -> Result<&VmArea, MmError> {
        self.vmas
            .iter()
            .find(|v| v.id == id)
            .ok_or(MmError::InvalidVma(id))
    }

    pub fn get_vma_by_id_mut(&mut self, id: VmaId) -> Result<&mut VmArea, MmError> {
        self.vmas
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(MmError::InvalidVma(id))
    }

    pub fn get_symrg_by_id(&self, i: usize) -> Result<VmRegion, MmError> {
        self.symrg_table
            .get(i)
            .copied()
            .ok_or(MmError::InvalidSymbolIndex(i as i64))
    }

    pub(crate) fn set_symrg_by_id(&mut self, i: usize, rg: VmRegion) -> Result<(), MmError> {
        let slot = self
            .symrg_table
            .get_mut(i)
            .ok_or(MmError::InvalidSymbolIndex(i as i64))?;
        *slot = rg;
        Ok(())
    }

    /// Lazily grows the page table to cover `pgn` and returns its current
    /// entry (`Pte::empty()` if never written).
    pub fn pte_get(&mut self, pgn: Pgn) -> Pte {
        let idx = pgn as usize;
        if idx >= self.page_table.len() {
            self.page_table.resize(idx + 1, Pte::empty());
        }
        self.page_table[idx]
    }

    pub fn pte_set_entry(&mut self, pgn: Pgn, raw: Pte) {
        let idx = pgn as usize;
        if idx >= self.page_table.len() {
            self.page_table.resize(idx + 1, Pte::empty());
        }
        self.page_table[idx] = raw;
    }

    pub fn pte_set_fpn(&mut self, pgn: Pgn, fpn: u32) -> Result<(), MmError> {
        let pte = Pte::init_present(fpn)?;
        self.pte_set_entry(pgn, pte);
        Ok(())
    }

    pub fn pte_set_swap(&mut self, pgn: Pgn, swptyp: u32, swpoff: u32) -> Result<(), MmError> {
        let pte = Pte::init_swapped(swptyp, swpoff)?;
        self.pte_set_entry(pgn, pte);
        Ok(())
    }

    /// Splits a virtual address into `(pgn, offset)` using the 22-bit
    /// profile's fixed `PAGE_SIZE`.
    pub fn split_vaddr(vaddr: u32) -> (Pgn, u32) {
        (vaddr / PAGE_SIZE, vaddr % PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_mm_has_one_empty_vma_with_zero_free_region() {
        let mm = Mm::init();
        let vma = mm.get_vma_by_id(0).unwrap();
        assert_eq!(vma.vm_start, 0);
        assert_eq!(vma.vm_end, 0);
        assert_eq!(vma.sbrk, 0);
        assert_eq!(vma.free_regions, vec![VmRegion::new(0, 0)]);
    }

    #[test]
    fn symbol_table_range_checks() {
        let mm = Mm::init();
        assert!(mm.get_symrg_by_id(0).is_ok());
        assert!(mm.get_symrg_by_id(MAX_SYMBOL_REGIONS).is_err());
    }

    #[test]
    fn unmapped_pte_reads_as_empty() {
        let mut mm = Mm::init();
        let pte = mm.pte_get(5);
        assert!(!pte.present());
        assert!(!pte.swapped());
    }

    #[test]
    fn pte_set_fpn_then_get_round_trips() {
        let mut mm = Mm::init();
        mm.pte_set_fpn(2, 7).unwrap();
        let pte = mm.pte_get(2);
        assert!(pte.present());
        assert_eq!(pte.fpn(), 7);
    }

    #[test]
    fn split_vaddr_matches_page_size() {
        let (pgn, off) = Mm::split_vaddr(600);
        assert_eq!(pgn, 600 / PAGE_SIZE);
        assert_eq!(off, 600 % PAGE_SIZE);
    }
}
