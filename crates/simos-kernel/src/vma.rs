//! VMA allocator: free-region first-fit and break extension.
//!
//! Extending a VMA's break resolves each newly-mapped page through the same
//! free-frame-or-evict path the demand pager uses, rather than batch-checking
//! RAM up front and failing outright if it runs short. That means an
//! extension that outgrows RAM but not RAM+swap still succeeds, with the
//! overflow pages landing in swap exactly as a page fault would.

use simos_vm::{MemPhy, Pte, PAGE_SIZE};

use crate::error::MmError;
use crate::mm::{Mm, VmRegion};
use crate::pager::pg_getpage;
use crate::types::{Pgn, VmaId};

/// Aligns `size` up to the next multiple of `PAGE_SIZE` (`PAGING_PAGE_ALIGNSZ`).
fn page_align(size: u32) -> u32 {
    size.div_ceil(PAGE_SIZE) * PAGE_SIZE
}

/// First-fit search of `vma.free_regions`. On a hit, the chosen node is
/// mutated in place (shrunk from its low end); if the split leaves it
/// exactly empty, the next node's bounds are spliced into it and that next
/// node is dropped, so a region is always released exactly once.
fn take_free_region(mm: &mut Mm, vma_id: VmaId, size: u32) -> Result<Option<VmRegion>, MmError> {
    let vma = mm.get_vma_by_id_mut(vma_id)?;
    for i in 0..vma.free_regions.len() {
        let node = vma.free_regions[i];
        if node.len() >= size {
            let taken = VmRegion::new(node.start, node.start + size);
            let remainder_start = node.start + size;
            if remainder_start < node.end {
                vma.free_regions[i].start = remainder_start;
            } else if i + 1 < vma.free_regions.len() {
                let next = vma.free_regions.remove(i + 1);
                vma.free_regions[i] = next;
            } else {
                vma.free_regions.remove(i);
            }
            return Ok(Some(taken));
        }
    }
    Ok(None)
}

/// `validate_overlap_vm_area`: extending `vma_id` to `[start, end)` must not
/// intersect any other VMA's `[vm_start, vm_end)`.
fn overlaps_other_vma(mm: &Mm, vma_id: VmaId, start: u32, end: u32) -> bool {
    mm.vmas()
        .iter()
        .any(|v| v.id != vma_id && start < v.vm_end && end > v.vm_start && v.vm_start != v.vm_end)
}

/// `vm_map_ram`: resolves each page number in `[mapstart/PAGE_SIZE,
/// mapstart/PAGE_SIZE+npages)` to a resident frame, mapping it PRESENT and
/// enqueuing it to `fifo_pgn`. Stops at the first page it cannot resolve (no
/// free frame and no swap slot); every page this call itself mapped earlier
/// in the same batch is then unwound — its frame returned, its PTE cleared,
/// its `fifo_pgn` entry dropped — so a failed extension leaves no partial
/// mapping behind, per spec.md §4.4(i).
fn vm_map_ram(
    mm: &mut Mm,
    ram: &mut MemPhy,
    active_swap: &mut MemPhy,
    mapstart: u32,
    npages: u32,
) -> Result<(), MmError> {
    let start_pgn = mapstart / PAGE_SIZE;
    let mut newly_mapped: Vec<(Pgn, u32)> = Vec::new();

    for i in 0..npages {
        match pg_getpage(mm, ram, active_swap, start_pgn + i) {
            Ok(fpn) => newly_mapped.push((start_pgn + i, fpn)),
            Err(e) => {
                unmap_newly_mapped(mm, ram, &newly_mapped);
                return Err(e.into());
            }
        }
    }
    Ok(())
}

/// Undoes every `(pgn, fpn)` this call's `vm_map_ram` resolved: clears the
/// PTE back to unallocated, drops `pgn` from `fifo_pgn`, and returns `fpn`
/// to RAM's free list. Frames and PTEs belonging to pages outside this
/// batch (e.g. a page the pager evicted to make room) are untouched — that
/// eviction already left its own state self-consistent.
fn unmap_newly_mapped(mm: &mut Mm, ram: &mut MemPhy, newly_mapped: &[(Pgn, u32)]) {
    for &(pgn, fpn) in newly_mapped {
        mm.pte_set_entry(pgn, Pte::empty());
        mm.fifo_pgn.retain(|&p| p != pgn);
        ram.put_freefp(fpn);
    }
}

/// `inc_vma_limit`: aligns `size` up to `PAGE_SIZE`, reserves frames for the
/// new pages, and extends `vm_end`/`sbrk` by the aligned amount. Rolls back
/// `vm_end` on any failure (overlap or OOM); `sbrk` is only advanced once
/// mapping succeeds, so it never needs unwinding.
pub fn inc_vma_limit(
    mm: &mut Mm,
    ram: &mut MemPhy,
    active_swap: &mut MemPhy,
    vma_id: VmaId,
    size: u32,
) -> Result<u32, MmError> {
    let inc_amt = page_align(size);
    let npages = inc_amt / PAGE_SIZE;

    let (old_end, sbrk) = {
        let vma = mm.get_vma_by_id(vma_id)?;
        (vma.vm_end, vma.sbrk)
    };
    let new_end = old_end + inc_amt;

    if overlaps_other_vma(mm, vma_id, sbrk, new_end) {
        return Err(MmError::OverlappingVma(vma_id));
    }

    {
        let vma = mm.get_vma_by_id_mut(vma_id)?;
        vma.vm_end = new_end;
    }

    if let Err(e) = vm_map_ram(mm, ram, active_swap, sbrk, npages) {
        let vma = mm.get_vma_by_id_mut(vma_id)?;
        vma.vm_end = old_end;
        return Err(e);
    }

    let vma = mm.get_vma_by_id_mut(vma_id)?;
    vma.sbrk += inc_amt;
    Ok(inc_amt)
}

/// `__alloc`: first-fit from the VMA's free-region list, falling back to
/// `inc_vma_limit` when no free region fits. Writes `symrg_table[reg_index]`
/// and returns the start address only once the allocation fully succeeds.
pub fn alloc(
    mm: &mut Mm,
    ram: &mut MemPhy,
    active_swap: &mut MemPhy,
    vma_id: VmaId,
    reg_index: usize,
    size: u32,
) -> Result<u32, MmError> {
    if let Some(rg) = take_free_region(mm, vma_id, size)? {
        mm.set_symrg_by_id(reg_index, rg)?;
        return Ok(rg.start);
    }

    let vma = mm.get_vma_by_id(vma_id)?;
    let old_sbrk = vma.sbrk;
    inc_vma_limit(mm, ram, active_swap, vma_id, size)?;

    let rg = VmRegion::new(old_sbrk, old_sbrk + size);
    mm.set_symrg_by_id(reg_index, rg)?;
    Ok(old_sbrk)
}

/// `__free`: reads the symbol slot's region, prepends it to the VMA's
/// free-region list, and zeroes the slot. Rejects an already-empty slot with
/// `SymbolNotAllocated` and leaves the free list untouched.
pub fn free(mm: &mut Mm, vma_id: VmaId, reg_index: usize) -> Result<(), MmError> {
    let rg = mm.get_symrg_by_id(reg_index)?;
    if rg.is_empty() {
        return Err(MmError::SymbolNotAllocated(reg_index));
    }

    let vma = mm.get_vma_by_id_mut(vma_id)?;
    vma.free_regions.insert(0, rg);

    mm.set_symrg_by_id(reg_index, VmRegion::default())?;
    Ok(())
}
