//! Demand pager: resolves page numbers to resident frames, performing FIFO
//! victim selection and swap copies as needed. The oldest-resident page is
//! always the one evicted, and the page that just faulted in is always
//! pushed to the tail, so occupancy strictly rotates oldest-first.

use simos_vm::{swap_cp, MemPhy, Pte};

use crate::error::PagerError;
use crate::mm::Mm;
use crate::types::Pgn;

/// Pops the FIFO head — the oldest-resident page — as the next victim.
fn find_victim_page(mm: &mut Mm) -> Option<Pgn> {
    mm.fifo_pgn.pop_front()
}

/// Resolves `pgn` to a resident frame number, faulting it in from swap or
/// evicting a victim if needed. `active_swap` is the swap device used both
/// for reading an already-swapped page in and for writing a victim out.
pub fn pg_getpage(
    mm: &mut Mm,
    ram: &mut MemPhy,
    active_swap: &mut MemPhy,
    pgn: Pgn,
) -> Result<u32, PagerError> {
    let pte = mm.pte_get(pgn);

    if pte.present() {
        return Ok(pte.fpn());
    }

    if !pte.swapped() {
        // Unallocated or never-faulted: try a free frame first.
        if let Ok(fpn) = ram.get_freefp() {
            mm.pte_set_fpn(pgn, fpn)?;
            mm.fifo_pgn.push_back(pgn);
            return Ok(fpn);
        }
    } else {
        // Already swapped out: bring it straight in if RAM has room.
        if let Ok(fpn) = ram.get_freefp() {
            let swpoff = pte.swpoff();
            swap_cp(active_swap, swpoff, ram, fpn)?;
            active_swap.put_freefp(swpoff);
            mm.pte_set_fpn(pgn, fpn)?;
            mm.fifo_pgn.push_back(pgn);
            return Ok(fpn);
        }
    }

    // No free frame: evict the FIFO head to make room.
    let vicpgn = find_victim_page(mm).ok_or(PagerError::OutOfMemory)?;
    let vicpte = mm.pte_get(vicpgn);
    let vicfpn = vicpte.fpn();

    let swpfpn = match active_swap.get_freefp() {
        Ok(f) => f,
        Err(_) => {
            // Roll back: the victim stays resident, re-enqueue it.
            mm.fifo_pgn.push_front(vicpgn);
            return Err(PagerError::NoFreeSwapSlot);
        }
    };

    swap_cp(ram, vicfpn, active_swap, swpfpn)?;
    mm.pte_set_swap(vicpgn, 0, swpfpn)?;

    if pte.swapped() {
        let tgt_swpoff = pte.swpoff();
        swap_cp(active_swap, tgt_swpoff, ram, vicfpn)?;
        active_swap.put_freefp(tgt_swpoff);
    }

    mm.pte_set_fpn(pgn, vicfpn)?;
    mm.fifo_pgn.push_back(pgn);
    Ok(vicfpn)
}

/// `pg_getval`: splits `vaddr` into `(pgn, offset)`, resolves to a frame via
/// [`pg_getpage`], and reads one byte from RAM.
pub fn pg_getval(
    mm: &mut Mm,
    ram: &mut MemPhy,
    active_swap: &mut MemPhy,
    vaddr: u32,
) -> Result<u8, PagerError> {
    let (pgn, offset) = Mm::split_vaddr(vaddr);
    let fpn = pg_getpage(mm, ram, active_swap, pgn)?;
    Ok(ram.read(fpn * simos_vm::PAGE_SIZE + offset)?)
}

/// `pg_setval`: splits `vaddr` into `(pgn, offset)`, resolves to a frame via
/// [`pg_getpage`], and writes one byte into RAM.
pub fn pg_setval(
    mm: &mut Mm,
    ram: &mut MemPhy,
    active_swap: &mut MemPhy,
    vaddr: u32,
    byte: u8,
) -> Result<(), PagerError> {
    let (pgn, offset) = Mm::split_vaddr(vaddr);
    let fpn = pg_getpage(mm, ram, active_swap, pgn)?;
    ram.write(fpn * simos_vm::PAGE_SIZE + offset, byte)?;
    Ok(())
}

/// Exposes the raw PTE for a page, for trace dumps.
pub fn pte_snapshot(mm: &mut Mm, pgn: Pgn) -> Pte {
    mm.pte_get(pgn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vma::alloc;
    use simos_vm::PAGE_SIZE;

    fn setup(ram_frames: u32, swap_frames: u32) -> (Mm, MemPhy, MemPhy) {
        (
            Mm::init(),
            MemPhy::new(PAGE_SIZE * ram_frames, true),
            MemPhy::new(PAGE_SIZE * swap_frames, true),
        )
    }

    #[test]
    fn e1_alloc_read_write_within_one_page() {
        let (mut mm, mut ram, mut swap) = setup(4, 4);
        alloc(&mut mm, &mut ram, &mut swap, 0, 0, 10).unwrap();
        pg_setval(&mut mm, &mut ram, &mut swap, 3, 0x41).unwrap();
        assert_eq!(pg_getval(&mut mm, &mut ram, &mut swap, 3).unwrap(), 0x41);
        assert_eq!(pg_getval(&mut mm, &mut ram, &mut swap, 4).unwrap(), 0x00);
    }

    #[test]
    fn e2_page_fault_to_free_frame_then_eviction() {
        let (mut mm, mut ram, mut swap) = setup(2, 64);
        alloc(&mut mm, &mut ram, &mut swap, 0, 0, 700).unwrap();
        assert_eq!(ram.free_frame_count(), 0);
        assert_eq!(mm.fifo_pgn.len(), 2);

        let byte = pg_getval(&mut mm, &mut ram, &mut swap, 600).unwrap();
        assert_eq!(byte, 0);
        assert_eq!(mm.fifo_pgn.len(), 2);
        assert_eq!(swap.used_frame_count(), 1);
    }

    #[test]
    fn e3_eviction_then_rein_preserves_data() {
        let (mut mm, mut ram, mut swap) = setup(2, 64);
        alloc(&mut mm, &mut ram, &mut swap, 0, 0, 700).unwrap();
        pg_setval(&mut mm, &mut ram, &mut swap, 0, 0xAB).unwrap();
        pg_getval(&mut mm, &mut ram, &mut swap, 600).unwrap();
        // page 0 may now be the swapped-out victim; reading it should
        // swap it back in and still yield the written byte.
        let byte = pg_getval(&mut mm, &mut ram, &mut swap, 0).unwrap();
        assert_eq!(byte, 0xAB);
    }

    #[test]
    fn e4_oom_surfaces_from_inc_vma_limit_with_no_frame_and_no_swap() {
        let (mut mm, mut ram, mut swap) = setup(1, 0);
        let before = mm.get_vma_by_id(0).unwrap().clone();
        let err = alloc(&mut mm, &mut ram, &mut swap, 0, 0, 512);
        assert!(err.is_err());
        let after = mm.get_vma_by_id(0).unwrap();
        assert_eq!(before.vm_end, after.vm_end);
        assert_eq!(before.sbrk, after.sbrk);

        // Page 0 was mapped PRESENT before page 1's fault failed the whole
        // extension; its PTE must be unwound back to unallocated, not left
        // dangling as a resident page outside the rolled-back VMA.
        assert!(!pte_snapshot(&mut mm, 0).present());
        assert_eq!(ram.used_frame_count(), 0);
    }
}
