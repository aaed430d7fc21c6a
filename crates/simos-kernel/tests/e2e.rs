//! Black-box end-to-end scenarios from spec.md §8 (E1-E4), driven entirely
//! through the public `mm`/`vma`/`pager` API rather than any crate-internal
//! helper, the way a user of this crate would exercise it.

use simos_kernel::mm::Mm;
use simos_kernel::pager::{pg_getval, pg_setval};
use simos_kernel::vma::alloc;
use simos_vm::{MemPhy, PAGE_SIZE};

fn new_space(ram_frames: u32, swap_frames: u32) -> (Mm, MemPhy, MemPhy) {
    (
        Mm::init(),
        MemPhy::new(PAGE_SIZE * ram_frames, true),
        MemPhy::new(PAGE_SIZE * swap_frames, true),
    )
}

#[test]
fn e1_simple_alloc_read_write_within_one_page() {
    let (mut mm, mut ram, mut swap) = new_space(4, 4);

    alloc(&mut mm, &mut ram, &mut swap, 0, 0, 10).unwrap();
    pg_setval(&mut mm, &mut ram, &mut swap, 3, 0x41).unwrap();

    assert_eq!(pg_getval(&mut mm, &mut ram, &mut swap, 3).unwrap(), 0x41);
    assert_eq!(pg_getval(&mut mm, &mut ram, &mut swap, 4).unwrap(), 0x00);
}

#[test]
fn e2_page_fault_to_free_frame_with_overflow_into_swap() {
    let (mut mm, mut ram, mut swap) = new_space(2, 64);

    // 700 bytes spans 3 pages of 256 bytes; only 2 RAM frames exist.
    alloc(&mut mm, &mut ram, &mut swap, 0, 0, 700).unwrap();
    assert_eq!(ram.used_frame_count(), 2);
    assert_eq!(swap.used_frame_count(), 1);
    assert_eq!(mm.fifo_pgn.len(), 2);

    // Byte 600 lives on the third (swapped) page; reading it faults the
    // page back in, evicting whichever page is currently FIFO-oldest.
    let byte = pg_getval(&mut mm, &mut ram, &mut swap, 600).unwrap();
    assert_eq!(byte, 0);
    assert_eq!(mm.fifo_pgn.len(), 2);
    assert_eq!(swap.used_frame_count(), 1);
}

#[test]
fn e3_eviction_then_re_in_preserves_written_data() {
    let (mut mm, mut ram, mut swap) = new_space(2, 64);

    alloc(&mut mm, &mut ram, &mut swap, 0, 0, 700).unwrap();
    pg_setval(&mut mm, &mut ram, &mut swap, 0, 0xAB).unwrap();

    // Faulting in page 2 (offset 600) evicts page 0's frame to swap.
    pg_getval(&mut mm, &mut ram, &mut swap, 600).unwrap();

    // Reading offset 0 again swaps page 0 back in and must still read 0xAB.
    let byte = pg_getval(&mut mm, &mut ram, &mut swap, 0).unwrap();
    assert_eq!(byte, 0xAB);
}

#[test]
fn e4_oom_surfaces_without_mutating_vma_bounds() {
    let (mut mm, mut ram, mut swap) = new_space(1, 0);

    let before = mm.get_vma_by_id(0).unwrap().clone();
    let result = alloc(&mut mm, &mut ram, &mut swap, 0, 0, 512);
    assert!(result.is_err());

    let after = mm.get_vma_by_id(0).unwrap();
    assert_eq!(before.vm_start, after.vm_start);
    assert_eq!(before.vm_end, after.vm_end);
    assert_eq!(before.sbrk, after.sbrk);

    // The one RAM frame page 0 grabbed before page 1 failed must come back,
    // not stay leaked outside the rolled-back [vm_start, sbrk) range.
    assert_eq!(ram.used_frame_count(), 0);
    assert!(mm.fifo_pgn.is_empty());
}
