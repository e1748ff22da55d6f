//! Reorder buffer capacity, commit order and flush.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sspsim_core::common::{CapacityError, RegisterFile};
use sspsim_core::core::pipeline::rob::{ReorderBuffer, RobId};
use sspsim_core::isa::InstId;

use crate::common::builders::inst;

#[test]
fn test_capacity_two_example() {
    let mut rob = ReorderBuffer::new(2);
    let mut regs = RegisterFile::new();
    let first = rob.allocate(&inst(0, "ADDI $t0, $zero, 1")).unwrap();
    let _ = rob.allocate(&inst(1, "ADDI $t1, $zero, 2")).unwrap();
    let third = inst(2, "ADDI $t2, $zero, 3");

    assert_eq!(rob.allocate(&third), Err(CapacityError::ReorderBufferFull));
    rob.mark_ready(first, Some(1));
    assert_eq!(rob.allocate(&third), Err(CapacityError::ReorderBufferFull));

    let retired = rob.commit(&mut regs);
    assert_eq!(retired.len(), 1);
    assert_eq!(regs.read_register("$t0").unwrap(), 1);
    assert!(rob.allocate(&third).is_ok());
}

proptest! {
    /// Whatever order results arrive in, commit yields a prefix of the
    /// allocation order.
    #[test]
    fn prop_commit_monotonicity(
        size in 1usize..10,
        ready in proptest::collection::vec(any::<bool>(), 10),
    ) {
        let mut rob = ReorderBuffer::new(size);
        let mut regs = RegisterFile::new();
        let ids: Vec<RobId> = (0..size as u64)
            .map(|i| rob.allocate(&inst(i, "NOP")).unwrap())
            .collect();
        for (slot, &r) in ids.iter().zip(&ready) {
            if r {
                rob.mark_ready(*slot, None);
            }
        }
        let retired: Vec<u64> = rob.commit(&mut regs).iter().map(|e| e.inst_id.0).collect();
        let expected = ready.iter().take(size).take_while(|&&r| r).count();
        prop_assert_eq!(retired, (0..expected as u64).collect::<Vec<_>>());
    }

    /// After `flush(k)`, only the entries strictly before `k` remain.
    #[test]
    fn prop_flush_completeness(
        capacity in 1usize..12,
        warmup in 0usize..12,
        live in 1usize..12,
        pick in 0usize..12,
    ) {
        let live = live.min(capacity);
        let mut rob = ReorderBuffer::new(capacity);
        let mut regs = RegisterFile::new();
        let mut next = 0u64;

        // Rotate head around the ring.
        for _ in 0..warmup {
            let slot = rob.allocate(&inst(next, "NOP")).unwrap();
            next += 1;
            rob.mark_ready(slot, None);
            let _ = rob.commit(&mut regs);
        }
        let slots: Vec<RobId> = (0..live)
            .map(|_| {
                let slot = rob.allocate(&inst(next, "NOP")).unwrap();
                next += 1;
                slot
            })
            .collect();

        let k = pick % live;
        let cleared = rob.flush(slots[k]);
        prop_assert_eq!(cleared.len(), live - k);
        prop_assert_eq!(rob.len(), k);
        for slot in &slots[k..] {
            prop_assert!(rob.get(*slot).is_none());
        }
        for slot in &slots[..k] {
            prop_assert!(rob.get(*slot).is_some());
        }
        prop_assert!(rob.iter().all(|e| e.inst_id < InstId(next - (live - k) as u64)));
    }
}
