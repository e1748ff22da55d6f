//! Reservation stations and scoreboard working together at issue time.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sspsim_core::common::RegisterFile;
use sspsim_core::core::pipeline::forwarding::ForwardingUnit;
use sspsim_core::core::pipeline::reservation::{Provenance, ReservationStations, SlotId};
use sspsim_core::core::pipeline::scoreboard::{HazardKind, Scoreboard};
use sspsim_core::isa::{InstId, Reg};

use crate::common::builders::inst;

fn reg(name: &str) -> Reg {
    Reg::parse(name).unwrap()
}

/// Issue order used by the engine: hazards, RS entry, reads, then the write.
fn issue(
    rs: &mut ReservationStations,
    sb: &mut Scoreboard,
    id: u64,
    text: &str,
) -> (SlotId, BTreeSet<HazardKind>) {
    let i = inst(id, text);
    let hazards = sb.check_hazards(&i);
    sb.record_hazards(&hazards);
    let sources = i.sources();
    let dest = i.destination();
    let slot = rs.issue_with(i, &*sb).unwrap();
    for r in sources {
        sb.allocate_register_read(r, InstId(id));
    }
    if let Some(d) = dest {
        sb.allocate_register_write(d, InstId(id));
    }
    (slot, hazards)
}

#[test]
fn test_add_sub_example() {
    let mut rf = RegisterFile::new();
    rf.write_register("$t1", 10).unwrap();
    rf.write_register("$t2", 20).unwrap();
    let mut fwd = ForwardingUnit::default();
    let mut rs = ReservationStations::new(4);
    let mut sb = Scoreboard::new();

    let (add_slot, add_hazards) = issue(&mut rs, &mut sb, 0, "ADD $t0, $t1, $t2");
    let (sub_slot, sub_hazards) = issue(&mut rs, &mut sb, 1, "SUB $t3, $t0, $t4");
    assert_eq!(add_slot, SlotId(0));
    assert_eq!(sub_slot, SlotId(1));
    assert!(!add_hazards.contains(&HazardKind::Raw));
    assert!(sub_hazards.contains(&HazardKind::Raw));

    let ready = rs.poll_ready(&rf, &mut fwd);
    assert_eq!(ready.len(), 1);
    let add = &ready[0];
    assert_eq!(add.id, InstId(0));
    assert_eq!(add.resolved.get(&reg("$t1")), Some(&10));
    assert_eq!(add.resolved.get(&reg("$t2")), Some(&20));

    let sub = rs.entry(SlotId(1)).unwrap();
    let t0 = sub
        .operands
        .iter()
        .find(|s| s.register == Some(reg("$t0")))
        .unwrap();
    assert!(!t0.ready);

    let mut done = add.clone();
    done.result = Some(30);
    assert_eq!(rs.update(&[(done, 30)]), 1);
    let t0 = rs.entry(SlotId(1)).unwrap().operands[0];
    assert_eq!(t0.provenance, Some(Provenance::Broadcast));

    let ready = rs.poll_ready(&rf, &mut fwd);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].id, InstId(1));
    assert_eq!(ready[0].resolved.get(&reg("$t0")), Some(&30));
    assert!(rs.is_empty());
}

#[test]
fn test_rs_entries_cleared_on_release() {
    let rf = RegisterFile::new();
    let mut fwd = ForwardingUnit::default();
    let mut rs = ReservationStations::new(2);
    let _ = rs.issue(inst(0, "ADDI $t0, $zero, 1")).unwrap();
    let _ = rs.poll_ready(&rf, &mut fwd);
    let entry = rs.entry(SlotId(0)).unwrap();
    assert!(!entry.busy);
    assert!(entry.instruction.is_none());
    assert!(entry.operands.is_empty());
}

proptest! {
    /// A reader issued after a live writer sees RAW until that writer's
    /// ownership is released, and never afterwards.
    #[test]
    fn prop_hazard_soundness(writer in 1u8..32, other in 1u8..32, extra_reads in 0usize..3) {
        let mut sb = Scoreboard::new();
        let w = Reg::Int(writer);
        let producer = InstId(1);
        sb.allocate_register_write(w, producer);

        let consumer = inst(2, &format!("ADD $t9, {w}, $zero"));
        for _ in 0..extra_reads {
            prop_assert!(sb.check_hazards(&consumer).contains(&HazardKind::Raw));
        }
        prop_assert!(sb.check_hazards(&consumer).contains(&HazardKind::Raw));

        // Releasing a different register leaves the hazard in place.
        if other != writer {
            sb.deallocate_register(Reg::Int(other));
            prop_assert!(sb.check_hazards(&consumer).contains(&HazardKind::Raw));
        }

        sb.deallocate_register_if(w, producer);
        prop_assert!(!sb.check_hazards(&consumer).contains(&HazardKind::Raw));
    }

    /// No instruction is ever held by two reservation stations.
    #[test]
    fn prop_at_most_one_issue(count in 1usize..12, capacity in 1usize..6) {
        let mut rs = ReservationStations::new(capacity);
        let mut accepted = Vec::new();
        for id in 0..count as u64 {
            if rs.issue(inst(id, "NOP")).is_ok() {
                accepted.push(id);
            }
        }
        prop_assert_eq!(accepted.len(), count.min(capacity));
        let held: Vec<u64> = rs
            .entries()
            .iter()
            .filter_map(|e| e.instruction.as_ref().map(|i| i.id.0))
            .collect();
        let unique: BTreeSet<u64> = held.iter().copied().collect();
        prop_assert_eq!(unique.len(), held.len());
    }
}
