//! Engine behaviour across cycles: ownership, recovery and agreement with
//! sequential execution.

use std::collections::{BTreeSet, VecDeque};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sspsim_core::Config;
use sspsim_core::core::pipeline::Engine;
use sspsim_core::isa::{InstId, Instruction, Reg};

use crate::common::builders::{ConfigBuilder, decoded};

const REGS: [&str; 4] = ["$t0", "$t1", "$t2", "$t3"];

#[derive(Clone, Debug)]
enum Op {
    Addi(usize, usize, i16),
    Add(usize, usize, usize),
    Sub(usize, usize, usize),
    Mul(usize, usize, usize),
}

impl Op {
    fn text(&self) -> String {
        match *self {
            Self::Addi(d, s, imm) => format!("ADDI {}, {}, {imm}", REGS[d], REGS[s]),
            Self::Add(d, a, b) => format!("ADD {}, {}, {}", REGS[d], REGS[a], REGS[b]),
            Self::Sub(d, a, b) => format!("SUB {}, {}, {}", REGS[d], REGS[a], REGS[b]),
            Self::Mul(d, a, b) => format!("MUL {}, {}, {}", REGS[d], REGS[a], REGS[b]),
        }
    }

    fn apply(&self, regs: &mut [u64; 4]) {
        match *self {
            Self::Addi(d, s, imm) => regs[d] = regs[s].wrapping_add(i64::from(imm) as u64),
            Self::Add(d, a, b) => regs[d] = regs[a].wrapping_add(regs[b]),
            Self::Sub(d, a, b) => regs[d] = regs[a].wrapping_sub(regs[b]),
            Self::Mul(d, a, b) => {
                regs[d] = (regs[a] as i64).wrapping_mul(regs[b] as i64) as u64;
            }
        }
    }
}

fn op() -> impl Strategy<Value = Op> {
    let r = 0usize..4;
    prop_oneof![
        (r.clone(), r.clone(), any::<i16>()).prop_map(|(d, s, i)| Op::Addi(d, s, i)),
        (r.clone(), r.clone(), r.clone()).prop_map(|(d, a, b)| Op::Add(d, a, b)),
        (r.clone(), r.clone(), r.clone()).prop_map(|(d, a, b)| Op::Sub(d, a, b)),
        (r.clone(), r.clone(), r).prop_map(|(d, a, b)| Op::Mul(d, a, b)),
    ]
}

/// Every instruction id held by the RS, a functional unit or a ROB slot
/// payload, with duplicates kept.
fn holders(engine: &Engine) -> Vec<InstId> {
    let rs = engine
        .reservation_stations()
        .entries()
        .iter()
        .filter_map(|e| e.instruction.as_ref().map(|i| i.id));
    let units = engine.units().iter().filter_map(|u| u.current().map(|i| i.id));
    let rob = engine
        .rob()
        .iter()
        .filter_map(|e| e.instruction.as_ref().map(|i| i.id));
    rs.chain(units).chain(rob).collect()
}

fn run(engine: &mut Engine, queue: &mut VecDeque<Instruction>) {
    for _ in 0..2_000 {
        let _ = engine.tick(queue);
        let held = holders(engine);
        let unique: BTreeSet<InstId> = held.iter().copied().collect();
        assert_eq!(unique.len(), held.len(), "instruction owned twice: {held:?}");
        if queue.is_empty() && engine.is_idle() {
            return;
        }
    }
    panic!("engine did not drain");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Out-of-order execution leaves the same architectural state as
    /// executing the program one instruction at a time.
    #[test]
    fn prop_matches_sequential_execution(
        ops in proptest::collection::vec(op(), 1..24),
        width in 1usize..5,
        alus in 1usize..4,
        forwarding in any::<bool>(),
    ) {
        let config = ConfigBuilder::new()
            .issue_width(width)
            .alus(alus)
            .forwarding(forwarding)
            .build();
        let mut engine = Engine::new(&config).unwrap();
        let mut queue: VecDeque<Instruction> = ops
            .iter()
            .enumerate()
            .map(|(i, op)| decoded(i as u64, &op.text()))
            .collect();

        let mut expected = [0u64; 4];
        for op in &ops {
            op.apply(&mut expected);
        }

        run(&mut engine, &mut queue);
        for (i, name) in REGS.iter().enumerate() {
            prop_assert_eq!(engine.regs().read_register(name).unwrap(), expected[i]);
        }
        prop_assert_eq!(engine.stats().committed, ops.len() as u64);
        for name in REGS {
            let status = engine.scoreboard().register_status(Reg::parse(name).unwrap());
            prop_assert!(!status.busy);
            prop_assert!(status.readers.is_empty());
        }
    }
}

#[test]
fn test_recovery_rebuilds_scoreboard_from_survivors() {
    let mut engine = Engine::new(&ConfigBuilder::new().latency("MUL", 6).build()).unwrap();
    let mut branch = decoded(1, "BEQ $zero, $zero, 3");
    branch.predicted_next = Some(branch.fallthrough());
    let mut queue = VecDeque::from([
        decoded(0, "MUL $t0, $t1, $t2"),
        branch,
        decoded(2, "ADDI $t3, $zero, 1"),
        decoded(3, "ADD $t4, $t3, $t0"),
    ]);

    let mut redirect = None;
    for _ in 0..10 {
        let outcome = engine.tick(&mut queue);
        if outcome.redirect.is_some() {
            redirect = outcome.redirect;
            break;
        }
    }

    assert_eq!(redirect, Some(4 + 4 + 12));
    let sb = engine.scoreboard();
    assert_eq!(sb.writer(Reg::parse("$t0").unwrap()), Some(InstId(0)));
    assert_eq!(sb.writer(Reg::parse("$t3").unwrap()), None);
    assert_eq!(sb.writer(Reg::parse("$t4").unwrap()), None);
    assert!(engine.rob().iter().all(|e| e.inst_id <= InstId(1)));
    assert!(engine.reservation_stations().is_empty());
    assert!(queue.is_empty());
}

#[test]
fn test_default_config_engine_is_idle() {
    let engine = Engine::new(&Config::default()).unwrap();
    assert!(engine.is_idle());
    assert_eq!(engine.units().len(), 4);
    assert_eq!(engine.cycle(), 0);
}
