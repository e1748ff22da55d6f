//! Functional-unit latency and the load/store unit's data port contract.

use std::collections::BTreeMap;

use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use rstest::rstest;
use sspsim_core::common::{ExecutionError, RegisterFile};
use sspsim_core::core::units::FunctionalUnit;
use sspsim_core::isa::opcode::MemWidth;
use sspsim_core::isa::{InstId, Opcode, Status, UnitKind};
use sspsim_core::soc::{AccessOutcome, LoadResult};

use crate::common::builders::inst;
use crate::common::mocks::MockPort;

fn idle_port() -> MockPort {
    let mut port = MockPort::new();
    let _ = port.expect_load().never();
    let _ = port.expect_store().never();
    port
}

#[rstest]
#[case::add(UnitKind::Alu, "ADD $t0, $t1, $t2", 1)]
#[case::mul(UnitKind::Alu, "MUL $t0, $t1, $t2", 3)]
#[case::div(UnitKind::Alu, "DIV $t0, $t1, $t2", 10)]
#[case::branch(UnitKind::Alu, "BEQ $t0, $t1, 4", 1)]
#[case::fadd(UnitKind::Fpu, "FADD $f0, $f1, $f2", 3)]
#[case::fmul(UnitKind::Fpu, "FMUL $f0, $f1, $f2", 5)]
#[case::fdiv(UnitKind::Fpu, "FDIV $f0, $f1, $f2", 15)]
fn test_latency_fidelity(#[case] kind: UnitKind, #[case] text: &str, #[case] latency: u32) {
    let mut regs = RegisterFile::new();
    regs.write_register("$t2", 3).unwrap();
    regs.write_f64(2, 2.0);
    let mut unit = FunctionalUnit::new(kind, 0, BTreeMap::new());
    let mut port = idle_port();

    let _ = unit.execute(inst(1, text), &regs, &mut port).unwrap();
    for cycle in 1..latency {
        assert!(unit.update().is_none(), "completed early at update {cycle}");
        assert!(unit.is_busy());
    }
    let (done, _) = unit.update().unwrap();
    assert_eq!(done.id, InstId(1));
    assert!(!unit.is_busy());
}

#[test]
fn test_configured_latency_override() {
    let overrides = BTreeMap::from([(Opcode::Add, 4)]);
    let mut unit = FunctionalUnit::new(UnitKind::Alu, 1, overrides);
    assert_eq!(unit.name(), "ALU1");
    assert_eq!(unit.latency(Opcode::Add), 4);
    assert_eq!(unit.latency(Opcode::Sub), 1);

    let regs = RegisterFile::new();
    let _ = unit
        .execute(inst(1, "ADD $t0, $t1, $t2"), &regs, &mut idle_port())
        .unwrap();
    assert_eq!(unit.remaining_cycles(), 4);
}

#[test]
fn test_load_goes_through_port_with_miss_penalty() {
    let mut regs = RegisterFile::new();
    regs.write_register("$t1", 0x100).unwrap();
    let mut port = MockPort::new();
    let _ = port
        .expect_load()
        .with(eq(InstId(5)), eq(0x108), eq(MemWidth::Byte))
        .times(1)
        .returning(|_, _, _| {
            Ok(LoadResult {
                value: 0xFF,
                outcome: AccessOutcome::Miss,
                penalty: 10,
            })
        });
    let _ = port.expect_store().never();

    let mut lsu = FunctionalUnit::new(UnitKind::Lsu, 0, BTreeMap::new());
    let value = lsu.execute(inst(5, "LB $t0, 8($t1)"), &regs, &mut port).unwrap();
    assert_eq!(value, u64::MAX);
    assert_eq!(lsu.remaining_cycles(), 2 + 10);
    assert_eq!(lsu.current().map(|i| i.status), Some(Status::MemoryAccess));
}

#[test]
fn test_store_hands_data_to_port() {
    let mut regs = RegisterFile::new();
    regs.write_register("$t0", 0xBEEF).unwrap();
    regs.write_register("$sp", 0x2000).unwrap();
    let mut port = MockPort::new();
    let _ = port
        .expect_store()
        .with(eq(InstId(3)), eq(0x1FFC), eq(MemWidth::Half), eq(0xBEEF))
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let mut lsu = FunctionalUnit::new(UnitKind::Lsu, 0, BTreeMap::new());
    let _ = lsu.execute(inst(3, "SH $t0, -4($sp)"), &regs, &mut port).unwrap();
}

#[test]
fn test_port_error_leaves_unit_idle() {
    let regs = RegisterFile::new();
    let mut port = MockPort::new();
    let _ = port.expect_load().returning(|_, addr, _| {
        Err(ExecutionError::MemoryOutOfBounds {
            address: addr,
            size: 4,
        })
    });

    let mut lsu = FunctionalUnit::new(UnitKind::Lsu, 0, BTreeMap::new());
    let rejected = lsu
        .execute(inst(1, "LW $t0, 64($zero)"), &regs, &mut port)
        .unwrap_err();
    assert_eq!(
        rejected.error,
        ExecutionError::MemoryOutOfBounds {
            address: 64,
            size: 4
        }
    );
    assert!(!lsu.is_busy());
    assert_eq!(lsu.stats().errors, 1);
}

#[test]
fn test_wrong_unit_rejects_opcode() {
    let regs = RegisterFile::new();
    let mut fpu = FunctionalUnit::new(UnitKind::Fpu, 0, BTreeMap::new());
    let rejected = fpu
        .execute(inst(1, "ADD $t0, $t1, $t2"), &regs, &mut idle_port())
        .unwrap_err();
    assert!(matches!(
        rejected.error,
        ExecutionError::UnsupportedOpcode {
            unit: UnitKind::Fpu,
            opcode: Opcode::Add
        }
    ));
    assert_eq!(rejected.instruction.id, InstId(1));
    assert_eq!(rejected.instruction.opcode, Opcode::Add);
    assert_eq!(fpu.stats().errors, 1);
}
