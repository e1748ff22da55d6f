//! Programs run end to end through fetch, the engine and the memory system.

use pretty_assertions::assert_eq;
use rstest::rstest;
use sspsim_core::config::PredictorKind;
use sspsim_core::sim::StopReason;

use crate::common::builders::ConfigBuilder;
use crate::common::harness::TestContext;

const SUM_LOOP: &str = "\
    ADDI $t0, $zero, 10
    ADDI $t1, $zero, 0
loop:
    ADD  $t1, $t1, $t0
    SUBI $t0, $t0, 1
    BNE  $t0, $zero, -3
";

#[test]
fn test_initial_registers_flow_into_program() {
    let mut ctx = TestContext::new("ADD $t2, $t0, $t1\nSUB $t3, $t2, $t0\n")
        .set_reg("$t0", 3)
        .set_reg("$t1", 4);
    let summary = ctx.run();
    assert_eq!(summary.reason, StopReason::Completed);
    assert_eq!(summary.retired, 2);
    assert_eq!(ctx.reg("$t2"), 7);
    assert_eq!(ctx.reg("$t3"), 4);
}

#[rstest]
#[case::always_taken(PredictorKind::AlwaysTaken)]
#[case::bimodal(PredictorKind::Bimodal)]
#[case::gshare(PredictorKind::Gshare)]
fn test_loop_result_is_independent_of_predictor(#[case] kind: PredictorKind) {
    let config = ConfigBuilder::new().predictor(kind).build();
    let mut ctx = TestContext::with_config(SUM_LOOP, &config);
    assert_eq!(ctx.run().reason, StopReason::Completed);
    assert_eq!(ctx.reg("$t1"), 55);
    assert_eq!(ctx.reg("$t0"), 0);

    let stats = ctx.stats();
    assert_eq!(stats.instructions_retired, 2 + 3 * 10);
    assert_eq!(stats.branch.committed, 10);
    assert!(stats.branch.mispredictions >= 1);
    assert!(stats.core.recoveries >= 1);
    assert!(stats.failed.is_empty());
}

#[test]
fn test_forwarding_changes_timing_not_results() {
    let chain = "\
ADDI $t0, $zero, 1
ADD  $t1, $t0, $t0
ADD  $t2, $t1, $t1
ADD  $t3, $t2, $t2
MUL  $t4, $t3, $t3
";
    let mut on = TestContext::with_config(chain, &ConfigBuilder::new().forwarding(true).build());
    let mut off = TestContext::with_config(chain, &ConfigBuilder::new().forwarding(false).build());
    let _ = on.run();
    let _ = off.run();

    for reg in ["$t0", "$t1", "$t2", "$t3", "$t4"] {
        assert_eq!(on.reg(reg), off.reg(reg), "{reg}");
    }
    assert_eq!(on.reg("$t4"), 64);
    assert_eq!(on.stats().instructions_retired, off.stats().instructions_retired);
    assert_eq!(off.stats().forwarding.hits, 0);
    assert!(on.stats().forwarding.published > 0);
}

#[test]
fn test_call_and_return() {
    let source = "\
    ADDI $a0, $zero, 5
    JAL  16
    ADDI $t1, $v0, 0
    J    28
double:
    ADD  $v0, $a0, $a0
    JR   $ra
    NOP
    ADDI $t2, $zero, 1
";
    let mut ctx = TestContext::new(source);
    assert_eq!(ctx.run().reason, StopReason::Completed);
    assert_eq!(ctx.reg("$v0"), 10);
    assert_eq!(ctx.reg("$t1"), 10);
    assert_eq!(ctx.reg("$ra"), 8);
    assert_eq!(ctx.reg("$t2"), 1);
    assert_eq!(ctx.stats().instructions_retired, 7);
}

#[test]
fn test_loads_and_stores_by_width() {
    let source = "\
ADDI $t0, $zero, 100
ADDI $t1, $zero, 256
ADDI $t4, $zero, -1
SW   $t0, 0($t1)
LW   $t2, 0($t1)
SB   $t0, 8($t1)
LB   $t3, 8($t1)
SH   $t4, 16($t1)
LH   $t5, 16($t1)
LW   $t6, 16($t1)
";
    let mut ctx = TestContext::new(source);
    assert_eq!(ctx.run().reason, StopReason::Completed);
    assert_eq!(ctx.reg("$t2"), 100);
    assert_eq!(ctx.reg("$t3"), 100);
    assert_eq!(ctx.reg("$t5"), u64::MAX);
    assert_eq!(ctx.reg("$t6"), 0xffff);

    let stats = ctx.stats();
    assert_eq!(stats.memory.stores, 3);
    assert_eq!(stats.memory.loads, 4);
    assert_eq!(stats.memory.drained, 3);
    assert!(stats.failed.is_empty());
}

#[test]
fn test_out_of_bounds_load_is_reported_and_skipped() {
    let source = "\
ADDI $t0, $zero, 7
LW   $t1, 0x7ffffff0($zero)
ADDI $t2, $t0, 1
";
    let mut ctx = TestContext::new(source);
    assert_eq!(ctx.run().reason, StopReason::Completed);
    assert_eq!(ctx.reg("$t1"), 0);
    assert_eq!(ctx.reg("$t2"), 8);

    let stats = ctx.stats();
    assert_eq!(stats.failed.len(), 1);
    assert_eq!(stats.failed[0].opcode, "LW");
    assert_eq!(stats.failed[0].stage, "memory");
    assert_eq!(stats.instructions_retired, 2);
}

#[test]
fn test_infinite_loop_stops_at_cycle_limit() {
    let config = ConfigBuilder::new().max_cycles(200).build();
    let mut ctx = TestContext::with_config("top: ADDI $t0, $t0, 1\nJ 0\n", &config);
    let summary = ctx.run();
    assert_eq!(summary.reason, StopReason::CycleLimit);
    assert_eq!(summary.cycles, 200);
    assert!(ctx.reg("$t0") > 0);
}

#[test]
fn test_wider_machine_finishes_sooner() {
    let source: String = ["$t0", "$t1", "$t2", "$t3", "$t4", "$t5", "$t6", "$t7"]
        .iter()
        .enumerate()
        .map(|(i, r)| format!("ADDI {r}, $zero, {i}\n"))
        .collect();
    let narrow = ConfigBuilder::new().issue_width(1).alus(1).build();
    let wide = ConfigBuilder::new().issue_width(4).alus(4).build();

    let mut slow = TestContext::with_config(&source, &narrow);
    let mut fast = TestContext::with_config(&source, &wide);
    let slow_cycles = slow.run().cycles;
    let fast_cycles = fast.run().cycles;

    assert!(fast_cycles < slow_cycles, "{fast_cycles} !< {slow_cycles}");
    assert!(fast.stats().ipc() > slow.stats().ipc());
    assert_eq!(fast.reg("$t7"), 7);
}

#[test]
fn test_empty_program_completes_immediately() {
    let mut ctx = TestContext::new("# nothing\n.text\n");
    let summary = ctx.run();
    assert_eq!(summary.reason, StopReason::Completed);
    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.retired, 0);
}
