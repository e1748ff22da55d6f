//! Statistics rendering and export.

use pretty_assertions::assert_eq;
use rstest::rstest;
use sspsim_core::stats::{STATS_SECTIONS, SimStats};

use crate::common::harness::TestContext;

fn sample() -> SimStats {
    let mut ctx = TestContext::new(
        "ADDI $t0, $zero, 3\nloop: SUBI $t0, $t0, 1\nBNE $t0, $zero, -2\nDIV $t1, $t0, $zero\nSW $t0, 64($zero)\n",
    );
    let _ = ctx.run();
    ctx.stats()
}

#[test]
fn test_all_sections_by_default() {
    let text = sample().render_sections(&[]);
    for header in [
        "sim_ipc",
        "CORE BREAKDOWN",
        "HAZARDS",
        "BRANCH PREDICTION",
        "MEMORY HIERARCHY",
        "FAILED INSTRUCTIONS",
    ] {
        assert!(text.contains(header), "missing {header}");
    }
    assert!(text.contains("unit.ALU0"));
    assert!(text.contains("DIV $t1, $t0, $zero"));
}

#[rstest]
#[case("summary", "sim_cycles", "HAZARDS")]
#[case("core", "CORE BREAKDOWN", "BRANCH PREDICTION")]
#[case("hazards", "hazard.raw", "sim_cycles")]
#[case("branch", "bp.mispredicts", "MEMORY HIERARCHY")]
#[case("memory", "stores.drained", "CORE BREAKDOWN")]
fn test_single_section(#[case] section: &str, #[case] present: &str, #[case] absent: &str) {
    let text = sample().render_sections(&[section.to_string()]);
    assert!(text.contains(present));
    assert!(!text.contains(absent));
}

#[test]
fn test_section_names_are_stable() {
    assert_eq!(
        STATS_SECTIONS,
        &["summary", "core", "hazards", "branch", "memory"]
    );
}

#[test]
fn test_json_export_carries_counters() {
    let stats = sample();
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["instructions_retired"], stats.instructions_retired);
    assert_eq!(json["cycles"], stats.cycles);
    assert_eq!(json["branch"]["committed"], 3);
    assert_eq!(json["memory"]["drained"], 1);
    assert_eq!(json["failed"][0]["opcode"], "DIV");
    assert_eq!(json["failed"][0]["stage"], "execute");
    assert_eq!(json["units"][0]["name"], "ALU0");
    assert!(json["units"][0]["executed"].as_u64().unwrap() > 0);
}

#[test]
fn test_ipc_of_empty_run_is_zero() {
    let stats = SimStats::default();
    assert!(stats.ipc().abs() < f64::EPSILON);
    assert!(stats.core.average_rob_occupancy().abs() < f64::EPSILON);
}
