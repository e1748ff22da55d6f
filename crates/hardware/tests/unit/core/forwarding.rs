//! Bypass network freshness and priority.

use proptest::prelude::*;
use sspsim_core::core::pipeline::forwarding::{ForwardingUnit, Stage};
use sspsim_core::isa::Reg;

use crate::common::builders::{inst, produced};

#[test]
fn test_disabled_network_forwards_nothing() {
    let mut fwd = ForwardingUnit::default();
    fwd.forward_data(&produced(1, "ADDI $t0, $zero, 5", 5), Stage::Execute);
    assert_eq!(fwd.get_forwarded_data(&inst(2, "ADD $t1, $t0, $t0"), Stage::Issue), None);
}

proptest! {
    /// A value forwarded in cycle N and not re-forwarded is gone in N+1,
    /// while the bounded history still records it.
    #[test]
    fn prop_forwarding_freshness(value in any::<u64>(), dest in 1u8..32, idle_cycles in 1usize..4) {
        let r = Reg::Int(dest);
        let mut fwd = ForwardingUnit::with_default_paths();
        let producer = produced(1, &format!("ADDI {r}, $zero, 0"), value);
        let consumer = inst(2, &format!("ADD $zero, {r}, {r}"));

        fwd.forward_data(&producer, Stage::Execute);
        let now = fwd.get_forwarded_data(&consumer, Stage::Issue);
        prop_assert_eq!(now.and_then(|m| m.get(&r).copied()), Some(value));

        for _ in 0..idle_cycles {
            fwd.clear_cycle_data();
            prop_assert_eq!(fwd.get_forwarded_data(&consumer, Stage::Issue), None);
        }
        prop_assert_eq!(fwd.latest(r).map(|fv| fv.value), Some(value));
    }
}
