//! Dispatch Stage: start ready instructions on free functional units.
//!
//! Entries whose operands are all available (from the forwarding network, a
//! completed ROB entry or the register file) leave their reservation station
//! oldest first, bounded by the number of idle units of each class. A load
//! waits while an older store is still in a reservation station, since that
//! store's address is not yet known.
//!
//! Every started instruction has an idle unit reserved by the budget. Should
//! that ever fail, the instruction is parked and started ahead of the
//! reservation stations on a later cycle.

use crate::common::error::{ExecutionError, Rejected};
use crate::core::pipeline::engine::{Engine, InFlightValues};
use crate::isa::instruction::Instruction;
use crate::isa::opcode::UnitKind;

impl Engine {
    /// Executes the Dispatch stage.
    pub(in crate::core::pipeline) fn dispatch_stage(&mut self) {
        let mut budget = UnitKind::ALL.map(|kind| {
            self.units
                .iter()
                .filter(|u| u.kind() == kind && !u.is_busy())
                .count()
        });
        let parked = std::mem::take(&mut self.deferred);
        for inst in parked {
            let slot = &mut budget[inst.unit_kind().index()];
            if *slot == 0 {
                self.deferred.push_back(inst);
                continue;
            }
            *slot -= 1;
            self.start(inst);
        }
        let oldest_store = self
            .rs
            .entries()
            .iter()
            .filter_map(|e| e.instruction.as_ref())
            .filter(|i| i.opcode.is_store())
            .map(|i| i.id)
            .min();

        let view = InFlightValues {
            rob: &self.rob,
            regs: &self.regs,
        };
        let ready = self
            .rs
            .poll_ready_admitting(&view, &mut self.forwarding, |inst| {
                if inst.opcode.is_load() && oldest_store.is_some_and(|s| s < inst.id) {
                    return false;
                }
                let slot = &mut budget[inst.unit_kind().index()];
                if *slot == 0 {
                    return false;
                }
                *slot -= 1;
                true
            });

        for inst in ready {
            for reg in inst.sources() {
                self.scoreboard.remove_register_read(reg, inst.id);
            }
            self.start(inst);
        }
    }

    fn start(&mut self, inst: Instruction) {
        let kind = inst.unit_kind();
        debug_assert!(
            self.units.iter().any(|u| u.kind() == kind && !u.is_busy()),
            "no idle {kind} unit for {} despite dispatch budget",
            inst.id
        );
        let Some(unit) = self
            .units
            .iter_mut()
            .find(|u| u.kind() == kind && !u.is_busy())
        else {
            tracing::warn!(id = %inst.id, unit = %kind, "no idle unit, dispatch deferred");
            self.deferred.push_back(inst);
            return;
        };

        match unit.execute(inst, &self.regs, &mut self.memory) {
            Ok(_) => {
                self.stats.dispatched += 1;
                if let Some(current) = unit.current() {
                    let cycles = unit.remaining_cycles();
                    if let Err(error) =
                        self.scoreboard
                            .allocate_function_unit(unit.name(), current, cycles)
                    {
                        tracing::warn!(unit = unit.name(), %error, "unit status out of sync");
                    }
                }
            }
            Err(Rejected { instruction, error }) => self.fail(*instruction, error),
        }
    }

    /// Routes an execution error to the instruction's ROB slot, where it is
    /// reported when the instruction reaches the head.
    fn fail(&mut self, inst: Instruction, error: ExecutionError) {
        tracing::warn!(
            cycle = self.cycle,
            id = %inst.id,
            pc = format_args!("{:#x}", inst.pc),
            inst = %inst,
            %error,
            "execution error"
        );
        match inst.rob_id {
            Some(slot) => self.rob.fault(slot, inst, error),
            None => tracing::warn!(id = %inst.id, "failed instruction has no ROB slot"),
        }
    }
}
