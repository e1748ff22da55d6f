//! Complete Stage: collect functional-unit results.
//!
//! Every unit is advanced one cycle. Finished instructions are handled
//! oldest first: their results go to the forwarding network, the waiting
//! reservation stations and their ROB slots. The oldest mispredicted
//! control-flow instruction among them ends the batch and triggers recovery.

use std::collections::VecDeque;

use crate::core::pipeline::engine::{CycleOutcome, Engine};
use crate::core::pipeline::forwarding::Stage;
use crate::isa::instruction::Instruction;
use crate::isa::opcode::UnitKind;

impl Engine {
    /// Executes the Complete stage.
    pub(in crate::core::pipeline) fn complete_stage(
        &mut self,
        queue: &mut VecDeque<Instruction>,
        outcome: &mut CycleOutcome,
    ) {
        let mut done: Vec<(Instruction, u64)> = Vec::new();
        for unit in &mut self.units {
            if let Some(finished) = unit.update() {
                self.scoreboard.deallocate_function_unit(unit.name());
                done.push(finished);
            }
        }
        if done.is_empty() {
            return;
        }
        done.sort_by_key(|(inst, _)| inst.id);

        // Results younger than a mispredicted branch are on the wrong path.
        let mispredicted = done.iter().position(|(inst, _)| inst.mispredicted());
        if let Some(pos) = mispredicted {
            done.truncate(pos + 1);
        }

        for (inst, _) in &mut done {
            inst.completion_cycle = Some(self.cycle);
            let stage = if inst.unit_kind() == UnitKind::Lsu {
                Stage::Memory
            } else {
                Stage::Execute
            };
            self.forwarding.forward_data(inst, stage);
            tracing::debug!(cycle = self.cycle, id = %inst.id, result = ?inst.result, "complete");
        }
        let _ = self.rs.update(&done);

        let redirect = mispredicted
            .and_then(|_| done.last())
            .and_then(|(branch, _)| Some((branch.id, branch.outcome?.next_pc)));

        for (inst, _) in done {
            self.stats.completed += 1;
            match inst.rob_id {
                Some(slot) => self.rob.complete(slot, inst),
                None => tracing::warn!(id = %inst.id, "completed instruction has no ROB slot"),
            }
        }

        if let Some((branch, next_pc)) = redirect {
            tracing::debug!(id = %branch, next_pc = format_args!("{next_pc:#x}"), "mispredict");
            self.recover(branch, queue);
            outcome.redirect = Some(next_pc);
        }
    }
}
