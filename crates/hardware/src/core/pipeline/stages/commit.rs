//! Commit Stage: retire instructions from ROB head.
//!
//! This stage retires the oldest instruction(s) from the ROB in program order:
//! 1. Write results to the register file (done by the ROB).
//! 2. Release scoreboard ownership held by the retiring instruction.
//! 3. Mark store buffer entries as committed and drain one store to memory.
//! 4. Publish results on the writeback forwarding path.
//! 5. Train the branch predictor.
//! 6. Report a faulted head and recover.

use std::collections::VecDeque;

use crate::core::pipeline::engine::{CycleOutcome, Engine};
use crate::core::pipeline::forwarding::Stage;
use crate::isa::instruction::Instruction;
use crate::stats::FailedInstruction;

impl Engine {
    /// Executes the Commit stage.
    pub(in crate::core::pipeline) fn commit_stage(
        &mut self,
        queue: &mut VecDeque<Instruction>,
        outcome: &mut CycleOutcome,
    ) {
        let retired = self.rob.commit_limited(&mut self.regs, self.commit_width);
        for entry in &retired {
            if let Some(dest) = entry.destination {
                self.scoreboard.deallocate_register_if(dest, entry.inst_id);
            }
            let Some(inst) = entry.instruction.as_ref() else {
                continue;
            };
            if inst.opcode.is_store() {
                self.memory.commit_store(inst.id);
            }
            self.forwarding.forward_data(inst, Stage::Writeback);
            if let Some(resolved) = inst.outcome {
                self.branch.update(inst, resolved.taken);
            }
            if self.trace_commits {
                tracing::info!(
                    cycle = self.cycle,
                    id = %inst.id,
                    pc = format_args!("{:#x}", inst.pc),
                    inst = %inst,
                    result = ?inst.result,
                    "commit"
                );
            } else {
                tracing::debug!(cycle = self.cycle, id = %inst.id, inst = %inst, "commit");
            }
        }
        outcome.retired = retired.len();
        self.stats.committed += retired.len() as u64;

        if let Err(error) = self.memory.drain_one() {
            tracing::warn!(%error, "committed store dropped");
        }

        let Some(faulted) = self.rob.take_exception() else {
            return;
        };
        let error = faulted
            .exception
            .as_ref()
            .map_or_else(String::new, ToString::to_string);
        let (opcode, operands, stage) = faulted.instruction.as_ref().map_or_else(
            || (String::new(), String::new(), "execute"),
            |inst| {
                let operands: Vec<String> = inst.operands.iter().map(ToString::to_string).collect();
                let stage = if inst.opcode.width().is_some() {
                    "memory"
                } else {
                    "execute"
                };
                (inst.opcode.to_string(), operands.join(", "), stage)
            },
        );
        tracing::warn!(
            cycle = self.cycle,
            id = %faulted.inst_id,
            pc = format_args!("{:#x}", faulted.pc),
            %error,
            "instruction failed"
        );
        self.failed.push(FailedInstruction {
            id: faulted.inst_id.0,
            pc: faulted.pc,
            opcode,
            operands,
            stage: stage.to_string(),
            cycle: self.cycle,
            error,
        });
        self.stats.failed += 1;

        if let Some(dest) = faulted.destination {
            self.scoreboard.deallocate_register_if(dest, faulted.inst_id);
        }
        self.recover(faulted.inst_id, queue);
        self.memory.squash_uncommitted();
        outcome.redirect = Some(faulted.pc.wrapping_add(4));
    }
}
