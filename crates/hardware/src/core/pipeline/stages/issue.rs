//! Issue Stage: move decoded instructions into the out-of-order core.
//!
//! Up to `issue_width` instructions leave the front of the fetch queue in
//! program order. Each one takes a ROB slot and a reservation station entry,
//! records which in-flight instructions produce its operands, and claims its
//! destination in the scoreboard. Issue stops at the first instruction that
//! cannot proceed, so younger instructions never pass it. A WAW stall is
//! counted every cycle in the engine stalls but only once per instruction in
//! the scoreboard hazard counts.

use std::collections::{BTreeSet, VecDeque};

use crate::core::pipeline::engine::Engine;
use crate::core::pipeline::scoreboard::HazardKind;
use crate::isa::instruction::Instruction;

impl Engine {
    /// Executes the Issue stage.
    pub(in crate::core::pipeline) fn issue_stage(&mut self, queue: &mut VecDeque<Instruction>) {
        for _ in 0..self.issue_width {
            let Some(next) = queue.front() else {
                break;
            };

            let hazards = self.scoreboard.check_hazards(next);
            if hazards.contains(&HazardKind::Waw) {
                self.stats.stalls.waw += 1;
                if self.waw_noted != Some(next.id) {
                    self.scoreboard.record_hazards(&BTreeSet::from([HazardKind::Waw]));
                    self.waw_noted = Some(next.id);
                }
                tracing::trace!(id = %next.id, "issue stall: WAW");
                break;
            }
            if self.rob.is_full() {
                self.stats.stalls.rob_full += 1;
                break;
            }
            if self.rs.is_full() {
                self.stats.stalls.rs_full += 1;
                break;
            }
            if next.opcode.is_store() && self.memory.store_buffer().is_full() {
                self.stats.stalls.store_buffer_full += 1;
                break;
            }

            let Some(mut inst) = queue.pop_front() else {
                break;
            };
            let slot = match self.rob.allocate(&inst) {
                Ok(slot) => slot,
                Err(error) => {
                    tracing::warn!(id = %inst.id, %error, "rob allocation failed");
                    queue.push_front(inst);
                    break;
                }
            };
            inst.rob_id = Some(slot);

            let id = inst.id;
            let sources = inst.sources();
            let destination = inst.destination();
            let store_width = inst.opcode.width().filter(|_| inst.opcode.is_store());

            if let Err(rejected) = self.rs.issue_with(inst, &self.scoreboard) {
                let _ = self.rob.flush(slot);
                let mut inst = *rejected.instruction;
                inst.rob_id = None;
                queue.push_front(inst);
                break;
            }
            if let Some(width) = store_width {
                let _ = self.memory.allocate_store(id, width);
            }

            self.scoreboard.record_hazards(&hazards);
            for reg in sources {
                self.scoreboard.allocate_register_read(reg, id);
            }
            if let Some(dest) = destination {
                self.scoreboard.allocate_register_write(dest, id);
            }
            self.stats.issued += 1;
        }
    }
}
