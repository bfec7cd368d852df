use itertools::Itertools;

use crate::{InstructionKind, LocalValue, Snippet};

/// The empty dependency list shared by operands with no producer
const NO_READS: &[usize] = &[];

/// The last writer of a data operand's local, if the operand is a local
/// that has been written at all.
fn data_producer(
    data: LocalValue,
    local_written_at: &[Option<usize>],
) -> Option<usize> {
    match data {
        LocalValue::Local(local_id) => local_written_at[local_id],
        LocalValue::Literal(_) => None,
    }
}

impl Snippet {
    /// Computes the dependency tables that drive lazy evaluation.
    ///
    /// Walking the program in order with the last writer of every local at
    /// hand, this records for each instruction the producing instruction of
    /// each non-literal operand (`None` where the local was never written,
    /// so the default zero is read) and the sorted set of read instructions
    /// the instruction transitively depends on.  Reads depend exactly on
    /// themselves; everything else merges its producers' read sets.
    ///
    /// Runs once before the first execution.  Recomputing is idempotent:
    /// the tables are rebuilt from the program alone.
    pub fn run_preexecution_analysis(&mut self) {
        let count = self.instructions.len();
        let mut local_written_at: Vec<Option<usize>> =
            vec![None; self.locals.len()];
        self.argument_deps = vec![Vec::new(); count];
        self.trans_read_deps = vec![Vec::new(); count];
        self.instr_to_action = vec![None; count];
        for (slot, &instr) in self.actions.iter().enumerate() {
            self.instr_to_action[instr] = Some(slot);
        }

        for i in 0..count {
            match self.instructions[i].kind {
                InstructionKind::Arithmetic {
                    target, op0, op1, ..
                } => {
                    let mut producers = Vec::new();
                    for operand in [op0, op1] {
                        if let LocalValue::Local(local_id) = operand {
                            producers.push(local_written_at[local_id]);
                        }
                    }
                    let merged = self.merged_read_deps(
                        producers.first().copied().flatten(),
                        producers.get(1).copied().flatten(),
                    );
                    self.trans_read_deps[i] = merged;
                    self.argument_deps[i] = producers;
                    local_written_at[target] = Some(i);
                }
                InstructionKind::Move { target, data } => {
                    let producer = data_producer(data, &local_written_at);
                    self.record_single_operand(i, data, producer);
                    local_written_at[target] = Some(i);
                }
                InstructionKind::SharedWrite { data, .. }
                | InstructionKind::VolatileWrite { data, .. }
                | InstructionKind::Print { arg: data } => {
                    let producer = data_producer(data, &local_written_at);
                    self.record_single_operand(i, data, producer);
                }
                InstructionKind::SharedRead { target, .. }
                | InstructionKind::VolatileRead { target, .. } => {
                    self.trans_read_deps[i] = vec![i];
                    local_written_at[target] = Some(i);
                }
                InstructionKind::Lock { .. }
                | InstructionKind::Unlock { .. } => {}
            }
        }
    }

    /// Records the dependency entry and inherited read set of an
    /// instruction with a single data operand.
    fn record_single_operand(
        &mut self,
        i: usize,
        data: LocalValue,
        producer: Option<usize>,
    ) {
        if let LocalValue::Local(_) = data {
            self.argument_deps[i] = vec![producer];
        }
        if let Some(producer) = producer {
            let inherited = self.trans_read_deps[producer].clone();
            self.trans_read_deps[i] = inherited;
        }
    }

    /// Sorted union of two producers' transitive read sets.
    fn merged_read_deps(
        &self,
        first: Option<usize>,
        second: Option<usize>,
    ) -> Vec<usize> {
        let left =
            first.map_or(NO_READS, |p| self.trans_read_deps[p].as_slice());
        let right =
            second.map_or(NO_READS, |p| self.trans_read_deps[p].as_slice());
        left.iter().merge(right.iter()).dedup().copied().collect()
    }
}
