use snip::{Snippet, SourceLoc};

use crate::{
    index::ActionIndex,
    result::ExecutionResult,
    write_seen::{ReadTable, WriteChoice},
};

/// Runs one (synchronization order, write-seen) candidate execution.
///
/// The driver owns its propagation buffers so the allocation cost is paid
/// once per analysis rather than once per candidate.
pub struct ExecutionDriver {
    /// Per read, how many other reads its chosen write still waits for
    outstanding: Vec<usize>,
    /// Per read, the reads whose chosen writes consume its value
    used_by: Vec<Vec<usize>>,
    /// Reads whose chosen write has every input available
    ready: Vec<usize>,
}

impl ExecutionDriver {
    /// A driver for a program with `read_count` reads.
    pub fn new(read_count: usize) -> Self {
        Self {
            outstanding: vec![0; read_count],
            used_by: vec![Vec::new(); read_count],
            ready: Vec::new(),
        }
    }

    /// Supplies every read its chosen value in dependency order and
    /// collects the outcome.
    ///
    /// Returns `None` when the chosen writes form a dependency cycle; such
    /// a write-seen function corresponds to no execution and produces no
    /// output.  A division by zero anywhere, while evaluating a chosen
    /// write or while collecting prints, yields the excepted outcome for
    /// the first faulting thread.
    pub fn run(
        &mut self,
        snippets: &mut [Snippet],
        index: &ActionIndex,
        table: &ReadTable,
        choices: &[WriteChoice],
    ) -> Option<ExecutionResult> {
        for snippet in snippets.iter_mut() {
            snippet.prepare_execution();
        }
        for waiting in &mut self.outstanding {
            *waiting = 0;
        }
        for waiters in &mut self.used_by {
            waiters.clear();
        }
        self.ready.clear();

        // wire each read to the reads its chosen write depends on
        for (ordinal, &choice) in choices.iter().enumerate() {
            let Some(write) = choice else { continue };
            let (write_thread, write_slot) = index.thread_action(write);
            let dependencies =
                snippets[write_thread].write_dependencies(write_slot);
            self.outstanding[ordinal] = dependencies.len();
            for dependency_slot in dependencies {
                let dependency = index.global(write_thread, dependency_slot);
                if let Some(dependency_ordinal) = table.ordinal(dependency) {
                    self.used_by[dependency_ordinal].push(ordinal);
                }
            }
        }
        for (ordinal, &waiting) in self.outstanding.iter().enumerate() {
            if waiting == 0 {
                self.ready.push(ordinal);
            }
        }

        let mut fault: Option<(usize, SourceLoc)> = None;
        let mut reads_done = 0_usize;
        while let Some(current) = self.ready.pop() {
            reads_done += 1;
            let value = match choices[current] {
                None => 0,
                Some(write) => {
                    let (write_thread, write_slot) =
                        index.thread_action(write);
                    let value =
                        snippets[write_thread].read_write(write_slot);
                    if let Some(loc) = snippets[write_thread].divide_fault()
                    {
                        fault = Some((write_thread, loc));
                    }
                    value
                }
            };
            if fault.is_some() {
                break;
            }
            let (read_thread, read_slot) =
                index.thread_action(table.global(current));
            snippets[read_thread].supply_read_value(read_slot, value);
            for i in 0..self.used_by[current].len() {
                let dependent = self.used_by[current][i];
                self.outstanding[dependent] -= 1;
                if self.outstanding[dependent] == 0 {
                    self.ready.push(dependent);
                }
            }
        }

        if fault.is_none() && reads_done == table.len() {
            let mut outputs = Vec::with_capacity(snippets.len());
            for (thread, snippet) in snippets.iter_mut().enumerate() {
                outputs.push(snippet.execution_results());
                if let Some(loc) = snippet.divide_fault() {
                    fault = Some((thread, loc));
                    break;
                }
            }
            if fault.is_none() {
                return Some(ExecutionResult::Regular(outputs));
            }
        }

        match fault {
            Some((thread, loc)) => {
                Some(ExecutionResult::Excepted { thread, loc })
            }
            // the ready queue drained with reads unresolved: the chosen
            // writes form a cycle
            None => None,
        }
    }
}
