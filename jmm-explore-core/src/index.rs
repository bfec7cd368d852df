use snip::{Instruction, Snippet};

/// Bijective numbering of every action across the snippets.
///
/// Global action numbers are flat, in (thread, program-order-position)
/// lexicographic order, so one `usize` can stand for any action of any
/// thread in the happens-before matrix and the synchronization order.
pub struct ActionIndex {
    /// (thread, action slot) behind each global action number
    to_thread_action: Vec<(usize, usize)>,
    /// Global action number of each thread's action slots
    to_global: Vec<Vec<usize>>,
}

impl ActionIndex {
    /// Numbers the actions of the given snippets.
    pub fn new(snippets: &[Snippet]) -> Self {
        let mut to_thread_action = Vec::new();
        let mut to_global = Vec::with_capacity(snippets.len());
        for (thread, snippet) in snippets.iter().enumerate() {
            let mut globals = Vec::with_capacity(snippet.action_count());
            for slot in 0..snippet.action_count() {
                globals.push(to_thread_action.len());
                to_thread_action.push((thread, slot));
            }
            to_global.push(globals);
        }
        Self {
            to_thread_action,
            to_global,
        }
    }

    /// Total number of actions across all threads.
    pub fn len(&self) -> usize {
        self.to_thread_action.len()
    }

    /// The thread and program-order action slot behind a global action
    /// number.
    pub fn thread_action(&self, global: usize) -> (usize, usize) {
        self.to_thread_action[global]
    }

    /// The global action number of a thread's action slot.
    pub fn global(&self, thread: usize, slot: usize) -> usize {
        self.to_global[thread][slot]
    }

    /// The instruction behind a global action number.
    pub fn action<'a>(
        &self,
        snippets: &'a [Snippet],
        global: usize,
    ) -> &'a Instruction {
        let (thread, slot) = self.thread_action(global);
        snippets[thread].action(slot)
    }
}
