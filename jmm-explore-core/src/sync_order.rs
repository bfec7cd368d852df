use std::collections::HashMap;

use snip::{Ident, InstructionKind, Snippet};

use crate::index::ActionIndex;

/// Sentinel marking a slot not currently assigned to any thread
const FREE: usize = usize::MAX;

/// Steps through every interleaving of the per-thread synchronization
/// action sequences.
///
/// An interleaving is an assignment of threads to slots; within its slots a
/// thread performs its synchronization actions in program order, so
/// distinct assignments are exactly the distinct synchronization orders.
/// Enumeration starts from the lexicographically first assignment and
/// visits each multiset permutation exactly once: every slot subset for
/// thread 0, then every subset for thread 1 within the remaining slots, and
/// so on.
pub struct SlotAllocations {
    /// Thread occupying each slot
    alloc: Vec<usize>,
    /// Number of slots each thread must occupy
    counts: Vec<usize>,
}

impl SlotAllocations {
    /// The lexicographically first assignment for the given per-thread
    /// slot counts.
    pub fn new(counts: Vec<usize>) -> Self {
        let mut alloc = Vec::with_capacity(counts.iter().sum());
        for (thread, &count) in counts.iter().enumerate() {
            alloc.extend(core::iter::repeat(thread).take(count));
        }
        Self { alloc, counts }
    }

    /// The current slot assignment.
    pub fn current(&self) -> &[usize] {
        &self.alloc
    }

    /// Advances to the next assignment, returning `false` once every
    /// assignment has been visited.  The assignment is not meaningful after
    /// `false` is returned.
    pub fn advance(&mut self) -> bool {
        let thread_count = self.counts.len();
        for mover in (0..thread_count.saturating_sub(1)).rev() {
            let mut next_free: Option<usize> = None;
            let mut displaced = 0_usize;
            let mut moved = false;
            for slot in (0..self.alloc.len()).rev() {
                if self.alloc[slot] > mover {
                    next_free = Some(slot);
                } else if self.alloc[slot] == mover {
                    let Some(destination) = next_free else {
                        // nothing to the right can take this occurrence;
                        // free it and keep scanning left
                        self.alloc[slot] = FREE;
                        displaced += 1;
                        continue;
                    };
                    self.alloc[slot] = FREE;
                    self.alloc[destination] = mover;
                    // the freed occurrences pack in directly after the
                    // moved one
                    let mut refill = destination + 1;
                    while displaced > 0 {
                        if self.alloc[refill] > mover {
                            self.alloc[refill] = mover;
                            displaced -= 1;
                        }
                        refill += 1;
                    }
                    moved = true;
                    break;
                }
            }
            if moved {
                self.reset_higher_threads(mover);
                return true;
            }
        }
        false
    }

    /// Returns every thread above `mover` to its lexicographically first
    /// slots among the positions threads up to `mover` don't occupy.
    fn reset_higher_threads(&mut self, mover: usize) {
        let mut slot = 0_usize;
        for thread in mover + 1..self.counts.len() {
            let mut remaining = self.counts[thread];
            while remaining > 0 {
                if self.alloc[slot] > mover {
                    self.alloc[slot] = thread;
                    remaining -= 1;
                }
                slot += 1;
            }
        }
    }
}

/// The synchronization order described by a slot assignment, as global
/// action numbers.
pub fn global_order(
    alloc: &[usize],
    syn_actions: &[Vec<usize>],
    index: &ActionIndex,
) -> Vec<usize> {
    let mut next_per_thread = vec![0_usize; syn_actions.len()];
    let mut order = Vec::with_capacity(alloc.len());
    for &thread in alloc {
        let slot = syn_actions[thread][next_per_thread[thread]];
        next_per_thread[thread] += 1;
        order.push(index.global(thread, slot));
    }
    order
}

/// Whether a synchronization order respects mutual exclusion: no thread
/// locks a monitor while another thread holds it.
///
/// Orders that fail simply correspond to no legal execution and are
/// skipped.  Unlock mismatches cannot occur here: per-snippet
/// well-formedness is checked before any order is built.
pub fn respects_mutual_exclusion(
    order: &[usize],
    snippets: &[Snippet],
    index: &ActionIndex,
) -> bool {
    // monitor name to (holding thread, hold depth)
    let mut held: HashMap<&Ident, (usize, usize)> = HashMap::new();
    for &global in order {
        let (thread, slot) = index.thread_action(global);
        match &snippets[thread].action(slot).kind {
            InstructionKind::Lock { monitor } => {
                let entry = held.entry(monitor).or_insert((thread, 0));
                if entry.1 > 0 && entry.0 != thread {
                    return false;
                }
                *entry = (thread, entry.1 + 1);
            }
            InstructionKind::Unlock { monitor } => {
                let entry = held.entry(monitor).or_insert((thread, 0));
                debug_assert!(
                    entry.1 > 0 && entry.0 == thread,
                    "an unlock of a monitor the thread doesn't hold \
                     survived the well-formedness check"
                );
                entry.1 = entry.1.saturating_sub(1);
            }
            _ => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;
    use itertools::Itertools;
    use snip::SourceLoc;

    use super::*;

    /// Visits every assignment, checking uniqueness, and returns how many
    /// there were.
    fn count_assignments(counts: Vec<usize>) -> usize {
        let mut slots = SlotAllocations::new(counts);
        let mut seen = Vec::new();
        loop {
            let current = slots.current().to_vec();
            assert!(
                !seen.contains(&current),
                "assignment {current:?} visited twice"
            );
            seen.push(current);
            if !slots.advance() {
                return seen.len();
            }
        }
    }

    /// n! / (c0! c1! …) for the slot counts
    fn multinomial(counts: &[usize]) -> usize {
        let factorial = |n: usize| (1..=n).product::<usize>();
        let total: usize = counts.iter().sum();
        counts
            .iter()
            .fold(factorial(total), |acc, &count| acc / factorial(count))
    }

    #[test]
    fn visits_each_interleaving_exactly_once() {
        for counts in [
            vec![],
            vec![3],
            vec![2, 2],
            vec![1, 2, 3],
            vec![2, 1, 2],
            vec![0, 2, 0, 1],
        ] {
            assert_eq!(
                count_assignments(counts.clone()),
                multinomial(&counts),
                "wrong interleaving count for slot counts {counts:?}"
            );
        }
    }

    #[test]
    fn starts_lexicographically_minimal() {
        let slots = SlotAllocations::new(vec![2, 2, 1]);
        assert_eq!(slots.current(), &[0, 0, 1, 1, 2]);
    }

    #[test]
    fn matches_the_sorted_permutation_set() {
        let mut slots = SlotAllocations::new(vec![2, 2]);
        let mut visited = Vec::new();
        loop {
            visited.push(slots.current().to_vec());
            if !slots.advance() {
                break;
            }
        }
        let expected: Vec<Vec<usize>> = vec![0, 0, 1, 1]
            .into_iter()
            .permutations(4)
            .unique()
            .collect();
        assert_eq!(visited.len(), expected.len());
        for assignment in expected {
            assert!(visited.contains(&assignment));
        }
    }

    #[test]
    fn lock_against_a_holder_is_rejected() {
        let loc = SourceLoc::new(1);
        let mut first = Snippet::new("a");
        first.emit_method_call("m0", "lock", loc);
        first.emit_method_call("m0", "unlock", loc);
        let mut second = Snippet::new("b");
        second.emit_method_call("m0", "lock", loc);
        second.emit_method_call("m0", "unlock", loc);
        let snippets = vec![first, second];
        let index = ActionIndex::new(&snippets);
        let syn_actions: Vec<Vec<usize>> = snippets
            .iter()
            .map(Snippet::synchronization_actions)
            .collect();

        // thread 0 and thread 1 each hold m0 across their two actions
        let interleaved =
            global_order(&[0, 1, 0, 1], &syn_actions, &index);
        let sequential = global_order(&[0, 0, 1, 1], &syn_actions, &index);
        assert!(!respects_mutual_exclusion(&interleaved, &snippets, &index));
        assert!(respects_mutual_exclusion(&sequential, &snippets, &index));
    }

    #[test]
    fn reentrant_locking_is_legal() {
        let loc = SourceLoc::new(1);
        let mut only = Snippet::new("a");
        only.emit_method_call("m0", "lock", loc);
        only.emit_method_call("m0", "lock", loc);
        only.emit_method_call("m0", "unlock", loc);
        only.emit_method_call("m0", "unlock", loc);
        let snippets = vec![only];
        let index = ActionIndex::new(&snippets);
        let syn_actions: Vec<Vec<usize>> = snippets
            .iter()
            .map(Snippet::synchronization_actions)
            .collect();
        let order = global_order(&[0, 0, 0, 0], &syn_actions, &index);
        assert!(respects_mutual_exclusion(&order, &snippets, &index));
    }
}
