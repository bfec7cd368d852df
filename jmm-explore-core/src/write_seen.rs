use snip::Snippet;

use crate::{happens_before::HappensBefore, index::ActionIndex};

/// A read's choice of write to observe: a global write action, or the
/// default zero when no write is observed.
pub type WriteChoice = Option<usize>;

/// The reads of the program, numbered in global-action order.
///
/// Built once per analysis; the candidate writes vary per synchronization
/// order, the reads themselves do not.
pub struct ReadTable {
    /// Global action numbers of every read, shared and volatile
    reads: Vec<usize>,
    /// Read ordinal of each global action, for the actions that are reads
    ordinal_of_global: Vec<Option<usize>>,
    /// Ordinals (into `reads`) of the shared reads
    shared_reads: Vec<usize>,
    /// Ordinals (into `reads`) of the volatile reads
    volatile_reads: Vec<usize>,
}

impl ReadTable {
    /// Collects the reads of the given snippets.
    pub fn new(snippets: &[Snippet], index: &ActionIndex) -> Self {
        let mut reads = Vec::new();
        let mut ordinal_of_global = vec![None; index.len()];
        let mut shared_reads = Vec::new();
        let mut volatile_reads = Vec::new();
        for global in 0..index.len() {
            let action = index.action(snippets, global);
            if action.is_read() {
                let ordinal = reads.len();
                ordinal_of_global[global] = Some(ordinal);
                if action.is_shared_read() {
                    shared_reads.push(ordinal);
                } else {
                    volatile_reads.push(ordinal);
                }
                reads.push(global);
            }
        }
        Self {
            reads,
            ordinal_of_global,
            shared_reads,
            volatile_reads,
        }
    }

    /// Number of reads across all threads.
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// Global action number of a read ordinal.
    pub fn global(&self, ordinal: usize) -> usize {
        self.reads[ordinal]
    }

    /// Read ordinal of a global action, when that action is a read.
    pub fn ordinal(&self, global: usize) -> Option<usize> {
        self.ordinal_of_global[global]
    }

    /// Ordinals of the shared reads, in global order.
    pub fn shared_reads(&self) -> &[usize] {
        &self.shared_reads
    }

    /// Ordinals of the volatile reads, in global order.
    pub fn volatile_reads(&self) -> &[usize] {
        &self.volatile_reads
    }
}

/// For each shared read, the writes it may observe under the given
/// happens-before relation.
///
/// A shared read may observe any same-name write it races with (neither
/// ordered before nor after it), any happens-before-maximal write ordered
/// before it, and the default zero exactly when no write is ordered before
/// it.
pub fn shared_candidates(
    snippets: &[Snippet],
    index: &ActionIndex,
    table: &ReadTable,
    hb: &HappensBefore,
) -> Vec<Vec<WriteChoice>> {
    table
        .shared_reads()
        .iter()
        .map(|&ordinal| {
            let read = table.global(ordinal);
            let name = index.action(snippets, read).shared_name();
            let mut preceding = Vec::new();
            let mut candidates: Vec<WriteChoice> = Vec::new();
            for write in 0..index.len() {
                let action = index.action(snippets, write);
                if action.is_shared_write() && action.shared_name() == name {
                    if hb.relates(write, read) {
                        preceding.push(write);
                    } else if !hb.relates(read, write) {
                        // racy write: unordered against the read, but
                        // observable all the same
                        candidates.push(Some(write));
                    }
                }
            }
            // of the ordered-before writes, only those not ordered before
            // another ordered-before write remain visible
            for &first in &preceding {
                if preceding.iter().all(|&second| {
                    first == second || !hb.relates(first, second)
                }) {
                    candidates.push(Some(first));
                }
            }
            if preceding.is_empty() {
                candidates.push(None);
            }
            candidates
        })
        .collect()
}

/// The single write each volatile read observes under a synchronization
/// order: the latest same-name volatile write at an earlier position, or
/// the default zero when there is none.
pub fn forced_volatile_choices(
    snippets: &[Snippet],
    index: &ActionIndex,
    table: &ReadTable,
    order: &[usize],
) -> Vec<(usize, WriteChoice)> {
    table
        .volatile_reads()
        .iter()
        .map(|&ordinal| {
            let read = table.global(ordinal);
            let name = index.action(snippets, read).volatile_name();
            let mut latest = None;
            for &global in order {
                if global == read {
                    break;
                }
                let action = index.action(snippets, global);
                if action.is_volatile_write()
                    && action.volatile_name() == name
                {
                    latest = Some(global);
                }
            }
            (ordinal, latest)
        })
        .collect()
}

/// Fills the per-read choice vector from the forced volatile choices and
/// the current position in the shared Cartesian product.
pub fn assemble_choices(
    choices: &mut [WriteChoice],
    table: &ReadTable,
    forced: &[(usize, WriteChoice)],
    candidates: &[Vec<WriteChoice>],
    counter: &[usize],
) {
    for &(ordinal, choice) in forced {
        choices[ordinal] = choice;
    }
    for (shared_slot, &ordinal) in table.shared_reads().iter().enumerate() {
        choices[ordinal] = candidates[shared_slot][counter[shared_slot]];
    }
}

/// Mixed-radix step through the Cartesian product of shared candidate
/// sets.  Returns `false` once the counter wraps past the last
/// combination.
pub fn advance_choice_counter(
    counter: &mut [usize],
    radices: &[Vec<WriteChoice>],
) -> bool {
    if counter.is_empty() {
        return false;
    }
    counter[0] += 1;
    let mut digit = 0_usize;
    while digit < counter.len() && counter[digit] == radices[digit].len() {
        counter[digit] = 0;
        digit += 1;
        if digit < counter.len() {
            counter[digit] += 1;
        }
    }
    digit < counter.len()
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;
    use snip::{LocalValue, SourceLoc};

    use super::*;
    use crate::sync_order::global_order;

    /// `print(shared);` against `shared=42;`
    fn race_pair() -> Vec<Snippet> {
        let loc = SourceLoc::new(1);
        let mut reader = Snippet::new("reader");
        let seen = reader.emit_read("shared", loc);
        reader.emit_static_call("print", seen, loc);
        let mut writer = Snippet::new("writer");
        writer.emit_write("shared", LocalValue::Literal(42), loc);
        vec![reader, writer]
    }

    #[test]
    fn racy_write_and_default_zero_are_candidates() {
        let snippets = race_pair();
        let index = ActionIndex::new(&snippets);
        let table = ReadTable::new(&snippets, &index);
        let mut hb = HappensBefore::new(index.len());
        hb.rebuild(&snippets, &index, &[]);

        let candidates = shared_candidates(&snippets, &index, &table, &hb);
        assert_eq!(candidates, vec![vec![Some(1), None]]);
    }

    #[test]
    fn ordered_before_write_removes_the_default_zero() {
        let loc = SourceLoc::new(1);
        let mut only = Snippet::new("a");
        only.emit_write("sx", LocalValue::Literal(1), loc);
        only.emit_write("sx", LocalValue::Literal(2), loc);
        let seen = only.emit_read("sx", loc);
        only.emit_static_call("print", seen, loc);
        let snippets = vec![only];
        let index = ActionIndex::new(&snippets);
        let table = ReadTable::new(&snippets, &index);
        let mut hb = HappensBefore::new(index.len());
        hb.rebuild(&snippets, &index, &[]);

        // the first write is hidden behind the second; no default zero
        let candidates = shared_candidates(&snippets, &index, &table, &hb);
        assert_eq!(candidates, vec![vec![Some(1)]]);
    }

    #[test]
    fn volatile_choice_follows_the_order() {
        let loc = SourceLoc::new(1);
        let mut writer = Snippet::new("writer");
        writer.emit_write("vx", LocalValue::Literal(7), loc);
        let mut reader = Snippet::new("reader");
        let seen = reader.emit_read("vx", loc);
        reader.emit_static_call("print", seen, loc);
        let snippets = vec![writer, reader];
        let index = ActionIndex::new(&snippets);
        let table = ReadTable::new(&snippets, &index);
        let syn_actions: Vec<Vec<usize>> = snippets
            .iter()
            .map(Snippet::synchronization_actions)
            .collect();

        let write_first = global_order(&[0, 1], &syn_actions, &index);
        assert_eq!(
            forced_volatile_choices(&snippets, &index, &table, &write_first),
            vec![(0, Some(0))]
        );

        let read_first = global_order(&[1, 0], &syn_actions, &index);
        assert_eq!(
            forced_volatile_choices(&snippets, &index, &table, &read_first),
            vec![(0, None)]
        );
    }

    #[test]
    fn counter_walks_the_whole_product() {
        let radices: Vec<Vec<WriteChoice>> = vec![
            vec![Some(0), Some(1)],
            vec![Some(2), Some(3), None],
        ];
        let mut counter = vec![0_usize; radices.len()];
        let mut combinations = vec![counter.clone()];
        while advance_choice_counter(&mut counter, &radices) {
            combinations.push(counter.clone());
        }
        assert_eq!(combinations.len(), 6);
        assert_eq!(combinations.first(), Some(&vec![0, 0]));
        assert_eq!(combinations.last(), Some(&vec![1, 2]));
    }

    #[test]
    fn empty_counter_is_a_single_combination() {
        let mut counter: Vec<usize> = Vec::new();
        assert!(!advance_choice_counter(&mut counter, &[]));
    }
}
