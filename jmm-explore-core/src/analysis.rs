use core::fmt;
use std::collections::BTreeMap;

use itertools::Itertools;
use snip::{Ident, InstructionKind, Snippet, SourceLoc};

use crate::{
    driver::ExecutionDriver,
    happens_before::HappensBefore,
    index::ActionIndex,
    result::{record, ExecutionResult},
    sync_order::{global_order, respects_mutual_exclusion, SlotAllocations},
    write_seen::{
        advance_choice_counter, assemble_choices, forced_volatile_choices,
        shared_candidates, ReadTable, WriteChoice,
    },
};

/// One ill-formed use of a monitor inside a snippet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorDiagnostic {
    /// An unlock with no matching lock before it in program order
    UnlockNotHeld {
        /// Monitor being unlocked
        monitor: Ident,
        /// Name of the offending snippet
        snippet: String,
        /// Location of the unlock
        loc: SourceLoc,
    },
    /// A lock never released by the end of the snippet
    NeverUnlocked {
        /// Monitor left locked
        monitor: Ident,
        /// Name of the offending snippet
        snippet: String,
        /// Location of the unmatched lock
        loc: SourceLoc,
    },
}

impl fmt::Display for MonitorDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnlockNotHeld {
                monitor,
                snippet,
                loc,
            } => {
                write!(
                    f,
                    "Error: Unlocking monitor {monitor} in {snippet} at {loc}"
                )
            }
            Self::NeverUnlocked {
                monitor,
                snippet,
                loc,
            } => {
                write!(
                    f,
                    "Error: Monitor {monitor} locked but never unlocked in \
                     {snippet} at {loc}"
                )
            }
        }
    }
}

/// Rejection of a program whose snippets pair locks and unlocks
/// incorrectly.  Analysis does not run for such programs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidMonitorUse {
    /// Every violation found, in scan order
    pub diagnostics: Vec<MonitorDiagnostic>,
}

impl fmt::Display for InvalidMonitorUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostics.iter().join("\n"))
    }
}

impl std::error::Error for InvalidMonitorUse {}

/// Enumerates every observably distinct outcome of the given snippets.
///
/// Runs the full exploration: every synchronization order that respects
/// mutual exclusion, and for each, every write-seen function consistent
/// with the derived happens-before relation.  Returns the distinct
/// outcomes in discovery order.
///
/// The snippets are mutated only through their per-execution evaluation
/// state; a second call sees the same programs and returns the same
/// outcome set.
///
/// # Errors
///
/// Returns [`InvalidMonitorUse`] when any snippet unlocks a monitor it
/// does not hold or leaves one locked; no enumeration happens in that
/// case.
pub fn analyze(
    snippets: &mut [Snippet],
) -> Result<Vec<ExecutionResult>, InvalidMonitorUse> {
    let diagnostics = check_monitor_pairing(snippets);
    if !diagnostics.is_empty() {
        return Err(InvalidMonitorUse { diagnostics });
    }

    for snippet in snippets.iter_mut() {
        snippet.run_preexecution_analysis();
    }
    let index = ActionIndex::new(snippets);
    let syn_actions: Vec<Vec<usize>> = snippets
        .iter()
        .map(Snippet::synchronization_actions)
        .collect();
    let counts: Vec<usize> = syn_actions.iter().map(Vec::len).collect();

    let table = ReadTable::new(snippets, &index);
    let mut hb = HappensBefore::new(index.len());
    let mut driver = ExecutionDriver::new(table.len());
    let mut choices: Vec<WriteChoice> = vec![None; table.len()];
    let mut results = Vec::new();

    let mut slots = SlotAllocations::new(counts);
    loop {
        let order = global_order(slots.current(), &syn_actions, &index);
        if respects_mutual_exclusion(&order, snippets, &index) {
            hb.rebuild(snippets, &index, &order);
            let candidates =
                shared_candidates(snippets, &index, &table, &hb);
            let forced =
                forced_volatile_choices(snippets, &index, &table, &order);
            let mut counter = vec![0_usize; candidates.len()];
            loop {
                assemble_choices(
                    &mut choices,
                    &table,
                    &forced,
                    &candidates,
                    &counter,
                );
                if let Some(result) =
                    driver.run(snippets, &index, &table, &choices)
                {
                    record(&mut results, result);
                }
                if !advance_choice_counter(&mut counter, &candidates) {
                    break;
                }
            }
        }
        if !slots.advance() {
            break;
        }
    }
    Ok(results)
}

/// Scans each snippet's actions for monitor pairing violations: the lock
/// count of every monitor must never go negative and must return to zero
/// by the end of the snippet.
fn check_monitor_pairing(snippets: &[Snippet]) -> Vec<MonitorDiagnostic> {
    let mut diagnostics = Vec::new();
    for snippet in snippets {
        // per monitor, the locations of locks not yet matched
        let mut open_locks: BTreeMap<&Ident, Vec<SourceLoc>> = BTreeMap::new();
        for slot in 0..snippet.action_count() {
            let action = snippet.action(slot);
            match &action.kind {
                InstructionKind::Lock { monitor } => {
                    open_locks.entry(monitor).or_default().push(action.loc);
                }
                InstructionKind::Unlock { monitor } => {
                    let open = open_locks.entry(monitor).or_default();
                    if open.pop().is_none() {
                        diagnostics.push(MonitorDiagnostic::UnlockNotHeld {
                            monitor: monitor.clone(),
                            snippet: snippet.name().to_owned(),
                            loc: action.loc,
                        });
                    }
                }
                _ => {}
            }
        }
        for (monitor, open) in open_locks {
            for loc in open {
                diagnostics.push(MonitorDiagnostic::NeverUnlocked {
                    monitor: monitor.clone(),
                    snippet: snippet.name().to_owned(),
                    loc,
                });
            }
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use snip::{ArithmeticOp, LocalValue};

    use super::*;

    /// Location shorthand for programs built without caring about lines
    fn l1() -> SourceLoc {
        SourceLoc::new(1)
    }

    /// `print(shared);` against `shared=42;`
    fn race_pair() -> Vec<Snippet> {
        let mut reader = Snippet::new("thread 0");
        let seen = reader.emit_read("shared", l1());
        reader.emit_static_call("print", seen, l1());
        let mut writer = Snippet::new("thread 1");
        writer.emit_write("shared", LocalValue::Literal(42), l1());
        vec![reader, writer]
    }

    #[test]
    fn single_thread_arithmetic_is_deterministic() {
        let mut only = Snippet::new("thread 0");
        let sum = only.emit_arithmetic(
            LocalValue::Literal(41),
            LocalValue::Literal(1),
            ArithmeticOp::Add,
            l1(),
        );
        only.emit_static_call("print", sum, l1());
        let mut snippets = vec![only];
        let results = analyze(&mut snippets).unwrap();
        assert_eq!(results, vec![ExecutionResult::Regular(vec![vec![42]])]);
    }

    #[test]
    fn racy_read_observes_zero_or_the_write() {
        let mut snippets = race_pair();
        let results = analyze(&mut snippets).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results
            .contains(&ExecutionResult::Regular(vec![vec![0], vec![]])));
        assert!(results
            .contains(&ExecutionResult::Regular(vec![vec![42], vec![]])));
    }

    #[test]
    fn volatile_reads_are_monotone() {
        let mut writer = Snippet::new("thread 0");
        writer.emit_write("vol", LocalValue::Literal(42), l1());
        let mut reader = Snippet::new("thread 1");
        for _ in 0..3_usize {
            let seen = reader.emit_read("vol", l1());
            reader.emit_static_call("print", seen, l1());
        }
        let mut snippets = vec![writer, reader];
        let results = analyze(&mut snippets).unwrap();

        // once a read returns 42, every later read does too
        let mut tuples: Vec<Vec<i32>> = results
            .iter()
            .map(|result| match result {
                ExecutionResult::Regular(outputs) => outputs[1].clone(),
                ExecutionResult::Excepted { .. } => {
                    panic!("no division happens here")
                }
            })
            .collect();
        tuples.sort_unstable();
        assert_eq!(
            tuples,
            vec![
                vec![0, 0, 0],
                vec![0, 0, 42],
                vec![0, 42, 42],
                vec![42, 42, 42],
            ]
        );
    }

    #[test]
    fn result_sets_hold_no_duplicates() {
        // shared ++ against shared ++, plenty of coinciding outcomes
        let mut snippets: Vec<Snippet> = (0..2_usize)
            .map(|thread| {
                let mut snippet = Snippet::new(format!("thread {thread}"));
                snippet.emit_op_write(
                    "scounter",
                    LocalValue::Literal(1),
                    ArithmeticOp::Add,
                    l1(),
                );
                let seen = snippet.emit_read("scounter", l1());
                snippet.emit_static_call("print", seen, l1());
                snippet
            })
            .collect();
        let results = analyze(&mut snippets).unwrap();
        for (position, result) in results.iter().enumerate() {
            assert!(
                !results[position + 1..].contains(result),
                "duplicate result {result:?}"
            );
        }
    }

    #[test]
    fn analysis_is_repeatable() {
        let mut snippets = race_pair();
        let first = analyze(&mut snippets).unwrap();
        let second = analyze(&mut snippets).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unlocking_an_unheld_monitor_is_rejected() {
        let mut only = Snippet::new("broken");
        only.emit_method_call("m0", "unlock", SourceLoc::new(3));
        let mut snippets = vec![only];
        let error = analyze(&mut snippets).unwrap_err();
        assert_eq!(error.diagnostics.len(), 1);
        assert_eq!(
            error.to_string(),
            "Error: Unlocking monitor m0 in broken at line 3"
        );
    }

    #[test]
    fn leaving_a_monitor_locked_is_rejected() {
        let mut only = Snippet::new("broken");
        only.emit_method_call("m0", "lock", SourceLoc::new(2));
        only.emit_method_call("m0", "lock", SourceLoc::new(4));
        only.emit_method_call("m0", "unlock", SourceLoc::new(5));
        let mut snippets = vec![only];
        let error = analyze(&mut snippets).unwrap_err();
        assert_eq!(
            error.diagnostics,
            vec![MonitorDiagnostic::NeverUnlocked {
                monitor: "m0".to_owned(),
                snippet: "broken".to_owned(),
                loc: SourceLoc::new(2),
            }]
        );
    }

    #[test]
    fn well_nested_monitors_are_accepted() {
        let mut only = Snippet::new("thread 0");
        only.emit_method_call("ma", "lock", l1());
        only.emit_method_call("mb", "lock", l1());
        only.emit_method_call("mb", "unlock", l1());
        only.emit_method_call("ma", "unlock", l1());
        only.emit_static_call("print", LocalValue::Literal(1), l1());
        let mut snippets = vec![only];
        let results = analyze(&mut snippets).unwrap();
        assert_eq!(results, vec![ExecutionResult::Regular(vec![vec![1]])]);
    }

    #[test]
    fn empty_program_has_the_empty_outcome() {
        let mut snippets = vec![Snippet::new("thread 0")];
        let results = analyze(&mut snippets).unwrap();
        assert_eq!(results, vec![ExecutionResult::Regular(vec![vec![]])]);
    }

    /// Mirror of the evaluator's arithmetic used to predict outcomes
    #[allow(clippy::cast_possible_truncation)]
    fn model_combine(op: ArithmeticOp, v0: i32, v1: i32) -> i32 {
        match op {
            ArithmeticOp::Add => v0.wrapping_add(v1),
            ArithmeticOp::Sub => v0.wrapping_sub(v1),
            ArithmeticOp::Mul => v0.wrapping_mul(v1),
            ArithmeticOp::Div => (i64::from(v0) / i64::from(v1)) as i32,
            ArithmeticOp::Rem => (i64::from(v0) % i64::from(v1)) as i32,
            ArithmeticOp::Or => v0 | v1,
            ArithmeticOp::Xor => v0 ^ v1,
            ArithmeticOp::And => v0 & v1,
        }
    }

    #[test]
    #[allow(clippy::cast_possible_wrap)]
    fn random_single_thread_programs_match_direct_interpretation() {
        const OPS: [ArithmeticOp; 8] = [
            ArithmeticOp::Add,
            ArithmeticOp::Sub,
            ArithmeticOp::Mul,
            ArithmeticOp::Div,
            ArithmeticOp::Rem,
            ArithmeticOp::Or,
            ArithmeticOp::Xor,
            ArithmeticOp::And,
        ];
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50_usize {
            let mut snippet = Snippet::new("thread 0");
            let mut model = [0_i32; 4];
            let mut expected = Vec::new();
            for _ in 0..rng.gen_range(1..30_usize) {
                let target = rng.gen_range(0..4_usize);
                let target_name = format!("l{target}");
                match rng.gen_range(0..3_u8) {
                    0 => {
                        let constant: u32 = rng.gen();
                        snippet.emit_write(
                            &target_name,
                            LocalValue::Literal(constant),
                            l1(),
                        );
                        model[target] = constant as i32;
                    }
                    1 => {
                        let source = rng.gen_range(0..4_usize);
                        let op = OPS[rng.gen_range(0..OPS.len())];
                        // keep divisors nonzero so no run faults
                        let divisor: u32 = rng.gen_range(1..1000_u32);
                        let lhs =
                            snippet.emit_read(&format!("l{source}"), l1());
                        let combined = snippet.emit_arithmetic(
                            lhs,
                            LocalValue::Literal(divisor),
                            op,
                            l1(),
                        );
                        snippet.emit_write(&target_name, combined, l1());
                        model[target] =
                            model_combine(op, model[source], divisor as i32);
                    }
                    _ => {
                        let value =
                            snippet.emit_read(&target_name, l1());
                        snippet.emit_static_call("print", value, l1());
                        expected.push(model[target]);
                    }
                }
            }
            let mut snippets = vec![snippet];
            let results = analyze(&mut snippets).unwrap();
            assert_eq!(
                results,
                vec![ExecutionResult::Regular(vec![expected])],
                "single-thread programs have exactly their deterministic \
                 interpretation"
            );
        }
    }
}
