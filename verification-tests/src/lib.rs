//! Helpers for whole-program verification: parse literal snippet sources,
//! run the analyzer, and compare outcome sets order-insensitively.

use jmm_explore_core::{analyze, ExecutionResult};
use snip::{Snippet, SourceLoc};
use snip_parser::parse_snippet;

/// Parses one source per thread, naming threads `thread 0`, `thread 1`, …
///
/// # Panics
///
/// Panics when a source does not parse; the verification corpus only
/// contains well-formed programs.
#[must_use]
pub fn parse_threads(sources: &[&str]) -> Vec<Snippet> {
    sources
        .iter()
        .enumerate()
        .map(|(thread, source)| {
            parse_snippet(&format!("thread {thread}"), source)
                .unwrap_or_else(|error| {
                    panic!("corpus source failed to parse: {error}")
                })
        })
        .collect()
}

/// Runs the full analysis over one source per thread.
///
/// # Panics
///
/// Panics when a source does not parse or the program is rejected for
/// monitor misuse.
#[must_use]
pub fn outcomes(sources: &[&str]) -> Vec<ExecutionResult> {
    let mut snippets = parse_threads(sources);
    analyze(&mut snippets)
        .unwrap_or_else(|error| panic!("corpus program rejected: {error}"))
}

/// A regular outcome from per-thread print tuples.
#[must_use]
pub fn regular(outputs: &[&[i32]]) -> ExecutionResult {
    ExecutionResult::Regular(
        outputs.iter().map(|tuple| tuple.to_vec()).collect(),
    )
}

/// A division-by-zero outcome for a thread and source line.
#[must_use]
pub fn excepted(thread: usize, line: u32) -> ExecutionResult {
    ExecutionResult::Excepted {
        thread,
        loc: SourceLoc::new(line),
    }
}

/// Asserts that the produced outcome set equals the expected set,
/// regardless of discovery order.
///
/// # Panics
///
/// Panics naming any outcome that was produced but not expected, or
/// expected but not produced.
pub fn assert_outcomes(sources: &[&str], expected: &[ExecutionResult]) {
    let produced = outcomes(sources);
    for outcome in &produced {
        assert!(
            expected.contains(outcome),
            "the analysis produced {outcome:?}, which is not a legal outcome"
        );
    }
    for outcome in expected {
        assert!(
            produced.contains(outcome),
            "the analysis missed the outcome {outcome:?}"
        );
    }
}

/// Asserts that every produced outcome is among the expected ones, for
/// expectation lists that are deliberately incomplete.
///
/// # Panics
///
/// Panics naming any outcome that was produced but not expected.
pub fn assert_outcomes_within(
    sources: &[&str],
    expected: &[ExecutionResult],
) {
    for outcome in &outcomes(sources) {
        assert!(
            expected.contains(outcome),
            "the analysis produced {outcome:?}, which is not a legal outcome"
        );
    }
}
