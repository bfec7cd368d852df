use core::fmt;

use snip::SourceLoc;

/// One observably distinct outcome of the program under analysis.
///
/// Equality is structural; the analysis keeps at most one copy of each
/// outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Every thread completed; one tuple of printed values per thread, in
    /// each thread's program order
    Regular(Vec<Vec<i32>>),
    /// Some conforming execution divides by zero
    Excepted {
        /// Index of the faulting thread
        thread: usize,
        /// Location of the faulting division
        loc: SourceLoc,
    },
}

impl ExecutionResult {
    /// Renders this result with thread names supplied by the caller,
    /// typically the source file paths.
    #[must_use]
    pub const fn display<'a>(
        &'a self,
        thread_names: &'a [String],
    ) -> DisplayedResult<'a> {
        DisplayedResult {
            result: self,
            thread_names,
        }
    }
}

/// Borrow of a result plus the thread names needed to render it.
pub struct DisplayedResult<'a> {
    /// The result being rendered
    result: &'a ExecutionResult,
    /// Display name of each thread, indexed by thread
    thread_names: &'a [String],
}

impl fmt::Display for DisplayedResult<'_> {
    /// Regular outcomes are the threads' print tuples separated by `|`;
    /// excepted outcomes name the faulting thread and line.
    ///
    /// ```
    /// # use jmm_explore_core::ExecutionResult;
    /// let result = ExecutionResult::Regular(vec![vec![1, 2], vec![3]]);
    /// let names = vec!["a".to_owned(), "b".to_owned()];
    /// assert_eq!(result.display(&names).to_string(), " 1 2 | 3 ");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            ExecutionResult::Regular(outputs) => {
                for (thread, tuple) in outputs.iter().enumerate() {
                    if thread > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, " ")?;
                    for value in tuple {
                        write!(f, "{value} ")?;
                    }
                }
                Ok(())
            }
            ExecutionResult::Excepted { thread, loc } => {
                let name = self
                    .thread_names
                    .get(*thread)
                    .map_or("?", String::as_str);
                write!(
                    f,
                    "division by zero exception in thread {thread} ({name}) \
                     at {loc}"
                )
            }
        }
    }
}

/// Appends a result unless an equal one is already present.
///
/// A linear scan is enough: the number of distinct outcomes is bounded by
/// the program's legal observable behavior, not by the size of the
/// execution space.
pub fn record(results: &mut Vec<ExecutionResult>, result: ExecutionResult) {
    if !results.contains(&result) {
        results.push(result);
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;

    #[test]
    fn regular_results_format_with_thread_separators() {
        let names = vec!["a".to_owned(), "b".to_owned()];
        let result = ExecutionResult::Regular(vec![vec![1, 2], vec![3]]);
        assert_eq!(result.display(&names).to_string(), " 1 2 | 3 ");

        let empty = ExecutionResult::Regular(vec![vec![], vec![]]);
        assert_eq!(empty.display(&names).to_string(), " | ");
    }

    #[test]
    fn excepted_results_name_the_thread_and_line() {
        let names = vec!["left.snip".to_owned(), "right.snip".to_owned()];
        let result = ExecutionResult::Excepted {
            thread: 0,
            loc: SourceLoc::new(1),
        };
        assert_eq!(
            result.display(&names).to_string(),
            "division by zero exception in thread 0 (left.snip) at line 1"
        );
    }

    #[test]
    fn recording_deduplicates() {
        let mut results = Vec::new();
        record(&mut results, ExecutionResult::Regular(vec![vec![1]]));
        record(&mut results, ExecutionResult::Regular(vec![vec![2]]));
        record(&mut results, ExecutionResult::Regular(vec![vec![1]]));
        assert_eq!(results.len(), 2);
    }
}
