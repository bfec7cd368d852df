// Make clippy as annoying as possible
#![deny(
    // All typically enabled warnings are converted into errors
    // includes correctness, suspicious, style, complexity, and perf
    clippy::all,
    // Error on cargo lints
    clippy::cargo,
)]
#![warn(
    // Warn on pedantic and in-development nursery lints
    clippy::pedantic,
    clippy::nursery,
    // Lints from "restriction" group - enforce a consistent if arbitrary style
    clippy::alloc_instead_of_core,
    clippy::arithmetic_side_effects,
    clippy::unnecessary_cast,
    clippy::as_underscore,
    clippy::assertions_on_result_states,
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::decimal_literal_representation,
    clippy::default_numeric_fallback,
    clippy::deref_by_slicing,
    clippy::empty_drop,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::expect_used,
    clippy::filetype_is_file,
    clippy::float_arithmetic,
    clippy::fn_to_numeric_cast_any,
    clippy::format_push_string,
    clippy::get_unwrap,
    clippy::if_then_some_else_none,
    clippy::indexing_slicing,
    clippy::large_include_file,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::map_err_ignore,
    clippy::mem_forget,
    clippy::missing_docs_in_private_items,
    clippy::missing_enforced_import_renames,
    clippy::mixed_read_write_in_expression,
    clippy::mod_module_files,
    clippy::multiple_inherent_impl,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::partial_pub_fields,
    clippy::pattern_type_mismatch,
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_name_method,
    clippy::unseparated_literal_suffix,
    clippy::shadow_unrelated,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::str_to_string,
    clippy::string_slice,
    clippy::string_to_string,
    clippy::suspicious_xor_used_as_pow,
    clippy::todo,
    clippy::try_err,
    clippy::undocumented_unsafe_blocks,
    clippy::unimplemented,
    clippy::unnecessary_safety_comment,
    clippy::unnecessary_safety_doc,
    clippy::unnecessary_self_imports,
    clippy::unneeded_field_pattern,
    clippy::unreachable,
    clippy::unwrap_in_result,
    clippy::unwrap_used,
    clippy::use_debug,
    clippy::verbose_file_reads,
)]

//! Parsing for the snippet language.
//!
//! A snippet source file is a sequence of statements: `print(expr);`,
//! assignments and compound assignments to local/shared/volatile names,
//! `++`/`--` statements, and `lock()`/`unlock()` calls on monitor names.
//! Expressions combine decimal constants and variables with the binary
//! integer operators at their usual Java precedence.
//!
//! [`parse_snippet`] turns one source file into a lowered [`snip::Snippet`],
//! emitting instructions in source order: within a statement, reads take
//! effect left to right before the instruction that combines them.

use core::fmt;

use snip::Snippet;

/// Statement and expression trees produced by the grammar
mod ast;
/// nom parsers from source text to the statement trees
mod grammar;
/// Lowering from statement trees to `emit_*` calls on a snippet
mod lower;

/// Why a snippet source file was rejected.
///
/// Covers both grammar violations and mis-kinded names, e.g. a method call
/// on something that is not a monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based source line the error was found on
    pub line: u32,
    /// Human-readable description of the problem
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parses one snippet source file into a lowered program.
///
/// `name` becomes the snippet's display name, typically the path the source
/// was read from.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying the offending line if the source does
/// not match the snippet grammar, or if a name is used against its kind
/// (reading a monitor, locking a local, calling an unknown function).
pub fn parse_snippet(name: &str, source: &str) -> Result<Snippet, ParseError> {
    let statements = grammar::program(source)?;
    lower::lower(name, &statements)
}
