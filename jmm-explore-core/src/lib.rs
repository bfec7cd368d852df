//! # jmm-explore-core
//!
//! Enumerates every observably distinct outcome of a small multi-threaded
//! program under the Java memory model.  Programs are never run at real
//! concurrency; the engine explores the mathematical space of
//! memory-model-legal executions.
//!
//! ## How the space is explored
//!
//! Each thread is a pre-parsed [`snip::Snippet`].  The engine:
//!
//!  1. numbers every memory-model action across the threads,
//!  2. steps through every *synchronization order*, each interleaving of
//!     the per-thread lock/unlock/volatile sequences, discarding orders
//!     where a thread locks a monitor another thread holds,
//!  3. derives the *happens-before* partial order from program order and
//!     the synchronizes-with edges of that synchronization order,
//!  4. computes, for every shared read, the set of writes it may observe
//!     under happens-before, and iterates the Cartesian product of those
//!     choices (volatile reads have their single choice forced by the
//!     synchronization order),
//!  5. propagates the chosen values through the snippets' lazy evaluators
//!     in dependency order, discarding cyclic choices, and
//!  6. collects the distinct print tuples and division-by-zero faults.
//!
//! The result set of [`analyze`] is in discovery order; callers should
//! treat it as unordered.
//!
//! ## Costs
//!
//! The space is exponential in the number of shared reads and worse than
//! exponential in the number of synchronization actions.  This is inherent
//! to the problem; the engine only promises to keep its inner loops
//! allocation-light (the happens-before matrix and the driver's buffers
//! are reused across candidates).

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
#![allow(
    clippy::indexing_slicing,
    reason = "the enumeration state is a web of bijective index tables; \
              global, thread, and read ordinals are only ever produced in \
              range, and the hot loops stay legible with direct indexing"
)]

/// Flat numbering of actions across all snippets
mod index;

/// Interleaving enumeration and the monitor mutual-exclusion filter
mod sync_order;

/// The happens-before relation as a dense closed matrix
mod happens_before;

/// Per-read candidate writes and the write-seen Cartesian product
mod write_seen;

/// Value propagation for one candidate execution
mod driver;

/// Outcome records and deduplicating collection
mod result;
pub use result::{DisplayedResult, ExecutionResult};

/// The top-level enumeration loop
mod analysis;
pub use analysis::{analyze, InvalidMonitorUse, MonitorDiagnostic};
