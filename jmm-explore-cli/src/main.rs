//! Explores the outcomes of a small multi-threaded program under the Java
//! memory model.  Takes one snippet source file per thread and prints one
//! line per observably distinct outcome.
//!
//! Run with `--help` for usage.

use std::{fs, path::PathBuf};

use clap::Parser;
use jmm_explore_core::analyze;
use snip::Snippet;
use snip_parser::parse_snippet;

#[derive(Debug, Parser)]
#[command(about, long_about = None)]
struct Args {
    /// One snippet source file per thread
    sources: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mut names = Vec::with_capacity(args.sources.len());
    let mut texts = Vec::with_capacity(args.sources.len());
    let mut missing_file = false;
    for path in &args.sources {
        names.push(path.display().to_string());
        match fs::read_to_string(path) {
            Ok(text) => texts.push(text),
            Err(_) => {
                eprintln!(
                    "Error: Source file {} doesn't exist.",
                    path.display()
                );
                missing_file = true;
                texts.push(String::new());
            }
        }
    }
    if missing_file {
        eprintln!("Terminating due to a non-existing source file.");
        return;
    }

    let mut snippets: Vec<Snippet> = Vec::with_capacity(texts.len());
    let mut unparsable_file = false;
    for (name, text) in names.iter().zip(&texts) {
        match parse_snippet(name, text) {
            Ok(snippet) => snippets.push(snippet),
            Err(error) => {
                eprintln!("Error: {name}: {error}");
                unparsable_file = true;
            }
        }
    }
    if unparsable_file {
        eprintln!("Terminating due to an unparsable source file.");
        return;
    }

    match analyze(&mut snippets) {
        Ok(results) => {
            for result in &results {
                println!("{}", result.display(&names));
            }
        }
        Err(invalid) => {
            for diagnostic in &invalid.diagnostics {
                eprintln!("{diagnostic}");
            }
            eprintln!("Terminating due to invalid monitor use.");
        }
    }
}
