//! Smoke test for the grammar binding.
//!
//! Reports on the same narrative as the other language bindings, and fails
//! hard when the grammar cannot be attached to a parser.

use std::io::{self, Write};

use crate::session::verify_grammar_loads;

/// Message of the assertion that fails when the grammar does not load.
pub const LOAD_FAILURE: &str = "Error loading Metal grammar";

/// A named check in the smoke suite.
#[derive(Debug, Clone, Copy)]
pub struct SmokeCase {
    /// Name reported in the narrative.
    pub name: &'static str,
    /// The check; fails by panicking.
    pub run: fn(),
}

/// The smoke suite.
pub const CASES: &[SmokeCase] = &[SmokeCase {
    name: "test_can_load_grammar",
    run: test_can_load_grammar,
}];

/// Attach the Metal grammar to a fresh parser; panics if it is rejected.
pub fn test_can_load_grammar() {
    assert_loaded(verify_grammar_loads());
}

/// Panic with [`LOAD_FAILURE`] unless `loaded`.
pub fn assert_loaded(loaded: bool) {
    assert!(loaded, "{LOAD_FAILURE}");
}

/// Run `cases`, writing the narrative to `out`.
///
/// A failing case panics; nothing after the failing case is written.
pub fn run_suite<W: Write>(out: &mut W, cases: &[SmokeCase]) -> io::Result<()> {
    writeln!(out, "Running tree-sitter-metal C binding tests...")?;
    writeln!(out)?;
    for case in cases {
        tracing::debug!(case = case.name, "running smoke case");
        (case.run)();
        writeln!(out, "✓ {} passed", case.name)?;
    }
    writeln!(out)?;
    writeln!(out, "All tests passed! ✓")?;
    out.flush()
}

/// Run the smoke suite.
pub fn run<W: Write>(out: &mut W) -> io::Result<()> {
    run_suite(out, CASES)
}
