//! This crate provides Metal Shading Language support for the [tree-sitter]
//! parsing library.
//!
//! Metal is C++14 plus reserved words, so the language is built on the
//! tree-sitter-cpp parse tables with its own keyword lexer: address spaces
//! lex as type qualifiers, `kernel`/`vertex`/`fragment` as storage class
//! specifiers, and the vector, matrix and packed types as primitive types.
//!
//! [tree-sitter]: https://tree-sitter.github.io/

use tree_sitter::Language;

unsafe extern "C" {
    fn tree_sitter_metal() -> *const ();
}

/// Get the tree-sitter [Language] for this grammar.
pub fn language() -> Language {
    unsafe { Language::from_raw(tree_sitter_metal() as _) }
}

/// The content of the [`node-types.json`] file for this grammar.
///
/// Metal adds no node kinds of its own, so these are the C++ node types.
///
/// [`node-types.json`]: https://tree-sitter.github.io/tree-sitter/using-parsers#static-node-types
pub const NODE_TYPES: &str = tree_sitter_cpp::NODE_TYPES;

/// The symbol highlighting queries.
pub const HIGHLIGHTS_QUERY: &str = include_str!("../../queries/highlights.scm");
