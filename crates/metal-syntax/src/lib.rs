//! Metal Shading Language syntax support on top of `tree-sitter-metal`.
//!
//! This crate provides:
//! - A scoped parser session and the grammar smoke test
//! - Parsing into a tree plus a leaf token stream
//! - The Metal vocabulary the grammar adds to C++
//! - Entry point outlines, vocabulary usage and diagnostics
//!
//! # Example
//!
//! ```
//! use metal_syntax::Parser;
//!
//! let source = "kernel void fill(device float* out [[buffer(0)]]) {}\n";
//!
//! let parsed = Parser::parse(source).unwrap();
//! let entries = parsed.outline();
//! assert_eq!(entries[0].name, "fill");
//! ```

pub mod diagnostics;
pub mod outline;
pub mod parser;
pub mod session;
pub mod smoke;
pub mod span;
pub mod tokens;
pub mod usage;
pub mod vocab;

pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use outline::{render_outline, AttributeUse, EntryPoint, Param};
pub use parser::{check, ParseError, ParseResult, ParsedSource, Parser};
pub use session::{check_abi, verify_grammar_loads, LoadError, ParserSession};
pub use span::Span;
pub use tokens::{Token, TokenKind};
pub use usage::Usage;
pub use vocab::{AddressSpace, BuiltinType, MetalAttribute, ShaderStage};
