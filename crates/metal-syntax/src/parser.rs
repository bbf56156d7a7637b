//! Parsing Metal sources with the tree-sitter grammar.

use thiserror::Error;
use tree_sitter::{Node, Tree};

use crate::diagnostics::{entry_point_diagnostics, syntax_diagnostics, Diagnostic};
use crate::outline::{outline, EntryPoint};
use crate::session::{LoadError, ParserSession};
use crate::tokens::{tokens, Token};
use crate::usage::{usage, Usage};

/// Errors that can occur during parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The grammar could not be attached to a parser.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Tree-sitter returned no tree.
    #[error("parsing failed")]
    NoTree,
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Entry point for parsing Metal sources.
pub struct Parser;

impl Parser {
    /// Parse source into a tree-sitter tree.
    pub fn parse_tree(source: &str) -> ParseResult<Tree> {
        let mut session = ParserSession::open()?;
        session.parse(source).ok_or(ParseError::NoTree)
    }

    /// Parse source text, keeping it alongside its tree.
    pub fn parse(source: &str) -> ParseResult<ParsedSource<'_>> {
        let tree = Self::parse_tree(source)?;
        tracing::debug!(bytes = source.len(), errors = tree.root_node().has_error(), "parsed source");
        Ok(ParsedSource { source, tree })
    }
}

/// A parse tree together with the text it was parsed from.
pub struct ParsedSource<'a> {
    source: &'a str,
    tree: Tree,
}

impl<'a> ParsedSource<'a> {
    /// The parsed text.
    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.source
    }

    /// The tree-sitter tree.
    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The root node, a `translation_unit`.
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Whether the tree contains `ERROR` or `MISSING` nodes.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.root().has_error()
    }

    /// The tree as an S-expression.
    #[must_use]
    pub fn sexp(&self) -> String {
        self.root().to_sexp()
    }

    /// Leaf tokens in source order.
    #[must_use]
    pub fn tokens(&self) -> Vec<Token<'a>> {
        tokens(&self.tree, self.source)
    }

    /// Shader entry points.
    #[must_use]
    pub fn outline(&self) -> Vec<EntryPoint> {
        outline(&self.tokens())
    }

    /// Metal vocabulary counts.
    #[must_use]
    pub fn usage(&self) -> Usage {
        usage(&self.tokens())
    }

    /// Syntax and entry point diagnostics, ordered by position.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diags = syntax_diagnostics(&self.tree, self.source);
        diags.extend(entry_point_diagnostics(&self.outline()));
        diags.sort_by_key(|d| (d.span.start, d.span.end));
        diags
    }
}

/// Parse `source` and return its diagnostics.
pub fn check(source: &str) -> ParseResult<Vec<Diagnostic>> {
    Ok(Parser::parse(source)?.diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::vocab::{is_builtin_type, BuiltinType};

    const ADD_ARRAYS: &str = r#"#include <metal_stdlib>
using namespace metal;

kernel void add_arrays(device const float* a [[buffer(0)]],
                       device const float* b [[buffer(1)]],
                       device float* result [[buffer(2)]],
                       uint index [[thread_position_in_grid]])
{
    result[index] = a[index] + b[index];
}
"#;

    const SHADE: &str = r#"struct VertexOut {
    float4 position [[position]];
    half3 color;
};

vertex VertexOut project(uint vid [[vertex_id]],
                         constant float4* positions [[buffer(0)]],
                         constant float4x4& mvp [[buffer(1)]])
{
    VertexOut out;
    out.position = mvp * positions[vid];
    out.color = half3(1.0);
    return out;
}

fragment half4 shade(VertexOut in [[stage_in]],
                     texture2d<float> tex [[texture(0)]],
                     sampler s [[sampler(0)]])
{
    thread float4 c = tex.sample(s, in.position.xy);
    return half4(c) * half4(in.color, 1.0h);
}
"#;

    #[test]
    fn parse_empty() {
        let parsed = Parser::parse("").unwrap();
        assert!(!parsed.has_errors());
        assert!(parsed.tokens().is_empty());
        assert!(parsed.outline().is_empty());
    }

    #[test]
    fn parse_plain_cpp() {
        let parsed = Parser::parse("struct S { int x; };\nint f(S s) { return s.x; }\n").unwrap();
        assert_eq!(parsed.root().kind(), "translation_unit");
        assert!(!parsed.has_errors());
        assert!(parsed.sexp().starts_with("(translation_unit"));
    }

    #[test]
    fn parse_broken_source() {
        let parsed = Parser::parse("int f( {").unwrap();
        assert!(parsed.has_errors());
    }

    #[test]
    fn check_reports_entry_point_rules() {
        let diags = check("kernel int f(float* p) {}").unwrap();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::NonVoidKernel));
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::MissingAddressSpace));
    }

    #[test]
    fn check_plain_cpp_is_clean() {
        assert!(check("int main() { return 0; }").unwrap().is_empty());
    }

    #[test]
    fn kernel_parses_without_errors() {
        let parsed = Parser::parse(ADD_ARRAYS).unwrap();
        assert!(!parsed.has_errors(), "{}", parsed.sexp());
        assert!(check(ADD_ARRAYS).unwrap().is_empty());
    }

    #[test]
    fn vertex_and_fragment_parse_without_errors() {
        let parsed = Parser::parse(SHADE).unwrap();
        assert!(!parsed.has_errors(), "{}", parsed.sexp());
        assert!(check(SHADE).unwrap().is_empty());
        assert_eq!(parsed.outline().len(), 2);
    }

    #[test]
    fn metal_keywords_shape_the_tree() {
        let parsed = Parser::parse("kernel void f(device float4* out [[buffer(0)]]) {}").unwrap();
        let sexp = parsed.sexp();
        assert!(sexp.starts_with("(translation_unit (function_definition (storage_class_specifier) type: (primitive_type)"));
        assert!(sexp.contains("(parameter_declaration (type_qualifier) type: (primitive_type)"));
    }

    #[test]
    fn builtin_scalar_vector_and_matrix_types_are_primitive() {
        let scalars = ["half", "float", "int", "uint", "short", "ushort", "char", "uchar", "bool"];
        let mut names: Vec<String> = vec!["half".into(), "sampler".into(), "atomic_int".into()];
        for scalar in scalars {
            for n in 2..=4 {
                names.push(format!("{scalar}{n}"));
                names.push(format!("packed_{scalar}{n}"));
                for m in 2..=4 {
                    names.push(format!("{scalar}{n}x{m}"));
                }
            }
        }

        for name in names.iter().filter(|n| {
            matches!(
                BuiltinType::classify(n),
                Some(BuiltinType::Half | BuiltinType::Vector { .. } | BuiltinType::Matrix { .. } | BuiltinType::Sampler | BuiltinType::Atomic)
            )
        }) {
            let source = format!("{name} x;");
            let parsed = Parser::parse(&source).unwrap();
            assert!(
                parsed.sexp().starts_with("(translation_unit (declaration type: (primitive_type)"),
                "{name}: {}",
                parsed.sexp()
            );
        }
        assert!(!is_builtin_type("packed_bool2"));
    }

    #[test]
    fn diagnostics_are_ordered() {
        let diags = check("kernel int f(float* p) {}\nint g( {").unwrap();
        assert!(diags.windows(2).all(|w| w[0].span.start <= w[1].span.start));
    }
}
