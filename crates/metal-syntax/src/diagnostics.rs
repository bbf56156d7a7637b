//! Syntax and entry point diagnostics for Metal sources.
//!
//! Syntax diagnostics come from the parse tree's `ERROR` and `MISSING`
//! nodes. Entry point diagnostics check the rules Metal places on shader
//! signatures:
//! - kernels return `void`
//! - pointer and reference arguments name an address space
//! - a resource slot is bound at most once per entry point
//!
//! A `device` or `constant` argument without a `[[buffer(n)]]` attribute is
//! a warning: Metal assigns it an index, which the host side then has to
//! guess.

use std::collections::HashMap;

use serde::Serialize;
use tree_sitter::{Node, Tree};

use crate::outline::EntryPoint;
use crate::span::Span;
use crate::vocab::{AddressSpace, BindingKind, ShaderStage};

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// What was found.
    pub kind: DiagnosticKind,
    /// How serious it is.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Source location.
    pub span: Span,
}

/// Kind of diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Text the grammar could not parse.
    SyntaxError,
    /// A token the parser had to insert.
    MissingToken,
    /// A kernel with a non-`void` return type.
    NonVoidKernel,
    /// Pointer or reference argument without an address space.
    MissingAddressSpace,
    /// Two arguments bound to the same resource slot.
    DuplicateBinding,
    /// Buffer argument without an explicit `[[buffer(n)]]` index.
    ImplicitBinding,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Error that should be fixed.
    Error,
    /// Warning that may indicate a problem.
    Warning,
}

impl Diagnostic {
    fn error(kind: DiagnosticKind, message: String, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message,
            span,
        }
    }

    fn warning(kind: DiagnosticKind, message: String, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message,
            span,
        }
    }
}

/// Longest snippet of offending text quoted in a syntax error.
const SNIPPET_LEN: usize = 32;

/// Report the `ERROR` and `MISSING` nodes of `tree`.
#[must_use]
pub fn syntax_diagnostics(tree: &Tree, source: &str) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    collect_syntax(tree.root_node(), source, &mut diags);
    diags
}

fn collect_syntax(node: Node, source: &str, diags: &mut Vec<Diagnostic>) {
    if node.is_missing() {
        diags.push(Diagnostic::error(
            DiagnosticKind::MissingToken,
            format!("missing `{}`", node.kind()),
            Span::from_node(&node),
        ));
        return;
    }
    if node.is_error() {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("");
        diags.push(Diagnostic::error(
            DiagnosticKind::SyntaxError,
            format!("unexpected `{}`", snippet(text)),
            Span::from_node(&node),
        ));
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_syntax(child, source, diags);
    }
}

/// First line of `text`, shortened to [`SNIPPET_LEN`] characters.
fn snippet(text: &str) -> String {
    let line = text.trim().lines().next().unwrap_or("");
    if line.chars().count() > SNIPPET_LEN {
        let short: String = line.chars().take(SNIPPET_LEN).collect();
        format!("{short}...")
    } else {
        line.to_string()
    }
}

/// Check entry point signatures.
#[must_use]
pub fn entry_point_diagnostics(entries: &[EntryPoint]) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for entry in entries {
        if entry.stage == ShaderStage::Kernel && entry.return_type != "void" {
            diags.push(Diagnostic::error(
                DiagnosticKind::NonVoidKernel,
                format!(
                    "kernel `{}` must return `void`, found `{}`",
                    entry.name, entry.return_type
                ),
                entry.span,
            ));
        }

        let mut bound: HashMap<(BindingKind, u32), &str> = HashMap::new();
        for param in &entry.params {
            if param.is_indirect() && param.address_space.is_none() {
                diags.push(Diagnostic::error(
                    DiagnosticKind::MissingAddressSpace,
                    format!(
                        "argument `{}` of `{}` is a pointer or reference without an address space",
                        param.display_name(),
                        entry.name
                    ),
                    param.span,
                ));
            }

            let is_buffer = matches!(param.address_space, Some(AddressSpace::Device | AddressSpace::Constant));
            let has_index = param
                .attributes
                .iter()
                .any(|a| matches!(a.metal.and_then(|m| m.binding()), Some((BindingKind::Buffer, _))));
            if is_buffer && !has_index {
                diags.push(Diagnostic::warning(
                    DiagnosticKind::ImplicitBinding,
                    format!(
                        "argument `{}` of `{}` has no `[[buffer(n)]]` index",
                        param.display_name(),
                        entry.name
                    ),
                    param.span,
                ));
            }

            let slots = param
                .attributes
                .iter()
                .filter_map(|a| a.metal.and_then(|m| m.binding()))
                .filter(|(kind, _)| *kind != BindingKind::Color);
            for (kind, index) in slots {
                if let Some(first) = bound.insert((kind, index), param.display_name()) {
                    diags.push(Diagnostic::error(
                        DiagnosticKind::DuplicateBinding,
                        format!(
                            "`{}({index})` of `{}` is already bound to `{first}`",
                            kind.as_str(),
                            entry.name
                        ),
                        param.span,
                    ));
                }
            }
        }
    }
    diags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::outline;
    use crate::parser::Parser;
    use crate::tokens::lex;

    fn entry_diags(source: &str) -> Vec<Diagnostic> {
        entry_point_diagnostics(&outline(&lex(source)))
    }

    #[test]
    fn valid_cpp_has_no_syntax_errors() {
        let parsed = Parser::parse("int main() { return 0; }\n").unwrap();
        assert!(syntax_diagnostics(parsed.tree(), parsed.source()).is_empty());
    }

    #[test]
    fn broken_source_reports_syntax_errors() {
        let source = "int main( { return 0; }\n";
        let parsed = Parser::parse(source).unwrap();
        let diags = syntax_diagnostics(parsed.tree(), source);
        assert!(!diags.is_empty());
        assert!(diags.iter().all(|d| d.severity == Severity::Error));
        assert!(diags
            .iter()
            .all(|d| matches!(d.kind, DiagnosticKind::SyntaxError | DiagnosticKind::MissingToken)));
    }

    #[test]
    fn long_snippets_are_shortened() {
        let text = "a".repeat(40);
        assert_eq!(snippet(&text), format!("{}...", "a".repeat(32)));
        assert_eq!(snippet("  ab\ncd"), "ab");
    }

    #[test]
    fn kernel_must_return_void() {
        let diags = entry_diags("kernel float f(uint i [[thread_position_in_grid]]) { return 0; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::NonVoidKernel);
        assert!(diags[0].message.contains("found `float`"));
    }

    #[test]
    fn vertex_may_return_values() {
        assert!(entry_diags("vertex float4 v(uint id [[vertex_id]]) { return 0; }").is_empty());
    }

    #[test]
    fn pointer_without_address_space() {
        let diags = entry_diags("kernel void f(float* data [[buffer(0)]], thread int& n) {}");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::MissingAddressSpace);
        assert!(diags[0].message.contains("`data`"));
    }

    #[test]
    fn duplicate_buffer_binding() {
        let diags = entry_diags(
            "kernel void f(device float* a [[buffer(0)]], device float* b [[buffer(0)]], \
             texture2d<float> t [[texture(0)]]) {}",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::DuplicateBinding);
        assert_eq!(diags[0].message, "`buffer(0)` of `f` is already bound to `a`");
    }

    #[test]
    fn buffer_without_index_is_a_warning() {
        let diags = entry_diags(
            "kernel void f(device float* a, constant float4& c [[buffer(1)]], thread float& t) {}",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::ImplicitBinding);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].message, "argument `a` of `f` has no `[[buffer(n)]]` index");
    }

    #[test]
    fn texture_index_does_not_count_as_buffer_index() {
        let diags = entry_diags("kernel void f(device float* a [[texture(0)]]) {}");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::ImplicitBinding);
    }

    #[test]
    fn bindings_are_per_entry_point() {
        let source = "kernel void f(device float* a [[buffer(0)]]) {}\n\
                      kernel void g(device float* a [[buffer(0)]]) {}";
        assert!(entry_diags(source).is_empty());
    }
}
