//! Shader entry points: `vertex`, `fragment` and `kernel` functions.

use std::fmt::Write as _;

use serde::Serialize;

use crate::span::Span;
use crate::tokens::{attribute_specifiers, render, split_top_level, Token, TokenKind};
use crate::vocab::{AddressSpace, MetalAttribute, ShaderStage};

/// One attribute inside a `[[ ... ]]` specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeUse {
    /// Attribute name, e.g. `buffer` or `thread_position_in_grid`.
    pub name: String,
    /// Text between the parentheses, if any.
    pub argument: Option<String>,
    /// The Metal meaning, when the grammar knows the attribute.
    pub metal: Option<MetalAttribute>,
    /// From the attribute name to its closing parenthesis.
    pub span: Span,
}

/// An entry point parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    /// Declared name; `None` for unnamed parameters.
    pub name: Option<String>,
    /// The type without address space, name and attributes.
    pub ty: String,
    /// The address space qualifier, if one was written.
    pub address_space: Option<AddressSpace>,
    /// Attributes from the `[[ ... ]]` specifiers on the parameter.
    pub attributes: Vec<AttributeUse>,
    /// The whole parameter declaration.
    pub span: Span,
}

impl Param {
    /// Whether the parameter is declared as a pointer or reference.
    #[must_use]
    pub fn is_indirect(&self) -> bool {
        self.ty.ends_with('*') || self.ty.ends_with('&') || self.ty.contains("* ") || self.ty.contains("& ")
    }

    /// The name to use in messages.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// A shader entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPoint {
    /// Which pipeline stage the function runs in.
    pub stage: ShaderStage,
    /// Function name.
    pub name: String,
    /// Return type as written.
    pub return_type: String,
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// From the stage keyword to the closing parenthesis.
    pub span: Span,
}

/// Find the entry points declared in a token stream.
#[must_use]
pub fn outline(tokens: &[Token]) -> Vec<EntryPoint> {
    let specifiers = attribute_specifiers(tokens);
    let in_specifier = |i: usize| specifiers.iter().any(|s| s.outer.contains(&i));

    let mut entries = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind == TokenKind::Word
            && !in_specifier(i)
            && let Some(stage) = ShaderStage::from_keyword(tokens[i].text)
            && let Some((entry, next)) = entry_point_at(tokens, i, stage)
        {
            tracing::trace!(name = %entry.name, stage = %stage, "found entry point");
            entries.push(entry);
            i = next;
            continue;
        }
        i += 1;
    }
    entries
}

/// Read an entry point starting at the stage keyword at `at`.
///
/// Returns the entry point and the index just past its parameter list.
fn entry_point_at(tokens: &[Token], at: usize, stage: ShaderStage) -> Option<(EntryPoint, usize)> {
    // Return type and name, up to the opening parenthesis.
    let mut angle = 0usize;
    let mut open = None;
    for (j, token) in tokens.iter().enumerate().skip(at + 1) {
        match (token.kind, token.text) {
            (TokenKind::Punct, "(") if angle == 0 => {
                open = Some(j);
                break;
            }
            (TokenKind::Word | TokenKind::Number, _) => {}
            (TokenKind::Punct, "<") => angle += 1,
            (TokenKind::Punct, ">") => angle = angle.checked_sub(1)?,
            (TokenKind::Punct, ">>") => angle = angle.checked_sub(2)?,
            (TokenKind::Punct, "::" | "*" | "&") => {}
            (TokenKind::Punct, ",") if angle > 0 => {}
            _ => return None,
        }
    }
    let open = open?;

    let header = &tokens[at + 1..open];
    let (name, return_type) = header.split_last()?;
    if name.kind != TokenKind::Word || return_type.is_empty() {
        return None;
    }

    let close = matching_paren(tokens, open)?;
    let params = split_top_level(&tokens[open + 1..close])
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .map(parse_param)
        .collect();

    let entry = EntryPoint {
        stage,
        name: name.text.to_string(),
        return_type: render(return_type),
        params,
        span: tokens[at].span.merge(&tokens[close].span),
    };
    Some((entry, close + 1))
}

fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (j, token) in tokens.iter().enumerate().skip(open) {
        if token.is_punct("(") {
            depth += 1;
        } else if token.is_punct(")") {
            depth -= 1;
            if depth == 0 {
                return Some(j);
            }
        }
    }
    None
}

/// Parse one comma-separated parameter. `piece` is never empty.
fn parse_param(piece: &[Token]) -> Param {
    let specifiers = attribute_specifiers(piece);
    let attributes = specifiers
        .iter()
        .flat_map(|s| parse_attribute_list(&piece[s.inner.clone()]))
        .collect();

    let mut rest: Vec<&Token> = piece
        .iter()
        .enumerate()
        .filter(|(i, _)| !specifiers.iter().any(|s| s.outer.contains(i)))
        .map(|(_, t)| t)
        .collect();

    let qualifier = rest
        .iter()
        .position(|t| t.kind == TokenKind::Word && AddressSpace::from_keyword(t.text).is_some());
    let address_space = qualifier.and_then(|i| AddressSpace::from_keyword(rest.remove(i).text));

    // Array extents and default values are not part of the type.
    if let Some(cut) = rest.iter().position(|t| t.is_punct("[") || t.is_punct("=")) {
        rest.truncate(cut);
    }

    let words = rest.iter().filter(|t| t.kind == TokenKind::Word).count();
    let name = match rest.last() {
        Some(last) if last.kind == TokenKind::Word && words >= 2 => rest.pop().map(|t| t.text.to_string()),
        _ => None,
    };

    let ty: Vec<Token> = rest.into_iter().cloned().collect();
    Param {
        name,
        ty: render(&ty),
        address_space,
        attributes,
        span: piece[0].span.merge(&piece[piece.len() - 1].span),
    }
}

/// Parse the comma-separated contents of one attribute specifier.
#[must_use]
pub fn parse_attribute_list(tokens: &[Token]) -> Vec<AttributeUse> {
    split_top_level(tokens)
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            let (name, argument) = match piece.iter().position(|t| t.is_punct("(")) {
                Some(open) => {
                    let end = if piece[piece.len() - 1].is_punct(")") && piece.len() - 1 > open {
                        piece.len() - 1
                    } else {
                        piece.len()
                    };
                    (render(&piece[..open]), Some(render(&piece[open + 1..end])))
                }
                None => (render(piece), None),
            };
            let metal = MetalAttribute::recognize(&name, argument.as_deref());
            AttributeUse {
                name,
                argument,
                metal,
                span: piece[0].span.merge(&piece[piece.len() - 1].span),
            }
        })
        .collect()
}

/// Render entry points as an indented listing.
#[must_use]
pub fn render_outline(entries: &[EntryPoint]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{} {} {}  ({}:{})",
            entry.stage,
            entry.return_type,
            entry.name,
            entry.span.start_line + 1,
            entry.span.start_col + 1
        );
        for param in &entry.params {
            let _ = write!(out, "    ");
            if let Some(space) = param.address_space {
                let _ = write!(out, "{space} ");
            }
            let _ = write!(out, "{} {}", param.ty, param.display_name());
            for attribute in &param.attributes {
                match &attribute.argument {
                    Some(arg) => {
                        let _ = write!(out, " [[{}({})]]", attribute.name, arg);
                    }
                    None => {
                        let _ = write!(out, " [[{}]]", attribute.name);
                    }
                }
            }
            out.push('\n');
        }
    }
    out
}
