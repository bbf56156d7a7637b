//! Leaf tokens of a parse tree.
//!
//! Metal constructs are recognised on the token stream rather than on tree
//! shape, so the same analysis works on trees that went through error
//! recovery.

use std::ops::Range;

use serde::Serialize;
use tree_sitter::{Node, Tree};

use crate::span::Span;

/// Coarse lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Identifier or keyword.
    Word,
    /// Numeric literal.
    Number,
    /// String, character or header-name literal, or a macro body.
    Literal,
    /// Operator or delimiter.
    Punct,
}

/// A single token borrowed from the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    /// Lexical class.
    pub kind: TokenKind,
    /// The token's text.
    pub text: &'a str,
    /// Where the token sits in the source.
    pub span: Span,
}

impl Token<'_> {
    /// Whether this token is the word `text`.
    #[must_use]
    pub fn is_word(&self, text: &str) -> bool {
        self.kind == TokenKind::Word && self.text == text
    }

    /// Whether this token is the punctuation `text`.
    #[must_use]
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }
}

/// Nodes whose whole text is one token.
const ATOMIC_KINDS: &[&str] = &[
    "string_literal",
    "raw_string_literal",
    "char_literal",
    "concatenated_string",
    "system_lib_string",
    "preproc_arg",
];

/// Collect the leaf tokens of `tree` in source order.
pub fn tokens<'a>(tree: &Tree, source: &'a str) -> Vec<Token<'a>> {
    let mut out = Vec::new();
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        let descend = match node.kind() {
            "comment" => false,
            kind if ATOMIC_KINDS.contains(&kind) => {
                push_node(&mut out, &node, source, Some(TokenKind::Literal));
                false
            }
            _ if node.child_count() == 0 => {
                push_node(&mut out, &node, source, None);
                false
            }
            _ => true,
        };

        if descend && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return out;
            }
        }
    }
}

fn push_node<'a>(out: &mut Vec<Token<'a>>, node: &Node, source: &'a str, kind: Option<TokenKind>) {
    if node.is_missing() || node.start_byte() == node.end_byte() {
        return;
    }
    let Some(text) = source.get(node.byte_range()).filter(|t| !t.trim().is_empty()) else {
        return;
    };
    let span = Span::from_node(node);

    // Characters error recovery could not tokenize end up in one leaf.
    if node.is_error() {
        out.extend(lex_within(text, span));
        return;
    }
    out.push(Token {
        kind: kind.unwrap_or_else(|| classify(text)),
        text,
        span,
    });
}

fn classify(text: &str) -> TokenKind {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), _) if c.is_alphabetic() || c == '_' => TokenKind::Word,
        (Some(c), _) if c.is_ascii_digit() => TokenKind::Number,
        (Some('.'), Some(c)) if c.is_ascii_digit() => TokenKind::Number,
        (Some('"' | '\''), _) => TokenKind::Literal,
        _ => TokenKind::Punct,
    }
}

const TWO_CHAR_PUNCT: &[&str] = &[
    "::", "[[", "]]", "->", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "++", "--", "+=", "-=",
    "*=", "/=",
];

/// Tokenize `source` without a grammar.
///
/// Comments and whitespace are dropped. Used for error-recovery leaves and
/// for analysing fragments that never went through the parser.
#[must_use]
pub fn lex(source: &str) -> Vec<Token<'_>> {
    lex_within(source, Span::default())
}

/// Tokenize `text`, which starts at `origin`.
fn lex_within(text: &str, origin: Span) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let rest = &text[i..];
        let c = rest.chars().next().unwrap_or(' ');
        let (len, kind) = if c.is_whitespace() {
            (c.len_utf8(), None)
        } else if rest.starts_with("//") {
            (rest.find('\n').unwrap_or(rest.len()), None)
        } else if rest.starts_with("/*") {
            (rest[2..].find("*/").map_or(rest.len(), |n| n + 4), None)
        } else if c.is_alphabetic() || c == '_' {
            (take_while(rest, |c| c.is_alphanumeric() || c == '_'), Some(TokenKind::Word))
        } else if c.is_ascii_digit() || (c == '.' && rest[1..].starts_with(|d: char| d.is_ascii_digit())) {
            (take_while(rest, |c| c.is_alphanumeric() || c == '.'), Some(TokenKind::Number))
        } else if c == '"' || c == '\'' {
            (quoted_len(rest, c), Some(TokenKind::Literal))
        } else if let Some(p) = TWO_CHAR_PUNCT.iter().find(|p| rest.starts_with(**p)) {
            (p.len(), Some(TokenKind::Punct))
        } else {
            (c.len_utf8(), Some(TokenKind::Punct))
        };

        if let Some(kind) = kind {
            let range = i..i + len;
            out.push(Token {
                kind,
                text: &text[range.clone()],
                span: origin.slice(text, range),
            });
        }
        i += len;
    }
    out
}

fn take_while(text: &str, pred: impl Fn(char) -> bool) -> usize {
    text.find(|c: char| !pred(c)).unwrap_or(text.len())
}

/// Length of a quoted literal including both quotes; unterminated literals
/// run to the end of the line.
fn quoted_len(text: &str, quote: char) -> usize {
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        match c {
            '\n' => return i,
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => return i + 1,
            _ => escaped = false,
        }
    }
    text.len()
}

/// A `[[ ... ]]` attribute specifier in a token slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpecifier {
    /// Token indices including the brackets.
    pub outer: Range<usize>,
    /// Token indices of the attribute list.
    pub inner: Range<usize>,
}

/// Find the attribute specifiers in `tokens`.
///
/// The opening and closing brackets may each be one `[[`/`]]` token or two
/// adjacent `[`/`]` tokens.
#[must_use]
pub fn attribute_specifiers(tokens: &[Token]) -> Vec<AttributeSpecifier> {
    let mut found = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let Some(open) = double_bracket(tokens, i, "[[", "[") else {
            i += 1;
            continue;
        };
        let start = i + open;
        let mut depth = 0usize;
        let mut close = None;
        for j in start..tokens.len() {
            match tokens[j].text {
                "(" => depth += 1,
                ")" => depth = depth.saturating_sub(1),
                _ if depth == 0 => {
                    if let Some(width) = double_bracket(tokens, j, "]]", "]") {
                        close = Some((j, width));
                        break;
                    }
                }
                _ => {}
            }
        }
        match close {
            Some((j, width)) => {
                found.push(AttributeSpecifier {
                    outer: i..j + width,
                    inner: start..j,
                });
                i = j + width;
            }
            None => i += 1,
        }
    }
    found
}

/// Width in tokens of a double bracket at `i`, if there is one.
fn double_bracket(tokens: &[Token], i: usize, joined: &str, single: &str) -> Option<usize> {
    let token = &tokens[i];
    if token.is_punct(joined) {
        return Some(1);
    }
    let next = tokens.get(i + 1)?;
    (token.is_punct(single) && next.is_punct(single) && token.span.end == next.span.start).then_some(2)
}

/// Render tokens back to text with canonical spacing.
#[must_use]
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        if let Some(p) = prev {
            let wordish = token.kind != TokenKind::Punct;
            let after = p.kind != TokenKind::Punct || matches!(p.text, ">" | ">>" | "*" | "&" | "&&");
            if (wordish && after) || p.is_punct(",") {
                out.push(' ');
            }
        }
        out.push_str(token.text);
        prev = Some(token);
    }
    out
}

/// Split `tokens` on commas outside any brackets.
#[must_use]
pub fn split_top_level<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<&'t [Token<'a>]> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Punct {
            continue;
        }
        match token.text {
            "(" | "[" | "[[" | "<" | "{" => depth += 1,
            ")" | "]" | "]]" | ">" | "}" => depth = depth.saturating_sub(1),
            ">>" => depth = depth.saturating_sub(2),
            "," if depth == 0 => {
                pieces.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&tokens[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use proptest::prelude::*;

    fn texts<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn lex_kernel_signature() {
        let tokens = lex("kernel void f(device float* a [[buffer(0)]])");
        assert_eq!(
            texts(&tokens),
            vec![
                "kernel", "void", "f", "(", "device", "float", "*", "a", "[[", "buffer", "(", "0",
                ")", "]]", ")"
            ]
        );
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[11].kind, TokenKind::Number);
    }

    #[test]
    fn lex_drops_comments_and_keeps_literals() {
        let tokens = lex("a /* b */ \"c d\" // e\n'f' 1.5f");
        assert_eq!(texts(&tokens), vec!["a", "\"c d\"", "'f'", "1.5f"]);
        assert_eq!(tokens[1].kind, TokenKind::Literal);
        assert_eq!(tokens[3].kind, TokenKind::Number);
    }

    #[test]
    fn lex_tracks_positions() {
        let tokens = lex("int a;\n  float4 b;");
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!(b.span.start_line, 1);
        assert_eq!(b.span.start_col, 9);
        assert_eq!(b.span.start, 16);
    }

    #[test]
    fn tree_tokens_skip_comments() {
        let source = "// header\nint main() { return 0; }\n";
        let parsed = Parser::parse(source).unwrap();
        let tokens = parsed.tokens();
        assert_eq!(
            texts(&tokens),
            vec!["int", "main", "(", ")", "{", "return", "0", ";", "}"]
        );
    }

    #[test]
    fn tree_tokens_keep_string_literals_whole() {
        let parsed = Parser::parse("const char* s = \"a, b\";").unwrap();
        let tokens = parsed.tokens();
        let literal = tokens.iter().find(|t| t.kind == TokenKind::Literal).unwrap();
        assert_eq!(literal.text, "\"a, b\"");
    }

    #[test]
    fn tree_tokens_cover_metal_keywords() {
        let source = "kernel void f(device float* a [[buffer(0)]]) {}";
        let parsed = Parser::parse(source).unwrap();
        let tokens = parsed.tokens();
        assert!(tokens.iter().any(|t| t.is_word("kernel")));
        assert!(tokens.iter().any(|t| t.is_word("device")));
        assert!(tokens.iter().any(|t| t.is_word("buffer")));
    }

    #[test]
    fn specifiers_with_joined_brackets() {
        let tokens = lex("x [[buffer(0), flat]] y");
        let found = attribute_specifiers(&tokens);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].outer, 1..9);
        assert_eq!(texts(&tokens[found[0].inner.clone()]), vec!["buffer", "(", "0", ")", ",", "flat"]);
    }

    fn punct(text: &str, at: u32) -> Token<'_> {
        let end = at + text.len() as u32;
        Token {
            kind: if text == "flat" { TokenKind::Word } else { TokenKind::Punct },
            text,
            span: Span::new(at, end, 0, at, 0, end),
        }
    }

    #[test]
    fn specifiers_with_split_brackets() {
        let tokens = vec![punct("[", 0), punct("[", 1), punct("flat", 2), punct("]", 6), punct("]", 7)];
        let found = attribute_specifiers(&tokens);
        assert_eq!(found, vec![AttributeSpecifier { outer: 0..5, inner: 2..3 }]);
    }

    #[test]
    fn separated_brackets_are_not_specifiers() {
        let tokens = vec![punct("[", 0), punct("[", 2), punct("flat", 3), punct("]", 7), punct("]", 8)];
        assert!(attribute_specifiers(&tokens).is_empty());
    }

    #[test]
    fn unclosed_specifier_is_ignored() {
        let tokens = lex("[[buffer(0)");
        assert!(attribute_specifiers(&tokens).is_empty());
    }

    #[test]
    fn render_spacing() {
        let tokens = lex("texture2d < float , access :: write > const  float *");
        assert_eq!(render(&tokens), "texture2d<float, access::write> const float*");
    }

    #[test]
    fn split_respects_nesting() {
        let tokens = lex("texture2d<float, access::read> t, uint i [[buffer(1), flat]], f(a, b)");
        let pieces = split_top_level(&tokens);
        assert_eq!(pieces.len(), 3);
        assert_eq!(render(pieces[0]), "texture2d<float, access::read> t");
        assert_eq!(render(pieces[2]), "f(a, b)");
    }

    proptest! {
        /// Tree tokens are ordered, disjoint and match the text they span.
        #[test]
        fn tree_tokens_are_faithful(source in "[ -~\n]{0,120}") {
            let parsed = Parser::parse(&source).unwrap();
            let mut last_end = 0u32;
            for token in parsed.tokens() {
                prop_assert!(token.span.start >= last_end);
                prop_assert!(!token.text.is_empty());
                prop_assert_eq!(&source[token.span.start as usize..token.span.end as usize], token.text);
                last_end = token.span.end;
            }
        }

        /// Lexed tokens never contain whitespace outside literals.
        #[test]
        fn lexed_tokens_are_trimmed(source in "[ -~\n]{0,120}") {
            for token in lex(&source) {
                prop_assert_eq!(&source[token.span.start as usize..token.span.end as usize], token.text);
                if token.kind != TokenKind::Literal {
                    prop_assert!(!token.text.contains(char::is_whitespace));
                }
            }
        }
    }
}
