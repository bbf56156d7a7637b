//! Source location tracking for tokens, entry points and diagnostics.

use std::ops::Range;

use serde::Serialize;

/// A span representing a range in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start: u32,
    /// End byte offset (exclusive).
    pub end: u32,
    /// Start line (0-indexed).
    pub start_line: u32,
    /// Start column (0-indexed, in bytes).
    pub start_col: u32,
    /// End line (0-indexed).
    pub end_line: u32,
    /// End column (0-indexed, in bytes).
    pub end_col: u32,
}

impl Span {
    /// Create a new span from byte offsets and positions.
    #[must_use]
    pub const fn new(
        start: u32,
        end: u32,
        start_line: u32,
        start_col: u32,
        end_line: u32,
        end_col: u32,
    ) -> Self {
        Self {
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a span from a tree-sitter node.
    #[must_use]
    pub fn from_node(node: &tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start: node.start_byte() as u32,
            end: node.end_byte() as u32,
            start_line: start.row as u32,
            start_col: start.column as u32,
            end_line: end.row as u32,
            end_col: end.column as u32,
        }
    }

    /// Narrow this span to `range`, given relative to `text`, the source
    /// text this span covers.
    #[must_use]
    pub fn slice(&self, text: &str, range: Range<usize>) -> Self {
        let (start_line, start_col) = self.advance(&text[..range.start]);
        let (end_line, end_col) = self.advance(&text[..range.end]);
        Self {
            start: self.start + range.start as u32,
            end: self.start + range.end as u32,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Line and column reached after consuming `prefix` from the span start.
    fn advance(&self, prefix: &str) -> (u32, u32) {
        match prefix.rfind('\n') {
            Some(newline) => (
                self.start_line + prefix.matches('\n').count() as u32,
                (prefix.len() - newline - 1) as u32,
            ),
            None => (self.start_line, self.start_col + prefix.len() as u32),
        }
    }

    /// Merge two spans to create a span covering both.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let (start, start_line, start_col) = if self.start <= other.start {
            (self.start, self.start_line, self.start_col)
        } else {
            (other.start, other.start_line, other.start_col)
        };

        let (end, end_line, end_col) = if self.end >= other.end {
            (self.end, self.end_line, self.end_col)
        } else {
            (other.end, other.end_line, other.end_col)
        };

        Self {
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}
