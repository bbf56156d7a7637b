//! Scoped ownership of a tree-sitter parser configured for Metal.

use thiserror::Error;
use tree_sitter::{Language, LanguageError, Parser, Tree};

/// Errors that can occur while attaching a grammar to a parser.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The grammar was generated for an ABI the runtime cannot load.
    #[error("grammar ABI version {abi} is outside the supported range {min}..={max}")]
    Incompatible {
        /// ABI version the grammar was generated for.
        abi: usize,
        /// Oldest ABI version the runtime loads.
        min: usize,
        /// Newest ABI version the runtime loads.
        max: usize,
    },
    /// The runtime refused the language.
    #[error("parser rejected the grammar: {0}")]
    Rejected(#[source] LanguageError),
}

/// Check a grammar's ABI version against the range the runtime accepts.
pub fn check_abi(abi: usize) -> Result<(), LoadError> {
    let min = tree_sitter::MIN_COMPATIBLE_LANGUAGE_VERSION;
    let max = tree_sitter::LANGUAGE_VERSION;
    if (min..=max).contains(&abi) {
        Ok(())
    } else {
        Err(LoadError::Incompatible { abi, min, max })
    }
}

/// A parser with a grammar attached.
///
/// The session is the sole owner of its parser; dropping it releases the
/// parser, including when a panic unwinds through the owning scope.
pub struct ParserSession {
    parser: Parser,
}

impl ParserSession {
    /// Create a parser and attach the Metal grammar.
    pub fn open() -> Result<Self, LoadError> {
        Self::with_language(&tree_sitter_metal::language())
    }

    /// Create a parser and attach `language`.
    pub fn with_language(language: &Language) -> Result<Self, LoadError> {
        check_abi(language.abi_version())?;

        let mut parser = Parser::new();
        parser.set_language(language).map_err(LoadError::Rejected)?;
        tracing::debug!(abi = language.abi_version(), "opened parser session");
        Ok(Self { parser })
    }

    /// Parse `source` from scratch.
    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }
}

impl Drop for ParserSession {
    fn drop(&mut self) {
        tracing::debug!("released parser session");
    }
}

/// Attach the Metal grammar to a fresh parser and report whether it took.
#[must_use]
pub fn verify_grammar_loads() -> bool {
    match ParserSession::open() {
        Ok(_session) => true,
        Err(e) => {
            tracing::error!("{e}");
            false
        }
    }
}
