//! Error types for the pattern compiler
//!
//! This module provides error handling using the `thiserror` crate.
//! User-facing compile failures are [`CompileError`]s carrying a fully formatted,
//! multi-line message with source snippets. Failures reported by the host
//! engine and internal invariant violations are kept apart from them.

use thiserror::Error;

use crate::groups::GroupRegistryError;

/// The main error type of the crate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The verbose pattern could not be compiled
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The host engine rejected a generated pattern
    #[error("engine error: {0}")]
    Engine(String),

    /// Something that should not happen regardless of the input
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the compile error if this is one
    pub fn as_compile(&self) -> Option<&CompileError> {
        match self {
            Error::Compile(err) => Some(err),
            _ => None,
        }
    }
}

/// Category of a user-facing compile error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input the lexer could not tokenize
    Syntax,
    /// Tokens that do not form a valid expression
    Grammar,
    /// Well-formed input with inconsistent meaning (flags, captures, interpolation types)
    Semantic,
}

/// A user-facing compile error with a fully rendered message
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct CompileError {
    kind: ErrorKind,
    message: String,
}

impl CompileError {
    /// Create a compile error from an already formatted message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            message: message.into(),
        }
    }

    /// The category of this error
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The formatted message, including source snippets
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Specific kinds of lexer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerErrorKind {
    /// Nothing in the token grammar matches the input
    #[error("Syntax error.")]
    UnexpectedInput,

    /// A quoted literal without its closing quote
    #[error("Unterminated string literal.")]
    UnterminatedLiteral,

    /// A literal with a line break or a malformed escape sequence
    #[error("Error parsing string literal.")]
    InvalidLiteral,

    /// `<` without the closing `>`
    #[error("Unterminated identifier.")]
    UnterminatedIdentifier,

    /// `[` without the closing `]`
    #[error("Unterminated character class.")]
    UnterminatedCharacterClass,

    /// `/*` without the closing `*/`
    #[error("Unterminated comment.")]
    UnterminatedComment,

    /// A compiled pattern placed inside a string literal
    #[error("Cannot interpolate expression to a string literal.")]
    ExpressionInLiteral,

    /// A compiled pattern placed inside a character class
    #[error("Cannot interpolate expression to a character class.")]
    ExpressionInCharacterClass,

    /// A placeholder refers to a value that was never supplied
    #[error("interpolation index {0} is out of range")]
    MissingInterpolation(usize),
}

impl LexerErrorKind {
    /// The user-facing category of this error
    pub fn category(&self) -> ErrorKind {
        match self {
            LexerErrorKind::ExpressionInLiteral | LexerErrorKind::ExpressionInCharacterClass => {
                ErrorKind::Semantic
            }
            _ => ErrorKind::Syntax,
        }
    }
}

/// Errors that occur during parsing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// `(` or `{` never closed
    #[error("Unterminated bracket.")]
    UnterminatedBracket,

    /// `)` or `}` without a matching opening bracket
    #[error("Unexpected closing bracket.")]
    UnexpectedClosingBracket,

    /// An identifier where an expression was expected
    #[error("Unexpected identifier \"<{0}>\".")]
    UnexpectedIdentifier(String),

    /// An interpolation marker reached the grammar
    #[error("Unexpected token.")]
    UnexpectedToken,

    /// Input ended in the middle of an expression
    #[error("Unexpected end of expression.")]
    UnexpectedEnd,

    /// A keyword no constructor accepts
    #[error("Unknown keyword \"{0}\".")]
    UnknownKeyword(String),

    /// `not` in front of something that cannot be inverted
    #[error("The \"not\" keyword is not allowed before this expression.")]
    NotNotAllowed,

    /// A keyword shaped like a quantifier that does not decode
    #[error("Invalid quantifier \"{keyword}\": {reason}.")]
    MalformedQuantifier {
        /// The offending keyword
        keyword: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// A keyword that requires a following `<identifier>`
    #[error("Expecting identifier after \"{0}\".")]
    ExpectedIdentifier(&'static str),

    /// A word in the flag declaration that is not a flag
    #[error("Unknown flag \"{0}\".")]
    UnknownFlag(String),

    /// `cache` somewhere else than at the start of the declaration
    #[error("The \"cache\" flag must be the first flag of the expression.")]
    MisplacedCacheFlag,

    /// Interpolated expression compiled with different semantics
    #[error(
        "Mismatching \"{flag}\" flag in interpolated expression. Outer expression: \"{outer}\", interpolated expression: \"{inner}\"."
    )]
    FlagMismatch {
        /// Name of the flag
        flag: &'static str,
        /// Setting of the outer expression
        outer: &'static str,
        /// Setting of the interpolated expression
        inner: &'static str,
    },

    /// A positional capture whose number is not the index it receives
    #[error("Invalid group number {found}, this group has number {expected}.")]
    GroupNumberMismatch {
        /// The number written in the source
        found: String,
        /// The number the group actually receives
        expected: u32,
    },

    /// Two capture groups with the same name
    #[error("Duplicate group name \"{0}\".")]
    DuplicateGroupName(String),

    /// Backreference to a group name that does not exist
    #[error("Backreference to undefined group \"{0}\".")]
    UndefinedBackreference(String),

    /// Backreference to a group number that does not exist
    #[error("Backreference to undefined group number {0}.")]
    InvalidBackreference(u32),

    /// `\p{..}` classes are rejected by engines outside unicode mode
    #[error("Unicode property classes are not available in the legacy mode.")]
    PropertyWithoutUnicode,
}

impl ParseErrorKind {
    /// The user-facing category of this error
    pub fn category(&self) -> ErrorKind {
        match self {
            ParseErrorKind::FlagMismatch { .. }
            | ParseErrorKind::GroupNumberMismatch { .. }
            | ParseErrorKind::DuplicateGroupName(_)
            | ParseErrorKind::UndefinedBackreference(_)
            | ParseErrorKind::InvalidBackreference(_)
            | ParseErrorKind::PropertyWithoutUnicode
            | ParseErrorKind::MisplacedCacheFlag => ErrorKind::Semantic,
            _ => ErrorKind::Grammar,
        }
    }
}

impl From<GroupRegistryError> for ParseErrorKind {
    fn from(err: GroupRegistryError) -> Self {
        match err {
            GroupRegistryError::DuplicateName(name) => ParseErrorKind::DuplicateGroupName(name),
            GroupRegistryError::NumberMismatch { found, expected } => {
                ParseErrorKind::GroupNumberMismatch { found, expected }
            }
            GroupRegistryError::UnknownName(name) => ParseErrorKind::UndefinedBackreference(name),
            GroupRegistryError::UnknownNumber(num) => ParseErrorKind::InvalidBackreference(num),
        }
    }
}

/// A span representing a location in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position (inclusive)
    pub start: usize,
    /// End position (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_error_display() {
        assert_eq!(LexerErrorKind::UnexpectedInput.to_string(), "Syntax error.");
        assert_eq!(
            LexerErrorKind::ExpressionInCharacterClass.to_string(),
            "Cannot interpolate expression to a character class."
        );
    }

    #[test]
    fn test_parse_error_unknown_keyword() {
        let err = ParseErrorKind::UnknownKeyword("foo".to_string());
        assert_eq!(err.to_string(), "Unknown keyword \"foo\".");
        assert_eq!(err.category(), ErrorKind::Grammar);
    }

    #[test]
    fn test_flag_mismatch_message() {
        let err = ParseErrorKind::FlagMismatch {
            flag: "ignore-case",
            outer: "unset",
            inner: "set",
        };
        assert_eq!(
            err.to_string(),
            "Mismatching \"ignore-case\" flag in interpolated expression. \
             Outer expression: \"unset\", interpolated expression: \"set\"."
        );
        assert_eq!(err.category(), ErrorKind::Semantic);
    }

    #[test]
    fn test_error_from_compile_error() {
        let err: Error = CompileError::new(ErrorKind::Syntax, "Syntax error.").into();
        assert_eq!(err.to_string(), "Syntax error.");
        assert_eq!(err.as_compile().map(CompileError::kind), Some(ErrorKind::Syntax));
    }

    #[test]
    fn test_internal_error_is_not_compile_error() {
        let err = Error::Internal("broken".to_string());
        assert!(err.as_compile().is_none());
        assert_eq!(err.to_string(), "internal error: broken");
    }

    #[test]
    fn test_group_error_conversion() {
        let kind: ParseErrorKind = GroupRegistryError::DuplicateName("x".to_string()).into();
        assert_eq!(kind, ParseErrorKind::DuplicateGroupName("x".to_string()));
    }

    #[test]
    fn test_span_creation() {
        let span = Span::new(10, 20);
        assert_eq!(span.start, 10);
        assert_eq!(span.end, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
    }
}
