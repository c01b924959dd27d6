//! Vrex Core Library
//!
//! A compiler from a verbose, readable pattern language into ECMAScript-style
//! regular expressions.
//!
//! ```
//! use vrex::compile;
//!
//! let pattern = compile("optional [+-] at-least-1 digit").unwrap();
//! assert_eq!(pattern.as_str(), r"[+-]?\d+");
//! assert!(pattern.is_match("x = -42").unwrap());
//! ```
//!
//! Patterns compose through [`Template`]: an interpolated string is read as
//! pattern text, an interpolated [`Pattern`] is embedded as a sub-expression
//! and must agree with the outer pattern on case sensitivity and unicode mode.

pub mod ast;
mod cache;
pub mod compiler;
pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod escape;
pub mod flags;
pub mod groups;
pub mod lexer;
pub mod parser;
pub mod pattern;
pub mod quantifier;
pub mod source;
pub mod template;
pub mod transpiler;

pub use ast::{Backreference, Node};
pub use compiler::{Builder, builder, compile};
pub use engine::Match;
pub use error::{CompileError, Error, ErrorKind, LexerErrorKind, ParseErrorKind, Result, Span};
pub use flags::{Flags, UnicodeMode};
pub use groups::{GroupInfo, GroupRegistry, GroupRegistryError};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{Parsed, Parser, parse};
pub use pattern::Pattern;
pub use quantifier::Quantifier;
pub use template::{Template, Value};
pub use transpiler::{TranspileResult, compile_debug};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end() {
        // template -> tokens -> tree -> pattern -> engine
        let pattern = compile("name: \"abc\"").unwrap();
        assert_eq!(pattern.as_str(), "(?<name>abc)");
        let m = pattern.find("xabc").unwrap().unwrap();
        assert_eq!(m.named_group("name"), Some("abc"));
    }

    #[test]
    fn test_composition() {
        let sign = compile("[+-]").unwrap();
        let number = compile(
            Template::new("optional ")
                .interpolate(&sign)
                .text(" at-least-1 digit"),
        )
        .unwrap();
        assert_eq!(number.as_str(), r"[+-]?\d+");
        let pair = compile(
            Template::new("")
                .interpolate(&number)
                .text(" \",\" ")
                .interpolate(&number),
        )
        .unwrap();
        assert_eq!(pair.as_str(), r"[+-]?\d+,[+-]?\d+");
    }
}
