//! Compiled patterns

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::flags::Flags;
use crate::groups::GroupRegistry;
use crate::lexer::Token;
use crate::source::Source;

/// The immutable result of one compilation
///
/// Shared between every copy of a [`Pattern`] and reused as the token source
/// when the pattern is interpolated into another template.
#[derive(Debug)]
pub struct Expression {
    /// Template text, carrying the flags the builder compiled it with
    pub(crate) source: Arc<Source>,
    /// Tokens of the template with all interpolations resolved
    pub(crate) tokens: Vec<Token>,
    /// Flags after the whole expression was parsed
    pub(crate) flags: Flags,
    pub(crate) pattern: String,
    pub(crate) native_flags: String,
    pub(crate) groups: GroupRegistry,
    /// Cache identity, assigned on first use as a cache key
    pub(crate) identity: OnceLock<u64>,
    /// Host engine matcher, built on first use
    pub(crate) matcher: OnceLock<Result<fancy_regex::Regex, String>>,
}

impl Expression {
    pub(crate) fn new(
        source: Arc<Source>,
        tokens: Vec<Token>,
        flags: Flags,
        pattern: String,
        groups: GroupRegistry,
    ) -> Self {
        Expression {
            source,
            tokens,
            native_flags: flags.to_native(),
            flags,
            pattern,
            groups,
            identity: OnceLock::new(),
            matcher: OnceLock::new(),
        }
    }
}

/// A compiled pattern
///
/// Cloning is cheap: copies share the compiled expression but each has its
/// own `last_index` cursor.
#[derive(Debug, Clone)]
pub struct Pattern {
    expression: Arc<Expression>,
    /// Position where the next global or sticky [`exec`](Pattern::exec) starts
    pub last_index: usize,
}

impl Pattern {
    pub(crate) fn from_expression(expression: Arc<Expression>) -> Self {
        Pattern {
            expression,
            last_index: 0,
        }
    }

    pub(crate) fn expression(&self) -> &Arc<Expression> {
        &self.expression
    }

    /// The generated pattern text
    pub fn as_str(&self) -> &str {
        &self.expression.pattern
    }

    /// The flag string, e.g. `sgmu`
    pub fn flags(&self) -> &str {
        &self.expression.native_flags
    }

    pub fn flag_set(&self) -> &Flags {
        &self.expression.flags
    }

    /// The template text, with interpolations shown as `${...}`
    pub fn source_text(&self) -> String {
        let source = &self.expression.source;
        source.prettify(source.text())
    }

    /// Capture groups in numbering order
    pub fn groups(&self) -> &GroupRegistry {
        &self.expression.groups
    }

    /// Whether both copies come from the same compilation
    pub fn shares_expression(&self, other: &Pattern) -> bool {
        Arc::ptr_eq(&self.expression, &other.expression)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str() && self.flags() == other.flags()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.as_str(), self.flags())
    }
}

#[cfg(test)]
mod tests {
    use crate::compile;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_pattern_is_send_sync() {
        assert_send_sync::<super::Pattern>();
    }

    #[test]
    fn test_display() {
        let pattern = compile("optional [+-] at-least-1 digit").unwrap();
        assert_eq!(pattern.to_string(), r"/[+-]?\d+/sgmu");
        assert_eq!(pattern.as_str(), r"[+-]?\d+");
        assert_eq!(pattern.flags(), "sgmu");
    }

    #[test]
    fn test_clones_share_expression() {
        let mut pattern = compile("digit").unwrap();
        let copy = pattern.clone();
        pattern.last_index = 4;
        assert!(pattern.shares_expression(&copy));
        assert_eq!(copy.last_index, 0);
        assert_eq!(pattern, copy);
    }

    #[test]
    fn test_source_text_hides_placeholders() {
        let inner = compile("digit").unwrap();
        let outer = compile(crate::Template::new("any ").interpolate(&inner)).unwrap();
        assert_eq!(outer.source_text(), "any ${...}");
        assert_eq!(inner.source_text(), "digit");
    }
}
