//! Compilation entry points
//!
//! ```
//! use vrex::builder;
//!
//! let pattern = builder().ignore_case().first().compile("\"abc\"").unwrap();
//! assert_eq!(pattern.as_str(), "abc");
//! assert_eq!(pattern.flags(), "simu");
//! ```

use std::sync::Arc;

use crate::cache;
use crate::error::Result;
use crate::flags::{Flags, UnicodeMode};
use crate::lexer::{Lexer, Token};
use crate::parser::{Parsed, Parser};
use crate::pattern::{Expression, Pattern};
use crate::source::Source;
use crate::template::Template;

/// Flag presets applied before the in-source declaration
#[derive(Debug, Clone, Copy, Default)]
pub struct Builder {
    flags: Flags,
}

impl Builder {
    pub fn new() -> Self {
        Builder::default()
    }

    /// Report match indices (`d`)
    pub fn indices(mut self) -> Self {
        self.flags.indices = true;
        self
    }

    /// Stop after the first match (no `g`)
    pub fn first(mut self) -> Self {
        self.flags.global = false;
        self
    }

    pub fn ignore_case(mut self) -> Self {
        self.flags.ignore_case = true;
        self
    }

    /// Compile without the unicode flag
    pub fn legacy(mut self) -> Self {
        self.flags.unicode = UnicodeMode::Legacy;
        self
    }

    /// Compile in unicode-sets mode (`v`)
    pub fn unicode(mut self) -> Self {
        self.flags.unicode = UnicodeMode::UnicodeSets;
        self
    }

    pub fn sticky(mut self) -> Self {
        self.flags.sticky = true;
        self
    }

    /// Memoize the result, as if the template started with `<cache>`
    pub fn cache(mut self) -> Self {
        self.flags.cache = true;
        self
    }

    /// The preset flags
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Compile a template
    pub fn compile(&self, template: impl Into<Template>) -> Result<Pattern> {
        let template = template.into();
        if !self.flags.cache && !template.declares_cache() {
            return Ok(self.run(&template)?.into_pattern());
        }
        if let Some(pattern) = cache::lookup(&self.flags, &template) {
            return Ok(pattern);
        }
        let pattern = self.run(&template)?.into_pattern();
        Ok(cache::insert(&self.flags, &template, &pattern))
    }

    /// Tokenize and parse without building the pattern
    pub(crate) fn run(&self, template: &Template) -> Result<Compilation> {
        let (source, values) = template.assemble();
        let source = Arc::new(source.with_flags(self.flags));
        let tokens = Lexer::new(source.clone(), &values, self.flags)
            .tokenize()
            .map_err(|err| err.into_error())?;
        let parsed = Parser::new(&source, &tokens, self.flags)?.parse()?;
        Ok(Compilation {
            source,
            tokens,
            parsed,
        })
    }
}

/// Everything one compilation produced
pub(crate) struct Compilation {
    pub source: Arc<Source>,
    pub tokens: Vec<Token>,
    pub parsed: Parsed,
}

impl Compilation {
    pub fn into_pattern(self) -> Pattern {
        let pattern = self.parsed.render();
        let expression = Expression::new(
            self.source,
            self.tokens,
            self.parsed.flags,
            pattern,
            self.parsed.groups,
        );
        Pattern::from_expression(Arc::new(expression))
    }
}

/// Start from the default flags
pub fn builder() -> Builder {
    Builder::new()
}

/// Compile a template with the default flags
///
/// # Example
/// ```
/// use vrex::compile;
///
/// let pattern = compile("optional [+-] at-least-1 digit").unwrap();
/// assert_eq!(pattern.as_str(), r"[+-]?\d+");
/// assert_eq!(pattern.flags(), "sgmu");
/// ```
pub fn compile(template: impl Into<Template>) -> Result<Pattern> {
    builder().compile(template)
}
