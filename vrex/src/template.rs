//! Pattern templates: literal text interleaved with interpolated values
//!
//! A template is the input of a compilation. Text values are tokenized as if
//! they had been written in place; compiled patterns are spliced in as a
//! bracketed sub-expression that keeps its own flags.
//!
//! ```
//! use vrex::{Template, compile};
//!
//! let number = compile("at-least-1 digit").unwrap();
//! let template = Template::new("begin-of-text ")
//!     .interpolate(&number)
//!     .text(" \".\" ")
//!     .interpolate(&number)
//!     .text(" end-of-text");
//! assert_eq!(compile(template).unwrap().as_str(), r"^\d+\.\d+$");
//! ```

use crate::lexer::Interpolation;
use crate::pattern::Pattern;
use crate::source::{Source, unique_prefix};

/// A value placed into a template
#[derive(Debug, Clone)]
pub enum Value {
    /// Verbose pattern text
    Text(String),
    /// A compiled pattern
    Pattern(Pattern),
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&String> for Value {
    fn from(text: &String) -> Self {
        Value::Text(text.clone())
    }
}

impl From<Pattern> for Value {
    fn from(pattern: Pattern) -> Self {
        Value::Pattern(pattern)
    }
}

impl From<&Pattern> for Value {
    fn from(pattern: &Pattern) -> Self {
        Value::Pattern(pattern.clone())
    }
}

/// Literal text segments with one value between each pair
#[derive(Debug, Clone)]
pub struct Template {
    /// Always one more segment than values
    segments: Vec<String>,
    values: Vec<Value>,
}

impl Template {
    /// Start a template with literal text
    pub fn new(text: impl Into<String>) -> Self {
        Template {
            segments: vec![text.into()],
            values: Vec::new(),
        }
    }

    /// Append a value after the current text
    pub fn interpolate(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self.segments.push(String::new());
        self
    }

    /// Append literal text
    pub fn text(mut self, text: &str) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.push_str(text);
        }
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Whether the leading declaration starts with the `cache` flag
    ///
    /// Only the first word of the first identifier counts; the parser reports
    /// a misplaced `cache` elsewhere.
    pub(crate) fn declares_cache(&self) -> bool {
        let Some(first) = self.segments.first() else {
            return false;
        };
        let Some(rest) = first.trim_start().strip_prefix('<') else {
            return false;
        };
        let declaration = rest.split('>').next().unwrap_or_default();
        declaration
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .find(|word| !word.is_empty())
            .is_some_and(|word| word.eq_ignore_ascii_case("cache"))
    }

    /// Join the segments with placeholders under a prefix unique to this text
    pub(crate) fn assemble(&self) -> (Source, Vec<Interpolation>) {
        let segments: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        let prefix = unique_prefix(&segments);
        let placeholders = Source::new("", prefix.as_str());

        let mut text = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                text.push_str(&placeholders.placeholder(i - 1));
            }
            text.push_str(segment);
        }

        let values = self
            .values
            .iter()
            .map(|value| match value {
                Value::Text(text) => Interpolation::Text(text.clone()),
                Value::Pattern(pattern) => Interpolation::Expression(pattern.expression().clone()),
            })
            .collect();
        (Source::new(text, prefix), values)
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Template::new(text)
    }
}

impl From<String> for Template {
    fn from(text: String) -> Self {
        Template::new(text)
    }
}

impl From<&String> for Template {
    fn from(text: &String) -> Self {
        Template::new(text.as_str())
    }
}
