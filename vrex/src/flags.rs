//! Flag sets and the in-source flag declaration
//!
//! An expression may start with one or more `<...>` identifiers holding flag
//! words separated by whitespace, commas or semicolons:
//!
//! ```text
//! <first, ignore-case> "abc" digit
//! ```
//!
//! The resolved [`Flags`] decide both how the expression is rendered and the
//! native flag string of the compiled pattern.

use std::fmt;

use crate::error::ParseErrorKind;

/// How the host engine interprets the pattern with respect to Unicode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnicodeMode {
    /// No unicode flag: code-unit semantics, no property classes
    Legacy,
    /// The `u` flag
    #[default]
    Unicode,
    /// The `v` flag: nested classes and set operations inside `[...]`
    UnicodeSets,
}

impl UnicodeMode {
    pub fn name(self) -> &'static str {
        match self {
            UnicodeMode::Legacy => "legacy",
            UnicodeMode::Unicode => "unicode",
            UnicodeMode::UnicodeSets => "unicode-sets",
        }
    }

    /// Native flag letter, if any
    pub fn flag_char(self) -> Option<char> {
        match self {
            UnicodeMode::Legacy => None,
            UnicodeMode::Unicode => Some('u'),
            UnicodeMode::UnicodeSets => Some('v'),
        }
    }
}

impl fmt::Display for UnicodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The resolved flag set of one expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags {
    /// `^` and `$` match at line terminators; cleared by text boundaries
    pub multiline: bool,
    /// Report match indices (`d`)
    pub indices: bool,
    /// Find all matches (`g`); cleared by `first`
    pub global: bool,
    /// Case-insensitive matching (`i`)
    pub ignore_case: bool,
    /// Unicode interpretation of the pattern
    pub unicode: UnicodeMode,
    /// Match only at the cursor position (`y`)
    pub sticky: bool,
    /// Memoize the compiled pattern
    pub cache: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Flags {
            multiline: true,
            indices: false,
            global: true,
            ignore_case: false,
            unicode: UnicodeMode::default(),
            sticky: false,
            cache: false,
        }
    }
}

impl Flags {
    /// Apply the words of one `<...>` declaration
    ///
    /// `first_declaration` tells whether this is the first identifier of the
    /// expression; `cache` is only accepted as its very first word.
    pub fn apply_declaration(
        &mut self,
        text: &str,
        first_declaration: bool,
    ) -> Result<(), ParseErrorKind> {
        let words = text
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|word| !word.is_empty());
        for (position, word) in words.enumerate() {
            match word.to_lowercase().as_str() {
                "indices" => self.indices = true,
                "first" => self.global = false,
                "ignore-case" | "case-insensitive" => self.ignore_case = true,
                "unicode" => self.unicode = UnicodeMode::UnicodeSets,
                "legacy" => self.unicode = UnicodeMode::Legacy,
                "sticky" => self.sticky = true,
                "cache" if first_declaration && position == 0 => self.cache = true,
                "cache" => return Err(ParseErrorKind::MisplacedCacheFlag),
                _ => return Err(ParseErrorKind::UnknownFlag(word.to_string())),
            }
        }
        Ok(())
    }

    /// The native flag string, always in the order `s d g i m u|v y`
    pub fn to_native(&self) -> String {
        let mut flags = String::from("s");
        if self.indices {
            flags.push('d');
        }
        if self.global {
            flags.push('g');
        }
        if self.ignore_case {
            flags.push('i');
        }
        if self.multiline {
            flags.push('m');
        }
        if let Some(c) = self.unicode.flag_char() {
            flags.push(c);
        }
        if self.sticky {
            flags.push('y');
        }
        flags
    }

    /// Check that an interpolated expression keeps the semantics of `self`
    pub fn interpolation_mismatch(&self, inner: &Flags) -> Option<ParseErrorKind> {
        if self.ignore_case != inner.ignore_case {
            Some(ParseErrorKind::FlagMismatch {
                flag: "ignore-case",
                outer: set_or_unset(self.ignore_case),
                inner: set_or_unset(inner.ignore_case),
            })
        } else if self.unicode != inner.unicode {
            Some(ParseErrorKind::FlagMismatch {
                flag: "unicode",
                outer: self.unicode.name(),
                inner: inner.unicode.name(),
            })
        } else {
            None
        }
    }
}

fn set_or_unset(value: bool) -> &'static str {
    if value { "set" } else { "unset" }
}
