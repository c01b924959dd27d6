//! Source text descriptors and interpolation placeholders
//!
//! Every piece of text the lexer reads (the assembled template, a string
//! interpolated into it, the source of a compiled pattern) is described by a
//! [`Source`]. Interpolation slots are marked in the text with a placeholder
//! of the form `` `ABC12} ``: a backtick, a run of upper-case letters that
//! does not occur anywhere in the surrounding text, the value index and a
//! closing brace.

use rand::Rng;

use crate::flags::Flags;

/// Length of the random part of a freshly generated prefix
const INITIAL_PREFIX_LEN: usize = 3;

/// A piece of source text together with its placeholder prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    text: String,
    prefix: String,
    flags: Option<Flags>,
}

impl Source {
    /// Describe text whose placeholders use `prefix`
    pub fn new(text: impl Into<String>, prefix: impl Into<String>) -> Self {
        Source {
            text: text.into(),
            prefix: prefix.into(),
            flags: None,
        }
    }

    /// Describe text that contains no placeholders
    ///
    /// A prefix is still generated so that text looking like a placeholder
    /// is never mistaken for one.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        let prefix = unique_prefix(&[text.as_str()]);
        Source::new(text, prefix)
    }

    /// Attach the flag set the text was compiled with
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Flags of the compiled expression this text belongs to, if any
    pub fn flags(&self) -> Option<Flags> {
        self.flags
    }

    /// The placeholder standing for value `index`
    pub fn placeholder(&self, index: usize) -> String {
        format!("{}{}}}", self.prefix, index)
    }

    /// Recognize a placeholder at the start of `rest`
    ///
    /// Returns the value index and the byte length of the placeholder.
    pub fn match_placeholder(&self, rest: &str) -> Option<(usize, usize)> {
        let after = rest.strip_prefix(self.prefix.as_str())?;
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || after.as_bytes().get(digits) != Some(&b'}') {
            return None;
        }
        let index = after[..digits].parse().ok()?;
        Some((index, self.prefix.len() + digits + 1))
    }

    /// Replace every placeholder in `text` with the string produced by `replace`
    pub fn substitute<E>(
        &self,
        text: &str,
        mut replace: impl FnMut(usize) -> Result<String, E>,
    ) -> Result<String, E> {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(found) = rest.find(self.prefix.as_str()) {
            result.push_str(&rest[..found]);
            rest = &rest[found..];
            match self.match_placeholder(rest) {
                Some((index, len)) => {
                    result.push_str(&replace(index)?);
                    rest = &rest[len..];
                }
                None => {
                    result.push_str(&self.prefix);
                    rest = &rest[self.prefix.len()..];
                }
            }
        }
        result.push_str(rest);
        Ok(result)
    }

    /// Replace placeholders for display: `${...}` with as many dots as keeps the width
    pub fn prettify(&self, text: &str) -> String {
        let pretty: Result<String, std::convert::Infallible> = self.substitute(text, |index| {
            let width = self.placeholder(index).len();
            Ok(format!("${{{}}}", ".".repeat(width.saturating_sub(3))))
        });
        match pretty {
            Ok(text) => text,
            Err(never) => match never {},
        }
    }
}

/// A backtick followed by `len` random upper-case letters
pub fn random_prefix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut prefix = String::with_capacity(len + 1);
    prefix.push('`');
    for _ in 0..len {
        prefix.push(char::from(rng.gen_range(b'A'..=b'Z')));
    }
    prefix
}

/// A placeholder prefix that occurs in none of `texts`
///
/// Starts with three letters and grows by one letter after every collision.
pub fn unique_prefix(texts: &[&str]) -> String {
    let mut prefix = random_prefix(INITIAL_PREFIX_LEN);
    while texts.iter().any(|text| text.contains(prefix.as_str())) {
        prefix = random_prefix(prefix.len());
    }
    prefix
}
