//! Host engine adapter
//!
//! Matching is delegated to `fancy_regex`, a backtracking engine that accepts
//! lookarounds and backreferences. The generated pattern is written for an
//! ECMAScript engine, so it goes through a small translation first: flags
//! become inline groups, `\u` escapes become `\x{..}`, named groups and named
//! backreferences use the `(?P..)` forms and the empty classes `[]` / `[^]`
//! are spelled out.
//!
//! Positions, including [`Pattern::last_index`], are byte offsets into the
//! searched text.

use std::collections::BTreeMap;

use fancy_regex::{Captures, Regex};

use crate::ast::LINE_TERMINATORS;
use crate::error::{Error, Result};
use crate::flags::{Flags, UnicodeMode};
use crate::pattern::Pattern;

/// Characters that stay escaped when they follow a backslash
const META: &str = r"\.+*?()|[]{}^$#&-~";

/// A successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// The start position of the match
    pub start: usize,
    /// The end position of the match (exclusive)
    pub end: usize,
    /// The matched text
    pub text: String,
    /// Capture groups 1.., `None` when a group did not participate
    pub groups: Vec<Option<String>>,
    /// Captures of named groups that participated
    pub named_groups: BTreeMap<String, String>,
}

impl Match {
    /// Get the text of a capture group (1-based)
    pub fn group(&self, n: usize) -> Option<&str> {
        self.groups.get(n.checked_sub(1)?)?.as_deref()
    }

    /// Get the text of a named capture group
    pub fn named_group(&self, name: &str) -> Option<&str> {
        self.named_groups.get(name).map(String::as_str)
    }

    fn from_captures(regex: &Regex, captures: &Captures<'_>) -> Option<Self> {
        let whole = captures.get(0)?;
        let groups = (1..captures.len())
            .map(|i| captures.get(i).map(|m| m.as_str().to_string()))
            .collect();
        let named_groups = regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                let m = captures.name(name)?;
                Some((name.to_string(), m.as_str().to_string()))
            })
            .collect();
        Some(Match {
            start: whole.start(),
            end: whole.end(),
            text: whole.as_str().to_string(),
            groups,
            named_groups,
        })
    }
}

impl Pattern {
    /// The engine matcher, built on first use and shared by all copies
    pub fn matcher(&self) -> Result<&Regex> {
        let expression = self.expression();
        expression
            .matcher
            .get_or_init(|| {
                Regex::new(&translate(&expression.pattern, &expression.flags))
                    .map_err(|err| err.to_string())
            })
            .as_ref()
            .map_err(|err| Error::Engine(err.clone()))
    }

    /// Check if the pattern matches anywhere in the input
    pub fn is_match(&self, input: &str) -> Result<bool> {
        self.matcher()?.is_match(input).map_err(engine_error)
    }

    /// Find the first match in the input
    pub fn find(&self, input: &str) -> Result<Option<Match>> {
        self.captures_at(input, 0)
    }

    /// Find all non-overlapping matches
    pub fn find_all(&self, input: &str) -> Result<Vec<Match>> {
        let regex = self.matcher()?;
        let mut matches = Vec::new();
        for captures in regex.captures_iter(input) {
            let captures = captures.map_err(engine_error)?;
            matches.extend(Match::from_captures(regex, &captures));
        }
        Ok(matches)
    }

    /// Run one step of a stateful search
    ///
    /// Global and sticky patterns start at `last_index` and move it past the
    /// match, or reset it to 0 when nothing matches. A sticky pattern only
    /// matches exactly at `last_index`. Other patterns always search the
    /// whole input and leave `last_index` alone.
    pub fn exec(&mut self, input: &str) -> Result<Option<Match>> {
        let flags = *self.flag_set();
        if !flags.global && !flags.sticky {
            return self.find(input);
        }

        let start = self.last_index;
        if start > input.len() || !input.is_char_boundary(start) {
            self.last_index = 0;
            return Ok(None);
        }
        let found = self
            .captures_at(input, start)?
            .filter(|m| !flags.sticky || m.start == start);
        self.last_index = found.as_ref().map_or(0, |m| m.end);
        Ok(found)
    }

    /// Replace the first match, or every match for a global pattern
    ///
    /// The replacement understands `$&`, `` $` ``, `$'`, `$n`, `$<name>` and
    /// `$$`.
    pub fn replace(&self, input: &str, replacement: &str) -> Result<String> {
        let matches = if self.flag_set().global {
            self.find_all(input)?
        } else {
            self.find(input)?.into_iter().collect()
        };

        let mut result = String::with_capacity(input.len());
        let mut last = 0;
        for m in &matches {
            result.push_str(&input[last..m.start]);
            expand(replacement, input, m, &mut result);
            last = m.end;
        }
        result.push_str(&input[last..]);
        Ok(result)
    }

    fn captures_at(&self, input: &str, start: usize) -> Result<Option<Match>> {
        let regex = self.matcher()?;
        let captures = regex
            .captures_from_pos(input, start)
            .map_err(engine_error)?;
        Ok(captures.and_then(|captures| Match::from_captures(regex, &captures)))
    }
}

fn engine_error(err: fancy_regex::Error) -> Error {
    Error::Engine(err.to_string())
}

/// Expand one replacement template for match `m`
fn expand(replacement: &str, input: &str, m: &Match, out: &mut String) {
    let mut rest = replacement;
    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        let consumed = match after.chars().next() {
            Some('$') => {
                out.push('$');
                1
            }
            Some('&') => {
                out.push_str(&m.text);
                1
            }
            Some('`') => {
                out.push_str(&input[..m.start]);
                1
            }
            Some('\'') => {
                out.push_str(&input[m.end..]);
                1
            }
            Some('<') => match after.find('>') {
                Some(close) => {
                    out.push_str(m.named_group(&after[1..close]).unwrap_or_default());
                    close + 1
                }
                _ => {
                    out.push('$');
                    0
                }
            },
            Some(c) if c.is_ascii_digit() => match group_reference(after, m.groups.len()) {
                Some((n, len)) => {
                    out.push_str(m.group(n).unwrap_or_default());
                    len
                }
                None => {
                    out.push('$');
                    0
                }
            },
            _ => {
                out.push('$');
                0
            }
        };
        rest = &after[consumed..];
    }
    out.push_str(rest);
}

/// `$n` or `$nn`, preferring two digits when that group exists
fn group_reference(text: &str, count: usize) -> Option<(usize, usize)> {
    let digits: Vec<usize> = text
        .chars()
        .take(2)
        .map_while(|c| c.to_digit(10))
        .map(|d| d as usize)
        .collect();
    if let &[tens, ones] = digits.as_slice() {
        let n = tens * 10 + ones;
        if (1..=count).contains(&n) {
            return Some((n, 2));
        }
    }
    let n = *digits.first()?;
    (1..=count).contains(&n).then_some((n, 1))
}

/// Rewrite a generated pattern into the `fancy_regex` dialect
pub fn translate(pattern: &str, flags: &Flags) -> String {
    let mut out = String::from("(?s)");
    if flags.ignore_case {
        out.push_str("(?i)");
    }
    if flags.multiline {
        out.push_str("(?m)");
    }

    // lookbehinds must have a fixed length
    let pattern = pattern
        .replace(
            &format!("(?<=[{}]|^)", LINE_TERMINATORS),
            &format!("(?:(?<=[{}])|^)", LINE_TERMINATORS),
        )
        .replace(
            &format!("(?<![{}]|^)", LINE_TERMINATORS),
            &format!("(?<![{}])(?<!^)", LINE_TERMINATORS),
        );

    let nested_classes = flags.unicode == UnicodeMode::UnicodeSets;
    let mut class_depth = 0usize;
    let mut rest = pattern.as_str();
    while let Some(c) = rest.chars().next() {
        rest = &rest[c.len_utf8()..];
        match c {
            '\\' => rest = translate_escape(rest, class_depth > 0, &mut out),
            '[' if class_depth == 0 && rest.starts_with(']') => {
                out.push_str("(?!)");
                rest = &rest[1..];
            }
            '[' if class_depth == 0 && rest.starts_with("^]") => {
                out.push_str(r"[\s\S]");
                rest = &rest[2..];
            }
            '[' if class_depth > 0 && !nested_classes => out.push_str(r"\["),
            '[' => {
                class_depth += 1;
                out.push('[');
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                out.push(']');
            }
            '(' if class_depth == 0
                && rest.starts_with("?<")
                && !rest.starts_with("?<=")
                && !rest.starts_with("?<!") =>
            {
                out.push_str("(?P<");
                rest = &rest[2..];
            }
            _ => out.push(c),
        }
    }
    out
}

/// Translate the escape after a backslash, returning the remaining input
fn translate_escape<'a>(rest: &'a str, in_class: bool, out: &mut String) -> &'a str {
    let Some(c) = rest.chars().next() else {
        out.push_str(r"\\");
        return rest;
    };
    let after = &rest[c.len_utf8()..];
    match c {
        'u' => {
            if let Some((hex, tail)) = after
                .strip_prefix('{')
                .and_then(|body| body.split_once('}'))
            {
                out.push_str(&format!("\\x{{{}}}", hex));
                return tail;
            }
            let hex: String = after.chars().take(4).collect();
            if hex.len() == 4 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                out.push_str(&format!("\\x{{{}}}", hex));
                return &after[4..];
            }
            out.push('u');
        }
        'k' if !in_class && after.starts_with('<') => {
            if let Some(close) = after.find('>') {
                out.push_str(&format!("(?P={})", &after[1..close]));
                return &after[close + 1..];
            }
            out.push('k');
        }
        '0' if !after.starts_with(|d: char| d.is_ascii_digit()) => out.push_str(r"\x{0}"),
        'v' => out.push_str(r"\x{B}"),
        'b' if in_class => out.push_str(r"\x{8}"),
        'c' => match after.chars().next().filter(char::is_ascii_alphabetic) {
            Some(letter) => {
                out.push_str(&format!("\\x{{{:X}}}", (letter as u32) % 32));
                return &after[1..];
            }
            None => out.push_str(r"\\c"),
        },
        c if c.is_ascii_alphanumeric() => {
            out.push('\\');
            out.push(c);
        }
        c if META.contains(c) => {
            out.push('\\');
            out.push(c);
        }
        // identity escape of a character with no meaning
        c => out.push(c),
    }
    after
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Template, builder, compile};

    #[test]
    fn test_translate_flags() {
        let flags = Flags {
            ignore_case: true,
            ..Flags::default()
        };
        assert_eq!(translate("a", &flags), "(?s)(?i)(?m)a");
        let flags = Flags {
            multiline: false,
            ..Flags::default()
        };
        assert_eq!(translate("a", &flags), "(?s)a");
    }

    #[test]
    fn test_translate_syntax() {
        let flags = Flags {
            multiline: false,
            ..Flags::default()
        };
        assert_eq!(translate(r"(?<x>a)\k<x>", &flags), "(?s)(?P<x>a)(?P=x)");
        assert_eq!(translate(r"(?<=a)(?<!b)", &flags), "(?s)(?<=a)(?<!b)");
        assert_eq!(translate(r"[]a[^]", &flags), r"(?s)(?!)a[\s\S]");
        assert_eq!(translate(r"\u2028\u{1F600}", &flags), r"(?s)\x{2028}\x{1F600}");
        assert_eq!(translate(r"\/\-\,", &flags), r"(?s)/\-,");
        assert_eq!(translate(r"[a[]", &flags), r"(?s)[a\[]");
    }

    #[test]
    fn test_translate_nested_classes() {
        let flags = Flags {
            multiline: false,
            unicode: UnicodeMode::UnicodeSets,
            ..Flags::default()
        };
        assert_eq!(translate(r"[a[b]]", &flags), r"(?s)[a[b]]");
    }

    #[test]
    fn test_find() {
        let pattern = compile("at-least-1 digit").unwrap();
        let m = pattern.find("abc 123 456").unwrap().unwrap();
        assert_eq!((m.start, m.end), (4, 7));
        assert_eq!(m.text, "123");
        assert!(pattern.find("abc").unwrap().is_none());
    }

    #[test]
    fn test_find_all() {
        let pattern = compile("at-least-1 digit").unwrap();
        let found: Vec<String> = pattern
            .find_all("1 22 333")
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(found, ["1", "22", "333"]);
    }

    #[test]
    fn test_captures() {
        let pattern =
            compile(r#"year: 4 digit "-" month: 2 digit optional ("-" 3: 2 digit)"#).unwrap();
        let m = pattern.find("on 2024-06").unwrap().unwrap();
        assert_eq!(m.named_group("year"), Some("2024"));
        assert_eq!(m.group(2), Some("06"));
        assert_eq!(m.group(3), None);
        assert_eq!(m.groups.len(), 3);
    }

    #[test]
    fn test_backreference_matching() {
        let pattern = compile(r#"word: at-least-1 word-char " " match<word>"#).unwrap();
        assert!(pattern.is_match("hello hello").unwrap());
        assert!(!pattern.is_match("hello world").unwrap());
    }

    #[test]
    fn test_ignore_case() {
        let pattern = builder().ignore_case().compile(r#""abc""#).unwrap();
        assert!(pattern.is_match("xABCx").unwrap());
    }

    #[test]
    fn test_line_boundaries() {
        let multiline = compile(r#"begin-of-line "b""#).unwrap();
        assert!(multiline.is_match("a\nb").unwrap());

        let single_line = compile(r#"begin-of-line "b" end-of-text"#).unwrap();
        assert!(single_line.is_match("a\nb").unwrap());
        assert!(!single_line.is_match("ab").unwrap());
        assert!(!single_line.is_match("b\na").unwrap());
    }

    #[test]
    fn test_exec_global() {
        let mut pattern = compile("at-least-1 digit").unwrap();
        let input = "a1b22c";
        assert_eq!(pattern.exec(input).unwrap().unwrap().text, "1");
        assert_eq!(pattern.last_index, 2);
        assert_eq!(pattern.exec(input).unwrap().unwrap().text, "22");
        assert_eq!(pattern.last_index, 5);
        assert!(pattern.exec(input).unwrap().is_none());
        assert_eq!(pattern.last_index, 0);
    }

    #[test]
    fn test_exec_sticky() {
        let mut pattern = builder().sticky().compile("digit").unwrap();
        let input = "12a3";
        assert_eq!(pattern.exec(input).unwrap().unwrap().text, "1");
        assert_eq!(pattern.exec(input).unwrap().unwrap().text, "2");
        assert!(pattern.exec(input).unwrap().is_none());
        assert_eq!(pattern.last_index, 0);
    }

    #[test]
    fn test_exec_without_global() {
        let mut pattern = builder().first().compile("digit").unwrap();
        pattern.last_index = 3;
        assert_eq!(pattern.exec("1a2").unwrap().unwrap().start, 0);
        assert_eq!(pattern.last_index, 3);
    }

    #[test]
    fn test_copies_have_their_own_cursor() {
        let mut a = compile("digit").unwrap();
        let mut b = a.clone();
        a.exec("12").unwrap();
        a.exec("12").unwrap();
        assert_eq!(b.exec("12").unwrap().unwrap().text, "1");
        assert_eq!(a.last_index, 2);
        assert_eq!(b.last_index, 1);
    }

    #[test]
    fn test_replace() {
        let all = compile("name: at-least-1 word-char").unwrap();
        assert_eq!(all.replace("a bc", "<$<name>>").unwrap(), "<a> <bc>");
        let first = builder().first().compile("digit").unwrap();
        assert_eq!(first.replace("1 2", "[$&]").unwrap(), "[1] 2");
        let groups = compile(r#"group digit group digit"#).unwrap();
        assert_eq!(groups.replace("12", "$2$1$$").unwrap(), "21$");
        assert_eq!(groups.replace("x12y", "$`|$'").unwrap(), "xx|yy");
        assert_eq!(groups.replace("12", "$3").unwrap(), "$3");
    }

    #[test]
    fn test_interpolated_pattern_matches() {
        let number = compile("at-least-1 digit").unwrap();
        let range = compile(
            Template::new("begin-of-text ")
                .interpolate(&number)
                .text(r#" "-" "#)
                .interpolate(&number)
                .text(" end-of-text"),
        )
        .unwrap();
        assert!(range.is_match("10-20").unwrap());
        assert!(!range.is_match("10-20x").unwrap());
    }

    #[test]
    fn test_never_matching_class() {
        let pattern = compile("not any").unwrap();
        assert!(!pattern.is_match("anything").unwrap());
    }
}
