//! Escaping for the generated pattern and decoding of string literals

use crate::error::LexerErrorKind;
use crate::flags::UnicodeMode;

/// Escape a literal string so it matches itself in a pattern
pub fn escape_regex(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'
        ) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Escape text for use inside a `[...]` class
///
/// The unicode-sets mode reserves many more characters for nested classes
/// and set operators than the other modes do.
pub fn escape_class(text: &str, mode: UnicodeMode) -> String {
    let special: fn(char) -> bool = match mode {
        UnicodeMode::UnicodeSets => |c| {
            matches!(
                c,
                '(' | ')'
                    | '['
                    | ']'
                    | '{'
                    | '}'
                    | '/'
                    | '-'
                    | '\\'
                    | '|'
                    | '&'
                    | '!'
                    | '#'
                    | '$'
                    | '%'
                    | '*'
                    | '+'
                    | ','
                    | '.'
                    | ':'
                    | ';'
                    | '<'
                    | '='
                    | '>'
                    | '?'
                    | '@'
                    | '^'
                    | '`'
                    | '~'
            )
        },
        UnicodeMode::Legacy | UnicodeMode::Unicode => |c| matches!(c, '\\' | ']' | '^' | '-'),
    };
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if special(c) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Escape a value so that [`decode_string_literal`] gives it back unchanged
pub fn escape_string_literal(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\'' => result.push_str("\\'"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => result.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => result.push(c),
        }
    }
    result
}

/// Decode the content of a quoted literal (without the quotes)
///
/// Supports `\n \r \t \b \f \v \0`, `\xHH`, `\uHHHH` (surrogate pairs
/// included), `\u{H...}`, line continuations and identity escapes. Raw line
/// breaks, octal escapes and malformed hex escapes are rejected.
pub fn decode_string_literal(content: &str) -> Result<String, LexerErrorKind> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' | '\r' => return Err(LexerErrorKind::InvalidLiteral),
            '\\' => {
                let Some(escaped) = chars.next() else {
                    return Err(LexerErrorKind::InvalidLiteral);
                };
                match escaped {
                    'n' => result.push('\n'),
                    'r' => result.push('\r'),
                    't' => result.push('\t'),
                    'b' => result.push('\u{8}'),
                    'f' => result.push('\u{c}'),
                    'v' => result.push('\u{b}'),
                    '0' if !chars.peek().is_some_and(char::is_ascii_digit) => result.push('\0'),
                    '0'..='9' => return Err(LexerErrorKind::InvalidLiteral),
                    'x' => {
                        let value = read_hex(&mut chars, 2)?;
                        result.push(char::from_u32(value).ok_or(LexerErrorKind::InvalidLiteral)?);
                    }
                    'u' => {
                        let unit = read_unicode_escape(&mut chars)?;
                        result.push(combine_surrogates(unit, &mut chars)?);
                    }
                    // line continuation
                    '\n' | '\u{2028}' | '\u{2029}' => {}
                    '\r' => {
                        if chars.peek() == Some(&'\n') {
                            chars.next();
                        }
                    }
                    other => result.push(other),
                }
            }
            c => result.push(c),
        }
    }
    Ok(result)
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn read_hex(chars: &mut Chars<'_>, count: usize) -> Result<u32, LexerErrorKind> {
    let mut value = 0;
    for _ in 0..count {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or(LexerErrorKind::InvalidLiteral)?;
        value = value * 16 + digit;
    }
    Ok(value)
}

/// Read the part of a `\u` escape after the `u`
fn read_unicode_escape(chars: &mut Chars<'_>) -> Result<u32, LexerErrorKind> {
    if chars.peek() != Some(&'{') {
        return read_hex(chars, 4);
    }
    chars.next();
    let mut value: u32 = 0;
    let mut digits = 0;
    loop {
        match chars.next() {
            Some('}') if digits > 0 => return Ok(value),
            Some(c) => {
                let digit = c.to_digit(16).ok_or(LexerErrorKind::InvalidLiteral)?;
                value = value
                    .checked_mul(16)
                    .map(|v| v + digit)
                    .filter(|v| *v <= 0x10FFFF)
                    .ok_or(LexerErrorKind::InvalidLiteral)?;
                digits += 1;
            }
            None => return Err(LexerErrorKind::InvalidLiteral),
        }
    }
}

/// Turn a decoded code unit into a char, pairing a high surrogate with the `\uDC00..` escape after it
fn combine_surrogates(unit: u32, chars: &mut Chars<'_>) -> Result<char, LexerErrorKind> {
    if !(0xD800..0xDC00).contains(&unit) {
        return char::from_u32(unit).ok_or(LexerErrorKind::InvalidLiteral);
    }
    if chars.next() != Some('\\') || chars.next() != Some('u') {
        return Err(LexerErrorKind::InvalidLiteral);
    }
    let low = read_unicode_escape(chars)?;
    if !(0xDC00..0xE000).contains(&low) {
        return Err(LexerErrorKind::InvalidLiteral);
    }
    let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).ok_or(LexerErrorKind::InvalidLiteral)
}
