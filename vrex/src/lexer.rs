//! Lexer for the verbose pattern language
//!
//! This module converts source text into a flat stream of [`Token`]s. Whitespace
//! and comments are skipped. Interpolation placeholders are resolved while
//! scanning: a string value is tokenized recursively and wrapped in
//! interpolation markers, a compiled pattern contributes its own retained
//! token stream.

use std::fmt;
use std::sync::Arc;

use crate::diagnostics::{Frame, render};
use crate::error::{CompileError, Error, LexerErrorKind, Span};
use crate::escape::{decode_string_literal, escape_class, escape_string_literal};
use crate::flags::{Flags, UnicodeMode};
use crate::pattern::Expression;
use crate::source::{Source, unique_prefix};

/// The kind of a token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A quoted string, already decoded
    Literal(String),
    /// The text between `<` and `>`
    Identifier(String),
    /// A bare name immediately followed by `:`
    Label(String),
    /// A keyword, lower-cased with hyphen variants normalised to `-`
    Keyword(String),
    /// Raw content of a `[...]` class
    CharacterClass {
        /// Text between the brackets, without the leading `^`
        body: String,
        /// Whether the class started with `^`
        complement: bool,
    },
    /// `(` or `{`
    Begin,
    /// `)` or `}`
    End,
    /// Start of tokens that came from an interpolated value
    InterpolationBegin(Arc<Source>),
    /// End of tokens that came from an interpolated value
    InterpolationEnd,
}

impl TokenKind {
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, TokenKind::Keyword(text) if text == keyword)
    }

    /// Interpolation markers are invisible to the grammar
    pub fn is_interpolation_marker(&self) -> bool {
        matches!(
            self,
            TokenKind::InterpolationBegin(_) | TokenKind::InterpolationEnd
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Literal(text) => write!(f, "\"{}\"", escape_string_literal(text)),
            TokenKind::Identifier(text) => write!(f, "<{}>", text),
            TokenKind::Label(text) => write!(f, "{}:", text),
            TokenKind::Keyword(text) => write!(f, "{}", text),
            TokenKind::CharacterClass { body, complement } => {
                write!(f, "[{}{}]", if *complement { "^" } else { "" }, body)
            }
            TokenKind::Begin => write!(f, "("),
            TokenKind::End => write!(f, ")"),
            TokenKind::InterpolationBegin(_) => write!(f, "${{"),
            TokenKind::InterpolationEnd => write!(f, "}}"),
        }
    }
}

/// A token together with its extent in the source it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    /// Byte offset of the token in its source text
    pub fn position(&self) -> usize {
        self.span.start
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// A value substituted for a placeholder
#[derive(Debug, Clone)]
pub enum Interpolation {
    /// Plain text, tokenized as if written in place
    Text(String),
    /// A previously compiled pattern, spliced as a bracketed sub-expression
    Expression(Arc<Expression>),
}

/// A lexer failure with the trail of interpolations it happened in
#[derive(Debug, Clone)]
pub struct LexError {
    pub kind: LexerErrorKind,
    /// Innermost location first
    pub frames: Vec<Frame>,
}

impl LexError {
    /// Convert into the crate error, rendering the source snippets
    pub fn into_error(self) -> Error {
        match self.kind {
            LexerErrorKind::MissingInterpolation(_) => Error::Internal(self.kind.to_string()),
            kind => CompileError::new(kind.category(), render(&self.frames, &kind.to_string()))
                .into(),
        }
    }
}

/// Lexer for verbose patterns
pub struct Lexer<'a> {
    source: Arc<Source>,
    values: &'a [Interpolation],
    declaration: Flags,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`, resolving its placeholders from `values`
    ///
    /// `flags` only provides the starting unicode mode, which decides how
    /// `[...]` classes are scanned.
    pub fn new(source: Arc<Source>, values: &'a [Interpolation], flags: Flags) -> Self {
        Lexer {
            source,
            values,
            declaration: flags,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole source
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(c) = self.rest().chars().next() else {
                break;
            };

            if let Some((index, len)) = self.source.match_placeholder(self.rest()) {
                self.pos += len;
                self.interpolate(index, Span::new(start, self.pos))?;
                continue;
            }

            match c {
                '{' | '(' => {
                    self.pos += 1;
                    self.push(TokenKind::Begin, start);
                }
                '}' | ')' => {
                    self.pos += 1;
                    self.push(TokenKind::End, start);
                }
                '"' | '\'' => self.scan_literal(c)?,
                '<' => self.scan_identifier()?,
                '[' => self.scan_character_class()?,
                '/' if self.rest().starts_with("/*") => {
                    let end = self.rest()[2..]
                        .find("*/")
                        .ok_or_else(|| self.error(LexerErrorKind::UnterminatedComment, start))?;
                    self.pos += end + 4;
                }
                '/' if self.rest().starts_with("//") => {
                    self.pos += self.rest().find('\n').map_or(self.rest().len(), |n| n + 1);
                }
                _ => {
                    if let Some(len) = self.label_len() {
                        let name = self.rest()[..len].to_string();
                        self.pos += len + 1;
                        self.push(TokenKind::Label(name), start);
                    } else {
                        self.scan_keyword()?;
                    }
                }
            }
        }
        Ok(self.tokens)
    }

    fn rest(&self) -> &str {
        &self.source.text()[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, Span::new(start, self.pos)));
    }

    fn error(&self, kind: LexerErrorKind, position: usize) -> LexError {
        LexError {
            kind,
            frames: vec![Frame::new(self.source.clone(), position)],
        }
    }

    fn value(&self, index: usize, position: usize) -> Result<&'a Interpolation, LexError> {
        self.values
            .get(index)
            .ok_or_else(|| self.error(LexerErrorKind::MissingInterpolation(index), position))
    }

    fn interpolate(&mut self, index: usize, span: Span) -> Result<(), LexError> {
        match self.value(index, span.start)? {
            Interpolation::Text(text) => {
                let prefix = unique_prefix(&[text.as_str()]);
                let inner = Arc::new(Source::new(text.clone(), prefix));
                let tokens = Lexer::new(inner.clone(), &[], self.declaration)
                    .tokenize()
                    .map_err(|mut err| {
                        err.frames.push(Frame::new(self.source.clone(), span.start));
                        err
                    })?;
                self.tokens
                    .push(Token::new(TokenKind::InterpolationBegin(inner), span));
                self.tokens.extend(tokens);
                self.tokens.push(Token::new(TokenKind::InterpolationEnd, span));
            }
            Interpolation::Expression(expression) => {
                self.tokens.push(Token::new(TokenKind::Begin, span));
                self.tokens.push(Token::new(
                    TokenKind::InterpolationBegin(expression.source.clone()),
                    span,
                ));
                self.tokens.extend(expression.tokens.iter().cloned());
                self.tokens.push(Token::new(TokenKind::InterpolationEnd, span));
                self.tokens.push(Token::new(TokenKind::End, span));
            }
        }
        Ok(())
    }

    fn scan_literal(&mut self, quote: char) -> Result<(), LexError> {
        let start = self.pos;
        let body_start = start + 1;
        let mut end = None;
        let mut chars = self.source.text()[body_start..].char_indices();
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                chars.next();
            } else if c == quote {
                end = Some(body_start + i);
                break;
            }
        }
        let end = end.ok_or_else(|| self.error(LexerErrorKind::UnterminatedLiteral, start))?;
        let raw = &self.source.text()[body_start..end];

        let content = self.source.substitute(raw, |index| match self.value(index, start)? {
            Interpolation::Text(text) => Ok(escape_string_literal(text)),
            Interpolation::Expression(_) => {
                Err(self.error(LexerErrorKind::ExpressionInLiteral, start))
            }
        })?;
        let text = decode_string_literal(&content).map_err(|kind| self.error(kind, start))?;

        self.pos = end + 1;
        self.push(TokenKind::Literal(text), start);
        Ok(())
    }

    fn scan_identifier(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let end = self.rest()[1..]
            .find('>')
            .ok_or_else(|| self.error(LexerErrorKind::UnterminatedIdentifier, start))?;
        let text = self.rest()[1..end + 1].to_string();
        self.pos += end + 2;

        // A leading declaration may switch the unicode mode for the rest of the text
        if self.tokens.iter().all(|t| matches!(t.kind, TokenKind::Identifier(_))) {
            let mut declared = self.declaration;
            if declared
                .apply_declaration(&text, self.tokens.is_empty())
                .is_ok()
            {
                self.declaration = declared;
            }
        }

        self.push(TokenKind::Identifier(text), start);
        Ok(())
    }

    fn scan_character_class(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let mut body_start = start + 1;
        let complement = self.source.text()[body_start..].starts_with('^');
        if complement {
            body_start += 1;
        }

        let nested = self.declaration.unicode == UnicodeMode::UnicodeSets;
        let mut depth = 1usize;
        let mut end = None;
        let mut chars = self.source.text()[body_start..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '[' if nested => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(body_start + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let end =
            end.ok_or_else(|| self.error(LexerErrorKind::UnterminatedCharacterClass, start))?;

        let mode = self.declaration.unicode;
        let raw = &self.source.text()[body_start..end];
        let body = self.source.substitute(raw, |index| match self.value(index, start)? {
            Interpolation::Text(text) => Ok(escape_class(text, mode)),
            Interpolation::Expression(_) => {
                Err(self.error(LexerErrorKind::ExpressionInCharacterClass, start))
            }
        })?;

        self.pos = end + 1;
        self.push(TokenKind::CharacterClass { body, complement }, start);
        Ok(())
    }

    /// Length of a `name:` label at the cursor, without the colon
    fn label_len(&self) -> Option<usize> {
        let rest = self.rest().as_bytes();
        let len = rest
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count();
        (len > 0 && rest.get(len) == Some(&b':')).then_some(len)
    }

    fn scan_keyword(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !is_keyword_char(c))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(self.error(LexerErrorKind::UnexpectedInput, start));
        }
        let keyword: String = rest[..len]
            .chars()
            .map(|c| if is_hyphen_variant(c) { '-' } else { c.to_ascii_lowercase() })
            .collect();
        self.pos += len;
        self.push(TokenKind::Keyword(keyword), start);
        Ok(())
    }
}

fn is_keyword_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '\\' || is_hyphen_variant(c)
}

/// Hyphens, dashes and the minus sign are all read as `-` inside keywords
fn is_hyphen_variant(c: char) -> bool {
    matches!(c, '\u{2010}'..='\u{2015}' | '\u{2212}')
}

/// Tokenize standalone text without interpolations
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(Arc::new(Source::plain(text)), &[], Flags::default()).tokenize()
}
