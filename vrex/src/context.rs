//! Parser context: token cursor, flag state and error reporting
//!
//! The context hides interpolation markers from the grammar. Whenever the
//! cursor reaches an `InterpolationBegin` token it reads the flag declaration
//! of the interpolated expression and checks that it agrees with the outer
//! expression on case sensitivity and unicode mode.

use std::sync::Arc;

use crate::diagnostics::{Frame, render};
use crate::error::{CompileError, ParseErrorKind};
use crate::flags::Flags;
use crate::lexer::{Token, TokenKind};
use crate::source::Source;

/// Cursor over the token stream of one compilation
pub struct ParserContext<'a> {
    source: &'a Arc<Source>,
    tokens: &'a [Token],
    index: usize,
    flags: Flags,
    /// Open interpolations: index of the begin token and the flags in effect inside
    interpolation_stack: Vec<(usize, Flags)>,
}

impl<'a> ParserContext<'a> {
    /// Start at the first token, consuming the leading flag declaration
    pub fn new(
        source: &'a Arc<Source>,
        tokens: &'a [Token],
        base: Flags,
    ) -> Result<Self, CompileError> {
        let mut ctx = ParserContext {
            source,
            tokens,
            index: 0,
            flags: base,
            interpolation_stack: Vec::new(),
        };
        ctx.flags = ctx.read_declaration(base)?;
        ctx.skip_interpolation()?;
        Ok(ctx)
    }

    /// The flag set of the outer expression
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// The next grammar token, if any
    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    /// Consume the next grammar token, returning its index and the token
    pub fn read(&mut self) -> Result<Option<(usize, &'a Token)>, CompileError> {
        let tokens = self.tokens;
        let index = self.index;
        let Some(token) = tokens.get(index) else {
            return Ok(None);
        };
        self.index += 1;
        self.skip_interpolation()?;
        Ok(Some((index, token)))
    }

    /// Build an error located at token `target`, or at the end of input for `None`
    pub fn error(&self, target: Option<usize>, kind: ParseErrorKind) -> CompileError {
        // enclosing sources, each with the position of its placeholder in the parent
        let mut stack: Vec<(&Arc<Source>, usize)> = vec![(self.source, 0)];
        if let Some(target) = target {
            for (i, token) in self.tokens.iter().enumerate() {
                if token.kind == TokenKind::InterpolationEnd {
                    stack.pop();
                }
                if i == target {
                    break;
                }
                if let TokenKind::InterpolationBegin(source) = &token.kind {
                    stack.push((source, token.position()));
                }
            }
        }

        let mut position = match target.and_then(|i| self.tokens.get(i)) {
            Some(token) => token.position(),
            None => {
                stack.truncate(1);
                self.source.text().len()
            }
        };
        let mut frames = Vec::with_capacity(stack.len());
        while let Some((source, placeholder)) = stack.pop() {
            frames.push(Frame::new(source.clone(), position));
            position = placeholder;
        }
        CompileError::new(kind.category(), render(&frames, &kind.to_string()))
    }

    /// Apply the run of identifier tokens at the cursor on top of `base`
    fn read_declaration(&mut self, base: Flags) -> Result<Flags, CompileError> {
        let tokens = self.tokens;
        let mut flags = base;
        let mut first = true;
        while let Some(token) = tokens.get(self.index) {
            let TokenKind::Identifier(text) = &token.kind else {
                break;
            };
            flags
                .apply_declaration(text, first)
                .map_err(|kind| self.error(Some(self.index), kind))?;
            self.index += 1;
            first = false;
        }
        Ok(flags)
    }

    fn skip_interpolation(&mut self) -> Result<(), CompileError> {
        let tokens = self.tokens;
        while let Some(token) = tokens.get(self.index) {
            match &token.kind {
                TokenKind::InterpolationBegin(source) => {
                    let begin = self.index;
                    self.index += 1;
                    let enclosing = self
                        .interpolation_stack
                        .last()
                        .map_or(self.flags, |(_, flags)| *flags);
                    let inner = self.read_declaration(source.flags().unwrap_or(enclosing))?;
                    if let Some(kind) = self.flags.interpolation_mismatch(&inner) {
                        return Err(self.error(Some(begin), kind));
                    }
                    self.interpolation_stack.push((begin, inner));
                }
                TokenKind::InterpolationEnd => {
                    self.index += 1;
                    self.interpolation_stack.pop();
                }
                _ => break,
            }
        }
        Ok(())
    }
}
