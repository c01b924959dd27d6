//! Recursive-descent parser for verbose patterns
//!
//! Grammar (lowest precedence first):
//!   alternation := sequence ( "or" sequence )*
//!   sequence    := leaf*
//!   leaf        := "(" alternation ")"
//!                | "not" leaf
//!                | label leaf
//!                | constructor
//!
//! A constructor is the first entry of an ordered table that accepts the
//! token. Constructors that take an operand (`group`, `look-ahead`,
//! quantifiers) parse exactly one following leaf, so longer operands need
//! brackets: `at-least-1 (digit "-")`.

use std::sync::Arc;

use crate::ast::{Backreference, LINE_TERMINATORS, Node};
use crate::context::ParserContext;
use crate::error::{CompileError, ParseErrorKind, Result};
use crate::flags::{Flags, UnicodeMode};
use crate::groups::{GroupRegistry, is_positional};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::quantifier::Quantifier;
use crate::source::Source;

type Constructor<'a> =
    fn(&mut Parser<'a>, usize, &'a Token) -> std::result::Result<Option<Node>, CompileError>;

/// The outcome of a successful parse
#[derive(Debug, Clone)]
pub struct Parsed {
    /// Root of the syntax tree
    pub root: Node,
    /// Flags after the whole expression has been read
    pub flags: Flags,
    /// Capture groups in numbering order
    pub groups: GroupRegistry,
}

impl Parsed {
    /// Render the tree with the final flags
    pub fn render(&self) -> String {
        self.root.render(&self.flags)
    }
}

/// Parser over the token stream of one compilation
pub struct Parser<'a> {
    ctx: ParserContext<'a>,
    groups: GroupRegistry,
    /// Backreferences with their token, checked once all groups are known
    backreferences: Vec<(usize, Backreference)>,
}

impl<'a> Parser<'a> {
    /// Create a parser; the leading flag declaration is applied on top of `base`
    pub fn new(
        source: &'a Arc<Source>,
        tokens: &'a [Token],
        base: Flags,
    ) -> std::result::Result<Self, CompileError> {
        Ok(Parser {
            ctx: ParserContext::new(source, tokens, base)?,
            groups: GroupRegistry::new(),
            backreferences: Vec::new(),
        })
    }

    /// Parse the entire token stream
    pub fn parse(mut self) -> std::result::Result<Parsed, CompileError> {
        let root = self.parse_alternation()?;

        // parse_sequence only stops early at a closing bracket
        if let Some((index, _)) = self.ctx.read()? {
            return Err(self
                .ctx
                .error(Some(index), ParseErrorKind::UnexpectedClosingBracket));
        }

        for (index, backreference) in &self.backreferences {
            if let Err(err) = self.groups.resolve(backreference) {
                return Err(self.ctx.error(Some(*index), err.into()));
            }
        }

        Ok(Parsed {
            root,
            flags: *self.ctx.flags(),
            groups: self.groups,
        })
    }

    fn error(&self, index: usize, kind: ParseErrorKind) -> CompileError {
        self.ctx.error(Some(index), kind)
    }

    fn next_is_keyword(&self, keyword: &str) -> bool {
        self.ctx.peek().is_some_and(|t| t.kind.is_keyword(keyword))
    }

    /// alternation := sequence ( "or" sequence )*
    fn parse_alternation(&mut self) -> std::result::Result<Node, CompileError> {
        let left = self.parse_sequence()?;
        if !self.next_is_keyword("or") {
            return Ok(left);
        }
        self.ctx.read()?;
        let right = self.parse_alternation()?;
        Ok(Node::alternation(left, right))
    }

    /// sequence := leaf*
    fn parse_sequence(&mut self) -> std::result::Result<Node, CompileError> {
        let mut items = Vec::new();
        while let Some(token) = self.ctx.peek() {
            if token.kind == TokenKind::End || token.kind.is_keyword("or") {
                break;
            }
            items.push(self.parse_leaf()?);
        }
        Ok(Node::sequence(items))
    }

    fn parse_leaf(&mut self) -> std::result::Result<Node, CompileError> {
        let Some((index, token)) = self.ctx.read()? else {
            return Err(self.ctx.error(None, ParseErrorKind::UnexpectedEnd));
        };

        match &token.kind {
            TokenKind::Begin => {
                let node = self.parse_alternation()?;
                match self.ctx.read()? {
                    Some((_, end)) if end.kind == TokenKind::End => Ok(node),
                    _ => Err(self.error(index, ParseErrorKind::UnterminatedBracket)),
                }
            }
            TokenKind::End => Err(self.error(index, ParseErrorKind::UnexpectedClosingBracket)),
            TokenKind::Identifier(text) => Err(self.error(
                index,
                ParseErrorKind::UnexpectedIdentifier(text.clone()),
            )),
            TokenKind::InterpolationBegin(_) | TokenKind::InterpolationEnd => {
                Err(self.error(index, ParseErrorKind::UnexpectedToken))
            }
            TokenKind::Label(label) => self.parse_label(index, label),
            TokenKind::Keyword(keyword) if keyword == "not" => {
                let mut node = self.parse_leaf()?;
                if node.invert() {
                    Ok(node)
                } else {
                    Err(self.error(index, ParseErrorKind::NotNotAllowed))
                }
            }
            TokenKind::Keyword(_) | TokenKind::Literal(_) | TokenKind::CharacterClass { .. } => {
                match self.construct(index, token)? {
                    Some(node) => Ok(node),
                    None => Err(self.error(
                        index,
                        ParseErrorKind::UnknownKeyword(token.kind.to_string()),
                    )),
                }
            }
        }
    }

    /// Try the constructors in order; the first that accepts the token wins
    fn construct(
        &mut self,
        index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        let constructors: [Constructor<'a>; 13] = [
            Parser::class_escape,
            Parser::single_char,
            Parser::any,
            Parser::class_range,
            Parser::property,
            Parser::literal,
            Parser::backreference,
            Parser::word_boundary,
            Parser::line_boundary,
            Parser::text_boundary,
            Parser::group,
            Parser::lookaround,
            Parser::quantified,
        ];
        for constructor in constructors {
            if let Some(node) = constructor(self, index, token)? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// `name: leaf` or the positional `1: leaf`
    fn parse_label(
        &mut self,
        index: usize,
        label: &str,
    ) -> std::result::Result<Node, CompileError> {
        self.open_group(index, Some(label))?;
        let child = self.parse_leaf()?;
        Ok(Node::group(named(label), child))
    }

    fn open_group(
        &mut self,
        index: usize,
        label: Option<&str>,
    ) -> std::result::Result<u32, CompileError> {
        self.groups
            .open(label)
            .map_err(|err| self.error(index, err.into()))
    }

    /// Read the `<identifier>` that must follow keyword token `index`
    fn expect_identifier(
        &mut self,
        index: usize,
        after: &'static str,
    ) -> std::result::Result<&'a str, CompileError> {
        match self.ctx.read()? {
            Some((_, Token {
                kind: TokenKind::Identifier(text),
                ..
            })) => Ok(text.trim()),
            Some((other, _)) => Err(self.error(other, ParseErrorKind::ExpectedIdentifier(after))),
            None => Err(self.error(index, ParseErrorKind::ExpectedIdentifier(after))),
        }
    }

    fn class_escape(
        &mut self,
        _index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        let node = match &token.kind {
            TokenKind::CharacterClass { body, complement } => match body.as_str() {
                r"\d" | r"\D" | r"\s" | r"\S" | r"\w" | r"\W" => {
                    body.chars().nth(1).map(|class| Node::ClassEscape {
                        class,
                        negative: *complement,
                    })
                }
                _ => None,
            },
            TokenKind::Keyword(keyword) => {
                let class = match keyword.as_str() {
                    "digit" => 'd',
                    "white-space" | "whitespace" => 's',
                    "word-character" | "word-char" => 'w',
                    _ => return Ok(None),
                };
                Some(Node::ClassEscape {
                    class,
                    negative: false,
                })
            }
            _ => None,
        };
        Ok(node)
    }

    fn single_char(
        &mut self,
        _index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        let (ch, negative) = match &token.kind {
            TokenKind::Literal(text) => match single(text) {
                Some(ch) => (ch, false),
                None => return Ok(None),
            },
            TokenKind::CharacterClass { body, complement } => match single(body) {
                Some(ch) => (ch, *complement),
                None => return Ok(None),
            },
            TokenKind::Keyword(keyword) => match keyword.as_str() {
                r"\n" | "nl" | "new-line" | "lf" | "line-feed" => ('\n', false),
                r"\r" | "cr" | "carriage-return" => ('\r', false),
                r"\t" | "tab" | "tabulation" => ('\t', false),
                r"\0" | "null" | "nul" => ('\0', false),
                "sp" | "space" => (' ', false),
                "nbsp" => ('\u{a0}', false),
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(Node::SingleChar { ch, negative }))
    }

    fn any(
        &mut self,
        _index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        Ok(token
            .kind
            .is_keyword("any")
            .then_some(Node::Any { negative: false }))
    }

    fn class_range(
        &mut self,
        _index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        let node = match &token.kind {
            TokenKind::CharacterClass { body, complement } => Some(Node::ClassRange {
                body: body.clone(),
                negative: *complement,
            }),
            TokenKind::Keyword(keyword)
                if matches!(
                    keyword.as_str(),
                    "line-terminator" | "line-term" | "terminator" | "term"
                ) =>
            {
                Some(Node::ClassRange {
                    body: LINE_TERMINATORS.to_string(),
                    negative: false,
                })
            }
            _ => None,
        };
        Ok(node)
    }

    fn property(
        &mut self,
        index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        if !token.kind.is_keyword("prop") && !token.kind.is_keyword("property") {
            return Ok(None);
        }
        if self.ctx.flags().unicode == UnicodeMode::Legacy {
            return Err(self.error(index, ParseErrorKind::PropertyWithoutUnicode));
        }
        let name = self.expect_identifier(index, "property")?;
        Ok(Some(Node::Property {
            name: name.to_string(),
            negative: false,
        }))
    }

    fn literal(
        &mut self,
        _index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        match &token.kind {
            TokenKind::Literal(text) => Ok(Some(Node::literal(text.as_str()))),
            _ => Ok(None),
        }
    }

    fn backreference(
        &mut self,
        index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        if !token.kind.is_keyword("match") {
            return Ok(None);
        }
        let text = self.expect_identifier(index, "match")?;
        let target = match text.parse::<u32>() {
            Ok(n) if is_positional(text) && !text.starts_with('0') => Backreference::Number(n),
            _ => Backreference::Named(text.to_string()),
        };
        self.backreferences.push((index, target.clone()));
        Ok(Some(Node::Backreference(target)))
    }

    fn word_boundary(
        &mut self,
        _index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        let found = token.kind.is_keyword("word-boundary") || token.kind.is_keyword("word-bound");
        Ok(found.then_some(Node::WordBoundary { negative: false }))
    }

    fn line_boundary(
        &mut self,
        _index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        let start = match &token.kind {
            TokenKind::Keyword(k) if k == "begin-of-line" || k == "start-of-line" => true,
            TokenKind::Keyword(k) if k == "end-of-line" => false,
            _ => return Ok(None),
        };
        Ok(Some(Node::LineBoundary {
            start,
            negative: false,
        }))
    }

    fn text_boundary(
        &mut self,
        _index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        let start = match &token.kind {
            TokenKind::Keyword(k) if k == "begin-of-text" || k == "start-of-text" => true,
            TokenKind::Keyword(k) if k == "end-of-text" => false,
            _ => return Ok(None),
        };
        // affects every line boundary of the expression, including earlier ones
        self.ctx.flags_mut().multiline = false;
        Ok(Some(Node::TextBoundary {
            start,
            negative: false,
        }))
    }

    fn group(
        &mut self,
        index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        if !token.kind.is_keyword("group") {
            return Ok(None);
        }
        let name = match self.ctx.peek() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                ..
            }) => {
                self.ctx.read()?;
                Some(name.trim())
            }
            _ => None,
        };
        self.open_group(index, name)?;
        let child = self.parse_leaf()?;
        Ok(Some(Node::group(name.and_then(named), child)))
    }

    fn lookaround(
        &mut self,
        _index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        let ahead = match &token.kind {
            TokenKind::Keyword(k) if k == "lookahead" || k == "look-ahead" => true,
            TokenKind::Keyword(k) if k == "lookbehind" || k == "look-behind" => false,
            _ => return Ok(None),
        };
        let negative = self.next_is_keyword("not");
        if negative {
            self.ctx.read()?;
        }
        let child = self.parse_leaf()?;
        Ok(Some(Node::Lookaround {
            ahead,
            negative,
            child: Box::new(child),
        }))
    }

    fn quantified(
        &mut self,
        index: usize,
        token: &'a Token,
    ) -> std::result::Result<Option<Node>, CompileError> {
        let TokenKind::Keyword(keyword) = &token.kind else {
            return Ok(None);
        };
        let quantifier = match Quantifier::from_keyword(keyword) {
            None => return Ok(None),
            Some(Ok(quantifier)) => quantifier,
            Some(Err(reason)) => {
                return Err(self.error(
                    index,
                    ParseErrorKind::MalformedQuantifier {
                        keyword: keyword.clone(),
                        reason,
                    },
                ));
            }
        };
        let child = self.parse_leaf()?;
        Ok(Some(Node::quantified(child, quantifier)))
    }
}

/// The only character of `text`, if it has exactly one
fn single(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let ch = chars.next()?;
    chars.next().is_none().then_some(ch)
}

/// Group name for the pattern; positional captures stay unnamed
fn named(name: &str) -> Option<String> {
    (!is_positional(name)).then(|| name.to_string())
}

/// Parse standalone text with default flags
///
/// # Example
/// ```
/// use vrex::parse;
///
/// let parsed = parse("optional [+-] at-least-1 digit").unwrap();
/// assert_eq!(parsed.render(), r"[+-]?\d+");
/// ```
pub fn parse(input: &str) -> Result<Parsed> {
    let source = Arc::new(Source::plain(input));
    let tokens = tokenize(input).map_err(|err| err.into_error())?;
    let parsed = Parser::new(&source, &tokens, Flags::default())?.parse()?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};

    fn convert(input: &str) -> String {
        parse(input).unwrap().render()
    }

    fn message(input: &str) -> String {
        match parse(input) {
            Err(Error::Compile(err)) => err.message().to_string(),
            other => panic!("expected a compile error, got {:?}", other),
        }
    }

    fn first_line(input: &str) -> String {
        message(input).lines().next().unwrap_or_default().to_string()
    }

    #[test]
    fn test_empty() {
        assert_eq!(convert(""), "");
        assert_eq!(convert("  // nothing\n"), "");
    }

    #[test]
    fn test_class_escapes() {
        assert_eq!(convert("digit white-space word-char"), r"\d\s\w");
        assert_eq!(convert(r"[\d] [^\w] not [\S]"), r"\d\W\s");
        assert_eq!(convert("not digit"), r"\D");
        assert_eq!(convert("not not digit"), r"\d");
    }

    #[test]
    fn test_single_chars() {
        assert_eq!(convert(r#""." [a] not [b] not "-""#), r"\.a[^b][^\-]");
        assert_eq!(convert("tab sp nbsp"), "\t \u{a0}");
        assert_eq!(convert(r"\n not cr"), "\n[^\r]");
    }

    #[test]
    fn test_any_and_ranges() {
        assert_eq!(convert("any not any"), ".[]");
        assert_eq!(convert("[a-z] not [0-9_]"), "[a-z][^0-9_]");
        assert_eq!(convert("not [^x-y]"), "[x-y]");
        assert_eq!(convert("line-terminator"), format!("[{}]", LINE_TERMINATORS));
    }

    #[test]
    fn test_literals() {
        assert_eq!(convert(r#""a+b" 'c|d'"#), r"a\+bc\|d");
    }

    #[test]
    fn test_property() {
        assert_eq!(convert("prop<L> not property<Script=Greek>"), r"\p{L}\P{Script=Greek}");
        assert_eq!(first_line("prop"), "Expecting identifier after \"property\".");
        assert_eq!(first_line("prop any"), "Expecting identifier after \"property\".");
        assert_eq!(
            first_line("<legacy> prop<L>"),
            "Unicode property classes are not available in the legacy mode."
        );
    }

    #[test]
    fn test_quantifiers() {
        assert_eq!(convert("optional [+-] at-least-1 digit"), r"[+-]?\d+");
        assert_eq!(convert("repeat any"), ".*");
        assert_eq!(convert("lazy-repeat any"), ".*?");
        assert_eq!(convert(r#"3 "ab""#), "(?:ab){3}");
        assert_eq!(convert("2-to-4 (digit any)"), r"(?:\d.){2,4}");
        assert_eq!(convert("at-most-3 digit"), r"\d{0,3}");
        assert_eq!(convert("least-2 digit"), r"\d{2,}");
        assert_eq!(convert("optional optional digit"), r"(?:\d?)?");
    }

    #[test]
    fn test_malformed_quantifier() {
        assert_eq!(
            first_line("at-least-3-to-5 digit"),
            "Invalid quantifier \"at-least-3-to-5\": exactly one number expected."
        );
        assert_eq!(
            first_line("5-to-2 digit"),
            "Invalid quantifier \"5-to-2\": the minimum is greater than the maximum."
        );
    }

    #[test]
    fn test_alternation() {
        assert_eq!(convert("digit or any"), r"\d|.");
        assert_eq!(convert("(digit or any) or word-char"), r"\d|.|\w");
        assert_eq!(convert(r#""a" ("b" or "c")"#), "a(?:b|c)");
        assert_eq!(convert("optional (digit or any)"), r"(?:\d|.)?");
        assert_eq!(convert("group (digit or any)"), r"(\d|.)");
    }

    #[test]
    fn test_groups() {
        assert_eq!(convert(r#"group<name> "abc""#), "(?<name>abc)");
        assert_eq!(convert(r#"name: "abc""#), "(?<name>abc)");
        assert_eq!(convert("group digit"), r"(\d)");
        assert_eq!(convert("1: any"), "(.)");
        assert_eq!(convert("first: any 2: digit"), r"(?<first>.)(\d)");
        assert_eq!(convert("group<1> any group<2> any"), "(.)(.)");
    }

    #[test]
    fn test_positional_capture_errors() {
        assert_eq!(
            first_line("0: any"),
            "Invalid group number 0, this group has number 1."
        );
        assert_eq!(
            first_line("2: any"),
            "Invalid group number 2, this group has number 1."
        );
        assert_eq!(
            first_line("1: (any 1: digit)"),
            "Invalid group number 1, this group has number 2."
        );
        assert_eq!(
            first_line("first: digit 1: any"),
            "Invalid group number 1, this group has number 2."
        );
    }

    #[test]
    fn test_duplicate_group_name() {
        assert_eq!(
            first_line("x: any x: digit"),
            "Duplicate group name \"x\"."
        );
    }

    #[test]
    fn test_backreferences() {
        assert_eq!(convert("group any match<1>"), r"(.)\1");
        assert_eq!(convert("x: any match<x>"), r"(?<x>.)\k<x>");
        assert_eq!(convert(r#"group any match<1> "0""#), r"(.)\1(?:)0");
        assert_eq!(
            first_line("match<x>"),
            "Backreference to undefined group \"x\"."
        );
        assert_eq!(
            first_line("group any match<2>"),
            "Backreference to undefined group number 2."
        );
        assert_eq!(first_line("match any"), "Expecting identifier after \"match\".");
    }

    #[test]
    fn test_identifier_whitespace_is_trimmed() {
        assert_eq!(convert("x: any match< x >"), r"(?<x>.)\k<x>");
        assert_eq!(convert("group< x > any match<x>"), r"(?<x>.)\k<x>");
        assert_eq!(convert("group< 1 > any match< 1 >"), r"(.)\1");
        assert_eq!(convert("prop< L >"), r"\p{L}");
    }

    #[test]
    fn test_backreference_before_group() {
        // numbering is only checked once every group is known
        assert_eq!(convert("optional match<x> x: any"), r"\k<x>?(?<x>.)");
    }

    #[test]
    fn test_quantified_backreference_before_digit() {
        // the quantifier already ends the reference
        assert_eq!(convert(r#"group any optional match<1> "0""#), r"(.)\1?0");
        assert_eq!(
            convert(r#"group any optional (match<1> "0")"#),
            r"(.)(?:\1(?:)0)?"
        );
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(convert("word-boundary not word-bound"), r"\b\B");
        assert_eq!(convert("begin-of-line end-of-line"), "^$");
        assert_eq!(convert("not start-of-line not end-of-line"), "(?<!^)(?!$)");
        assert_eq!(convert("not begin-of-text"), "(?<!^)");
    }

    #[test]
    fn test_text_boundary_is_retroactive() {
        let parsed = parse("begin-of-line any end-of-text").unwrap();
        assert!(!parsed.flags.multiline);
        assert_eq!(
            parsed.render(),
            format!("(?<=[{}]|^).$", LINE_TERMINATORS)
        );
    }

    #[test]
    fn test_lookaround() {
        assert_eq!(convert("look-ahead digit"), r"(?=\d)");
        assert_eq!(convert("lookahead not digit"), r"(?!\d)");
        assert_eq!(convert("look-behind (digit any)"), r"(?<=\d.)");
        assert_eq!(convert("not lookbehind digit"), r"(?<!\d)");
    }

    #[test]
    fn test_bracket_errors() {
        assert_eq!(first_line("(digit"), "Unterminated bracket.");
        assert_eq!(first_line("digit)"), "Unexpected closing bracket.");
        assert_eq!(first_line("(digit))"), "Unexpected closing bracket.");
        assert_eq!(first_line("group"), "Unexpected end of expression.");
    }

    #[test]
    fn test_grammar_errors() {
        assert_eq!(first_line("digit foo"), "Unknown keyword \"foo\".");
        assert_eq!(
            first_line("not \"abc\""),
            "The \"not\" keyword is not allowed before this expression."
        );
        assert_eq!(
            first_line("not group digit"),
            "The \"not\" keyword is not allowed before this expression."
        );
        assert_eq!(first_line("digit <first>"), "Unexpected identifier \"<first>\".");
    }

    #[test]
    fn test_error_category() {
        let Err(Error::Compile(err)) = parse("digit foo") else {
            panic!("expected a compile error");
        };
        assert_eq!(err.kind(), ErrorKind::Grammar);
        assert_eq!(
            err.message(),
            "Unknown keyword \"foo\".\n    digit foo\n          ^- line 1, column 7"
        );
    }

    #[test]
    fn test_groups_are_collected() {
        let parsed = parse("a: any group digit b: any").unwrap();
        assert_eq!(parsed.groups.len(), 3);
        assert_eq!(parsed.groups.index_of("b"), Some(3));
    }
}
