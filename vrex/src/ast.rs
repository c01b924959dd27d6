//! Syntax tree of a verbose pattern and its rendering
//!
//! Every [`Node`] renders in two ways:
//! - [`Node::render`] gives the plain fragment, used when the node is one
//!   element of a sequence or alternation.
//! - [`Node::render_atom`] gives a fragment that can be directly followed by a
//!   quantifier suffix. By default this is the plain fragment wrapped in
//!   `(?:...)`; classes, escapes and groups are their own atoms.
//!
//! Rendering takes the flag set produced by the complete parse, so a text
//! boundary anywhere in the expression affects every line boundary.

use crate::escape::{escape_class, escape_regex};
use crate::flags::Flags;
use crate::quantifier::Quantifier;

/// Class body matching the line terminators
pub const LINE_TERMINATORS: &str = r"\r\n\u2028\u2029";

/// A backreference target
#[derive(Debug, Clone, PartialEq)]
pub enum Backreference {
    /// `\N`
    Number(u32),
    /// `\k<name>`
    Named(String),
}

/// A node of the syntax tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Concatenation; empty for an empty expression
    Sequence(Vec<Node>),

    /// Alternatives, never directly nested
    Alternation(Vec<Node>),

    /// `\d`, `\s`, `\w` or their upper-case complements
    ClassEscape {
        /// The escape letter as written (`d`, `D`, `s`, `S`, `w`, `W`)
        class: char,
        negative: bool,
    },

    /// One character, or any character but this one when negative
    SingleChar { ch: char, negative: bool },

    /// Any character (`.`); negated it matches nothing
    Any { negative: bool },

    /// Raw `[...]` class content
    ClassRange { body: String, negative: bool },

    /// Unicode property class `\p{...}`
    Property { name: String, negative: bool },

    /// A literal string
    Literal(String),

    /// Reference to an earlier capture
    Backreference(Backreference),

    /// `\b` or `\B`
    WordBoundary { negative: bool },

    /// Start or end of a line
    LineBoundary { start: bool, negative: bool },

    /// Start or end of the whole text
    TextBoundary { start: bool, negative: bool },

    /// Capturing group, optionally named
    Group {
        name: Option<String>,
        child: Box<Node>,
    },

    /// Lookahead or lookbehind assertion
    Lookaround {
        ahead: bool,
        negative: bool,
        child: Box<Node>,
    },

    /// A repeated node
    Quantified {
        child: Box<Node>,
        quantifier: Quantifier,
    },
}

impl Node {
    /// Create an empty expression
    pub fn empty() -> Self {
        Node::Sequence(Vec::new())
    }

    /// Create a sequence, collapsing a single item to itself
    pub fn sequence(mut nodes: Vec<Node>) -> Self {
        if nodes.len() == 1 {
            if let Some(node) = nodes.pop() {
                return node;
            }
        }
        Node::Sequence(nodes)
    }

    /// Join two alternatives, absorbing alternations on either side
    pub fn alternation(left: Node, right: Node) -> Self {
        match (left, right) {
            (Node::Alternation(mut left), Node::Alternation(right)) => {
                left.extend(right);
                Node::Alternation(left)
            }
            (Node::Alternation(mut left), right) => {
                left.push(right);
                Node::Alternation(left)
            }
            (left, Node::Alternation(mut right)) => {
                right.insert(0, left);
                Node::Alternation(right)
            }
            (left, right) => Node::Alternation(vec![left, right]),
        }
    }

    /// Create a literal node
    pub fn literal(text: impl Into<String>) -> Self {
        Node::Literal(text.into())
    }

    /// Create a capturing group
    pub fn group(name: Option<String>, child: Node) -> Self {
        Node::Group {
            name,
            child: Box::new(child),
        }
    }

    /// Create a quantified node
    pub fn quantified(child: Node, quantifier: Quantifier) -> Self {
        Node::Quantified {
            child: Box::new(child),
            quantifier,
        }
    }

    /// Toggle the `negative` flag
    ///
    /// Returns `false` for nodes that cannot be inverted.
    pub fn invert(&mut self) -> bool {
        match self {
            Node::ClassEscape { negative, .. }
            | Node::SingleChar { negative, .. }
            | Node::Any { negative }
            | Node::ClassRange { negative, .. }
            | Node::Property { negative, .. }
            | Node::WordBoundary { negative }
            | Node::LineBoundary { negative, .. }
            | Node::TextBoundary { negative, .. }
            | Node::Lookaround { negative, .. } => {
                *negative = !*negative;
                true
            }
            _ => false,
        }
    }

    /// Render the plain fragment
    pub fn render(&self, flags: &Flags) -> String {
        match self {
            Node::Sequence(items) => render_sequence(items, flags),
            Node::Alternation(items) => items
                .iter()
                .map(|item| item.render(flags))
                .collect::<Vec<_>>()
                .join("|"),
            Node::Literal(text) => escape_regex(text),
            Node::WordBoundary { negative: false } => r"\b".to_string(),
            Node::WordBoundary { negative: true } => r"\B".to_string(),
            Node::LineBoundary { start, negative } => line_boundary(*start, *negative, flags),
            Node::TextBoundary { start, negative } => anchor(*start, *negative).to_string(),
            Node::Lookaround {
                ahead,
                negative,
                child,
            } => format!(
                "(?{}{}{})",
                if *ahead { "" } else { "<" },
                if *negative { "!" } else { "=" },
                child.render(flags)
            ),
            Node::Quantified { child, quantifier } => {
                format!("{}{}", child.render_atom(flags), quantifier.to_regex_string())
            }
            _ => self.render_atom(flags),
        }
    }

    /// Render a fragment that can be followed by a quantifier
    pub fn render_atom(&self, flags: &Flags) -> String {
        match self {
            Node::ClassEscape { class, negative } => {
                let class = if *negative {
                    complement_escape(*class)
                } else {
                    *class
                };
                format!("\\{}", class)
            }
            Node::SingleChar { ch, negative } => {
                let text = ch.to_string();
                if *negative {
                    format!("[^{}]", escape_class(&text, flags.unicode))
                } else {
                    escape_regex(&text)
                }
            }
            Node::Any { negative: false } => ".".to_string(),
            Node::Any { negative: true } => "[]".to_string(),
            Node::ClassRange { body, negative } => {
                format!("[{}{}]", if *negative { "^" } else { "" }, body)
            }
            Node::Property { name, negative } => {
                format!("\\{}{{{}}}", if *negative { 'P' } else { 'p' }, name)
            }
            Node::Backreference(Backreference::Number(n)) => format!("\\{}", n),
            Node::Backreference(Backreference::Named(name)) => format!("\\k<{}>", name),
            Node::Group { name: None, child } => format!("({})", child.render(flags)),
            Node::Group {
                name: Some(name),
                child,
            } => format!("(?<{}>{})", name, child.render(flags)),
            _ => format!("(?:{})", self.render(flags)),
        }
    }

    /// Whether the rendering ends with a numbered backreference
    fn ends_with_numbered_backreference(&self) -> bool {
        match self {
            Node::Backreference(Backreference::Number(_)) => true,
            Node::Sequence(items) => items
                .last()
                .is_some_and(Node::ends_with_numbered_backreference),
            _ => false,
        }
    }
}

fn render_sequence(items: &[Node], flags: &Flags) -> String {
    let mut result = String::new();
    let mut after_backreference = false;
    for item in items {
        let text = match item {
            Node::Alternation(_) => item.render_atom(flags),
            _ => item.render(flags),
        };
        // `\1` followed by `0` would read as `\10`
        if after_backreference && text.starts_with(|c: char| c.is_ascii_digit()) {
            result.push_str("(?:)");
        }
        result.push_str(&text);
        after_backreference = item.ends_with_numbered_backreference();
    }
    result
}

fn line_boundary(start: bool, negative: bool, flags: &Flags) -> String {
    if flags.multiline {
        return anchor(start, negative).to_string();
    }
    match (start, negative) {
        (true, false) => format!("(?<=[{}]|^)", LINE_TERMINATORS),
        (true, true) => format!("(?<![{}]|^)", LINE_TERMINATORS),
        (false, false) => format!("(?=[{}]|$)", LINE_TERMINATORS),
        (false, true) => format!("(?![{}]|$)", LINE_TERMINATORS),
    }
}

/// `^` / `$` and their negations
fn anchor(start: bool, negative: bool) -> &'static str {
    match (start, negative) {
        (true, false) => "^",
        (true, true) => "(?<!^)",
        (false, false) => "$",
        (false, true) => "(?!$)",
    }
}

fn complement_escape(class: char) -> char {
    if class.is_ascii_lowercase() {
        class.to_ascii_uppercase()
    } else {
        class.to_ascii_lowercase()
    }
}
