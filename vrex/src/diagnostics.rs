//! Rendering of error locations
//!
//! An error is reported as a message followed by a one-line snippet of the
//! source and a caret pointing at the offending position. When the position
//! lies inside interpolated text, one more snippet is added for every
//! enclosing level, each introduced by `Interpolated from:`.
//!
//! ```text
//! Unknown keyword "digits".
//!     optional digits
//!              ^- line 1, column 10
//! Interpolated from:
//!     begin-of-text ${...} end-of-text
//!                   ^- line 1, column 15
//! ```

use std::sync::Arc;

use crate::source::Source;

/// Longest part of the line shown before the caret
const MAX_BEFORE: usize = 50;
/// Longest snippet line
const MAX_LINE: usize = 74;

/// A position inside one level of interpolated source
#[derive(Debug, Clone)]
pub struct Frame {
    pub source: Arc<Source>,
    pub position: usize,
}

impl Frame {
    pub fn new(source: Arc<Source>, position: usize) -> Self {
        Frame { source, position }
    }
}

/// Render `message` for a trail of frames, innermost first
pub fn render(frames: &[Frame], message: &str) -> String {
    if frames.is_empty() {
        return message.to_string();
    }
    let mut long_message = String::new();
    for (level, frame) in frames.iter().enumerate() {
        let heading = if level == 0 {
            message
        } else {
            "Interpolated from:"
        };
        long_message.push_str(&snippet(frame, heading));
    }
    long_message.trim_end().to_string()
}

fn snippet(frame: &Frame, message: &str) -> String {
    let text = frame.source.text();
    let position = frame.position.min(text.len());
    let (head, tail) = text.split_at(position);

    let line_number = head.matches('\n').count() + 1;
    let line_before = head.rsplit('\n').next().unwrap_or_default();
    let line_after = tail
        .split(['\n', '\r', '\u{2028}', '\u{2029}'])
        .next()
        .unwrap_or_default();
    let column_number = line_before.chars().count() + 1;

    let mut before = prettify(&frame.source, line_before);
    let mut after = prettify(&frame.source, line_after);
    if before.len() > MAX_BEFORE {
        before.drain(..before.len() - MAX_BEFORE);
    }
    after.truncate(MAX_LINE);
    while before.len() + after.len() > MAX_LINE {
        if before.len() > after.len() {
            before.remove(0);
        } else {
            after.pop();
        }
    }

    let before: String = before.into_iter().collect();
    let after: String = after.into_iter().collect();
    let before = before.trim_start();
    let after = after.trim_end();
    format!(
        "{}\n    {}{}\n    {}^- line {}, column {}\n",
        message,
        before,
        after,
        " ".repeat(before.chars().count()),
        line_number,
        column_number
    )
}

/// Placeholders shown as `${...}`, control characters as spaces
fn prettify(source: &Source, text: &str) -> Vec<char> {
    source
        .prettify(text)
        .chars()
        .map(|c| if c <= ' ' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str, prefix: &str, position: usize) -> Frame {
        Frame::new(Arc::new(Source::new(text, prefix)), position)
    }

    #[test]
    fn test_single_frame() {
        let message = render(&[frame("digit foo any", "`ABC", 6)], "Unknown keyword \"foo\".");
        assert_eq!(
            message,
            "Unknown keyword \"foo\".\n    digit foo any\n          ^- line 1, column 7"
        );
    }

    #[test]
    fn test_line_and_column() {
        let message = render(&[frame("digit\n  any\n\tfoo", "`ABC", 13)], "Error.");
        assert_eq!(message, "Error.\n    foo\n    ^- line 3, column 2");
    }

    #[test]
    fn test_placeholder_is_prettified() {
        let message = render(&[frame("any `ABC0} foo", "`ABC", 11)], "Error.");
        assert_eq!(message, "Error.\n    any ${...} foo\n               ^- line 1, column 12");
    }

    #[test]
    fn test_interpolation_trail() {
        let frames = [
            frame("optional foo", "`XYZ", 9),
            frame("digit `ABC0}", "`ABC", 6),
        ];
        let message = render(&frames, "Unknown keyword \"foo\".");
        assert_eq!(
            message,
            "Unknown keyword \"foo\".\n    optional foo\n             ^- line 1, column 10\n\
             Interpolated from:\n    digit ${...}\n          ^- line 1, column 7"
        );
    }

    #[test]
    fn test_long_lines_are_truncated() {
        let text = format!("{} foo {}", "a".repeat(100), "b".repeat(100));
        let message = render(&[frame(&text, "`ABC", 101)], "Error.");
        let snippet = message.lines().nth(1).unwrap();
        let caret = message.lines().nth(2).unwrap();
        assert!(snippet.len() <= 4 + MAX_LINE);
        assert!(snippet.contains("foo"));
        assert_eq!(caret.find('^'), snippet.find("foo"));
        assert!(caret.ends_with("column 102"));
    }

    #[test]
    fn test_end_of_input() {
        let message = render(&[frame("group (", "`ABC", 7)], "Unexpected end of expression.");
        assert_eq!(
            message,
            "Unexpected end of expression.\n    group (\n           ^- line 1, column 8"
        );
    }
}
