//! Quantifier keywords
//!
//! A quantifier is a single keyword placed before the leaf it repeats:
//!
//! | keyword                     | min | max |
//! |-----------------------------|-----|-----|
//! | `optional`                  | 0   | 1   |
//! | `repeat`                    | 0   | ∞   |
//! | `least-N`, `at-least-N`     | N   | ∞   |
//! | `most-N`, `at-most-N`       | 0   | N   |
//! | `N`, `repeat-N`             | N   | N   |
//! | `N-to-M`, `repeat-N-to-M`   | N   | M   |
//!
//! Any of them may start with `lazy-` and end with `-time` or `-times`.

/// How many times the following leaf may repeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    pub min: u32,
    /// `None` means unbounded
    pub max: Option<u32>,
    pub lazy: bool,
}

const ONE_NUMBER: &str = "exactly one number expected";

impl Quantifier {
    pub fn new(min: u32, max: Option<u32>, lazy: bool) -> Self {
        Quantifier { min, max, lazy }
    }

    /// Decode a quantifier keyword
    ///
    /// Returns `None` when the keyword is not shaped like a quantifier at all,
    /// and `Some(Err(reason))` when it is but cannot be decoded.
    pub fn from_keyword(keyword: &str) -> Option<Result<Self, &'static str>> {
        let (lazy, body) = match keyword.strip_prefix("lazy-") {
            Some(body) => (true, body),
            None => (false, keyword),
        };
        let body = body
            .strip_suffix("-times")
            .or_else(|| body.strip_suffix("-time"))
            .unwrap_or(body);

        let bounds = match decode_bounds(body) {
            Some(bounds) => bounds,
            None if lazy => return Some(Err("\"lazy-\" must be followed by a quantifier")),
            None => return None,
        };
        Some(bounds.map(|(min, max)| Quantifier::new(min, max, lazy)))
    }

    /// Render the quantifier suffix
    pub fn to_regex_string(&self) -> String {
        let mut result = match (self.min, self.max) {
            (0, None) => "*".to_string(),
            (1, None) => "+".to_string(),
            (min, None) => format!("{{{},}}", min),
            (min, Some(max)) if min == max => format!("{{{}}}", min),
            (0, Some(1)) => "?".to_string(),
            (min, Some(max)) => format!("{{{},{}}}", min, max),
        };
        if self.lazy {
            result.push('?');
        }
        result
    }
}

fn decode_bounds(body: &str) -> Option<Result<(u32, Option<u32>), &'static str>> {
    match body {
        "optional" => return Some(Ok((0, Some(1)))),
        "repeat" => return Some(Ok((0, None))),
        "least" | "at-least" | "most" | "at-most" => return Some(Err(ONE_NUMBER)),
        _ => {}
    }

    if let Some(rest) = body.strip_prefix("repeat-") {
        return Some(range(rest));
    }
    for (prefix, most) in [
        ("at-least-", false),
        ("least-", false),
        ("at-most-", true),
        ("most-", true),
    ] {
        if let Some(rest) = body.strip_prefix(prefix) {
            if rest.contains('-') {
                return Some(Err(ONE_NUMBER));
            }
            return Some(number(rest).map(|n| if most { (0, Some(n)) } else { (n, None) }));
        }
    }
    if body.starts_with(|c: char| c.is_ascii_digit()) {
        return Some(range(body));
    }
    None
}

/// `N`, `N-M` or `N-to-M`
fn range(text: &str) -> Result<(u32, Option<u32>), &'static str> {
    let Some((from, to)) = text.split_once("-to-").or_else(|| text.split_once('-')) else {
        let n = number(text)?;
        return Ok((n, Some(n)));
    };
    let (min, max) = (number(from)?, number(to)?);
    if min > max {
        return Err("the minimum is greater than the maximum");
    }
    Ok((min, Some(max)))
}

fn number(text: &str) -> Result<u32, &'static str> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err("expected a number");
    }
    text.parse().map_err(|_| "number too large")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(keyword: &str) -> Quantifier {
        Quantifier::from_keyword(keyword).unwrap().unwrap()
    }

    fn reject(keyword: &str) -> &'static str {
        Quantifier::from_keyword(keyword).unwrap().unwrap_err()
    }

    #[test]
    fn test_decode_table() {
        assert_eq!(decode("optional"), Quantifier::new(0, Some(1), false));
        assert_eq!(decode("repeat"), Quantifier::new(0, None, false));
        assert_eq!(decode("least-2"), Quantifier::new(2, None, false));
        assert_eq!(decode("at-least-1"), Quantifier::new(1, None, false));
        assert_eq!(decode("most-4"), Quantifier::new(0, Some(4), false));
        assert_eq!(decode("at-most-4"), Quantifier::new(0, Some(4), false));
        assert_eq!(decode("3"), Quantifier::new(3, Some(3), false));
        assert_eq!(decode("3-to-5"), Quantifier::new(3, Some(5), false));
    }

    #[test]
    fn test_decode_repeat_counts() {
        assert_eq!(decode("repeat-3"), Quantifier::new(3, Some(3), false));
        assert_eq!(decode("repeat-3-6"), Quantifier::new(3, Some(6), false));
        assert_eq!(decode("repeat-3-to-6"), Quantifier::new(3, Some(6), false));
    }

    #[test]
    fn test_decode_lazy_and_times() {
        assert_eq!(decode("lazy-repeat"), Quantifier::new(0, None, true));
        assert_eq!(decode("lazy-at-least-1"), Quantifier::new(1, None, true));
        assert_eq!(decode("2-times"), Quantifier::new(2, Some(2), false));
        assert_eq!(decode("1-time"), Quantifier::new(1, Some(1), false));
        assert_eq!(decode("lazy-2-to-3-times"), Quantifier::new(2, Some(3), true));
    }

    #[test]
    fn test_not_a_quantifier() {
        assert!(Quantifier::from_keyword("digit").is_none());
        assert!(Quantifier::from_keyword("at-digit").is_none());
        assert!(Quantifier::from_keyword("times").is_none());
    }

    #[test]
    fn test_malformed() {
        assert_eq!(reject("at-least-3-to-5"), ONE_NUMBER);
        assert_eq!(reject("most"), ONE_NUMBER);
        assert_eq!(reject("lazy-foo"), "\"lazy-\" must be followed by a quantifier");
        assert_eq!(reject("5-to-2"), "the minimum is greater than the maximum");
        assert_eq!(reject("99999999999"), "number too large");
        assert_eq!(reject("3x"), "expected a number");
        assert_eq!(reject("least-x"), "expected a number");
    }

    #[test]
    fn test_render() {
        assert_eq!(Quantifier::new(0, None, false).to_regex_string(), "*");
        assert_eq!(Quantifier::new(1, None, false).to_regex_string(), "+");
        assert_eq!(Quantifier::new(4, None, false).to_regex_string(), "{4,}");
        assert_eq!(Quantifier::new(3, Some(3), false).to_regex_string(), "{3}");
        assert_eq!(Quantifier::new(0, Some(1), false).to_regex_string(), "?");
        assert_eq!(Quantifier::new(2, Some(5), false).to_regex_string(), "{2,5}");
        assert_eq!(Quantifier::new(0, Some(1), true).to_regex_string(), "??");
        assert_eq!(Quantifier::new(1, None, true).to_regex_string(), "+?");
    }
}
