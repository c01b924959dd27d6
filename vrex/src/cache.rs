//! Process-wide memo of compiled patterns
//!
//! Entries are keyed first by the builder flags and the literal segments of
//! the template, then by one key per interpolated value: the text itself, or
//! the identity of a compiled pattern. Identities are handed out on first use
//! from a counter, so two patterns compiled from the same text still key
//! differently. Nothing is ever evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use crate::flags::Flags;
use crate::pattern::{Expression, Pattern};
use crate::template::{Template, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    Text(String),
    Expression(u64),
}

type TemplateKey = (Flags, Vec<String>);
type Entries = HashMap<TemplateKey, HashMap<Vec<ValueKey>, Arc<Expression>>>;

static CACHE: LazyLock<Mutex<Entries>> = LazyLock::new(|| Mutex::new(HashMap::new()));

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a compiled expression
fn identity(expression: &Expression) -> u64 {
    *expression
        .identity
        .get_or_init(|| NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed))
}

fn value_keys(template: &Template) -> Vec<ValueKey> {
    template
        .values()
        .iter()
        .map(|value| match value {
            Value::Text(text) => ValueKey::Text(text.clone()),
            Value::Pattern(pattern) => ValueKey::Expression(identity(pattern.expression())),
        })
        .collect()
}

fn entries() -> MutexGuard<'static, Entries> {
    // a panic while holding the lock cannot leave a half-inserted entry
    CACHE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A fresh copy of the cached pattern for this template, if any
pub(crate) fn lookup(flags: &Flags, template: &Template) -> Option<Pattern> {
    let keys = value_keys(template);
    let entries = entries();
    let expression = entries
        .get(&(*flags, template.segments().to_vec()))?
        .get(&keys)?;
    Some(Pattern::from_expression(expression.clone()))
}

/// Remember a compiled pattern; an existing entry for the same key wins
pub(crate) fn insert(flags: &Flags, template: &Template, pattern: &Pattern) -> Pattern {
    let keys = value_keys(template);
    let mut entries = entries();
    let expression = entries
        .entry((*flags, template.segments().to_vec()))
        .or_default()
        .entry(keys)
        .or_insert_with(|| pattern.expression().clone());
    Pattern::from_expression(expression.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    #[test]
    fn test_identity_is_stable() {
        let a = compile("digit").unwrap();
        let b = compile("digit").unwrap();
        let first = identity(a.expression());
        assert_eq!(identity(a.expression()), first);
        assert_eq!(identity(a.clone().expression()), first);
        assert_ne!(identity(b.expression()), first);
    }

    #[test]
    fn test_lookup_after_insert() {
        let flags = Flags {
            sticky: true,
            ..Flags::default()
        };
        let template = Template::new("word-char /* cache test */");
        assert!(lookup(&flags, &template).is_none());

        let pattern = compile(template.clone()).unwrap();
        let stored = insert(&flags, &template, &pattern);
        assert!(stored.shares_expression(&pattern));

        let found = lookup(&flags, &template).unwrap();
        assert!(found.shares_expression(&pattern));
        assert!(lookup(&Flags::default(), &template).is_none());
    }

    #[test]
    fn test_interpolated_patterns_key_by_identity() {
        let flags = Flags::default();
        let a = compile("digit").unwrap();
        let b = compile("digit").unwrap();
        let with_a = Template::new("any /* identity */ ").interpolate(&a);
        let with_b = Template::new("any /* identity */ ").interpolate(&b);

        let pattern = compile(with_a.clone()).unwrap();
        insert(&flags, &with_a, &pattern);
        assert!(lookup(&flags, &with_a).is_some());
        assert!(lookup(&flags, &with_b).is_none());
    }
}
