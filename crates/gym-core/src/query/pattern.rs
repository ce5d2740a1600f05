//! Triple pattern helpers shared by the planner and the executor.

use gym_proto::{Element, Triple};

/// A triple pattern of the basic graph pattern.
pub type TriplePattern = Triple;

/// Default prefix of vertical-partitioning table names.
pub const DEFAULT_TABLE_PREFIX: &str = "vp_";

/// Strip the leading `?` or `$` of a variable name.
pub fn strip_sigil(name: &str) -> &str {
    name.strip_prefix('?')
        .or_else(|| name.strip_prefix('$'))
        .unwrap_or(name)
}

/// Map a predicate to a name usable as a physical table name.
///
/// Angle brackets are removed, surrounding whitespace trimmed, and every run
/// of non-word characters collapsed into a single underscore.
pub fn physical_name(predicate: &str) -> String {
    let cleaned: String = predicate.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let mut out = String::with_capacity(cleaned.len());
    let mut in_run = false;
    for c in cleaned.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Physical table holding the rows of a predicate.
pub fn table_name(prefix: &str, predicate: &str) -> String {
    format!("{}{}", prefix, physical_name(predicate))
}

/// Check if two slots denote the same term.
///
/// Variables match by name without sigil, so `?s` and `$s` are one term.
/// Constants match by their full text.
pub fn same_term(a: &Element, b: &Element) -> bool {
    match (a.is_variable(), b.is_variable()) {
        (true, true) => strip_sigil(&a.name) == strip_sigil(&b.name),
        (false, false) => a.name == b.name,
        _ => false,
    }
}

fn endpoints(triple: &Triple) -> [&Element; 2] {
    [&triple.subject, &triple.object]
}

/// The first variable of `a` (subject before object) also used by `b`.
///
/// Names are compared without their sigil; both slots must be variables.
pub fn shared_variable(a: &Triple, b: &Triple) -> Option<String> {
    endpoints(a)
        .into_iter()
        .filter(|slot| slot.is_variable())
        .map(|slot| strip_sigil(&slot.name))
        .find(|name| {
            endpoints(b)
                .into_iter()
                .any(|other| other.is_variable() && strip_sigil(&other.name) == *name)
        })
        .map(str::to_string)
}

/// The first shared variable over every member pair of two payloads.
pub fn shared_variable_between(a: &[Triple], b: &[Triple]) -> Option<String> {
    a.iter()
        .flat_map(|x| b.iter().map(move |y| (x, y)))
        .find_map(|(x, y)| shared_variable(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(s: Element, p: &str, o: Element) -> Triple {
        Triple::new(s, Element::constant(p), o)
    }

    #[test]
    fn test_same_term() {
        assert!(same_term(&Element::variable("?s"), &Element::variable("$s")));
        assert!(same_term(&Element::constant(":a"), &Element::constant(":a")));
        assert!(!same_term(&Element::variable("?a"), &Element::constant("?a")));
        assert!(!same_term(&Element::variable("?a"), &Element::variable("?b")));
    }

    #[test]
    fn test_strip_sigil() {
        assert_eq!(strip_sigil("?x"), "x");
        assert_eq!(strip_sigil("$x"), "x");
        assert_eq!(strip_sigil("x"), "x");
    }

    #[test]
    fn test_physical_name() {
        assert_eq!(physical_name("<http://ex.org/knows>"), "http_ex_org_knows");
        assert_eq!(physical_name("  <http://ex.org/a-b>  "), "http_ex_org_a_b");
        assert_eq!(physical_name("ex:p_1"), "ex_p_1");
        assert_eq!(table_name("vp_", "<http://ex.org/p>"), "vp_http_ex_org_p");
    }

    #[test]
    fn test_shared_variable_prefers_subject() {
        let a = triple(Element::variable("?x"), ":p", Element::variable("?y"));
        let b = triple(Element::variable("?y"), ":q", Element::variable("?x"));
        assert_eq!(shared_variable(&a, &b), Some("x".to_string()));
        assert_eq!(shared_variable(&b, &a), Some("y".to_string()));
    }

    #[test]
    fn test_shared_variable_ignores_sigil_and_constants() {
        let a = triple(Element::variable("?x"), ":p", Element::constant("x"));
        let b = triple(Element::variable("$x"), ":q", Element::constant(":c"));
        assert_eq!(shared_variable(&a, &b), Some("x".to_string()));

        let c = triple(Element::constant("x"), ":r", Element::constant(":d"));
        assert_eq!(shared_variable(&a, &c), None);
    }

    #[test]
    fn test_shared_variable_between_groups() {
        let group = vec![
            triple(Element::variable("?s"), ":p1", Element::variable("?a")),
            triple(Element::variable("?s"), ":p2", Element::variable("?b")),
        ];
        let single = vec![triple(Element::variable("?b"), ":p3", Element::variable("?c"))];
        assert_eq!(shared_variable_between(&group, &single), Some("b".to_string()));
        assert_eq!(shared_variable_between(&single, &group), Some("b".to_string()));

        let unrelated = vec![triple(Element::variable("?z"), ":p4", Element::variable("?w"))];
        assert_eq!(shared_variable_between(&group, &unrelated), None);
    }
}
