//! Basic graph pattern input.
//!
//! The query front-end hands over a JSON document with the prefix mapping,
//! the projected variables and the triples of the single BGP:
//!
//! ```json
//! {
//!   "prefixes": { "ex": "http://example.org/" },
//!   "variables": ["s", "o2"],
//!   "triples": [["?s", "ex:p1", "?o1"], ["?o1", "ex:p2", "?o2"]]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use gym_proto::Element;
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::pattern::{strip_sigil, TriplePattern};

/// A parsed basic graph pattern with its projection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpQuery {
    /// Prefix name to namespace IRI.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
    /// Projected variables, with or without sigil.
    #[serde(default)]
    pub variables: Vec<String>,
    /// Triples as `[subject, predicate, object]` terms.
    pub triples: Vec<[String; 3]>,
}

impl BgpQuery {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), namespace.into());
        self
    }

    /// Add a projected variable.
    pub fn select(mut self, variable: impl Into<String>) -> Self {
        self.variables.push(variable.into());
        self
    }

    /// Add a triple.
    pub fn triple(
        mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        self.triples
            .push([subject.into(), predicate.into(), object.into()]);
        self
    }

    /// Parse a query document.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::Input(format!("malformed query: {}", e)))
    }

    /// Read and parse a query file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Input(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Projected variable names without sigil.
    pub fn projected_variables(&self) -> Vec<String> {
        self.variables
            .iter()
            .map(|v| strip_sigil(v).to_string())
            .collect()
    }

    /// Convert the triples into patterns, expanding declared prefixes.
    pub fn patterns(&self) -> Result<Vec<TriplePattern>, Error> {
        if self.triples.is_empty() {
            return Err(Error::Input("query has no triple patterns".to_string()));
        }

        self.triples
            .iter()
            .map(|[s, p, o]| {
                let predicate = self.element(p)?;
                if predicate.is_variable() {
                    return Err(Error::Input(format!(
                        "predicate '{}' must be bound",
                        p.trim()
                    )));
                }
                Ok(TriplePattern::new(
                    self.element(s)?,
                    predicate,
                    self.element(o)?,
                ))
            })
            .collect()
    }

    fn element(&self, term: &str) -> Result<Element, Error> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Error::Input("empty term in triple".to_string()));
        }
        if term.starts_with('?') || term.starts_with('$') {
            if term.len() == 1 {
                return Err(Error::Input(format!("variable '{}' has no name", term)));
            }
            return Ok(Element::variable(term));
        }
        Ok(Element::constant(self.expand(term)))
    }

    /// Expand `prefix:local` into a full IRI when the prefix is declared.
    fn expand(&self, term: &str) -> String {
        if term.starts_with('<') || term.starts_with('"') {
            return term.to_string();
        }
        match term.split_once(':') {
            Some((prefix, local)) => match self.prefixes.get(prefix) {
                Some(namespace) => format!("<{}{}>", namespace, local),
                None => term.to_string(),
            },
            None => term.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let query = BgpQuery::from_json(
            r#"{
                "prefixes": {"ex": "http://example.org/"},
                "variables": ["?s", "o2"],
                "triples": [["?s", "ex:p1", "?o1"], ["?o1", "ex:p2", "\"v\""]]
            }"#,
        )
        .unwrap();

        assert_eq!(query.projected_variables(), vec!["s", "o2"]);

        let patterns = query.patterns().unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].predicate.name, "<http://example.org/p1>");
        assert!(patterns[0].subject.is_variable());
        assert!(!patterns[1].object.is_variable());
        assert_eq!(patterns[1].object.name, "\"v\"");
    }

    #[test]
    fn test_unknown_prefix_kept() {
        let query = BgpQuery::new().triple("?s", "foaf:name", "?n");
        let patterns = query.patterns().unwrap();
        assert_eq!(patterns[0].predicate.name, "foaf:name");
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(matches!(
            BgpQuery::from_json("{not json"),
            Err(Error::Input(_))
        ));
        assert!(matches!(BgpQuery::new().patterns(), Err(Error::Input(_))));
        assert!(matches!(
            BgpQuery::new().triple("?s", "?p", "?o").patterns(),
            Err(Error::Input(_))
        ));
    }
}
