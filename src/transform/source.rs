//! Field access over RDF query solutions.
//!
//! The assembler never cares where a solution came from. Anything that can
//! answer `get(name)` with a URI, literal, or boolean is a usable source: a
//! plain map in tests, or a row of SPARQL JSON results from the endpoint.

use std::collections::HashMap;

use serde::Deserialize;

/// XSD boolean datatype IRI used by SPARQL endpoints for typed literals.
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// A single bound value in a query solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// An IRI.
    Uri(String),
    /// A plain or typed literal rendered as text.
    Literal(String),
    /// An `xsd:boolean` literal.
    Boolean(bool),
}

impl FieldValue {
    /// Convenience constructor for literals.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Convenience constructor for IRIs.
    #[must_use]
    pub fn uri(value: impl Into<String>) -> Self {
        Self::Uri(value.into())
    }

    /// Returns the lexical form for URIs and literals.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Uri(value) | Self::Literal(value) => Some(value),
            Self::Boolean(_) => None,
        }
    }

    /// Interprets the value as a boolean, accepting `"true"`/`"1"` literals.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            Self::Literal(value) => match value.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Self::Uri(_) => None,
        }
    }
}

/// Capability interface for anything that looks like a query solution.
pub trait FieldSource {
    /// Looks up a bound variable by name.
    fn get(&self, name: &str) -> Option<FieldValue>;
}

impl<S: std::hash::BuildHasher> FieldSource for HashMap<String, FieldValue, S> {
    fn get(&self, name: &str) -> Option<FieldValue> {
        HashMap::get(self, name).cloned()
    }
}

/// SPARQL 1.1 query results in JSON form.
#[derive(Debug, Clone, Deserialize)]
pub struct SparqlResults {
    /// The `results` member.
    pub results: SparqlBindings,
}

/// The `results.bindings` array.
#[derive(Debug, Clone, Deserialize)]
pub struct SparqlBindings {
    /// One entry per solution.
    pub bindings: Vec<SparqlBinding>,
}

/// One solution row: variable name to bound term.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SparqlBinding(pub HashMap<String, SparqlTerm>);

/// A bound RDF term as serialized by the SPARQL JSON results format.
#[derive(Debug, Clone, Deserialize)]
pub struct SparqlTerm {
    /// `uri`, `literal`, `typed-literal`, or `bnode`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Lexical value.
    pub value: String,
    /// Datatype IRI for typed literals.
    #[serde(default)]
    pub datatype: Option<String>,
}

impl FieldSource for SparqlBinding {
    fn get(&self, name: &str) -> Option<FieldValue> {
        let term = self.0.get(name)?;
        let value = match term.kind.as_str() {
            "uri" => FieldValue::Uri(term.value.clone()),
            _ if term.datatype.as_deref() == Some(XSD_BOOLEAN) => {
                FieldValue::Boolean(matches!(term.value.trim(), "true" | "1"))
            }
            _ => FieldValue::Literal(term.value.clone()),
        };
        Some(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_is_a_field_source() {
        let mut map = HashMap::new();
        map.insert("title".to_string(), FieldValue::literal("A title"));
        assert_eq!(
            FieldSource::get(&map, "title"),
            Some(FieldValue::literal("A title"))
        );
        assert_eq!(FieldSource::get(&map, "missing"), None);
    }

    #[test]
    fn test_field_value_as_bool() {
        assert_eq!(FieldValue::Boolean(true).as_bool(), Some(true));
        assert_eq!(FieldValue::literal("false").as_bool(), Some(false));
        assert_eq!(FieldValue::literal("maybe").as_bool(), None);
        assert_eq!(FieldValue::uri("http://x").as_bool(), None);
    }

    #[test]
    fn test_sparql_results_deserialize_into_field_values() {
        let json = r#"{
            "head": {"vars": ["output", "title", "peerReviewed"]},
            "results": {"bindings": [{
                "output": {"type": "uri", "value": "http://r4d.dfid.gov.uk/Output/5050/Default.aspx"},
                "title": {"type": "literal", "value": "A title"},
                "peerReviewed": {"type": "typed-literal", "datatype": "http://www.w3.org/2001/XMLSchema#boolean", "value": "true"}
            }]}
        }"#;
        let results: SparqlResults = serde_json::from_str(json).unwrap();
        let binding = &results.results.bindings[0];

        assert_eq!(
            binding.get("output"),
            Some(FieldValue::uri("http://r4d.dfid.gov.uk/Output/5050/Default.aspx"))
        );
        assert_eq!(binding.get("title"), Some(FieldValue::literal("A title")));
        assert_eq!(binding.get("peerReviewed"), Some(FieldValue::Boolean(true)));
        assert_eq!(binding.get("abstract"), None);
    }
}
