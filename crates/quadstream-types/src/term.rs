use std::fmt;

use serde::{Deserialize, Serialize};

/// A single RDF-style term occupying one position of a [`Quad`](crate::Quad).
///
/// Terms are compared structurally. The [`canonical`](Term::canonical) string
/// is for display only: distinct terms can render the same way (an IRI
/// spelled `_:x` and the blank node `x`, say), so lookups key on the term
/// itself.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// An IRI-identified node.
    NamedNode(String),
    /// A blank node, identified by a store-local label.
    BlankNode(String),
    /// A literal value with an optional language tag or datatype IRI.
    Literal {
        value: String,
        language: Option<String>,
        datatype: Option<String>,
    },
    /// A query variable. Only meaningful inside patterns, where it acts as a
    /// wildcard.
    Variable(String),
    /// The default graph.
    DefaultGraph,
}

impl Term {
    /// Create a named node.
    pub fn named(iri: impl Into<String>) -> Self {
        Self::NamedNode(iri.into())
    }

    /// Create a blank node.
    pub fn blank(label: impl Into<String>) -> Self {
        Self::BlankNode(label.into())
    }

    /// Create a plain literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// Create a language-tagged literal.
    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    /// Create a datatyped literal.
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }

    /// Create a variable.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Returns `true` for [`Term::Variable`].
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Returns `true` for [`Term::Literal`].
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    /// Canonical string form of this term.
    ///
    /// - named node: the IRI itself
    /// - blank node: `_:label`
    /// - literal: `"value"`, `"value"@lang` or `"value"^^datatype`
    /// - variable: `?name`
    /// - default graph: the empty string
    pub fn canonical(&self) -> String {
        match self {
            Self::NamedNode(iri) => iri.clone(),
            Self::BlankNode(label) => format!("_:{label}"),
            Self::Literal {
                value,
                language,
                datatype,
            } => match (language, datatype) {
                (Some(lang), _) => format!("\"{value}\"@{lang}"),
                (None, Some(dt)) => format!("\"{value}\"^^{dt}"),
                (None, None) => format!("\"{value}\""),
            },
            Self::Variable(name) => format!("?{name}"),
            Self::DefaultGraph => String::new(),
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultGraph => write!(f, "Term(default graph)"),
            other => write!(f, "Term({})", other.canonical()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(iri) => write!(f, "<{iri}>"),
            other => write!(f, "{}", other.canonical()),
        }
    }
}

impl From<&str> for Term {
    fn from(iri: &str) -> Self {
        Self::named(iri)
    }
}

impl From<String> for Term {
    fn from(iri: String) -> Self {
        Self::NamedNode(iri)
    }
}
