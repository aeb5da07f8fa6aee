use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::term::Term;

/// One of the four positions of a quad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuadPosition {
    Subject,
    Predicate,
    Object,
    Graph,
}

impl QuadPosition {
    /// All positions in quad order.
    pub const ALL: [QuadPosition; 4] = [
        QuadPosition::Subject,
        QuadPosition::Predicate,
        QuadPosition::Object,
        QuadPosition::Graph,
    ];

    /// Zero-based offset of this position within a quad.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for QuadPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
            Self::Graph => "graph",
        };
        f.write_str(name)
    }
}

/// A fact: subject, predicate, object and graph, all bound.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Term,
}

impl Quad {
    /// Create a quad in a named (or default) graph.
    pub fn new(
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
        graph: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: graph.into(),
        }
    }

    /// Create a quad in the default graph.
    pub fn triple(
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Self {
        Self::new(subject, predicate, object, Term::DefaultGraph)
    }

    /// The term at the given position.
    pub fn term(&self, position: QuadPosition) -> &Term {
        match position {
            QuadPosition::Subject => &self.subject,
            QuadPosition::Predicate => &self.predicate,
            QuadPosition::Object => &self.object,
            QuadPosition::Graph => &self.graph,
        }
    }

    /// The four terms in quad order.
    pub fn terms(&self) -> [&Term; 4] {
        [&self.subject, &self.predicate, &self.object, &self.graph]
    }

    /// Check that this quad can be stored as a fact.
    ///
    /// Variables are never allowed, and literals may only appear in the
    /// object position.
    pub fn validate(&self) -> Result<(), TypeError> {
        for position in QuadPosition::ALL {
            let term = self.term(position);
            if term.is_variable() {
                return Err(TypeError::UnboundTerm(position));
            }
            if term.is_literal() && position != QuadPosition::Object {
                return Err(TypeError::LiteralNotAllowed(position));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quad({self})")
    }
}

/// N-Quads-like rendering; the graph is omitted for the default graph.
impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if self.graph != Term::DefaultGraph {
            write!(f, " {}", self.graph)?;
        }
        write!(f, " .")
    }
}
