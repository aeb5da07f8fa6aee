use serde::{Deserialize, Serialize};

use crate::quad::{Quad, QuadPosition};
use crate::term::Term;

/// A quad pattern: each position is either bound to a term or a wildcard.
///
/// Variables are normalised to wildcards on construction, so a pattern built
/// from `?s <p> ?o ?g` behaves exactly like one built from `_ <p> _ _`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuadPattern {
    slots: [Option<Term>; 4],
}

impl QuadPattern {
    /// Create a pattern from four optionally bound positions.
    pub fn new(
        subject: Option<Term>,
        predicate: Option<Term>,
        object: Option<Term>,
        graph: Option<Term>,
    ) -> Self {
        Self {
            slots: [subject, predicate, object, graph].map(|slot| slot.filter(|t| !t.is_variable())),
        }
    }

    /// The all-wildcard pattern, matching every quad.
    pub fn any() -> Self {
        Self::default()
    }

    /// The fully bound pattern matching exactly `quad`.
    pub fn exact(quad: &Quad) -> Self {
        Self::new(
            Some(quad.subject.clone()),
            Some(quad.predicate.clone()),
            Some(quad.object.clone()),
            Some(quad.graph.clone()),
        )
    }

    /// Bind one position, replacing whatever was there.
    pub fn with(mut self, position: QuadPosition, term: impl Into<Term>) -> Self {
        let term = term.into();
        self.slots[position.index()] = (!term.is_variable()).then_some(term);
        self
    }

    pub fn with_subject(self, term: impl Into<Term>) -> Self {
        self.with(QuadPosition::Subject, term)
    }

    pub fn with_predicate(self, term: impl Into<Term>) -> Self {
        self.with(QuadPosition::Predicate, term)
    }

    pub fn with_object(self, term: impl Into<Term>) -> Self {
        self.with(QuadPosition::Object, term)
    }

    pub fn with_graph(self, term: impl Into<Term>) -> Self {
        self.with(QuadPosition::Graph, term)
    }

    /// The bound term at `position`, or `None` for a wildcard.
    pub fn bound(&self, position: QuadPosition) -> Option<&Term> {
        self.slots[position.index()].as_ref()
    }

    /// Number of bound positions.
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns `true` when all four positions are bound.
    pub fn is_fully_bound(&self) -> bool {
        self.bound_count() == 4
    }

    /// The quad this pattern denotes, if every position is bound.
    pub fn to_quad(&self) -> Option<Quad> {
        let [Some(s), Some(p), Some(o), Some(g)] = &self.slots else {
            return None;
        };
        Some(Quad::new(s.clone(), p.clone(), o.clone(), g.clone()))
    }

    /// Returns `true` if every bound position equals the quad's term there.
    pub fn matches(&self, quad: &Quad) -> bool {
        QuadPosition::ALL.iter().all(|&position| match self.bound(position) {
            Some(term) => term == quad.term(position),
            None => true,
        })
    }
}

impl From<&Quad> for QuadPattern {
    fn from(quad: &Quad) -> Self {
        Self::exact(quad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn any_matches_everything() {
        let p = QuadPattern::any();
        assert_eq!(p.bound_count(), 0);
        assert!(p.matches(&Quad::triple("s", "p", "o")));
        assert!(p.matches(&Quad::new("a", "b", Term::literal("c"), "g")));
    }

    #[test]
    fn variables_become_wildcards() {
        let p = QuadPattern::new(
            Some(Term::variable("s")),
            Some(Term::named("p")),
            None,
            Some(Term::variable("g")),
        );
        assert_eq!(p, QuadPattern::any().with_predicate("p"));
        assert_eq!(
            QuadPattern::any().with_subject(Term::variable("x")),
            QuadPattern::any()
        );
    }

    #[test]
    fn exact_is_fully_bound() {
        let q = Quad::new("s", "p", "o", "g");
        let p = QuadPattern::exact(&q);
        assert!(p.is_fully_bound());
        assert!(p.matches(&q));
        assert!(!p.matches(&Quad::triple("s", "p", "o")));
        assert_eq!(p.to_quad(), Some(q));
        assert_eq!(QuadPattern::any().with_subject("s").to_quad(), None);
    }

    #[test]
    fn bound_graph_filters_default_graph() {
        let p = QuadPattern::any().with_graph("g");
        assert!(!p.matches(&Quad::triple("s", "p", "o")));
        assert!(p.matches(&Quad::new("s", "p", "o", "g")));

        let default_only = QuadPattern::any().with_graph(Term::DefaultGraph);
        assert!(default_only.matches(&Quad::triple("s", "p", "o")));
    }

    fn small_term() -> impl Strategy<Value = Term> {
        prop_oneof![Just("a"), Just("b"), Just("c")].prop_map(Term::named)
    }

    fn small_quad() -> impl Strategy<Value = Quad> {
        (small_term(), small_term(), small_term(), small_term())
            .prop_map(|(s, p, o, g)| Quad::new(s, p, o, g))
    }

    proptest! {
        #[test]
        fn match_agrees_with_bound_positions(source in small_quad(), target in small_quad(), mask in 0u8..16) {
            let mut pattern = QuadPattern::any();
            for position in QuadPosition::ALL {
                if mask & (1 << position.index()) != 0 {
                    pattern = pattern.with(position, source.term(position).clone());
                }
            }
            let expected = QuadPosition::ALL.iter().all(|&position| {
                mask & (1 << position.index()) == 0 || source.term(position) == target.term(position)
            });
            prop_assert_eq!(pattern.matches(&target), expected);
            prop_assert!(pattern.matches(&source));
        }
    }
}
