use std::collections::HashSet;
use std::sync::RwLock;

use quadstream_types::{Quad, QuadPattern};
use tracing::trace;

use crate::error::StoreResult;
use crate::traits::QuadStore;

/// In-memory quad store.
///
/// Intended for tests and embedding. Quads are kept in insertion order next to
/// a hash set used for O(1) existence checks, behind a `RwLock` for safe
/// concurrent access.
pub struct InMemoryQuadStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    quads: Vec<Quad>,
    present: HashSet<Quad>,
}

impl InMemoryQuadStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryState::default()),
        }
    }

    /// Create a store pre-populated with `quads` (duplicates are collapsed).
    pub fn from_quads(quads: &[Quad]) -> StoreResult<Self> {
        let store = Self::new();
        store.insert_batch(quads)?;
        Ok(store)
    }

    /// Returns `true` if exactly this quad is stored.
    pub fn contains(&self, quad: &Quad) -> bool {
        self.inner
            .read()
            .expect("lock poisoned")
            .present
            .contains(quad)
    }

    /// All stored quads in insertion order.
    pub fn quads(&self) -> Vec<Quad> {
        self.inner.read().expect("lock poisoned").quads.clone()
    }
}

impl Default for InMemoryQuadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadStore for InMemoryQuadStore {
    fn match_pattern(&self, pattern: &QuadPattern) -> StoreResult<Vec<Quad>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state
            .quads
            .iter()
            .filter(|quad| pattern.matches(quad))
            .cloned()
            .collect())
    }

    fn count_matching(&self, pattern: &QuadPattern) -> StoreResult<usize> {
        let state = self.inner.read().expect("lock poisoned");
        if let Some(probe) = pattern.to_quad() {
            return Ok(usize::from(state.present.contains(&probe)));
        }
        Ok(state.quads.iter().filter(|quad| pattern.matches(quad)).count())
    }

    fn insert(&self, quad: &Quad) -> StoreResult<bool> {
        quad.validate()?;
        let mut state = self.inner.write().expect("lock poisoned");
        if !state.present.insert(quad.clone()) {
            return Ok(false);
        }
        state.quads.push(quad.clone());
        trace!(%quad, "quad stored");
        Ok(true)
    }

    fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").quads.len()
    }
}

impl std::fmt::Debug for InMemoryQuadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryQuadStore")
            .field("quad_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use proptest::prelude::*;
    use quadstream_types::{QuadPosition, Term, TypeError};

    fn q(s: &str, p: &str, o: &str) -> Quad {
        Quad::triple(s, p, o)
    }

    // -----------------------------------------------------------------------
    // Insert / existence
    // -----------------------------------------------------------------------

    #[test]
    fn insert_and_contains() {
        let store = InMemoryQuadStore::new();
        assert!(store.insert(&q("s1", "p1", "o1")).unwrap());
        assert!(store.contains(&q("s1", "p1", "o1")));
        assert!(!store.contains(&q("s2", "p2", "o2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn insert_is_idempotent() {
        let store = InMemoryQuadStore::new();
        assert!(store.insert(&q("s", "p", "o")).unwrap());
        assert!(!store.insert(&q("s", "p", "o")).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn insert_rejects_variables() {
        let store = InMemoryQuadStore::new();
        let err = store
            .insert(&Quad::triple(Term::variable("s"), "p", "o"))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidQuad(TypeError::UnboundTerm(QuadPosition::Subject))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn insert_batch_counts_new_quads() {
        let store = InMemoryQuadStore::new();
        let quads = vec![q("a", "p", "o"), q("b", "p", "o"), q("a", "p", "o")];
        assert_eq!(store.insert_batch(&quads).unwrap(), 2);
        assert_eq!(store.insert_batch(&quads).unwrap(), 0);
    }

    #[test]
    fn count_exact_is_existence_check() {
        let store = InMemoryQuadStore::from_quads(&[q("s", "p", "o")]).unwrap();
        assert_eq!(store.count_matching(&QuadPattern::exact(&q("s", "p", "o"))).unwrap(), 1);
        assert_eq!(store.count_matching(&QuadPattern::exact(&q("s", "p", "x"))).unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Pattern matching
    // -----------------------------------------------------------------------

    #[test]
    fn match_preserves_insertion_order() {
        let quads = vec![q("c", "p", "o"), q("a", "p", "o"), q("b", "p", "o")];
        let store = InMemoryQuadStore::from_quads(&quads).unwrap();
        assert_eq!(store.match_pattern(&QuadPattern::any()).unwrap(), quads);
        assert_eq!(store.quads(), quads);
    }

    #[test]
    fn match_filters_on_bound_positions() {
        let store = InMemoryQuadStore::from_quads(&[
            q("s", "p1", "o1"),
            q("s", "p", "o2"),
            q("s3", "p", "o"),
            Quad::new("s4", "p4", "o", "g"),
        ])
        .unwrap();

        let by_subject = store.match_pattern(&QuadPattern::any().with_subject("s")).unwrap();
        assert_eq!(by_subject, vec![q("s", "p1", "o1"), q("s", "p", "o2")]);

        let by_object = QuadPattern::any().with_object("o");
        assert_eq!(store.count_matching(&by_object).unwrap(), 2);

        let by_graph = store.match_pattern(&QuadPattern::any().with_graph("g")).unwrap();
        assert_eq!(by_graph, vec![Quad::new("s4", "p4", "o", "g")]);
    }

    #[test]
    fn snapshot_is_point_in_time() {
        let store = InMemoryQuadStore::new();
        store.insert(&q("s1", "p", "o")).unwrap();
        let snapshot = store.match_pattern(&QuadPattern::any()).unwrap();
        store.insert(&q("s2", "p", "o")).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn debug_shows_count() {
        let store = InMemoryQuadStore::from_quads(&[q("s", "p", "o")]).unwrap();
        assert_eq!(format!("{store:?}"), "InMemoryQuadStore { quad_count: 1 }");
    }

    proptest! {
        #[test]
        fn set_semantics_under_duplicates(picks in proptest::collection::vec(0usize..5, 0..40)) {
            let store = InMemoryQuadStore::new();
            for i in &picks {
                store.insert(&q(&format!("s{i}"), "p", "o")).unwrap();
            }
            let distinct: HashSet<usize> = picks.iter().copied().collect();
            prop_assert_eq!(store.len(), distinct.len());
            prop_assert_eq!(store.count_matching(&QuadPattern::any()).unwrap(), distinct.len());
        }
    }
}
