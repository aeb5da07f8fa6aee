use quadstream_types::{Quad, QuadPattern};

use crate::error::StoreResult;

/// Point-in-time fact storage.
///
/// All implementations must satisfy these invariants:
/// - Set semantics: a quad is stored at most once.
/// - `match_pattern` returns a finite, already-determined result; quads
///   inserted afterwards never show up in a result that was already returned.
/// - Results are returned in insertion order.
/// - All backend errors are propagated, never silently ignored.
pub trait QuadStore: Send + Sync {
    /// Snapshot of all stored quads matching `pattern`.
    fn match_pattern(&self, pattern: &QuadPattern) -> StoreResult<Vec<Quad>>;

    /// Number of stored quads matching `pattern`.
    ///
    /// For a fully bound pattern this is an existence check and must be O(1).
    fn count_matching(&self, pattern: &QuadPattern) -> StoreResult<usize>;

    /// Store a quad. Returns `false` if it was already present (no-op).
    fn insert(&self, quad: &Quad) -> StoreResult<bool>;

    /// Number of stored quads.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store several quads and return how many were new.
    ///
    /// Default implementation calls `insert()` for each quad. Backends may
    /// override for better performance.
    fn insert_batch(&self, quads: &[Quad]) -> StoreResult<usize> {
        let mut inserted = 0;
        for quad in quads {
            if self.insert(quad)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}
