//! Backing fact storage for quadstream.
//!
//! A backing store holds facts (quads) and answers point-in-time questions
//! about them. It knows nothing about live readers; that concern belongs to
//! `quadstream-live`, which owns exactly one store and is the only writer.
//!
//! # Storage Backends
//!
//! All backends implement the [`QuadStore`] trait:
//!
//! - [`InMemoryQuadStore`] -- insertion-ordered, hash-indexed store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Set semantics: storing a quad twice is a no-op.
//! 2. Pattern matches are snapshots, never live.
//! 3. Existence checks on fully bound patterns are O(1).
//! 4. All backend errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryQuadStore;
pub use traits::QuadStore;
