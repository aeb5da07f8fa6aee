//! Fact data model for quadstream.
//!
//! Every other quadstream crate depends on `quadstream-types`.
//!
//! # Key Types
//!
//! - [`Term`] — a node, literal, variable or the default graph
//! - [`Quad`] — a fully bound fact (subject, predicate, object, graph)
//! - [`QuadPattern`] — four optionally bound positions used for lookups
//! - [`QuadPosition`] — names one of the four positions

pub mod error;
pub mod pattern;
pub mod quad;
pub mod term;

pub use error::TypeError;
pub use pattern::QuadPattern;
pub use quad::{Quad, QuadPosition};
pub use term::Term;
