use thiserror::Error;

use crate::quad::QuadPosition;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("{0} position holds a variable; facts must be fully bound")]
    UnboundTerm(QuadPosition),

    #[error("literal not allowed in {0} position")]
    LiteralNotAllowed(QuadPosition),
}
