use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::LiveResult;

/// Outcome counts of one completed import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Facts newly stored.
    pub inserted: usize,
    /// Facts skipped because the store already held them.
    pub duplicates: usize,
    /// Facts that arrived after finalization and were not stored.
    pub discarded: usize,
    /// Live deliveries made, summed over all reads.
    pub delivered: usize,
}

impl ImportSummary {
    /// Total facts pulled from the input.
    pub fn processed(&self) -> usize {
        self.inserted + self.duplicates + self.discarded
    }
}

/// Completion signal of an import started with
/// [`StreamingStore::import`](crate::StreamingStore::import).
///
/// Nothing is pulled from the input until this future is polled. It is
/// `Send + 'static`, so it can be handed to `tokio::spawn`.
#[must_use = "an import does nothing unless awaited or spawned"]
pub struct ImportHandle {
    inner: BoxFuture<'static, LiveResult<ImportSummary>>,
}

impl ImportHandle {
    pub(crate) fn new(inner: BoxFuture<'static, LiveResult<ImportSummary>>) -> Self {
        Self { inner }
    }
}

impl Future for ImportHandle {
    type Output = LiveResult<ImportSummary>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for ImportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportHandle").finish_non_exhaustive()
    }
}
