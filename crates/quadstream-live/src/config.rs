use serde::{Deserialize, Serialize};

/// Configuration for a [`StreamingStore`](crate::StreamingStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Unconsumed live facts on one reader before a warning is logged.
    /// `0` disables the warning. Facts are never dropped either way.
    pub backlog_warn_threshold: usize,
    /// Yield to the scheduler after this many facts of one import, letting
    /// readers run in between. `0` never yields beyond the input's own
    /// suspension points.
    pub yield_every: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            backlog_warn_threshold: 10_000,
            yield_every: 0,
        }
    }
}
