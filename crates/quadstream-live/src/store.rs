use std::convert::Infallible;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::{FutureExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use quadstream_store::{InMemoryQuadStore, QuadStore, StoreResult};
use quadstream_types::{Quad, QuadPattern};

use crate::channel::{ChannelId, ChannelState, LiveChannel};
use crate::config::LiveConfig;
use crate::error::{LiveError, LiveResult, SourceError};
use crate::import::{ImportHandle, ImportSummary};
use crate::index::{PatternIndex, PatternKey};
use crate::stream::{ChannelHost, MatchStream};

/// Lifecycle of a [`StreamingStore`]. `Open -> Ended`, never back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreLifecycle {
    Open,
    Ended,
}

struct LiveState {
    lifecycle: StoreLifecycle,
    index: PatternIndex,
}

/// Outcome of routing one fact.
enum Ingest {
    Inserted { delivered: usize },
    Duplicate,
    Discarded,
}

struct Shared<S> {
    store: S,
    config: LiveConfig,
    state: Mutex<LiveState>,
}

impl<S> Shared<S> {
    fn state(&self) -> MutexGuard<'_, LiveState> {
        self.state.lock().expect("live state lock poisoned")
    }
}

impl<S: QuadStore> Shared<S> {
    /// Existence check, insert and live routing of one fact.
    ///
    /// Runs under the state lock, so no read can take its snapshot or become
    /// initialized halfway through: every initialized read either already
    /// saw the fact in its snapshot or receives it here, never both.
    fn ingest(&self, quad: &Quad) -> LiveResult<Ingest> {
        let mut state = self.state();
        if self.store.count_matching(&QuadPattern::exact(quad))? > 0 {
            return Ok(Ingest::Duplicate);
        }
        if state.lifecycle == StoreLifecycle::Ended {
            return Ok(Ingest::Discarded);
        }
        self.store.insert(quad)?;

        let threshold = self.config.backlog_warn_threshold;
        let mut delivered = 0;
        for id in state.index.lookup(quad) {
            let Some(channel) = state.index.channel_mut(id) else {
                continue;
            };
            if channel.push(quad, threshold) {
                channel.notify(quad);
                delivered += 1;
            }
        }
        if delivered > 0 {
            trace!(%quad, delivered, "fact forwarded to live reads");
        }
        Ok(Ingest::Inserted { delivered })
    }
}

impl<S: QuadStore> ChannelHost for Shared<S> {
    fn snapshot(&self, pattern: &QuadPattern) -> StoreResult<Vec<Quad>> {
        self.store.match_pattern(pattern)
    }

    fn initialize(&self, id: ChannelId, pattern: &QuadPattern) -> StoreResult<Vec<Quad>> {
        let mut state = self.state();
        let snapshot = self.store.match_pattern(pattern)?;
        if let Some(channel) = state.index.channel_mut(id) {
            if channel.initialize() {
                debug!(channel = %id, snapshot = snapshot.len(), "live read initialized");
            }
        }
        Ok(snapshot)
    }

    fn subscribe_new_facts(&self, id: ChannelId) -> Option<mpsc::UnboundedReceiver<Quad>> {
        self.state()
            .index
            .channel_mut(id)
            .map(LiveChannel::subscribe_new_facts)
    }

    fn close_channel(&self, id: ChannelId) {
        // Called from `Drop`; never panic on a poisoned lock here.
        if let Ok(mut state) = self.state.lock() {
            if let Some(channel) = state.index.channel_mut(id) {
                channel.close();
            }
        }
    }

    fn channel_state(&self, id: ChannelId) -> ChannelState {
        self.state()
            .index
            .channel(id)
            .map(LiveChannel::state)
            .unwrap_or(ChannelState::Closed)
    }
}

/// A fact store that can be read while it is still being written.
///
/// Reads ([`read`](Self::read)) stay open and keep receiving matching facts
/// from later imports until [`finalize`](Self::finalize) is called. After
/// that the store is immutable: reads return plain snapshots and imports are
/// rejected.
///
/// `finalize` MUST be called at some point, otherwise every live read stays
/// pending forever.
///
/// The handle is cheap to clone; clones share the same store.
pub struct StreamingStore<S: QuadStore = InMemoryQuadStore> {
    shared: Arc<Shared<S>>,
}

impl<S: QuadStore> Clone for StreamingStore<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for StreamingStore<InMemoryQuadStore> {
    fn default() -> Self {
        Self::new(InMemoryQuadStore::new())
    }
}

impl<S: QuadStore + 'static> StreamingStore<S> {
    /// Wrap `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, LiveConfig::default())
    }

    pub fn with_config(store: S, config: LiveConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                config,
                state: Mutex::new(LiveState {
                    lifecycle: StoreLifecycle::Open,
                    index: PatternIndex::new(),
                }),
            }),
        }
    }

    /// Read every fact matching `pattern`, including ones imported later.
    ///
    /// On an open store the read is registered for live delivery right away,
    /// but its snapshot is only taken when the returned stream is first
    /// polled; live forwarding starts at that same moment.
    pub fn read(&self, pattern: QuadPattern) -> MatchStream {
        let host: Arc<dyn ChannelHost> = self.shared.clone();
        let mut state = self.shared.state();
        if state.lifecycle == StoreLifecycle::Ended {
            return MatchStream::snapshot_only(host, pattern);
        }
        let (channel, receiver) = LiveChannel::new();
        let id = state.index.register(channel, &pattern);
        drop(state);
        debug!(channel = %id, key = %PatternKey::for_pattern(&pattern), "live read registered");
        MatchStream::live(host, pattern, id, receiver)
    }

    /// Start importing `input`.
    ///
    /// Fails right away with [`LiveError::Finalized`] on a finalized store,
    /// leaving the backing store untouched. Otherwise returns a future that
    /// pulls the input one fact at a time; for each fact not yet stored it
    /// inserts it and forwards it to every initialized live read that
    /// matches.
    ///
    /// An input error ends the import with [`LiveError::Upstream`]; facts
    /// pulled before it stay stored. Facts that arrive after the store was
    /// finalized mid-import are counted as discarded, not reported as errors.
    pub fn import<St, E>(&self, input: St) -> LiveResult<ImportHandle>
    where
        St: Stream<Item = Result<Quad, E>> + Send + 'static,
        E: Into<SourceError> + Send + 'static,
    {
        if self.is_finalized() {
            warn!("import rejected: store is finalized");
            return Err(LiveError::Finalized);
        }
        debug!(live_channels = self.live_channels(), "import started");
        let shared = Arc::clone(&self.shared);
        Ok(ImportHandle::new(pump(shared, input).boxed()))
    }

    /// [`import`](Self::import) and wait for completion.
    pub async fn write<St, E>(&self, input: St) -> LiveResult<ImportSummary>
    where
        St: Stream<Item = Result<Quad, E>> + Send + 'static,
        E: Into<SourceError> + Send + 'static,
    {
        self.import(input)?.await
    }

    /// Import facts that are already in memory.
    pub async fn write_all<I>(&self, quads: I) -> LiveResult<ImportSummary>
    where
        I: IntoIterator<Item = Quad>,
        I::IntoIter: Send + 'static,
    {
        self.write(futures::stream::iter(quads.into_iter().map(Ok::<_, Infallible>)))
            .await
    }

    /// Mark the store as ended and close every live read.
    ///
    /// Afterwards reads are snapshot-only and imports fail. Calling it again
    /// re-broadcasts closure, which is harmless.
    pub fn finalize(&self) {
        let mut state = self.shared.state();
        if state.lifecycle == StoreLifecycle::Ended {
            debug!("store already finalized");
        }
        state.lifecycle = StoreLifecycle::Ended;
        let channels = state.index.len();
        for channel in state.index.channels_mut() {
            channel.close();
        }
        state.index.clear();
        info!(channels, stored = self.shared.store.len(), "store finalized");
    }

    pub fn lifecycle(&self) -> StoreLifecycle {
        self.shared.state().lifecycle
    }

    pub fn is_finalized(&self) -> bool {
        self.lifecycle() == StoreLifecycle::Ended
    }

    /// Number of live reads registered and not yet released by finalize.
    pub fn live_channels(&self) -> usize {
        self.shared.state().index.len()
    }

    /// The backing store, for out-of-band inspection. No synchronisation
    /// with in-flight imports is implied.
    pub fn snapshot_handle(&self) -> &S {
        &self.shared.store
    }

    pub fn config(&self) -> &LiveConfig {
        &self.shared.config
    }
}

async fn pump<S, St, E>(shared: Arc<Shared<S>>, input: St) -> LiveResult<ImportSummary>
where
    S: QuadStore,
    St: Stream<Item = Result<Quad, E>>,
    E: Into<SourceError>,
{
    let mut input = std::pin::pin!(input);
    let mut summary = ImportSummary::default();
    let yield_every = shared.config.yield_every;

    while let Some(item) = input.next().await {
        let quad = match item {
            Ok(quad) => quad,
            Err(err) => {
                let err: SourceError = err.into();
                warn!(error = %err, processed = summary.processed(), "import source failed");
                return Err(LiveError::Upstream(err));
            }
        };
        match shared.ingest(&quad)? {
            Ingest::Inserted { delivered } => {
                summary.inserted += 1;
                summary.delivered += delivered;
            }
            Ingest::Duplicate => summary.duplicates += 1,
            Ingest::Discarded => summary.discarded += 1,
        }
        if yield_every > 0 && summary.processed() % yield_every == 0 {
            tokio::task::yield_now().await;
        }
    }

    if summary.discarded > 0 {
        warn!(
            discarded = summary.discarded,
            "facts arrived after finalize and were not stored"
        );
    }
    debug!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        discarded = summary.discarded,
        delivered = summary.delivered,
        "import finished"
    );
    Ok(summary)
}

impl<S: QuadStore> fmt::Debug for StreamingStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state();
        f.debug_struct("StreamingStore")
            .field("lifecycle", &state.lifecycle)
            .field("live_channels", &state.index.len())
            .field("stored", &self.shared.store.len())
            .finish()
    }
}
