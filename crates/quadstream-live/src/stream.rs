use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use quadstream_store::StoreResult;
use quadstream_types::{Quad, QuadPattern};

use crate::channel::{ChannelId, ChannelReceiver, ChannelState};
use crate::error::LiveResult;

/// What a [`MatchStream`] needs from the store that created it.
pub(crate) trait ChannelHost: Send + Sync {
    /// Point-in-time snapshot, for reads that have no live channel.
    fn snapshot(&self, pattern: &QuadPattern) -> StoreResult<Vec<Quad>>;

    /// Take the snapshot and mark the channel `Initialized`, as one step
    /// with respect to concurrent imports.
    fn initialize(&self, id: ChannelId, pattern: &QuadPattern) -> StoreResult<Vec<Quad>>;

    /// Add a "new fact" subscriber; `None` once the channel is released.
    fn subscribe_new_facts(&self, id: ChannelId) -> Option<mpsc::UnboundedReceiver<Quad>>;

    fn close_channel(&self, id: ChannelId);

    fn channel_state(&self, id: ChannelId) -> ChannelState;
}

struct LiveHalf {
    id: ChannelId,
    receiver: ChannelReceiver,
}

enum Phase {
    /// Nothing pulled yet; the snapshot has not been taken.
    Pending,
    Snapshot(std::vec::IntoIter<Quad>),
    Live,
    Done,
}

/// Result of [`StreamingStore::read`](crate::StreamingStore::read).
///
/// Yields the backing store's snapshot for the pattern (in backing order),
/// then every matching fact imported afterwards (in arrival order), and ends
/// only when the store is finalized. A read on a finalized store yields just
/// the snapshot.
///
/// The snapshot is taken on the first poll, not when the stream is created.
/// Dropping the stream closes its channel.
pub struct MatchStream {
    host: Arc<dyn ChannelHost>,
    pattern: QuadPattern,
    live: Option<LiveHalf>,
    phase: Phase,
}

impl MatchStream {
    pub(crate) fn live(
        host: Arc<dyn ChannelHost>,
        pattern: QuadPattern,
        id: ChannelId,
        receiver: ChannelReceiver,
    ) -> Self {
        Self {
            host,
            pattern,
            live: Some(LiveHalf { id, receiver }),
            phase: Phase::Pending,
        }
    }

    pub(crate) fn snapshot_only(host: Arc<dyn ChannelHost>, pattern: QuadPattern) -> Self {
        Self {
            host,
            pattern,
            live: None,
            phase: Phase::Pending,
        }
    }

    pub fn pattern(&self) -> &QuadPattern {
        &self.pattern
    }

    /// Returns `true` if this read was registered for live delivery.
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// State of the underlying channel; `None` for snapshot-only reads.
    pub fn channel_state(&self) -> Option<ChannelState> {
        self.live
            .as_ref()
            .map(|live| self.host.channel_state(live.id))
    }

    /// Stream of facts that arrive live on this read, excluding snapshot
    /// facts. Only facts delivered after this call are reported. Any number
    /// of these may be open at once; each sees every notification.
    pub fn new_facts(&self) -> NewFacts {
        let rx = self
            .live
            .as_ref()
            .and_then(|live| self.host.subscribe_new_facts(live.id));
        NewFacts { rx }
    }

    /// Stop live delivery. Facts already queued are still yielded.
    pub fn close(&mut self) {
        if let Some(live) = &self.live {
            self.host.close_channel(live.id);
        }
    }

    fn finish(&mut self) {
        self.close();
        self.phase = Phase::Done;
    }
}

impl Stream for MatchStream {
    type Item = LiveResult<Quad>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.phase {
                Phase::Pending => {
                    let taken = match &this.live {
                        Some(live) => this.host.initialize(live.id, &this.pattern),
                        None => this.host.snapshot(&this.pattern),
                    };
                    match taken {
                        Ok(quads) => this.phase = Phase::Snapshot(quads.into_iter()),
                        Err(err) => {
                            this.finish();
                            return Poll::Ready(Some(Err(err.into())));
                        }
                    }
                }
                Phase::Snapshot(quads) => {
                    if let Some(quad) = quads.next() {
                        return Poll::Ready(Some(Ok(quad)));
                    }
                    this.phase = if this.live.is_some() {
                        Phase::Live
                    } else {
                        Phase::Done
                    };
                }
                Phase::Live => {
                    let Some(live) = this.live.as_mut() else {
                        this.phase = Phase::Done;
                        continue;
                    };
                    match live.receiver.poll_recv(cx) {
                        Poll::Ready(Some(quad)) => return Poll::Ready(Some(Ok(quad))),
                        Poll::Ready(None) => this.phase = Phase::Done,
                        Poll::Pending => return Poll::Pending,
                    }
                }
                Phase::Done => return Poll::Ready(None),
            }
        }
    }
}

impl Drop for MatchStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for MatchStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            Phase::Pending => "pending",
            Phase::Snapshot(_) => "snapshot",
            Phase::Live => "live",
            Phase::Done => "done",
        };
        f.debug_struct("MatchStream")
            .field("pattern", &self.pattern)
            .field("channel", &self.live.as_ref().map(|live| live.id))
            .field("phase", &phase)
            .finish()
    }
}

/// "New fact" notifications of one [`MatchStream`]: each fact that was
/// delivered live, as it is delivered. Ends when the read's channel closes.
#[derive(Debug)]
pub struct NewFacts {
    rx: Option<mpsc::UnboundedReceiver<Quad>>,
}

impl Stream for NewFacts {
    type Item = Quad;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Quad>> {
        match &mut self.get_mut().rx {
            Some(rx) => rx.poll_recv(cx),
            None => Poll::Ready(None),
        }
    }
}
