use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tracing::warn;

use quadstream_types::Quad;

/// Identifier of a live channel within one store's pattern index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub(crate) usize);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch#{}", self.0)
    }
}

/// Lifecycle of a live channel.
///
/// `Registered -> Initialized -> Closed`, or straight to `Closed` from
/// `Registered`. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// Created for a read whose snapshot has not been pulled yet.
    /// Receives nothing.
    Registered,
    /// The read's snapshot has been taken; live facts are forwarded.
    Initialized,
    /// No further facts will be delivered.
    Closed,
}

/// Producer half of a live read: an unbounded single-producer /
/// single-consumer FIFO with an explicit state machine, plus an optional
/// set of "new fact" notification subscribers.
///
/// Owned by the [`PatternIndex`](crate::PatternIndex); the consumer holds the
/// matching [`ChannelReceiver`].
pub struct LiveChannel {
    state: ChannelState,
    items: Option<mpsc::UnboundedSender<Quad>>,
    new_facts: Vec<mpsc::UnboundedSender<Quad>>,
    backlog: Arc<AtomicUsize>,
    backlog_warned: bool,
}

/// Consumer half of a [`LiveChannel`].
pub struct ChannelReceiver {
    items: mpsc::UnboundedReceiver<Quad>,
    backlog: Arc<AtomicUsize>,
}

impl LiveChannel {
    /// Create a channel in the `Registered` state.
    pub fn new() -> (Self, ChannelReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backlog = Arc::new(AtomicUsize::new(0));
        let channel = Self {
            state: ChannelState::Registered,
            items: Some(tx),
            new_facts: Vec::new(),
            backlog: Arc::clone(&backlog),
            backlog_warned: false,
        };
        (channel, ChannelReceiver { items: rx, backlog })
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// `Registered -> Initialized`. Returns `true` if the transition happened.
    pub fn initialize(&mut self) -> bool {
        if self.state != ChannelState::Registered {
            return false;
        }
        self.state = ChannelState::Initialized;
        true
    }

    /// Deliver a fact. Only `Initialized` channels accept deliveries.
    ///
    /// Returns `true` if the fact was queued for the consumer. A consumer
    /// that has gone away closes the channel. When `warn_threshold` is
    /// non-zero, the first time the unconsumed backlog reaches it a warning
    /// is logged; nothing is ever dropped.
    pub fn push(&mut self, quad: &Quad, warn_threshold: usize) -> bool {
        if self.state != ChannelState::Initialized {
            return false;
        }
        let Some(tx) = &self.items else {
            return false;
        };
        if tx.send(quad.clone()).is_err() {
            self.close();
            return false;
        }
        let pending = self.backlog.fetch_add(1, Ordering::Relaxed) + 1;
        if warn_threshold > 0 && pending >= warn_threshold && !self.backlog_warned {
            self.backlog_warned = true;
            warn!(pending, "live reader is falling behind; buffering without limit");
        }
        true
    }

    /// Raise a "new fact" notification on every subscriber. Subscribers
    /// whose receiver is gone are forgotten.
    pub fn notify(&mut self, quad: &Quad) {
        self.new_facts.retain(|tx| tx.send(quad.clone()).is_ok());
    }

    /// Add a notification subscriber. Earlier subscribers keep receiving.
    ///
    /// On a closed channel the returned receiver is already terminated.
    pub fn subscribe_new_facts(&mut self) -> mpsc::UnboundedReceiver<Quad> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.state != ChannelState::Closed {
            self.new_facts.push(tx);
        }
        rx
    }

    /// Move to `Closed` and drop every sender, so the consumer sees
    /// end-of-stream once it has drained what is already queued.
    /// Closing an already closed channel is a no-op.
    pub fn close(&mut self) {
        self.state = ChannelState::Closed;
        self.items = None;
        self.new_facts.clear();
    }

    /// Facts queued but not yet consumed.
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for LiveChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveChannel")
            .field("state", &self.state)
            .field("backlog", &self.backlog())
            .field("subscribers", &self.new_facts.len())
            .finish()
    }
}

impl ChannelReceiver {
    /// Poll for the next live fact; `None` once the channel is closed and drained.
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Quad>> {
        let polled = self.items.poll_recv(cx);
        if let Poll::Ready(Some(_)) = &polled {
            self.backlog.fetch_sub(1, Ordering::Relaxed);
        }
        polled
    }
}

impl fmt::Debug for ChannelReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelReceiver")
            .field("backlog", &self.backlog.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker_ref;

    fn recv_now(rx: &mut ChannelReceiver) -> Poll<Option<Quad>> {
        rx.poll_recv(&mut Context::from_waker(noop_waker_ref()))
    }

    fn q(s: &str) -> Quad {
        Quad::triple(s, "p", "o")
    }

    #[test]
    fn registered_channel_drops_pushes() {
        let (mut channel, mut rx) = LiveChannel::new();
        assert_eq!(channel.state(), ChannelState::Registered);
        assert!(!channel.push(&q("s"), 0));
        assert_eq!(recv_now(&mut rx), Poll::Pending);
    }

    #[test]
    fn initialized_channel_is_fifo() {
        let (mut channel, mut rx) = LiveChannel::new();
        assert!(channel.initialize());
        assert!(!channel.initialize());
        assert!(channel.push(&q("a"), 0));
        assert!(channel.push(&q("b"), 0));
        assert_eq!(channel.backlog(), 2);
        assert_eq!(recv_now(&mut rx), Poll::Ready(Some(q("a"))));
        assert_eq!(recv_now(&mut rx), Poll::Ready(Some(q("b"))));
        assert_eq!(channel.backlog(), 0);
        assert_eq!(recv_now(&mut rx), Poll::Pending);
    }

    #[test]
    fn close_drains_then_ends() {
        let (mut channel, mut rx) = LiveChannel::new();
        channel.initialize();
        channel.push(&q("a"), 0);
        channel.close();
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(!channel.push(&q("b"), 0));
        assert_eq!(recv_now(&mut rx), Poll::Ready(Some(q("a"))));
        assert_eq!(recv_now(&mut rx), Poll::Ready(None));
    }

    #[test]
    fn close_is_repeatable() {
        let (mut channel, mut rx) = LiveChannel::new();
        channel.close();
        channel.close();
        assert!(!channel.initialize());
        assert_eq!(recv_now(&mut rx), Poll::Ready(None));
    }

    #[test]
    fn dropped_consumer_closes_channel() {
        let (mut channel, rx) = LiveChannel::new();
        channel.initialize();
        drop(rx);
        assert!(!channel.push(&q("a"), 0));
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[test]
    fn notifications_only_after_subscribe() {
        let (mut channel, _rx) = LiveChannel::new();
        channel.initialize();
        channel.notify(&q("early"));
        let mut notes = channel.subscribe_new_facts();
        channel.notify(&q("late"));
        assert_eq!(notes.try_recv().unwrap(), q("late"));
        assert!(notes.try_recv().is_err());
        channel.close();
        assert!(notes.try_recv().is_err());
    }

    #[test]
    fn every_subscriber_is_notified() {
        let (mut channel, _rx) = LiveChannel::new();
        channel.initialize();
        let mut first = channel.subscribe_new_facts();
        let mut second = channel.subscribe_new_facts();
        channel.notify(&q("a"));
        assert_eq!(first.try_recv().unwrap(), q("a"));
        assert_eq!(second.try_recv().unwrap(), q("a"));

        drop(first);
        channel.notify(&q("b"));
        assert_eq!(channel.new_facts.len(), 1);
        assert_eq!(second.try_recv().unwrap(), q("b"));
    }

    #[test]
    fn subscribe_on_closed_channel_is_terminated() {
        let (mut channel, _rx) = LiveChannel::new();
        channel.close();
        let mut notes = channel.subscribe_new_facts();
        assert_eq!(
            notes.try_recv(),
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected)
        );
    }

    #[test]
    fn backlog_over_threshold_keeps_everything() {
        let (mut channel, mut rx) = LiveChannel::new();
        channel.initialize();
        for i in 0..5 {
            assert!(channel.push(&q(&format!("s{i}")), 2));
        }
        assert!(channel.backlog_warned);
        let mut drained = 0;
        while let Poll::Ready(Some(_)) = recv_now(&mut rx) {
            drained += 1;
        }
        assert_eq!(drained, 5);
    }
}
