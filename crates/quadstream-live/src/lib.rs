//! Live pattern reads over a quad store that is still being written.
//!
//! A [`StreamingStore`] lets callers read while writes are still arriving.
//! A read returns the backing store's current matches and then stays open,
//! receiving every matching fact imported later, until the store is
//! explicitly finalized.
//!
//! # Components
//!
//! - [`LiveChannel`] — per-read FIFO with an explicit
//!   `Registered -> Initialized -> Closed` state machine
//! - [`PatternIndex`] — channels bucketed by [`PatternKey`]; routing a fact
//!   costs 16 bucket probes however many reads are open
//! - [`StreamingStore`] — owns the backing store and the index, decides for
//!   every imported fact which open reads receive it
//!
//! # Delivery Rules
//!
//! 1. Per read, snapshot facts come before live facts.
//! 2. Per read, facts from one import arrive in that import's order.
//! 3. There is no ordering between concurrent imports.
//! 4. A fact reaches a read at most once: the backing store is checked for
//!    the fact before it is stored and forwarded.
//! 5. A read's snapshot is taken on its first poll, atomically with the
//!    channel becoming `Initialized`; only initialized reads get live facts.
//! 6. Slow readers buffer without limit; nothing is dropped, no backpressure
//!    reaches importers.

pub mod channel;
pub mod config;
pub mod error;
pub mod import;
pub mod index;
pub mod store;
pub mod stream;

pub use channel::{ChannelId, ChannelReceiver, ChannelState, LiveChannel};
pub use config::LiveConfig;
pub use error::{LiveError, LiveResult, SourceError};
pub use import::{ImportHandle, ImportSummary};
pub use index::{KeySlot, PatternIndex, PatternKey};
pub use store::{StoreLifecycle, StreamingStore};
pub use stream::{MatchStream, NewFacts};
