//! Pattern-indexed registry of live channels.
//!
//! Channels are bucketed by the [`PatternKey`] of the pattern they were
//! registered for. Routing a freshly inserted quad never scans channels: a
//! quad has exactly 16 generalisations (each of its 4 positions either kept
//! or replaced by a wildcard), so [`PatternIndex::lookup`] is 16 bucket
//! probes regardless of how many channels exist.

use std::collections::HashMap;
use std::fmt;

use quadstream_types::{Quad, QuadPattern, QuadPosition, Term};

use crate::channel::{ChannelId, LiveChannel};

/// One position of a [`PatternKey`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeySlot {
    Wildcard,
    Bound(Term),
}

/// Lookup key of a quad pattern.
///
/// Holds the bound terms themselves, compared structurally, so two patterns
/// share a key exactly when they bind the same positions to equal terms.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatternKey([KeySlot; 4]);

impl PatternKey {
    /// Key of a pattern; unbound and variable positions become wildcards.
    pub fn for_pattern(pattern: &QuadPattern) -> Self {
        Self(QuadPosition::ALL.map(|position| match pattern.bound(position) {
            Some(term) => KeySlot::Bound(term.clone()),
            None => KeySlot::Wildcard,
        }))
    }

    /// All 16 keys under which a channel could have been registered to
    /// receive `quad`. Bit `i` of the enumeration index wildcards position `i`.
    pub fn generalizations(quad: &Quad) -> impl Iterator<Item = PatternKey> {
        let terms = quad.terms().map(Term::clone);
        (0u8..16).map(move |mask| {
            Self(std::array::from_fn(|i| {
                if mask & (1 << i) != 0 {
                    KeySlot::Wildcard
                } else {
                    KeySlot::Bound(terms[i].clone())
                }
            }))
        })
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, slot) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match slot {
                KeySlot::Wildcard => f.write_str("?")?,
                KeySlot::Bound(Term::DefaultGraph) => f.write_str("<default>")?,
                KeySlot::Bound(term) => write!(f, "{term}")?,
            }
        }
        Ok(())
    }
}

/// Registry of live channels, bucketed by pattern key.
///
/// Grows monotonically: channels are never removed individually, only all at
/// once through [`PatternIndex::clear`].
#[derive(Debug, Default)]
pub struct PatternIndex {
    buckets: HashMap<PatternKey, Vec<ChannelId>>,
    channels: Vec<LiveChannel>,
}

impl PatternIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `channel` for `pattern`. O(1).
    pub fn register(&mut self, channel: LiveChannel, pattern: &QuadPattern) -> ChannelId {
        let id = ChannelId(self.channels.len());
        self.channels.push(channel);
        self.buckets
            .entry(PatternKey::for_pattern(pattern))
            .or_default()
            .push(id);
        id
    }

    /// Channels whose pattern matches `quad`.
    ///
    /// A channel appears once per registration, so repeats are possible only
    /// if the same channel was registered more than once.
    pub fn lookup(&self, quad: &Quad) -> Vec<ChannelId> {
        if self.buckets.is_empty() {
            return Vec::new();
        }
        PatternKey::generalizations(quad)
            .filter_map(|key| self.buckets.get(&key))
            .flatten()
            .copied()
            .collect()
    }

    pub fn channel(&self, id: ChannelId) -> Option<&LiveChannel> {
        self.channels.get(id.0)
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut LiveChannel> {
        self.channels.get_mut(id.0)
    }

    /// Every channel ever registered, regardless of bucket.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut LiveChannel> {
        self.channels.iter_mut()
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of distinct pattern keys.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Release every channel. Dropping a channel ends its consumer's stream.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.channels.clear();
    }
}
