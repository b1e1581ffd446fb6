//! Watch registrations and change events.
//!
//! A registration pairs a [`KeyRange`] with a callback. Range semantics
//! follow etcd v3:
//! - empty `end`: the single key `start`
//! - `end == [0]`: every key with prefix `start`
//! - otherwise: the half-open range `[start, end)`

use std::sync::Arc;

/// Identifier assigned to a watch registration.
pub type WatchId = i64;

/// Callback invoked by a store for every matching change.
///
/// Stores invoke callbacks with no internal lock held, so a callback may
/// call back into the store.
pub type WatchCallback = Arc<dyn Fn(WatchEvent) + Send + Sync>;

/// A range of keys covered by a watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyRange {
    /// Start of the key range.
    pub start: Vec<u8>,

    /// End of the key range (exclusive), empty for a single key, or `[0]`
    /// for a prefix.
    pub end: Vec<u8>,
}

impl KeyRange {
    /// Create a range from explicit bounds.
    pub fn new(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// A range covering exactly one key.
    pub fn single(key: impl Into<Vec<u8>>) -> Self {
        Self::new(key, Vec::new())
    }

    /// A range covering every key that starts with `prefix`.
    pub fn prefix(prefix: impl Into<Vec<u8>>) -> Self {
        Self::new(prefix, vec![0])
    }

    /// A range covering every key of the form `<parent>/<child>`.
    ///
    /// The end bound is `<parent>` followed by the byte after `/`, so keys
    /// that merely share a textual prefix with `parent` (such as
    /// `<parent>-other/x`) stay outside the range.
    pub fn children_of(parent: &str) -> Self {
        let mut start = parent.as_bytes().to_vec();
        start.push(b'/');
        let mut end = parent.as_bytes().to_vec();
        end.push(b'/' + 1);
        Self { start, end }
    }

    /// Check if this range covers a key.
    pub fn matches_key(&self, key: &[u8]) -> bool {
        if self.end.is_empty() {
            key == self.start.as_slice()
        } else if self.end == [0] {
            key.starts_with(&self.start)
        } else {
            key >= self.start.as_slice() && key < self.end.as_slice()
        }
    }
}

/// A change notification delivered to watch callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A key was created or updated.
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        mod_revision: u64,
    },
    /// A key was deleted.
    Delete { key: Vec<u8>, mod_revision: u64 },
}

impl WatchEvent {
    /// The key this event concerns.
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key, .. } => key,
        }
    }

    /// Store revision at which the change happened.
    pub fn mod_revision(&self) -> u64 {
        match self {
            Self::Put { mod_revision, .. } | Self::Delete { mod_revision, .. } => *mod_revision,
        }
    }

    /// Check if this is a put event.
    pub fn is_put(&self) -> bool {
        matches!(self, Self::Put { .. })
    }
}

/// A live watch registration held by a store.
#[derive(Clone)]
pub struct WatchRegistration {
    /// Registration identifier.
    pub watch_id: WatchId,
    /// Keys covered.
    pub range: KeyRange,
    /// Delivery target.
    pub callback: WatchCallback,
}

impl std::fmt::Debug for WatchRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchRegistration")
            .field("watch_id", &self.watch_id)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key_range() {
        let range = KeyRange::single(b"a/b".to_vec());
        assert!(range.matches_key(b"a/b"));
        assert!(!range.matches_key(b"a/bc"));
    }

    #[test]
    fn test_prefix_range() {
        let range = KeyRange::prefix(b"a/".to_vec());
        assert!(range.matches_key(b"a/"));
        assert!(range.matches_key(b"a/zzz"));
        assert!(!range.matches_key(b"b/a"));
    }

    #[test]
    fn test_children_of_excludes_sibling_prefixes() {
        let range = KeyRange::children_of("/base/Widget");
        assert_eq!(range.start, b"/base/Widget/".to_vec());
        assert_eq!(range.end, b"/base/Widget0".to_vec());

        assert!(range.matches_key(b"/base/Widget/1234"));
        assert!(!range.matches_key(b"/base/Widget"));
        assert!(!range.matches_key(b"/base/WidgetPart/1234"));
        assert!(!range.matches_key(b"/base/Widget-old/1234"));
        assert!(!range.matches_key(b"/base/Gadget/1234"));
    }

    #[test]
    fn test_event_accessors() {
        let put = WatchEvent::Put {
            key: b"k".to_vec(),
            value: b"v".to_vec(),
            mod_revision: 3,
        };
        let delete = WatchEvent::Delete {
            key: b"k".to_vec(),
            mod_revision: 4,
        };
        assert!(put.is_put());
        assert!(!delete.is_put());
        assert_eq!(put.key(), b"k");
        assert_eq!(delete.mod_revision(), 4);
    }
}
