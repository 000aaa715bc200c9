//! Reference counting of publishing paths per document.
//!
//! A document can be reachable through several branches of one publication
//! tree at the same time. Each branch increments on claim and decrements on
//! release; a count reaching zero means no branch claims the document
//! anymore. The channel layers its removal policy on top of the change
//! callback.

use alloc::boxed::Box;
use alloc::vec::Vec;
use canopy_core::DocKey;
use hashbrown::HashMap;

/// Callback invoked with the new count after every effective decrement.
pub type RefChangeCallback = Box<dyn Fn(&DocKey, u32)>;

/// Tracks how many active publishing paths currently claim each document.
///
/// Absence of a key is equivalent to a count of zero; entries are evicted
/// when their count reaches zero. The callback fires on every effective
/// decrement (including those that do not reach zero) and never on
/// increment, so the caller owns the zero-check policy.
pub struct DocRefCounter {
    counts: HashMap<DocKey, u32>,
    on_change: RefChangeCallback,
}

impl DocRefCounter {
    /// Creates a new counter with the given change callback.
    pub fn new(on_change: impl Fn(&DocKey, u32) + 'static) -> Self {
        Self {
            counts: HashMap::new(),
            on_change: Box::new(on_change),
        }
    }

    /// Increases the count for a key by one, starting from zero if absent.
    pub fn increment(&mut self, key: DocKey) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// Decreases the count for a key by one and fires the change callback
    /// with the new count.
    ///
    /// An absent or zero key is left untouched and the callback does not
    /// fire, so the count can never go below zero.
    pub fn decrement(&mut self, key: &DocKey) {
        let Some(count) = self.counts.get_mut(key) else {
            return;
        };
        *count -= 1;
        let new_count = *count;
        if new_count == 0 {
            self.counts.remove(key);
        }
        (self.on_change)(key, new_count);
    }

    /// Returns the current count for a key; absence is zero.
    pub fn count(&self, key: &DocKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Returns true if the key has a nonzero count.
    #[inline]
    pub fn contains(&self, key: &DocKey) -> bool {
        self.counts.contains_key(key)
    }

    /// Returns the number of keys with a nonzero count.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no key is claimed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Returns all keys with a nonzero count.
    pub fn keys(&self) -> Vec<DocKey> {
        self.counts.keys().cloned().collect()
    }

    /// Removes and returns every claimed key, bypassing the callback.
    /// Used by subscription teardown, which forces all counts to zero.
    pub fn drain(&mut self) -> Vec<DocKey> {
        self.counts.drain().map(|(key, _)| key).collect()
    }
}
