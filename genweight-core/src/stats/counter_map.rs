//! Label-keyed counters with an active-label handle
//!
//! A [`CounterMap`] routes per-event observations to the counter of the
//! currently active label without re-keying on every event. The active
//! label is resolved once per luminosity block via [`CounterMap::set_active`];
//! events then go straight to the cached arena slot.
//!
//! Counters are stored in an append-only arena, so a slot handed out as the
//! active entry stays valid when later labels are inserted. The ordered
//! index gives lexicographic iteration for reproducible output.

use super::counter::Counter;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Which counter, if any, receives observations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ActiveLabel {
    /// No label set since construction or the last reset
    #[default]
    Unset,
    /// Arena slot of the active counter
    Active(usize),
}

/// Keyed collection of counters with a single active entry
#[derive(Debug, Clone, Default)]
pub struct CounterMap {
    /// label -> arena slot
    index: BTreeMap<String, usize>,
    /// (label, counter) in insertion order
    slots: Vec<(String, Counter)>,
    active: ActiveLabel,
}

impl CounterMap {
    /// Create an empty map with no active label
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter and clear the active label.
    ///
    /// Keys are kept: labels seen in a previous run stay present with a zero
    /// counter, so they keep appearing (with zero values) in later output.
    /// Callers that need an empty key set must create a new map.
    pub fn reset(&mut self) {
        for (_, counter) in &mut self.slots {
            counter.reset();
        }
        self.active = ActiveLabel::Unset;
    }

    /// Make `label` the active entry, creating a zero counter if needed
    pub fn set_active(&mut self, label: &str) {
        let slot = self.slot_for(label);
        self.active = ActiveLabel::Active(slot);
    }

    /// Mutable access to the active counter
    pub fn active_counter(&mut self) -> Result<&mut Counter> {
        match self.active {
            ActiveLabel::Active(slot) => Ok(&mut self.slots[slot].1),
            ActiveLabel::Unset => Err(Error::LabelNotSet),
        }
    }

    /// The active label
    pub fn active_label(&self) -> Result<&str> {
        match self.active {
            ActiveLabel::Active(slot) => Ok(&self.slots[slot].0),
            ActiveLabel::Unset => Err(Error::LabelNotSet),
        }
    }

    /// Whether a label is currently active
    pub fn has_active(&self) -> bool {
        matches!(self.active, ActiveLabel::Active(_))
    }

    /// Add every counter of `other` into the counter with the same label,
    /// creating missing labels. The active label is left untouched.
    ///
    /// `&mut self` makes concurrent merges into one map impossible without
    /// external synchronization; callers sharing a run-level map across
    /// threads must serialize merges (e.g. behind a mutex).
    pub fn merge(&mut self, other: &CounterMap) {
        for (label, counter) in other.iter() {
            let slot = self.slot_for(label);
            self.slots[slot].1.merge(counter);
        }
    }

    /// Counter for `label`, if present
    pub fn get(&self, label: &str) -> Option<&Counter> {
        self.index.get(label).map(|&slot| &self.slots[slot].1)
    }

    /// Iterate `(label, counter)` pairs in lexicographic label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Counter)> + '_ {
        self.index.iter().map(move |(label, &slot)| (label.as_str(), &self.slots[slot].1))
    }

    /// All labels in lexicographic order
    pub fn labels(&self) -> Vec<&str> {
        self.index.keys().map(String::as_str).collect()
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the map has no labels
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of all counters regardless of label
    pub fn total(&self) -> Counter {
        let mut total = Counter::new();
        for (_, counter) in &self.slots {
            total.merge(counter);
        }
        total
    }

    fn slot_for(&mut self, label: &str) -> usize {
        if let Some(&slot) = self.index.get(label) {
            return slot;
        }
        let slot = self.slots.len();
        self.slots.push((label.to_string(), Counter::new()));
        self.index.insert(label.to_string(), slot);
        slot
    }
}
