use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

use super::attributes::{Attributes, Changes};

/// One set/unset request, normalized
///
/// Each entry carries the proposed new state of an attribute: `Some(value)`
/// to assign, `None` to remove.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Proposal {
    entries: Vec<(String, Option<Value>)>,
}

impl Proposal {
    pub(crate) fn new(attrs: Attributes, unset: bool) -> Self {
        let entries = attrs
            .into_iter()
            .map(|(k, v)| if unset { (k, None) } else { (k, Some(v)) })
            .collect();
        Self { entries }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Mutable state behind a model
///
/// Holds the current attributes, the snapshot taken at the last stabilized
/// flush, and the bookkeeping sets the flusher drains.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeStore {
    pub(crate) attributes: Attributes,
    pub(crate) previous: Attributes,
    pub(crate) changed: Changes,
    pub(crate) silent: BTreeSet<String>,
    pub(crate) pending: BTreeSet<String>,
    pub(crate) escaped: HashMap<String, String>,
    pub(crate) id: Option<Value>,
}

impl AttributeStore {
    /// Current attributes as they would look after `proposal`
    pub(crate) fn prospective(&self, proposal: &Proposal) -> Attributes {
        let mut next = self.attributes.clone();
        for (key, value) in &proposal.entries {
            match value {
                Some(v) => {
                    next.insert(key.clone(), v.clone());
                }
                None => {
                    next.remove(key);
                }
            }
        }
        next
    }

    /// Commit `proposal` and record what changed
    ///
    /// Returns the attributes whose current state changed, unless `silent`,
    /// in which case they are parked in the silent set and the result is
    /// empty.
    pub(crate) fn apply(
        &mut self,
        proposal: &Proposal,
        silent: bool,
        id_attribute: &str,
    ) -> BTreeSet<String> {
        let mut changes = BTreeSet::new();

        for (key, value) in &proposal.entries {
            if key == id_attribute {
                self.id = value.clone();
            }

            // Option equality covers presence: absent != Some(null)
            if self.attributes.get(key) != value.as_ref() {
                self.escaped.remove(key);
                if silent {
                    self.silent.insert(key.clone());
                } else {
                    changes.insert(key.clone());
                }
            }

            match value {
                Some(v) => {
                    self.attributes.insert(key.clone(), v.clone());
                }
                None => {
                    self.attributes.remove(key);
                }
            }

            if self.previous.get(key) != value.as_ref() {
                self.changed.insert(key.clone(), value.clone());
                if !silent {
                    self.pending.insert(key.clone());
                }
            } else {
                self.changed.remove(key);
                self.pending.remove(key);
            }
        }

        changes
    }

    /// Forget all change tracking and take the current state as baseline
    pub(crate) fn reset_tracking(&mut self) {
        self.changed.clear();
        self.silent.clear();
        self.pending.clear();
        self.previous = self.attributes.clone();
    }

    /// Promote silent changes to pending, returning the names promoted
    pub(crate) fn promote_silent(&mut self) -> BTreeSet<String> {
        let silent = std::mem::take(&mut self.silent);
        self.pending.extend(silent.iter().cloned());
        silent
    }

    /// Start a flush iteration; `false` once nothing is pending
    pub(crate) fn begin_iteration(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        self.pending.clear();
        true
    }

    /// Finish a flush iteration after the coarse listeners returned
    ///
    /// Keeps in `changed` only what listeners re-dirtied, then advances the
    /// previous snapshot.
    pub(crate) fn settle_iteration(&mut self) {
        let pending = &self.pending;
        let silent = &self.silent;
        self.changed
            .retain(|attr, _| pending.contains(attr) || silent.contains(attr));
        self.previous = self.attributes.clone();
    }
}
