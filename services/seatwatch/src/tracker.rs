//! Last-known availability per target and the notify decision

use std::collections::HashMap;

use crate::snapshot::Snapshot;

/// What a new snapshot means relative to the previous one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// At least one seat class went from zero or unknown to a positive count
    NotifyAvailable { classes: Vec<String> },
    /// Nothing became available, but at least one previously available
    /// class is now at zero or gone
    SoldOut { classes: Vec<String> },
    NoChange,
}

/// In-memory map from target name to its last observed snapshot
#[derive(Debug, Default)]
pub struct AvailabilityTracker {
    last_known: HashMap<String, Snapshot>,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `snapshot` with the last one seen for `target`, then store it
    ///
    /// A class never seen before counts as having had zero seats, so any
    /// positive count on first sight is reported as newly available. The
    /// snapshot replaces the stored one whatever the decision, which keeps a
    /// steady positive count quiet and re-arms a class that drops to zero.
    pub fn observe(&mut self, target: &str, snapshot: Snapshot) -> Decision {
        let decision = compare(self.last_known.get(target), &snapshot);
        self.last_known.insert(target.to_string(), snapshot);
        decision
    }

    pub fn last_known(&self, target: &str) -> Option<&Snapshot> {
        self.last_known.get(target)
    }

    pub fn len(&self) -> usize {
        self.last_known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_known.is_empty()
    }
}

fn compare(previous: Option<&Snapshot>, current: &Snapshot) -> Decision {
    let previous_count = |class: &str| previous.map(|p| p.count(class)).unwrap_or(0);

    let became_available: Vec<String> = current
        .counts
        .iter()
        .filter(|(class, count)| **count > 0 && previous_count(class) == 0)
        .map(|(class, _)| class.clone())
        .collect();
    if !became_available.is_empty() {
        return Decision::NotifyAvailable {
            classes: became_available,
        };
    }

    let sold_out: Vec<String> = previous
        .map(|p| {
            p.counts
                .iter()
                .filter(|(class, count)| **count > 0 && current.count(class) == 0)
                .map(|(class, _)| class.clone())
                .collect()
        })
        .unwrap_or_default();
    if !sold_out.is_empty() {
        return Decision::SoldOut { classes: sold_out };
    }

    Decision::NoChange
}
