//! Availability snapshots

use std::collections::BTreeMap;

/// Availability of one coach at fetch time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachAvailability {
    pub coach_no: String,
    pub seat_class: String,
    pub available: u32,
}

/// Seat-class to available-count mapping for one target at one poll instant
///
/// Coaches sharing a seat class are summed into one count. The per-coach
/// detail is kept only for message formatting; comparisons use `counts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub counts: BTreeMap<String, u32>,
    pub coaches: Vec<CoachAvailability>,
}

impl Snapshot {
    /// Build a snapshot from per-coach availability
    pub fn from_coaches(coaches: Vec<CoachAvailability>) -> Self {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for coach in &coaches {
            *counts.entry(coach.seat_class.clone()).or_insert(0) += coach.available;
        }
        Self { counts, coaches }
    }

    /// Build a snapshot from class counts alone
    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            counts: counts.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            coaches: Vec::new(),
        }
    }

    /// Count for a seat class; an unknown class counts as zero
    pub fn count(&self, seat_class: &str) -> u32 {
        self.counts.get(seat_class).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Coaches that currently have seats, in backend order
    pub fn available_coaches(&self) -> impl Iterator<Item = &CoachAvailability> {
        self.coaches.iter().filter(|c| c.available > 0)
    }
}
