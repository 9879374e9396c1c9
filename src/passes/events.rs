//! Event log for pass diagnostics.
//!
//! Passes record what they did (sources found, branches discovered, masks
//! built, merges folded or skipped) into an [`EventLog`] owned by the pass
//! context. The log renders as a line-oriented, human-readable trace for
//! debugging; it is not a stable machine-readable format.

use std::fmt;

use strum::{EnumCount, IntoEnumIterator};

/// The kind of change or discovery a pass records.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
)]
pub enum EventKind {
    /// A secret-source annotation was found and its seed recovered.
    SecretSourceFound,

    /// A value joined the taint closure.
    ValueTainted,

    /// A block terminates in a branch on tainted data.
    CriticalBranchFound,

    /// The branch region was put into a linear block order.
    RegionOrdered,

    /// A boolean path mask was synthesized for a CFG edge or block entry.
    MaskSynthesized,

    /// A block terminator was replaced by an unconditional branch along the
    /// linear order.
    BranchFlattened,

    /// A merge node was folded into a select chain.
    MergeFolded,

    /// A merge node was left in place because an incoming edge had no mask.
    MergeSkipped,
}

/// A single recorded event, optionally with a human-readable detail line.
#[derive(Debug, Clone)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// Free-form detail for the trace.
    pub detail: Option<String>,
}

/// Accumulated events from one pass invocation.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event without detail.
    pub fn record(&mut self, kind: EventKind) {
        self.events.push(Event { kind, detail: None });
    }

    /// Records an event with a detail line.
    pub fn record_with(&mut self, kind: EventKind, detail: impl Into<String>) {
        self.events.push(Event {
            kind,
            detail: Some(detail.into()),
        });
    }

    /// Returns the recorded events in order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Counts the events of one kind.
    #[must_use]
    pub fn count_of(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Summarizes the log into per-kind counts.
    #[must_use]
    pub fn derived_stats(&self) -> DerivedStats {
        let counts = EventKind::iter()
            .map(|kind| (kind, self.count_of(kind)))
            .collect();
        DerivedStats { counts }
    }

    /// Appends all events of `other` to this log.
    pub fn merge(&mut self, other: EventLog) {
        self.events.extend(other.events);
    }
}

impl fmt::Display for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            match &event.detail {
                Some(detail) => writeln!(f, "{}: {}", event.kind, detail)?,
                None => writeln!(f, "{}", event.kind)?,
            }
        }
        Ok(())
    }
}

/// Per-kind event counts.
#[derive(Debug, Clone)]
pub struct DerivedStats {
    counts: Vec<(EventKind, usize)>,
}

impl DerivedStats {
    /// Returns the count for `kind`.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, c)| *c)
    }

    /// Returns `true` if no event of any kind was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|(_, c)| *c == 0)
    }
}

impl fmt::Display for DerivedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_assert_eq!(self.counts.len(), EventKind::COUNT);
        for (kind, count) in &self.counts {
            if *count > 0 {
                writeln!(f, "{kind}: {count}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_record_and_count() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.record(EventKind::CriticalBranchFound);
        log.record_with(EventKind::MergeFolded, "b3");
        log.record(EventKind::MergeFolded);

        assert_eq!(log.len(), 3);
        assert_eq!(log.count_of(EventKind::MergeFolded), 2);
        assert_eq!(log.count_of(EventKind::MergeSkipped), 0);
    }

    #[test]
    fn test_event_log_display() {
        let mut log = EventLog::new();
        log.record_with(EventKind::CriticalBranchFound, "b0");
        log.record(EventKind::RegionOrdered);

        let text = format!("{log}");
        assert!(text.contains("CriticalBranchFound: b0"));
        assert!(text.contains("RegionOrdered"));
    }

    #[test]
    fn test_derived_stats() {
        let mut log = EventLog::new();
        log.record(EventKind::MaskSynthesized);
        log.record(EventKind::MaskSynthesized);

        let stats = log.derived_stats();
        assert_eq!(stats.count(EventKind::MaskSynthesized), 2);
        assert_eq!(stats.count(EventKind::MergeFolded), 0);
        assert!(!stats.is_empty());

        let empty = EventLog::new().derived_stats();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_event_log_merge() {
        let mut a = EventLog::new();
        a.record(EventKind::MergeFolded);
        let mut b = EventLog::new();
        b.record(EventKind::MergeSkipped);

        a.merge(b);
        assert_eq!(a.len(), 2);
    }
}
