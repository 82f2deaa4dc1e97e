//! The pattern tree and its leaf vocabulary.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::common::entry::TimelineEntry;
use crate::common::time::{MaskedDate, TimeUnit};

/// An executable entry predicate with a human-readable label.
///
/// The closure is the authority; the label only feeds diagnostics and DOT
/// export. Predicates are cheap to clone (the closure is shared) and are
/// `Send + Sync`, so compiled automata can be used from multiple threads.
#[derive(Clone)]
pub struct Predicate {
    label: String,
    func: Arc<dyn Fn(&TimelineEntry) -> bool + Send + Sync>,
}

impl Predicate {
    /// Wraps a closure with a label.
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(&TimelineEntry) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    /// Matches entries whose domain field `field` equals `value`.
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        let label = format!("{field} == {value}");
        Self {
            label,
            func: Arc::new(move |entry| entry.field(&field) == Some(&value)),
        }
    }

    /// The negation of `inner`.
    #[must_use]
    pub fn not(inner: Self) -> Self {
        let label = format!("!({})", inner.label);
        Self {
            label,
            func: Arc::new(move |entry| !(inner.func)(entry)),
        }
    }

    /// Evaluates the predicate against an entry.
    #[must_use]
    pub fn test(&self, entry: &TimelineEntry) -> bool {
        (self.func)(entry)
    }

    /// The diagnostic label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Which occurrences of a matching entry are eligible.
///
/// `First` and `Last` are positional against the whole timeline (index 0
/// and the final index), not against the path's own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OccurrencePolicy {
    /// Any occurrence may match.
    #[default]
    Any,
    /// Only the very first timeline position may match.
    First,
    /// Only the very last timeline position may match.
    Last,
    /// No occurrence ever matches.
    None,
}

impl OccurrencePolicy {
    /// Whether an entry at `index` of a timeline of `timeline_len` entries
    /// is eligible under this policy.
    #[must_use]
    pub const fn permits(self, index: usize, timeline_len: usize) -> bool {
        match self {
            Self::Any => true,
            Self::First => index == 0,
            Self::Last => timeline_len > 0 && index + 1 == timeline_len,
            Self::None => false,
        }
    }
}

impl fmt::Display for OccurrencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::First => "first",
            Self::Last => "last",
            Self::None => "never",
        };
        f.write_str(name)
    }
}

/// Which anchor an interval constraint measures from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorKind {
    /// The chronologically latest of all known anchors.
    #[default]
    LastAnchor,
    /// The first entry's timestamp.
    TimelineStart,
    /// The timestamp of the last entry a match transition consumed,
    /// falling back to the timeline start.
    LastEventAnchor,
    /// The date recorded by the last date-anchor gate crossed, falling
    /// back to the timeline start.
    LastDateAnchor,
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LastAnchor => "last anchor",
            Self::TimelineStart => "timeline start",
            Self::LastEventAnchor => "last event",
            Self::LastDateAnchor => "last date",
        };
        f.write_str(name)
    }
}

/// Elapsed-time constraint between an anchor and a candidate entry.
///
/// Bounds are inclusive, in whole `unit`s; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Minimum elapsed whole units, inclusive.
    pub min: Option<i64>,
    /// Maximum elapsed whole units, inclusive.
    pub max: Option<i64>,
    /// Granularity the elapsed time is measured in.
    pub unit: TimeUnit,
    /// Anchor the elapsed time is measured from.
    pub relative_to: AnchorKind,
}

impl Interval {
    /// A closed interval `[min, max]`.
    #[must_use]
    pub const fn range(min: i64, max: i64, unit: TimeUnit) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            unit,
            relative_to: AnchorKind::LastAnchor,
        }
    }

    /// A lower-bounded interval `[min, ∞)`.
    #[must_use]
    pub const fn at_least(min: i64, unit: TimeUnit) -> Self {
        Self {
            min: Some(min),
            max: None,
            unit,
            relative_to: AnchorKind::LastAnchor,
        }
    }

    /// An upper-bounded interval `(-∞, max]`.
    #[must_use]
    pub const fn at_most(max: i64, unit: TimeUnit) -> Self {
        Self {
            min: None,
            max: Some(max),
            unit,
            relative_to: AnchorKind::LastAnchor,
        }
    }

    /// Rebinds the interval to a different anchor.
    #[must_use]
    pub const fn relative_to(mut self, anchor: AnchorKind) -> Self {
        self.relative_to = anchor;
        self
    }

    /// Whether an elapsed whole-unit count satisfies the bounds.
    #[must_use]
    pub fn contains(&self, elapsed: i64) -> bool {
        self.min.is_none_or(|min| elapsed >= min) && self.max.is_none_or(|max| elapsed <= max)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "[{min}..{max}]")?,
            (Some(min), None) => write!(f, "[{min}..]")?,
            (None, Some(max)) => write!(f, "[..{max}]")?,
            (None, None) => write!(f, "[..]")?,
        }
        write!(f, " {} from {}", self.unit, self.relative_to)
    }
}

/// A single event occurrence to look for.
#[derive(Debug, Clone)]
pub struct EventPattern {
    /// What the entry must satisfy.
    pub predicate: Predicate,
    /// Whether the whole occurrence may be skipped.
    pub optional: bool,
    /// Which occurrences are eligible.
    pub occurrence: OccurrencePolicy,
    /// Elapsed-time constraint on the consumed entry, if any.
    pub interval: Option<Interval>,
}

/// A declarative temporal pattern.
///
/// Immutable once constructed. Validation happens at compile time, not
/// here: an empty `Sequence` is representable but rejected by
/// [`crate::nfa::compiler::compile`].
#[derive(Debug, Clone)]
pub enum Pattern {
    /// One entry satisfying a predicate.
    Event(EventPattern),
    /// Every sub-pattern in order; must be non-empty to compile.
    Sequence {
        /// The sub-patterns, in matching order.
        patterns: Vec<Pattern>,
    },
    /// Exactly one of the alternatives; an empty choice matches nothing.
    Choice {
        /// The alternatives.
        patterns: Vec<Pattern>,
    },
    /// A sub-pattern repeated between `min` and `max` times.
    Repeat {
        /// The repeated sub-pattern.
        pattern: Box<Pattern>,
        /// Minimum repetitions (0 allows the pattern to be absent).
        min: usize,
        /// Maximum repetitions; `None` means unbounded.
        max: Option<usize>,
    },
    /// Consumes nothing; establishes a temporal anchor once the timeline
    /// reaches the date.
    DateAnchor {
        /// The gate date, masked to its granularity.
        date: MaskedDate,
    },
}
