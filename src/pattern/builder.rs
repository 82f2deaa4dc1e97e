//! Fluent construction of pattern trees.
//!
//! Pure assembly: nothing here validates or compiles. Shapes that cannot
//! compile (an empty `sequence`, `repeat` bounds with `max < min`) are
//! still constructible and are rejected by
//! [`crate::nfa::compiler::compile`].

use crate::common::time::{MaskedDate, TimeUnit};
use crate::pattern::model::{
    AnchorKind, EventPattern, Interval, OccurrencePolicy, Pattern, Predicate,
};

/// Starts an event pattern around a predicate.
pub fn event(predicate: Predicate) -> EventBuilder {
    EventBuilder {
        predicate,
        optional: false,
        occurrence: OccurrencePolicy::Any,
        interval: None,
        anchor: None,
    }
}

/// All sub-patterns, in order.
pub fn sequence<I>(patterns: I) -> Pattern
where
    I: IntoIterator<Item = Pattern>,
{
    Pattern::Sequence {
        patterns: patterns.into_iter().collect(),
    }
}

/// Exactly one of the alternatives.
pub fn choice<I>(patterns: I) -> Pattern
where
    I: IntoIterator<Item = Pattern>,
{
    Pattern::Choice {
        patterns: patterns.into_iter().collect(),
    }
}

/// Repeats a sub-pattern; defaults to `min = 0`, unbounded `max`.
pub fn repeat(pattern: impl Into<Pattern>) -> RepeatBuilder {
    RepeatBuilder {
        pattern: pattern.into(),
        min: 0,
        max: None,
    }
}

/// A temporal anchor that opens once the timeline reaches `date`.
#[must_use]
pub fn date_anchor(date: MaskedDate) -> Pattern {
    Pattern::DateAnchor { date }
}

/// Accumulates modifiers for an event pattern.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    predicate: Predicate,
    optional: bool,
    occurrence: OccurrencePolicy,
    interval: Option<Interval>,
    anchor: Option<AnchorKind>,
}

impl EventBuilder {
    /// Allows the occurrence to be skipped entirely.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Restricts which occurrences are eligible.
    #[must_use]
    pub fn occurrence(mut self, policy: OccurrencePolicy) -> Self {
        self.occurrence = policy;
        self
    }

    /// Constrains elapsed time with a prebuilt interval.
    #[must_use]
    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Constrains elapsed time to `[min, max]` whole `unit`s.
    #[must_use]
    pub fn interval_range(self, min: i64, max: i64, unit: TimeUnit) -> Self {
        self.interval(Interval::range(min, max, unit))
    }

    /// Measures the interval from a specific anchor instead of the
    /// default. Order-independent with the interval modifiers; ignored
    /// when no interval is set.
    #[must_use]
    pub fn relative_to(mut self, anchor: AnchorKind) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

impl From<EventBuilder> for Pattern {
    fn from(builder: EventBuilder) -> Self {
        let interval = builder.interval.map(|mut interval| {
            if let Some(anchor) = builder.anchor {
                interval.relative_to = anchor;
            }
            interval
        });
        Self::Event(EventPattern {
            predicate: builder.predicate,
            optional: builder.optional,
            occurrence: builder.occurrence,
            interval,
        })
    }
}

/// Accumulates repetition bounds.
#[derive(Debug, Clone)]
pub struct RepeatBuilder {
    pattern: Pattern,
    min: usize,
    max: Option<usize>,
}

impl RepeatBuilder {
    /// Minimum number of repetitions.
    #[must_use]
    pub fn min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    /// Maximum number of repetitions.
    #[must_use]
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }
}

impl From<RepeatBuilder> for Pattern {
    fn from(builder: RepeatBuilder) -> Self {
        Self::Repeat {
            pattern: Box::new(builder.pattern),
            min: builder.min,
            max: builder.max,
        }
    }
}
