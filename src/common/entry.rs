//! Timeline entries and timelines.
//!
//! A timeline is a chronologically sorted list of timestamped entries.
//! Sortedness is established here, at construction, and the simulator
//! relies on it without re-checking. Host data may carry `start`/`end`
//! spans instead of a single timestamp; ingestion splits each span into
//! two entries tagged with [`SpanLimit`] before anything downstream sees
//! them, so the matcher only ever deals in atomic timestamped entries.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which end of a split span an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanLimit {
    /// The opening entry of a span.
    Start,
    /// The closing entry of a span.
    End,
}

/// A single timestamped entry with arbitrary JSON domain fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// When the entry occurred.
    pub timestamp: NaiveDateTime,
    /// Set when this entry is one half of a split span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<SpanLimit>,
    /// Domain fields, e.g. `kind`, `status`, whatever the host supplies.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TimelineEntry {
    /// Creates an entry with no domain fields.
    #[must_use]
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            limit: None,
            fields: Map::new(),
        }
    }

    /// Adds a domain field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Tags the entry as one half of a span.
    #[must_use]
    pub fn with_limit(mut self, limit: SpanLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Looks up a domain field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Error raised while ingesting raw timeline data.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// An entry carried neither `timestamp` nor `start`/`end`.
    #[error("entry {index} has no timestamp: expected `timestamp` or `start`/`end`")]
    MissingTimestamp {
        /// Position of the offending entry in the raw input.
        index: usize,
    },
    /// A timestamp value failed to parse as ISO-8601.
    #[error("entry {index} has unparseable timestamp {value:?}")]
    InvalidTimestamp {
        /// Position of the offending entry in the raw input.
        index: usize,
        /// The rejected timestamp text.
        value: String,
        /// The underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },
    /// The raw input was not a JSON array of objects.
    #[error("invalid timeline JSON")]
    Json(#[from] serde_json::Error),
}

/// A chronologically sorted list of entries.
///
/// Sorted ascending by timestamp from construction onward; consumers may
/// index into [`Timeline::entries`] and trust the ordering.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Builds a timeline from entries, sorting them by timestamp.
    ///
    /// Performs an O(n) presorted check first; already-ordered input (the
    /// common case for host data exported in display order) skips the
    /// sort entirely. The sort is stable, so span pairs emitted by
    /// [`Timeline::from_raw`] keep start-before-end order when a span has
    /// zero length.
    #[must_use]
    pub fn from_entries(mut entries: Vec<TimelineEntry>) -> Self {
        let presorted = entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp);
        if !presorted {
            entries.sort_by_key(|e| e.timestamp);
        }
        Self { entries }
    }

    /// Ingests the host editor's raw entry shape.
    ///
    /// Each object carries either a `timestamp` or a `start`/`end` pair
    /// (all ISO-8601 strings; date-only values are read as midnight),
    /// plus arbitrary domain fields. Span objects are split into two
    /// limit-tagged entries sharing the same fields. A one-sided span
    /// produces a single tagged entry.
    pub fn from_raw(raw: Vec<Map<String, Value>>) -> Result<Self, TimelineError> {
        let mut entries = Vec::with_capacity(raw.len());
        for (index, mut fields) in raw.into_iter().enumerate() {
            if let Some(timestamp) = take_timestamp(&mut fields, "timestamp", index)? {
                entries.push(TimelineEntry {
                    timestamp,
                    limit: None,
                    fields,
                });
                continue;
            }
            let start = take_timestamp(&mut fields, "start", index)?;
            let end = take_timestamp(&mut fields, "end", index)?;
            match (start, end) {
                (Some(start), Some(end)) => {
                    entries.push(TimelineEntry {
                        timestamp: start,
                        limit: Some(SpanLimit::Start),
                        fields: fields.clone(),
                    });
                    entries.push(TimelineEntry {
                        timestamp: end,
                        limit: Some(SpanLimit::End),
                        fields,
                    });
                }
                (Some(start), None) => entries.push(TimelineEntry {
                    timestamp: start,
                    limit: Some(SpanLimit::Start),
                    fields,
                }),
                (None, Some(end)) => entries.push(TimelineEntry {
                    timestamp: end,
                    limit: Some(SpanLimit::End),
                    fields,
                }),
                (None, None) => return Err(TimelineError::MissingTimestamp { index }),
            }
        }
        Ok(Self::from_entries(entries))
    }

    /// Parses a JSON array of raw entry objects; see [`Timeline::from_raw`].
    pub fn from_json(json: &str) -> Result<Self, TimelineError> {
        let raw: Vec<Map<String, Value>> = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// The entries, sorted ascending by timestamp.
    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the timeline has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Removes `key` from the map and parses it as a timestamp.
///
/// Returns `Ok(None)` when the key is absent. Non-string values are
/// rendered to text first so the error carries what was actually seen.
fn take_timestamp(
    fields: &mut Map<String, Value>,
    key: &str,
    index: usize,
) -> Result<Option<NaiveDateTime>, TimelineError> {
    let Some(value) = fields.remove(key) else {
        return Ok(None);
    };
    let text = match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    match parse_timestamp(&text) {
        Ok(ts) => Ok(Some(ts)),
        Err(source) => Err(TimelineError::InvalidTimestamp {
            index,
            value: text,
            source,
        }),
    }
}

/// Parses an ISO-8601 timestamp, accepting date-only values as midnight.
fn parse_timestamp(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    text.parse::<NaiveDateTime>().or_else(|err| {
        text.parse::<NaiveDate>()
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|_| err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_entry_fields() {
        let entry = TimelineEntry::new(at(1, 0))
            .with_field("kind", "signup")
            .with_field("count", 3);
        assert_eq!(entry.field("kind"), Some(&Value::from("signup")));
        assert_eq!(entry.field("count"), Some(&Value::from(3)));
        assert_eq!(entry.field("missing"), None);
    }

    #[test]
    fn test_from_entries_sorts() {
        let timeline = Timeline::from_entries(vec![
            TimelineEntry::new(at(3, 0)),
            TimelineEntry::new(at(1, 0)),
            TimelineEntry::new(at(2, 0)),
        ]);
        let stamps: Vec<_> = timeline.entries().iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![at(1, 0), at(2, 0), at(3, 0)]);
    }

    #[test]
    fn test_from_entries_presorted_preserved() {
        let timeline = Timeline::from_entries(vec![
            TimelineEntry::new(at(1, 0)).with_field("n", 1),
            TimelineEntry::new(at(1, 0)).with_field("n", 2),
            TimelineEntry::new(at(2, 0)).with_field("n", 3),
        ]);
        let order: Vec<_> = timeline
            .entries()
            .iter()
            .map(|e| e.field("n").cloned())
            .collect();
        assert_eq!(
            order,
            vec![Some(Value::from(1)), Some(Value::from(2)), Some(Value::from(3))]
        );
    }

    #[test]
    fn test_from_entries_stable_for_equal_timestamps() {
        // Unsorted input with an equal-timestamp pair: the pair keeps its
        // relative order through the stable sort.
        let timeline = Timeline::from_entries(vec![
            TimelineEntry::new(at(5, 0)).with_field("n", 0),
            TimelineEntry::new(at(2, 0)).with_field("n", 1),
            TimelineEntry::new(at(2, 0)).with_field("n", 2),
        ]);
        let order: Vec<_> = timeline
            .entries()
            .iter()
            .map(|e| e.field("n").cloned())
            .collect();
        assert_eq!(
            order,
            vec![Some(Value::from(1)), Some(Value::from(2)), Some(Value::from(0))]
        );
    }

    #[test]
    fn test_from_entries_empty() {
        let timeline = Timeline::from_entries(vec![]);
        assert!(timeline.is_empty());
        assert_eq!(timeline.len(), 0);
    }

    #[test]
    fn test_from_json_single_timestamps() {
        let timeline = Timeline::from_json(
            r#"[
                {"timestamp": "2024-06-02T08:00:00", "kind": "b"},
                {"timestamp": "2024-06-01T08:00:00", "kind": "a"}
            ]"#,
        )
        .unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.entries()[0].field("kind"), Some(&Value::from("a")));
        assert_eq!(timeline.entries()[1].field("kind"), Some(&Value::from("b")));
        // The timestamp key is consumed, not left behind as a field.
        assert_eq!(timeline.entries()[0].field("timestamp"), None);
    }

    #[test]
    fn test_from_json_splits_spans() {
        let timeline = Timeline::from_json(
            r#"[{"start": "2024-06-01", "end": "2024-06-10", "kind": "employment"}]"#,
        )
        .unwrap();
        assert_eq!(timeline.len(), 2);
        let first = &timeline.entries()[0];
        let second = &timeline.entries()[1];
        assert_eq!(first.limit, Some(SpanLimit::Start));
        assert_eq!(first.timestamp, at(1, 0));
        assert_eq!(second.limit, Some(SpanLimit::End));
        assert_eq!(second.timestamp, at(10, 0));
        // Both halves share the domain fields.
        assert_eq!(first.field("kind"), second.field("kind"));
    }

    #[test]
    fn test_from_json_zero_length_span_keeps_start_first() {
        let timeline = Timeline::from_json(
            r#"[{"start": "2024-06-01T08:00:00", "end": "2024-06-01T08:00:00"}]"#,
        )
        .unwrap();
        assert_eq!(timeline.entries()[0].limit, Some(SpanLimit::Start));
        assert_eq!(timeline.entries()[1].limit, Some(SpanLimit::End));
    }

    #[test]
    fn test_from_json_one_sided_span() {
        let timeline =
            Timeline::from_json(r#"[{"start": "2024-06-01", "kind": "ongoing"}]"#).unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.entries()[0].limit, Some(SpanLimit::Start));
    }

    #[test]
    fn test_from_json_date_only_is_midnight() {
        let timeline = Timeline::from_json(r#"[{"timestamp": "2024-06-15"}]"#).unwrap();
        assert_eq!(timeline.entries()[0].timestamp, at(15, 0));
    }

    #[test]
    fn test_from_json_missing_timestamp() {
        let err = Timeline::from_json(r#"[{"kind": "a"}]"#).unwrap_err();
        assert!(matches!(err, TimelineError::MissingTimestamp { index: 0 }));
    }

    #[test]
    fn test_from_json_invalid_timestamp() {
        let err = Timeline::from_json(r#"[{"timestamp": "not-a-date"}]"#).unwrap_err();
        match err {
            TimelineError::InvalidTimestamp { index, value, .. } => {
                assert_eq!(index, 0);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_json_invalid_timestamp_reports_second_entry() {
        let err = Timeline::from_json(
            r#"[{"timestamp": "2024-06-01"}, {"timestamp": 42}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, TimelineError::InvalidTimestamp { index: 1, .. }));
    }

    #[test]
    fn test_from_json_not_an_array() {
        let err = Timeline::from_json(r#"{"timestamp": "2024-06-01"}"#).unwrap_err();
        assert!(matches!(err, TimelineError::Json(_)));
    }

    #[test]
    fn test_from_json_sorts_span_halves_into_timeline() {
        // A span enclosing another entry interleaves after sorting.
        let timeline = Timeline::from_json(
            r#"[
                {"start": "2024-06-01", "end": "2024-06-10", "kind": "span"},
                {"timestamp": "2024-06-05", "kind": "point"}
            ]"#,
        )
        .unwrap();
        let kinds: Vec<_> = timeline
            .entries()
            .iter()
            .map(|e| e.field("kind").and_then(Value::as_str).map(String::from))
            .collect();
        assert_eq!(
            kinds,
            vec![
                Some("span".to_string()),
                Some("point".to_string()),
                Some("span".to_string())
            ]
        );
    }
}
