//! # `chronomatch` — Temporal Event Pattern Matching
//!
//! Compiles declarative temporal patterns into nondeterministic finite
//! automata (NFAs) and simulates them against chronologically sorted
//! timelines, producing every distinct subsequence of entries that
//! satisfies the pattern.
//!
//! ## Components
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`common::time`] | Granularity-masked dates and whole-unit date arithmetic |
//! | [`common::entry`] | Timeline entries, sorting, and JSON ingestion |
//! | [`pattern`] | The declarative pattern tree and its builder API |
//! | [`nfa::compiler`] | Lowers patterns into state-arena NFAs |
//! | [`nfa::simulator`] | Breadth-first multi-path matching over a timeline |
//! | [`nfa::export`] | State enumeration and Graphviz DOT export |
//!
//! ## Example
//!
//! ```
//! use chrono::{NaiveDate, NaiveDateTime};
//! use chronomatch::common::entry::{Timeline, TimelineEntry};
//! use chronomatch::nfa::{compiler, simulator};
//! use chronomatch::pattern::builder::{event, sequence};
//! use chronomatch::pattern::model::Predicate;
//!
//! fn at(day: u32) -> NaiveDateTime {
//!     NaiveDate::from_ymd_opt(2024, 6, day).unwrap().and_hms_opt(12, 0, 0).unwrap()
//! }
//!
//! let timeline = Timeline::from_entries(vec![
//!     TimelineEntry::new(at(1)).with_field("kind", "signup"),
//!     TimelineEntry::new(at(3)).with_field("kind", "purchase"),
//! ]);
//!
//! let pattern = sequence([
//!     event(Predicate::field_eq("kind", "signup")).into(),
//!     event(Predicate::field_eq("kind", "purchase")).into(),
//! ]);
//!
//! let nfa = compiler::compile(&pattern)?;
//! let matches = simulator::find_matches(&nfa, &timeline)?;
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].indices(), vec![0, 1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod common;
pub mod nfa;
pub mod pattern;
