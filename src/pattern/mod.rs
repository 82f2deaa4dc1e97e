// SPDX-License-Identifier: MIT

//! Declarative temporal patterns.
//!
//! A [`model::Pattern`] describes a sub-sequence to search for within a
//! timeline. Patterns are immutable data: the [`crate::nfa::compiler`]
//! lowers them into automata, and nothing here executes on its own.
//!
//! # Pattern Kinds
//!
//! | Kind | Matches |
//! |------|---------|
//! | `Event` | one entry satisfying a predicate, subject to interval/occurrence constraints |
//! | `Sequence` | every sub-pattern, in order |
//! | `Choice` | exactly one of the alternatives |
//! | `Repeat` | a sub-pattern `min..=max` times, unbounded when `max` is absent |
//! | `DateAnchor` | no entry; establishes a temporal anchor once the timeline reaches a date |

pub mod builder;
pub mod model;
