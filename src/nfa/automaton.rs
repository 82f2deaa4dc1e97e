//! Arena representation of a compiled pattern automaton.
//!
//! States live in a flat vector and refer to each other by [`StateId`],
//! so fragments can be wired together during compilation without
//! reference cycles or interior mutability. Transitions own the
//! executable payloads (predicates, intervals, anchor dates) that the
//! simulator evaluates against timeline entries.

use std::fmt;

use crate::common::time::MaskedDate;
use crate::pattern::model::{Interval, OccurrencePolicy, Predicate};

/// Index of a state in the automaton's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// What a transition requires and consumes.
#[derive(Debug, Clone)]
pub enum TransitionKind {
    /// Taken unconditionally without consuming an entry.
    Epsilon,
    /// Consumes the current entry if every condition holds.
    Match {
        /// Must accept the entry.
        predicate: Predicate,
        /// Elapsed-time constraint against the path's anchor, if any.
        interval: Option<Interval>,
        /// Which occurrences of the entry are eligible.
        occurrence: OccurrencePolicy,
    },
    /// Advances past an entry without consuming it into the match.
    Skip {
        /// Must accept the entry being skipped over.
        skip_if: Predicate,
    },
    /// Opens once the timeline has reached a date; consumes nothing.
    Anchor {
        /// Gate date, masked to its granularity.
        date: MaskedDate,
    },
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epsilon => f.write_str("ε"),
            Self::Match {
                predicate,
                interval,
                occurrence,
            } => {
                write!(f, "{predicate}")?;
                if let Some(interval) = interval {
                    write!(f, " {interval}")?;
                }
                if *occurrence != OccurrencePolicy::Any {
                    write!(f, " ({occurrence})")?;
                }
                Ok(())
            }
            Self::Skip { skip_if } => write!(f, "skip {skip_if}"),
            Self::Anchor { date } => write!(f, "anchor ≥ {date}"),
        }
    }
}

/// A directed edge between two arena states.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Destination state.
    pub target: StateId,
    /// Condition and consumption behavior.
    pub kind: TransitionKind,
}

/// One automaton state: its outgoing edges, and whether reaching it
/// completes a match.
#[derive(Debug, Clone, Default)]
pub struct State {
    /// Outgoing transitions in insertion order.
    pub transitions: Vec<Transition>,
    /// A path resting here has matched the whole pattern.
    pub accepting: bool,
}

/// A compiled pattern automaton.
///
/// Exactly one state is accepting; construction via
/// [`crate::nfa::compiler::compile`] guarantees it.
#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<State>,
    start: StateId,
}

impl Nfa {
    pub(crate) const fn new(states: Vec<State>, start: StateId) -> Self {
        Self { states, start }
    }

    /// Entry state for simulation.
    #[must_use]
    pub const fn start(&self) -> StateId {
        self.start
    }

    /// Looks up a state by id.
    ///
    /// Ids handed out by the compiler are always in range; an out of
    /// range id is a bug and panics like any slice index.
    #[must_use]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// Number of states in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the arena holds no states.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterates every state with its id, in arena order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| (StateId(index as u32), state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_id_display() {
        assert_eq!(StateId::new(0).to_string(), "s0");
        assert_eq!(StateId::new(42).to_string(), "s42");
    }

    #[test]
    fn test_state_id_index_round_trip() {
        assert_eq!(StateId::new(7).index(), 7);
    }

    #[test]
    fn test_epsilon_display() {
        assert_eq!(TransitionKind::Epsilon.to_string(), "ε");
    }

    #[test]
    fn test_match_display_plain() {
        let kind = TransitionKind::Match {
            predicate: Predicate::field_eq("kind", "login"),
            interval: None,
            occurrence: OccurrencePolicy::Any,
        };
        assert_eq!(kind.to_string(), "kind == \"login\"");
    }

    #[test]
    fn test_match_display_with_modifiers() {
        let kind = TransitionKind::Match {
            predicate: Predicate::field_eq("kind", "login"),
            interval: Some(crate::pattern::model::Interval::at_most(
                3,
                crate::common::time::TimeUnit::Days,
            )),
            occurrence: OccurrencePolicy::First,
        };
        let rendered = kind.to_string();
        assert!(rendered.contains("kind == \"login\""));
        assert!(rendered.contains("days"));
        assert!(rendered.contains("(first)"));
    }

    #[test]
    fn test_states_iterator_pairs_ids_with_arena_order() {
        let nfa = Nfa::new(
            vec![State::default(), State::default(), State::default()],
            StateId::new(0),
        );
        let ids: Vec<StateId> = nfa.states().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![StateId::new(0), StateId::new(1), StateId::new(2)]);
    }

    #[test]
    fn test_state_lookup() {
        let accepting = State {
            transitions: Vec::new(),
            accepting: true,
        };
        let nfa = Nfa::new(vec![State::default(), accepting], StateId::new(0));
        assert!(!nfa.state(StateId::new(0)).accepting);
        assert!(nfa.state(StateId::new(1)).accepting);
        assert_eq!(nfa.len(), 2);
        assert!(!nfa.is_empty());
    }
}
