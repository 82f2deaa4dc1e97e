//! Lowers pattern trees into executable automata.
//!
//! Each pattern node becomes a fragment with exactly one entry and one
//! exit state; composite nodes wire child fragments together with
//! epsilon transitions. The whole tree therefore compiles to an
//! automaton with a single start state and a single accepting state.

use crate::common::time::MaskedDate;
use crate::nfa::automaton::{Nfa, State, StateId, Transition, TransitionKind};
use crate::pattern::model::{EventPattern, Pattern, Predicate};

/// Pattern shapes that cannot be lowered.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A sequence node held no sub-patterns.
    #[error("sequence requires at least one sub-pattern")]
    EmptySequence,
    /// Repeat bounds were inverted.
    #[error("repeat bounds are inverted: min {min} exceeds max {max}")]
    RepeatBounds {
        /// Requested minimum repetitions.
        min: usize,
        /// Requested maximum repetitions.
        max: usize,
    },
}

/// Owns the arena while fragments are being wired.
struct NfaBuilder {
    states: Vec<State>,
}

impl NfaBuilder {
    const fn new() -> Self {
        Self { states: Vec::new() }
    }

    fn add_state(&mut self) -> StateId {
        let id = StateId::new(self.states.len() as u32);
        self.states.push(State::default());
        id
    }

    fn add_transition(&mut self, from: StateId, to: StateId, kind: TransitionKind) {
        self.states[from.index()]
            .transitions
            .push(Transition { target: to, kind });
    }

    fn finish(mut self, start: StateId, accepting: StateId) -> Nfa {
        self.states[accepting.index()].accepting = true;
        Nfa::new(self.states, start)
    }
}

/// A lowered sub-pattern: entry and exit state in the shared arena.
#[derive(Clone, Copy)]
struct Fragment {
    start: StateId,
    end: StateId,
}

/// Compiles a pattern tree into an automaton.
///
/// # Errors
///
/// Returns [`CompileError::EmptySequence`] for a sequence with no
/// sub-patterns and [`CompileError::RepeatBounds`] when a repeat's
/// `max` is below its `min`.
pub fn compile(pattern: &Pattern) -> Result<Nfa, CompileError> {
    let mut builder = NfaBuilder::new();
    let fragment = lower(&mut builder, pattern)?;
    let nfa = builder.finish(fragment.start, fragment.end);
    log::debug!("compiled pattern into {} automaton states", nfa.len());
    Ok(nfa)
}

fn lower(builder: &mut NfaBuilder, pattern: &Pattern) -> Result<Fragment, CompileError> {
    match pattern {
        Pattern::Event(event) => Ok(lower_event(builder, event)),
        Pattern::Sequence { patterns } => lower_sequence(builder, patterns),
        Pattern::Choice { patterns } => lower_choice(builder, patterns),
        Pattern::Repeat { pattern, min, max } => lower_repeat(builder, pattern, *min, *max),
        Pattern::DateAnchor { date } => Ok(lower_date_anchor(builder, *date)),
    }
}

/// Start state carries the match edge plus a skip self-loop guarded by
/// the negated predicate, so a path can advance past entries that do
/// not satisfy the event. Optional events add an epsilon bypass.
fn lower_event(builder: &mut NfaBuilder, event: &EventPattern) -> Fragment {
    let start = builder.add_state();
    let end = builder.add_state();
    builder.add_transition(
        start,
        end,
        TransitionKind::Match {
            predicate: event.predicate.clone(),
            interval: event.interval,
            occurrence: event.occurrence,
        },
    );
    builder.add_transition(
        start,
        start,
        TransitionKind::Skip {
            skip_if: Predicate::not(event.predicate.clone()),
        },
    );
    if event.optional {
        builder.add_transition(start, end, TransitionKind::Epsilon);
    }
    Fragment { start, end }
}

fn lower_sequence(
    builder: &mut NfaBuilder,
    patterns: &[Pattern],
) -> Result<Fragment, CompileError> {
    let mut fragments = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        fragments.push(lower(builder, pattern)?);
    }
    let (Some(first), Some(last)) = (fragments.first(), fragments.last()) else {
        return Err(CompileError::EmptySequence);
    };
    for pair in fragments.windows(2) {
        builder.add_transition(pair[0].end, pair[1].start, TransitionKind::Epsilon);
    }
    Ok(Fragment {
        start: first.start,
        end: last.end,
    })
}

/// Fork/join: epsilon from the fork to every alternative, epsilon from
/// every alternative to the join. Zero alternatives leave the pair
/// unconnected, an automaton that matches nothing.
fn lower_choice(
    builder: &mut NfaBuilder,
    patterns: &[Pattern],
) -> Result<Fragment, CompileError> {
    let start = builder.add_state();
    let end = builder.add_state();
    for pattern in patterns {
        let fragment = lower(builder, pattern)?;
        builder.add_transition(start, fragment.start, TransitionKind::Epsilon);
        builder.add_transition(fragment.end, end, TransitionKind::Epsilon);
    }
    Ok(Fragment { start, end })
}

/// Unrolls `min` mandatory copies, then either `max - min` optional
/// copies (each with a stop epsilon to the exit) or, when unbounded, a
/// single looping copy with epsilon exits at its entry and exit.
fn lower_repeat(
    builder: &mut NfaBuilder,
    pattern: &Pattern,
    min: usize,
    max: Option<usize>,
) -> Result<Fragment, CompileError> {
    if let Some(max) = max {
        if max < min {
            return Err(CompileError::RepeatBounds { min, max });
        }
    }
    let start = builder.add_state();
    let end = builder.add_state();
    let mut cursor = start;
    for _ in 0..min {
        let copy = lower(builder, pattern)?;
        builder.add_transition(cursor, copy.start, TransitionKind::Epsilon);
        cursor = copy.end;
    }
    if let Some(max) = max {
        for _ in min..max {
            let copy = lower(builder, pattern)?;
            builder.add_transition(cursor, end, TransitionKind::Epsilon);
            builder.add_transition(cursor, copy.start, TransitionKind::Epsilon);
            cursor = copy.end;
        }
        builder.add_transition(cursor, end, TransitionKind::Epsilon);
    } else {
        let copy = lower(builder, pattern)?;
        builder.add_transition(cursor, end, TransitionKind::Epsilon);
        builder.add_transition(cursor, copy.start, TransitionKind::Epsilon);
        builder.add_transition(copy.end, copy.start, TransitionKind::Epsilon);
        builder.add_transition(copy.end, end, TransitionKind::Epsilon);
    }
    Ok(Fragment { start, end })
}

/// Skip self-loop consumes entries that precede the date; the anchor
/// gate opens once the current entry's timestamp reaches it.
fn lower_date_anchor(builder: &mut NfaBuilder, date: MaskedDate) -> Fragment {
    let start = builder.add_state();
    let end = builder.add_state();
    let skip_if = Predicate::new(format!("before {date}"), move |entry| {
        !date.reached_by(entry.timestamp)
    });
    builder.add_transition(start, start, TransitionKind::Skip { skip_if });
    builder.add_transition(start, end, TransitionKind::Anchor { date });
    Fragment { start, end }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::pattern::builder::{event, repeat, sequence};
    use proptest::prelude::*;

    fn ev() -> Pattern {
        event(Predicate::field_eq("kind", "x")).into()
    }

    fn arb_pattern() -> impl Strategy<Value = Pattern> {
        let leaf = prop_oneof![
            Just(ev()),
            (0usize..3, prop::option::of(0usize..3)).prop_map(|(min, max)| {
                let mut builder = repeat(ev()).min(min);
                if let Some(max) = max {
                    builder = builder.max(max);
                }
                builder.into()
            }),
        ];
        leaf.prop_recursive(3, 16, 3, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3)
                    .prop_map(|patterns| Pattern::Sequence { patterns }),
                prop::collection::vec(inner, 0..3)
                    .prop_map(|patterns| Pattern::Choice { patterns }),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_sequence_of_n_events_has_2n_states(n in 1usize..32) {
            let pattern = sequence((0..n).map(|_| ev()));
            let nfa = compile(&pattern).unwrap();
            prop_assert_eq!(nfa.len(), 2 * n);
        }

        #[test]
        fn prop_repeat_bounds_error_iff_inverted(min in 0usize..8, max in 0usize..8) {
            let result = compile(&repeat(ev()).min(min).max(max).into());
            prop_assert_eq!(result.is_err(), max < min);
        }

        #[test]
        fn prop_bounded_repeat_state_count(min in 0usize..6, extra in 0usize..6) {
            let max = min + extra;
            let nfa = compile(&repeat(ev()).min(min).max(max).into()).unwrap();
            // Outer pair plus two states per unrolled copy.
            prop_assert_eq!(nfa.len(), 2 + 2 * max);
        }

        #[test]
        fn prop_compile_returns_for_arbitrary_shapes(pattern in arb_pattern()) {
            match compile(&pattern) {
                Ok(nfa) => prop_assert!(!nfa.is_empty()),
                Err(CompileError::EmptySequence | CompileError::RepeatBounds { .. }) => {}
            }
        }
    }
}
