//! Breadth-first simulation of a compiled automaton over a timeline.
//!
//! Each tick processes every active path once: accepting paths record
//! their consumed entries, then every outgoing transition of the path's
//! state forks a successor. Paths never share mutable state, so the
//! population only ever grows through explicit forks and shrinks when
//! constraints reject a candidate. Timelines are trusted to be sorted
//! ascending by timestamp; [`crate::common::entry::Timeline`] enforces
//! that at construction and nothing here re-checks it.

use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::common::entry::{Timeline, TimelineEntry};
use crate::common::time::date_diff;
use crate::nfa::automaton::{Nfa, StateId, TransitionKind};
use crate::pattern::model::AnchorKind;

/// Paths processed before a simulation is considered runaway.
///
/// Epsilon-only cycles (an unbounded repeat wrapping nothing that
/// consumes) never drain the active set; the budget turns that hang
/// into [`SimulationError::StepBudgetExceeded`].
pub const DEFAULT_STEP_BUDGET: usize = 1_000_000;

/// Runtime failures during simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The active-path population outlived the configured budget.
    #[error("pattern exploration exceeded step budget of {budget} paths")]
    StepBudgetExceeded {
        /// Budget the run was configured with.
        budget: usize,
    },
}

/// One consumed entry together with its original timeline position.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedEntry {
    /// Position in the input timeline.
    pub index: usize,
    /// The entry as supplied.
    pub entry: TimelineEntry,
}

/// A distinct subsequence of timeline entries satisfying the pattern,
/// in consumption order.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    entries: Vec<MatchedEntry>,
}

impl PatternMatch {
    /// Consumed entries in the order the pattern matched them.
    #[must_use]
    pub fn entries(&self) -> &[MatchedEntry] {
        &self.entries
    }

    /// Original timeline indices, in consumption order.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.entries.iter().map(|matched| matched.index).collect()
    }

    /// Number of consumed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the match consumed nothing (a vacuous match).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Interval reference points known to one path.
///
/// `timeline_start` is fixed at seeding; the other two appear once a
/// match or date gate records them. Forks copy the whole set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Anchors {
    timeline_start: NaiveDateTime,
    last_event: Option<NaiveDateTime>,
    last_date: Option<NaiveDateTime>,
}

impl Anchors {
    fn resolve(&self, kind: AnchorKind) -> NaiveDateTime {
        match kind {
            AnchorKind::TimelineStart => self.timeline_start,
            AnchorKind::LastEventAnchor => self.last_event.unwrap_or(self.timeline_start),
            AnchorKind::LastDateAnchor => self.last_date.unwrap_or(self.timeline_start),
            AnchorKind::LastAnchor => {
                let mut latest = self.timeline_start;
                if let Some(event) = self.last_event {
                    latest = latest.max(event);
                }
                if let Some(date) = self.last_date {
                    latest = latest.max(date);
                }
                latest
            }
        }
    }
}

/// A live exploration of the automaton. `index` never decreases and
/// `matched` only grows.
#[derive(Debug, Clone)]
struct Path {
    state: StateId,
    index: usize,
    matched: Vec<usize>,
    anchors: Anchors,
}

type PathKey = (StateId, usize, Vec<usize>, Anchors);

/// Paths agreeing on state, position, history, and anchors have
/// identical futures; only the first is kept.
fn push_unique(spawned: &mut Vec<Path>, seen: &mut HashSet<PathKey>, path: Path) {
    let key = (path.state, path.index, path.matched.clone(), path.anchors);
    if seen.insert(key) {
        spawned.push(path);
    }
}

fn materialize(indices: &[usize], entries: &[TimelineEntry]) -> PatternMatch {
    PatternMatch {
        entries: indices
            .iter()
            .map(|&index| MatchedEntry {
                index,
                entry: entries[index].clone(),
            })
            .collect(),
    }
}

/// Runs the automaton over the timeline and returns every distinct
/// matching subsequence, deduplicated by consumed-index sequence.
///
/// # Errors
///
/// Returns [`SimulationError::StepBudgetExceeded`] if exploration
/// processes more than [`DEFAULT_STEP_BUDGET`] paths.
pub fn find_matches(nfa: &Nfa, timeline: &Timeline) -> Result<Vec<PatternMatch>, SimulationError> {
    find_matches_bounded(nfa, timeline, DEFAULT_STEP_BUDGET)
}

/// [`find_matches`] with an explicit step budget, counted in paths
/// processed across all ticks.
///
/// # Errors
///
/// Returns [`SimulationError::StepBudgetExceeded`] once more than
/// `step_budget` paths have been processed.
pub fn find_matches_bounded(
    nfa: &Nfa,
    timeline: &Timeline,
    step_budget: usize,
) -> Result<Vec<PatternMatch>, SimulationError> {
    let entries = timeline.entries();
    let timeline_start = entries
        .first()
        .map_or(NaiveDateTime::MIN, |entry| entry.timestamp);
    let mut active = vec![Path {
        state: nfa.start(),
        index: 0,
        matched: Vec::new(),
        anchors: Anchors {
            timeline_start,
            last_event: None,
            last_date: None,
        },
    }];
    let mut seen_results: HashSet<Vec<usize>> = HashSet::new();
    let mut results: Vec<PatternMatch> = Vec::new();
    let mut steps = 0usize;
    let mut tick = 0usize;

    while !active.is_empty() {
        let mut spawned: Vec<Path> = Vec::new();
        let mut spawned_keys: HashSet<PathKey> = HashSet::new();
        for path in &active {
            steps += 1;
            if steps > step_budget {
                return Err(SimulationError::StepBudgetExceeded {
                    budget: step_budget,
                });
            }
            if nfa.state(path.state).accepting && seen_results.insert(path.matched.clone()) {
                results.push(materialize(&path.matched, entries));
            }
            for transition in &nfa.state(path.state).transitions {
                match &transition.kind {
                    TransitionKind::Epsilon => {
                        push_unique(
                            &mut spawned,
                            &mut spawned_keys,
                            Path {
                                state: transition.target,
                                index: path.index,
                                matched: path.matched.clone(),
                                anchors: path.anchors,
                            },
                        );
                    }
                    TransitionKind::Anchor { date } => {
                        // Non-consuming, but gated on the current entry
                        // having reached the date.
                        let Some(entry) = entries.get(path.index) else {
                            continue;
                        };
                        if !date.reached_by(entry.timestamp) {
                            continue;
                        }
                        let mut anchors = path.anchors;
                        anchors.last_date = Some(date.floor());
                        push_unique(
                            &mut spawned,
                            &mut spawned_keys,
                            Path {
                                state: transition.target,
                                index: path.index,
                                matched: path.matched.clone(),
                                anchors,
                            },
                        );
                    }
                    TransitionKind::Skip { skip_if } => {
                        // Every position the guard accepts forks a path
                        // advanced past it; skipped entries are not
                        // recorded.
                        for (position, candidate) in
                            entries.iter().enumerate().skip(path.index)
                        {
                            if skip_if.test(candidate) {
                                push_unique(
                                    &mut spawned,
                                    &mut spawned_keys,
                                    Path {
                                        state: transition.target,
                                        index: position + 1,
                                        matched: path.matched.clone(),
                                        anchors: path.anchors,
                                    },
                                );
                            }
                        }
                    }
                    TransitionKind::Match {
                        predicate,
                        interval,
                        occurrence,
                    } => {
                        let Some(entry) = entries.get(path.index) else {
                            continue;
                        };
                        if !occurrence.permits(path.index, entries.len()) {
                            continue;
                        }
                        if let Some(interval) = interval {
                            let anchor = path.anchors.resolve(interval.relative_to);
                            let elapsed = date_diff(anchor, entry.timestamp, interval.unit);
                            if !interval.contains(elapsed) {
                                continue;
                            }
                        }
                        if !predicate.test(entry) {
                            continue;
                        }
                        let mut matched = path.matched.clone();
                        matched.push(path.index);
                        let mut anchors = path.anchors;
                        anchors.last_event = Some(entry.timestamp);
                        push_unique(
                            &mut spawned,
                            &mut spawned_keys,
                            Path {
                                state: transition.target,
                                index: path.index + 1,
                                matched,
                                anchors,
                            },
                        );
                    }
                }
            }
        }
        tick += 1;
        log::trace!(
            "tick {tick}: {} active paths, {} spawned",
            active.len(),
            spawned.len()
        );
        active = spawned;
    }
    log::debug!(
        "simulation finished after {steps} steps with {} matches",
        results.len()
    );
    Ok(results)
}
