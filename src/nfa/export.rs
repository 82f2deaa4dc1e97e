//! Diagnostic introspection and Graphviz rendering of compiled automata.
//!
//! Nothing here participates in matching; it exists so a compiled
//! automaton can be inspected when a pattern misbehaves.

use std::fmt;

use crate::nfa::automaton::{Nfa, StateId};

/// States reachable from the start state, in first-visit order.
///
/// The arena can hold unreachable states (an empty choice leaves its
/// join disconnected); those are absent here but still rendered by
/// [`to_dot`].
#[must_use]
pub fn reachable_states(nfa: &Nfa) -> Vec<StateId> {
    let mut visited = vec![false; nfa.len()];
    let mut order = Vec::new();
    let mut stack = vec![nfa.start()];
    while let Some(id) = stack.pop() {
        if visited[id.index()] {
            continue;
        }
        visited[id.index()] = true;
        order.push(id);
        // Reversed so transitions are visited in declaration order.
        for transition in nfa.state(id).transitions.iter().rev() {
            if !visited[transition.target.index()] {
                stack.push(transition.target);
            }
        }
    }
    order
}

/// Renders the automaton as a Graphviz digraph.
///
/// Accepting states are double circles; edges are labeled with the
/// human-readable rendering of their transition.
#[must_use]
pub fn to_dot(nfa: &Nfa) -> String {
    Dot(nfa).to_string()
}

struct Dot<'a>(&'a Nfa);

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph nfa {{")?;
        writeln!(f, "    rankdir=LR;")?;
        for (id, state) in self.0.states() {
            let shape = if state.accepting {
                "doublecircle"
            } else {
                "circle"
            };
            writeln!(f, "    {id} [shape={shape}];")?;
        }
        writeln!(f, "    start [shape=none, label=\"\"];")?;
        writeln!(f, "    start -> {};", self.0.start())?;
        for (id, state) in self.0.states() {
            for transition in &state.transitions {
                writeln!(
                    f,
                    "    {id} -> {} [label=\"{}\"];",
                    transition.target,
                    escape(&transition.kind.to_string())
                )?;
            }
        }
        writeln!(f, "}}")
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::compiler::compile;
    use crate::pattern::builder::{choice, event, sequence};
    use crate::pattern::model::{Pattern, Predicate};

    fn ev(kind: &str) -> Pattern {
        event(Predicate::field_eq("kind", kind)).into()
    }

    #[test]
    fn test_reachable_states_cover_sequence() {
        let nfa = compile(&sequence([ev("a"), ev("b")])).unwrap();
        let reachable = reachable_states(&nfa);
        assert_eq!(reachable.len(), nfa.len());
        assert_eq!(reachable[0], nfa.start());
    }

    #[test]
    fn test_reachable_states_skip_disconnected_join() {
        let nfa = compile(&choice(Vec::<Pattern>::new())).unwrap();
        assert_eq!(nfa.len(), 2);
        assert_eq!(reachable_states(&nfa), vec![nfa.start()]);
    }

    #[test]
    fn test_dot_shapes_and_start_arrow() {
        let dot = to_dot(&compile(&ev("a")).unwrap());
        assert!(dot.starts_with("digraph nfa {"));
        assert!(dot.contains("rankdir=LR;"));
        assert!(dot.contains("s0 [shape=circle];"));
        assert!(dot.contains("s1 [shape=doublecircle];"));
        assert!(dot.contains("start [shape=none, label=\"\"];"));
        assert!(dot.contains("start -> s0;"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_dot_renders_all_edges_including_self_loops() {
        let dot = to_dot(&compile(&ev("a")).unwrap());
        // Match edge and the skip self-loop.
        assert!(dot.contains("s0 -> s1"));
        assert!(dot.contains("s0 -> s0"));
    }

    #[test]
    fn test_dot_escapes_quotes_in_labels() {
        let dot = to_dot(&compile(&ev("a")).unwrap());
        // The predicate label renders its value quoted.
        assert!(dot.contains("kind == \\\"a\\\""));
        assert!(!dot.contains("label=\"kind == \"a\"\""));
    }

    #[test]
    fn test_dot_renders_unreachable_states() {
        let dot = to_dot(&compile(&choice(Vec::<Pattern>::new())).unwrap());
        assert!(dot.contains("s1 [shape=doublecircle];"));
    }

    #[test]
    fn test_escape_backslash_before_quote() {
        assert_eq!(escape(r#"a\"b"#), r#"a\\\"b"#);
    }
}
