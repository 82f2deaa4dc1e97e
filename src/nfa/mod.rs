// SPDX-License-Identifier: MIT

//! Pattern automata: compilation, simulation, and export.
//!
//! A [`crate::pattern::model::Pattern`] tree is lowered by
//! [`compiler::compile`] into a nondeterministic finite automaton whose
//! transitions carry executable predicates. [`simulator::find_matches`]
//! then walks the automaton over a sorted timeline breadth-first,
//! forking a path wherever more than one transition applies, and
//! reports every distinct accepted subsequence. [`export::to_dot`]
//! renders the automaton for inspection.

pub mod automaton;
pub mod compiler;
pub mod export;
pub mod simulator;
