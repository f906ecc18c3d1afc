// NFA to DFA converter
//
// Subset (powerset) construction. Each DFA state stands for the
// epsilon-closure of a set of NFA states. Subsets are kept as sorted index
// vectors from GraphIndex and memoized in a hash map, so every subset is
// explored at most once. Empty moves produce no transition: the result may
// be a partial DFA and no dead state is added.

use crate::{set_label, ConversionError, ConversionResult, SubsetConfig};
use ahash::AHashMap;
use plover_automaton::{Automaton, AutomatonKind, GraphIndex, State, Transition};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// NFA to DFA converter
#[derive(Debug, Clone, Default)]
pub struct SubsetConstructor {
    config: SubsetConfig,
}

/// Subsets discovered so far, in discovery order
struct Subsets {
    sets: Vec<Vec<usize>>,
    ids: AHashMap<Vec<usize>, usize>,
    max_states: usize,
}

impl Subsets {
    /// Look up a subset, registering it if new. Returns the DFA state number
    /// and whether it was just created.
    fn intern(&mut self, subset: Vec<usize>) -> ConversionResult<(usize, bool)> {
        if let Some(&id) = self.ids.get(&subset) {
            return Ok((id, false));
        }

        if self.max_states > 0 && self.sets.len() >= self.max_states {
            warn!(
                states = self.sets.len() + 1,
                max = self.max_states,
                "Subset construction exceeded the DFA state limit"
            );
            return Err(ConversionError::StateLimitExceeded {
                states: self.sets.len() + 1,
                max: self.max_states,
            });
        }

        let id = self.sets.len();
        self.ids.insert(subset.clone(), id);
        self.sets.push(subset);
        Ok((id, true))
    }
}

impl SubsetConstructor {
    pub fn new(config: SubsetConfig) -> Self {
        Self { config }
    }

    pub fn with_max_states(max_states: usize) -> Self {
        Self::new(SubsetConfig { max_states })
    }

    pub fn config(&self) -> &SubsetConfig {
        &self.config
    }

    /// Convert any valid automaton into an equivalent DFA.
    ///
    /// The input is never modified. DFA states are named `q0, q1, ...` in
    /// breadth-first discovery order, `q0` being the closure of the initial
    /// state; each is labelled with the NFA states it contains.
    pub fn convert(&self, nfa: &Automaton) -> ConversionResult<Automaton> {
        if !nfa.is_valid() {
            return Err(ConversionError::InvalidInput(
                "automaton has no valid initial state".to_string(),
            ));
        }

        let index = GraphIndex::new(nfa);
        let initial = index.initial().ok_or_else(|| {
            ConversionError::InvalidInput("automaton has no valid initial state".to_string())
        })?;

        debug!(
            automaton = nfa.id(),
            states = nfa.state_count(),
            symbols = nfa.alphabet().len(),
            "Starting subset construction"
        );

        let symbols: Vec<&str> = nfa.alphabet().iter().map(String::as_str).collect();

        let mut subsets = Subsets {
            sets: Vec::new(),
            ids: AHashMap::default(),
            max_states: self.config.max_states,
        };
        let mut edges: Vec<(usize, &str, usize)> = Vec::new();
        let mut queue = VecDeque::new();

        let (start, _) = subsets.intern(index.epsilon_closure([initial]))?;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for &symbol in &symbols {
                let moved = index.step(&subsets.sets[current], symbol);
                if moved.is_empty() {
                    continue;
                }

                let (target, created) = subsets.intern(index.epsilon_closure(moved))?;
                if created {
                    queue.push_back(target);
                }
                edges.push((current, symbol, target));
            }
        }

        let mut dfa = Automaton::new(
            format!("{}_dfa", nfa.id()),
            format!("{} (DFA)", nfa.name()),
            AutomatonKind::Dfa,
        );

        for &symbol in &symbols {
            dfa.add_symbol(symbol);
        }

        for (n, subset) in subsets.sets.iter().enumerate() {
            let label = set_label(subset.iter().map(|&s| index.state_id(s)));
            let mut state = State::new(state_name(n)).with_label(label);
            if n == start {
                state = state.initial();
            }
            if index.any_accepting(subset) {
                state = state.accepting();
            }
            dfa.add_state(state)?;
        }

        for (from, symbol, to) in edges {
            dfa.add_transition(Transition::new(state_name(from), state_name(to), symbol))?;
        }

        debug!(
            automaton = nfa.id(),
            dfa_states = dfa.state_count(),
            dfa_transitions = dfa.transition_count(),
            "Subset construction complete"
        );

        Ok(dfa)
    }
}

fn state_name(n: usize) -> String {
    format!("q{}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// a*b by hand: 0 -E-> 1, 1 -a-> 1, 1 -b-> 2 (final)
    fn a_star_b() -> Automaton {
        let mut nfa = Automaton::new("n1", "a*b", AutomatonKind::Nfa);
        nfa.add_state(State::new("0").initial()).unwrap();
        nfa.add_state(State::new("1")).unwrap();
        nfa.add_state(State::new("2").accepting()).unwrap();
        nfa.add_transition(Transition::epsilon("0", "1")).unwrap();
        nfa.add_transition(Transition::new("1", "1", "a")).unwrap();
        nfa.add_transition(Transition::new("1", "2", "b")).unwrap();
        nfa
    }

    #[test]
    fn test_convert_simple() {
        let nfa = a_star_b();
        let dfa = SubsetConstructor::default().convert(&nfa).unwrap();

        assert!(dfa.is_dfa());
        assert!(dfa.is_structurally_deterministic());
        assert_eq!(dfa.id(), "n1_dfa");
        assert_eq!(dfa.name(), "a*b (DFA)");
        assert_eq!(dfa.initial_state(), Some("q0"));

        // {0,1} -a-> {1}, {0,1} -b-> {2}, {1} -a-> {1}, {1} -b-> {2}
        assert_eq!(dfa.state_count(), 3);
        assert_eq!(dfa.get_state("q0").unwrap().label(), "{0,1}");
        assert_eq!(dfa.get_state("q1").unwrap().label(), "{1}");
        assert_eq!(dfa.get_state("q2").unwrap().label(), "{2}");
        assert!(dfa.get_state("q2").unwrap().is_final());
        assert_eq!(dfa.transition_count(), 4);
    }

    #[test]
    fn test_no_dead_state() {
        let dfa = SubsetConstructor::default().convert(&a_star_b()).unwrap();
        // {2} has no outgoing moves and nothing is added for it
        assert_eq!(dfa.transitions_from("q2").count(), 0);
        assert!(!dfa.accepts("ba"));
    }

    #[test]
    fn test_alphabet_preserved() {
        let mut nfa = a_star_b();
        nfa.add_symbol("z");
        let dfa = SubsetConstructor::default().convert(&nfa).unwrap();
        assert_eq!(dfa.alphabet(), nfa.alphabet());
    }

    #[test]
    fn test_input_untouched() {
        let nfa = a_star_b();
        let before = nfa.clone();
        let _ = SubsetConstructor::default().convert(&nfa).unwrap();
        assert_eq!(nfa, before);
    }

    #[test]
    fn test_invalid_input() {
        let nfa = Automaton::new("n", "empty", AutomatonKind::Nfa);
        assert!(matches!(
            SubsetConstructor::default().convert(&nfa),
            Err(ConversionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_state_limit() {
        let converter = SubsetConstructor::with_max_states(2);
        assert_eq!(
            converter.convert(&a_star_b()).unwrap_err(),
            ConversionError::StateLimitExceeded { states: 3, max: 2 }
        );

        let unlimited = SubsetConstructor::with_max_states(0);
        assert!(unlimited.convert(&a_star_b()).is_ok());
    }
}
