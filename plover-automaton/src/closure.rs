// Epsilon-closure and symbol moves
//
// GraphIndex is a read-only adjacency view over an automaton. States are
// addressed by their insertion index so that closures and move sets can be
// kept as sorted, deduplicated index vectors. Those vectors are canonical:
// two equal state sets always produce the same vector, which makes them
// usable directly as hash keys by the subset constructor.

use crate::automaton::Automaton;
use crate::state::{StateSet, EPSILON};
use ahash::AHashMap;
use smallvec::SmallVec;

type Targets = SmallVec<[usize; 4]>;

/// Adjacency view of an automaton, indexed by state position
#[derive(Debug)]
pub struct GraphIndex<'a> {
    automaton: &'a Automaton,

    /// Epsilon successors per state
    epsilon: Vec<Targets>,

    /// symbol -> state -> successors
    moves: AHashMap<&'a str, AHashMap<usize, Targets>>,

    /// Final flag per state
    accepting: Vec<bool>,
}

impl<'a> GraphIndex<'a> {
    pub fn new(automaton: &'a Automaton) -> Self {
        let count = automaton.state_count();
        let mut epsilon = vec![Targets::new(); count];
        let mut moves: AHashMap<&'a str, AHashMap<usize, Targets>> = AHashMap::default();

        for transition in automaton.transitions() {
            // Endpoints are validated on insertion, so both resolve
            let (Some(from), Some(to)) = (
                automaton.state_index(transition.from()),
                automaton.state_index(transition.to()),
            ) else {
                continue;
            };

            for symbol in transition.symbols() {
                let targets = if symbol == EPSILON {
                    &mut epsilon[from]
                } else {
                    moves
                        .entry(symbol.as_str())
                        .or_default()
                        .entry(from)
                        .or_default()
                };
                if !targets.contains(&to) {
                    targets.push(to);
                }
            }
        }

        let accepting = automaton.states().map(|s| s.is_final()).collect();

        Self {
            automaton,
            epsilon,
            moves,
            accepting,
        }
    }

    pub fn automaton(&self) -> &'a Automaton {
        self.automaton
    }

    pub fn len(&self) -> usize {
        self.accepting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepting.is_empty()
    }

    pub fn index_of(&self, state_id: &str) -> Option<usize> {
        self.automaton.state_index(state_id)
    }

    /// Id of the state at `index`
    pub fn state_id(&self, index: usize) -> &'a str {
        self.automaton
            .state_at(index)
            .map(|s| s.id())
            .unwrap_or_default()
    }

    pub fn initial(&self) -> Option<usize> {
        self.automaton
            .initial_state()
            .and_then(|id| self.index_of(id))
    }

    pub fn is_accepting(&self, index: usize) -> bool {
        self.accepting.get(index).copied().unwrap_or(false)
    }

    /// True if any state of the set is final
    pub fn any_accepting(&self, states: &[usize]) -> bool {
        states.iter().any(|&s| self.is_accepting(s))
    }

    /// Successors of a single state on `symbol`
    pub fn targets(&self, index: usize, symbol: &str) -> &[usize] {
        self.moves
            .get(symbol)
            .and_then(|by_state| by_state.get(&index))
            .map(|v| &v[..])
            .unwrap_or(&[])
    }

    /// Worklist closure under epsilon edges. The result is sorted, deduplicated
    /// and always contains the seeds.
    pub fn epsilon_closure<I>(&self, seeds: I) -> Vec<usize>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut visited = vec![false; self.len()];
        let mut stack: Vec<usize> = Vec::new();

        for seed in seeds {
            if seed < visited.len() && !visited[seed] {
                visited[seed] = true;
                stack.push(seed);
            }
        }

        while let Some(state) = stack.pop() {
            for &next in &self.epsilon[state] {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        visited
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| v.then_some(i))
            .collect()
    }

    /// States reachable from `states` by exactly one `symbol` edge, before
    /// closure. Sorted and deduplicated.
    pub fn step(&self, states: &[usize], symbol: &str) -> Vec<usize> {
        let mut reached: Vec<usize> = states
            .iter()
            .flat_map(|&s| self.targets(s, symbol).iter().copied())
            .collect();
        reached.sort_unstable();
        reached.dedup();
        reached
    }

    /// `epsilon_closure(step(states, symbol))`
    pub fn move_on_symbol(&self, states: &[usize], symbol: &str) -> Vec<usize> {
        let reached = self.step(states, symbol);
        if reached.is_empty() {
            return reached;
        }
        self.epsilon_closure(reached)
    }

    /// Convert an index set back into owned state ids
    pub fn to_state_set(&self, states: &[usize]) -> StateSet {
        states
            .iter()
            .map(|&s| self.state_id(s).to_string())
            .collect()
    }
}

impl Automaton {
    /// States reachable from `seeds` through epsilon transitions only.
    ///
    /// The result is a superset of the seeds and closing it again returns it
    /// unchanged. Seeds that are not states of this automaton are kept as-is.
    pub fn epsilon_closure(&self, seeds: &StateSet) -> StateSet {
        let index = GraphIndex::new(self);
        let known = seeds.iter().filter_map(|id| index.index_of(id));
        let closure = index.epsilon_closure(known);

        let mut result = index.to_state_set(&closure);
        result.extend(
            seeds
                .iter()
                .filter(|id| !self.contains_state(id))
                .cloned(),
        );
        result
    }

    /// States reachable from `states` on one `symbol` edge followed by
    /// any number of epsilon edges.
    pub fn move_on_symbol(&self, states: &StateSet, symbol: &str) -> StateSet {
        let index = GraphIndex::new(self);
        let from: Vec<usize> = states.iter().filter_map(|id| index.index_of(id)).collect();
        let reached = index.move_on_symbol(&from, symbol);
        index.to_state_set(&reached)
    }
}

#[cfg(test)]
mod tests {
    use super::GraphIndex;
    use crate::{Automaton, AutomatonKind, State, StateSet, Transition};

    fn set(ids: &[&str]) -> StateSet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn chain() -> Automaton {
        // 0 -ε-> 1 -ε-> 2, 2 -a-> 3, 3 -ε-> 0
        let mut nfa = Automaton::new("n", "chain", AutomatonKind::Nfa);
        for id in ["0", "1", "2", "3"] {
            nfa.add_state(State::new(id)).unwrap();
        }
        nfa.set_initial_state("0").unwrap();
        nfa.add_transition(Transition::epsilon("0", "1")).unwrap();
        nfa.add_transition(Transition::epsilon("1", "2")).unwrap();
        nfa.add_transition(Transition::new("2", "3", "a")).unwrap();
        nfa.add_transition(Transition::epsilon("3", "0")).unwrap();
        nfa
    }

    #[test]
    fn test_epsilon_closure_chain() {
        let nfa = chain();
        assert_eq!(nfa.epsilon_closure(&set(&["0"])), set(&["0", "1", "2"]));
        assert_eq!(nfa.epsilon_closure(&set(&["2"])), set(&["2"]));
        assert_eq!(nfa.epsilon_closure(&set(&["3"])), set(&["0", "1", "2", "3"]));
    }

    #[test]
    fn test_epsilon_closure_idempotent() {
        let nfa = chain();
        for seeds in [set(&[]), set(&["0"]), set(&["1", "3"]), set(&["2"])] {
            let once = nfa.epsilon_closure(&seeds);
            assert!(once.is_superset(&seeds));
            assert_eq!(nfa.epsilon_closure(&once), once);
        }
    }

    #[test]
    fn test_epsilon_closure_keeps_unknown_seeds() {
        let nfa = chain();
        let closure = nfa.epsilon_closure(&set(&["ghost", "1"]));
        assert_eq!(closure, set(&["1", "2", "ghost"]));
    }

    #[test]
    fn test_epsilon_cycle_terminates() {
        let mut nfa = Automaton::new("n", "cycle", AutomatonKind::Nfa);
        for id in ["x", "y"] {
            nfa.add_state(State::new(id)).unwrap();
        }
        nfa.add_transition(Transition::epsilon("x", "y")).unwrap();
        nfa.add_transition(Transition::epsilon("y", "x")).unwrap();
        assert_eq!(nfa.epsilon_closure(&set(&["x"])), set(&["x", "y"]));
    }

    #[test]
    fn test_multi_symbol_epsilon_member() {
        let mut nfa = Automaton::new("n", "mixed", AutomatonKind::Nfa);
        for id in ["p", "q"] {
            nfa.add_state(State::new(id)).unwrap();
        }
        nfa.add_transition(Transition::with_symbols("p", "q", ["a", "E"]))
            .unwrap();
        assert_eq!(nfa.epsilon_closure(&set(&["p"])), set(&["p", "q"]));
        assert_eq!(nfa.move_on_symbol(&set(&["p"]), "a"), set(&["q"]));
    }

    #[test]
    fn test_targets_outlive_symbol() {
        let nfa = chain();
        let index = GraphIndex::new(&nfa);

        // The slice borrows the index, not the symbol used to look it up
        let targets = {
            let symbol = String::from("a");
            index.targets(2, &symbol)
        };
        assert_eq!(targets, &[3]);
        assert!(index.targets(0, "a").is_empty());
        assert!(index.targets(2, "b").is_empty());
    }

    #[test]
    fn test_move_on_symbol_closes_result() {
        let nfa = chain();
        let start = nfa.epsilon_closure(&set(&["0"]));
        assert_eq!(
            nfa.move_on_symbol(&start, "a"),
            set(&["0", "1", "2", "3"])
        );
        assert!(nfa.move_on_symbol(&start, "b").is_empty());
    }
}
