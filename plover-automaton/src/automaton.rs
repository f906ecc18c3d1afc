// Automaton container
//
// Owns every state and transition of one automaton and enforces the
// container invariants at the mutation boundary:
// - transition endpoints always reference existing states
// - at most one state carries the initial flag
// - DFA-tagged automata never receive nondeterministic or epsilon edges
//
// Failing mutations leave the automaton unchanged.

use crate::state::{is_epsilon, normalize_symbol, State, StateId, StateSet, Transition};
use crate::{AutomatonError, AutomatonResult, DeterminismRule};
use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, trace};

/// Automaton type tag, set by whoever creates the automaton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomatonKind {
    Dfa,
    Nfa,
}

impl fmt::Display for AutomatonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomatonKind::Dfa => f.write_str("DFA"),
            AutomatonKind::Nfa => f.write_str("NFA"),
        }
    }
}

/// One row of the transition table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRow {
    pub from: StateId,
    pub symbols: String,
    pub to: StateId,
}

/// A finite automaton (DFA or NFA)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Automaton {
    id: String,
    name: String,
    kind: AutomatonKind,

    /// States keyed by id, in insertion order
    states: IndexMap<StateId, State>,

    transitions: Vec<Transition>,

    /// Input symbols, never contains epsilon
    alphabet: BTreeSet<String>,

    initial_state: Option<StateId>,
}

impl Automaton {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: AutomatonKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            states: IndexMap::new(),
            transitions: Vec::new(),
            alphabet: BTreeSet::new(),
            initial_state: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> AutomatonKind {
        self.kind
    }

    /// Tag-based check; see [`Automaton::check_deterministic`] for the structural one
    pub fn is_dfa(&self) -> bool {
        self.kind == AutomatonKind::Dfa
    }

    pub fn is_nfa(&self) -> bool {
        self.kind == AutomatonKind::Nfa
    }

    /// An automaton is runnable once its initial state is set and exists
    pub fn is_valid(&self) -> bool {
        self.initial_state
            .as_deref()
            .is_some_and(|id| self.states.contains_key(id))
    }

    // ---------------------------------------------------------------------
    // States
    // ---------------------------------------------------------------------

    /// Add a state. A state built with [`State::initial`] becomes the
    /// automaton's initial state, clearing any previous one.
    pub fn add_state(&mut self, state: State) -> AutomatonResult<()> {
        if self.states.contains_key(state.id()) {
            return Err(AutomatonError::DuplicateState {
                state_id: state.id().to_string(),
            });
        }

        trace!(automaton = %self.id, state_id = state.id(), "Adding state");

        let id = state.id().to_string();
        let initial = state.is_initial();
        self.states.insert(id.clone(), state);

        if initial {
            self.set_initial_state(&id)?;
        }

        Ok(())
    }

    /// Remove a state together with every transition touching it.
    pub fn remove_state(&mut self, state_id: &str) -> AutomatonResult<State> {
        let state = self
            .states
            .shift_remove(state_id)
            .ok_or_else(|| AutomatonError::unknown_state(state_id))?;

        let before = self.transitions.len();
        self.transitions.retain(|t| !t.touches(state_id));

        if self.initial_state.as_deref() == Some(state_id) {
            self.initial_state = None;
        }

        debug!(
            automaton = %self.id,
            state_id,
            removed_transitions = before - self.transitions.len(),
            "Removed state"
        );

        Ok(state)
    }

    pub fn get_state(&self, state_id: &str) -> Option<&State> {
        self.states.get(state_id)
    }

    pub fn contains_state(&self, state_id: &str) -> bool {
        self.states.contains_key(state_id)
    }

    /// States in insertion order
    pub fn states(&self) -> impl Iterator<Item = &State> + '_ {
        self.states.values()
    }

    pub fn state_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.keys().map(String::as_str)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Position of a state in insertion order
    pub(crate) fn state_index(&self, state_id: &str) -> Option<usize> {
        self.states.get_index_of(state_id)
    }

    pub(crate) fn state_at(&self, index: usize) -> Option<&State> {
        self.states.get_index(index).map(|(_, state)| state)
    }

    /// Set the initial state, clearing the previous initial flag.
    pub fn set_initial_state(&mut self, state_id: &str) -> AutomatonResult<()> {
        if !self.states.contains_key(state_id) {
            return Err(AutomatonError::unknown_state(state_id));
        }

        if let Some(previous) = self.initial_state.take() {
            if let Some(state) = self.states.get_mut(&previous) {
                state.set_initial(false);
            }
        }

        if let Some(state) = self.states.get_mut(state_id) {
            state.set_initial(true);
        }
        self.initial_state = Some(state_id.to_string());

        Ok(())
    }

    pub fn initial_state(&self) -> Option<&str> {
        self.initial_state.as_deref()
    }

    pub fn set_final(&mut self, state_id: &str, is_final: bool) -> AutomatonResult<()> {
        let state = self
            .states
            .get_mut(state_id)
            .ok_or_else(|| AutomatonError::unknown_state(state_id))?;
        state.set_final(is_final);
        Ok(())
    }

    pub fn set_label(&mut self, state_id: &str, label: impl Into<String>) -> AutomatonResult<()> {
        let state = self
            .states
            .get_mut(state_id)
            .ok_or_else(|| AutomatonError::unknown_state(state_id))?;
        state.set_label(label.into());
        Ok(())
    }

    pub fn final_states(&self) -> StateSet {
        self.states
            .values()
            .filter(|s| s.is_final())
            .map(|s| s.id().to_string())
            .collect()
    }

    // ---------------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------------

    /// Check whether a transition could be added without changing anything.
    pub fn can_add_transition(&self, transition: &Transition) -> AutomatonResult<()> {
        if transition.symbols().is_empty() {
            return Err(AutomatonError::EmptySymbols);
        }

        for endpoint in [transition.from(), transition.to()] {
            if !self.states.contains_key(endpoint) {
                return Err(AutomatonError::unknown_state(endpoint));
            }
        }

        if self.is_dfa() {
            self.check_dfa_edge(transition)?;
        }

        Ok(())
    }

    fn check_dfa_edge(&self, transition: &Transition) -> AutomatonResult<()> {
        let from = transition.from();

        if transition.has_epsilon() {
            return Err(AutomatonError::DeterminismViolation {
                state_id: from.to_string(),
                symbol: crate::EPSILON.to_string(),
                rule: DeterminismRule::EpsilonTransition,
            });
        }

        for existing in self.transitions_from(from) {
            // Re-adding a symbol on the same edge is a no-op, not a conflict
            if existing.to() == transition.to() {
                continue;
            }
            if let Some(symbol) = transition
                .symbols()
                .iter()
                .find(|s| existing.has_symbol(s))
            {
                return Err(AutomatonError::DeterminismViolation {
                    state_id: from.to_string(),
                    symbol: symbol.clone(),
                    rule: DeterminismRule::DuplicateSymbol,
                });
            }
        }

        Ok(())
    }

    /// Add a transition. Symbols of an existing transition with the same
    /// endpoints are merged; new input symbols join the alphabet.
    pub fn add_transition(&mut self, transition: Transition) -> AutomatonResult<()> {
        self.can_add_transition(&transition)?;

        trace!(
            automaton = %self.id,
            from = transition.from(),
            to = transition.to(),
            symbols = %transition.symbols_string(),
            "Adding transition"
        );

        self.alphabet
            .extend(transition.input_symbols().map(str::to_string));

        match self
            .transitions
            .iter_mut()
            .find(|t| t.connects(transition.from(), transition.to()))
        {
            Some(existing) => existing.merge_symbols(transition.symbols()),
            None => self.transitions.push(transition),
        }

        Ok(())
    }

    /// Remove one symbol from the transition between `from` and `to`.
    /// The transition disappears once its last symbol is gone.
    pub fn remove_transition(&mut self, from: &str, to: &str, symbol: &str) -> AutomatonResult<()> {
        let symbol = normalize_symbol(symbol);
        let position = self
            .transitions
            .iter()
            .position(|t| t.connects(from, to) && t.has_symbol(&symbol))
            .ok_or_else(|| AutomatonError::UnknownTransition {
                from: from.to_string(),
                to: to.to_string(),
                symbol: symbol.clone(),
            })?;

        let transition = &mut self.transitions[position];
        transition.remove_symbol(&symbol);
        if transition.symbols().is_empty() {
            self.transitions.remove(position);
        }

        Ok(())
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transitions_from<'a>(&'a self, state_id: &'a str) -> impl Iterator<Item = &'a Transition> + 'a {
        self.transitions.iter().filter(move |t| t.from() == state_id)
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn transition_table(&self) -> Vec<TransitionRow> {
        self.transitions
            .iter()
            .map(|t| TransitionRow {
                from: t.from().to_string(),
                symbols: t.symbols_string(),
                to: t.to().to_string(),
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Alphabet
    // ---------------------------------------------------------------------

    pub fn alphabet(&self) -> &BTreeSet<String> {
        &self.alphabet
    }

    /// Declare an input symbol. Epsilon is never part of the alphabet.
    pub fn add_symbol(&mut self, symbol: &str) -> bool {
        if is_epsilon(symbol) {
            return false;
        }
        self.alphabet.insert(symbol.to_string())
    }

    /// Remove every state, transition and symbol. Id, name and kind stay.
    pub fn clear(&mut self) {
        self.states.clear();
        self.transitions.clear();
        self.alphabet.clear();
        self.initial_state = None;
    }

    // ---------------------------------------------------------------------
    // Structural checks
    // ---------------------------------------------------------------------

    /// Verify the structure is deterministic regardless of the kind tag:
    /// no epsilon transitions and at most one transition per symbol per state.
    pub fn check_deterministic(&self) -> AutomatonResult<()> {
        let mut seen: AHashSet<(&str, &str)> = AHashSet::default();

        for transition in &self.transitions {
            if transition.has_epsilon() {
                return Err(AutomatonError::DeterminismViolation {
                    state_id: transition.from().to_string(),
                    symbol: crate::EPSILON.to_string(),
                    rule: DeterminismRule::EpsilonTransition,
                });
            }

            for symbol in transition.symbols() {
                if !seen.insert((transition.from(), symbol.as_str())) {
                    return Err(AutomatonError::DeterminismViolation {
                        state_id: transition.from().to_string(),
                        symbol: symbol.clone(),
                        rule: DeterminismRule::DuplicateSymbol,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn is_structurally_deterministic(&self) -> bool {
        self.check_deterministic().is_ok()
    }
}
