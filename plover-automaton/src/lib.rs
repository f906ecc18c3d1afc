// Plover Automaton - Finite automaton model and simulation
//
// This crate implements the automaton model shared by every other Plover
// component. It handles:
// - States, transitions and the alphabet (arena keyed by state id)
// - Container invariants (endpoint existence, single initial state)
// - Determinism enforcement for DFA-tagged automata
// - Epsilon-closure and symbol moves
// - String simulation (acceptance, tracing, step-wise execution)

mod automaton;
mod closure;
mod simulator;
mod state;

pub use automaton::{Automaton, AutomatonKind, TransitionRow};
pub use closure::GraphIndex;
pub use simulator::{Simulation, SimulationStatus, Trace, TraceOutcome, TraceStep};
pub use state::{is_epsilon, normalize_symbol, State, StateId, StateSet, Transition, EPSILON, EPSILON_GLYPH};

use thiserror::Error;

/// Which determinism rule a rejected transition would have broken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeterminismRule {
    /// The source state already has a transition on this symbol
    DuplicateSymbol,

    /// Epsilon transitions are not allowed in a DFA
    EpsilonTransition,
}

impl std::fmt::Display for DeterminismRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeterminismRule::DuplicateSymbol => f.write_str("symbol already used from this state"),
            DeterminismRule::EpsilonTransition => f.write_str("epsilon transitions are not allowed"),
        }
    }
}

/// Errors that can occur when mutating or running an automaton
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AutomatonError {
    #[error("Unknown state: {state_id}")]
    UnknownState { state_id: String },

    #[error("State already exists: {state_id}")]
    DuplicateState { state_id: String },

    #[error("Transition must carry at least one symbol")]
    EmptySymbols,

    #[error("Determinism violation at state {state_id} on '{symbol}': {rule}")]
    DeterminismViolation {
        state_id: String,
        symbol: String,
        rule: DeterminismRule,
    },

    #[error("No transition {from} --{symbol}--> {to}")]
    UnknownTransition {
        from: String,
        to: String,
        symbol: String,
    },

    #[error("Automaton has no initial state")]
    NoInitialState,
}

impl AutomatonError {
    pub fn unknown_state(state_id: impl Into<String>) -> Self {
        AutomatonError::UnknownState {
            state_id: state_id.into(),
        }
    }

    /// True for errors that reject a mutation because of a missing or
    /// conflicting state/transition reference.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            AutomatonError::UnknownState { .. }
                | AutomatonError::DuplicateState { .. }
                | AutomatonError::EmptySymbols
                | AutomatonError::UnknownTransition { .. }
        )
    }
}

/// Result type for automaton operations
pub type AutomatonResult<T> = Result<T, AutomatonError>;
