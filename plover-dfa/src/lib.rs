// Plover DFA - NFA to DFA conversion and DFA minimization
//!
// This crate turns automata into deterministic form and reduces them:
// - Subset construction (NFA -> DFA) with a configurable state cap
// - Minimization by reachability pruning and table filling
//
// Both algorithms read their input through a shared reference and always
// return a new automaton.

mod converter;
mod minimizer;

pub use converter::SubsetConstructor;
pub use minimizer::DfaMinimizer;

use plover_automaton::AutomatonError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from subset construction
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Cannot convert automaton: {0}")]
    InvalidInput(String),

    #[error("DFA state limit exceeded: {states} states (max: {max})")]
    StateLimitExceeded { states: usize, max: usize },

    #[error("Failed to build DFA: {0}")]
    Automaton(#[from] AutomatonError),
}

/// Errors from minimization
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MinimizationError {
    #[error("Cannot minimize automaton: {0}")]
    InvalidInput(String),

    #[error("Automaton is not a DFA: {reason}")]
    NotDeterministic { reason: String },

    #[error("Failed to build minimized DFA: {0}")]
    Automaton(#[from] AutomatonError),
}

/// Result type for subset construction
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Result type for minimization
pub type MinimizationResult<T> = Result<T, MinimizationError>;

/// Configuration for subset construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsetConfig {
    /// Maximum DFA states to create (0 = unlimited)
    pub max_states: usize,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        Self { max_states: 10_000 }
    }
}

/// Label for a state standing for a set of original states: `{a,b,c}`
pub(crate) fn set_label<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ids: Vec<&str> = ids.into_iter().collect();
    ids.sort_unstable();
    format!("{{{}}}", ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        assert_eq!(SubsetConfig::default().max_states, 10_000);
    }

    #[test]
    fn test_error_display() {
        let err = ConversionError::StateLimitExceeded { states: 11, max: 10 };
        assert_eq!(err.to_string(), "DFA state limit exceeded: 11 states (max: 10)");

        let err = MinimizationError::NotDeterministic {
            reason: "epsilon".to_string(),
        };
        assert!(err.to_string().contains("epsilon"));
    }

    #[test]
    fn test_set_label() {
        assert_eq!(set_label(["q2", "q0", "q1"]), "{q0,q1,q2}");
        assert_eq!(set_label(Vec::<&str>::new()), "{}");
    }
}
