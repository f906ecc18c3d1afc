//! Error types for the regex compiler

use plover_automaton::AutomatonError;
use thiserror::Error;

/// Pattern rejected by validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("Regex cannot be empty")]
    Empty,

    #[error("Unmatched closing parenthesis at position {position}")]
    UnmatchedClose { position: usize },

    #[error("Unmatched opening parenthesis at position {position}")]
    UnmatchedOpen { position: usize },

    #[error("Invalid operator '{operator}' at start")]
    LeadingOperator { operator: char },
}

impl SyntaxError {
    /// Character position the error points at
    pub fn position(&self) -> Option<usize> {
        match self {
            SyntaxError::Empty => None,
            SyntaxError::UnmatchedClose { position } | SyntaxError::UnmatchedOpen { position } => {
                Some(*position)
            }
            SyntaxError::LeadingOperator { .. } => Some(0),
        }
    }
}

/// Compilation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// An operator found too few fragments on the stack
    #[error("Operator '{operator}' at position {position} is missing an operand")]
    MissingOperand { operator: char, position: usize },

    /// More than one fragment was left after evaluating the postfix sequence
    #[error("Malformed expression: {count} fragments left unconnected")]
    DanglingFragments { count: usize },

    /// The expression produced no fragment at all, e.g. `()`
    #[error("Expression does not match anything")]
    EmptyExpression,

    #[error("Failed to assemble automaton: {0}")]
    Automaton(#[from] AutomatonError),
}

/// Result type for compilation
pub type Result<T> = std::result::Result<T, CompileError>;
