//! Plover Regex Compiler
//!
//! Compiles a regular expression into an NFA using Thompson construction.
//!
//! Pipeline: tokenize and validate, insert explicit concatenation, convert
//! to postfix with an operator-precedence stack, then evaluate the postfix
//! sequence over a stack of NFA fragments.
//!
//! Supported syntax: literals (any non-operator character), `|`, `*`, `+`,
//! `?`, parentheses and implicit concatenation. `E` or `ε` is the empty
//! string.

pub mod compiler;
pub mod error;
pub mod postfix;
pub mod thompson;
pub mod token;

// Re-exports
pub use compiler::{compile, validate, CompilerConfig, RegexCompiler};
pub use error::{CompileError, Result, SyntaxError};
pub use token::Token;
