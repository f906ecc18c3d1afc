// Regex compiler
//
// Drives the pipeline from pattern text to an NFA and assembles the final
// Thompson fragment into an Automaton.

use crate::error::{Result, SyntaxError};
use crate::postfix::to_postfix;
use crate::thompson::{Builder, Fragment, Label};
use crate::token::{check_syntax, insert_concat, render, tokenize};
use plover_automaton::{Automaton, AutomatonKind, State, Transition, EPSILON};
use tracing::debug;

/// Compiler configuration
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Prefix for generated state ids (`q0`, `q1`, ...)
    pub state_prefix: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            state_prefix: "q".to_string(),
        }
    }
}

/// Regex to NFA compiler
#[derive(Debug, Clone, Default)]
pub struct RegexCompiler {
    config: CompilerConfig,
}

impl RegexCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Check a pattern without building anything.
    pub fn validate(&self, pattern: &str) -> std::result::Result<(), SyntaxError> {
        check_syntax(pattern)
    }

    /// Postfix form of a pattern with concatenation shown as `.`
    pub fn postfix(&self, pattern: &str) -> std::result::Result<String, SyntaxError> {
        check_syntax(pattern)?;
        Ok(render(&to_postfix(&insert_concat(&tokenize(pattern)))))
    }

    /// Compile a pattern into an NFA.
    ///
    /// The result has one initial and one final state. Its alphabet holds
    /// every literal of the pattern and never the epsilon symbol.
    pub fn compile(&self, pattern: &str) -> Result<Automaton> {
        check_syntax(pattern)?;

        let postfix = to_postfix(&insert_concat(&tokenize(pattern)));
        debug!(pattern, postfix = %render(&postfix), "Compiling regex");

        let mut builder = Builder::new();
        let fragment = builder.evaluate(&postfix)?;

        let nfa = self.assemble(pattern, &fragment, builder.allocated())?;

        debug!(
            pattern,
            states = nfa.state_count(),
            transitions = nfa.transition_count(),
            "Compiled regex"
        );

        Ok(nfa)
    }

    fn assemble(&self, pattern: &str, fragment: &Fragment, allocated: usize) -> Result<Automaton> {
        let mut nfa = Automaton::new(
            format!("nfa_{}", allocated),
            format!("NFA from /{}/", pattern),
            AutomatonKind::Nfa,
        );

        let mut states = fragment.states.clone();
        states.sort_unstable();

        for n in states {
            let mut state = State::new(self.state_id(n));
            if n == fragment.start {
                state = state.initial();
            }
            if n == fragment.end {
                state = state.accepting();
            }
            nfa.add_state(state)?;
        }

        for edge in &fragment.edges {
            let symbol = match edge.label {
                Label::Symbol(c) => c.to_string(),
                Label::Epsilon => EPSILON.to_string(),
            };
            nfa.add_transition(Transition::new(
                self.state_id(edge.from),
                self.state_id(edge.to),
                &symbol,
            ))?;
        }

        Ok(nfa)
    }

    fn state_id(&self, n: usize) -> String {
        format!("{}{}", self.config.state_prefix, n)
    }
}

/// Compile with the default configuration.
pub fn compile(pattern: &str) -> Result<Automaton> {
    RegexCompiler::default().compile(pattern)
}

/// Validate with the default configuration.
pub fn validate(pattern: &str) -> std::result::Result<(), SyntaxError> {
    check_syntax(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;

    #[test]
    fn test_compile_literal() {
        let nfa = compile("a").unwrap();
        assert!(nfa.is_nfa());
        assert_eq!(nfa.id(), "nfa_2");
        assert_eq!(nfa.name(), "NFA from /a/");
        assert_eq!(nfa.state_count(), 2);
        assert_eq!(nfa.initial_state(), Some("q0"));
        assert_eq!(nfa.final_states().len(), 1);
        assert!(nfa.final_states().contains("q1"));
    }

    #[test]
    fn test_single_initial_and_final() {
        for pattern in ["a*b", "(a|b)+c", "a?b?", "E", "(ab)*|c"] {
            let nfa = compile(pattern).unwrap();
            let initial = nfa.states().filter(|s| s.is_initial()).count();
            assert_eq!(initial, 1, "{pattern}");
            assert_eq!(nfa.final_states().len(), 1, "{pattern}");
        }
    }

    #[test]
    fn test_alphabet_excludes_epsilon() {
        let nfa = compile("a*b|Ec").unwrap();
        let alphabet: Vec<&str> = nfa.alphabet().iter().map(String::as_str).collect();
        assert_eq!(alphabet, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_custom_prefix() {
        let compiler = RegexCompiler::new(CompilerConfig {
            state_prefix: "s".to_string(),
        });
        let nfa = compiler.compile("ab").unwrap();
        assert_eq!(nfa.initial_state(), Some("s0"));
        assert!(nfa.contains_state("s3"));
    }

    #[test]
    fn test_postfix() {
        let compiler = RegexCompiler::default();
        assert_eq!(compiler.postfix("a(b|c)*").unwrap(), "abc|*.");
        assert!(compiler.postfix("(a").is_err());
    }

    #[test]
    fn test_syntax_errors_propagate() {
        assert_eq!(
            compile("*a").unwrap_err(),
            CompileError::Syntax(SyntaxError::LeadingOperator { operator: '*' })
        );
        assert_eq!(compile("").unwrap_err(), CompileError::Syntax(SyntaxError::Empty));
    }
}
