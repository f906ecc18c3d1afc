// Automaton building blocks
//
// This module defines the values an automaton owns:
// - State: identifier, display label, initial/final flags
// - Transition: endpoints plus a non-empty symbol set
// - The epsilon symbol and its normalization

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a state inside its automaton
pub type StateId = String;

/// Ordered set of state ids (closures, active sets, subset labels)
pub type StateSet = BTreeSet<StateId>;

/// Distinguished symbol for the empty string
pub const EPSILON: &str = "E";

/// Alternate spelling of [`EPSILON`], normalized on insertion
pub const EPSILON_GLYPH: &str = "ε";

/// Check whether a symbol denotes epsilon
#[inline]
pub fn is_epsilon(symbol: &str) -> bool {
    symbol == EPSILON || symbol == EPSILON_GLYPH
}

/// Map the epsilon glyph onto [`EPSILON`], leaving other symbols untouched
pub fn normalize_symbol(symbol: &str) -> String {
    if is_epsilon(symbol) {
        EPSILON.to_string()
    } else {
        symbol.to_string()
    }
}

/// A single automaton state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    id: StateId,
    label: String,
    is_initial: bool,
    is_final: bool,
}

impl State {
    /// Create a non-initial, non-final state labelled with its id
    pub fn new(id: impl Into<StateId>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            is_initial: false,
            is_final: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Mark the state as initial once it is added to an automaton
    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    pub fn accepting(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub(crate) fn set_initial(&mut self, initial: bool) {
        self.is_initial = initial;
    }

    pub(crate) fn set_final(&mut self, is_final: bool) {
        self.is_final = is_final;
    }
}

/// A labelled edge between two states
///
/// Several symbols on one transition behave exactly like separate
/// transitions with the same endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    from: StateId,
    to: StateId,
    symbols: BTreeSet<String>,
}

impl Transition {
    /// Create a transition on a single symbol
    pub fn new(from: impl Into<StateId>, to: impl Into<StateId>, symbol: &str) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            symbols: BTreeSet::from([normalize_symbol(symbol)]),
        }
    }

    /// Create an epsilon transition
    pub fn epsilon(from: impl Into<StateId>, to: impl Into<StateId>) -> Self {
        Self::new(from, to, EPSILON)
    }

    /// Create a transition on several symbols
    pub fn with_symbols<I, S>(from: impl Into<StateId>, to: impl Into<StateId>, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            from: from.into(),
            to: to.into(),
            symbols: symbols
                .into_iter()
                .map(|s| normalize_symbol(s.as_ref()))
                .collect(),
        }
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    /// A transition whose only symbol is epsilon
    pub fn is_epsilon(&self) -> bool {
        self.symbols.len() == 1 && self.symbols.contains(EPSILON)
    }

    /// True if any of the symbols is epsilon
    pub fn has_epsilon(&self) -> bool {
        self.symbols.contains(EPSILON)
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    /// Non-epsilon symbols
    pub fn input_symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbols
            .iter()
            .map(String::as_str)
            .filter(|s| !is_epsilon(s))
    }

    /// Symbols joined with commas, sorted
    pub fn symbols_string(&self) -> String {
        self.symbols.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }

    pub(crate) fn connects(&self, from: &str, to: &str) -> bool {
        self.from == from && self.to == to
    }

    pub(crate) fn touches(&self, state_id: &str) -> bool {
        self.from == state_id || self.to == state_id
    }

    pub(crate) fn merge_symbols(&mut self, symbols: &BTreeSet<String>) {
        self.symbols.extend(symbols.iter().cloned());
    }

    pub(crate) fn remove_symbol(&mut self, symbol: &str) -> bool {
        self.symbols.remove(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_builder() {
        let state = State::new("q0").with_label("start").initial().accepting();
        assert_eq!(state.id(), "q0");
        assert_eq!(state.label(), "start");
        assert!(state.is_initial());
        assert!(state.is_final());

        let plain = State::new("q1");
        assert_eq!(plain.label(), "q1");
        assert!(!plain.is_initial());
        assert!(!plain.is_final());
    }

    #[test]
    fn test_epsilon_glyph_normalized() {
        let t = Transition::new("a", "b", EPSILON_GLYPH);
        assert!(t.is_epsilon());
        assert!(t.has_symbol(EPSILON));
        assert_eq!(t.symbols_string(), "E");
    }

    #[test]
    fn test_multi_symbol_transition() {
        let t = Transition::with_symbols("a", "b", ["y", "x", EPSILON]);
        assert!(!t.is_epsilon());
        assert!(t.has_epsilon());
        assert_eq!(t.input_symbols().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(t.symbols_string(), "E,x,y");
    }
}
