// DFA minimizer
//
// Three passes over the input DFA:
// 1. Reachability: breadth-first from the initial state, dropping anything
//    the initial state cannot reach.
// 2. Table filling: pairs are marked distinguishable starting from
//    (final, non-final) and propagated backwards through per-symbol
//    predecessor lists with a worklist. A missing transition is its own
//    class, distinguishable from every real successor.
// 3. Rebuild: unmarked pairs are equivalent; one state is created per
//    equivalence class and wired through any member's successors.

use crate::{set_label, MinimizationError, MinimizationResult};
use plover_automaton::{Automaton, AutomatonKind, GraphIndex, State, Transition};
use smallvec::SmallVec;
use std::collections::VecDeque;
use tracing::debug;

type Row = SmallVec<[Option<usize>; 8]>;

/// DFA minimizer
#[derive(Debug, Clone, Default)]
pub struct DfaMinimizer;

impl DfaMinimizer {
    pub fn new() -> Self {
        Self
    }

    /// Produce the minimal equivalent of a DFA.
    ///
    /// The input must be DFA-tagged, structurally deterministic and have an
    /// initial state. States of the result are named `q0, q1, ...` in
    /// breadth-first order from the initial state and labelled with the
    /// original states they merge.
    pub fn minimize(&self, dfa: &Automaton) -> MinimizationResult<Automaton> {
        if !dfa.is_valid() {
            return Err(MinimizationError::InvalidInput(
                "automaton has no valid initial state".to_string(),
            ));
        }
        if !dfa.is_dfa() {
            return Err(MinimizationError::NotDeterministic {
                reason: format!("automaton is tagged {}", dfa.kind()),
            });
        }
        dfa.check_deterministic()
            .map_err(|e| MinimizationError::NotDeterministic {
                reason: e.to_string(),
            })?;

        let index = GraphIndex::new(dfa);
        let initial = index.initial().ok_or_else(|| {
            MinimizationError::InvalidInput("automaton has no valid initial state".to_string())
        })?;
        let symbols: Vec<&str> = dfa.alphabet().iter().map(String::as_str).collect();

        let reachable = reachable_states(&index, initial, &symbols);
        let successors = successor_table(&index, &reachable, &symbols);
        let accepting: Vec<bool> = reachable.iter().map(|&s| index.is_accepting(s)).collect();

        let marked = distinguishable_pairs(&successors, &accepting, symbols.len());
        let (class_of, class_count) = equivalence_classes(&marked, reachable.len());

        debug!(
            automaton = dfa.id(),
            states = dfa.state_count(),
            reachable = reachable.len(),
            classes = class_count,
            "Minimizing DFA"
        );

        let mut minimized = Automaton::new(
            format!("{}_min", dfa.id()),
            format!("{} (Minimized)", dfa.name()),
            AutomatonKind::Dfa,
        );

        for &symbol in &symbols {
            minimized.add_symbol(symbol);
        }

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); class_count];
        for (local, &class) in class_of.iter().enumerate() {
            members[class].push(local);
        }

        // Reachable index 0 is the initial state, so it always lands in class 0
        for (class, group) in members.iter().enumerate() {
            let label = set_label(group.iter().map(|&l| index.state_id(reachable[l])));
            let mut state = State::new(state_name(class)).with_label(label);
            if class == class_of[0] {
                state = state.initial();
            }
            if group.iter().any(|&l| accepting[l]) {
                state = state.accepting();
            }
            minimized.add_state(state)?;
        }

        for (class, group) in members.iter().enumerate() {
            let Some(&representative) = group.first() else {
                continue;
            };
            for (k, symbol) in symbols.iter().enumerate() {
                if let Some(target) = successors[representative][k] {
                    minimized.add_transition(Transition::new(
                        state_name(class),
                        state_name(class_of[target]),
                        symbol,
                    ))?;
                }
            }
        }

        debug!(
            automaton = dfa.id(),
            states = minimized.state_count(),
            transitions = minimized.transition_count(),
            "Minimization complete"
        );

        Ok(minimized)
    }
}

/// Breadth-first reachable states, initial first.
fn reachable_states(index: &GraphIndex<'_>, initial: usize, symbols: &[&str]) -> Vec<usize> {
    let mut seen = vec![false; index.len()];
    let mut order = Vec::new();
    let mut queue = VecDeque::from([initial]);
    seen[initial] = true;

    while let Some(state) = queue.pop_front() {
        order.push(state);
        for &symbol in symbols {
            for &next in index.targets(state, symbol) {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
    }

    order
}

/// Successor of every reachable state on every symbol, in local numbering.
fn successor_table(index: &GraphIndex<'_>, reachable: &[usize], symbols: &[&str]) -> Vec<Row> {
    let mut local = vec![None; index.len()];
    for (position, &state) in reachable.iter().enumerate() {
        local[state] = Some(position);
    }

    reachable
        .iter()
        .map(|&state| {
            symbols
                .iter()
                .map(|symbol| {
                    index
                        .targets(state, symbol)
                        .first()
                        .and_then(|&t| local[t])
                })
                .collect()
        })
        .collect()
}

/// Symmetric relation over state pairs, stored as a lower triangle
struct PairTable {
    bits: Vec<bool>,
}

impl PairTable {
    fn new(n: usize) -> Self {
        Self {
            bits: vec![false; n * (n + 1) / 2],
        }
    }

    fn slot(p: usize, q: usize) -> usize {
        let (hi, lo) = if p >= q { (p, q) } else { (q, p) };
        hi * (hi + 1) / 2 + lo
    }

    fn contains(&self, p: usize, q: usize) -> bool {
        self.bits[Self::slot(p, q)]
    }

    /// Mark a pair. Returns false if it was already marked.
    fn mark(&mut self, p: usize, q: usize) -> bool {
        let slot = Self::slot(p, q);
        !std::mem::replace(&mut self.bits[slot], true)
    }
}

/// Worklist table filling.
///
/// Index `n` stands for "no successor": it loops to itself on every symbol
/// and is distinguishable from every real state. Each pair is marked once;
/// marking `(a, b)` pushes every pair of predecessors on a common symbol.
fn distinguishable_pairs(successors: &[Row], accepting: &[bool], symbol_count: usize) -> PairTable {
    let n = successors.len();
    let sink = n;
    let next = |p: usize, k: usize| -> usize {
        if p == sink {
            sink
        } else {
            successors[p][k].unwrap_or(sink)
        }
    };

    // predecessors[k][t]: states moving to t on symbol k
    let mut predecessors: Vec<Vec<SmallVec<[usize; 2]>>> =
        vec![vec![SmallVec::new(); n + 1]; symbol_count];
    for (k, by_target) in predecessors.iter_mut().enumerate() {
        for p in 0..=n {
            by_target[next(p, k)].push(p);
        }
    }

    let mut marked = PairTable::new(n + 1);
    let mut worklist: Vec<(usize, usize)> = Vec::new();

    for p in 0..n {
        if marked.mark(p, sink) {
            worklist.push((p, sink));
        }
        for q in (p + 1)..n {
            if accepting[p] != accepting[q] && marked.mark(p, q) {
                worklist.push((p, q));
            }
        }
    }

    while let Some((a, b)) = worklist.pop() {
        for by_target in &predecessors {
            for &p in &by_target[a] {
                for &q in &by_target[b] {
                    if p != q && marked.mark(p, q) {
                        worklist.push((p, q));
                    }
                }
            }
        }
    }

    marked
}

/// Group the first `n` states by unmarked pairs. Classes are numbered by
/// their lowest member.
fn equivalence_classes(marked: &PairTable, n: usize) -> (Vec<usize>, usize) {
    let mut class_of: Vec<Option<usize>> = vec![None; n];
    let mut count = 0;

    for p in 0..n {
        if class_of[p].is_some() {
            continue;
        }
        class_of[p] = Some(count);
        for q in (p + 1)..n {
            if class_of[q].is_none() && !marked.contains(p, q) {
                class_of[q] = Some(count);
            }
        }
        count += 1;
    }

    (class_of.into_iter().map(|c| c.unwrap_or(0)).collect(), count)
}

fn state_name(n: usize) -> String {
    format!("q{}", n)
}
