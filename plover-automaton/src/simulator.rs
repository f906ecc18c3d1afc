// Simulator - runs input strings against an automaton
//
// Execution always tracks a set of active states, so DFA and NFA share one
// implementation: a DFA simply never has more than one active state.
// Every input character is one symbol.

use crate::automaton::Automaton;
use crate::closure::GraphIndex;
use crate::state::StateSet;
use crate::{AutomatonError, AutomatonResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// One consumed symbol in a trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Zero-based position of the symbol in the input
    pub index: usize,

    pub symbol: String,

    /// Active states before reading the symbol
    pub before: StateSet,

    /// Active states after the move and epsilon-closure
    pub after: StateSet,
}

/// How a traced run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceOutcome {
    /// All input consumed and at least one active state is final
    Accepted { final_states: StateSet },

    /// All input consumed, no active state is final
    Rejected { states: StateSet },

    /// No state had a transition on `symbol`; the run stopped early
    Dead {
        index: usize,
        symbol: String,
        states: StateSet,
    },
}

/// Full execution trace of one input string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub input: String,

    /// Epsilon-closure of the initial state
    pub start: StateSet,

    pub steps: Vec<TraceStep>,

    pub outcome: TraceOutcome,
}

impl Trace {
    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, TraceOutcome::Accepted { .. })
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.outcome, TraceOutcome::Dead { .. })
    }
}

impl Automaton {
    /// Run `input` and report whether it ends in a final state.
    ///
    /// An automaton without a valid initial state accepts nothing.
    pub fn accepts(&self, input: &str) -> bool {
        let index = GraphIndex::new(self);
        let Some(initial) = index.initial() else {
            debug!(automaton = %self.id(), "accepts() on automaton without initial state");
            return false;
        };

        let mut active = index.epsilon_closure([initial]);
        let mut buf = [0u8; 4];

        for c in input.chars() {
            let symbol: &str = c.encode_utf8(&mut buf);
            active = index.move_on_symbol(&active, symbol);
            if active.is_empty() {
                return false;
            }
        }

        index.any_accepting(&active)
    }

    /// Run `input` recording the active set around every symbol.
    pub fn trace(&self, input: &str) -> AutomatonResult<Trace> {
        let index = GraphIndex::new(self);
        let initial = index.initial().ok_or(AutomatonError::NoInitialState)?;

        let mut active = index.epsilon_closure([initial]);
        let start = index.to_state_set(&active);
        let mut steps = Vec::with_capacity(input.chars().count());

        for (position, c) in input.chars().enumerate() {
            let symbol = c.to_string();
            let moved = index.step(&active, &symbol);

            if moved.is_empty() {
                trace!(position, %symbol, "Trace hit dead end");
                return Ok(Trace {
                    input: input.to_string(),
                    start,
                    steps,
                    outcome: TraceOutcome::Dead {
                        index: position,
                        symbol,
                        states: index.to_state_set(&active),
                    },
                });
            }

            let next = index.epsilon_closure(moved);
            steps.push(TraceStep {
                index: position,
                symbol,
                before: index.to_state_set(&active),
                after: index.to_state_set(&next),
            });
            active = next;
        }

        let outcome = if index.any_accepting(&active) {
            TraceOutcome::Accepted {
                final_states: active
                    .iter()
                    .filter(|&&s| index.is_accepting(s))
                    .map(|&s| index.state_id(s).to_string())
                    .collect(),
            }
        } else {
            TraceOutcome::Rejected {
                states: index.to_state_set(&active),
            }
        };

        Ok(Trace {
            input: input.to_string(),
            start,
            steps,
            outcome,
        })
    }
}

/// State of a step-wise simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStatus {
    /// Input remains to be consumed
    Running,

    /// Input exhausted in a final state
    Accepted,

    /// Input exhausted without a final state
    Rejected,

    /// The active set became empty
    Dead,
}

impl SimulationStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, SimulationStatus::Running)
    }
}

/// Step-wise execution of one input string
pub struct Simulation<'a> {
    index: GraphIndex<'a>,
    input: Vec<char>,
    position: usize,
    active: Vec<usize>,
    status: SimulationStatus,
}

impl<'a> Simulation<'a> {
    /// Prepare a run positioned before the first symbol.
    pub fn new(automaton: &'a Automaton, input: &str) -> AutomatonResult<Self> {
        let index = GraphIndex::new(automaton);
        if index.initial().is_none() {
            return Err(AutomatonError::NoInitialState);
        }

        let mut simulation = Self {
            index,
            input: input.chars().collect(),
            position: 0,
            active: Vec::new(),
            status: SimulationStatus::Running,
        };
        simulation.reset();
        Ok(simulation)
    }

    /// Rewind to the start of the input.
    pub fn reset(&mut self) {
        self.position = 0;
        self.active = match self.index.initial() {
            Some(initial) => self.index.epsilon_closure([initial]),
            None => Vec::new(),
        };
        self.status = self.settle();
    }

    /// Consume one symbol. Finished simulations are left untouched.
    pub fn step(&mut self) -> SimulationStatus {
        if self.status.is_finished() {
            return self.status;
        }

        let symbol = self.input[self.position].to_string();
        self.active = self.index.move_on_symbol(&self.active, &symbol);
        self.position += 1;

        self.status = if self.active.is_empty() {
            SimulationStatus::Dead
        } else {
            self.settle()
        };

        trace!(
            position = self.position,
            %symbol,
            active = self.active.len(),
            status = ?self.status,
            "Simulation step"
        );

        self.status
    }

    /// Step until the simulation finishes.
    pub fn run(&mut self) -> SimulationStatus {
        while !self.status.is_finished() {
            self.step();
        }
        self.status
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    /// Number of symbols consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Next symbol to be consumed, if any
    pub fn next_symbol(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    pub fn active_states(&self) -> StateSet {
        self.index.to_state_set(&self.active)
    }

    fn settle(&self) -> SimulationStatus {
        if self.position < self.input.len() {
            SimulationStatus::Running
        } else if self.index.any_accepting(&self.active) {
            SimulationStatus::Accepted
        } else {
            SimulationStatus::Rejected
        }
    }
}
