//! Thompson construction over postfix tokens.
//!
//! Fragments live in a small arena: states are plain integers handed out by
//! a [`Builder`], and a fragment owns the states and edges it was built
//! from. Every fragment has exactly one start and one end state; the end
//! state has no outgoing edges until the fragment is combined.

use crate::error::{CompileError, Result};
use crate::token::{Spanned, Token};
use smallvec::SmallVec;

/// Edge label inside a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Symbol(char),
    Epsilon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub label: Label,
}

impl Edge {
    fn epsilon(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            label: Label::Epsilon,
        }
    }
}

/// Partial NFA with a single entry and a single exit
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
    pub states: Vec<usize>,
    pub edges: Vec<Edge>,
}

impl Fragment {
    fn absorb(&mut self, other: Fragment) {
        self.states.extend(other.states);
        self.edges.extend(other.edges);
    }
}

/// Allocates state numbers and combines fragments
#[derive(Debug, Default)]
pub struct Builder {
    next: usize,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of states allocated so far
    pub fn allocated(&self) -> usize {
        self.next
    }

    fn fresh(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    fn single_edge(&mut self, label: Label) -> Fragment {
        let start = self.fresh();
        let end = self.fresh();
        Fragment {
            start,
            end,
            states: vec![start, end],
            edges: vec![Edge {
                from: start,
                to: end,
                label,
            }],
        }
    }

    /// `start --c--> end`
    pub fn literal(&mut self, c: char) -> Fragment {
        self.single_edge(Label::Symbol(c))
    }

    /// `start --E--> end`
    pub fn epsilon(&mut self) -> Fragment {
        self.single_edge(Label::Epsilon)
    }

    /// `a` followed by `b`, joined by an epsilon edge
    pub fn concatenate(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let mut result = Fragment {
            start: a.start,
            end: b.end,
            ..Fragment::default()
        };
        result.edges.push(Edge::epsilon(a.end, b.start));
        result.absorb(a);
        result.absorb(b);
        result
    }

    /// `a | b` with a new start and a new end
    pub fn alternate(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let start = self.fresh();
        let end = self.fresh();
        let mut result = Fragment {
            start,
            end,
            states: vec![start, end],
            edges: vec![
                Edge::epsilon(start, a.start),
                Edge::epsilon(start, b.start),
                Edge::epsilon(a.end, end),
                Edge::epsilon(b.end, end),
            ],
        };
        result.absorb(a);
        result.absorb(b);
        result
    }

    /// Zero or more repetitions of `a`
    pub fn star(&mut self, a: Fragment) -> Fragment {
        let start = self.fresh();
        let end = self.fresh();
        let mut result = Fragment {
            start,
            end,
            states: vec![start, end],
            edges: vec![
                Edge::epsilon(start, a.start),
                Edge::epsilon(start, end),
                Edge::epsilon(a.end, a.start),
                Edge::epsilon(a.end, end),
            ],
        };
        result.absorb(a);
        result
    }

    /// One or more repetitions: a fresh copy of `a` followed by `a*`
    pub fn plus(&mut self, a: Fragment) -> Fragment {
        let first = self.duplicate(&a);
        let rest = self.star(a);
        self.concatenate(first, rest)
    }

    /// Zero or one occurrence of `a`
    pub fn optional(&mut self, a: Fragment) -> Fragment {
        let start = self.fresh();
        let end = self.fresh();
        let mut result = Fragment {
            start,
            end,
            states: vec![start, end],
            edges: vec![
                Edge::epsilon(start, a.start),
                Edge::epsilon(start, end),
                Edge::epsilon(a.end, end),
            ],
        };
        result.absorb(a);
        result
    }

    /// Copy a fragment onto freshly allocated states.
    pub fn duplicate(&mut self, fragment: &Fragment) -> Fragment {
        let mut mapping: Vec<Option<usize>> = vec![None; self.next];
        let mut states = Vec::with_capacity(fragment.states.len());

        for &old in &fragment.states {
            let new = self.fresh();
            if let Some(slot) = mapping.get_mut(old) {
                *slot = Some(new);
            }
            states.push(new);
        }

        let map = |old: usize| mapping.get(old).copied().flatten().unwrap_or(old);

        Fragment {
            start: map(fragment.start),
            end: map(fragment.end),
            edges: fragment
                .edges
                .iter()
                .map(|e| Edge {
                    from: map(e.from),
                    to: map(e.to),
                    label: e.label,
                })
                .collect(),
            states,
        }
    }

    /// Evaluate a postfix token sequence into a single fragment.
    pub fn evaluate(&mut self, postfix: &[Spanned]) -> Result<Fragment> {
        let mut stack: SmallVec<[Fragment; 8]> = SmallVec::new();

        for spanned in postfix {
            let missing = || CompileError::MissingOperand {
                operator: spanned.token.as_char(),
                position: spanned.position,
            };

            let fragment = match spanned.token {
                Token::Literal(c) => self.literal(c),
                Token::Epsilon => self.epsilon(),
                Token::Star | Token::Plus | Token::Optional => {
                    let a = stack.pop().ok_or_else(missing)?;
                    match spanned.token {
                        Token::Star => self.star(a),
                        Token::Plus => self.plus(a),
                        _ => self.optional(a),
                    }
                }
                Token::Union | Token::Concat => {
                    let b = stack.pop().ok_or_else(missing)?;
                    let a = stack.pop().ok_or_else(missing)?;
                    if spanned.token == Token::Union {
                        self.alternate(a, b)
                    } else {
                        self.concatenate(a, b)
                    }
                }
                Token::Open | Token::Close => continue,
            };

            stack.push(fragment);
        }

        match stack.len() {
            0 => Err(CompileError::EmptyExpression),
            1 => stack.pop().ok_or(CompileError::EmptyExpression),
            count => Err(CompileError::DanglingFragments { count }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postfix::to_postfix;
    use crate::token::{insert_concat, tokenize};

    fn build(pattern: &str) -> Result<(Fragment, usize)> {
        let mut builder = Builder::new();
        let postfix = to_postfix(&insert_concat(&tokenize(pattern)));
        let fragment = builder.evaluate(&postfix)?;
        Ok((fragment, builder.allocated()))
    }

    #[test]
    fn test_literal_fragment() {
        let (fragment, count) = build("a").unwrap();
        assert_eq!(count, 2);
        assert_eq!(fragment.states, vec![0, 1]);
        assert_eq!(
            fragment.edges,
            vec![Edge {
                from: 0,
                to: 1,
                label: Label::Symbol('a')
            }]
        );
    }

    #[test]
    fn test_state_counts() {
        // Thompson sizes: literal 2, concat +0, union +2, star +2, optional +2
        assert_eq!(build("ab").unwrap().1, 4);
        assert_eq!(build("a|b").unwrap().1, 6);
        assert_eq!(build("a*").unwrap().1, 4);
        assert_eq!(build("a?").unwrap().1, 4);
        // plus = copy (2) + star (2 + 2)
        assert_eq!(build("a+").unwrap().1, 6);
    }

    #[test]
    fn test_fragment_states_are_unique() {
        let (fragment, count) = build("(a|b)+c?").unwrap();
        let mut states = fragment.states.clone();
        states.sort_unstable();
        states.dedup();
        assert_eq!(states.len(), fragment.states.len());
        assert_eq!(states.len(), count);
        assert!(fragment
            .edges
            .iter()
            .all(|e| states.contains(&e.from) && states.contains(&e.to)));
    }

    #[test]
    fn test_end_state_has_no_outgoing_edges() {
        for pattern in ["a", "a*b", "(ab)+", "a|b?", "E"] {
            let (fragment, _) = build(pattern).unwrap();
            assert!(
                fragment.edges.iter().all(|e| e.from != fragment.end),
                "{pattern}"
            );
        }
    }

    #[test]
    fn test_duplicate_does_not_share_states() {
        let mut builder = Builder::new();
        let a = builder.literal('a');
        let copy = builder.duplicate(&a);
        assert!(copy.states.iter().all(|s| !a.states.contains(s)));
        assert_eq!(copy.edges[0].label, Label::Symbol('a'));
        assert_eq!(copy.edges[0].from, copy.start);
        assert_eq!(copy.edges[0].to, copy.end);
    }

    #[test]
    fn test_missing_operand() {
        assert_eq!(
            build("a|").unwrap_err(),
            CompileError::MissingOperand {
                operator: '|',
                position: 1
            }
        );
        assert!(matches!(
            build("(*)").unwrap_err(),
            CompileError::MissingOperand { operator: '*', .. }
        ));
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(build("()").unwrap_err(), CompileError::EmptyExpression);
    }
}
