//! Infix to postfix conversion (shunting-yard).
//!
//! Postfix operators bind tightest and are emitted as soon as they are
//! read; binary operators wait on the stack until an operator of lower or
//! equal precedence arrives, which makes them left-associative.

use crate::token::{Spanned, Token};
use smallvec::SmallVec;

/// Convert an infix token stream (with explicit concatenation) to postfix.
///
/// Parentheses are dropped from the output. Balance is checked by
/// validation beforehand; a stray `)` here is ignored.
pub fn to_postfix(tokens: &[Spanned]) -> Vec<Spanned> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: SmallVec<[Spanned; 16]> = SmallVec::new();

    for &spanned in tokens {
        match spanned.token {
            Token::Open => stack.push(spanned),
            Token::Close => {
                while let Some(top) = stack.pop() {
                    if top.token == Token::Open {
                        break;
                    }
                    output.push(top);
                }
            }
            token if token.is_postfix() => output.push(spanned),
            token if token.is_operator() => {
                while let Some(top) = stack.last() {
                    if top.token == Token::Open || top.token.precedence() < token.precedence() {
                        break;
                    }
                    output.extend(stack.pop());
                }
                stack.push(spanned);
            }
            // Operands
            _ => output.push(spanned),
        }
    }

    while let Some(top) = stack.pop() {
        if top.token != Token::Open {
            output.push(top);
        }
    }

    output
}
