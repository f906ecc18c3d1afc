//! Tokenizer, syntax validation and explicit concatenation.

use crate::error::SyntaxError;

/// Regex token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Any non-operator character
    Literal(char),
    /// `E` or `ε`
    Epsilon,
    /// `|`
    Union,
    /// Explicit concatenation, inserted between adjacent operands
    Concat,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `?`
    Optional,
    /// `(`
    Open,
    /// `)`
    Close,
}

impl Token {
    pub fn from_char(c: char) -> Self {
        match c {
            '|' => Token::Union,
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::Optional,
            '(' => Token::Open,
            ')' => Token::Close,
            'E' | 'ε' => Token::Epsilon,
            c => Token::Literal(c),
        }
    }

    /// Character form; concatenation prints as `.`
    pub fn as_char(&self) -> char {
        match self {
            Token::Literal(c) => *c,
            Token::Epsilon => 'E',
            Token::Union => '|',
            Token::Concat => '.',
            Token::Star => '*',
            Token::Plus => '+',
            Token::Optional => '?',
            Token::Open => '(',
            Token::Close => ')',
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::Union | Token::Concat | Token::Star | Token::Plus | Token::Optional
        )
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, Token::Star | Token::Plus | Token::Optional)
    }

    /// Binding strength: `|` < concatenation < postfix operators
    pub fn precedence(&self) -> u8 {
        match self {
            Token::Union => 1,
            Token::Concat => 2,
            Token::Star | Token::Plus | Token::Optional => 3,
            _ => 0,
        }
    }

    /// Can this token be the left side of an implicit concatenation?
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Literal(_)
                | Token::Epsilon
                | Token::Close
                | Token::Star
                | Token::Plus
                | Token::Optional
        )
    }

    /// Can this token be the right side of an implicit concatenation?
    fn starts_operand(&self) -> bool {
        matches!(self, Token::Literal(_) | Token::Epsilon | Token::Open)
    }
}

/// Token with the character position it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Split a pattern into tokens, one per character.
pub fn tokenize(pattern: &str) -> Vec<Spanned> {
    pattern
        .chars()
        .enumerate()
        .map(|(position, c)| Spanned {
            token: Token::from_char(c),
            position,
        })
        .collect()
}

/// Reject empty patterns, unbalanced parentheses and a leading operator.
pub fn check_syntax(pattern: &str) -> Result<(), SyntaxError> {
    if pattern.is_empty() {
        return Err(SyntaxError::Empty);
    }

    // Positions of currently unmatched '('
    let mut open: Vec<usize> = Vec::new();

    for (position, c) in pattern.chars().enumerate() {
        match c {
            '(' => open.push(position),
            ')' => {
                if open.pop().is_none() {
                    return Err(SyntaxError::UnmatchedClose { position });
                }
            }
            _ => {}
        }

        if position == 0 && matches!(c, '*' | '+' | '?' | '|') {
            return Err(SyntaxError::LeadingOperator { operator: c });
        }
    }

    match open.pop() {
        Some(position) => Err(SyntaxError::UnmatchedOpen { position }),
        None => Ok(()),
    }
}

/// Insert [`Token::Concat`] between adjacent operands.
///
/// The inserted token takes the position of the right-hand operand.
pub fn insert_concat(tokens: &[Spanned]) -> Vec<Spanned> {
    let mut result = Vec::with_capacity(tokens.len() * 2);

    for (i, spanned) in tokens.iter().enumerate() {
        result.push(*spanned);

        if let Some(next) = tokens.get(i + 1) {
            if spanned.token.ends_operand() && next.token.starts_operand() {
                result.push(Spanned {
                    token: Token::Concat,
                    position: next.position,
                });
            }
        }
    }

    result
}

/// Render tokens back into a string, mostly for diagnostics.
pub fn render(tokens: &[Spanned]) -> String {
    tokens.iter().map(|t| t.token.as_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(pattern: &str) -> String {
        render(&insert_concat(&tokenize(pattern)))
    }

    #[test]
    fn test_tokenize_epsilon_spellings() {
        let tokens = tokenize("Eεa");
        assert_eq!(tokens[0].token, Token::Epsilon);
        assert_eq!(tokens[1].token, Token::Epsilon);
        assert_eq!(tokens[2].token, Token::Literal('a'));
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn test_check_syntax_accepts_valid() {
        for pattern in ["a", "a*b", "(a|b)*c", "a+b?", "((a))", "E", "a|"] {
            assert!(check_syntax(pattern).is_ok(), "{pattern}");
        }
    }

    #[test]
    fn test_check_syntax_errors() {
        assert_eq!(check_syntax(""), Err(SyntaxError::Empty));
        assert_eq!(
            check_syntax("*ab"),
            Err(SyntaxError::LeadingOperator { operator: '*' })
        );
        assert_eq!(
            check_syntax("|a"),
            Err(SyntaxError::LeadingOperator { operator: '|' })
        );
        assert_eq!(
            check_syntax("(ab"),
            Err(SyntaxError::UnmatchedOpen { position: 0 })
        );
        assert_eq!(
            check_syntax("a(b(c)"),
            Err(SyntaxError::UnmatchedOpen { position: 1 })
        );
        assert_eq!(
            check_syntax("ab)("),
            Err(SyntaxError::UnmatchedClose { position: 2 })
        );
        assert_eq!(
            check_syntax(")a"),
            Err(SyntaxError::UnmatchedClose { position: 0 })
        );
    }

    #[test]
    fn test_insert_concat() {
        assert_eq!(concat("ab"), "a.b");
        assert_eq!(concat("a*b"), "a*.b");
        assert_eq!(concat("(a|b)c"), "(a|b).c");
        assert_eq!(concat("a(b)"), "a.(b)");
        assert_eq!(concat("a?b+c"), "a?.b+.c");
        assert_eq!(concat("(a)(b)"), "(a).(b)");
        assert_eq!(concat("a|b"), "a|b");
    }

    #[test]
    fn test_precedence_order() {
        assert!(Token::Union.precedence() < Token::Concat.precedence());
        assert!(Token::Concat.precedence() < Token::Star.precedence());
        assert_eq!(Token::Plus.precedence(), Token::Optional.precedence());
        assert!(Token::Star.is_postfix());
        assert!(!Token::Open.is_operator());
    }
}
