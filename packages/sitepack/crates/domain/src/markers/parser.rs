use super::tokenizer::{Op, Token};
use super::MarkerSyntaxError;

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Var(String),
    Literal(String),
}

/// Parsed marker expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerExpr {
    And(Box<MarkerExpr>, Box<MarkerExpr>),
    Or(Box<MarkerExpr>, Box<MarkerExpr>),
    Compare {
        op: Op,
        left: Operand,
        right: Operand,
    },
    Value(Operand),
}

pub fn parse(tokens: &[Token]) -> Result<MarkerExpr, MarkerSyntaxError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;

    match parser.peek() {
        None => Ok(expr),
        Some(Token::RParen) => Err(MarkerSyntaxError::UnmatchedClosingParen),
        Some(tok) => Err(MarkerSyntaxError::UnexpectedToken(tok.to_string())),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_or(&mut self) -> Result<MarkerExpr, MarkerSyntaxError> {
        let mut left = self.parse_and()?;
        while let Some(Token::Or) = self.peek() {
            self.next();
            let right = self.parse_and()?;
            left = MarkerExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<MarkerExpr, MarkerSyntaxError> {
        let mut left = self.parse_atom()?;
        while let Some(Token::And) = self.peek() {
            self.next();
            let right = self.parse_atom()?;
            left = MarkerExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<MarkerExpr, MarkerSyntaxError> {
        let tok = self.next().ok_or(MarkerSyntaxError::UnexpectedEnd)?;
        match tok {
            Token::LParen => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(MarkerSyntaxError::MissingClosingParen),
                }
            }
            Token::Var(_) | Token::Str(_) => {
                let left = operand(tok);
                let Some(Token::Op(op)) = self.peek() else {
                    return Ok(MarkerExpr::Value(left));
                };
                self.next();
                match self.next() {
                    Some(rhs) if matches!(rhs, Token::Var(_) | Token::Str(_)) => Ok(MarkerExpr::Compare {
                        op: *op,
                        left,
                        right: operand(rhs),
                    }),
                    _ => Err(MarkerSyntaxError::MissingRightOperand(*op)),
                }
            }
            other => Err(MarkerSyntaxError::UnexpectedToken(other.to_string())),
        }
    }
}

fn operand(tok: &Token) -> Operand {
    match tok {
        Token::Str(value) => Operand::Literal(value.clone()),
        other => Operand::Var(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::tokenizer::tokenize;

    fn parse_str(s: &str) -> Result<MarkerExpr, MarkerSyntaxError> {
        parse(&tokenize(s).unwrap())
    }

    fn cmp(var: &str, op: Op, lit: &str) -> MarkerExpr {
        MarkerExpr::Compare {
            op,
            left: Operand::Var(var.to_string()),
            right: Operand::Literal(lit.to_string()),
        }
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse_str("a == '1' or b == '2' and c == '3'").unwrap();
        assert_eq!(
            expr,
            MarkerExpr::Or(
                Box::new(cmp("a", Op::Eq, "1")),
                Box::new(MarkerExpr::And(
                    Box::new(cmp("b", Op::Eq, "2")),
                    Box::new(cmp("c", Op::Eq, "3")),
                )),
            )
        );
    }

    #[test]
    fn test_left_associative() {
        let expr = parse_str("a == '1' and b == '2' and c == '3'").unwrap();
        let MarkerExpr::And(left, _) = expr else {
            panic!("expected and");
        };
        assert!(matches!(*left, MarkerExpr::And(_, _)));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parse_str("(a == '1' or b == '2') and c == '3'").unwrap();
        assert!(matches!(expr, MarkerExpr::And(_, _)));
    }

    #[test]
    fn test_literal_on_the_left() {
        let expr = parse_str("'3.9' <= python_version").unwrap();
        assert_eq!(
            expr,
            MarkerExpr::Compare {
                op: Op::Le,
                left: Operand::Literal("3.9".to_string()),
                right: Operand::Var("python_version".to_string()),
            }
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(parse_str("a == '1' and"), Err(MarkerSyntaxError::UnexpectedEnd));
        assert_eq!(parse_str("(a == '1'"), Err(MarkerSyntaxError::MissingClosingParen));
        assert_eq!(
            parse_str("a == '1')"),
            Err(MarkerSyntaxError::UnmatchedClosingParen)
        );
        assert_eq!(
            parse_str("a =="),
            Err(MarkerSyntaxError::MissingRightOperand(Op::Eq))
        );
        assert_eq!(
            parse_str("a == 'x' 'y'"),
            Err(MarkerSyntaxError::UnexpectedToken("\"y\"".to_string()))
        );
        assert_eq!(
            parse_str("or a"),
            Err(MarkerSyntaxError::UnexpectedToken("or".to_string()))
        );
    }
}
