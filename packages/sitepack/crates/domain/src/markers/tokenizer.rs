use super::MarkerSyntaxError;
use std::fmt;

/// Comparison operators understood by the marker language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare word, resolved against the environment.
    Var(String),
    /// Quoted literal, quotes removed.
    Str(String),
    Op(Op),
    And,
    Or,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Var(name) => f.write_str(name),
            Token::Str(value) => write!(f, "\"{}\"", value),
            Token::Op(op) => write!(f, "{}", op),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

// Two-character operators first so `<=` never lexes as `<` followed by `=`.
const OPERATORS: [(&str, Op); 6] = [
    ("==", Op::Eq),
    ("!=", Op::Ne),
    ("<=", Op::Le),
    (">=", Op::Ge),
    ("<", Op::Lt),
    (">", Op::Gt),
];

fn is_blank(c: char) -> bool {
    c.is_whitespace()
}

fn is_delimiter(c: char) -> bool {
    is_blank(c) || matches!(c, '(' | ')' | '"' | '\'' | '=' | '!' | '<' | '>')
}

/// `and`/`or` only count as keywords when followed by whitespace, `(` or the
/// end of input, so names such as `android` or `order` stay variables.
fn keyword<'a>(rest: &'a str, word: &str) -> Option<&'a str> {
    let after = rest.strip_prefix(word)?;
    match after.chars().next() {
        None => Some(after),
        Some(c) if is_blank(c) || c == '(' => Some(after),
        Some(_) => None,
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, MarkerSyntaxError> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_matches(is_blank);

    while let Some(c) = rest.chars().next() {
        if c == '(' {
            tokens.push(Token::LParen);
            rest = &rest[1..];
        } else if c == ')' {
            tokens.push(Token::RParen);
            rest = &rest[1..];
        } else if let Some(after) = keyword(rest, "and") {
            tokens.push(Token::And);
            rest = after;
        } else if let Some(after) = keyword(rest, "or") {
            tokens.push(Token::Or);
            rest = after;
        } else if let Some((text, op)) = OPERATORS.iter().find(|(text, _)| rest.starts_with(text)) {
            tokens.push(Token::Op(*op));
            rest = &rest[text.len()..];
        } else if c == '"' || c == '\'' {
            let body = &rest[1..];
            let end = body.find(c).ok_or(MarkerSyntaxError::UnterminatedString)?;
            tokens.push(Token::Str(body[..end].to_string()));
            rest = &body[end + 1..];
        } else {
            let end = rest.find(is_delimiter).unwrap_or(rest.len());
            if end == 0 {
                // A lone `=` or `!` that did not form an operator.
                return Err(MarkerSyntaxError::UnexpectedChar(c));
            }
            tokens.push(Token::Var(rest[..end].to_string()));
            rest = &rest[end..];
        }
        rest = rest.trim_start_matches(is_blank);
    }

    Ok(tokens)
}
