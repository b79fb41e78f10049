use pest::Parser;

use crate::errors::CalcError;
use crate::ops::Op;
use crate::value::Value;

#[derive(Parser)]
#[grammar = "calc.pest"]
struct CalcParser;

/// One lexeme of the expression. The reducer passes rewrite a
/// `Vec<Token>` in place until a single `Num` remains.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Num(Value),
    Ident(String),
    Op(Op),
    OpenB,
    CloseB,
}

impl Token {
    pub fn text(&self) -> String {
        match self {
            Token::Num(v) => v.to_string(),
            Token::Ident(s) => s.clone(),
            Token::Op(op) => op.text().to_string(),
            Token::OpenB => "(".to_string(),
            Token::CloseB => ")".to_string(),
        }
    }
}

/// Renders a token slice for traces and diagnostics.
pub fn tokens_text(tokens: &[Token]) -> String {
    let parts: Vec<String> = tokens.iter().map(Token::text).collect();
    parts.join(" ")
}

/// Splits an expression into tokens. The grammar only recognizes
/// lexeme shapes; word operators and the `√` alias are resolved here,
/// and an alphabetic `log` rejoins an immediately adjacent `2` or `10`
/// so that `log2(8)` lexes as one identifier while `3x2` still
/// multiplies.
pub fn tokenize(expr: &str) -> Result<Vec<Token>, CalcError> {
    let pairs = match CalcParser::parse(Rule::expr, expr) {
        Ok(pairs) => pairs,
        Err(e) => return Err(CalcError::UnknownToken(unmatched_at(expr, &e))),
    };
    let mut out: Vec<Token> = Vec::new();
    let mut last_end = 0usize;
    for pair in pairs {
        let rule = pair.as_rule();
        let span = pair.as_span();
        let text = span.as_str();
        match rule {
            Rule::number => {
                let joins_log = span.start() == last_end
                    && (text == "2" || text == "10")
                    && matches!(out.last(), Some(Token::Ident(name)) if name == "log");
                if joins_log {
                    out.pop();
                    out.push(Token::Ident(format!("log{}", text)));
                } else {
                    let v = Value::from_decimal_str(text)
                        .ok_or_else(|| CalcError::UnknownToken(text.to_string()))?;
                    out.push(Token::Num(v));
                }
            }
            Rule::ident => {
                let name = if text == "√" { "sqrt" } else { text };
                match Op::lookup(name) {
                    Some(op) => out.push(Token::Op(op)),
                    None => out.push(Token::Ident(name.to_string())),
                }
            }
            Rule::operator => match Op::lookup(text) {
                Some(op) => out.push(Token::Op(op)),
                None => return Err(CalcError::UnknownToken(text.to_string())),
            },
            Rule::open_b => out.push(Token::OpenB),
            Rule::close_b => out.push(Token::CloseB),
            Rule::EOI => {}
            _ => return Err(CalcError::UnknownToken(text.to_string())),
        }
        last_end = span.end();
    }
    Ok(out)
}

// the character run the grammar choked on
fn unmatched_at(expr: &str, err: &pest::error::Error<Rule>) -> String {
    let pos = match err.location {
        pest::error::InputLocation::Pos(p) => p,
        pest::error::InputLocation::Span((start, _)) => start,
    };
    let tail = expr[pos..].trim_start();
    let run: String = tail.chars().take_while(|c| !c.is_whitespace()).collect();
    if run.is_empty() {
        expr.to_string()
    } else {
        run
    }
}

/// Attaches a `-` to the numeric literal on its right when the token
/// before the minus is an operator, an opening parenthesis, or absent.
/// Runs right to left so a chain like `2--3` folds the inner minus only.
pub fn fuse_signs(tokens: &mut Vec<Token>) {
    let mut i = tokens.len();
    while i > 0 {
        i -= 1;
        let minus = matches!(tokens[i], Token::Op(Op::Sub));
        let number_next = matches!(tokens.get(i + 1), Some(Token::Num(_)));
        let free_left = i == 0 || matches!(tokens[i - 1], Token::Op(_) | Token::OpenB);
        if minus && number_next && free_left {
            if let Token::Num(v) = tokens.remove(i + 1) {
                tokens[i] = Token::Num(v.negate());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(i: i64) -> Token {
        Token::Num(Value::from_integer(i))
    }

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("2+3*4").unwrap();
        assert_eq!(
            tokens,
            vec![num(2), Token::Op(Op::Add), num(3), Token::Op(Op::Mul), num(4)]
        );
        assert_eq!(tokens_text(&tokens), "2 + 3 * 4");
    }

    #[test]
    fn test_tokenize_surfaces() {
        for expr in ["2*3", "2x3", "2 x 3", "2×3", "2·3"] {
            let tokens = tokenize(expr).unwrap();
            assert_eq!(tokens, vec![num(2), Token::Op(Op::Mul), num(3)], "{}", expr);
        }
        assert_eq!(
            tokenize("7÷2").unwrap(),
            vec![num(7), Token::Op(Op::Div), num(2)]
        );
        assert_eq!(
            tokenize("10 mod 3").unwrap(),
            vec![num(10), Token::Op(Op::Mod), num(3)]
        );
        assert_eq!(
            tokenize("5 != 5").unwrap(),
            vec![num(5), Token::Op(Op::Ne), num(5)]
        );
        assert_eq!(
            tokenize("2≤3").unwrap(),
            vec![num(2), Token::Op(Op::Le), num(3)]
        );
    }

    #[test]
    fn test_longest_match() {
        assert_eq!(
            tokenize("2**3").unwrap(),
            vec![num(2), Token::Op(Op::Pow), num(3)]
        );
        assert_eq!(
            tokenize("7//2").unwrap(),
            vec![num(7), Token::Op(Op::IntDiv), num(2)]
        );
        // four stars lex as two pow operators, not pow-mul-mul
        assert_eq!(
            tokenize("2***3").unwrap(),
            vec![num(2), Token::Op(Op::Pow), Token::Op(Op::Mul), num(3)]
        );
    }

    #[test]
    fn test_idents_and_aliases() {
        assert_eq!(
            tokenize("sqrt 16").unwrap(),
            vec![Token::Ident("sqrt".to_string()), num(16)]
        );
        assert_eq!(
            tokenize("√16").unwrap(),
            vec![Token::Ident("sqrt".to_string()), num(16)]
        );
        assert_eq!(tokenize("π").unwrap(), vec![Token::Ident("π".to_string())]);
        // word operators resolve at tokenize time
        assert_eq!(
            tokenize("1 AND 0").unwrap(),
            vec![num(1), Token::Op(Op::And), num(0)]
        );
        assert_eq!(
            tokenize("NOT 0").unwrap(),
            vec![Token::Op(Op::Not), num(0)]
        );
    }

    #[test]
    fn test_log_rejoining() {
        assert_eq!(
            tokenize("log2").unwrap(),
            vec![Token::Ident("log2".to_string())]
        );
        assert_eq!(
            tokenize("log10").unwrap(),
            vec![Token::Ident("log10".to_string())]
        );
        // separated by a space they stay apart
        assert_eq!(
            tokenize("log 2").unwrap(),
            vec![Token::Ident("log".to_string()), num(2)]
        );
        // only 2 and 10 rejoin
        assert_eq!(
            tokenize("log3").unwrap(),
            vec![Token::Ident("log".to_string()), num(3)]
        );
    }

    #[test]
    fn test_unknown_token() {
        let err = tokenize("2 # 3").unwrap_err();
        assert_eq!(err.to_string(), "Unknown token '#'");
        let err = tokenize("2+$5").unwrap_err();
        assert_eq!(err.to_string(), "Unknown token '$5'");
    }

    #[test]
    fn test_fuse_signs() {
        let mut tokens = tokenize("-5").unwrap();
        fuse_signs(&mut tokens);
        assert_eq!(tokens, vec![num(-5)]);

        // a binary minus stays put
        let mut tokens = tokenize("5-3").unwrap();
        fuse_signs(&mut tokens);
        assert_eq!(tokens, vec![num(5), Token::Op(Op::Sub), num(3)]);

        // 2--3 folds the inner minus only
        let mut tokens = tokenize("2--3").unwrap();
        fuse_signs(&mut tokens);
        assert_eq!(tokens, vec![num(2), Token::Op(Op::Sub), num(-3)]);

        // after an opening parenthesis
        let mut tokens = tokenize("(-5)").unwrap();
        fuse_signs(&mut tokens);
        assert_eq!(tokens, vec![Token::OpenB, num(-5), Token::CloseB]);

        // stacked minuses collapse in one right-to-left pass
        let mut tokens = tokenize("---5").unwrap();
        fuse_signs(&mut tokens);
        assert_eq!(tokens, vec![num(-5)]);
        let mut tokens = tokenize("--5").unwrap();
        fuse_signs(&mut tokens);
        assert_eq!(tokens, vec![num(5)]);
    }

    #[test]
    fn test_decimals() {
        assert_eq!(
            tokenize("3.25").unwrap(),
            vec![Token::Num(Value::from_decimal_str("3.25").unwrap())]
        );
    }
}
