use crate::errors::CalcError;
use crate::format;
use crate::ops::{self, Op};
use crate::precise::{self, PRECISION_SLACK};
use crate::token::{self, Token};
use crate::value::Value;

/// The evaluator. Holds the display length, the working precision, the
/// previous answer, and the per-phase trace collected in debug mode.
///
/// ```
/// use xcalc::Calc;
///
/// let mut calc = Calc::new(100);
/// assert_eq!(calc.eval("2+3*4").unwrap(), "14");
/// assert_eq!(calc.eval("ans*3").unwrap(), "42");
/// ```
pub struct Calc {
    display_len: usize,
    precision: usize,
    ans: Option<Value>,
    debug: bool,
    pub trace: Vec<String>,
}

impl Calc {
    /// `display_len` is the maximum printed length of a result, sign
    /// excluded. The working precision carries [`PRECISION_SLACK`]
    /// extra fractional digits.
    pub fn new(display_len: usize) -> Calc {
        Calc {
            display_len,
            precision: display_len + PRECISION_SLACK,
            ans: None,
            debug: false,
            trace: Vec::new(),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Calc {
        self.debug = debug;
        self
    }

    /// Seeds `ans` before the first evaluation.
    pub fn set_ans(&mut self, value: Value) {
        self.ans = Some(value);
    }

    /// The exact value of the last successful evaluation.
    pub fn result(&self) -> Option<&Value> {
        self.ans.as_ref()
    }

    fn note(&mut self, line: String) {
        if self.debug {
            self.trace.push(line);
        }
    }

    /// Evaluates one expression and returns the formatted result. On
    /// success the exact value becomes `ans` for the next evaluation;
    /// on error `ans` is left untouched.
    pub fn eval(&mut self, expr: &str) -> Result<String, CalcError> {
        self.trace.clear();
        let src = expr.trim();
        if src.is_empty() {
            return Err(CalcError::EmptyExpression);
        }
        let mut tokens = token::tokenize(src)?;
        token::fuse_signs(&mut tokens);
        self.note(format!("tokens: {}", token::tokens_text(&tokens)));
        let tokens = self.reduce_parens(tokens, src)?;
        let value = self.reduce(tokens, src)?;
        let mut notes = Vec::new();
        let out = format::render(value.as_ratio(), self.display_len, self.precision, &mut notes);
        if self.debug {
            for n in notes {
                self.trace.push(format!("format: {}", n));
            }
        }
        self.ans = Some(value);
        Ok(out)
    }

    /// Resolves parentheses innermost-rightmost first, splicing each
    /// group's value back into the stream. A number directly before the
    /// group gets an implicit `*`.
    fn reduce_parens(&mut self, mut tokens: Vec<Token>, src: &str) -> Result<Vec<Token>, CalcError> {
        loop {
            let open = match tokens.iter().rposition(|t| matches!(t, Token::OpenB)) {
                Some(i) => i,
                None => {
                    if tokens.iter().any(|t| matches!(t, Token::CloseB)) {
                        return Err(CalcError::UnbalancedParens);
                    }
                    return Ok(tokens);
                }
            };
            let close = tokens[open + 1..]
                .iter()
                .position(|t| matches!(t, Token::CloseB))
                .map(|p| open + 1 + p)
                .ok_or(CalcError::UnbalancedParens)?;
            let inner: Vec<Token> = tokens[open + 1..close].to_vec();
            let value = self.reduce(inner, src)?;
            if self.debug {
                let line = format!("parens: -> {}", value);
                self.trace.push(line);
            }
            let implicit = open > 0 && matches!(tokens[open - 1], Token::Num(_));
            tokens.splice(open..=close, [Token::Num(value)]);
            if implicit {
                tokens.insert(open, Token::Op(Op::Mul));
                self.note("parens: implicit multiplication".to_string());
            }
        }
    }

    /// Constants, then functions, then operators by falling precedence.
    fn reduce(&mut self, mut tokens: Vec<Token>, src: &str) -> Result<Value, CalcError> {
        self.substitute_constants(&mut tokens)?;
        token::fuse_signs(&mut tokens);
        self.apply_functions(&mut tokens, src)?;
        token::fuse_signs(&mut tokens);
        self.apply_operators(&mut tokens, src)?;
        if tokens.len() != 1 {
            return Err(CalcError::Malformed(src.to_string()));
        }
        match tokens.pop() {
            Some(Token::Num(v)) => Ok(v),
            _ => Err(CalcError::Malformed(src.to_string())),
        }
    }

    fn substitute_constants(&mut self, tokens: &mut [Token]) -> Result<(), CalcError> {
        for slot in tokens.iter_mut() {
            let name = match slot {
                Token::Ident(n) => n.as_str(),
                _ => continue,
            };
            let value = match name {
                "ans" => match &self.ans {
                    Some(v) => v.clone(),
                    None => return Err(CalcError::MissingAns),
                },
                "pi" | "π" => Value::from_ratio(precise::from_scaled(
                    precise::pi_scaled(self.precision),
                    self.precision,
                )),
                "e" => Value::from_integer(1).exp(self.precision),
                _ => continue,
            };
            *slot = Token::Num(value);
        }
        Ok(())
    }

    /// Functions take the single value to their right; resolved right
    /// to left so nested applications like `sin cos 0` work inside out.
    fn apply_functions(&mut self, tokens: &mut Vec<Token>, src: &str) -> Result<(), CalcError> {
        let mut i = tokens.len();
        while i > 0 {
            i -= 1;
            let name = match &tokens[i] {
                Token::Ident(n) => n.clone(),
                _ => continue,
            };
            if !ops::is_function(&name) {
                return Err(CalcError::UnknownToken(name));
            }
            let operand = match tokens.get(i + 1) {
                Some(Token::Num(v)) => v.clone(),
                _ => return Err(CalcError::Malformed(src.to_string())),
            };
            let value = ops::apply_function(&name, operand, self.precision)?;
            if self.debug {
                let line = format!("function: {} -> {}", name, value);
                self.trace.push(line);
            }
            tokens.splice(i..=i + 1, [Token::Num(value)]);
        }
        Ok(())
    }

    /// One precedence level at a time, tightest first. Within a level
    /// the leftmost operator reduces first; `**`/`^` and unary `NOT`
    /// reduce from the right instead.
    fn apply_operators(&mut self, tokens: &mut Vec<Token>, src: &str) -> Result<(), CalcError> {
        for level in ops::PRECEDENCE_LEVELS {
            let from_right = level[0].is_right_assoc();
            loop {
                let found = if from_right {
                    tokens
                        .iter()
                        .rposition(|t| matches!(t, Token::Op(op) if level.contains(op)))
                } else {
                    tokens
                        .iter()
                        .position(|t| matches!(t, Token::Op(op) if level.contains(op)))
                };
                let i = match found {
                    Some(i) => i,
                    None => break,
                };
                let op = match &tokens[i] {
                    Token::Op(op) => *op,
                    _ => return Err(CalcError::Malformed(src.to_string())),
                };
                if op.is_unary() {
                    let operand = match tokens.get(i + 1) {
                        Some(Token::Num(v)) => v.clone(),
                        _ => return Err(CalcError::Malformed(src.to_string())),
                    };
                    let value = op.apply_unary(operand)?;
                    if self.debug {
                        let line = format!("reduce: {} {} -> {}", op.text(), tokens[i + 1].text(), value);
                        self.trace.push(line);
                    }
                    tokens.splice(i..=i + 1, [Token::Num(value)]);
                    continue;
                }
                if i == 0 {
                    return Err(CalcError::Malformed(src.to_string()));
                }
                let lhs = match &tokens[i - 1] {
                    Token::Num(v) => v.clone(),
                    _ => return Err(CalcError::Malformed(src.to_string())),
                };
                let rhs = match tokens.get(i + 1) {
                    Some(Token::Num(v)) => v.clone(),
                    _ => return Err(CalcError::Malformed(src.to_string())),
                };
                if self.debug {
                    let line = format!("reduce: {} {} {}", lhs, op.text(), rhs);
                    self.trace.push(line);
                }
                let value = op.apply(lhs, rhs, self.precision)?;
                tokens.splice(i - 1..=i + 1, [Token::Num(value)]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> Result<String, CalcError> {
        Calc::new(100).eval(expr)
    }

    #[test]
    fn test_arithmetic() {
        let exprs = [
            "2+3*4",
            "2*3+4",
            "10-2-3",
            "2(3+4)",
            "-(2+3)",
            "2--3",
            "10/4",
            "1/2+1/2",
            "10//3",
            "-7//2",
            "10 mod 3",
            "-7%2",
            "2**10",
            "2^10",
            "2**3**2",
            "2^-2",
            "27\\3",
            "2×3",
            "2 x 3",
            "2·3",
            "7÷2",
            "7:2",
        ];
        let ress = [
            "14", "10", "5", "14", "-5", "5", "2.5", "1", "3", "-4", "1", "1", "1024", "1024",
            "512", "0.25", "3", "6", "6", "6", "3.5", "3.5",
        ];
        for (expr, res) in exprs.iter().zip(ress.iter()) {
            assert_eq!(&eval(expr).unwrap(), res, "{}", expr);
        }
    }

    #[test]
    fn test_comparisons_and_logic() {
        let exprs = [
            "5 == 5", "5 != 5", "5 = 5", "5 ≠ 5", "2 < 3", "2 <= 2", "2 ≤ 2", "3 > 4",
            "3 >= 3", "3 ≥ 4", "1 && 0", "1 AND 2", "0 || 0", "0 OR 3", "NOT 0", "!1",
            "1 XOR 0", "1 XOR 1",
        ];
        let ress = [
            "1", "0", "1", "0", "1", "1", "1", "0", "1", "0", "0", "1", "0", "1", "1", "0",
            "1", "0",
        ];
        for (expr, res) in exprs.iter().zip(ress.iter()) {
            assert_eq!(&eval(expr).unwrap(), res, "{}", expr);
        }
        // XOR binds loosest of all
        assert_eq!(eval("1 XOR 1 && 0").unwrap(), "1");
        // comparisons bind looser than arithmetic
        assert_eq!(eval("1+1 == 2").unwrap(), "1");
    }

    #[test]
    fn test_functions() {
        let exprs = [
            "abs(-3)",
            "floor(-2.5)",
            "ceil(2.1)",
            "ceiling(2.1)",
            "round(2.5)",
            "round(-2.5)",
            "sqrt(16)",
            "√(16)",
            "fac(5)",
            "factorial(5)",
            "log(1000)",
            "log10(1000)",
            "log2(8)",
            "ln(1)",
            "exp(0)",
            "sin(0)+cos(0)",
            "sin cos 0",
            "deg(rad(90))",
            "tan(0)",
            "asin(0)",
            "atan(0)",
        ];
        let ress = [
            "3", "-3", "3", "3", "3", "-2", "4", "4", "120", "120", "3", "3", "3", "0", "1",
            "1", "0.841470984807896506652502321630298999622563060798371065672751709991910404391239668948639743543052695",
            "90", "0", "0", "0",
        ];
        for (expr, res) in exprs.iter().zip(ress.iter()) {
            assert_eq!(&eval(expr).unwrap(), res, "{}", expr);
        }
    }

    #[test]
    fn test_constants() {
        let mut calc = Calc::new(50);
        assert_eq!(
            calc.eval("pi").unwrap(),
            "3.1415926535897932384626433832795028841971693993751"
        );
        assert_eq!(calc.eval("π").unwrap(), calc.eval("pi").unwrap());
        // the kept digits end in a doubled 9, so the tail is marked
        assert_eq!(
            calc.eval("e").unwrap(),
            "2.7182818284590452353602874713526624977572470936999..."
        );
    }

    #[test]
    fn test_ans() {
        let mut calc = Calc::new(100);
        assert_eq!(calc.eval("ans * 2").unwrap_err(), CalcError::MissingAns);
        calc.set_ans(Value::from_integer(21));
        assert_eq!(calc.eval("ans * 2").unwrap(), "42");
        // ans tracks the previous result
        assert_eq!(calc.eval("ans + 8").unwrap(), "50");
        // a failed evaluation leaves ans alone
        assert!(calc.eval("1/0").is_err());
        assert_eq!(calc.eval("ans").unwrap(), "50");
    }

    #[test]
    fn test_long_results() {
        let mut calc = Calc::new(20);
        assert_eq!(calc.eval("1/3").unwrap(), "0.3333333333333333333...");
        let mut calc = Calc::new(10);
        assert_eq!(calc.eval("2^100").unwrap(), "1267650600e+21");
    }

    #[test]
    fn test_parens() {
        assert_eq!(eval("((2+3))*2").unwrap(), "10");
        assert_eq!(eval("2(3+4)").unwrap(), "14");
        assert_eq!(eval("3(2)").unwrap(), "6");
        assert_eq!(eval("(1+2)*(3+4)").unwrap(), "21");
        assert_eq!(eval("2*(3+(4-1))").unwrap(), "12");
    }

    #[test]
    fn test_errors() {
        let exprs = ["(2+3", "2+3)", "2++", "()", "2 3", "foo(2)", "1/0", "10%0", "5$"];
        let msgs = [
            "Unbalanced parentheses in expression",
            "Unbalanced parentheses in expression",
            "Could not perform calculation on: '2++'",
            "Could not perform calculation on: '()'",
            "Could not perform calculation on: '2 3'",
            "Unknown token 'foo'",
            "'1' divided by zero",
            "'10' divided by zero",
            "Unknown token '$'",
        ];
        for (expr, msg) in exprs.iter().zip(msgs.iter()) {
            assert_eq!(&eval(expr).unwrap_err().to_string(), msg, "{}", expr);
        }
        assert_eq!(eval("   ").unwrap_err(), CalcError::EmptyExpression);
        assert_eq!(eval("sqrt(-1)").unwrap_err().to_string(),
            "Domain error: square root of a negative number '-1'");
    }

    #[test]
    fn test_debug_trace() {
        let mut calc = Calc::new(100).with_debug(true);
        calc.eval("2+3*4").unwrap();
        assert!(calc.trace.iter().any(|l| l.contains("tokens: 2 + 3 * 4")));
        assert!(calc.trace.iter().any(|l| l.contains("3 * 4")));
        // trace stays empty without the flag
        let mut calc = Calc::new(100);
        calc.eval("2+3*4").unwrap();
        assert!(calc.trace.is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut a = Calc::new(50);
        let mut b = Calc::new(50);
        for expr in ["pi", "1/7", "sqrt(2)", "2^100", "sin(1)"] {
            assert_eq!(a.eval(expr).unwrap(), b.eval(expr).unwrap(), "{}", expr);
        }
    }

    #[test]
    fn test_division_round_trip() {
        let mut calc = Calc::new(50);
        for (a, b) in [(10, 4), (1, 3), (7, 9), (100, 7), (-9, 7)] {
            let expr = format!("({}/{})*{}", a, b, b);
            assert_eq!(calc.eval(&expr).unwrap(), a.to_string(), "{}", expr);
        }
    }

    #[test]
    fn test_surface_equivalence() {
        let groups: &[&[&str]] = &[
            &["7*3", "7x3", "7×3", "7·3"],
            &["7/3", "7÷3", "7:3"],
            &["7%3", "7 mod 3"],
            &["7**2", "7^2"],
            &["7<=3", "7≤3"],
            &["7!=3", "7≠3"],
            &["7=7", "7==7"],
            &["1&&1", "1 AND 1"],
            &["0||1", "0 OR 1"],
            &["!0", "NOT 0"],
        ];
        for group in groups {
            let first = eval(group[0]).unwrap();
            for expr in &group[1..] {
                assert_eq!(eval(expr).unwrap(), first, "{}", expr);
            }
        }
    }

    #[test]
    fn test_precedence_pairs() {
        // the tighter operator reduces first
        assert_eq!(eval("2+3*4").unwrap(), eval("2+(3*4)").unwrap());
        assert_eq!(eval("2*3^2").unwrap(), eval("2*(3^2)").unwrap());
        assert_eq!(eval("1+1==2").unwrap(), eval("(1+1)==2").unwrap());
        assert_eq!(eval("1&&0||1").unwrap(), eval("(1&&0)||1").unwrap());
        assert_eq!(eval("NOT 1==1").unwrap(), eval("NOT (1==1)").unwrap());
    }

    #[test]
    fn test_same_level_left_to_right() {
        assert_eq!(eval("8/4/2").unwrap(), "1");
        assert_eq!(eval("8//3%2").unwrap(), "0");
        assert_eq!(eval("2-3+4").unwrap(), "3");
    }
}
