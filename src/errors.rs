use std::error;
use std::fmt;

/// Every way an evaluation can fail. Each variant carries a fixed
/// user-visible message; the whole evaluation aborts on the first error
/// and no partial result is printed.
#[derive(Clone, PartialEq, Eq)]
pub enum CalcError {
    /// `ans` occurs in the expression but no previous result was supplied
    MissingAns,
    /// An opening parenthesis without a matching close, or vice versa
    UnbalancedParens,
    /// A character run that matches no literal, name, or operator surface
    UnknownToken(String),
    /// A reducer pass left multiple tokens but could not progress.
    /// Carries the original expression
    Malformed(String),
    /// Division (or modulo) with a zero divisor. Carries the dividend
    DividedByZero(String),
    /// Arithmetic domain violation; carries a description and the
    /// failing operand
    Domain(String, String),
    /// Nothing to calculate
    EmptyExpression,
    /// Internal dispatch reached an arm the reducer never produces
    Unreachable,
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CalcError::MissingAns => write!(f, "ans was not specified"),
            CalcError::UnbalancedParens => write!(f, "Unbalanced parentheses in expression"),
            CalcError::UnknownToken(s) => write!(f, "Unknown token '{}'", s),
            CalcError::Malformed(s) => write!(f, "Could not perform calculation on: '{}'", s),
            CalcError::DividedByZero(s) => write!(f, "'{}' divided by zero", s),
            CalcError::Domain(what, val) => write!(f, "Domain error: {} '{}'", what, val),
            CalcError::EmptyExpression => write!(f, "Nothing to calculate"),
            CalcError::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl fmt::Debug for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl error::Error for CalcError {}
