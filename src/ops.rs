use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::errors::CalcError;
use crate::value::{CalcResult, Value};

/// Canonical operator identities. Every surface form in
/// [`OPERATOR_SURFACES`] maps to exactly one of these, so `2*3`, `2x3`,
/// and `2×3` reduce through the same code path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Root,
    Pow,
    And,
    Or,
    Not,
    Xor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Surface forms per canonical operator, in listing order for the CLI.
pub const OPERATOR_SURFACES: &[(Op, &[&str])] = &[
    (Op::Add, &["+"]),
    (Op::Sub, &["-"]),
    (Op::Mul, &["*", "x", "×", "·"]),
    (Op::Div, &["/", "÷", ":"]),
    (Op::IntDiv, &["//"]),
    (Op::Mod, &["%", "mod"]),
    (Op::Root, &["\\"]),
    (Op::Pow, &["**", "^"]),
    (Op::And, &["&&", "AND"]),
    (Op::Or, &["||", "OR"]),
    (Op::Not, &["!", "NOT"]),
    (Op::Xor, &["XOR"]),
    (Op::Eq, &["=", "=="]),
    (Op::Ne, &["!=", "≠"]),
    (Op::Lt, &["<"]),
    (Op::Le, &["<=", "≤"]),
    (Op::Gt, &[">"]),
    (Op::Ge, &[">=", "≥"]),
];

/// Reduction order: one entry per precedence level, tightest first.
/// Operators sharing a level reduce in a single left-to-right pass.
pub const PRECEDENCE_LEVELS: &[&[Op]] = &[
    &[Op::Pow],
    &[Op::Mul, Op::Div, Op::IntDiv, Op::Mod, Op::Root],
    &[Op::Add, Op::Sub],
    &[Op::And],
    &[Op::Or],
    &[Op::Eq, Op::Ne, Op::Lt, Op::Le, Op::Gt, Op::Ge],
    &[Op::Not],
    &[Op::Xor],
];

/// Aliases per constant, in listing order for the CLI.
pub const CONSTANT_ALIASES: &[&[&str]] = &[&["ans"], &["pi", "π"], &["e"]];

/// Aliases per function, in listing order for the CLI.
pub const FUNCTION_ALIASES: &[&[&str]] = &[
    &["abs"],
    &["floor"],
    &["ceil", "ceiling"],
    &["round"],
    &["sqrt", "√"],
    &["exp"],
    &["ln"],
    &["log", "log10"],
    &["log2"],
    &["fac", "factorial"],
    &["rad"],
    &["deg"],
    &["sin"],
    &["cos"],
    &["tan"],
    &["asin"],
    &["acos"],
    &["atan"],
    &["sinh"],
    &["cosh"],
    &["tanh"],
    &["asinh"],
    &["acosh"],
    &["atanh"],
];

lazy_static! {
    static ref SURFACE_TO_OP: HashMap<&'static str, Op> = {
        let mut m = HashMap::new();
        for (op, surfaces) in OPERATOR_SURFACES {
            for s in *surfaces {
                m.insert(*s, *op);
            }
        }
        m
    };
    static ref FUNCTION_NAMES: Vec<&'static str> = {
        FUNCTION_ALIASES.iter().flat_map(|a| a.iter().copied()).collect()
    };
}

impl Op {
    /// Resolves a surface form, word forms included.
    pub fn lookup(surface: &str) -> Option<Op> {
        SURFACE_TO_OP.get(surface).copied()
    }

    pub fn is_right_assoc(self) -> bool {
        matches!(self, Op::Pow | Op::Not)
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Op::Not)
    }

    /// The surface form used when rendering tokens back to text.
    pub fn text(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::IntDiv => "//",
            Op::Mod => "%",
            Op::Root => "\\",
            Op::Pow => "**",
            Op::And => "&&",
            Op::Or => "||",
            Op::Not => "!",
            Op::Xor => "XOR",
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }

    /// Applies a binary operator. `digits` is the working precision for
    /// the precision-dependent operators. Unary operators go through
    /// [`Op::apply_unary`] instead.
    pub fn apply(self, lhs: Value, rhs: Value, digits: usize) -> CalcResult {
        match self {
            Op::Add => Ok(lhs.addition(rhs)),
            Op::Sub => Ok(lhs.subtract(rhs)),
            Op::Mul => Ok(lhs.multiply(rhs)),
            Op::Div => lhs.divide(rhs),
            Op::IntDiv => lhs.div_int(rhs),
            Op::Mod => lhs.modulo(rhs),
            Op::Root => lhs.nth_root(rhs, digits),
            Op::Pow => lhs.power(rhs, digits),
            Op::And => Ok(lhs.logical_and(rhs)),
            Op::Or => Ok(lhs.logical_or(rhs)),
            Op::Xor => Ok(lhs.logical_xor(rhs)),
            Op::Not => Err(CalcError::Unreachable),
            Op::Eq => Ok(lhs.eq(rhs)),
            Op::Ne => Ok(lhs.neq(rhs)),
            Op::Lt => Ok(lhs.less(rhs)),
            Op::Le => Ok(lhs.lesseq(rhs)),
            Op::Gt => Ok(lhs.greater(rhs)),
            Op::Ge => Ok(lhs.greatereq(rhs)),
        }
    }

    /// Applies a unary operator to the operand on its right.
    pub fn apply_unary(self, rhs: Value) -> CalcResult {
        match self {
            Op::Not => Ok(rhs.logical_not()),
            _ => Err(CalcError::Unreachable),
        }
    }
}

pub fn is_constant(name: &str) -> bool {
    CONSTANT_ALIASES.iter().any(|a| a.contains(&name))
}

pub fn is_function(name: &str) -> bool {
    FUNCTION_NAMES.contains(&name)
}

/// Applies a named unary function to its operand.
pub fn apply_function(name: &str, v: Value, digits: usize) -> CalcResult {
    match name {
        "abs" => Ok(v.abs()),
        "floor" => Ok(v.floor()),
        "ceil" | "ceiling" => Ok(v.ceil()),
        "round" => Ok(v.round()),
        "sqrt" => v.sqrt(digits),
        "exp" => Ok(v.exp(digits)),
        "ln" => v.ln(digits),
        "log" | "log10" => v.log10(digits),
        "log2" => v.log2(digits),
        "fac" | "factorial" => v.fact(),
        "rad" => Ok(v.rad(digits)),
        "deg" => Ok(v.deg(digits)),
        "sin" => Ok(v.sin(digits)),
        "cos" => Ok(v.cos(digits)),
        "tan" => v.tan(digits),
        "asin" => v.asin(digits),
        "acos" => v.acos(digits),
        "atan" => Ok(v.atan(digits)),
        "sinh" => Ok(v.sinh(digits)),
        "cosh" => Ok(v.cosh(digits)),
        "tanh" => Ok(v.tanh(digits)),
        "asinh" => Ok(v.asinh(digits)),
        "acosh" => v.acosh(digits),
        "atanh" => v.atanh(digits),
        _ => Err(CalcError::UnknownToken(name.to_string())),
    }
}
