//! Expression evaluator with exact arbitrary-precision arithmetic.
//!
//! An expression is tokenized, parentheses are resolved innermost
//! first, and the remaining tokens are reduced in three phases:
//! constants, functions, then operators in falling precedence. Values
//! stay exact rationals the whole way; only the final formatter drops
//! digits, detects recurring tails, and compresses oversized numbers
//! to `<mantissa>e±k`.
//!
//! Supported binary operators (aliases in parentheses):
//!
//! * `+`, `-`, `*` (`x`, `×`, `·`), `/` (`÷`, `:`)
//! * `//` - integer division, `%` (`mod`) - modulo
//! * `**` (`^`) - power, `\` - integer root
//! * `&&` (`AND`), `||` (`OR`), `XOR`, unary `!` (`NOT`)
//! * `==` (`=`), `!=` (`≠`), `<`, `<=` (`≤`), `>`, `>=` (`≥`)
//!
//! Functions: `abs`, `floor`, `ceil`/`ceiling`, `round`, `sqrt`/`√`,
//! `exp`, `ln`, `log`/`log10`, `log2`, `fac`/`factorial`, `rad`, `deg`,
//! `sin`, `cos`, `tan`, `asin`, `acos`, `atan`, `sinh`, `cosh`, `tanh`,
//! `asinh`, `acosh`, `atanh`.
//!
//! Constants: `ans` (the previous result), `pi`/`π`, `e`.
//!
//! ```
//! use xcalc::Calc;
//!
//! let mut calc = Calc::new(20);
//! assert_eq!(calc.eval("2(3+4)").unwrap(), "14");
//! assert_eq!(calc.eval("1/3").unwrap(), "0.3333333333333333333...");
//! ```

#[macro_use]
extern crate pest_derive;

pub mod errors;
pub mod format;
pub mod ops;
pub mod precise;
pub mod reduce;
pub mod token;
pub mod value;

pub use crate::errors::CalcError;
pub use crate::reduce::Calc;
pub use crate::value::Value;
