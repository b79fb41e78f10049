use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::errors::CalcError;
use crate::precise;

pub type CalcResult = Result<Value, CalcError>;

/// A single operand: an exact rational carried between reducer passes.
/// Arithmetic on values never rounds; only the precision-dependent
/// functions (roots, logarithms, trigonometry) truncate, and they do it
/// at the working precision handed in as `digits`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Value(BigRational);

impl Value {
    pub fn from_integer(i: i64) -> Value {
        Value(BigRational::from_integer(BigInt::from(i)))
    }

    pub fn from_ratio(r: BigRational) -> Value {
        Value(r)
    }

    pub fn zero() -> Value {
        Value(BigRational::zero())
    }

    pub fn one() -> Value {
        Value(BigRational::one())
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parses an unsigned or `-`-signed decimal literal: `12`, `3.25`.
    pub fn from_decimal_str(s: &str) -> Option<Value> {
        let (neg, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int_text, frac_text) = match digits.find('.') {
            Some(pos) => (&digits[..pos], &digits[pos + 1..]),
            None => (digits, ""),
        };
        if int_text.is_empty() || !int_text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !frac_text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let numer = BigInt::parse_bytes(format!("{}{}", int_text, frac_text).as_bytes(), 10)?;
        let r = BigRational::new(numer, precise::pow10(frac_text.len()));
        Some(Value(if neg { -r } else { r }))
    }

    /// Parses a seed for `ans`: a plain literal or a previously printed
    /// result, including truncated (`...`) and compressed (`e±k`) forms.
    pub fn from_result_str(s: &str) -> CalcResult {
        let text = s.trim();
        let text = text.strip_suffix("...").unwrap_or(text);
        let bad = || CalcError::UnknownToken(s.trim().to_string());
        let (mantissa, exponent) = match text.find(|c| c == 'e' || c == 'E') {
            Some(pos) => {
                let exp_text = text[pos + 1..].trim_start_matches('+');
                let exp: i64 = exp_text.parse().map_err(|_| bad())?;
                (&text[..pos], exp)
            }
            None => (text, 0i64),
        };
        let value = Value::from_decimal_str(mantissa).ok_or_else(bad)?;
        if exponent > 0 {
            Ok(Value(
                value.0 * BigRational::from_integer(precise::pow10(exponent as usize)),
            ))
        } else if exponent < 0 {
            Ok(Value(
                value.0 / BigRational::from_integer(precise::pow10(-exponent as usize)),
            ))
        } else {
            Ok(value)
        }
    }

    fn truthy(&self) -> bool {
        !self.0.is_zero()
    }

    fn bool_value(b: bool) -> Value {
        if b {
            Value::one()
        } else {
            Value::zero()
        }
    }

    fn scaled(&self, digits: usize) -> BigInt {
        precise::to_scaled(&self.0, digits)
    }

    fn from_scaled_int(x: BigInt, digits: usize) -> Value {
        Value(precise::from_scaled(x, digits))
    }

    // transcendental results get snapped so exact answers print exactly
    fn transcendental(x: BigInt, digits: usize) -> Value {
        Value(precise::from_scaled(precise::snap(x, digits), digits))
    }

    pub fn negate(self) -> Value {
        Value(-self.0)
    }

    pub fn addition(self, rhs: Value) -> Value {
        Value(self.0 + rhs.0)
    }

    pub fn subtract(self, rhs: Value) -> Value {
        Value(self.0 - rhs.0)
    }

    pub fn multiply(self, rhs: Value) -> Value {
        Value(self.0 * rhs.0)
    }

    pub fn divide(self, rhs: Value) -> CalcResult {
        if rhs.0.is_zero() {
            return Err(CalcError::DividedByZero(self.to_string()));
        }
        Ok(Value(self.0 / rhs.0))
    }

    /// `//`: division floored toward negative infinity.
    pub fn div_int(self, rhs: Value) -> CalcResult {
        if rhs.0.is_zero() {
            return Err(CalcError::DividedByZero(self.to_string()));
        }
        Ok(Value((self.0 / rhs.0).floor()))
    }

    /// `%`: computes `a - b * floor(a / b)`, so the result takes the
    /// divisor's sign.
    pub fn modulo(self, rhs: Value) -> CalcResult {
        if rhs.0.is_zero() {
            return Err(CalcError::DividedByZero(self.to_string()));
        }
        let q = (&self.0 / &rhs.0).floor();
        Ok(Value(self.0 - rhs.0 * q))
    }

    /// `**` and `^`. Integer exponents stay exact; fractional exponents
    /// go through `exp(b ln a)` at the working precision.
    pub fn power(self, rhs: Value, digits: usize) -> CalcResult {
        if rhs.0.is_integer() {
            return pow_integer(&self.0, rhs.0.numer());
        }
        if self.0.is_zero() {
            return if rhs.0.is_positive() {
                Ok(Value::zero())
            } else {
                Err(CalcError::DividedByZero("0".to_string()))
            };
        }
        if self.0.is_negative() {
            return Err(CalcError::Domain(
                "fractional power of a negative base".to_string(),
                self.to_string(),
            ));
        }
        let base = self.scaled(digits);
        if base.is_zero() {
            return Err(CalcError::Domain(
                "base below the working precision".to_string(),
                self.to_string(),
            ));
        }
        let ln = precise::ln_scaled(&base, digits);
        let product = rhs.scaled(digits) * ln / precise::pow10(digits);
        Ok(Value::transcendental(
            precise::exp_scaled(&product, digits),
            digits,
        ))
    }

    /// `\`: computes `floor(a^(1/b))`. Non-negative integer arguments use the
    /// exact integer Newton root; everything else takes the power path
    /// and floors the result.
    pub fn nth_root(self, rhs: Value, digits: usize) -> CalcResult {
        if rhs.0.is_zero() {
            return Err(CalcError::Domain(
                "zeroth root".to_string(),
                self.to_string(),
            ));
        }
        if self.0.is_negative() {
            return Err(CalcError::Domain(
                "root of a negative number".to_string(),
                self.to_string(),
            ));
        }
        if self.0.is_integer() && rhs.0.is_integer() && rhs.0.is_positive() {
            if let Some(n) = rhs.0.numer().to_u32() {
                let root = precise::nth_root(self.0.numer(), n);
                return Ok(Value(BigRational::from_integer(root)));
            }
        }
        let exponent = Value(BigRational::one() / rhs.0);
        let powered = self.power(exponent, digits)?;
        Ok(Value(powered.0.floor()))
    }

    /// `!` as a function name: factorial of a non-negative integer.
    pub fn fact(self) -> CalcResult {
        if !self.0.is_integer() || self.0.is_negative() {
            return Err(CalcError::Domain(
                "factorial of a non-natural number".to_string(),
                self.to_string(),
            ));
        }
        let n = self.0.to_integer();
        let mut acc = BigInt::one();
        let mut i = BigInt::one();
        while i <= n {
            acc *= &i;
            i += 1u32;
        }
        Ok(Value(BigRational::from_integer(acc)))
    }

    pub fn eq(self, rhs: Value) -> Value {
        Value::bool_value(self.0 == rhs.0)
    }

    pub fn neq(self, rhs: Value) -> Value {
        Value::bool_value(self.0 != rhs.0)
    }

    pub fn less(self, rhs: Value) -> Value {
        Value::bool_value(self.0 < rhs.0)
    }

    pub fn lesseq(self, rhs: Value) -> Value {
        Value::bool_value(self.0 <= rhs.0)
    }

    pub fn greater(self, rhs: Value) -> Value {
        Value::bool_value(self.0 > rhs.0)
    }

    pub fn greatereq(self, rhs: Value) -> Value {
        Value::bool_value(self.0 >= rhs.0)
    }

    pub fn logical_and(self, rhs: Value) -> Value {
        Value::bool_value(self.truthy() && rhs.truthy())
    }

    pub fn logical_or(self, rhs: Value) -> Value {
        Value::bool_value(self.truthy() || rhs.truthy())
    }

    pub fn logical_xor(self, rhs: Value) -> Value {
        Value::bool_value(self.truthy() != rhs.truthy())
    }

    pub fn logical_not(self) -> Value {
        Value::bool_value(!self.truthy())
    }

    pub fn abs(self) -> Value {
        Value(self.0.abs())
    }

    pub fn floor(self) -> Value {
        Value(self.0.floor())
    }

    pub fn ceil(self) -> Value {
        Value(self.0.ceil())
    }

    /// Rounds to the nearest integer, ties upward.
    pub fn round(self) -> Value {
        let half = BigRational::new(BigInt::one(), BigInt::from(2));
        Value((self.0 + half).floor())
    }

    pub fn sqrt(self, digits: usize) -> CalcResult {
        if self.0.is_negative() {
            return Err(CalcError::Domain(
                "square root of a negative number".to_string(),
                self.to_string(),
            ));
        }
        let s = self.scaled(digits);
        Ok(Value::from_scaled_int(
            precise::sqrt_scaled(&s, digits),
            digits,
        ))
    }

    pub fn exp(self, digits: usize) -> Value {
        let s = self.scaled(digits);
        Value::transcendental(precise::exp_scaled(&s, digits), digits)
    }

    pub fn ln(self, digits: usize) -> CalcResult {
        let s = self.positive_scaled(digits, "logarithm of a non-positive number")?;
        Ok(Value::transcendental(
            precise::ln_scaled(&s, digits),
            digits,
        ))
    }

    pub fn log10(self, digits: usize) -> CalcResult {
        self.log_base(10, digits)
    }

    pub fn log2(self, digits: usize) -> CalcResult {
        self.log_base(2, digits)
    }

    fn log_base(self, base: u32, digits: usize) -> CalcResult {
        let s = self.positive_scaled(digits, "logarithm of a non-positive number")?;
        let ln_x = precise::ln_scaled(&s, digits);
        let ln_b = precise::ln_scaled(&(precise::pow10(digits) * base), digits);
        Ok(Value::transcendental(
            ln_x * precise::pow10(digits) / ln_b,
            digits,
        ))
    }

    fn positive_scaled(self, digits: usize, what: &str) -> Result<BigInt, CalcError> {
        if !self.0.is_positive() {
            return Err(CalcError::Domain(what.to_string(), self.to_string()));
        }
        let s = self.scaled(digits);
        if s.is_zero() {
            return Err(CalcError::Domain(
                "value below the working precision".to_string(),
                self.to_string(),
            ));
        }
        Ok(s)
    }

    pub fn sin(self, digits: usize) -> Value {
        let s = self.scaled(digits);
        Value::transcendental(precise::sin_scaled(&s, digits), digits)
    }

    pub fn cos(self, digits: usize) -> Value {
        let s = self.scaled(digits);
        Value::transcendental(precise::cos_scaled(&s, digits), digits)
    }

    pub fn tan(self, digits: usize) -> CalcResult {
        let s = self.scaled(digits);
        let cos = precise::snap(precise::cos_scaled(&s, digits), digits);
        if cos.is_zero() {
            return Err(CalcError::Domain(
                "tangent undefined at".to_string(),
                self.to_string(),
            ));
        }
        let sin = precise::sin_scaled(&s, digits);
        Ok(Value::transcendental(
            sin * precise::pow10(digits) / cos,
            digits,
        ))
    }

    pub fn atan(self, digits: usize) -> Value {
        let s = self.scaled(digits);
        Value::transcendental(precise::atan_scaled(&s, digits), digits)
    }

    /// `asin(x) = atan(x / sqrt(1 - x^2))`, with the endpoints pinned
    /// to `±pi/2`.
    pub fn asin(self, digits: usize) -> CalcResult {
        let one = BigRational::one();
        if self.0.abs() > one {
            return Err(CalcError::Domain(
                "arcsine argument outside [-1, 1]".to_string(),
                self.to_string(),
            ));
        }
        if self.0.abs() == one {
            return Ok(Value::signed_half_pi(self.0.is_negative(), digits));
        }
        let scale = precise::pow10(digits);
        let s = self.scaled(digits);
        let x2 = &s * &s / &scale;
        let root = precise::sqrt_scaled(&(&scale - x2), digits);
        if root.is_zero() {
            return Ok(Value::signed_half_pi(self.0.is_negative(), digits));
        }
        let t = s * &scale / root;
        Ok(Value::transcendental(
            precise::atan_scaled(&t, digits),
            digits,
        ))
    }

    fn signed_half_pi(negative: bool, digits: usize) -> Value {
        let half_pi = precise::from_scaled(precise::pi_scaled(digits), digits)
            / BigRational::from_integer(BigInt::from(2));
        Value(if negative { -half_pi } else { half_pi })
    }

    /// `acos(x) = pi/2 - asin(x)`.
    pub fn acos(self, digits: usize) -> CalcResult {
        let asin = self.asin(digits)?;
        let half_pi = Value::signed_half_pi(false, digits);
        Ok(Value(half_pi.0 - asin.0))
    }

    pub fn sinh(self, digits: usize) -> Value {
        let s = self.scaled(digits);
        let up = precise::exp_scaled(&s, digits);
        let down = precise::exp_scaled(&(-&s), digits);
        Value::transcendental((up - down) / 2, digits)
    }

    pub fn cosh(self, digits: usize) -> Value {
        let s = self.scaled(digits);
        let up = precise::exp_scaled(&s, digits);
        let down = precise::exp_scaled(&(-&s), digits);
        Value::transcendental((up + down) / 2, digits)
    }

    pub fn tanh(self, digits: usize) -> Value {
        let s = self.scaled(digits);
        let up = precise::exp_scaled(&s, digits);
        let down = precise::exp_scaled(&(-&s), digits);
        // cosh is never zero
        Value::transcendental((&up - &down) * precise::pow10(digits) / (up + down), digits)
    }

    /// `asinh(x) = ln(x + sqrt(x^2 + 1))`.
    pub fn asinh(self, digits: usize) -> Value {
        let scale = precise::pow10(digits);
        let s = self.scaled(digits);
        let x2 = &s * &s / &scale;
        let root = precise::sqrt_scaled(&(x2 + &scale), digits);
        Value::transcendental(precise::ln_scaled(&(s + root), digits), digits)
    }

    /// `acosh(x) = ln(x + sqrt(x^2 - 1))` for `x >= 1`.
    pub fn acosh(self, digits: usize) -> CalcResult {
        if self.0 < BigRational::one() {
            return Err(CalcError::Domain(
                "inverse hyperbolic cosine argument below 1".to_string(),
                self.to_string(),
            ));
        }
        let scale = precise::pow10(digits);
        let s = self.scaled(digits);
        let x2 = &s * &s / &scale;
        let root = precise::sqrt_scaled(&(x2 - &scale), digits);
        Ok(Value::transcendental(
            precise::ln_scaled(&(s + root), digits),
            digits,
        ))
    }

    /// `atanh(x) = ln((1 + x)/(1 - x)) / 2` for `|x| < 1`.
    pub fn atanh(self, digits: usize) -> CalcResult {
        if self.0.abs() >= BigRational::one() {
            return Err(CalcError::Domain(
                "inverse hyperbolic tangent argument outside (-1, 1)".to_string(),
                self.to_string(),
            ));
        }
        let scale = precise::pow10(digits);
        let s = self.scaled(digits);
        let ratio = (&scale + &s) * &scale / (&scale - &s);
        if ratio.is_zero() {
            return Err(CalcError::Domain(
                "value below the working precision".to_string(),
                self.to_string(),
            ));
        }
        Ok(Value::transcendental(
            precise::ln_scaled(&ratio, digits) / 2,
            digits,
        ))
    }

    /// Degrees to radians: `x * pi / 180`.
    pub fn rad(self, digits: usize) -> Value {
        let pi = precise::from_scaled(precise::pi_scaled(digits), digits);
        Value(self.0 * pi / BigRational::from_integer(BigInt::from(180)))
    }

    /// Radians to degrees: `x * 180 / pi`.
    pub fn deg(self, digits: usize) -> Value {
        let pi = precise::from_scaled(precise::pi_scaled(digits), digits);
        Value(self.0 * BigRational::from_integer(BigInt::from(180)) / pi)
    }
}

impl fmt::Display for Value {
    /// Integers print plainly, terminating decimals exactly, everything
    /// else as `numerator/denominator`. Used in traces and error texts;
    /// the result formatter has its own rendering.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_integer() {
            return write!(f, "{}", self.0.numer());
        }
        let mut d = self.0.denom().clone();
        let mut twos = 0usize;
        let mut fives = 0usize;
        while (&d % 2u32).is_zero() {
            d /= 2u32;
            twos += 1;
        }
        while (&d % 5u32).is_zero() {
            d /= 5u32;
            fives += 1;
        }
        if d.is_one() {
            let digits = twos.max(fives);
            let scaled = precise::to_scaled(&self.0, digits);
            return write!(f, "{}", precise::scaled_to_decimal(&scaled, digits));
        }
        write!(f, "{}/{}", self.0.numer(), self.0.denom())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn pow_integer(base: &BigRational, exp: &BigInt) -> CalcResult {
    if exp.is_negative() {
        if base.is_zero() {
            return Err(CalcError::DividedByZero("0".to_string()));
        }
        let pos = pow_integer(base, &-exp.clone())?;
        return Value::one().divide(pos);
    }
    let mut acc = BigRational::one();
    let mut b = base.clone();
    let mut e = exp.clone();
    let two = BigInt::from(2);
    while e.is_positive() {
        if (&e % &two).is_one() {
            acc = acc * &b;
        }
        e /= &two;
        if e.is_positive() {
            b = &b * &b;
        }
    }
    Ok(Value(acc))
}
