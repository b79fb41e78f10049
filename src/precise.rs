//! Fixed-point arbitrary-precision kernel.
//!
//! Every number here is a plain `BigInt` scaled by `10^digits`. The
//! kernels carry [`GUARD`] extra digits internally and round to nearest
//! when dropping them, so a result is accurate to about one unit of the
//! caller's scale. Transcendental results sitting within a whisker of a
//! slack-digit boundary can be collapsed onto it with [`snap`], which
//! lets exact answers like `log(1000)` print exactly.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Extra digits the formatter keeps on top of the display length.
pub const PRECISION_SLACK: usize = 10;

/// Extra digits carried inside the kernels.
const GUARD: usize = 12;

pub fn pow10(n: usize) -> BigInt {
    BigInt::from(10).pow(n as u32)
}

/// Rational to scaled integer: `trunc(r * 10^digits)`.
pub fn to_scaled(r: &BigRational, digits: usize) -> BigInt {
    (r.numer() * pow10(digits)) / r.denom()
}

/// Scaled integer back to the exact rational it denotes.
pub fn from_scaled(x: BigInt, digits: usize) -> BigRational {
    BigRational::new(x, pow10(digits))
}

/// Scaled integer to a fixed-point decimal string with `digits`
/// fractional places.
pub fn scaled_to_decimal(scaled: &BigInt, digits: usize) -> String {
    let neg = scaled.is_negative();
    let abs = scaled.abs();
    let scale = pow10(digits);
    let int_part = &abs / &scale;
    let sign = if neg { "-" } else { "" };
    if digits == 0 {
        return format!("{}{}", sign, int_part);
    }
    let frac_part = (&abs % &scale).to_string();
    format!("{}{}.{:0>width$}", sign, int_part, frac_part, width = digits)
}

// round to nearest while dropping the guard digits
fn unscale(x: BigInt) -> BigInt {
    let unit = pow10(GUARD);
    let neg = x.is_negative();
    let mag: BigInt = (x.abs() + &unit / 2) / unit;
    if neg {
        -mag
    } else {
        mag
    }
}

/// Collapses `x` onto a multiple of `10^PRECISION_SLACK` when it sits
/// within a few hundred units of one.
pub fn snap(x: BigInt, digits: usize) -> BigInt {
    let window = PRECISION_SLACK.min(digits);
    let unit = pow10(window);
    let tol = BigInt::from(1000);
    let rem = ((&x % &unit) + &unit) % &unit;
    if rem <= tol {
        x - rem
    } else if &unit - &rem <= tol {
        let bump = &unit - &rem;
        x + bump
    } else {
        x
    }
}

fn ipow(base: &BigInt, exp: u32) -> BigInt {
    let mut acc = BigInt::one();
    let mut b = base.clone();
    let mut e = exp;
    while e > 0 {
        if e & 1 == 1 {
            acc *= &b;
        }
        e >>= 1;
        if e > 0 {
            b = &b * &b;
        }
    }
    acc
}

/// Integer square root: `floor(sqrt(n))` for non-negative `n`.
pub fn isqrt(n: &BigInt) -> BigInt {
    if n.is_zero() {
        return BigInt::zero();
    }
    let mut y: BigInt = BigInt::one() << ((n.bits() / 2 + 1) as usize);
    loop {
        let next = (&y + n / &y) / 2;
        if next >= y {
            break;
        }
        y = next;
    }
    while &y * &y > *n {
        y -= 1u32;
    }
    y
}

/// `floor(sqrt(v) * 10^digits)` for a value already scaled by `10^digits`.
pub fn sqrt_scaled(x: &BigInt, digits: usize) -> BigInt {
    isqrt(&(x * pow10(digits)))
}

/// Integer nth root: `floor(a^(1/n))` for non-negative `a` and `n >= 1`.
pub fn nth_root(a: &BigInt, n: u32) -> BigInt {
    if a.is_zero() || a.is_one() || n == 1 {
        return a.clone();
    }
    let mut y: BigInt = BigInt::one() << ((a.bits() / n as u64 + 1) as usize);
    loop {
        let next = (&y * (n - 1) + a / ipow(&y, n - 1)) / n;
        if next >= y {
            break;
        }
        y = next;
    }
    while ipow(&y, n) > *a {
        y -= 1u32;
    }
    y
}

// atan(1/q) = 1/q - 1/(3 q^3) + 1/(5 q^5) - ...
fn arctan_inv_scaled(q: i64, scale: &BigInt) -> BigInt {
    let q = BigInt::from(q);
    let q2 = &q * &q;
    let mut qp = q.clone();
    let mut n: u64 = 1;
    let mut positive = true;
    let mut sum = BigInt::zero();
    loop {
        let term = scale / (&qp * n);
        if term.is_zero() {
            break;
        }
        if positive {
            sum += term;
        } else {
            sum -= term;
        }
        qp *= &q2;
        n += 2;
        positive = !positive;
    }
    sum
}

// atanh(1/q) = 1/q + 1/(3 q^3) + 1/(5 q^5) + ...
fn atanh_inv_scaled(q: i64, scale: &BigInt) -> BigInt {
    let q = BigInt::from(q);
    let q2 = &q * &q;
    let mut qp = q.clone();
    let mut n: u64 = 1;
    let mut sum = BigInt::zero();
    loop {
        let term = scale / (&qp * n);
        if term.is_zero() {
            break;
        }
        sum += term;
        qp *= &q2;
        n += 2;
    }
    sum
}

static PI_CACHE: OnceLock<Mutex<HashMap<usize, BigInt>>> = OnceLock::new();

/// `pi * 10^digits`. Machin: `pi = 16 atan(1/5) - 4 atan(1/239)`.
pub fn pi_scaled(digits: usize) -> BigInt {
    let cache = PI_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    if let Some(v) = cache.lock().expect("pi cache").get(&digits) {
        return v.clone();
    }
    let scale = pow10(digits + GUARD);
    let a = arctan_inv_scaled(5, &scale);
    let b = arctan_inv_scaled(239, &scale);
    let pi = unscale(BigInt::from(16) * a - BigInt::from(4) * b);
    cache.lock().expect("pi cache").insert(digits, pi.clone());
    pi
}

/// `exp(x)` for a scaled argument of either sign.
pub fn exp_scaled(x: &BigInt, digits: usize) -> BigInt {
    let scale = pow10(digits + GUARD);
    let mut r = x.abs() * pow10(GUARD);
    // halve the argument until the series converges fast, square back after
    let threshold: BigInt = &scale / 2;
    let mut halvings = 0usize;
    while r > threshold {
        r /= 2;
        halvings += 1;
    }
    let mut term = scale.clone();
    let mut sum = scale.clone();
    let mut n: u64 = 1;
    loop {
        term = &term * &r / &scale / n;
        if term.is_zero() {
            break;
        }
        sum += &term;
        n += 1;
    }
    for _ in 0..halvings {
        sum = &sum * &sum / &scale;
    }
    if x.is_negative() {
        sum = &scale * &scale / sum;
    }
    unscale(sum)
}

/// `ln(x)` for a positive scaled argument.
pub fn ln_scaled(x: &BigInt, digits: usize) -> BigInt {
    let scale = pow10(digits + GUARD);
    let mut m = x * pow10(GUARD);
    // normalize into [1, 2): ln x = k ln 2 + ln m
    let double: BigInt = &scale * 2;
    let mut k: i64 = 0;
    while m >= double {
        m /= 2;
        k += 1;
    }
    while m < scale {
        m *= 2;
        k -= 1;
    }
    let ln2 = atanh_inv_scaled(3, &scale) * 2;
    // atanh series on t = (m - 1)/(m + 1); t < 1/3 here
    let t = (&m - &scale) * &scale / (&m + &scale);
    let t2 = &t * &t / &scale;
    let mut power = t.clone();
    let mut sum = t.clone();
    let mut n: u64 = 3;
    loop {
        power = &power * &t2 / &scale;
        let term = &power / n;
        if term.is_zero() {
            break;
        }
        sum += term;
        n += 2;
    }
    unscale(ln2 * k + sum * 2)
}

// shift into [-pi, pi] before the Taylor series
fn reduce_angle(x_scaled: &BigInt, digits: usize) -> BigInt {
    let two_pi: BigInt = pi_scaled(digits) * 2;
    let mut r = x_scaled % &two_pi;
    if r.is_negative() {
        r += &two_pi;
    }
    if &r * 2 > two_pi {
        r -= &two_pi;
    }
    r
}

/// `sin(x)`, argument reduced modulo `2 pi`.
pub fn sin_scaled(x: &BigInt, digits: usize) -> BigInt {
    let scale = pow10(digits + GUARD);
    let r = reduce_angle(&(x * pow10(GUARD)), digits + GUARD);
    let r2 = &r * &r / &scale;
    let mut term = r.clone();
    let mut sum = r.clone();
    let mut n: u64 = 1;
    loop {
        term = -(&term * &r2 / &scale) / ((n + 1) * (n + 2));
        if term.is_zero() {
            break;
        }
        sum += &term;
        n += 2;
    }
    unscale(sum)
}

/// `cos(x)`, argument reduced modulo `2 pi`.
pub fn cos_scaled(x: &BigInt, digits: usize) -> BigInt {
    let scale = pow10(digits + GUARD);
    let r = reduce_angle(&(x * pow10(GUARD)), digits + GUARD);
    let r2 = &r * &r / &scale;
    let mut term = scale.clone();
    let mut sum = scale.clone();
    let mut n: u64 = 0;
    loop {
        term = -(&term * &r2 / &scale) / ((n + 1) * (n + 2));
        if term.is_zero() {
            break;
        }
        sum += &term;
        n += 2;
    }
    unscale(sum)
}

/// `atan(x)` via argument halving and the Maclaurin series.
pub fn atan_scaled(x: &BigInt, digits: usize) -> BigInt {
    let scale = pow10(digits + GUARD);
    let neg = x.is_negative();
    let mut a = x.abs() * pow10(GUARD);
    // atan(t) = 2 atan(t / (1 + sqrt(1 + t^2)))
    let quarter: BigInt = &scale / 4;
    let mut doublings = 0u32;
    while a > quarter {
        let t2 = &a * &a / &scale;
        let root = isqrt(&((&scale + &t2) * &scale));
        a = &a * &scale / (&scale + root);
        doublings += 1;
    }
    let a2 = &a * &a / &scale;
    let mut power = a.clone();
    let mut sum = a.clone();
    let mut n: u64 = 3;
    loop {
        power = -(&power * &a2 / &scale);
        let term = &power / n;
        if term.is_zero() {
            break;
        }
        sum += term;
        n += 2;
    }
    sum *= ipow(&BigInt::from(2), doublings);
    if neg {
        sum = -sum;
    }
    unscale(sum)
}
