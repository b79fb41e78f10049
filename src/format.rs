//! Result formatter. The reducer hands over an exact rational; this is
//! the only place where digits are dropped. The value is stringified in
//! fixed point at the working precision, trailing zeros are trimmed,
//! oversized fractions are cut back to the display length (the slack
//! digits go first, so the visible tail is not polluted by kernel
//! noise), a repeating tail is marked with `...`, and an integer part
//! longer than the display length is compressed to `<mantissa>e+k`.

use num_rational::BigRational;
use num_traits::Signed;

use crate::precise::{self, PRECISION_SLACK};

/// Renders `value` within `display_len` characters (sign excluded).
/// `precision` is the fractional digit count of the working precision;
/// it exceeds `display_len` by [`PRECISION_SLACK`]. Appends one line
/// per formatting decision to `notes`.
pub fn render(
    value: &BigRational,
    display_len: usize,
    precision: usize,
    notes: &mut Vec<String>,
) -> String {
    let scaled = precise::to_scaled(value, precision);
    let neg = scaled.is_negative();
    let abs = scaled.abs();
    let scale = precise::pow10(precision);
    let int_text = (&abs / &scale).to_string();
    let frac_raw = (&abs % &scale).to_string();
    let mut frac_text = format!("{:0>width$}", frac_raw, width = precision);
    while frac_text.ends_with('0') {
        frac_text.pop();
    }

    let mut recurring = false;
    let full_len = int_text.len() + if frac_text.is_empty() { 0 } else { 1 + frac_text.len() };
    if full_len > display_len && !frac_text.is_empty() {
        let drop = frac_text.len().min(PRECISION_SLACK);
        frac_text.truncate(frac_text.len() - drop);
        notes.push(format!("dropped {} slack digits", drop));
        let keep = display_len.saturating_sub(int_text.len());
        if frac_text.len() > keep {
            frac_text.truncate(keep);
            notes.push(format!("fraction cut to {} digits", keep));
        }
        while frac_text.ends_with('0') {
            frac_text.pop();
        }
        if let Some(period) = repeating_tail(&frac_text) {
            recurring = true;
            notes.push(format!("repeating tail, period {}", period));
        }
    }

    let int_text = if int_text.len() > display_len {
        let k = int_text.len() - display_len;
        notes.push(format!("integer part compressed by e+{}", k));
        format!("{}e+{}", &int_text[..display_len], k)
    } else {
        int_text
    };

    let mut out = if frac_text.is_empty() {
        int_text
    } else {
        format!("{}.{}", int_text, frac_text)
    };
    if recurring {
        out.push_str("...");
    }
    if neg {
        out.insert(0, '-');
    }
    out
}

/// Looks for a repeating tail in the kept fractional digits, walking
/// candidate periods from long to short. A period is confirmed when the
/// digits end with the block repeated twice, or with two blocks followed
/// by a partial third.
fn repeating_tail(frac: &str) -> Option<usize> {
    let b = frac.as_bytes();
    let n = b.len();
    let mut period = n / 2;
    while period >= 1 {
        if b[n - 2 * period..n - period] == b[n - period..] {
            return Some(period);
        }
        for partial in 1..period {
            if n < 2 * period + partial {
                continue;
            }
            let start = n - partial - 2 * period;
            if b[start..start + period] == b[start + period..start + 2 * period]
                && b[n - partial..] == b[start..start + partial]
            {
                return Some(period);
            }
        }
        period -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn ratio(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn fmt(value: &BigRational, display_len: usize) -> String {
        let mut notes = Vec::new();
        render(value, display_len, display_len + PRECISION_SLACK, &mut notes)
    }

    #[test]
    fn test_integers() {
        assert_eq!(fmt(&ratio(14, 1), 100), "14");
        assert_eq!(fmt(&ratio(0, 1), 100), "0");
        assert_eq!(fmt(&ratio(-42, 1), 100), "-42");
    }

    #[test]
    fn test_terminating_decimals() {
        assert_eq!(fmt(&ratio(5, 2), 100), "2.5");
        assert_eq!(fmt(&ratio(1, 8), 100), "0.125");
        assert_eq!(fmt(&ratio(-1, 4), 100), "-0.25");
    }

    #[test]
    fn test_recurring_third() {
        assert_eq!(fmt(&ratio(1, 3), 20), "0.3333333333333333333...");
        assert_eq!(fmt(&ratio(-1, 3), 20), "-0.3333333333333333333...");
    }

    #[test]
    fn test_recurring_longer_period() {
        // 1/7 repeats with period 6
        assert_eq!(fmt(&ratio(1, 7), 20), "0.1428571428571428571...");
        // 1/12 = 0.08333... repeats after a non-repeating prefix
        assert_eq!(fmt(&ratio(1, 12), 20), "0.0833333333333333333...");
    }

    #[test]
    fn test_pi_window() {
        let precision = 60;
        let pi = precise::from_scaled(precise::pi_scaled(precision), precision);
        let mut notes = Vec::new();
        assert_eq!(
            render(&pi, 50, precision, &mut notes),
            "3.1415926535897932384626433832795028841971693993751"
        );
    }

    #[test]
    fn test_integer_compression() {
        // 2^100 within 10 characters
        let mut big = BigInt::from(1);
        for _ in 0..100 {
            big *= 2;
        }
        let v = BigRational::from_integer(big);
        assert_eq!(fmt(&v, 10), "1267650600e+21");
        assert_eq!(fmt(&(-v), 10), "-1267650600e+21");
    }

    #[test]
    fn test_no_false_recurrence() {
        let precision = 60;
        let pi = precise::from_scaled(precise::pi_scaled(precision), precision);
        let mut notes = Vec::new();
        let out = render(&pi, 50, precision, &mut notes);
        assert!(!out.ends_with("..."));
    }

    #[test]
    fn test_fraction_shorter_than_window() {
        // fits even though the working precision is much larger
        assert_eq!(fmt(&ratio(325, 100), 10), "3.25");
    }

    #[test]
    fn test_repeating_tail_detector() {
        // the longest confirmed period wins; only Some/None matters upstream
        assert_eq!(repeating_tail("3333333333"), Some(5));
        assert_eq!(repeating_tail("1428571428571428571"), Some(6));
        assert_eq!(repeating_tail("1415926535"), None);
        assert_eq!(repeating_tail(""), None);
        assert_eq!(repeating_tail("5"), None);
    }
}
