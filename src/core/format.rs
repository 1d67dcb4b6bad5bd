//! US-dollar display strings for projection values.
//!
//! Rounding is half away from zero, matching how browsers render `en-US`
//! currency, and only ever applied to the displayed string.

const THOUSAND: f64 = 1_000.0;
const MILLION: f64 = 1_000_000.0;

/// Whole-dollar currency string, e.g. `$1,234` or `-$1,234`.
pub fn format_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    match non_finite_magnitude(value) {
        Some(magnitude) => format!("{sign}${magnitude}"),
        None => format!("{sign}${}", group_thousands(&whole_digits(value.abs()))),
    }
}

/// Abbreviated currency string with a `K` or `M` suffix and one fraction digit.
/// Values under a thousand fall back to [`format_currency`].
pub fn format_large_currency(value: f64) -> String {
    let abs_value = value.abs();
    let prefix = if value < 0.0 { "-" } else { "" };

    if non_finite_magnitude(value).is_some() {
        return format_currency(value);
    }

    if abs_value >= MILLION {
        format!("{prefix}${}M", one_decimal(abs_value / MILLION))
    } else if abs_value >= THOUSAND {
        format!("{prefix}${}K", one_decimal(abs_value / THOUSAND))
    } else {
        format_currency(value)
    }
}

/// Two-decimal percentage used for withdrawal rates. Division by a zero
/// balance is legal upstream, so infinities render as `Infinity`.
pub fn format_rate(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value == 0.0 {
        // Covers negative zero.
        "0.00".to_string()
    } else {
        let sign = if value < 0.0 { "-" } else { "" };
        let magnitude = value.abs();
        // Exact ties at the third decimal are odd multiples of 1/8; `{:.2}`
        // would send them to the even neighbour, these go away from zero.
        let is_tie = (magnitude * 8.0).fract() == 0.0 && (magnitude * 4.0).fract() != 0.0;
        let rounded = if is_tie {
            (magnitude * 100.0).ceil() / 100.0
        } else {
            magnitude
        };
        format!("{sign}{rounded:.2}")
    }
}

fn non_finite_magnitude(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value.is_infinite() {
        Some("∞")
    } else {
        None
    }
}

fn whole_digits(abs_value: f64) -> String {
    round_shortest(abs_value, 0).0
}

fn one_decimal(abs_value: f64) -> String {
    let (whole, fraction) = round_shortest(abs_value, 1);
    format!("{}.{fraction}", group_thousands(&whole))
}

/// Rounds the shortest decimal form of `abs_value` half-up to
/// `fraction_digits`, returning the whole and fraction digit strings.
fn round_shortest(abs_value: f64, fraction_digits: usize) -> (String, String) {
    let repr = abs_value.to_string();
    let (whole, fraction) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let mut digits: Vec<u8> = whole.bytes().collect();
    digits.extend(
        fraction
            .bytes()
            .chain(std::iter::repeat(b'0'))
            .take(fraction_digits),
    );
    let round_up = fraction
        .as_bytes()
        .get(fraction_digits)
        .is_some_and(|&d| d >= b'5');

    if round_up {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let split = digits.len() - fraction_digits;
    let fraction = String::from_utf8_lossy(&digits[split..]).into_owned();
    let whole = String::from_utf8_lossy(&digits[..split]).into_owned();
    (whole, fraction)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_formats_integers() {
        assert_eq!(format_currency(1234.0), "$1,234");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000");
        assert_eq!(format_currency(999.0), "$999");
    }

    #[test]
    fn currency_handles_negative_numbers() {
        assert_eq!(format_currency(-1234.0), "-$1,234");
    }

    #[test]
    fn currency_rounds_to_whole_dollars() {
        assert_eq!(format_currency(1234.56), "$1,235");
        assert_eq!(format_currency(1234.49), "$1,234");
        assert_eq!(format_currency(2.5), "$3");
    }

    #[test]
    fn currency_renders_non_finite_values() {
        assert_eq!(format_currency(f64::NAN), "$NaN");
        assert_eq!(format_currency(f64::NEG_INFINITY), "-$∞");
    }

    #[test]
    fn large_currency_leaves_small_values_alone() {
        assert_eq!(format_large_currency(123.0), "$123");
        assert_eq!(format_large_currency(999.0), "$999");
    }

    #[test]
    fn large_currency_uses_k_suffix_below_a_million() {
        assert_eq!(format_large_currency(1000.0), "$1.0K");
        assert_eq!(format_large_currency(12345.0), "$12.3K");
        assert_eq!(format_large_currency(999_999.0), "$1,000.0K");
    }

    #[test]
    fn large_currency_uses_m_suffix_from_a_million() {
        assert_eq!(format_large_currency(1_000_000.0), "$1.0M");
        assert_eq!(format_large_currency(1_234_567.0), "$1.2M");
        assert_eq!(format_large_currency(9_876_543.0), "$9.9M");
        assert_eq!(format_large_currency(2_500_000_000.0), "$2,500.0M");
    }

    #[test]
    fn large_currency_rounds_the_shortest_decimal_form() {
        // 1.15 and 1.45 are stored just below the midpoint.
        assert_eq!(format_large_currency(1_150.0), "$1.2K");
        assert_eq!(format_large_currency(1_450.0), "$1.5K");
        assert_eq!(format_large_currency(1_250_000.0), "$1.3M");
        assert_eq!(format_large_currency(99_950.0), "$100.0K");
        assert_eq!(format_large_currency(9_999_999.0), "$10.0M");
    }

    #[test]
    fn currency_rounds_huge_values_without_exponent() {
        assert_eq!(format_currency(1e21), "$1,000,000,000,000,000,000,000");
    }

    #[test]
    fn large_currency_handles_negative_numbers() {
        assert_eq!(format_large_currency(-1234.0), "-$1.2K");
        assert_eq!(format_large_currency(-1_234_567.0), "-$1.2M");
    }

    #[test]
    fn rate_uses_two_decimals() {
        assert_eq!(format_rate(4.8), "4.80");
        assert_eq!(format_rate(320.0), "320.00");
        assert_eq!(format_rate(-6.0), "-6.00");
        assert_eq!(format_rate(-0.0), "0.00");
        assert_eq!(format_rate(-0.004), "-0.00");
    }

    #[test]
    fn rate_rounds_exact_ties_away_from_zero() {
        assert_eq!(format_rate(1.125), "1.13");
        assert_eq!(format_rate(-1.125), "-1.13");
        assert_eq!(format_rate(2.375), "2.38");
        assert_eq!(format_rate(0.625), "0.63");
        // 1.005 sits just below the tie in binary.
        assert_eq!(format_rate(1.005), "1.00");
        assert_eq!(format_rate(2.25), "2.25");
    }

    #[test]
    fn rate_renders_non_finite_values() {
        assert_eq!(format_rate(f64::INFINITY), "Infinity");
        assert_eq!(format_rate(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_rate(f64::NAN), "NaN");
    }
}
