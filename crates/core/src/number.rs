//! Lenient number parsing and German-style number rendering.

use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("leading number pattern is valid")
});

/// Parse user input into a number, never failing.
///
/// The first `,` is treated as the decimal separator, leading whitespace is
/// skipped and the longest numeric prefix is used (`"12abc"` is `12`).
/// Input without a numeric prefix yields `0`.
pub fn parse_number(raw: &str) -> f64 {
    let normalised = raw.replacen(',', ".", 1);
    let text = normalised.trim_start();
    let Some(found) = LEADING_NUMBER.find(text) else {
        return 0.0;
    };
    let literal = found.as_str();
    let (negative, unsigned) = match literal.as_bytes()[0] {
        b'-' => (true, &literal[1..]),
        b'+' => (false, &literal[1..]),
        _ => (false, literal),
    };
    let magnitude = if unsigned == "Infinity" {
        f64::INFINITY
    } else {
        match unsigned.parse::<f64>() {
            Ok(value) => value,
            Err(_) => return 0.0,
        }
    };
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Round to the nearest integer, with exact halves rounded up
/// (`2.5 -> 3`, `-2.5 -> -2`). Non-finite values pass through.
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Round to an integer and group thousands with `.` (`1320 -> "1.320"`).
pub fn format_grouped(value: f64) -> String {
    let rounded = round_half_up(value);
    if rounded.is_nan() {
        return "NaN".to_string();
    }
    if rounded.is_infinite() {
        return if rounded > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// Shortest decimal rendering that reads back to the same value.
pub fn format_plain(value: f64) -> String {
    if let Some(label) = non_finite_label(value) {
        return label.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// Render with a fixed number of decimals and `.` as separator.
///
/// Values exactly halfway between two renderings take the one further from
/// zero (`0.125 -> "0.13"`); everything else rounds to nearest.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    if let Some(label) = non_finite_label(value) {
        return label.to_string();
    }
    if value != 0.0 && lowest_bit_exponent(value) == -(decimals as i64 + 1) {
        // Exactly representable with one more digit, which is a 5.
        let exact = format!("{value:.prec$}", prec = decimals + 1);
        return round_tie_away(&exact);
    }
    format!("{value:.decimals$}")
}

/// Exponent `e` such that `value` is an odd integer times `2^e`.
fn lowest_bit_exponent(value: f64) -> i64 {
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    exponent + i64::from(mantissa.trailing_zeros())
}

/// Drop the trailing `5` of `exact` and round the rest away from zero.
fn round_tie_away(exact: &str) -> String {
    let mut chars: Vec<char> = exact.chars().collect();
    chars.pop();
    if chars.last() == Some(&'.') {
        chars.pop();
    }
    let mut carry = true;
    for ch in chars.iter_mut().rev() {
        match *ch {
            '.' | '-' => continue,
            '9' => *ch = '0',
            digit => {
                *ch = char::from(digit as u8 + 1);
                carry = false;
                break;
            }
        }
    }
    if carry {
        let at = usize::from(chars.first() == Some(&'-'));
        chars.insert(at, '1');
    }
    chars.into_iter().collect()
}

fn non_finite_label(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("Infinity")
    } else if value == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}
