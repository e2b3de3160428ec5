//! # tally-numeric
//!
//! Answer normalization and numeric parsing for TALLY.
//!
//! This crate provides:
//! - Canonical string normalization for raw student answers
//! - Fraction and mixed-number parsing to floating point
//! - Coordinate-pair parsing
//! - Tolerance-based numeric and coordinate comparison
//!
//! All parsers are total: malformed input yields `None`, never an
//! error. A zero denominator is treated as "no match" so callers can
//! fall through to a different representation.

use once_cell::sync::Lazy;
use regex::Regex;
use tally_core::approx_eq;

/// Leading `x=`-style prefix on a submitted answer
static VAR_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]\s*=\s*").unwrap());

/// Trailing zeros after a nonzero fractional digit, e.g. `2.50`
static FRACTIONAL_ZEROS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\.\d*[1-9])0+$").unwrap());

/// A fractional part that is entirely zeros (or empty), e.g. `3.000` or `3.`
static ZERO_FRACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.0*$").unwrap());

/// Mixed number: whole part, space, numerator/denominator
static MIXED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?\d+)\s+(\d+)\s*/\s*(\d+)$").unwrap());

/// Simple fraction: numerator/denominator
static SIMPLE_FRACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?\d+)\s*/\s*([+-]?\d+)$").unwrap());

/// Two comma-separated numeric components (signs, decimals and `/` allowed)
static COORDINATE_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([-+0-9./\s]+?)\s*,\s*([-+0-9./\s]+?)\s*$").unwrap());

// ============================================================================
// Normalization
// ============================================================================

/// Normalize a raw answer string into canonical form.
///
/// Lowercases, strips a leading single-letter `=` prefix (`"x=5"`),
/// collapses whitespace runs to single spaces, folds `+-`/`-+` sign
/// pairs into `-`, and trims a trailing zero-only fractional part
/// (`"2.50"` becomes `"2.5"`, `"3.000"` becomes `"3"`).
///
/// Always returns a string; input with nothing to normalize comes back
/// unchanged apart from case and surrounding whitespace.
pub fn normalize(answer: &str) -> String {
    let lowered = answer.trim().to_lowercase();
    let stripped = VAR_PREFIX.replace(&lowered, "");

    let mut s: String = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    while s.contains("+-") || s.contains("-+") {
        s = s.replace("+-", "-").replace("-+", "-");
    }

    let s = FRACTIONAL_ZEROS.replace(&s, "$1").into_owned();
    ZERO_FRACTION.replace(&s, "").into_owned()
}

// ============================================================================
// Numeric Parsing
// ============================================================================

/// Parse a numeric answer: mixed number, simple fraction, or plain
/// float, tried in that order.
///
/// The sign of a mixed number's whole part applies to the entire value,
/// so `"-2 1/2"` is −2.5, not −1.5. A zero denominator yields `None`.
pub fn parse_numeric(s: &str) -> Option<f64> {
    let s = normalize(s);

    if let Some(caps) = MIXED_NUMBER.captures(&s) {
        let whole: f64 = caps[1].parse().ok()?;
        let numerator: f64 = caps[2].parse().ok()?;
        let denominator: f64 = caps[3].parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        let magnitude = whole.abs() + numerator / denominator;
        let negative = caps[1].starts_with('-');
        return Some(if negative { -magnitude } else { magnitude });
    }

    if let Some(caps) = SIMPLE_FRACTION.captures(&s) {
        let numerator: f64 = caps[1].parse().ok()?;
        let denominator: f64 = caps[2].parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }

    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Compare two numeric answer strings within `tolerance`.
///
/// Unparseable input on either side compares as not equal.
pub fn compare_numeric(a: &str, b: &str, tolerance: f64) -> bool {
    match (parse_numeric(a), parse_numeric(b)) {
        (Some(x), Some(y)) => approx_eq(x, y, tolerance),
        _ => false,
    }
}

// ============================================================================
// Coordinate Parsing
// ============================================================================

/// Parse an ordered pair such as `"(3, 4)"`, `"3,4"`, or
/// `"( -1/2 , 3.5 )"`.
///
/// Surrounding parentheses are optional. Each component goes through
/// [`parse_numeric`], so fractions and mixed numbers are accepted.
/// Anything that does not split into exactly two numeric components
/// yields `None`.
pub fn parse_coordinate(s: &str) -> Option<(f64, f64)> {
    let s = s.trim();
    let inner = s
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(s);

    let caps = COORDINATE_PAIR.captures(inner)?;
    let x = parse_numeric(&caps[1])?;
    let y = parse_numeric(&caps[2])?;
    Some((x, y))
}

/// Compare two coordinate strings component-wise within `tolerance`.
///
/// Order matters: `(3,4)` and `(4,3)` are different points.
pub fn compare_coordinate(a: &str, b: &str, tolerance: f64) -> bool {
    match (parse_coordinate(a), parse_coordinate(b)) {
        (Some((ax, ay)), Some((bx, by))) => {
            approx_eq(ax, bx, tolerance) && approx_eq(ay, by, tolerance)
        }
        _ => false,
    }
}
