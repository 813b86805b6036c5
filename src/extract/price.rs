//! Price text parsing and discount math.
//!
//! Storefront price labels arrive as free text ("12 499 ₴", "1 299 грн",
//! "2499.00"), sometimes with thin spaces or a trailing kopeck part that
//! is always zero on the observed sites.

use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Trailing one-or-two-digit decimal tail like ".00" or ",5".
static DECIMAL_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,]\d{1,2}\s*$").unwrap());

/// Sanity bounds for a hryvnia price; values outside are parse artifacts.
const MIN_PRICE: u64 = 10;
const MAX_PRICE: u64 = 10_000_000;

/// Parse a price label into integer hryvnia.
///
/// Strips currency markers, drops a kopeck tail, then joins the remaining
/// digit runs (thousands separators show up as spaces or dots). Returns
/// None when no digits survive or the value is outside sane bounds.
pub fn parse_price(text: &str) -> Option<u64> {
    let lowered = text.to_lowercase();
    let cleaned = lowered
        .replace('₴', " ")
        .replace("грн", " ")
        .replace("uah", " ");
    let cleaned = DECIMAL_TAIL.replace(&cleaned, "");

    let digits: String = DIGIT_RUNS
        .find_iter(&cleaned)
        .map(|m| m.as_str())
        .collect();
    if digits.is_empty() {
        return None;
    }

    let value: u64 = digits.parse().ok()?;
    if (MIN_PRICE..=MAX_PRICE).contains(&value) {
        Some(value)
    } else {
        None
    }
}

/// Percent saved when a discounted price undercuts the regular one.
///
/// Only defined for regular > discounted > 0; anything else yields None
/// rather than a zero or negative percentage.
pub fn calculate_discount(regular: u64, discounted: u64) -> Option<u8> {
    if regular > discounted && discounted > 0 {
        let percent = ((regular - discounted) as f64 / regular as f64 * 100.0).round();
        Some(percent as u8)
    } else {
        None
    }
}
