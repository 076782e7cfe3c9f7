// Vote-count normalization.
//
// IMDb renders vote counts in several shapes depending on where they appear:
// exact ("125487"), grouped ("125,487"), or abbreviated ("125K", "1.2M").
// All of them collapse to a plain integer here.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ModelError;

static SUFFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\.(\d+))?([KkMm])$").unwrap());

/// Convert a human-readable vote count into an integer.
///
/// Rules, first match wins:
/// 1. `<number>K` → number × 1,000, truncated
/// 2. `<number>M` → number × 1,000,000, truncated
/// 3. plain digits → parsed as-is
/// 4. comma-grouped digits → commas stripped, then parsed
///
/// Anything else is [`ModelError::UnconvertibleVotes`].
pub fn normalize_votes(token: &str) -> Result<u64, ModelError> {
    let token = token.trim();
    let unconvertible = || ModelError::UnconvertibleVotes(token.to_string());

    if let Some(caps) = SUFFIXED.captures(token) {
        let zeros = match &caps[3] {
            "K" | "k" => 3,
            _ => 6,
        };
        let fraction = caps.get(2).map_or("", |m| m.as_str());
        return scale_decimal(&caps[1], fraction, zeros).ok_or_else(unconvertible);
    }

    if is_digits(token) {
        return token.parse().map_err(|_| unconvertible());
    }

    if token.contains(',') {
        let stripped: String = token.chars().filter(|c| *c != ',').collect();
        if is_digits(&stripped) {
            return stripped.parse().map_err(|_| unconvertible());
        }
    }

    Err(unconvertible())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `whole.fraction × 10^zeros`, truncated, in exact integer arithmetic.
///
/// Fraction digits beyond `zeros` only affect the part below one and are
/// dropped, which is exactly truncation.
fn scale_decimal(whole: &str, fraction: &str, zeros: u32) -> Option<u64> {
    let multiplier = 10u64.pow(zeros);
    let whole: u64 = whole.parse().ok()?;

    let kept = &fraction[..fraction.len().min(zeros as usize)];
    let fractional = if kept.is_empty() {
        0
    } else {
        let digits: u64 = kept.parse().ok()?;
        digits * 10u64.pow(zeros - kept.len() as u32)
    };

    whole.checked_mul(multiplier)?.checked_add(fractional)
}
