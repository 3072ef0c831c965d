//! Conversions between human-entered decimal amounts and integer stroops.
//! Integer arithmetic only; digits below one stroop are truncated.

use thiserror::Error;

pub const STROOP_DECIMALS: usize = 7;
pub const STROOPS_PER_UNIT: i128 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative")]
    Negative,
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount overflows the stroop range")]
    Overflow,
}

pub fn to_stroops(input: &str) -> Result<i128, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative);
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountError::Invalid(trimmed.to_owned()));
    }

    let whole_value: i128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };
    let fraction_value = fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(STROOP_DECIMALS)
        .fold(0i128, |acc, digit| acc * 10 + i128::from(digit - b'0'));

    whole_value
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or(AmountError::Overflow)
}

pub fn format_stroops(stroops: i128) -> String {
    let sign = if stroops < 0 { "-" } else { "" };
    let abs = stroops.unsigned_abs();
    let per_unit = STROOPS_PER_UNIT.unsigned_abs();
    format!(
        "{sign}{}.{:0width$}",
        abs / per_unit,
        abs % per_unit,
        width = STROOP_DECIMALS
    )
}

/// Largest contribution that neither exceeds the remaining goal nor dips
/// into the wallet's `reserve`.
pub fn max_contribution(remaining_goal: i128, wallet_balance: i128, reserve: i128) -> i128 {
    let available = wallet_balance.saturating_sub(reserve).max(0);
    remaining_goal.max(0).min(available)
}
