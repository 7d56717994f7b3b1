//! Token amounts
//!
//! Reward, cap and balance values are whole token units held in a `u128`.
//! They never pass through floating point: persisted forms are decimal strings
//! and all scaling goes through [`mul_div`].

use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a string is not a valid token amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,

    #[error("invalid digit in amount: {0:?}")]
    InvalidDigit(String),

    #[error("amount out of range: {0}")]
    Overflow(String),
}

/// Non-negative whole number of reward tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    pub fn saturating_add(self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_sub(other.0))
    }

    /// `floor(self * factor)` computed exactly.
    ///
    /// Negative factors yield zero. Saturates at `u128::MAX` if the product
    /// does not fit.
    pub fn apply_factor(self, factor: Decimal) -> TokenAmount {
        if factor.is_sign_negative() || factor.is_zero() {
            return TokenAmount::ZERO;
        }
        let mantissa = factor.mantissa().unsigned_abs();
        let denominator = 10u128.pow(factor.scale());
        match mul_div(self.0, mantissa, denominator) {
            Some((quotient, _)) => TokenAmount(quotient),
            None => TokenAmount(u128::MAX),
        }
    }
}

/// Exact `floor(a * b / d)` and its remainder, without a 256-bit intermediate.
///
/// Returns `None` when `d` is zero or the quotient does not fit in `u128`.
/// The remainder is always `< d`.
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<(u128, u128)> {
    if d == 0 {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        return Some((product / d, product % d));
    }

    // Shift-and-add over the bits of `a`, keeping the running product as
    // `quotient * d + remainder` with `remainder < d`.
    let b_quot = b / d;
    let b_rem = b % d;
    let mut quotient: u128 = 0;
    let mut remainder: u128 = 0;

    for bit in (0..128).rev() {
        quotient = quotient.checked_mul(2)?;
        if remainder >= d - remainder {
            remainder -= d - remainder;
            quotient = quotient.checked_add(1)?;
        } else {
            remainder += remainder;
        }

        if (a >> bit) & 1 == 1 {
            quotient = quotient.checked_add(b_quot)?;
            if remainder >= d - b_rem {
                remainder -= d - b_rem;
                quotient = quotient.checked_add(1)?;
            } else {
                remainder += b_rem;
            }
        }
    }

    Some((quotient, remainder))
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl From<u128> for TokenAmount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl Sum for TokenAmount {
    fn sum<I: Iterator<Item = TokenAmount>>(iter: I) -> Self {
        iter.fold(TokenAmount::ZERO, TokenAmount::saturating_add)
    }
}

impl<'a> Sum<&'a TokenAmount> for TokenAmount {
    fn sum<I: Iterator<Item = &'a TokenAmount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountParseError::InvalidDigit(trimmed.to_string()));
        }
        trimmed
            .parse::<u128>()
            .map(TokenAmount)
            .map_err(|_| AmountParseError::Overflow(trimmed.to_string()))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TokenAmountVisitor)
    }
}

struct TokenAmountVisitor;

impl Visitor<'_> for TokenAmountVisitor {
    type Value = TokenAmount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or non-negative integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TokenAmount, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TokenAmount, E> {
        Ok(TokenAmount::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TokenAmount, E> {
        u64::try_from(v)
            .map(TokenAmount::from)
            .map_err(|_| E::custom(format!("negative amount: {}", v)))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<TokenAmount, E> {
        Ok(TokenAmount(v))
    }
}
