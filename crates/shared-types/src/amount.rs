//! # Amount
//!
//! Exact fixed-point currency amount with 8 fractional digits, backed by an
//! arbitrary-precision integer count of base units. All balance, fee and
//! reward math on the consensus path goes through this type so every node
//! computes byte-identical results.

use crate::errors::CodecError;
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Number of fractional digits.
pub const DECIMALS: usize = 8;

/// Base units per whole coin.
pub const UNITS_PER_COIN: u64 = 100_000_000;

/// Exact decimal amount.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(BigInt);

impl Amount {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// Creates an amount from a count of base units (1e-8).
    pub fn from_units(units: impl Into<BigInt>) -> Self {
        Self(units.into())
    }

    /// Creates an amount of whole coins.
    pub fn from_coins(coins: i64) -> Self {
        Self(BigInt::from(coins) * BigInt::from(UNITS_PER_COIN))
    }

    /// Parses a decimal string such as `"12.5"` or `"-0.00000001"`.
    pub fn parse(input: &str) -> Result<Self, CodecError> {
        let trimmed = input.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(CodecError::InvalidAmount(input.to_string()));
        }
        if frac_part.len() > DECIMALS {
            return Err(CodecError::InvalidAmount(format!(
                "{input}: more than {DECIMALS} decimals"
            )));
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(CodecError::InvalidAmount(input.to_string()));
        }

        let int_value = if int_part.is_empty() {
            BigInt::zero()
        } else {
            BigInt::from_str(int_part).map_err(|e| CodecError::InvalidAmount(e.to_string()))?
        };
        let frac_value = if frac_part.is_empty() {
            BigInt::zero()
        } else {
            let padded = format!("{frac_part:0<width$}", width = DECIMALS);
            BigInt::from_str(&padded).map_err(|e| CodecError::InvalidAmount(e.to_string()))?
        };

        let units = int_value * BigInt::from(UNITS_PER_COIN) + frac_value;
        Ok(Self(if negative { -units } else { units }))
    }

    /// Raw base units.
    pub fn units(&self) -> &BigInt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Multiplies by an integer factor.
    pub fn mul_u64(&self, factor: u64) -> Self {
        Self(&self.0 * BigInt::from(factor))
    }

    /// Floor division of base units by an integer. Division by zero yields zero.
    pub fn div_floor_u64(&self, divisor: u64) -> Self {
        if divisor == 0 {
            return Self::zero();
        }
        let divisor = BigInt::from(divisor);
        let quotient = &self.0 / &divisor;
        if self.0.is_negative() && !(&self.0 % &divisor).is_zero() {
            return Self(quotient - 1);
        }
        Self(quotient)
    }

    /// Computes `self * numerator / denominator` in base units, truncating.
    ///
    /// Returns the quotient and the remainder (in base units times the
    /// denominator) for largest-remainder distributions.
    pub fn mul_div_rem(&self, numerator: &Amount, denominator: &Amount) -> (Self, BigInt) {
        if denominator.is_zero() {
            return (Self::zero(), BigInt::zero());
        }
        let product = &self.0 * &numerator.0;
        let quotient = &product / &denominator.0;
        let remainder = &product % &denominator.0;
        (Self(quotient), remainder)
    }

    /// Canonical byte encoding used inside checksums (signed little endian).
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        if self.0.is_zero() {
            return Vec::new();
        }
        self.0.to_signed_bytes_le()
    }

    /// Lossy conversion for metrics and logs.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN) / UNITS_PER_COIN as f64
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0.sign() == Sign::Minus { "-" } else { "" };
        let magnitude = self.0.abs();
        let unit = BigInt::from(UNITS_PER_COIN);
        let whole = &magnitude / &unit;
        let frac = (&magnitude % &unit).to_u64().unwrap_or(0);
        write!(f, "{sign}{whole}.{frac:0width$}", width = DECIMALS)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({self})")
    }
}

impl FromStr for Amount {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Amount> for &'a Amount {
    type Output = Amount;
    fn add(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 + &rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl<'a> Sub<&'a Amount> for &'a Amount {
    type Output = Amount;
    fn sub(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 - &rhs.0)
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        self.0 += &rhs.0;
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, rhs: &Amount) {
        self.0 -= &rhs.0;
    }
}

impl Neg for Amount {
    type Output = Amount;
    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |mut acc, x| {
            acc += x;
            acc
        })
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Amount::parse(&text).map_err(serde::de::Error::custom)
    }
}
