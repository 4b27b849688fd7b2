//! Fixed-point money: integer minor units plus a currency tag.
//!
//! All ledger arithmetic happens on `i64` minor units (cents); binary
//! floating point never touches an amount. Decimal strings exist only at
//! the formatting boundary ([`Money::parse`] / [`core::fmt::Display`]).

use core::cmp::Ordering;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_object::ValueObject;

/// Number of minor units per major unit (two decimal places).
const MINOR_PER_MAJOR: i64 = 100;

/// Money operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Operands carry different currencies. Mixing currencies is a
    /// programming error, never silently coerced.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// Arithmetic overflowed the minor-unit range.
    #[error("money amount overflow")]
    Overflow,

    /// A decimal amount string could not be parsed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A currency code was not a 3-letter ASCII code.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// ISO-4217-style 3-letter currency code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Currency([u8; 3]);

impl Currency {
    /// Parse a 3-letter code; lowercase input is folded to uppercase.
    pub fn new(code: &str) -> Result<Self, MoneyError> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            return Err(MoneyError::InvalidCurrency(code.to_string()));
        }
        let mut out = [0u8; 3];
        for (i, b) in bytes.iter().enumerate() {
            out[i] = b.to_ascii_uppercase();
        }
        Ok(Self(out))
    }

    pub fn as_str(&self) -> &str {
        // Constructor guarantees ASCII.
        core::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Currency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Currency::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A signed amount in minor units of a single currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    pub fn from_minor(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    pub fn minor(&self) -> i64 {
        self.minor
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    pub fn is_negative(&self) -> bool {
        self.minor < 0
    }

    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }

    /// `self + other`. Fails on currency mismatch or overflow.
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let minor = self
            .minor
            .checked_add(other.minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money { minor, currency: self.currency })
    }

    /// `self - other`. Fails on currency mismatch or overflow.
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let minor = self
            .minor
            .checked_sub(other.minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money { minor, currency: self.currency })
    }

    pub fn negate(&self) -> Result<Money, MoneyError> {
        let minor = self.minor.checked_neg().ok_or(MoneyError::Overflow)?;
        Ok(Money { minor, currency: self.currency })
    }

    pub fn abs(&self) -> Result<Money, MoneyError> {
        if self.minor == i64::MIN {
            return Err(MoneyError::Overflow);
        }
        Ok(Money { minor: self.minor.abs(), currency: self.currency })
    }

    /// Total order within one currency; comparing across currencies is an
    /// error, which is why `Money` does not implement `Ord`.
    pub fn compare(&self, other: &Money) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.minor.cmp(&other.minor))
    }

    /// Parse a decimal display string (`"1000"`, `"1000.5"`, `"1000.50"`,
    /// optionally signed) into minor units. Formatting-boundary use only.
    pub fn parse(amount: &str, currency: Currency) -> Result<Money, MoneyError> {
        let invalid = || MoneyError::InvalidAmount(amount.to_string());

        let (negative, rest) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };

        let (whole, frac) = match rest.split_once('.') {
            Some((w, f)) => (w, f),
            None => (rest, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let mut frac_minor: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| invalid())?
        };
        if frac.len() == 1 {
            frac_minor *= 10;
        }

        let mut minor = whole
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(frac_minor))
            .ok_or(MoneyError::Overflow)?;
        if negative {
            minor = minor.checked_neg().ok_or(MoneyError::Overflow)?;
        }

        Ok(Money { minor, currency })
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Widen before abs so i64::MIN formats instead of overflowing.
        let minor = i128::from(self.minor);
        let sign = if minor < 0 { "-" } else { "" };
        let abs = minor.abs();
        write!(
            f,
            "{sign}{}.{:02} {}",
            abs / i128::from(MINOR_PER_MAJOR),
            abs % i128::from(MINOR_PER_MAJOR),
            self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    fn eur() -> Currency {
        Currency::new("EUR").unwrap()
    }

    #[test]
    fn add_and_subtract_preserve_currency() {
        let a = Money::from_minor(1_000, usd());
        let b = Money::from_minor(250, usd());

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.minor(), 1_250);
        assert_eq!(sum.currency(), usd());

        let diff = a.checked_sub(&b).unwrap();
        assert_eq!(diff.minor(), 750);
    }

    #[test]
    fn mixing_currencies_is_rejected() {
        let a = Money::from_minor(100, usd());
        let b = Money::from_minor(100, eur());

        match a.checked_add(&b).unwrap_err() {
            MoneyError::CurrencyMismatch { left, right } => {
                assert_eq!(left, usd());
                assert_eq!(right, eur());
            }
            other => panic!("expected currency mismatch, got {other:?}"),
        }
        assert!(a.compare(&b).is_err());
    }

    #[test]
    fn overflow_is_an_error_not_a_wrap() {
        let max = Money::from_minor(i64::MAX, usd());
        let one = Money::from_minor(1, usd());
        assert_eq!(max.checked_add(&one).unwrap_err(), MoneyError::Overflow);
    }

    #[test]
    fn parse_accepts_whole_and_fractional_forms() {
        assert_eq!(Money::parse("1000", usd()).unwrap().minor(), 100_000);
        assert_eq!(Money::parse("1000.5", usd()).unwrap().minor(), 100_050);
        assert_eq!(Money::parse("1000.50", usd()).unwrap().minor(), 100_050);
        assert_eq!(Money::parse("-0.05", usd()).unwrap().minor(), -5);
    }

    #[test]
    fn parse_rejects_junk() {
        for bad in ["", "-", "1.234", "1,00", "abc", "1.2.3", "--1"] {
            assert!(Money::parse(bad, usd()).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn display_renders_two_decimal_places() {
        assert_eq!(Money::from_minor(123_456, usd()).to_string(), "1234.56 USD");
        assert_eq!(Money::from_minor(-5, eur()).to_string(), "-0.05 EUR");
        assert_eq!(Money::zero(usd()).to_string(), "0.00 USD");
    }

    #[test]
    fn currency_codes_are_validated_and_uppercased() {
        assert_eq!(Currency::new("usd").unwrap().as_str(), "USD");
        assert!(Currency::new("US").is_err());
        assert!(Currency::new("USDX").is_err());
        assert!(Currency::new("U$D").is_err());
    }

    proptest! {
        /// Addition commutes and subtraction undoes it, for any pair of
        /// amounts that fits the minor-unit range.
        #[test]
        fn add_commutes_and_sub_round_trips(
            a in -1_000_000_000i64..1_000_000_000i64,
            b in -1_000_000_000i64..1_000_000_000i64,
        ) {
            let ma = Money::from_minor(a, usd());
            let mb = Money::from_minor(b, usd());

            let ab = ma.checked_add(&mb).unwrap();
            let ba = mb.checked_add(&ma).unwrap();
            prop_assert_eq!(ab, ba);

            let back = ab.checked_sub(&mb).unwrap();
            prop_assert_eq!(back, ma);
        }

        /// Display/parse round-trips for in-range amounts.
        #[test]
        fn display_parse_round_trips(minor in -1_000_000_000i64..1_000_000_000i64) {
            let m = Money::from_minor(minor, usd());
            let rendered = m.to_string();
            let amount = rendered.strip_suffix(" USD").unwrap();
            prop_assert_eq!(Money::parse(amount, usd()).unwrap(), m);
        }
    }
}
