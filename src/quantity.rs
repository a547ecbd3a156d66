//! Exact parsing of Kubernetes resource quantities.
//!
//! `k8s_openapi`'s `Quantity` is a plain string wrapper, so `"2Gi"` and
//! `"2048Mi"` compare unequal with `==`. This module parses the quantity
//! grammar into a normalised decimal so semantically equal amounts compare
//! equal regardless of how they were written.

use std::str::FromStr;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use thiserror::Error;

/// Errors that can occur when parsing a quantity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,
    #[error("invalid number in quantity {0:?}")]
    InvalidNumber(String),
    #[error("unknown suffix {suffix:?} in quantity {input:?}")]
    InvalidSuffix { input: String, suffix: String },
    #[error("quantity {0:?} is out of range")]
    Overflow(String),
}

/// A quantity normalised to `coefficient * 10^exponent`.
///
/// The coefficient never has trailing decimal zeros (zero is stored as
/// `0 * 10^0`), so structural equality is numeric equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParsedQuantity {
    coefficient: i128,
    exponent: i64,
}

enum Suffix {
    Binary(u32),
    Decimal(i64),
}

impl ParsedQuantity {
    /// Parse a quantity string such as `"2Gi"`, `"1500m"` or `"1e3"`.
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        if input.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, rest) = if let Some(rest) = input.strip_prefix('-') {
            (true, rest)
        } else {
            (false, input.strip_prefix('+').unwrap_or(input))
        };

        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
            return Err(QuantityError::InvalidNumber(input.to_string()));
        }

        let frac_part = frac_part.trim_end_matches('0');
        let overflow = || QuantityError::Overflow(input.to_string());

        // Trailing integer zeros go to the exponent, not the coefficient
        let mut exponent = -(frac_part.len() as i64);
        let int_part = if frac_part.is_empty() {
            let trimmed = int_part.trim_end_matches('0');
            exponent += (int_part.len() - trimmed.len()) as i64;
            trimmed
        } else {
            int_part
        };

        let mut coefficient: i128 = 0;
        for digit in int_part.bytes().chain(frac_part.bytes()) {
            coefficient = coefficient
                .checked_mul(10)
                .and_then(|c| c.checked_add(i128::from(digit - b'0')))
                .ok_or_else(overflow)?;
        }

        match parse_suffix(input, suffix)? {
            Suffix::Binary(power) => {
                coefficient = coefficient
                    .checked_mul(1i128 << power)
                    .ok_or_else(overflow)?;
            }
            Suffix::Decimal(power) => exponent += power,
        }

        if negative {
            coefficient = -coefficient;
        }

        Ok(Self::normalised(coefficient, exponent))
    }

    fn normalised(mut coefficient: i128, mut exponent: i64) -> Self {
        if coefficient == 0 {
            return Self {
                coefficient: 0,
                exponent: 0,
            };
        }
        while coefficient % 10 == 0 {
            coefficient /= 10;
            exponent += 1;
        }
        Self {
            coefficient,
            exponent,
        }
    }
}

fn parse_suffix(input: &str, suffix: &str) -> Result<Suffix, QuantityError> {
    let parsed = match suffix {
        "" => Suffix::Decimal(0),
        "Ki" => Suffix::Binary(10),
        "Mi" => Suffix::Binary(20),
        "Gi" => Suffix::Binary(30),
        "Ti" => Suffix::Binary(40),
        "Pi" => Suffix::Binary(50),
        "Ei" => Suffix::Binary(60),
        "n" => Suffix::Decimal(-9),
        "u" => Suffix::Decimal(-6),
        "m" => Suffix::Decimal(-3),
        "k" => Suffix::Decimal(3),
        "M" => Suffix::Decimal(6),
        "G" => Suffix::Decimal(9),
        "T" => Suffix::Decimal(12),
        "P" => Suffix::Decimal(15),
        "E" => Suffix::Decimal(18),
        other => {
            // Decimal exponent form: e.g. "1e3", "5E-2"
            let exp = other
                .strip_prefix('e')
                .or_else(|| other.strip_prefix('E'))
                .filter(|e| !e.is_empty())
                .and_then(|e| e.parse::<i32>().ok())
                .ok_or_else(|| QuantityError::InvalidSuffix {
                    input: input.to_string(),
                    suffix: other.to_string(),
                })?;
            Suffix::Decimal(i64::from(exp))
        }
    };
    Ok(parsed)
}

impl FromStr for ParsedQuantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&Quantity> for ParsedQuantity {
    type Error = QuantityError;

    fn try_from(q: &Quantity) -> Result<Self, Self::Error> {
        Self::parse(&q.0)
    }
}

/// Compare two quantities by the amount they denote.
///
/// Falls back to textual comparison when either side does not parse, so an
/// unparsable value only equals itself.
pub fn semantically_equal(a: &Quantity, b: &Quantity) -> bool {
    match (ParsedQuantity::try_from(a), ParsedQuantity::try_from(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.0 == b.0,
    }
}
