//! Parsing of monetary strings.
//!
//! Raw transaction exports tend to write amounts like `-$1,250.00`. The `Amount` type accepts
//! those along with plain decimals, and converts to the `f64` that the numeric columns store.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// A monetary amount parsed from text.
///
/// ```
/// # use findash::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("-$1,250.50").unwrap();
/// assert_eq!(a.to_f64(), -1250.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError {
    input: String,
    source: Option<rust_decimal::Error>,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(e) => write!(f, "'{}' is not a valid amount: {e}", self.input),
            None => write!(f, "'{}' is not a valid amount", self.input),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |source| AmountError {
            input: s.to_string(),
            source,
        };
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(err(None));
        }

        // Accounting style negatives: (50.00)
        let (negative, body) = match trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) => (true, inner.trim()),
            None => match trimmed.strip_prefix('-') {
                Some(rest) => (true, rest.trim()),
                None => (false, trimmed),
            },
        };

        let body = body.strip_prefix('$').unwrap_or(body);
        if body.starts_with('-') {
            return Err(err(None));
        }
        let digits = body.replace(',', "");
        let value = Decimal::from_str(&digits).map_err(|e| err(Some(e)))?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> f64 {
        Amount::from_str(s).unwrap().to_f64()
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse("42.50"), 42.5);
        assert_eq!(parse("  7 "), 7.0);
    }

    #[test]
    fn test_parse_dollar_and_commas() {
        assert_eq!(parse("$1,000.00"), 1000.0);
        assert_eq!(parse("-$60,000.00"), -60000.0);
        assert_eq!(parse("$1,234,567.89"), 1234567.89);
    }

    #[test]
    fn test_parse_accounting_negative() {
        assert_eq!(parse("(50.00)"), -50.0);
        assert_eq!(parse("($5.25)"), -5.25);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Amount::from_str("").is_err());
        assert!(Amount::from_str("lots").is_err());
        assert!(Amount::from_str("--5").is_err());
        let message = Amount::from_str("abc").unwrap_err().to_string();
        assert!(message.contains("'abc' is not a valid amount"));
    }
}
