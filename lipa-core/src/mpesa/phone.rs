use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;

/// A Kenyan mobile number in the `2547XXXXXXXX` / `2541XXXXXXXX` form the
/// gateway expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Msisdn(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid phone number: {0}")]
pub struct InvalidPhone(pub String);

impl Msisdn {
    /// Normalize the formats customers type: `07XXXXXXXX`, `01XXXXXXXX`,
    /// `7XXXXXXXX`, `2547XXXXXXXX` and `+2547XXXXXXXX`. Spaces and dashes
    /// are ignored.
    pub fn parse(input: &str) -> Result<Self, InvalidPhone> {
        let cleaned: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidPhone(input.to_owned()));
        }

        let subscriber = match digits.len() {
            12 if digits.starts_with("254") => &digits[3..],
            10 if digits.starts_with('0') => &digits[1..],
            9 => digits,
            _ => return Err(InvalidPhone(input.to_owned())),
        };
        if !(subscriber.starts_with('7') || subscriber.starts_with('1')) {
            return Err(InvalidPhone(input.to_owned()));
        }
        Ok(Self(format!("254{subscriber}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Msisdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("amount must be a positive whole number, got {0}")]
pub struct InvalidAmount(pub Decimal);

/// STK push amounts are whole shillings.
pub fn whole_shillings(amount: Decimal) -> Result<u64, InvalidAmount> {
    if amount <= Decimal::ZERO || !amount.fract().is_zero() {
        return Err(InvalidAmount(amount));
    }
    amount.to_u64().ok_or(InvalidAmount(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_formats_normalize_to_254() {
        for input in [
            "0712345678",
            "712345678",
            "254712345678",
            "+254712345678",
            "0712 345 678",
            "0712-345-678",
        ] {
            assert_eq!(Msisdn::parse(input).unwrap().as_str(), "254712345678", "{input}");
        }
        assert_eq!(
            Msisdn::parse("0110123456").unwrap().as_str(),
            "254110123456"
        );
    }

    #[test]
    fn test_rejected_formats() {
        for input in [
            "",
            "+",
            "071234567",
            "07123456789",
            "0812345678",
            "255712345678",
            "07123x5678",
            "254812345678",
        ] {
            assert!(Msisdn::parse(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_whole_shillings() {
        assert_eq!(whole_shillings(Decimal::new(100, 0)).unwrap(), 100);
        assert_eq!(whole_shillings(Decimal::new(10000, 2)).unwrap(), 100);
        assert!(whole_shillings(Decimal::ZERO).is_err());
        assert!(whole_shillings(Decimal::new(-5, 0)).is_err());
        assert!(whole_shillings(Decimal::new(1050, 2)).is_err());
    }
}
