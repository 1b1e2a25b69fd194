//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stock level of a product. Persisted as text, never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockQuantity(u64);

impl StockQuantity {
    pub fn new(value: u64) -> Self { Self(value) }

    /// Strict parse used for admin edits.
    pub fn parse(raw: &str) -> Result<Self, StockError> {
        let raw = raw.trim();
        if raw.is_empty() { return Err(StockError::Empty); }
        let value: i64 = raw.parse().map_err(|_| StockError::NotANumber(raw.to_string()))?;
        u64::try_from(value).map(Self).map_err(|_| StockError::Negative(value))
    }

    /// Missing, unparseable or negative text reads as zero.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<i64>().ok())
            .and_then(|v| u64::try_from(v).ok())
            .map(Self)
            .unwrap_or_default()
    }

    pub fn value(&self) -> u64 { self.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }

    /// `max(0, current - qty)`
    pub fn decrement_clamped(self, qty: u64) -> Self { Self(self.0.saturating_sub(qty)) }
}

impl fmt::Display for StockQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum StockError { Empty, NotANumber(String), Negative(i64) }
impl std::error::Error for StockError {}
impl fmt::Display for StockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "stock quantity is empty"),
            Self::NotANumber(raw) => write!(f, "stock quantity '{}' is not a number", raw),
            Self::Negative(v) => write!(f, "stock quantity {} is negative", v),
        }
    }
}

/// Name split into first and last parts on whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonName { pub first: String, pub last: String }

impl PersonName {
    pub fn split(full_name: &str) -> Self {
        let mut tokens = full_name.split_whitespace();
        let first = tokens.next().unwrap_or("Unknown").to_string();
        let last = tokens.collect::<Vec<_>>().join(" ");
        Self { first, last }
    }

    pub fn full(&self) -> String {
        if self.last.is_empty() { self.first.clone() } else { format!("{} {}", self.first, self.last) }
    }
}

/// Local part of an email address. An address without `@` is returned whole.
pub fn username_from_email(email: &str) -> String {
    email.split_once('@').map_or(email, |(local, _)| local).to_string()
}

/// URL handle derived from a display name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn from_name(name: &str) -> Self {
        Self(name.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase())
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_parse() {
        assert_eq!(StockQuantity::parse(" 12 ").unwrap().value(), 12);
        assert_eq!(StockQuantity::parse("-1"), Err(StockError::Negative(-1)));
        assert!(matches!(StockQuantity::parse("lots"), Err(StockError::NotANumber(_))));
        assert_eq!(StockQuantity::parse(""), Err(StockError::Empty));
    }

    #[test]
    fn test_stock_lenient_defaults_to_zero() {
        assert_eq!(StockQuantity::parse_lenient(None).value(), 0);
        assert_eq!(StockQuantity::parse_lenient(Some("abc")).value(), 0);
        assert_eq!(StockQuantity::parse_lenient(Some("-4")).value(), 0);
        assert_eq!(StockQuantity::parse_lenient(Some("9")).value(), 9);
    }

    #[test]
    fn test_clamped_decrement() {
        let stock = StockQuantity::new(5);
        assert_eq!(stock.decrement_clamped(3).value(), 2);
        assert!(stock.decrement_clamped(7).is_zero());
        assert_eq!(stock.decrement_clamped(7).to_string(), "0");
    }

    #[test]
    fn test_person_name() {
        let name = PersonName::split("Jane Doe");
        assert_eq!((name.first.as_str(), name.last.as_str()), ("Jane", "Doe"));
        let name = PersonName::split("  Mary   Ann  van Dyke ");
        assert_eq!(name.first, "Mary");
        assert_eq!(name.last, "Ann van Dyke");
        let name = PersonName::split("   ");
        assert_eq!(name.first, "Unknown");
        assert_eq!(name.last, "");
        assert_eq!(name.full(), "Unknown");
    }

    #[test]
    fn test_username() {
        assert_eq!(username_from_email("jane@x.com"), "jane");
        assert_eq!(username_from_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_slug() { assert_eq!(Slug::from_name(" Summer  Sale ").as_str(), "summer-sale"); }
}
