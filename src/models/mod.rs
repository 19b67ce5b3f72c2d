use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod product;
pub mod subscription;

// Re-exports for convenience
pub use product::*;
pub use subscription::*;

/// External marketplace a product is tracked on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Amazon,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::Amazon => write!(f, "amazon"),
        }
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "amazon" => Ok(Vendor::Amazon),
            other => Err(format!("unknown vendor: {}", other)),
        }
    }
}

/// A price observation. Either a non-negative decimal amount or an explicit
/// "unavailable" marker, never a raw unparsed string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "amount", rename_all = "lowercase")]
pub enum PriceQuote {
    Available(Decimal),
    Unavailable,
}

impl PriceQuote {
    /// Build a quote from the two-part price markup (whole + fractional).
    /// Anything that does not parse into a non-negative decimal is
    /// `Unavailable`.
    pub fn from_parts(whole: &str, fraction: &str) -> Self {
        let whole: String = whole.chars().filter(|c| c.is_ascii_digit()).collect();
        let fraction: String = fraction.chars().filter(|c| c.is_ascii_digit()).collect();
        if whole.is_empty() || fraction.is_empty() {
            return PriceQuote::Unavailable;
        }
        match Decimal::from_str(&format!("{}.{}", whole, fraction)) {
            Ok(amount) if amount >= Decimal::ZERO => PriceQuote::Available(amount),
            _ => PriceQuote::Unavailable,
        }
    }

    pub fn as_available(&self) -> Option<Decimal> {
        match self {
            PriceQuote::Available(amount) => Some(*amount),
            PriceQuote::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PriceQuote::Available(_))
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceQuote::Available(amount) => write!(f, "${}", amount),
            PriceQuote::Unavailable => write!(f, "unavailable"),
        }
    }
}
