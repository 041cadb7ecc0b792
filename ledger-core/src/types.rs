//! Core types for the donation ledger
//!
//! All money is exact decimal (two-decimal dollars); floats never touch
//! amounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One confirmed donation. Keyed by `id` in storage; immutable after the
/// initial write (re-delivery of the same confirmation overwrites with
/// identical data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEntry {
    /// Stable payment identifier (ledger key)
    pub id: String,

    /// Donor display name ("Anonymous" when the donor gave none)
    pub name: String,

    /// Donation amount in dollars, two-decimal precision, non-negative
    pub total: Decimal,

    /// Assigned at write time, never mutated
    pub timestamp: DateTime<Utc>,
}

impl PaymentEntry {
    /// Create an entry timestamped now
    pub fn new(id: impl Into<String>, name: impl Into<String>, total: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            total,
            timestamp: Utc::now(),
        }
    }
}

/// Derived leaderboard row, recomputed in full on every read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position, best donor first
    pub rank: u32,

    /// Donor name (aggregation key)
    pub name: String,

    /// Sum of all payments for this donor, two-decimal scale
    pub score: Decimal,

    /// Tier derived from `score`
    pub tier: Tier,
}

/// Donor tier by aggregate contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Total >= 200
    Whale,
    /// Total >= 50
    Shark,
    /// Total >= 1
    Shrimp,
    /// Below every threshold
    Unknown,
}

impl Tier {
    /// Classify an aggregate total. Thresholds are inclusive at the lower
    /// bound, evaluated high to low: exactly 50.00 is a Shark, not a Shrimp.
    pub fn classify(total: Decimal) -> Tier {
        if total >= Decimal::from(200) {
            Tier::Whale
        } else if total >= Decimal::from(50) {
            Tier::Shark
        } else if total >= Decimal::ONE {
            Tier::Shrimp
        } else {
            Tier::Unknown
        }
    }

    /// Lowercase label, matches the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Whale => "whale",
            Tier::Shark => "shark",
            Tier::Shrimp => "shrimp",
            Tier::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::classify(dec!(0.99)), Tier::Unknown);
        assert_eq!(Tier::classify(dec!(1.00)), Tier::Shrimp);
        assert_eq!(Tier::classify(dec!(49.99)), Tier::Shrimp);
        assert_eq!(Tier::classify(dec!(50.00)), Tier::Shark);
        assert_eq!(Tier::classify(dec!(199.99)), Tier::Shark);
        assert_eq!(Tier::classify(dec!(200.00)), Tier::Whale);
        assert_eq!(Tier::classify(dec!(5000)), Tier::Whale);
    }

    #[test]
    fn test_tier_zero_and_negative() {
        assert_eq!(Tier::classify(Decimal::ZERO), Tier::Unknown);
        assert_eq!(Tier::classify(dec!(-3)), Tier::Unknown);
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(Tier::Whale.to_string(), "whale");
        assert_eq!(
            serde_json::to_string(&Tier::Shark).unwrap(),
            "\"shark\""
        );
    }

    #[test]
    fn test_payment_entry_roundtrip() {
        let entry = PaymentEntry::new("pi_123", "Alice", dec!(25.50));
        let bytes = bincode::serialize(&entry).unwrap();
        let back: PaymentEntry = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, entry);
    }
}
