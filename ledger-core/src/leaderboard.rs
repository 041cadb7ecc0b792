//! Leaderboard aggregation
//!
//! Pure derivation from the full ledger: group by donor, sum, sort, rank,
//! tier. Recomputed wholesale on every read; O(n) scan + O(k log k) sort,
//! which is fine while the ledger stays in the low thousands of entries.

use crate::types::{LeaderboardEntry, PaymentEntry, Tier};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Aggregate the full ledger into a ranked leaderboard.
///
/// - Entries with an empty name or a non-positive total are skipped
///   (malformed or legacy records must not poison the view).
/// - Totals are summed as exact decimals; no float drift.
/// - Ordering is by numeric score descending, then name ascending for equal
///   scores. Ranks are the 1-based position in that order.
pub fn aggregate(entries: &HashMap<String, PaymentEntry>) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();

    for entry in entries.values() {
        if entry.name.is_empty() || entry.total <= Decimal::ZERO {
            tracing::debug!(payment_id = %entry.id, "Skipping malformed ledger entry");
            continue;
        }
        *totals.entry(entry.name.as_str()).or_insert(Decimal::ZERO) += entry.total;
    }

    let mut ranked: Vec<(&str, Decimal)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (name, total))| {
            let mut score = total;
            score.rescale(2);
            LeaderboardEntry {
                rank: (i + 1) as u32,
                name: name.to_string(),
                score,
                tier: Tier::classify(total),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger(entries: &[(&str, &str, Decimal)]) -> HashMap<String, PaymentEntry> {
        entries
            .iter()
            .map(|(id, name, total)| {
                (
                    id.to_string(),
                    PaymentEntry::new(*id, *name, *total),
                )
            })
            .collect()
    }

    #[test]
    fn test_groups_and_sums_per_donor() {
        let board = aggregate(&ledger(&[
            ("pi_1", "A", dec!(10.00)),
            ("pi_2", "A", dec!(15.00)),
            ("pi_3", "B", dec!(5.00)),
        ]));

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].name, "A");
        assert_eq!(board[0].score, dec!(25.00));
        assert_eq!(board[1].rank, 2);
        assert_eq!(board[1].name, "B");
        assert_eq!(board[1].score, dec!(5.00));
    }

    #[test]
    fn test_numeric_sort_not_lexicographic() {
        // "9.00" > "10.00" as strings; numeric comparison must win
        let board = aggregate(&ledger(&[
            ("pi_1", "Nine", dec!(9.00)),
            ("pi_2", "Ten", dec!(10.00)),
        ]));

        assert_eq!(board[0].name, "Ten");
        assert_eq!(board[1].name, "Nine");
    }

    #[test]
    fn test_tie_break_is_alphabetical() {
        let board = aggregate(&ledger(&[
            ("pi_1", "Zed", dec!(20.00)),
            ("pi_2", "Amy", dec!(20.00)),
        ]));

        assert_eq!(board[0].name, "Amy");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].name, "Zed");
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn test_skips_malformed_entries() {
        let board = aggregate(&ledger(&[
            ("pi_1", "", dec!(50.00)),
            ("pi_2", "Zero", dec!(0.00)),
            ("pi_3", "Neg", dec!(-5.00)),
            ("pi_4", "Alice", dec!(3.00)),
        ]));

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].name, "Alice");
    }

    #[test]
    fn test_empty_ledger() {
        assert!(aggregate(&HashMap::new()).is_empty());
    }

    #[test]
    fn test_scores_rescaled_to_two_decimals() {
        let board = aggregate(&ledger(&[("pi_1", "Alice", dec!(25))]));
        assert_eq!(board[0].score.to_string(), "25.00");
    }

    #[test]
    fn test_tiers_assigned_from_aggregate() {
        let board = aggregate(&ledger(&[
            ("pi_1", "Big", dec!(150.00)),
            ("pi_2", "Big", dec!(50.00)),
            ("pi_3", "Small", dec!(2.00)),
        ]));

        // 200.00 in aggregate crosses the whale threshold
        assert_eq!(board[0].name, "Big");
        assert_eq!(board[0].tier, Tier::Whale);
        assert_eq!(board[1].tier, Tier::Shrimp);
    }
}
