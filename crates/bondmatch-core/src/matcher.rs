//! Exact-key bucketing plus fuzzy client-name matching against the KB ledger
//!
//! Ledger entries are grouped by `(ISIN, units)`. A debit event only ever
//! looks at its own bucket, and within it picks the entry whose client name is
//! most similar to the event's resolved client name.
//!
//! Buckets are never depleted: two events with the same key search the same
//! candidates and may both land on one entry.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::fuzzy::best_match;
use crate::models::{DebitEvent, LedgerEntry};

/// Exact-equality key shared by a debit event and its KB candidates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub security_id: String,
    pub quantity: Decimal,
}

impl MatchKey {
    /// Build a key; units that failed to parse never form a key
    pub fn new(security_id: &str, quantity: Option<Decimal>) -> Option<Self> {
        quantity.map(|q| Self {
            security_id: security_id.to_string(),
            quantity: q.normalize(),
        })
    }

    pub fn for_event(event: &DebitEvent) -> Option<Self> {
        Self::new(&event.security_id, event.quantity)
    }

    pub fn for_entry(entry: &LedgerEntry) -> Option<Self> {
        Self::new(&entry.security_id, entry.quantity)
    }
}

/// KB entries grouped by match key, each bucket in ledger order
#[derive(Debug, Default)]
pub struct LedgerIndex<'a> {
    buckets: HashMap<MatchKey, Vec<&'a LedgerEntry>>,
}

impl<'a> LedgerIndex<'a> {
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        let mut buckets: HashMap<MatchKey, Vec<&'a LedgerEntry>> = HashMap::new();
        let mut unkeyed = 0;
        for entry in entries {
            match MatchKey::for_entry(entry) {
                Some(key) => buckets.entry(key).or_default().push(entry),
                None => unkeyed += 1,
            }
        }
        if unkeyed > 0 {
            debug!("{} KB entries have no parsable units and cannot match", unkeyed);
        }
        Self { buckets }
    }

    /// Candidates for a key, empty when none share it
    pub fn bucket(&self, key: &MatchKey) -> &[&'a LedgerEntry] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

/// Result of searching one event's bucket
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<'a> {
    /// Best candidate reached the threshold
    Matched { entry: &'a LedgerEntry, score: f64 },
    /// No candidate reached the threshold; the best attempt is kept for
    /// diagnostics when the bucket was not empty
    Unmatched {
        best_name: Option<String>,
        best_score: Option<f64>,
    },
}

/// Find the KB entry for a debit event
///
/// `threshold` is inclusive: a score equal to it matches.
pub fn find_match<'a>(
    event: &DebitEvent,
    index: &LedgerIndex<'a>,
    threshold: u8,
) -> MatchOutcome<'a> {
    let candidates = match MatchKey::for_event(event) {
        Some(key) => index.bucket(&key),
        None => &[],
    };

    let best = best_match(
        &event.client_name,
        candidates.iter().map(|e| e.client_name.as_str()),
    );

    match best {
        Some((idx, score)) if score >= f64::from(threshold) => MatchOutcome::Matched {
            entry: candidates[idx],
            score,
        },
        Some((idx, score)) => MatchOutcome::Unmatched {
            best_name: Some(candidates[idx].client_name.clone()),
            best_score: Some(score),
        },
        None => MatchOutcome::Unmatched {
            best_name: None,
            best_score: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchQuality;

    fn entry(row: usize, isin: &str, name: &str, qty: &str) -> LedgerEntry {
        LedgerEntry {
            row,
            security_id: isin.to_string(),
            client_name: name.to_string(),
            quantity: crate::parse::parse_quantity(qty),
            entry_date: None,
            status: "Transferred".to_string(),
            status_upper: "TRANSFERRED".to_string(),
        }
    }

    fn event(isin: &str, name: &str, qty: &str) -> DebitEvent {
        DebitEvent {
            posted_date: None,
            security_id: isin.to_string(),
            quantity: crate::parse::parse_quantity(qty),
            client_name: name.to_string(),
            match_type: None,
            extracted_demat: None,
            match_quality: MatchQuality::Ok,
            demat_raw: String::new(),
        }
    }

    #[test]
    fn test_quantity_equality_is_numeric() {
        let ledger = vec![
            entry(0, "X1", "JOHN SMITH", "100.00"),
            entry(1, "X1", "JOHN SMITH", "1,000"),
        ];
        let index = LedgerIndex::build(&ledger);
        assert_eq!(index.bucket_count(), 2);

        match find_match(&event("X1", "JOHN SMITH", "100"), &index, 95) {
            MatchOutcome::Matched { entry, .. } => assert_eq!(entry.row, 0),
            other => panic!("expected a match, got {other:?}"),
        }
        match find_match(&event("X1", "JOHN SMITH", "1000"), &index, 95) {
            MatchOutcome::Matched { entry, .. } => assert_eq!(entry.row, 1),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_security_id_must_match() {
        let ledger = vec![entry(0, "X2", "JOHN SMITH", "100")];
        let index = LedgerIndex::build(&ledger);
        assert_eq!(
            find_match(&event("X1", "JOHN SMITH", "100"), &index, 95),
            MatchOutcome::Unmatched {
                best_name: None,
                best_score: None
            }
        );
    }

    #[test]
    fn test_below_threshold_keeps_best_attempt() {
        let ledger = vec![
            entry(0, "X1", "JOHN SMYTHE", "100"),
            entry(1, "X1", "JANE DOE", "100"),
        ];
        let index = LedgerIndex::build(&ledger);
        match find_match(&event("X1", "JOHN SMITH", "100"), &index, 95) {
            MatchOutcome::Unmatched {
                best_name,
                best_score,
            } => {
                assert_eq!(best_name.as_deref(), Some("JOHN SMYTHE"));
                assert!(best_score.unwrap() < 95.0);
            }
            other => panic!("expected no match, got {other:?}"),
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let ledger = vec![entry(0, "X1", "JOHN SMITH", "100")];
        let index = LedgerIndex::build(&ledger);
        assert!(matches!(
            find_match(&event("X1", "john smith", "100"), &index, 100),
            MatchOutcome::Matched { .. }
        ));
    }

    #[test]
    fn test_unparsable_units_never_match() {
        let ledger = vec![entry(0, "X1", "JOHN SMITH", "n/a")];
        let index = LedgerIndex::build(&ledger);
        assert_eq!(index.bucket_count(), 0);
        assert!(matches!(
            find_match(&event("X1", "JOHN SMITH", "n/a"), &index, 0),
            MatchOutcome::Unmatched { best_score: None, .. }
        ));
    }

    #[test]
    fn test_bucket_not_depleted() {
        let ledger = vec![entry(0, "X1", "JOHN SMITH", "100")];
        let index = LedgerIndex::build(&ledger);
        let first = find_match(&event("X1", "JOHN SMITH", "100"), &index, 95);
        let second = find_match(&event("X1", "JOHN SMITH", "100"), &index, 95);
        assert_eq!(first, second);
    }
}
