//! Verdict classification
//!
//! Matched rows are classified from the date alignment and the KB status;
//! unmatched rows and KB-only rows have fixed verdicts.

use chrono::NaiveDateTime;

use crate::config::ReconConfig;
use crate::models::{DateAlignment, Severity, Verdict};

/// Verdict, severity and reason text for one output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub severity: Severity,
    pub reason: String,
}

impl Classification {
    fn new(verdict: Verdict, severity: Severity, reason: impl Into<String>) -> Self {
        Self {
            verdict,
            severity,
            reason: reason.into(),
        }
    }
}

/// Compare a posted date with a KB date
///
/// Equal calendar days match regardless of time-of-day. Otherwise a posted
/// date on or after the KB date needs review and an earlier one is a mismatch.
pub fn align_dates(posted: Option<NaiveDateTime>, kb: Option<NaiveDateTime>) -> DateAlignment {
    match (posted, kb) {
        (Some(posted), Some(kb)) if posted.date() == kb.date() => DateAlignment::DateMatch,
        (Some(posted), Some(kb)) if posted >= kb => DateAlignment::DateAfterReview,
        (Some(_), Some(_)) => DateAlignment::DateBeforeMismatch,
        _ => DateAlignment::DateMissingReview,
    }
}

/// Classify a debit event that matched a KB entry
///
/// The KB status only decides between confirmed and not-transferred when the
/// dates line up; date mismatches and missing dates win regardless of status.
pub fn classify_match(alignment: DateAlignment, transferred: bool) -> Classification {
    match (alignment, transferred) {
        (DateAlignment::DateMatch, true) => Classification::new(
            Verdict::Ok,
            Severity::Green,
            "ISIN+Units matched; Name fuzzy matched; Date matched; Status=Transferred",
        ),
        (DateAlignment::DateAfterReview, true) => Classification::new(
            Verdict::ReviewDateAfter,
            Severity::Yellow,
            "ISIN+Units matched; Name fuzzy matched; Status=Transferred; \
             Date differs but PostedDate>=KB date",
        ),
        (DateAlignment::DateMatch | DateAlignment::DateAfterReview, false) => {
            Classification::new(
                Verdict::StatusNotTransferred,
                Severity::Red,
                format!("{}; Status not Transferred", alignment.note()),
            )
        }
        (DateAlignment::DateBeforeMismatch, _) => Classification::new(
            Verdict::DateBeforeMismatch,
            Severity::Red,
            alignment.note(),
        ),
        (DateAlignment::DateMissingReview, _) => Classification::new(
            Verdict::MissingDateReview,
            Severity::Grey,
            alignment.note(),
        ),
    }
}

/// Classify a debit event with no KB entry at or above the threshold
pub fn classify_unmatched() -> Classification {
    Classification::new(
        Verdict::NoMatchInKb,
        Severity::Red,
        "No KB match for same ISIN+Units with ClientName >= threshold (after KB date filter)",
    )
}

/// Classify a KB entry that no debit event consumed
pub fn classify_ledger_only(status_upper: &str, config: &ReconConfig) -> Classification {
    if config.is_transferred(status_upper) {
        Classification::new(
            Verdict::KbOnlyNoDpMatch,
            Severity::Red,
            "KB entry marked Transferred but no matching DP/Phase-1 transaction",
        )
    } else if config.is_pending(status_upper) {
        Classification::new(
            Verdict::KbOnlyPending,
            Severity::Yellow,
            "KB entry exists but not Transferred and no matching DP/Phase-1 transaction",
        )
    } else {
        Classification::new(
            Verdict::KbOnlyReview,
            Severity::Grey,
            "KB entry exists with no DP/Phase-1 match (review)",
        )
    }
}
