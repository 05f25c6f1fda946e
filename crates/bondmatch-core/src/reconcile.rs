//! Forward reconciliation and reverse coverage
//!
//! Runs:
//! - Forward: every debit event gets exactly one reconciliation row, matched
//!   or not, against the date-filtered KB ledger
//! - Reverse: KB entries inside the date filter that no event consumed

use std::collections::HashSet;

use tracing::{debug, info};

use crate::classify::{align_dates, classify_ledger_only, classify_match, classify_unmatched};
use crate::config::ReconConfig;
use crate::ledger::DateFilter;
use crate::masters::SecurityMaster;
use crate::matcher::{find_match, LedgerIndex, MatchOutcome};
use crate::models::{
    cmp_nulls_last, DebitEvent, LedgerEntry, LedgerOnlyRow, ReconciliationReport,
    ReconciliationRow, Severity, Verdict,
};

/// Reconciles debit events against the KB ledger
pub struct Reconciler<'a> {
    securities: &'a SecurityMaster,
    config: ReconConfig,
    filter: DateFilter,
}

impl<'a> Reconciler<'a> {
    pub fn new(securities: &'a SecurityMaster) -> Self {
        Self {
            securities,
            config: ReconConfig::default(),
            filter: DateFilter::default(),
        }
    }

    pub fn with_config(securities: &'a SecurityMaster, config: ReconConfig) -> Self {
        Self {
            securities,
            config,
            filter: DateFilter::default(),
        }
    }

    /// Restrict the KB ledger to an inclusive date window
    pub fn date_filter(mut self, filter: DateFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run both directions and assemble the report tables
    pub fn run(&self, debits: &[DebitEvent], ledger: &[LedgerEntry]) -> ReconciliationReport {
        let filtered = self.filter.apply(ledger);
        if !self.filter.is_unbounded() {
            debug!(
                "KB date filter kept {} of {} entries",
                filtered.len(),
                ledger.len()
            );
        }

        let index = LedgerIndex::build(filtered.iter().copied());
        let mut consumed: HashSet<usize> = HashSet::new();

        let mut reconciliation: Vec<ReconciliationRow> = debits
            .iter()
            .map(|event| self.reconcile_event(event, &index, &mut consumed))
            .collect();
        reconciliation.sort_by(|a, b| {
            a.verdict
                .as_str()
                .cmp(b.verdict.as_str())
                .then_with(|| cmp_nulls_last(&a.posted_date, &b.posted_date))
                .then_with(|| a.security_id.cmp(&b.security_id))
        });

        let exceptions: Vec<ReconciliationRow> = reconciliation
            .iter()
            .filter(|row| !row.verdict.is_ok())
            .cloned()
            .collect();

        let mut kb_unmatched: Vec<LedgerOnlyRow> = filtered
            .iter()
            .filter(|entry| !consumed.contains(&entry.row))
            .map(|entry| self.ledger_only_row(entry))
            .collect();
        kb_unmatched.sort_by(|a, b| {
            a.verdict
                .as_str()
                .cmp(b.verdict.as_str())
                .then_with(|| cmp_nulls_last(&a.entry_date, &b.entry_date))
                .then_with(|| a.security_id.cmp(&b.security_id))
        });

        let report = ReconciliationReport {
            reconciliation,
            exceptions,
            kb_unmatched,
        };

        let summary = report.summary();
        info!(
            "Reconciled {} debits: {} OK, {} exceptions, {} KB-only entries",
            summary.total, summary.ok, summary.exceptions, summary.kb_unmatched
        );
        report
    }

    fn reconcile_event(
        &self,
        event: &DebitEvent,
        index: &LedgerIndex<'_>,
        consumed: &mut HashSet<usize>,
    ) -> ReconciliationRow {
        let mut row = ReconciliationRow {
            posted_date: event.posted_date,
            security_id: event.security_id.clone(),
            security_name: self.securities.name_of(&event.security_id).to_string(),
            quantity: event.quantity,
            client_name: event.client_name.clone(),
            match_type: event.match_type.clone(),
            extracted_demat: event.extracted_demat.clone(),
            match_quality: event.match_quality,
            demat_raw: event.demat_raw.clone(),
            kb_client_name: String::new(),
            match_score: None,
            kb_date: None,
            kb_status: String::new(),
            verdict: Verdict::NoMatchInKb,
            severity: Severity::Red,
            reason: String::new(),
        };

        let classification = match find_match(event, index, self.config.name_threshold) {
            MatchOutcome::Matched { entry, score } => {
                consumed.insert(entry.row);
                row.kb_client_name = entry.client_name.clone();
                row.match_score = Some(score);
                row.kb_date = entry.entry_date;
                row.kb_status = entry.status.clone();

                let alignment = align_dates(event.posted_date, entry.entry_date);
                classify_match(alignment, self.config.is_transferred(&entry.status_upper))
            }
            MatchOutcome::Unmatched {
                best_name,
                best_score,
            } => {
                debug!(
                    "No KB match for {} x {:?} ({})",
                    event.security_id, event.quantity, event.client_name
                );
                row.kb_client_name = best_name.unwrap_or_default();
                row.match_score = best_score;
                classify_unmatched()
            }
        };

        row.verdict = classification.verdict;
        row.severity = classification.severity;
        row.reason = classification.reason;
        row
    }

    fn ledger_only_row(&self, entry: &LedgerEntry) -> LedgerOnlyRow {
        let classification = classify_ledger_only(&entry.status_upper, &self.config);
        LedgerOnlyRow {
            entry_date: entry.entry_date,
            security_id: entry.security_id.clone(),
            security_name: self.securities.name_of(&entry.security_id).to_string(),
            quantity: entry.quantity,
            client_name: entry.client_name.clone(),
            status: entry.status.clone(),
            verdict: classification.verdict,
            severity: classification.severity,
            reason: classification.reason,
        }
    }
}

/// Reconcile with a given config and date window
pub fn reconcile(
    debits: &[DebitEvent],
    ledger: &[LedgerEntry],
    securities: &SecurityMaster,
    config: &ReconConfig,
    filter: DateFilter,
) -> ReconciliationReport {
    Reconciler::with_config(securities, config.clone())
        .date_filter(filter)
        .run(debits, ledger)
}
