//! KB ledger ("KB HUF" sheet) reader and date filter
//!
//! Columns are read by position, not by header name, because the sheet's
//! headers are not stable between workbook versions:
//! B = ISIN, D = client name, E = units, H = date, L = status.

use std::io::Read;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use tracing::debug;

use crate::config::LedgerLayout;
use crate::error::{Error, Result};
use crate::models::LedgerEntry;
use crate::parse::{decode_record, normalize_cell, parse_date, parse_quantity, upper_cell};

/// Inclusive calendar-day window applied to KB entry dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateFilter {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether an entry passes the filter
    ///
    /// An entry without a date fails any bound that is set.
    pub fn contains(&self, entry: &LedgerEntry) -> bool {
        let day = entry.entry_date.map(|d| d.date());
        if let Some(from) = self.from {
            match day {
                Some(day) if day >= from => {}
                _ => return false,
            }
        }
        if let Some(to) = self.to {
            match day {
                Some(day) if day <= to => {}
                _ => return false,
            }
        }
        true
    }

    /// Entries within the window, in input order
    pub fn apply<'a>(&self, entries: &'a [LedgerEntry]) -> Vec<&'a LedgerEntry> {
        entries.iter().filter(|e| self.contains(e)).collect()
    }
}

/// Parse the KB ledger sheet
pub fn read_ledger<R: Read>(reader: R, layout: &LedgerLayout) -> Result<Vec<LedgerEntry>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = decode_record(rdr.byte_headers()?);
    if headers.len() < layout.min_columns {
        return Err(Error::TooFewColumns {
            source_name: "KB HUF sheet".to_string(),
            expected: layout.min_columns,
            found: headers.len(),
        });
    }

    let mut entries = Vec::new();
    for (row, result) in rdr.byte_records().enumerate() {
        let record = decode_record(&result?);
        let cell = |i: usize| record.get(i).unwrap_or("");

        let status = normalize_cell(cell(layout.status));
        entries.push(LedgerEntry {
            row,
            security_id: upper_cell(cell(layout.security_id)),
            client_name: normalize_cell(cell(layout.client_name)),
            quantity: parse_quantity(cell(layout.quantity)),
            entry_date: parse_date(cell(layout.date)),
            status_upper: status.to_uppercase(),
            status,
        });
    }

    debug!(
        "Read {} KB ledger rows ({} without date)",
        entries.len(),
        entries.iter().filter(|e| e.entry_date.is_none()).count()
    );
    Ok(entries)
}

/// Earliest and latest entry dates, ignoring entries without one
pub fn ledger_date_range(entries: &[LedgerEntry]) -> Option<(NaiveDate, NaiveDate)> {
    let mut days = entries.iter().filter_map(|e| e.entry_date.map(|d| d.date()));
    let first = days.next()?;
    Some(days.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}
