//! Table export
//!
//! Supports:
//! - One CSV file per table (debits, reconciliation, exceptions, KB-only)
//! - A single JSON document holding every table plus the run summary
//!
//! Every reconciliation and KB-only row carries a `FlagColor` column; the
//! matching fill colours are listed in the JSON document for highlighting.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{
    DebitEvent, LedgerOnlyRow, ReconciliationReport, ReconciliationRow, ReconciliationSummary,
    Severity,
};

pub const DEBITS_FILE: &str = "Phase1_Debits.csv";
pub const RECONCILIATION_FILE: &str = "Reconciliation.csv";
pub const EXCEPTIONS_FILE: &str = "Exceptions.csv";
pub const KB_UNMATCHED_FILE: &str = "KB_Unmatched.csv";
pub const JSON_FILE: &str = "reconciliation.json";

const DEBIT_HEADERS: &[&str] = &[
    "PostedDate",
    "ISIN",
    "Units_num",
    "ClientName",
    "MatchType",
    "ExtractedDemat",
    "MatchQuality",
    "DematRaw",
];

const RECONCILIATION_HEADERS: &[&str] = &[
    "PostedDate",
    "ISIN",
    "BondName",
    "Units_num",
    "ClientName",
    "MatchType",
    "ExtractedDemat",
    "MatchQuality",
    "DematRaw",
    "KB_ClientName",
    "NameMatchScore",
    "KB_Date",
    "KB_Status",
    "ReconStatus",
    "FlagColor",
    "Reason",
];

const KB_UNMATCHED_HEADERS: &[&str] = &[
    "KB_Date",
    "ISIN",
    "BondName",
    "Units_num",
    "ClientName",
    "KB_Status",
    "ReconStatus",
    "FlagColor",
    "Reason",
];

/// Export format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Options for writing a report to disk
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Write the debit table alongside the reconciliation tables
    pub include_debits: bool,
    /// Write `KB_Unmatched.csv` even when it has no rows
    pub keep_empty_kb_unmatched: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            include_debits: true,
            keep_empty_kb_unmatched: false,
        }
    }
}

/// Everything from one run in a single serializable document
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub summary: ReconciliationSummary,
    pub fill_colors: BTreeMap<&'static str, &'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debits: Option<&'a [DebitEvent]>,
    pub reconciliation: &'a [ReconciliationRow],
    pub exceptions: &'a [ReconciliationRow],
    pub kb_unmatched: &'a [LedgerOnlyRow],
}

impl<'a> ReportDocument<'a> {
    pub fn new(report: &'a ReconciliationReport, debits: Option<&'a [DebitEvent]>) -> Self {
        let fill_colors = [Severity::Green, Severity::Yellow, Severity::Red, Severity::Grey]
            .into_iter()
            .map(|s| (s.as_str(), s.fill_color()))
            .collect();

        Self {
            summary: report.summary(),
            fill_colors,
            debits,
            reconciliation: &report.reconciliation,
            exceptions: &report.exceptions,
            kb_unmatched: &report.kb_unmatched,
        }
    }
}

/// Write rows under a fixed header line, so empty tables still get headers
fn write_rows<W: Write, T: Serialize>(writer: W, headers: &[&str], rows: &[T]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(headers)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the debit event table as CSV
pub fn write_debits_csv<W: Write>(writer: W, debits: &[DebitEvent]) -> Result<()> {
    write_rows(writer, DEBIT_HEADERS, debits)
}

/// Write reconciliation (or exception) rows as CSV
pub fn write_reconciliation_csv<W: Write>(writer: W, rows: &[ReconciliationRow]) -> Result<()> {
    write_rows(writer, RECONCILIATION_HEADERS, rows)
}

/// Write KB-only rows as CSV
pub fn write_kb_unmatched_csv<W: Write>(writer: W, rows: &[LedgerOnlyRow]) -> Result<()> {
    write_rows(writer, KB_UNMATCHED_HEADERS, rows)
}

/// Render the whole run as pretty-printed JSON
pub fn report_to_json(
    report: &ReconciliationReport,
    debits: Option<&[DebitEvent]>,
) -> Result<String> {
    let document = ReportDocument::new(report, debits);
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Write a run's tables into a directory
///
/// Returns the paths written, in write order. The directory is created if
/// it does not exist.
pub fn write_report(
    dir: &Path,
    report: &ReconciliationReport,
    debits: &[DebitEvent],
    options: &ExportOptions,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    let debits = options.include_debits.then_some(debits);

    match options.format {
        ExportFormat::Json => {
            let path = dir.join(JSON_FILE);
            fs::write(&path, report_to_json(report, debits)?)?;
            written.push(path);
        }
        ExportFormat::Csv => {
            if let Some(debits) = debits {
                let path = dir.join(DEBITS_FILE);
                write_debits_csv(File::create(&path)?, debits)?;
                written.push(path);
            }

            let path = dir.join(RECONCILIATION_FILE);
            write_reconciliation_csv(File::create(&path)?, &report.reconciliation)?;
            written.push(path);

            let path = dir.join(EXCEPTIONS_FILE);
            write_reconciliation_csv(File::create(&path)?, &report.exceptions)?;
            written.push(path);

            if !report.kb_unmatched.is_empty() || options.keep_empty_kb_unmatched {
                let path = dir.join(KB_UNMATCHED_FILE);
                write_kb_unmatched_csv(File::create(&path)?, &report.kb_unmatched)?;
                written.push(path);
            } else {
                debug!("No KB-only entries; skipping {}", KB_UNMATCHED_FILE);
            }
        }
    }

    info!(
        "Exported {} file(s) as {} to {}",
        written.len(),
        options.format.as_str(),
        dir.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DematKind, MatchQuality, Verdict};
    use crate::parse::{parse_date, parse_quantity};
    use crate::report::read_debits_csv;

    fn debit() -> DebitEvent {
        DebitEvent {
            posted_date: parse_date("10/01/2024"),
            security_id: "INE001A01036".to_string(),
            quantity: parse_quantity("500.00"),
            client_name: "JANE DOE".to_string(),
            match_type: Some(DematKind::Nsdl),
            extracted_demat: Some("IN30021410001234".to_string()),
            match_quality: MatchQuality::Ok,
            demat_raw: "INTER DP TRF IN300214 10001234".to_string(),
        }
    }

    fn row(verdict: Verdict, severity: Severity) -> ReconciliationRow {
        let d = debit();
        ReconciliationRow {
            posted_date: d.posted_date,
            security_id: d.security_id,
            security_name: "ALPHA 8% 2030".to_string(),
            quantity: d.quantity,
            client_name: d.client_name,
            match_type: d.match_type,
            extracted_demat: d.extracted_demat,
            match_quality: d.match_quality,
            demat_raw: d.demat_raw,
            kb_client_name: "Jane Doe".to_string(),
            match_score: Some(96.666_666),
            kb_date: parse_date("2024-01-10 09:30:00"),
            kb_status: "Transferred".to_string(),
            verdict,
            severity,
            reason: "why".to_string(),
        }
    }

    fn report() -> ReconciliationReport {
        let ok = row(Verdict::Ok, Severity::Green);
        let review = row(Verdict::ReviewDateAfter, Severity::Yellow);
        ReconciliationReport {
            reconciliation: vec![ok, review.clone()],
            exceptions: vec![review],
            kb_unmatched: Vec::new(),
        }
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_debits_csv_reads_back() {
        let mut buf = Vec::new();
        write_debits_csv(&mut buf, &[debit()]).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(DEBIT_HEADERS.join(",").as_str()));
        let first = lines.next().unwrap();
        assert!(first.starts_with("2024-01-10,INE001A01036,500,JANE DOE,NSDL,"));

        let back = read_debits_csv(buf.as_slice()).unwrap();
        assert_eq!(back, vec![debit()]);
    }

    #[test]
    fn test_reconciliation_csv_columns() {
        let mut buf = Vec::new();
        write_reconciliation_csv(&mut buf, &report().reconciliation).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().next(), Some(RECONCILIATION_HEADERS.join(",").as_str()));
        let first = text.lines().nth(1).unwrap();
        assert!(first.contains(",OK,INTER DP TRF IN300214 10001234,Jane Doe,96.67,"));
        assert!(first.ends_with(",2024-01-10 09:30:00,Transferred,OK,Green,why"));
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let mut buf = Vec::new();
        write_kb_unmatched_csv(&mut buf, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap().trim_end(),
            KB_UNMATCHED_HEADERS.join(",")
        );
    }

    #[test]
    fn test_write_report_csv_skips_empty_kb_unmatched() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions::default();
        let written = write_report(dir.path(), &report(), &[debit()], &options).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![DEBITS_FILE, RECONCILIATION_FILE, EXCEPTIONS_FILE]);
        assert!(!dir.path().join(KB_UNMATCHED_FILE).exists());

        let forced = ExportOptions {
            include_debits: false,
            keep_empty_kb_unmatched: true,
            ..Default::default()
        };
        let out = dir.path().join("forced");
        let written = write_report(&out, &report(), &[debit()], &forced).unwrap();
        assert_eq!(written.len(), 3);
        assert!(out.join(KB_UNMATCHED_FILE).exists());
        assert!(!out.join(DEBITS_FILE).exists());
    }

    #[test]
    fn test_write_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            format: ExportFormat::Json,
            ..Default::default()
        };
        let written = write_report(dir.path(), &report(), &[debit()], &options).unwrap();
        assert_eq!(written, vec![dir.path().join(JSON_FILE)]);

        let text = fs::read_to_string(&written[0]).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["summary"]["total"], 2);
        assert_eq!(doc["summary"]["ok"], 1);
        assert_eq!(doc["fill_colors"]["Red"], "FFC7CE");
        assert_eq!(doc["reconciliation"][1]["ReconStatus"], "REVIEW_DATE_AFTER");
        assert_eq!(doc["reconciliation"][0]["NameMatchScore"], 96.67);
        assert_eq!(
            doc["reconciliation"][0]["DematRaw"],
            "INTER DP TRF IN300214 10001234"
        );
        assert_eq!(doc["debits"][0]["Units_num"], "500");
        assert_eq!(doc["kb_unmatched"].as_array().unwrap().len(), 0);
    }
}
