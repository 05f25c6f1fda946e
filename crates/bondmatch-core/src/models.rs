//! Domain models for bondmatch

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Depository that issued a demat account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DematKind {
    /// `IN` followed by alphanumerics
    Nsdl,
    /// 16 digits
    Cdsl,
    /// A label read back from a debit table that is neither NSDL nor CDSL
    Unknown(String),
}

impl DematKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Nsdl => "NSDL",
            Self::Cdsl => "CDSL",
            Self::Unknown(label) => label,
        }
    }

    /// Parse a `MatchType` cell. Empty cells mean no identifier was found.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        match label.to_uppercase().as_str() {
            "" => None,
            "NSDL" => Some(Self::Nsdl),
            "CDSL" => Some(Self::Cdsl),
            _ => Some(Self::Unknown(label.to_string())),
        }
    }
}

impl std::fmt::Display for DematKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for DematKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A demat identifier recovered from a transaction narration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DematId {
    pub kind: DematKind,
    pub value: String,
}

impl DematId {
    pub fn nsdl(value: impl Into<String>) -> Self {
        Self {
            kind: DematKind::Nsdl,
            value: value.into(),
        }
    }

    pub fn cdsl(value: impl Into<String>) -> Self {
        Self {
            kind: DematKind::Cdsl,
            value: value.into(),
        }
    }
}

/// Outcome of resolving a demat identifier to a client name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchQuality {
    Ok,
    NsdlNotInMaster,
    CdslNotInMaster,
    NoDematFound,
    UnknownType,
}

impl MatchQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NsdlNotInMaster => "NSDL_NOT_IN_MASTER",
            Self::CdslNotInMaster => "CDSL_NOT_IN_MASTER",
            Self::NoDematFound => "NO_DEMAT_FOUND",
            Self::UnknownType => "UNKNOWN_TYPE",
        }
    }
}

impl std::str::FromStr for MatchQuality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OK" => Ok(Self::Ok),
            "NSDL_NOT_IN_MASTER" => Ok(Self::NsdlNotInMaster),
            "CDSL_NOT_IN_MASTER" => Ok(Self::CdslNotInMaster),
            "NO_DEMAT_FOUND" => Ok(Self::NoDematFound),
            "UNKNOWN_TYPE" => Ok(Self::UnknownType),
            _ => Err(format!("Unknown match quality: {}", s)),
        }
    }
}

impl std::fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a posted date lines up with the matched KB date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateAlignment {
    DateMatch,
    DateAfterReview,
    DateBeforeMismatch,
    DateMissingReview,
}

impl DateAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateMatch => "DATE_MATCH",
            Self::DateAfterReview => "DATE_AFTER_REVIEW",
            Self::DateBeforeMismatch => "DATE_BEFORE_MISMATCH",
            Self::DateMissingReview => "DATE_MISSING_REVIEW",
        }
    }

    /// Human-readable note used in verdict reasons
    pub fn note(&self) -> &'static str {
        match self {
            Self::DateMatch => "Exact date match",
            Self::DateAfterReview => "PostedDate after KB date (review)",
            Self::DateBeforeMismatch => "PostedDate before KB date (mismatch)",
            Self::DateMissingReview => "PostedDate or KB date missing",
        }
    }
}

impl std::fmt::Display for DateAlignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit verdict for a reconciliation or KB-only row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Ok,
    ReviewDateAfter,
    StatusNotTransferred,
    DateBeforeMismatch,
    MissingDateReview,
    NoMatchInKb,
    KbOnlyNoDpMatch,
    KbOnlyPending,
    KbOnlyReview,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ReviewDateAfter => "REVIEW_DATE_AFTER",
            Self::StatusNotTransferred => "STATUS_NOT_TRANSFERRED",
            Self::DateBeforeMismatch => "DATE_BEFORE_MISMATCH",
            Self::MissingDateReview => "MISSING_DATE_REVIEW",
            Self::NoMatchInKb => "NO_MATCH_IN_KB",
            Self::KbOnlyNoDpMatch => "KB_ONLY_NO_DP_MATCH",
            Self::KbOnlyPending => "KB_ONLY_PENDING",
            Self::KbOnlyReview => "KB_ONLY_REVIEW",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display priority of a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Green,
    Yellow,
    Red,
    Grey,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::Red => "Red",
            Self::Grey => "Grey",
        }
    }

    /// Solid fill colour (RGB hex) used when highlighting rows of this severity
    pub fn fill_color(&self) -> &'static str {
        match self {
            Self::Green => "C6EFCE",
            Self::Yellow => "FFEB9C",
            Self::Red => "FFC7CE",
            Self::Grey => "D9D9D9",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One debit transaction from the depository report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebitEvent {
    #[serde(rename = "PostedDate", serialize_with = "serialize_datetime")]
    pub posted_date: Option<NaiveDateTime>,
    #[serde(rename = "ISIN")]
    pub security_id: String,
    #[serde(rename = "Units_num")]
    pub quantity: Option<Decimal>,
    #[serde(rename = "ClientName")]
    pub client_name: String,
    #[serde(rename = "MatchType")]
    pub match_type: Option<DematKind>,
    #[serde(rename = "ExtractedDemat")]
    pub extracted_demat: Option<String>,
    #[serde(rename = "MatchQuality")]
    pub match_quality: MatchQuality,
    #[serde(rename = "DematRaw")]
    pub demat_raw: String,
}

/// One row of the KB ledger sheet after column projection
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// Zero-based data row ordinal in the ledger sheet
    pub row: usize,
    pub security_id: String,
    pub client_name: String,
    pub quantity: Option<Decimal>,
    pub entry_date: Option<NaiveDateTime>,
    pub status: String,
    pub status_upper: String,
}

/// Forward reconciliation result for one debit event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationRow {
    #[serde(rename = "PostedDate", serialize_with = "serialize_datetime")]
    pub posted_date: Option<NaiveDateTime>,
    #[serde(rename = "ISIN")]
    pub security_id: String,
    #[serde(rename = "BondName")]
    pub security_name: String,
    #[serde(rename = "Units_num")]
    pub quantity: Option<Decimal>,
    #[serde(rename = "ClientName")]
    pub client_name: String,
    #[serde(rename = "MatchType")]
    pub match_type: Option<DematKind>,
    #[serde(rename = "ExtractedDemat")]
    pub extracted_demat: Option<String>,
    #[serde(rename = "MatchQuality")]
    pub match_quality: MatchQuality,
    #[serde(rename = "DematRaw")]
    pub demat_raw: String,
    #[serde(rename = "KB_ClientName")]
    pub kb_client_name: String,
    #[serde(rename = "NameMatchScore", serialize_with = "serialize_score")]
    pub match_score: Option<f64>,
    #[serde(rename = "KB_Date", serialize_with = "serialize_datetime")]
    pub kb_date: Option<NaiveDateTime>,
    #[serde(rename = "KB_Status")]
    pub kb_status: String,
    #[serde(rename = "ReconStatus")]
    pub verdict: Verdict,
    #[serde(rename = "FlagColor")]
    pub severity: Severity,
    #[serde(rename = "Reason")]
    pub reason: String,
}

/// KB ledger entry that no debit event consumed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerOnlyRow {
    #[serde(rename = "KB_Date", serialize_with = "serialize_datetime")]
    pub entry_date: Option<NaiveDateTime>,
    #[serde(rename = "ISIN")]
    pub security_id: String,
    #[serde(rename = "BondName")]
    pub security_name: String,
    #[serde(rename = "Units_num")]
    pub quantity: Option<Decimal>,
    #[serde(rename = "ClientName")]
    pub client_name: String,
    #[serde(rename = "KB_Status")]
    pub status: String,
    #[serde(rename = "ReconStatus")]
    pub verdict: Verdict,
    #[serde(rename = "FlagColor")]
    pub severity: Severity,
    #[serde(rename = "Reason")]
    pub reason: String,
}

/// All tables produced by one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub reconciliation: Vec<ReconciliationRow>,
    pub exceptions: Vec<ReconciliationRow>,
    pub kb_unmatched: Vec<LedgerOnlyRow>,
}

impl ReconciliationReport {
    pub fn summary(&self) -> ReconciliationSummary {
        let mut by_verdict = BTreeMap::new();
        for row in &self.reconciliation {
            *by_verdict.entry(row.verdict.as_str().to_string()).or_insert(0) += 1;
        }
        for row in &self.kb_unmatched {
            *by_verdict.entry(row.verdict.as_str().to_string()).or_insert(0) += 1;
        }

        ReconciliationSummary {
            total: self.reconciliation.len(),
            ok: self
                .reconciliation
                .iter()
                .filter(|r| r.verdict.is_ok())
                .count(),
            exceptions: self.exceptions.len(),
            kb_unmatched: self.kb_unmatched.len(),
            by_verdict,
        }
    }
}

/// Headline counts for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub total: usize,
    pub ok: usize,
    pub exceptions: usize,
    pub kb_unmatched: usize,
    pub by_verdict: BTreeMap<String, usize>,
}

/// Order two optional values ascending with `None` last
pub fn cmp_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Render a timestamp as a date, or date and time when a time-of-day is present
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn serialize_datetime<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(dt) => serializer.serialize_str(&format_datetime(dt)),
        None => serializer.serialize_none(),
    }
}

fn serialize_score<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(score) => serializer.serialize_f64((score * 100.0).round() / 100.0),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_demat_kind_from_label() {
        assert_eq!(DematKind::from_label("NSDL"), Some(DematKind::Nsdl));
        assert_eq!(DematKind::from_label(" cdsl "), Some(DematKind::Cdsl));
        assert_eq!(DematKind::from_label(""), None);
        assert_eq!(
            DematKind::from_label("BSE"),
            Some(DematKind::Unknown("BSE".to_string()))
        );
    }

    #[test]
    fn test_verdict_as_str() {
        assert_eq!(Verdict::NoMatchInKb.as_str(), "NO_MATCH_IN_KB");
        assert_eq!(Verdict::KbOnlyNoDpMatch.as_str(), "KB_ONLY_NO_DP_MATCH");
        assert!(Verdict::Ok.is_ok());
        assert!(!Verdict::ReviewDateAfter.is_ok());
    }

    #[test]
    fn test_match_quality_round_trip_label() {
        let quality: MatchQuality = "cdsl_not_in_master".parse().unwrap();
        assert_eq!(quality, MatchQuality::CdslNotInMaster);
        assert!("bogus".parse::<MatchQuality>().is_err());
    }

    #[test]
    fn test_format_datetime() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(
            format_datetime(&day.and_hms_opt(0, 0, 0).unwrap()),
            "2024-01-10"
        );
        assert_eq!(
            format_datetime(&day.and_hms_opt(14, 5, 0).unwrap()),
            "2024-01-10 14:05:00"
        );
    }

    #[test]
    fn test_cmp_nulls_last() {
        let mut values = vec![None, Some(3), Some(1), None, Some(2)];
        values.sort_by(cmp_nulls_last);
        assert_eq!(values, vec![Some(1), Some(2), Some(3), None, None]);
    }

    #[test]
    fn test_severity_fill_color() {
        assert_eq!(Severity::Green.fill_color(), "C6EFCE");
        assert_eq!(Severity::Grey.fill_color(), "D9D9D9");
    }
}
