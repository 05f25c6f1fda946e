//! Bondmatch Core Library
//!
//! Bond-transfer reconciliation between a depository transaction report and
//! a registrar's KB ledger:
//! - Demat identifier extraction from transaction narrations (NSDL / CDSL)
//! - Client identity resolution against a demat master
//! - Debit table construction from the depository report
//! - Exact-key plus fuzzy client-name matching against the KB ledger
//! - Verdict classification for matched, unmatched and KB-only rows
//! - CSV / JSON export of the resulting tables

pub mod classify;
pub mod config;
pub mod demat;
pub mod error;
pub mod export;
pub mod fuzzy;
pub mod ledger;
pub mod masters;
pub mod matcher;
pub mod models;
pub mod parse;
pub mod reconcile;
pub mod report;

pub use classify::Classification;
pub use config::{LedgerLayout, ReconConfig, ReportLayout};
pub use error::{Error, Result};
pub use export::{write_report, ExportFormat, ExportOptions, ReportDocument};
pub use ledger::{ledger_date_range, read_ledger, DateFilter};
pub use masters::{ClientMaster, ClientMasterRow, SecurityMaster};
pub use matcher::{LedgerIndex, MatchKey, MatchOutcome};
pub use models::{
    DateAlignment, DebitEvent, DematId, DematKind, LedgerEntry, LedgerOnlyRow, MatchQuality,
    ReconciliationReport, ReconciliationRow, ReconciliationSummary, Severity, Verdict,
};
pub use reconcile::{reconcile, Reconciler};
pub use report::{parse_report, read_debits_csv};
