//! Reconciliation configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, else an override in the data dir
//!    (~/.local/share/bondmatch/config/bondmatch.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/bondmatch.toml");

/// Column positions in the KB ledger sheet (zero-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLayout {
    pub security_id: usize,
    pub client_name: usize,
    pub quantity: usize,
    pub date: usize,
    pub status: usize,
    pub min_columns: usize,
}

impl Default for LedgerLayout {
    fn default() -> Self {
        Self {
            security_id: 1,
            client_name: 3,
            quantity: 4,
            date: 7,
            status: 11,
            min_columns: 12,
        }
    }
}

/// Shape of the depository transaction report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    /// Text the trimmed header line starts with
    pub header_prefix: String,
    /// Debit/credit flag value that marks a debit
    pub debit_flag: String,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            header_prefix: "\"POSTED DATE\"".to_string(),
            debit_flag: "D".to_string(),
        }
    }
}

/// Full reconciliation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ReconConfig {
    /// Minimum client-name similarity (0-100) for a match
    pub name_threshold: u8,
    /// Uppercased KB status meaning the transfer completed
    pub transferred_status: String,
    /// Uppercased KB statuses that count as pending
    pub pending_statuses: Vec<String>,
    pub ledger: LedgerLayout,
    pub report: ReportLayout,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name_threshold: 95,
            transferred_status: "TRANSFERRED".to_string(),
            pending_statuses: vec![
                "TRANSFER PENDING".to_string(),
                "PENDING".to_string(),
                "NOT TRANSFERRED".to_string(),
            ],
            ledger: LedgerLayout::default(),
            report: ReportLayout::default(),
        }
    }
}

impl ReconConfig {
    /// Load config (explicit path or data-dir override first, then default)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config {}: {}", path.display(), e))
            })?,
            None => match default_config_path() {
                Some(default_path) if default_path.exists() => fs::read_to_string(&default_path)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }

    /// Replace the name threshold, rejecting values above 100
    pub fn with_threshold(mut self, threshold: u8) -> Result<Self> {
        validate_threshold(threshold)?;
        self.name_threshold = threshold;
        Ok(self)
    }

    pub fn is_transferred(&self, status_upper: &str) -> bool {
        status_upper == self.transferred_status
    }

    pub fn is_pending(&self, status_upper: &str) -> bool {
        self.pending_statuses.iter().any(|s| s == status_upper)
    }

    /// Render the resolved config in the same TOML layout it is read from
    pub fn to_toml(&self) -> Result<String> {
        let raw = RawConfig {
            matching: Some(RawMatching {
                name_threshold: Some(self.name_threshold),
            }),
            status: Some(RawStatus {
                transferred: Some(self.transferred_status.clone()),
                pending: Some(self.pending_statuses.clone()),
            }),
            ledger: Some(RawLedger {
                security_id: Some(self.ledger.security_id),
                client_name: Some(self.ledger.client_name),
                quantity: Some(self.ledger.quantity),
                date: Some(self.ledger.date),
                status: Some(self.ledger.status),
                min_columns: Some(self.ledger.min_columns),
            }),
            report: Some(RawReport {
                header_prefix: Some(self.report.header_prefix.clone()),
                debit_flag: Some(self.report.debit_flag.clone()),
            }),
        };
        toml::to_string(&raw).map_err(|e| Error::Config(format!("Failed to render config: {}", e)))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("bondmatch").join("config").join("bondmatch.toml"))
}

fn validate_threshold(threshold: u8) -> Result<()> {
    if threshold > 100 {
        return Err(Error::Config(format!(
            "name_threshold must be between 0 and 100, got {}",
            threshold
        )));
    }
    Ok(())
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize, Serialize)]
struct RawConfig {
    matching: Option<RawMatching>,
    status: Option<RawStatus>,
    ledger: Option<RawLedger>,
    report: Option<RawReport>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawMatching {
    name_threshold: Option<u8>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawStatus {
    transferred: Option<String>,
    pending: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawLedger {
    security_id: Option<usize>,
    client_name: Option<usize>,
    quantity: Option<usize>,
    date: Option<usize>,
    status: Option<usize>,
    min_columns: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawReport {
    header_prefix: Option<String>,
    debit_flag: Option<String>,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<ReconConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = ReconConfig::default();

    if let Some(matching) = raw.matching {
        if let Some(threshold) = matching.name_threshold {
            validate_threshold(threshold)?;
            config.name_threshold = threshold;
        }
    }

    if let Some(status) = raw.status {
        if let Some(transferred) = status.transferred {
            config.transferred_status = transferred.trim().to_uppercase();
        }
        if let Some(pending) = status.pending {
            config.pending_statuses = pending.iter().map(|s| s.trim().to_uppercase()).collect();
        }
    }

    if let Some(ledger) = raw.ledger {
        let layout = &mut config.ledger;
        if let Some(col) = ledger.security_id {
            layout.security_id = col;
        }
        if let Some(col) = ledger.client_name {
            layout.client_name = col;
        }
        if let Some(col) = ledger.quantity {
            layout.quantity = col;
        }
        if let Some(col) = ledger.date {
            layout.date = col;
        }
        if let Some(col) = ledger.status {
            layout.status = col;
        }
        if let Some(min) = ledger.min_columns {
            layout.min_columns = min;
        }

        let widest = [
            layout.security_id,
            layout.client_name,
            layout.quantity,
            layout.date,
            layout.status,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        if layout.min_columns <= widest {
            return Err(Error::Config(format!(
                "ledger.min_columns ({}) must exceed the highest column position ({})",
                layout.min_columns, widest
            )));
        }
    }

    if let Some(report) = raw.report {
        if let Some(prefix) = report.header_prefix {
            config.report.header_prefix = prefix;
        }
        if let Some(flag) = report.debit_flag {
            config.report.debit_flag = flag.trim().to_uppercase();
        }
    }

    Ok(config)
}
