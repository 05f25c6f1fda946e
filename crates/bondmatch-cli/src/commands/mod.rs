//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `debits` - Debit table construction from the depository report
//! - `reconcile` - Reconciliation against the KB ledger, ledger date range
//! - `config` - Config inspection (show, path)
//!
//! Shared helpers for loading config and interpreting flags live here.

pub mod config;
pub mod debits;
pub mod reconcile;

// Re-export command functions for main.rs
pub use config::*;
pub use debits::*;
pub use reconcile::*;

use std::path::Path;

use anyhow::{Context, Result};
use bondmatch_core::{DateFilter, ExportFormat, ExportOptions, ReconConfig};
use chrono::NaiveDate;
use tracing::debug;

/// Load config and apply a `--threshold` override
pub fn load_config(path: Option<&Path>, threshold: Option<u8>) -> Result<ReconConfig> {
    let mut config = ReconConfig::load(path).context("Failed to load config")?;
    if let Some(threshold) = threshold {
        config = config.with_threshold(threshold)?;
    }
    debug!(
        "Name threshold {}, transferred status {:?}",
        config.name_threshold, config.transferred_status
    );
    Ok(config)
}

/// Turn `--from` / `--to` flags into a KB date filter
pub fn parse_date_window(from: Option<&str>, to: Option<&str>) -> Result<DateFilter> {
    let from = from
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --from date format (use YYYY-MM-DD)")?;

    let to = to
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --to date format (use YYYY-MM-DD)")?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            anyhow::bail!("--from ({}) is after --to ({})", from, to);
        }
    }

    Ok(DateFilter::new(from, to))
}

/// Build export options from the output flags
pub fn export_options(
    format: &str,
    include_debits: bool,
    keep_empty: bool,
) -> Result<ExportOptions> {
    let format: ExportFormat = format
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}. Use one of: csv, json", e))?;

    Ok(ExportOptions {
        format,
        include_debits,
        keep_empty_kb_unmatched: keep_empty,
    })
}
