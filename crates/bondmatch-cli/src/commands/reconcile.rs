//! Reconciliation and ledger inspection commands

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bondmatch_core::{
    ledger_date_range, read_debits_csv, read_ledger, write_report, DateFilter, DebitEvent,
    ExportOptions, LedgerEntry, ReconConfig, Reconciler, SecurityMaster,
};
use chrono::NaiveDate;

use super::load_report_debits;

/// Where the debit events come from
#[derive(Debug, Clone)]
pub enum DebitSource {
    /// Parse a depository report and resolve it against a demat master
    Report {
        report: PathBuf,
        demat_master: PathBuf,
    },
    /// Read a debit table written by `bondmatch debits`
    Table(PathBuf),
}

pub fn load_debits(config: &ReconConfig, source: &DebitSource) -> Result<Vec<DebitEvent>> {
    match source {
        DebitSource::Report {
            report,
            demat_master,
        } => load_report_debits(config, report, demat_master),
        DebitSource::Table(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open debit table: {}", path.display()))?;
            let debits = read_debits_csv(file)
                .with_context(|| format!("Failed to read debit table: {}", path.display()))?;
            Ok(debits)
        }
    }
}

pub fn load_ledger(config: &ReconConfig, path: &Path) -> Result<Vec<LedgerEntry>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open KB ledger: {}", path.display()))?;
    let entries = read_ledger(file, &config.ledger)
        .with_context(|| format!("Failed to read KB ledger: {}", path.display()))?;
    Ok(entries)
}

pub fn load_securities(path: &Path) -> Result<SecurityMaster> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open bond sheet: {}", path.display()))?;
    let securities = SecurityMaster::from_csv(file)
        .with_context(|| format!("Failed to read bond sheet: {}", path.display()))?;
    Ok(securities)
}

fn describe_bound(bound: Option<NaiveDate>) -> String {
    bound.map_or_else(|| "(open)".to_string(), |d| d.to_string())
}

pub fn cmd_reconcile(
    config: &ReconConfig,
    source: &DebitSource,
    ledger: &Path,
    bonds: &Path,
    filter: DateFilter,
    output_dir: &Path,
    options: &ExportOptions,
) -> Result<()> {
    let debits = load_debits(config, source)?;
    let entries = load_ledger(config, ledger)?;
    let securities = load_securities(bonds)?;

    println!(
        "🔍 Reconciling {} debits against {} KB entries (name threshold {})...",
        debits.len(),
        entries.len(),
        config.name_threshold
    );
    if !filter.is_unbounded() {
        println!(
            "   KB date filter: {} to {}",
            describe_bound(filter.from),
            describe_bound(filter.to)
        );
    }

    let report = Reconciler::with_config(&securities, config.clone())
        .date_filter(filter)
        .run(&debits, &entries);
    let summary = report.summary();

    println!();
    println!("✅ Reconciliation complete!");
    println!("   Debits:     {}", summary.total);
    println!("   OK:         {}", summary.ok);
    println!("   Exceptions: {}", summary.exceptions);
    println!("   KB-only:    {}", summary.kb_unmatched);
    if !summary.by_verdict.is_empty() {
        println!();
        println!("   By verdict:");
        for (verdict, count) in &summary.by_verdict {
            println!("     {:<24} {}", verdict, count);
        }
    }

    let written = write_report(output_dir, &report, &debits, options)
        .with_context(|| format!("Failed to write output to {}", output_dir.display()))?;

    println!();
    println!("📁 Wrote {} file(s):", written.len());
    for path in &written {
        println!("   {}", path.display());
    }

    Ok(())
}

pub fn cmd_ledger_dates(config: &ReconConfig, ledger: &Path) -> Result<()> {
    let entries = load_ledger(config, ledger)?;
    let undated = entries.iter().filter(|e| e.entry_date.is_none()).count();

    match ledger_date_range(&entries) {
        Some((first, last)) => {
            println!("📅 KB ledger covers {} to {}", first, last);
            println!("   Entries: {} ({} without a date)", entries.len(), undated);
        }
        None => {
            println!("No dated entries in {}", ledger.display());
        }
    }

    Ok(())
}
