//! Debit table command and the loaders shared with reconcile

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use bondmatch_core::{
    export::write_debits_csv, parse_report, ClientMaster, DebitEvent, MatchQuality, ReconConfig,
};
use tracing::debug;

/// Load the demat master (Name, CDSL_16, NSDL_IN)
pub fn load_client_master(path: &Path) -> Result<ClientMaster> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open demat master: {}", path.display()))?;
    let master = ClientMaster::from_csv(file)
        .with_context(|| format!("Failed to read demat master: {}", path.display()))?;
    debug!(
        "Demat master {}: {} NSDL ids, {} CDSL ids",
        path.display(),
        master.nsdl_count(),
        master.cdsl_count()
    );
    Ok(master)
}

/// Parse a depository report into debit events
pub fn load_report_debits(
    config: &ReconConfig,
    report: &Path,
    demat_master: &Path,
) -> Result<Vec<DebitEvent>> {
    let master = load_client_master(demat_master)?;
    let bytes = fs::read(report)
        .with_context(|| format!("Failed to open report: {}", report.display()))?;
    let debits = parse_report(&bytes, &master, &config.report)
        .with_context(|| format!("Failed to parse report: {}", report.display()))?;
    Ok(debits)
}

/// Count debit events per resolution outcome
pub fn quality_breakdown(debits: &[DebitEvent]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for debit in debits {
        *counts.entry(debit.match_quality.as_str()).or_insert(0) += 1;
    }
    counts
}

pub fn cmd_debits(
    config: &ReconConfig,
    report: &Path,
    demat_master: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let debits = load_report_debits(config, report, demat_master)?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_debits_csv(file, &debits)?;

            println!("✅ Wrote {} debit transactions to {}", debits.len(), path.display());
            let resolved = debits
                .iter()
                .filter(|d| d.match_quality == MatchQuality::Ok)
                .count();
            println!("   Resolved to a client: {}", resolved);
            for (quality, count) in quality_breakdown(&debits) {
                if quality != MatchQuality::Ok.as_str() {
                    println!("   {}: {}", quality, count);
                }
            }
        }
        None => {
            // Write to stdout
            write_debits_csv(io::stdout().lock(), &debits)?;
        }
    }

    Ok(())
}
