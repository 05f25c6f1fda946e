//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Bondmatch - Reconcile bond transfers against the registrar ledger
#[derive(Parser)]
#[command(name = "bondmatch")]
#[command(about = "Reconcile depository bond transfers against the KB ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data-dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the debit table from a depository report
    Debits {
        /// Depository transaction report (CSV export)
        #[arg(short, long)]
        report: PathBuf,

        /// Demat master: Name, CDSL_16, NSDL_IN
        #[arg(short = 'm', long)]
        demat_master: PathBuf,

        /// Output CSV file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reconcile debits against the KB ledger
    Reconcile {
        /// Depository transaction report (CSV export)
        #[arg(short, long, requires = "demat_master", conflicts_with = "debits")]
        report: Option<PathBuf>,

        /// Demat master: Name, CDSL_16, NSDL_IN
        #[arg(short = 'm', long)]
        demat_master: Option<PathBuf>,

        /// Previously written debit table, instead of --report
        #[arg(short, long, required_unless_present = "report")]
        debits: Option<PathBuf>,

        /// KB HUF sheet (CSV export)
        #[arg(short, long)]
        ledger: PathBuf,

        /// Bond Info sheet (CSV export): bond name, ISIN
        #[arg(short, long)]
        bonds: PathBuf,

        /// Minimum client-name similarity, 0-100 (overrides config)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
        threshold: Option<u8>,

        /// Earliest KB date to consider (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest KB date to consider (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Directory for the output tables
        #[arg(short, long, default_value = "reconciliation")]
        output_dir: PathBuf,

        /// Output format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Leave the debit table out of the output
        #[arg(long)]
        no_debits_sheet: bool,

        /// Write KB_Unmatched.csv even when it is empty
        #[arg(long)]
        keep_empty: bool,
    },

    /// Show the date range covered by the KB ledger
    LedgerDates {
        /// KB HUF sheet (CSV export)
        #[arg(short, long)]
        ledger: PathBuf,
    },

    /// Show the active configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the resolved configuration as TOML
    Show,
    /// Print the override file location
    Path,
}
