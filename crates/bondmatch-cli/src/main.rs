//! Bondmatch CLI - Bond transfer reconciliation
//!
//! Usage:
//!   bondmatch debits --report R.csv --demat-master M.csv     Build the debit table
//!   bondmatch reconcile --debits D.csv --ledger L.csv --bonds B.csv
//!   bondmatch ledger-dates --ledger L.csv                    Show KB date range
//!   bondmatch config show                                    Show active config

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Debits {
            report,
            demat_master,
            output,
        } => {
            let config = commands::load_config(config_path, None)?;
            commands::cmd_debits(&config, &report, &demat_master, output.as_deref())
        }
        Commands::Reconcile {
            report,
            demat_master,
            debits,
            ledger,
            bonds,
            threshold,
            from,
            to,
            output_dir,
            format,
            no_debits_sheet,
            keep_empty,
        } => {
            let config = commands::load_config(config_path, threshold)?;
            let source = match (report, demat_master, debits) {
                (Some(report), Some(demat_master), _) => commands::DebitSource::Report {
                    report,
                    demat_master,
                },
                (_, _, Some(table)) => commands::DebitSource::Table(table),
                _ => anyhow::bail!("Provide --report with --demat-master, or --debits"),
            };
            let filter = commands::parse_date_window(from.as_deref(), to.as_deref())?;
            let options = commands::export_options(&format, !no_debits_sheet, keep_empty)?;
            commands::cmd_reconcile(
                &config,
                &source,
                &ledger,
                &bonds,
                filter,
                &output_dir,
                &options,
            )
        }
        Commands::LedgerDates { ledger } => {
            let config = commands::load_config(config_path, None)?;
            commands::cmd_ledger_dates(&config, &ledger)
        }
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => commands::cmd_config_show(config_path),
            Some(ConfigAction::Path) => commands::cmd_config_path(),
        },
    }
}
