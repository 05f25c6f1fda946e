//! Depository "Transaction cum Holding" report reader
//!
//! The report is a free-form text export with a single delimited transaction
//! table embedded in it. The table starts at the line whose header begins
//! with `"POSTED DATE"` and runs until the first blank line. Only debit rows
//! are kept; each one is turned into a [`DebitEvent`] by extracting the demat
//! identifier from its narration and resolving it against the demat master.

use std::collections::HashMap;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::config::ReportLayout;
use crate::demat::extract_demat;
use crate::error::{Error, Result};
use crate::masters::ClientMaster;
use crate::models::{cmp_nulls_last, DebitEvent, DematKind, MatchQuality};
use crate::parse::{decode_record, normalize_cell, parse_date, parse_quantity, upper_cell};

/// Header names in the depository report
const COL_POSTED_DATE: &str = "POSTED DATE";
const COL_ISIN: &str = "ISIN";
const COL_DESCRIPTION: &str = "TRANSACTION DESCRIPTION";
const COL_UNITS: &str = "TRANSACTION UNITS";
const COL_DC_FLAG: &str = "TRANSACTION DEBIT/CREDIT FLAG (D/C)";

/// One transaction row as found in the report, before any typing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTransaction {
    pub posted_date: String,
    pub isin: String,
    pub demat_raw: String,
    pub units: String,
    pub dc_flag: String,
}

/// Cut the transaction table out of a report
///
/// Fails when the header line is missing, when the block has no data rows,
/// or when any required column is absent.
pub fn read_transaction_block(bytes: &[u8], layout: &ReportLayout) -> Result<Vec<RawTransaction>> {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().collect();

    let header_idx = lines
        .iter()
        .position(|line| line.trim().starts_with(layout.header_prefix.as_str()))
        .ok_or_else(|| Error::MissingHeader(layout.header_prefix.clone()))?;

    let block: Vec<&str> = lines[header_idx..]
        .iter()
        .take_while(|line| !line.trim().is_empty())
        .copied()
        .collect();

    if block.len() < 2 {
        return Err(Error::EmptyTable);
    }

    let table = block.join("\n");
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(table.as_bytes());

    let headers = rdr.headers()?.clone();
    let columns = column_positions(&headers);

    let needed = [
        COL_POSTED_DATE,
        COL_ISIN,
        COL_DESCRIPTION,
        COL_UNITS,
        COL_DC_FLAG,
    ];
    let missing: Vec<String> = needed
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing));
    }

    let cell = |record: &StringRecord, name: &str| -> String {
        columns
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
            .to_string()
    };

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(RawTransaction {
            posted_date: cell(&record, COL_POSTED_DATE),
            isin: cell(&record, COL_ISIN),
            demat_raw: cell(&record, COL_DESCRIPTION),
            units: cell(&record, COL_UNITS),
            dc_flag: cell(&record, COL_DC_FLAG),
        });
    }

    debug!(
        "Read {} transaction rows starting at line {}",
        rows.len(),
        header_idx + 1
    );
    Ok(rows)
}

/// Keep debit rows and turn them into debit events
///
/// The result is ordered by posted date then ISIN, missing dates last.
pub fn normalize_debits(
    rows: Vec<RawTransaction>,
    master: &ClientMaster,
    layout: &ReportLayout,
) -> Vec<DebitEvent> {
    let total = rows.len();
    let mut debits: Vec<DebitEvent> = rows
        .into_iter()
        .filter(|row| upper_cell(&row.dc_flag) == layout.debit_flag)
        .map(|row| to_debit_event(row, master))
        .collect();

    let unparsed_dates = debits.iter().filter(|d| d.posted_date.is_none()).count();
    let unparsed_units = debits.iter().filter(|d| d.quantity.is_none()).count();
    debug!(
        "Kept {} debit rows, dropped {} non-debit rows ({} without date, {} without units)",
        debits.len(),
        total - debits.len(),
        unparsed_dates,
        unparsed_units
    );

    debits.sort_by(|a, b| {
        cmp_nulls_last(&a.posted_date, &b.posted_date)
            .then_with(|| a.security_id.cmp(&b.security_id))
    });
    debits
}

fn to_debit_event(row: RawTransaction, master: &ClientMaster) -> DebitEvent {
    let demat = extract_demat(&row.demat_raw);
    let (match_type, extracted_demat) = match demat {
        Some(id) => (Some(id.kind), Some(id.value)),
        None => (None, None),
    };
    let (client_name, match_quality) =
        master.resolve(match_type.as_ref(), extracted_demat.as_deref());

    DebitEvent {
        posted_date: parse_date(&row.posted_date),
        security_id: upper_cell(&row.isin),
        quantity: parse_quantity(&row.units),
        client_name,
        match_type,
        extracted_demat,
        match_quality,
        demat_raw: row.demat_raw,
    }
}

/// Read a depository report and produce the debit event table
pub fn parse_report(
    bytes: &[u8],
    master: &ClientMaster,
    layout: &ReportLayout,
) -> Result<Vec<DebitEvent>> {
    let rows = read_transaction_block(bytes, layout)?;
    let debits = normalize_debits(rows, master, layout);

    let resolved = debits
        .iter()
        .filter(|d| d.match_quality == MatchQuality::Ok)
        .count();
    info!(
        "Parsed {} debit transactions ({} resolved to a client)",
        debits.len(),
        resolved
    );
    Ok(debits)
}

/// Resolve a debit event again against a (possibly different) demat master
pub fn resolve_debit(event: &DebitEvent, master: &ClientMaster) -> DebitEvent {
    let (client_name, match_quality) =
        master.resolve(event.match_type.as_ref(), event.extracted_demat.as_deref());
    DebitEvent {
        client_name,
        match_quality,
        ..event.clone()
    }
}

/// Read back a debit table previously written by [`crate::export::write_debits_csv`]
pub fn read_debits_csv<R: Read>(reader: R) -> Result<Vec<DebitEvent>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = decode_record(rdr.byte_headers()?);
    let columns = column_positions(&headers);

    let needed = ["POSTEDDATE", "ISIN", "UNITS_NUM", "CLIENTNAME"];
    let missing: Vec<String> = needed
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing));
    }

    let cell = |record: &StringRecord, name: &str| -> String {
        columns
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
            .to_string()
    };

    let mut debits = Vec::new();
    for result in rdr.byte_records() {
        let record = decode_record(&result?);
        let client_name = normalize_cell(&cell(&record, "CLIENTNAME"));
        let match_type = DematKind::from_label(&cell(&record, "MATCHTYPE"));
        let extracted_demat = Some(normalize_cell(&cell(&record, "EXTRACTEDDEMAT")))
            .filter(|v| !v.is_empty());
        let match_quality = cell(&record, "MATCHQUALITY")
            .parse()
            .unwrap_or_else(|_| infer_quality(match_type.as_ref(), &client_name));

        debits.push(DebitEvent {
            posted_date: parse_date(&cell(&record, "POSTEDDATE")),
            security_id: upper_cell(&cell(&record, "ISIN")),
            quantity: parse_quantity(&cell(&record, "UNITS_NUM")),
            client_name,
            match_type,
            extracted_demat,
            match_quality,
            demat_raw: cell(&record, "DEMATRAW"),
        });
    }

    debug!("Read {} debit rows from table", debits.len());
    Ok(debits)
}

/// Quality for a stored row whose MatchQuality cell is blank or unreadable
fn infer_quality(kind: Option<&DematKind>, client_name: &str) -> MatchQuality {
    match kind {
        None => MatchQuality::NoDematFound,
        Some(DematKind::Unknown(_)) => MatchQuality::UnknownType,
        Some(_) if !client_name.is_empty() => MatchQuality::Ok,
        Some(DematKind::Nsdl) => MatchQuality::NsdlNotInMaster,
        Some(DematKind::Cdsl) => MatchQuality::CdslNotInMaster,
    }
}

/// Map trimmed, uppercased header names to positions (first occurrence wins)
fn column_positions(headers: &StringRecord) -> HashMap<String, usize> {
    let mut columns = HashMap::new();
    for (i, name) in headers.iter().enumerate() {
        columns.entry(upper_cell(name)).or_insert(i);
    }
    columns
}
