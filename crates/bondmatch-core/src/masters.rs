//! Reference masters: security names and demat → client identity
//!
//! Both masters are read-only lookup tables built once per run. When a key
//! appears more than once the first occurrence wins; later rows are ignored.

use std::collections::HashMap;
use std::io::Read;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{DematKind, MatchQuality};
use crate::parse::{
    compact_upper, decode_record, digits_only, last_16_digits, normalize_cell, upper_cell,
};

/// ISIN → bond name
#[derive(Debug, Clone, Default)]
pub struct SecurityMaster {
    names: HashMap<String, String>,
}

impl SecurityMaster {
    /// Build from `(security_id, name)` pairs in input order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut names = HashMap::new();
        for (id, name) in pairs {
            let id = upper_cell(id.as_ref());
            if id.is_empty() {
                continue;
            }
            names
                .entry(id)
                .or_insert_with(|| normalize_cell(name.as_ref()));
        }
        Self { names }
    }

    /// Parse the bond sheet: column A is the bond name, column B the ISIN
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = decode_record(rdr.byte_headers()?);
        if headers.len() < 2 {
            return Err(Error::TooFewColumns {
                source_name: "Bond Info sheet".to_string(),
                expected: 2,
                found: headers.len(),
            });
        }

        let mut pairs = Vec::new();
        for result in rdr.byte_records() {
            let record = decode_record(&result?);
            let name = record.get(0).unwrap_or("").to_string();
            let id = record.get(1).unwrap_or("").to_string();
            pairs.push((id, name));
        }

        let master = Self::from_pairs(pairs);
        debug!("Loaded {} bond names", master.len());
        Ok(master)
    }

    /// Bond name for an ISIN, empty if unknown
    pub fn name_of(&self, security_id: &str) -> &str {
        self.names
            .get(security_id)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Demat identifier → client name, split by depository
#[derive(Debug, Clone, Default)]
pub struct ClientMaster {
    nsdl: HashMap<String, String>,
    cdsl: HashMap<String, String>,
}

/// One row of the demat master before key normalization
#[derive(Debug, Clone, Default)]
pub struct ClientMasterRow {
    pub name: String,
    pub cdsl: String,
    pub nsdl: String,
}

impl ClientMaster {
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = ClientMasterRow>,
    {
        let mut master = Self::default();
        for row in rows {
            let name = normalize_cell(&row.name);
            if let Some(key) = last_16_digits(&row.cdsl) {
                master.cdsl.entry(key).or_insert_with(|| name.clone());
            }
            let nsdl_key = compact_upper(&row.nsdl);
            if !nsdl_key.is_empty() {
                master.nsdl.entry(nsdl_key).or_insert(name);
            }
        }
        master
    }

    /// Parse the demat master: columns A, B, C are Name, CDSL_16, NSDL_IN
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = decode_record(rdr.byte_headers()?);
        if headers.len() < 3 {
            return Err(Error::TooFewColumns {
                source_name: "Demat master".to_string(),
                expected: 3,
                found: headers.len(),
            });
        }

        let mut rows = Vec::new();
        for result in rdr.byte_records() {
            let record = decode_record(&result?);
            rows.push(ClientMasterRow {
                name: record.get(0).unwrap_or("").to_string(),
                cdsl: record.get(1).unwrap_or("").to_string(),
                nsdl: record.get(2).unwrap_or("").to_string(),
            });
        }

        let row_count = rows.len();
        let master = Self::from_rows(rows);
        debug!("Read {} demat master rows", row_count);
        Ok(master)
    }

    /// Resolve an extracted identifier to `(client_name, quality)`
    ///
    /// `kind` is `None` when no identifier was extracted.
    pub fn resolve(&self, kind: Option<&DematKind>, value: Option<&str>) -> (String, MatchQuality) {
        let (kind, value) = match (kind, value.filter(|v| !v.trim().is_empty())) {
            (Some(kind), Some(value)) => (kind, value),
            _ => return (String::new(), MatchQuality::NoDematFound),
        };

        match kind {
            DematKind::Nsdl => match self.nsdl.get(&compact_upper(value)) {
                Some(name) if !name.is_empty() => (name.clone(), MatchQuality::Ok),
                _ => (String::new(), MatchQuality::NsdlNotInMaster),
            },
            DematKind::Cdsl => {
                let digits = digits_only(value);
                let key = last_16_digits(&digits).unwrap_or(digits);
                match self.cdsl.get(&key) {
                    Some(name) if !name.is_empty() => (name.clone(), MatchQuality::Ok),
                    _ => (String::new(), MatchQuality::CdslNotInMaster),
                }
            }
            DematKind::Unknown(_) => (String::new(), MatchQuality::UnknownType),
        }
    }

    pub fn nsdl_count(&self) -> usize {
        self.nsdl.len()
    }

    pub fn cdsl_count(&self) -> usize {
        self.cdsl.len()
    }
}
