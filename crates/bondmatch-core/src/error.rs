//! Error types for bondmatch

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not find the transaction table header starting with `{0}`")]
    MissingHeader(String),

    #[error("Transaction table header found, but no transaction rows detected under it")]
    EmptyTable,

    #[error("Missing expected columns in the transaction table: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("{source_name} has {found} columns; expected at least {expected}")]
    TooFewColumns {
        source_name: String,
        expected: usize,
        found: usize,
    },

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
