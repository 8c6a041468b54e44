use thiserror::Error;

/// Failures at the decode boundary. A whole-file failure aborts decoding; a
/// per-sheet failure is carried by that sheet only.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unable to open workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("unable to read sheet '{sheet}': {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },
    #[error("unable to read CSV input: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to decode text as {encoding}")]
    Encoding { encoding: &'static str },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("unable to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("unable to write JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("sheet has {actual} data rows, exceeding the limit of {limit}")]
    TooManyRows { actual: usize, limit: usize },
    #[error("sheet has {actual} columns, exceeding the limit of {limit}")]
    TooManyColumns { actual: usize, limit: usize },
}
