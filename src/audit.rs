//! Advisory data-quality checks over a normalized record set.
//!
//! Warnings never alter the records or the success flag of a result.

use std::{collections::HashSet, fmt};

use itertools::Itertools;

use crate::record::Record;

/// Columns present in fewer than this share of records are reported as sparse.
pub const SPARSE_FILL_RATIO: f64 = 0.5;
/// Retention below this percentage of the original rows is reported.
pub const MIN_RETENTION_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq)]
pub enum QualityWarning {
    NoData,
    SparseColumns(Vec<String>),
    DuplicateRows(usize),
    LowRetention(f64),
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityWarning::NoData => write!(f, "No valid data rows found after normalization"),
            QualityWarning::SparseColumns(columns) => write!(
                f,
                "Sparse columns detected (less than 50% filled): {}",
                columns.join(", ")
            ),
            QualityWarning::DuplicateRows(count) => write!(f, "{count} duplicate rows detected"),
            QualityWarning::LowRetention(percent) => write!(
                f,
                "Low normalization efficiency: {percent:.1}% of original data retained"
            ),
        }
    }
}

pub fn audit(records: &[Record], original_row_count: usize) -> Vec<QualityWarning> {
    if records.is_empty() {
        return vec![QualityWarning::NoData];
    }

    let mut warnings = Vec::new();
    let sparse = sparse_columns(records);
    if !sparse.is_empty() {
        warnings.push(QualityWarning::SparseColumns(sparse));
    }

    let duplicates = duplicate_count(records);
    if duplicates > 0 {
        warnings.push(QualityWarning::DuplicateRows(duplicates));
    }

    if original_row_count > 0 {
        let retention = records.len() as f64 / original_row_count as f64 * 100.0;
        if retention < MIN_RETENTION_PERCENT {
            warnings.push(QualityWarning::LowRetention(retention));
        }
    }
    warnings
}

/// Columns filled in fewer than half of the records, in first-seen order.
pub fn sparse_columns(records: &[Record]) -> Vec<String> {
    let counts = records.iter().flat_map(Record::keys).counts();
    let threshold = records.len() as f64 * SPARSE_FILL_RATIO;
    records
        .iter()
        .flat_map(Record::keys)
        .unique()
        .filter(|column| (counts.get(column).copied().unwrap_or(0) as f64) < threshold)
        .map(str::to_string)
        .collect()
}

/// Total records minus distinct records.
pub fn duplicate_count(records: &[Record]) -> usize {
    let distinct = records
        .iter()
        .map(Record::canonical_key)
        .collect::<HashSet<_>>();
    records.len() - distinct.len()
}
