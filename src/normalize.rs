//! Hierarchical normalization of decoded sheets into sparse records.
//!
//! Rows are processed strictly in source order: identifier columns are filled
//! down from the nearest preceding non-empty value, and the fill-down state is
//! an explicit [`FillDown`] accumulator folded over the rows. Each call starts
//! from a fresh accumulator, so repeated calls on the same input agree.
//!
//! The public entry points never return `Err`. Failures become entries in the
//! `errors` of the affected sheet's [`NormalizationResult`].

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::{
    audit,
    error::NormalizeError,
    header::{ColumnMapping, clean_headers, column_mapping, header_text},
    identifier::IdentifierDetector,
    record::Record,
    value::{RawCell, Value, coerce},
    workbook::{DecodedSheet, DecodedWorkbook},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Explicit identifier columns; `None` enables keyword detection.
    pub id_columns: Option<Vec<String>>,
    pub fill_empty_id_columns: bool,
    /// Emit identifier columns first in each record, in identifier order.
    pub preserve_hierarchy: bool,
    pub max_rows: Option<usize>,
    pub max_columns: Option<usize>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            id_columns: None,
            fill_empty_id_columns: true,
            preserve_hierarchy: false,
            max_rows: None,
            max_columns: None,
        }
    }
}

/// Last non-empty value seen per identifier column.
#[derive(Debug, Clone, Default)]
pub struct FillDown {
    enabled: bool,
    last_seen: HashMap<String, Value>,
}

impl FillDown {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_seen: HashMap::new(),
        }
    }

    /// Resolve an identifier cell: non-empty values are remembered and kept,
    /// empty ones are replaced by the remembered value when filling is enabled.
    pub fn resolve(&mut self, column: &str, value: Option<Value>) -> Option<Value> {
        match value {
            Some(value) if !value.is_empty() => {
                self.last_seen.insert(column.to_string(), value.clone());
                Some(value)
            }
            _ if self.enabled => self.last_seen.get(column).cloned(),
            other => other,
        }
    }

    pub fn last_seen(&self, column: &str) -> Option<&Value> {
        self.last_seen.get(column)
    }
}

/// Turn coerced rows into records. Rows without any non-empty field are
/// dropped.
pub fn normalize_rows(
    rows: &[Vec<RawCell>],
    headers: &[String],
    id_columns: &[String],
    config: &NormalizeConfig,
) -> Result<Vec<Record>, NormalizeError> {
    if let Some(limit) = config.max_columns
        && headers.len() > limit
    {
        return Err(NormalizeError::TooManyColumns {
            actual: headers.len(),
            limit,
        });
    }
    if let Some(limit) = config.max_rows
        && rows.len() > limit
    {
        return Err(NormalizeError::TooManyRows {
            actual: rows.len(),
            limit,
        });
    }

    let identifiers = id_columns.iter().map(String::as_str).collect::<HashSet<_>>();
    let hierarchy_rank = |key: &str| {
        id_columns
            .iter()
            .position(|column| column == key)
            .unwrap_or(id_columns.len())
    };

    let (_, records) = rows.iter().fold(
        (FillDown::new(config.fill_empty_id_columns), Vec::new()),
        |(mut state, mut records), row| {
            let mut record = normalize_row(&mut state, row, headers, &identifiers);
            if !record.is_empty() {
                if config.preserve_hierarchy {
                    record.sort_keys_by_rank(&hierarchy_rank);
                }
                records.push(record);
            }
            (state, records)
        },
    );
    Ok(records)
}

fn normalize_row(
    state: &mut FillDown,
    row: &[RawCell],
    headers: &[String],
    identifiers: &HashSet<&str>,
) -> Record {
    let mut record = Record::new();
    for (index, column) in headers.iter().enumerate() {
        let mut value = row.get(index).and_then(coerce);
        if identifiers.contains(column.as_str()) {
            value = state.resolve(column, value);
        }
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            record.insert(column.clone(), value);
        }
    }
    record
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationResult {
    success: bool,
    data: Vec<Record>,
    original_row_count: usize,
    normalized_row_count: usize,
    column_mapping: ColumnMapping,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl NormalizationResult {
    fn failed(
        original_row_count: usize,
        column_mapping: ColumnMapping,
        warnings: Vec<String>,
        error: String,
    ) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            original_row_count,
            normalized_row_count: 0,
            column_mapping,
            warnings,
            errors: vec![error],
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> &[Record] {
        &self.data
    }

    pub fn into_data(self) -> Vec<Record> {
        self.data
    }

    pub fn original_row_count(&self) -> usize {
        self.original_row_count
    }

    pub fn normalized_row_count(&self) -> usize {
        self.normalized_row_count
    }

    pub fn column_mapping(&self) -> &ColumnMapping {
        &self.column_mapping
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Retained rows as a percentage of the original rows; 0 when there were none.
    pub fn efficiency(&self) -> f64 {
        if self.original_row_count == 0 {
            0.0
        } else {
            self.normalized_row_count as f64 / self.original_row_count as f64 * 100.0
        }
    }
}

/// Normalization settings plus the identifier heuristic they fall back to.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizeConfig,
    detector: IdentifierDetector,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self {
            config,
            detector: IdentifierDetector::default(),
        }
    }

    pub fn with_detector(mut self, detector: IdentifierDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    pub fn normalize(&self, rows: &[Vec<RawCell>], headers: &[Option<String>]) -> NormalizationResult {
        let cleaned = clean_headers(headers);
        let mapping = column_mapping(headers, &cleaned);
        let id_columns = self
            .config
            .id_columns
            .clone()
            .unwrap_or_else(|| self.detector.detect(&cleaned));
        debug!("Identifier columns: {id_columns:?}");

        let mut warnings = Vec::new();
        if !id_columns.is_empty() {
            warnings.push(format!("Identified ID columns: {}", id_columns.join(", ")));
        }

        let data = match normalize_rows(rows, &cleaned, &id_columns, &self.config) {
            Ok(data) => data,
            Err(err) => {
                return NormalizationResult::failed(
                    rows.len(),
                    mapping,
                    warnings,
                    format!("Normalization failed: {err}"),
                );
            }
        };

        warnings.extend(
            audit::audit(&data, rows.len())
                .iter()
                .map(ToString::to_string),
        );

        NormalizationResult {
            success: true,
            original_row_count: rows.len(),
            normalized_row_count: data.len(),
            data,
            column_mapping: mapping,
            warnings,
            errors: Vec::new(),
        }
    }

    pub fn normalize_sheet(&self, sheet: &DecodedSheet) -> NormalizationResult {
        match &sheet.grid {
            Ok(grid) => {
                let headers = grid.headers.iter().map(header_text).collect::<Vec<_>>();
                let result = self.normalize(&grid.rows, &headers);
                debug!(
                    "Sheet '{}': {} of {} row(s) retained",
                    sheet.name, result.normalized_row_count, result.original_row_count
                );
                result
            }
            Err(err) => {
                warn!("Skipping sheet '{}': {err}", sheet.name);
                NormalizationResult::failed(
                    0,
                    ColumnMapping::new(),
                    Vec::new(),
                    format!("Failed to process sheet: {err}"),
                )
            }
        }
    }

    pub fn normalize_workbook(&self, workbook: &DecodedWorkbook) -> WorkbookResults {
        let sheets = workbook
            .sheets
            .iter()
            .map(|sheet| (sheet.name.clone(), self.normalize_sheet(sheet)))
            .collect();
        WorkbookResults { sheets }
    }
}

/// Single-sheet normalization with keyword-based identifier detection.
pub fn normalize_data(
    rows: &[Vec<RawCell>],
    headers: &[Option<String>],
    config: &NormalizeConfig,
) -> NormalizationResult {
    Normalizer::new(config.clone()).normalize(rows, headers)
}

pub fn normalize_workbook(workbook: &DecodedWorkbook, config: &NormalizeConfig) -> WorkbookResults {
    Normalizer::new(config.clone()).normalize_workbook(workbook)
}

/// Per-sheet results in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookResults {
    sheets: Vec<(String, NormalizationResult)>,
}

impl WorkbookResults {
    pub fn get(&self, sheet: &str) -> Option<&NormalizationResult> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizationResult)> {
        self.sheets
            .iter()
            .map(|(name, result)| (name.as_str(), result))
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.sheets.retain(|(name, _)| keep(name));
    }

    /// Serializes as a map from sheet name to that sheet's records only.
    pub fn data_view(&self) -> WorkbookData<'_> {
        WorkbookData(self)
    }

    pub fn statistics(&self) -> WorkbookStatistics {
        let mut stats = WorkbookStatistics {
            total_sheets: self.sheets.len(),
            ..WorkbookStatistics::default()
        };
        for (_, result) in &self.sheets {
            if result.success {
                stats.successful_sheets += 1;
            }
            stats.total_original_rows += result.original_row_count;
            stats.total_normalized_rows += result.normalized_row_count;
            stats.total_warnings += result.warnings.len();
            stats.total_errors += result.errors.len();
        }
        if stats.total_original_rows > 0 {
            stats.overall_efficiency =
                stats.total_normalized_rows as f64 / stats.total_original_rows as f64 * 100.0;
        }
        stats
    }
}

impl Serialize for WorkbookResults {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for (name, result) in &self.sheets {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

pub struct WorkbookData<'a>(&'a WorkbookResults);

impl Serialize for WorkbookData<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, result) in self.0.iter() {
            map.serialize_entry(name, result.data())?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookStatistics {
    pub total_sheets: usize,
    pub successful_sheets: usize,
    pub total_original_rows: usize,
    pub total_normalized_rows: usize,
    pub overall_efficiency: f64,
    pub total_warnings: usize,
    pub total_errors: usize,
}
