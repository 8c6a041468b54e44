//! Decode and encode boundaries.
//!
//! Workbooks (xlsx, xlsm, xlsb, xls, ods) are read through `calamine` into a
//! [`DecodedWorkbook`] of aligned [`RawCell`] grids; delimited text is read
//! through `csv` after decoding with `encoding_rs`. Normalized records leave
//! as xlsx (`rust_xlsxwriter`), JSON or CSV.

use std::{
    io::{Cursor, Write},
    path::Path,
};

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use rust_xlsxwriter::{Color, Format, Workbook, XlsxError};

use crate::{
    error::{DecodeError, EncodeError},
    io_utils::{
        DEFAULT_CSV_DELIMITER, DEFAULT_TSV_DELIMITER, decode_text, is_dash, is_delimited_path,
        open_csv_reader, open_csv_writer, read_input, resolve_input_delimiter,
    },
    record::{Record, union_headers},
    value::{self, RawCell, Value, coerce},
};

const HEADER_FILL: Color = Color::RGB(0x00FF_FF);
const MAX_SHEET_NAME_LEN: usize = 31;
const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Header row plus data rows, each padded or cut to the header width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub headers: Vec<RawCell>,
    pub rows: Vec<Vec<RawCell>>,
}

impl SheetGrid {
    /// The first row becomes the header row. Blank data rows are skipped.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<RawCell>>,
    {
        let mut rows = rows.into_iter();
        let headers = rows.next().unwrap_or_default();
        let width = headers.len();
        let rows = rows
            .map(|mut row| {
                row.resize(width, RawCell::Empty);
                row
            })
            .filter(|row| !is_blank_row(row))
            .collect();
        Self { headers, rows }
    }
}

fn is_blank_row(row: &[RawCell]) -> bool {
    row.iter().all(|cell| value::is_empty(coerce(cell).as_ref()))
}

#[derive(Debug)]
pub struct DecodedSheet {
    pub name: String,
    pub grid: Result<SheetGrid, DecodeError>,
}

#[derive(Debug, Default)]
pub struct DecodedWorkbook {
    pub sheets: Vec<DecodedSheet>,
}

impl DecodedWorkbook {
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }

    pub fn sheet(&self, name: &str) -> Option<&DecodedSheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Keep only the named sheets; an empty selection keeps everything.
    pub fn select<S: AsRef<str>>(&mut self, names: &[S]) {
        if !names.is_empty() {
            self.sheets
                .retain(|sheet| names.iter().any(|name| name.as_ref() == sheet.name));
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Delimiter for delimited text; inferred from the extension when unset.
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

pub fn decode_path(path: &Path, options: &DecodeOptions) -> Result<DecodedWorkbook, DecodeError> {
    let bytes = read_input(path)?;
    if is_delimited_path(path) {
        let name = if is_dash(path) {
            DEFAULT_SHEET_NAME.to_string()
        } else {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string())
        };
        let delimiter = resolve_input_delimiter(path, options.delimiter);
        decode_delimited(&name, &bytes, delimiter, options.encoding)
    } else {
        decode_workbook_bytes(bytes)
    }
}

/// Decode a workbook container. Failing to open the container is an error;
/// a sheet that cannot be read carries its own error.
pub fn decode_workbook_bytes(bytes: Vec<u8>) -> Result<DecodedWorkbook, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let grid = match workbook.worksheet_range(&name) {
            Ok(range) => {
                let formulas = workbook.worksheet_formula(&name).ok();
                Ok(grid_from_range(&range, formulas.as_ref()))
            }
            Err(source) => Err(DecodeError::Sheet {
                sheet: name.clone(),
                source,
            }),
        };
        if let Ok(grid) = &grid {
            debug!("Decoded sheet '{name}' with {} data row(s)", grid.rows.len());
        }
        sheets.push(DecodedSheet { name, grid });
    }
    Ok(DecodedWorkbook { sheets })
}

/// Cells are addressed absolutely, so a used range that does not start at A1
/// still yields row 1 as the header row.
fn grid_from_range(range: &Range<Data>, formulas: Option<&Range<String>>) -> SheetGrid {
    if range.is_empty() {
        return SheetGrid::default();
    }
    let (last_row, last_col) = range.end().unwrap_or_default();
    let rows = (0..=last_row).map(|row| {
        (0..=last_col)
            .map(|col| {
                let cell = range.get_value((row, col)).map_or(RawCell::Empty, raw_cell);
                let formula = formulas
                    .and_then(|formulas| formulas.get_value((row, col)))
                    .filter(|formula| !formula.is_empty());
                match formula {
                    Some(formula) => RawCell::Formula {
                        formula: formula.clone(),
                        result: (cell != RawCell::Empty).then(|| Box::new(cell)),
                    },
                    None => cell,
                }
            })
            .collect::<Vec<_>>()
    });
    SheetGrid::from_rows(rows)
}

fn raw_cell(data: &Data) -> RawCell {
    match data {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::Error(err) => RawCell::Text(err.to_string()),
        Data::DateTime(dt) => dt.as_datetime().map_or(RawCell::InvalidDate, RawCell::Date),
        Data::DateTimeIso(s) => parse_iso_datetime(s).map_or_else(|| RawCell::Text(s.clone()), RawCell::Date),
        Data::DurationIso(s) => RawCell::Unclassified(s.clone()),
    }
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Decode delimited text as a single-sheet workbook. Empty fields become
/// [`RawCell::Empty`].
pub fn decode_delimited(
    name: &str,
    bytes: &[u8],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<DecodedWorkbook, DecodeError> {
    let text = decode_text(bytes, encoding)?;
    let mut reader = open_csv_reader(text.as_bytes(), delimiter);
    let rows = reader
        .records()
        .map(|record| {
            record.map(|record| {
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            RawCell::Empty
                        } else {
                            RawCell::from(field)
                        }
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Result<Vec<_>, csv::Error>>()?;
    let grid = SheetGrid::from_rows(rows);
    debug!("Decoded '{name}' with {} data row(s)", grid.rows.len());
    Ok(DecodedWorkbook {
        sheets: vec![DecodedSheet {
            name: name.to_string(),
            grid: Ok(grid),
        }],
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Json,
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(Self::Xlsx),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            _ => None,
        }
    }
}

/// Write `records` in `format`. The header is the union of record keys in
/// first-seen order; `encoding` applies to CSV/TSV only.
pub fn export_records<W: Write>(
    mut writer: W,
    format: ExportFormat,
    sheet_name: &str,
    records: &[Record],
    encoding: &'static Encoding,
) -> Result<(), EncodeError> {
    let headers = union_headers(records);
    match format {
        ExportFormat::Xlsx => {
            let bytes = encode_xlsx(sheet_name, &headers, records)?;
            writer.write_all(&bytes)?;
            writer.flush()?;
            Ok(())
        }
        ExportFormat::Json => write_json(writer, records),
        ExportFormat::Csv => write_delimited(writer, &headers, records, DEFAULT_CSV_DELIMITER, encoding),
        ExportFormat::Tsv => write_delimited(writer, &headers, records, DEFAULT_TSV_DELIMITER, encoding),
    }
}

/// One bold, cyan-filled header row followed by one row per record. Missing
/// keys leave the cell empty.
pub fn encode_xlsx(
    sheet_name: &str,
    headers: &[String],
    records: &[Record],
) -> Result<Vec<u8>, EncodeError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(worksheet_name(sheet_name))?;

    let header_format = Format::new().set_bold().set_background_color(HEADER_FILL);
    for (index, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, column_number(index)?, header, &header_format)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col_index, header) in headers.iter().enumerate() {
            let col = column_number(col_index)?;
            match record.get(header) {
                Some(Value::String(s)) => sheet.write_string(row, col, s)?,
                Some(Value::Number(n)) => sheet.write_number(row, col, *n)?,
                Some(Value::Boolean(b)) => sheet.write_boolean(row, col, *b)?,
                Some(other @ Value::DateTime(_)) => sheet.write_string(row, col, other.as_display())?,
                None => continue,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn column_number(index: usize) -> Result<u16, XlsxError> {
    u16::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Worksheet names are limited to 31 characters and may not contain
/// `[ ] : * ? / \`.
fn worksheet_name(name: &str) -> String {
    let cleaned = name
        .chars()
        .map(|ch| match ch {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect::<String>();
    let cleaned = cleaned.trim_matches('\'');
    if cleaned.is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn write_json<W: Write>(mut writer: W, records: &[Record]) -> Result<(), EncodeError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_delimited<W: Write>(
    writer: W,
    headers: &[String],
    records: &[Record],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<(), EncodeError> {
    let mut writer = open_csv_writer(writer, delimiter, encoding);
    writer.write_record(headers)?;
    for record in records {
        writer.write_record(headers.iter().map(|header| {
            record
                .get(header)
                .map(Value::as_display)
                .unwrap_or_default()
        }))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::SHIFT_JIS;

    fn text_cells(grid: &SheetGrid) -> Vec<Vec<String>> {
        grid.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| coerce(cell).map(|value| value.as_display()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn delimited_rows_are_aligned_to_the_header_and_blank_rows_skipped() {
        let input = "ID,Name\n1,Alice,extra\n,,\n2\nN/A,null\n3,Carol\n";
        let workbook = decode_delimited("people", input.as_bytes(), b',', UTF_8).unwrap();
        assert_eq!(workbook.sheet_names().collect::<Vec<_>>(), vec!["people"]);
        let grid = workbook.sheets[0].grid.as_ref().unwrap();
        assert_eq!(grid.headers, vec![RawCell::from("ID"), RawCell::from("Name")]);
        assert_eq!(
            text_cells(grid),
            vec![vec!["1", "Alice"], vec!["2", ""], vec!["3", "Carol"]]
        );
    }

    #[test]
    fn delimited_input_honours_the_encoding() {
        let (bytes, _, _) = SHIFT_JIS.encode("地域,名前\n関東,東京\n");
        let workbook = decode_delimited("jp", &bytes, b',', SHIFT_JIS).unwrap();
        let grid = workbook.sheets[0].grid.as_ref().unwrap();
        assert_eq!(grid.headers[0], RawCell::from("地域"));
        assert_eq!(grid.rows[0][1], RawCell::from("東京"));
    }

    #[test]
    fn invalid_bytes_for_the_encoding_fail() {
        let err = decode_delimited("bad", &[b'a', b',', 0xff, b'b'], b',', UTF_8).unwrap_err();
        assert!(matches!(err, DecodeError::Encoding { .. }));
    }

    #[test]
    fn malformed_workbook_bytes_fail_to_open() {
        let err = decode_workbook_bytes(b"definitely not a workbook".to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::Workbook(_)));
    }

    #[test]
    fn calamine_cells_map_onto_raw_cells() {
        assert_eq!(raw_cell(&Data::Int(7)), RawCell::Number(7.0));
        assert_eq!(
            raw_cell(&Data::Error(calamine::CellErrorType::NA)),
            RawCell::from("#N/A")
        );
        assert_eq!(
            raw_cell(&Data::DurationIso("PT1H".into())),
            RawCell::Unclassified("PT1H".into())
        );
        assert_eq!(
            raw_cell(&Data::DateTimeIso("2024-03-01".into())),
            RawCell::Date(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn xlsx_export_decodes_back_to_the_same_table() {
        let records: Vec<Record> = vec![
            [
                ("Region", Value::String("関東".into())),
                ("Sales", Value::Number(120.5)),
            ]
            .into_iter()
            .collect(),
            [
                ("Region", Value::String("関西".into())),
                ("Active", Value::Boolean(true)),
            ]
            .into_iter()
            .collect(),
        ];
        let headers = union_headers(&records);
        let bytes = encode_xlsx("Report", &headers, &records).unwrap();

        let workbook = decode_workbook_bytes(bytes).unwrap();
        let sheet = workbook.sheet("Report").unwrap();
        let grid = sheet.grid.as_ref().unwrap();
        assert_eq!(
            grid.headers,
            vec![
                RawCell::from("Region"),
                RawCell::from("Sales"),
                RawCell::from("Active")
            ]
        );
        assert_eq!(grid.rows[0][1], RawCell::Number(120.5));
        assert_eq!(grid.rows[1][1], RawCell::Empty);
        assert_eq!(grid.rows[1][2], RawCell::Bool(true));
    }

    #[test]
    fn worksheet_names_are_sanitised() {
        assert_eq!(worksheet_name("Q1/Q2 [draft]"), "Q1_Q2 _draft_");
        assert_eq!(worksheet_name(""), "Sheet1");
        assert_eq!(worksheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn csv_export_uses_union_headers_and_blank_missing_cells() {
        let records: Vec<Record> = vec![
            [("a", Value::Number(1.0))].into_iter().collect(),
            [("b", Value::String("x,y".into()))].into_iter().collect(),
        ];
        let mut output = Vec::new();
        export_records(&mut output, ExportFormat::Csv, "s", &records, UTF_8).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "a,b\n1,\n,\"x,y\"\n");
    }

    #[test]
    fn export_format_follows_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out.XLSX")), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_path(Path::new("out.json")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path(Path::new("out.txt")), None);
    }
}
