mod common;

use std::fs;

use common::{Cell, SheetFixture, TestWorkspace, sales_fixture};
use encoding_rs::{SHIFT_JIS, UTF_8};
use sheet_normalizer::{
    NormalizeConfig, RawCell, Record, Value, normalize_workbook,
    record::union_headers,
    workbook::{DecodeOptions, ExportFormat, decode_path, decode_workbook_bytes, export_records},
};

#[test]
fn decodes_every_sheet_with_aligned_rows() {
    let workspace = TestWorkspace::new();
    let summary = SheetFixture::new("Summary")
        .row([Cell::Text("Metric"), Cell::Number(2024.0), Cell::Bool(true)])
        .row([Cell::Text("Rows"), Cell::Number(4.0), Cell::Blank]);
    let path = workspace.write_xlsx("book.xlsx", &[sales_fixture(), summary]);

    let workbook = decode_path(&path, &DecodeOptions::default()).unwrap();
    assert_eq!(workbook.sheet_names().collect::<Vec<_>>(), vec!["Sales", "Summary"]);

    let sales = workbook.sheet("Sales").unwrap().grid.as_ref().unwrap();
    assert_eq!(sales.rows.len(), 4, "fully blank rows are skipped");
    assert!(sales.rows.iter().all(|row| row.len() == 3));
    assert_eq!(sales.rows[1][0], RawCell::Empty);

    let summary = workbook.sheet("Summary").unwrap().grid.as_ref().unwrap();
    assert_eq!(summary.headers[1], RawCell::Number(2024.0));
    assert_eq!(summary.rows[0][2], RawCell::Empty);
}

#[test]
fn non_string_headers_are_synthesised() {
    let bytes = common::xlsx_bytes(&[SheetFixture::new("Numbers")
        .row([Cell::Text("Label"), Cell::Number(2024.0), Cell::Bool(true)])
        .row([Cell::Text("a"), Cell::Number(1.0), Cell::Number(2.0)])]);
    let workbook = decode_workbook_bytes(bytes).unwrap();
    let results = normalize_workbook(&workbook, &NormalizeConfig::default());
    let result = results.get("Numbers").unwrap();
    assert_eq!(
        result.data()[0].keys().collect::<Vec<_>>(),
        vec!["Label", "Column_2", "Column_3"]
    );
    assert_eq!(result.column_mapping().get("").map(String::as_str), Some("Column_3"));
}

#[test]
fn sales_sheet_normalizes_with_region_filled_down() {
    let bytes = common::xlsx_bytes(&[sales_fixture()]);
    let workbook = decode_workbook_bytes(bytes).unwrap();
    let results = normalize_workbook(&workbook, &NormalizeConfig::default());
    let sales = results.get("Sales").unwrap();

    let regions = sales
        .data()
        .iter()
        .map(|record| record.get("Region").map(Value::as_display))
        .collect::<Vec<_>>();
    assert_eq!(
        regions,
        ["関東", "関東", "関西", "関西"].map(|r| Some(r.to_string()))
    );
    assert!(!sales.data()[3].contains_key("Memo"));
    assert_eq!(sales.warnings(), &["Identified ID columns: Region".to_string()]);
}

#[test]
fn csv_and_tsv_inputs_become_single_sheet_workbooks() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("regions.csv", "Region,City\nKanto,Tokyo\n,Yokohama\n");
    let tsv = workspace.write("regions.tsv", "Region\tCity\nKansai\tOsaka\n");

    let from_csv = decode_path(&csv, &DecodeOptions::default()).unwrap();
    assert_eq!(from_csv.sheet_names().collect::<Vec<_>>(), vec!["regions"]);
    let grid = from_csv.sheets[0].grid.as_ref().unwrap();
    assert_eq!(grid.rows[1], vec![RawCell::Empty, RawCell::from("Yokohama")]);

    let from_tsv = decode_path(&tsv, &DecodeOptions::default()).unwrap();
    let grid = from_tsv.sheets[0].grid.as_ref().unwrap();
    assert_eq!(grid.rows[0], vec![RawCell::from("Kansai"), RawCell::from("Osaka")]);
}

#[test]
fn shift_jis_csv_is_decoded_with_the_requested_encoding() {
    let workspace = TestWorkspace::new();
    let (bytes, _, _) = SHIFT_JIS.encode("名前,部署\n山田,営業\n");
    let path = workspace.write_bytes("staff.csv", &bytes);
    let options = DecodeOptions {
        encoding: SHIFT_JIS,
        ..DecodeOptions::default()
    };
    let workbook = decode_path(&path, &options).unwrap();
    let grid = workbook.sheets[0].grid.as_ref().unwrap();
    assert_eq!(grid.headers[0], RawCell::from("名前"));
    assert_eq!(grid.rows[0][1], RawCell::from("営業"));
}

#[test]
fn corrupt_workbook_is_a_decode_error() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("broken.xlsx", "not a zip archive");
    assert!(decode_path(&path, &DecodeOptions::default()).is_err());
}

#[test]
fn exported_xlsx_and_json_round_trip_through_the_pipeline() {
    let workspace = TestWorkspace::new();
    let source = decode_workbook_bytes(common::xlsx_bytes(&[sales_fixture()])).unwrap();
    let results = normalize_workbook(&source, &NormalizeConfig::default());
    let records = results.get("Sales").unwrap().data();

    let xlsx_path = workspace.path().join("export.xlsx");
    export_records(
        fs::File::create(&xlsx_path).unwrap(),
        ExportFormat::Xlsx,
        "Sales",
        records,
        UTF_8,
    )
    .unwrap();
    let reread = decode_path(&xlsx_path, &DecodeOptions::default()).unwrap();
    let grid = reread.sheet("Sales").unwrap().grid.as_ref().unwrap();
    assert_eq!(
        grid.headers,
        union_headers(records)
            .into_iter()
            .map(RawCell::from)
            .collect::<Vec<_>>()
    );
    assert_eq!(grid.rows.len(), records.len());
    assert_eq!(grid.rows[3][2], RawCell::Empty);

    let mut json = Vec::new();
    export_records(&mut json, ExportFormat::Json, "Sales", records, UTF_8).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 4);
    assert_eq!(parsed[1]["Region"], "関東");
    assert!(String::from_utf8(json).unwrap().contains("\n  {"));
}

#[test]
fn csv_export_can_be_transcoded() {
    let records: Vec<Record> = vec![
        [("名前", Value::String("山田".into())), ("人数", Value::Number(3.0))]
            .into_iter()
            .collect(),
    ];
    let mut output = Vec::new();
    export_records(&mut output, ExportFormat::Csv, "s", &records, SHIFT_JIS).unwrap();
    let (decoded, _, had_errors) = SHIFT_JIS.decode(&output);
    assert!(!had_errors);
    assert_eq!(decoded, "名前,人数\n山田,3\n");
}
