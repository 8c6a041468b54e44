#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// Cell written into a fixture workbook.
#[derive(Debug, Clone, Copy)]
pub enum Cell {
    Blank,
    Text(&'static str),
    Number(f64),
    Bool(bool),
}

impl From<&'static str> for Cell {
    fn from(value: &'static str) -> Self {
        if value.is_empty() {
            Cell::Blank
        } else {
            Cell::Text(value)
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// Grid of rows for one fixture sheet; row 0 is the header row.
pub struct SheetFixture {
    pub name: &'static str,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetFixture {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: Vec::new(),
        }
    }

    pub fn row<C: Into<Cell>>(mut self, cells: impl IntoIterator<Item = C>) -> Self {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }
}

/// Builds an in-memory xlsx workbook from sheet fixtures.
pub fn xlsx_bytes(sheets: &[SheetFixture]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for fixture in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(fixture.name).expect("valid sheet name");
        for (row, cells) in fixture.rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let (row, col) = (row as u32, col as u16);
                let written = match *cell {
                    Cell::Blank => continue,
                    Cell::Text(text) => sheet.write_string(row, col, text),
                    Cell::Number(n) => sheet.write_number(row, col, n),
                    Cell::Bool(b) => sheet.write_boolean(row, col, b),
                };
                written.expect("write fixture cell");
            }
        }
    }
    workbook.save_to_buffer().expect("serialize fixture workbook")
}

/// The hierarchical sales sheet used across the integration tests: region
/// cells appear only on the first row of each group.
pub fn sales_fixture() -> SheetFixture {
    SheetFixture::new("Sales")
        .row(["Region", "Product", "Memo"])
        .row([Cell::Text("関東"), Cell::Text("Excel"), Cell::Text("東京の研修")])
        .row([Cell::Blank, Cell::Text("Word"), Cell::Text("東京の研修")])
        .row([Cell::Text("関西"), Cell::Text("Excel"), Cell::Text("大阪の研修")])
        .row([Cell::Blank, Cell::Blank, Cell::Blank])
        .row([Cell::Blank, Cell::Text("Access"), Cell::Text("N/A")])
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Writes an xlsx workbook built from `sheets` and returns its path.
    pub fn write_xlsx(&self, name: &str, sheets: &[SheetFixture]) -> PathBuf {
        self.write_bytes(name, &xlsx_bytes(sheets))
    }
}
