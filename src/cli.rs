use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::workbook::ExportFormat;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Normalize messy spreadsheets into flat records and rank their tags",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize every sheet of a workbook and emit the results as JSON
    Normalize(NormalizeArgs),
    /// Rank the most frequent tags of a normalized sheet
    Tags(TagsArgs),
    /// Search, filter, group and page through a normalized sheet
    Preview(PreviewArgs),
    /// Summarize normalization across all sheets of a workbook
    Stats(StatsArgs),
    /// Write a normalized sheet as xlsx, JSON, CSV or TSV
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input workbook (xlsx, xlsm, xlsb, xls, ods) or delimited text (csv, tsv, `-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Delimiter for delimited text input (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited text input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML configuration file; flags override its values
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct NormalizeFlags {
    /// Identifier columns to fill down, replacing keyword detection
    #[arg(long = "id-columns", value_delimiter = ',')]
    pub id_columns: Vec<String>,
    /// Keep empty identifier cells empty instead of filling them down
    #[arg(long = "no-fill")]
    pub no_fill: bool,
    /// Emit identifier columns first in every record
    #[arg(long = "preserve-hierarchy")]
    pub preserve_hierarchy: bool,
    /// Fail a sheet with more data rows than this
    #[arg(long = "max-rows")]
    pub max_rows: Option<usize>,
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub normalize: NormalizeFlags,
    /// Output JSON file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Sheets to normalize (all when omitted)
    #[arg(long = "sheet", action = clap::ArgAction::Append)]
    pub sheets: Vec<String>,
    /// Emit only the records of each sheet instead of the full result
    #[arg(long = "data-only")]
    pub data_only: bool,
}

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub normalize: NormalizeFlags,
    /// Sheet to read tags from (first sheet when omitted)
    #[arg(long = "sheet")]
    pub sheet: Option<String>,
    /// Number of tags to keep
    #[arg(long)]
    pub top: Option<usize>,
    /// Show how often each tag occurs
    #[arg(long)]
    pub counts: bool,
    /// Additional words never reported as tags
    #[arg(long = "stop-word", action = clap::ArgAction::Append)]
    pub stop_words: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub normalize: NormalizeFlags,
    /// Sheet to preview (first sheet when omitted)
    #[arg(long = "sheet")]
    pub sheet: Option<String>,
    /// Keep records containing this text in any value
    #[arg(long)]
    pub search: Option<String>,
    /// Keep records containing every given tag
    #[arg(long = "tag", action = clap::ArgAction::Append)]
    pub tags: Vec<String>,
    /// Group records by the values of this column
    #[arg(long = "group-by")]
    pub group_by: Option<String>,
    /// 1-based page to display
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Records per page
    #[arg(long = "per-page", default_value_t = crate::query::DEFAULT_PER_PAGE)]
    pub per_page: usize,
    /// Maximum display width of a cell
    #[arg(long = "max-width", default_value_t = 40)]
    pub max_width: usize,
    /// Disable ANSI highlighting of matches
    #[arg(long = "no-color")]
    pub no_color: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub normalize: NormalizeFlags,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum FormatArg {
    Xlsx,
    Json,
    Csv,
    Tsv,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Tsv => ExportFormat::Tsv,
        }
    }
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub normalize: NormalizeFlags,
    /// Destination file (`-` for stdout); the format follows its extension
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Output format, overriding the extension
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    /// Sheet to export (first sheet when omitted)
    #[arg(long = "sheet")]
    pub sheet: Option<String>,
    /// Keep records containing this text in any value
    #[arg(long)]
    pub search: Option<String>,
    /// Keep records containing every given tag
    #[arg(long = "tag", action = clap::ArgAction::Append)]
    pub tags: Vec<String>,
    /// Character encoding for CSV/TSV output (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
