pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod header;
pub mod identifier;
pub mod io_utils;
pub mod normalize;
pub mod query;
pub mod record;
pub mod table;
pub mod tags;
pub mod value;
pub mod workbook;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, InputArgs, NormalizeFlags},
    config::Settings,
    normalize::NormalizationResult,
    query::{Group, RecordQuery, group_by, highlight, paginate},
    record::union_headers,
    table::{Table, print_table},
    tags::{DEFAULT_TAG_CAP, TagVocabulary},
    workbook::{DecodeOptions, DecodedWorkbook, ExportFormat},
};

pub use crate::{
    normalize::{NormalizeConfig, Normalizer, WorkbookResults, normalize_data, normalize_workbook},
    record::Record,
    tags::{extract_tags, rank_tags},
    value::{RawCell, Value, coerce},
};

static LOGGER: OnceLock<()> = OnceLock::new();

const MATCH_STYLE: &str = "\u{1b}[1;33m";
const RESET_STYLE: &str = "\u{1b}[0m";

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_normalizer", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize(args) => handle_normalize(&args),
        Commands::Tags(args) => handle_tags(&args),
        Commands::Preview(args) => handle_preview(&args),
        Commands::Stats(args) => handle_stats(&args),
        Commands::Export(args) => handle_export(&args),
    }
}

fn load_settings(input: &InputArgs, flags: &NormalizeFlags) -> Result<Settings> {
    let mut settings = Settings::load_optional(input.config.as_deref())?;
    let id_columns = flags
        .id_columns
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect::<Vec<_>>();
    if !id_columns.is_empty() {
        settings.normalize.id_columns = Some(id_columns);
    }
    if flags.no_fill {
        settings.normalize.fill_empty_id_columns = false;
    }
    if flags.preserve_hierarchy {
        settings.normalize.preserve_hierarchy = true;
    }
    if flags.max_rows.is_some() {
        settings.normalize.max_rows = flags.max_rows;
    }
    debug!("Effective settings: {settings:?}");
    Ok(settings)
}

fn decode_input(input: &InputArgs) -> Result<DecodedWorkbook> {
    let encoding = io_utils::resolve_encoding(input.input_encoding.as_deref())?;
    let options = DecodeOptions {
        delimiter: input.delimiter,
        encoding,
    };
    info!(
        "Reading '{}' as {}",
        input.input.display(),
        if io_utils::is_delimited_path(&input.input) {
            format!(
                "delimited text ('{}', {})",
                printable_delimiter(io_utils::resolve_input_delimiter(&input.input, input.delimiter)),
                encoding.name()
            )
        } else {
            "workbook".to_string()
        }
    );
    workbook::decode_path(&input.input, &options)
        .with_context(|| format!("Decoding {:?}", input.input))
}

struct LoadedSheet {
    settings: Settings,
    name: String,
    result: NormalizationResult,
}

/// Normalize one sheet, defaulting to the first. A failed sheet is an error.
fn load_sheet(input: &InputArgs, flags: &NormalizeFlags, sheet: Option<&str>) -> Result<LoadedSheet> {
    let settings = load_settings(input, flags)?;
    let workbook = decode_input(input)?;
    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .next()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("{:?} contains no sheets", input.input))?,
    };
    let decoded = workbook.sheet(&name).ok_or_else(|| {
        anyhow!(
            "Sheet '{name}' not found; available sheets: {}",
            workbook.sheet_names().join(", ")
        )
    })?;
    let result = settings.normalizer().normalize_sheet(decoded);
    if !result.success() {
        bail!("Sheet '{name}' could not be normalized: {}", result.errors().join("; "));
    }
    for warning in result.warnings() {
        debug!("Sheet '{name}': {warning}");
    }
    Ok(LoadedSheet {
        settings,
        name,
        result,
    })
}

fn handle_normalize(args: &cli::NormalizeArgs) -> Result<()> {
    let settings = load_settings(&args.input, &args.normalize)?;
    let mut workbook = decode_input(&args.input)?;
    workbook.select(&args.sheets);
    if workbook.sheets.is_empty() && !args.sheets.is_empty() {
        bail!("None of the requested sheets exist: {}", args.sheets.join(", "));
    }

    let results = settings.normalizer().normalize_workbook(&workbook);
    let mut writer = io_utils::open_output(args.output.as_deref())
        .with_context(|| format!("Creating output {:?}", args.output))?;
    if args.data_only {
        serde_json::to_writer_pretty(&mut writer, &results.data_view())?;
    } else {
        serde_json::to_writer_pretty(&mut writer, &results)?;
    }
    writeln!(writer)?;
    writer.flush()?;

    let stats = results.statistics();
    info!(
        "Normalized {} of {} sheet(s): {} of {} row(s) retained",
        stats.successful_sheets,
        stats.total_sheets,
        stats.total_normalized_rows,
        stats.total_original_rows
    );
    Ok(())
}

fn handle_tags(args: &cli::TagsArgs) -> Result<()> {
    let LoadedSheet {
        mut settings,
        name,
        result,
    } = load_sheet(&args.input, &args.normalize, args.sheet.as_deref())?;
    settings
        .tags
        .extra_stop_words
        .extend(args.stop_words.iter().cloned());
    let top = args.top.unwrap_or(settings.tags.top).min(DEFAULT_TAG_CAP);
    let vocabulary = TagVocabulary::build(result.data(), &settings.tag_extractor(), top);

    let mut headers = vec!["#".to_string(), "tag".to_string()];
    if args.counts {
        headers.push("count".to_string());
    }
    let mut table = Table::new(headers);
    for (rank, entry) in vocabulary.entries().iter().enumerate() {
        let mut row = vec![(rank + 1).to_string(), entry.tag.clone()];
        if args.counts {
            row.push(entry.frequency.to_string());
        }
        table.push_row(row);
    }
    print_table(&table);
    info!(
        "Ranked {} tag(s) from {} record(s) in sheet '{name}'",
        vocabulary.len(),
        result.normalized_row_count()
    );
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let LoadedSheet { name, result, .. } =
        load_sheet(&args.input, &args.normalize, args.sheet.as_deref())?;
    let query = RecordQuery::new()
        .with_search(args.search.clone().unwrap_or_default())
        .with_tags(&args.tags);
    let matches = query.apply(result.data());
    let page = paginate(&matches, args.page, args.per_page);
    let headers = union_headers(result.data());
    let terms = if args.no_color { Vec::new() } else { query.terms() };

    println!(
        "Sheet '{name}': {} of {} record(s) match, page {} of {}",
        matches.len(),
        result.normalized_row_count(),
        page.page,
        page.total_pages.max(1)
    );
    let groups = match &args.group_by {
        Some(column) => group_by(page.items.iter().copied(), column),
        None => vec![Group {
            key: String::new(),
            records: page.items.to_vec(),
        }],
    };
    for group in &groups {
        if args.group_by.is_some() {
            println!();
            println!("{} ({})", group.key, group.records.len());
        }
        let mut table = Table::new(headers.clone()).with_max_cell_width(args.max_width);
        for record in &group.records {
            table.push_row(
                headers
                    .iter()
                    .map(|header| {
                        record
                            .get(header)
                            .map(|value| emphasize(&value.as_display(), &terms))
                            .unwrap_or_default()
                    })
                    .collect(),
            );
        }
        print_table(&table);
    }
    info!(
        "Displayed {} record(s) in {} group(s) from sheet '{name}'",
        page.items.len(),
        groups.len()
    );
    Ok(())
}

fn emphasize(text: &str, terms: &[&str]) -> String {
    if terms.is_empty() {
        return text.to_string();
    }
    highlight(text, terms)
        .iter()
        .map(|segment| {
            if segment.matched {
                format!("{MATCH_STYLE}{}{RESET_STYLE}", segment.text)
            } else {
                segment.text.to_string()
            }
        })
        .collect()
}

fn handle_stats(args: &cli::StatsArgs) -> Result<()> {
    let settings = load_settings(&args.input, &args.normalize)?;
    let workbook = decode_input(&args.input)?;
    let results = settings.normalizer().normalize_workbook(&workbook);
    let stats = results.statistics();

    let mut summary = Table::new(vec!["metric".to_string(), "value".to_string()]);
    for (metric, value) in [
        ("sheets", stats.total_sheets.to_string()),
        ("successful sheets", stats.successful_sheets.to_string()),
        ("original rows", stats.total_original_rows.to_string()),
        ("normalized rows", stats.total_normalized_rows.to_string()),
        ("efficiency", format!("{:.1}%", stats.overall_efficiency)),
        ("warnings", stats.total_warnings.to_string()),
        ("errors", stats.total_errors.to_string()),
    ] {
        summary.push_row(vec![metric.to_string(), value]);
    }
    print_table(&summary);
    println!();

    let mut sheets = Table::new(
        ["sheet", "status", "original", "normalized", "efficiency"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
    );
    for (name, result) in results.iter() {
        sheets.push_row(vec![
            name.to_string(),
            if result.success() { "ok" } else { "failed" }.to_string(),
            result.original_row_count().to_string(),
            result.normalized_row_count().to_string(),
            format!("{:.1}%", result.efficiency()),
        ]);
    }
    print_table(&sheets);

    for (name, result) in results.iter() {
        for warning in result.warnings() {
            println!("{name}: warning: {warning}");
        }
        for error in result.errors() {
            warn!("Sheet '{name}' failed: {error}");
            println!("{name}: error: {error}");
        }
    }
    info!(
        "Summarized {} sheet(s) from {:?}",
        stats.total_sheets, args.input.input
    );
    Ok(())
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let format = args
        .format
        .map(ExportFormat::from)
        .or_else(|| ExportFormat::from_path(&args.output))
        .ok_or_else(|| {
            anyhow!(
                "Cannot infer an export format from {:?}; pass --format",
                args.output
            )
        })?;
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let LoadedSheet { name, result, .. } =
        load_sheet(&args.input, &args.normalize, args.sheet.as_deref())?;
    let query = RecordQuery::new()
        .with_search(args.search.clone().unwrap_or_default())
        .with_tags(&args.tags);
    let records = query
        .apply(result.data())
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();

    let writer = io_utils::open_output(Some(&args.output))
        .with_context(|| format!("Creating output {:?}", args.output))?;
    workbook::export_records(writer, format, &name, &records, encoding)
        .with_context(|| format!("Writing {:?}", args.output))?;
    info!(
        "Exported {} of {} record(s) from sheet '{name}' to {:?}",
        records.len(),
        result.normalized_row_count(),
        args.output
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
