//! Writers for the three output formats.
//!
//! Every writer takes the directory to write into and creates it when it is
//! missing. File names are fixed: `<name>.pkl`, `<name>.xlsx`, `<name>.json`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use streams_core::error::{Result, StreamsError};
use streams_core::models::Cell;
use streams_core::settings::OutputOptions;
use streams_core::timestamps::{strip_offset, to_iso_seconds_utc};
use tracing::info;

use crate::table::{SongTable, StreamTable, Tabular};

/// Longest text a spreadsheet cell accepts.
pub const MAX_CELL_CHARS: usize = 32_767;

const EXCEL_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

// ── Public API ────────────────────────────────────────────────────────────────

/// Write the stream table as `streams.*` in every enabled format.
pub fn save_streams(table: &StreamTable, options: &OutputOptions) -> Result<Vec<PathBuf>> {
    save_enabled(table, "streams", options)
}

/// Write the song table as `songs.*` in every enabled format.
pub fn save_songs(table: &SongTable, options: &OutputOptions) -> Result<Vec<PathBuf>> {
    save_enabled(table, "songs", options)
}

/// Create `dir` (and parents) unless it already exists.
pub fn ensure_folder(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Write `value` as a MessagePack snapshot to `<dir>/<name>.pkl`.
pub fn save_snapshot<T: Serialize>(value: &T, dir: &Path, name: &str) -> Result<PathBuf> {
    ensure_folder(dir)?;
    info!("Saving pickle...");
    let path = dir.join(format!("{name}.pkl"));

    let mut writer = BufWriter::new(File::create(&path)?);
    rmp_serde::encode::write_named(&mut writer, value)?;
    writer.flush()?;

    info!("...Pickle saved to {}", path.display());
    Ok(path)
}

/// Read a snapshot written by [`save_snapshot`].
pub fn load_snapshot<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| StreamsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(rmp_serde::from_read(BufReader::new(file))?)
}

/// Write `table` as a spreadsheet to `<dir>/<name>.xlsx`.
///
/// Timestamps keep their wall-clock reading but lose their offset, which
/// the format cannot store. Over-long text is cut to [`MAX_CELL_CHARS`].
pub fn save_excel<T: Tabular>(table: &T, dir: &Path, name: &str) -> Result<PathBuf> {
    ensure_folder(dir)?;
    info!("Saving Excel... Patience is a virtue...");
    let path = dir.join(format!("{name}.xlsx"));

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header = Format::new().set_bold();
    let datetime = Format::new().set_num_format(EXCEL_DATETIME_FORMAT);

    for (col, column) in table.column_names().iter().enumerate() {
        worksheet.write_string_with_format(0, col_num(col)?, column, &header)?;
    }

    for index in 0..table.row_count() {
        let row = row_num(index + 1)?;
        for (col, cell) in table.row(index).iter().enumerate() {
            write_cell(worksheet, row, col_num(col)?, cell, &datetime)?;
        }
    }

    workbook.save(&path)?;
    info!("...Excel saved to {}", path.display());
    Ok(path)
}

/// Write `table` as JSON in "split" layout to `<dir>/<name>.json`.
///
/// The document holds `columns` and `data` (no index), indented by four
/// spaces, with timestamps as ISO-8601 UTC at second resolution.
pub fn save_json<T: Tabular>(table: &T, dir: &Path, name: &str) -> Result<PathBuf> {
    ensure_folder(dir)?;
    info!("Saving JSON...");
    let path = dir.join(format!("{name}.json"));

    let document = split_document(table);
    let mut writer = BufWriter::new(File::create(&path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    document.serialize(&mut serializer)?;
    writer.flush()?;

    info!("...JSON saved to {}", path.display());
    Ok(path)
}

/// The "split" layout of `table` as a JSON value.
pub fn split_document<T: Tabular>(table: &T) -> Value {
    let data: Vec<Value> = (0..table.row_count())
        .map(|i| Value::Array(table.row(i).iter().map(cell_to_json).collect()))
        .collect();
    json!({
        "columns": table.column_names(),
        "data": data,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Spreadsheet, then JSON, then snapshot, as enabled in `options`.
fn save_enabled<T: Tabular + Serialize>(
    table: &T,
    name: &str,
    options: &OutputOptions,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if options.save_excel {
        written.push(save_excel(table, &options.excel_dir(), name)?);
    }
    if options.save_json {
        written.push(save_json(table, &options.json_dir(), name)?);
    }
    if options.save_pickle {
        written.push(save_snapshot(table, &options.pickle_dir(), name)?);
    }
    Ok(written)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    cell: &Cell,
    datetime: &Format,
) -> Result<()> {
    match cell {
        Cell::Null => {}
        Cell::Text(s) => {
            worksheet.write_string(row, col, truncate_for_cell(s))?;
        }
        Cell::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Cell::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Cell::Timestamp(ts) => {
            worksheet.write_datetime_with_format(row, col, &strip_offset(ts), datetime)?;
        }
        Cell::List(_) | Cell::Json(_) => {
            worksheet.write_string(row, col, truncate_for_cell(&cell_text(cell)))?;
        }
    }
    Ok(())
}

/// Plain-text rendering used for list and nested cells in spreadsheets.
fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Text(s) => s.clone(),
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) => f.to_string(),
        Cell::Bool(b) => b.to_string(),
        Cell::Timestamp(ts) => strip_offset(ts).format("%Y-%m-%d %H:%M:%S").to_string(),
        Cell::List(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        Cell::Json(v) => v.to_string(),
    }
}

fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Int(i) => Value::from(*i),
        Cell::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Timestamp(ts) => Value::String(to_iso_seconds_utc(ts)),
        Cell::List(items) => Value::Array(items.iter().map(cell_to_json).collect()),
        Cell::Json(v) => v.clone(),
    }
}

fn truncate_for_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

fn row_num(index: usize) -> Result<RowNum> {
    RowNum::try_from(index)
        .map_err(|_| StreamsError::Config(format!("row {index} does not fit in a spreadsheet")))
}

fn col_num(index: usize) -> Result<ColNum> {
    ColNum::try_from(index)
        .map_err(|_| StreamsError::Config(format!("column {index} does not fit in a spreadsheet")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
