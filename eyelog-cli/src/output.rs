//! CSV and JSON writers for assembled trial records

use crate::config::OutputFormat;
use anyhow::{Context, Result};
use eyelog_decoder::{FieldValue, FormatDescription, TrialRecord};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `records` to `path` in the requested format
pub fn write_records(
    path: &Path,
    output_format: OutputFormat,
    format: &FormatDescription,
    source: &Path,
    records: &[TrialRecord],
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }

    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut out = BufWriter::new(file);

    match output_format {
        OutputFormat::Csv => write_csv(&mut out, format, records)?,
        OutputFormat::Json => write_json(&mut out, format, source, records)?,
    }
    out.flush()
        .with_context(|| format!("Failed to write {:?}", path))?;

    log::info!("Wrote {} records to {:?}", records.len(), path);
    Ok(())
}

/// One header row of field names, then one row per record
///
/// Missing values are written as empty cells.
pub fn write_csv<W: Write>(
    out: &mut W,
    format: &FormatDescription,
    records: &[TrialRecord],
) -> Result<()> {
    let header: Vec<String> = format.field_names().map(csv_cell).collect();
    writeln!(out, "{}", header.join(","))?;

    for record in records {
        let row: Vec<String> = record
            .values()
            .map(|value| match value {
                FieldValue::Missing => String::new(),
                other => csv_cell(&other.to_string()),
            })
            .collect();
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}

fn csv_cell(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    source: String,
    generated_at: String,
    format: &'a str,
    fields: Vec<&'a str>,
    records: &'a [TrialRecord],
}

/// Pretty-printed document with the field order and every record as an ordered map
pub fn write_json<W: Write>(
    out: &mut W,
    format: &FormatDescription,
    source: &Path,
    records: &[TrialRecord],
) -> Result<()> {
    let document = JsonDocument {
        source: source.display().to_string(),
        generated_at: chrono::Local::now().to_rfc3339(),
        format: &format.name,
        fields: format.field_names().collect(),
        records,
    };
    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)?;
    Ok(())
}
