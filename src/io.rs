//! Reading and writing of delimited field files.
//!
//! Field files hold one point per row, starting with the element label of the
//! point. Steel data files carry a header row naming the fields. Derived
//! fields are written as CSV or JSON.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::info;
use regex::Regex;
use serde::Serialize;

use crate::config::{Output, OutputFormat, ParseConfig, SteelSource};
use crate::criteria::EffectiveStress;
use crate::error::{FatigueError, Result};
use crate::steel_data::SteelData;

/// Values read from a field file, one row of values per label.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    pub labels: Vec<u64>,
    pub values: Vec<Vec<f64>>,
}

fn reader(path: &str, delimiter: &str, has_headers: bool) -> Result<csv::Reader<File>> {
    let delimiter = delimiter.bytes().next().unwrap_or(b',');
    let reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_path(path)?;
    Ok(reader)
}

// Repeated whitespace delimiters produce empty fields
fn fields(record: &StringRecord) -> Vec<&str> {
    record.iter().filter(|f| !f.is_empty()).collect()
}

fn line_of(record: &StringRecord) -> usize {
    record.position().map(|p| p.line() as usize).unwrap_or(0)
}

pub(crate) fn parse_error(path: &str, line: usize, message: String) -> FatigueError {
    FatigueError::Parse {
        path: path.to_string(),
        line,
        message,
    }
}

pub(crate) fn parse_label(path: &str, line: usize, field: &str) -> Result<u64> {
    field
        .parse::<u64>()
        .map_err(|_| parse_error(path, line, format!("'{}' is not an element label", field)))
}

pub(crate) fn parse_value(path: &str, line: usize, field: &str) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|_| parse_error(path, line, format!("'{}' is not a number", field)))
}

/// Reads the non-empty rows of a delimited file after the configured header lines.
///
/// Each row is returned with its line number for error reporting.
pub fn read_records(path: &str, parse_config: &ParseConfig) -> Result<Vec<(usize, Vec<String>)>> {
    let mut rows = Vec::new();
    for record in reader(path, &parse_config.delimiter, false)?
        .records()
        .skip(parse_config.header)
    {
        let record = record?;
        let row: Vec<String> = fields(&record).into_iter().map(String::from).collect();
        if !row.is_empty() {
            rows.push((line_of(&record), row));
        }
    }
    Ok(rows)
}

/// Reads a field file with rows `label v1 v2 ...`.
pub fn read_field_file(path: &str, parse_config: &ParseConfig) -> Result<FieldData> {
    let mut labels = Vec::new();
    let mut values = Vec::new();
    for (line, row) in read_records(path, parse_config)? {
        labels.push(parse_label(path, line, &row[0])?);
        values.push(
            row[1..]
                .iter()
                .map(|f| parse_value(path, line, f))
                .collect::<Result<Vec<f64>>>()?,
        );
    }
    Ok(FieldData { labels, values })
}

/// Reads one column of a field file as a scalar field, scaled by `scale`.
pub fn read_scalar_field(
    path: &str,
    parse_config: &ParseConfig,
    column: usize,
    scale: f64,
) -> Result<(Vec<u64>, Vec<f64>)> {
    let data = read_field_file(path, parse_config)?;
    let mut values = Vec::with_capacity(data.values.len());
    for row in data.values.iter() {
        let value = row.get(column).ok_or_else(|| {
            FatigueError::shape(format!("value columns in {}", path), column + 1, row.len())
        })?;
        values.push(value * scale);
    }
    Ok((data.labels, values))
}

/// Reads steel data, `label,HV,...` with one header row naming the fields.
pub fn read_steel_data(source: &SteelSource) -> Result<(Vec<u64>, SteelData)> {
    let path = source.path.as_str();
    let mut reader = reader(path, &source.delimiter, true)?;
    let headers = reader.headers()?.clone();
    let names = fields(&headers);
    if names.len() < 2 {
        return Err(parse_error(path, 1, "expected a label column and at least one field".into()));
    }
    let identifier = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$")
        .map_err(|e| FatigueError::InvalidArgument(e.to_string()))?;
    for name in names[1..].iter() {
        if !identifier.is_match(name) {
            return Err(parse_error(path, 1, format!("invalid field name '{}'", name)));
        }
    }

    let mut labels = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len() - 1];
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);
        let row = fields(&record);
        if row.is_empty() {
            continue;
        }
        if row.len() != names.len() {
            return Err(parse_error(
                path,
                line,
                format!("expected {} columns, got {}", names.len(), row.len()),
            ));
        }
        labels.push(parse_label(path, line, row[0])?);
        for (column, field) in columns.iter_mut().zip(row[1..].iter()) {
            column.push(parse_value(path, line, field)?);
        }
    }
    let steel_data = SteelData::new(
        names[1..]
            .iter()
            .map(|n| n.to_string())
            .zip(columns),
    )?;
    info!(
        "Read steel data fields {:?} at {} points from {}",
        steel_data.names().collect::<Vec<_>>(),
        labels.len(),
        path
    );
    Ok((labels, steel_data))
}

/// Checks that `actual` lists the same labels as `expected`, in the same order.
pub fn check_labels(input: &str, expected: &[u64], actual: &[u64]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(FatigueError::shape(input, expected.len(), actual.len()));
    }
    match expected.iter().zip(actual.iter()).position(|(e, a)| e != a) {
        Some(position) => Err(FatigueError::LabelMismatch {
            input: input.to_string(),
            position,
            expected: expected[position],
            actual: actual[position],
        }),
        None => Ok(()),
    }
}

#[derive(Serialize)]
struct JsonField<'a> {
    name: &'a str,
    description: &'a str,
    labels: &'a [u64],
    values: &'a [f64],
}

/// Writes derived fields with the labels of the points they belong to.
pub fn write_fields(output: &Output, labels: &[u64], result: &EffectiveStress) -> Result<()> {
    if labels.len() != result.points() {
        return Err(FatigueError::shape("output labels", result.points(), labels.len()));
    }
    if let Some(parent) = Path::new(&output.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    match output.format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_path(&output.path)?;
            let mut header = vec!["label".to_string()];
            header.extend(result.variables.iter().map(|v| v.name.clone()));
            writer.write_record(&header)?;
            for (point, label) in labels.iter().enumerate() {
                let mut row = vec![label.to_string()];
                row.extend(result.variables.iter().map(|v| v.values[point].to_string()));
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let fields: Vec<JsonField> = result
                .variables
                .iter()
                .map(|v| JsonField {
                    name: &v.name,
                    description: &v.description,
                    labels,
                    values: &v.values,
                })
                .collect();
            let file = File::create(&output.path)?;
            serde_json::to_writer_pretty(file, &fields)?;
        }
    }
    info!("Wrote {} fields to {}", result.variables.len(), output.path);
    Ok(())
}

/// Writes report lines, one per line.
pub fn write_report(path: &str, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content)?;
    info!("Wrote {} lines to {}", lines.len(), path);
    Ok(())
}
