use crate::signal::{MeasurementTriple, TimeSeries};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read a voltage/current/SOC run. Header names are matched case-insensitively.
pub fn read_measurement_csv(path: &Path) -> Result<MeasurementTriple> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_measurement_csv(file)
}

pub fn parse_measurement_csv<R: Read>(reader: R) -> Result<MeasurementTriple> {
    let columns = read_columns(reader, &["voltage", "current", "soc"])?;
    let mut columns = columns.into_iter();
    let (Some(voltage), Some(current), Some(soc)) =
        (columns.next(), columns.next(), columns.next())
    else {
        anyhow::bail!("expected voltage, current and soc columns");
    };
    Ok(MeasurementTriple::new(voltage, current, soc))
}

/// Read a `time` column and one quantity column (e.g. `capacity`, `energy`).
pub fn read_quantity_csv(path: &Path, column: &str) -> Result<TimeSeries> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_quantity_csv(file, column)
}

pub fn parse_quantity_csv<R: Read>(reader: R, column: &str) -> Result<TimeSeries> {
    let mut columns = read_columns(reader, &["time", column])?.into_iter();
    let (Some(time), Some(values)) = (columns.next(), columns.next()) else {
        anyhow::bail!("expected time and {} columns", column);
    };
    TimeSeries::new(time, values).context("invalid time series")
}

fn read_columns<R: Read>(reader: R, names: &[&str]) -> Result<Vec<Vec<f64>>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);
    let headers = reader.headers().context("reading header")?.clone();
    let indices = names
        .iter()
        .map(|name| locate_column(&headers, name))
        .collect::<Result<Vec<_>>>()?;
    let mut columns = vec![Vec::new(); names.len()];
    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading record {}", row + 1))?;
        for ((col, &idx), name) in columns.iter_mut().zip(&indices).zip(names) {
            let raw = record
                .get(idx)
                .ok_or_else(|| anyhow::anyhow!("record {} has no {} value", row + 1, name))?;
            let value = raw
                .parse::<f64>()
                .with_context(|| format!("parsing {} in record {}: {}", name, row + 1, raw))?;
            col.push(value);
        }
    }
    Ok(columns)
}

fn locate_column(headers: &StringRecord, requested: &str) -> Result<usize> {
    headers
        .iter()
        .position(|name| name.eq_ignore_ascii_case(requested))
        .ok_or_else(|| anyhow::anyhow!("missing {} column", requested))
}
