//! Table and record files.
//!
//! A `.json` path holds an array of row objects; any other path is CSV with
//! a header row. An empty CSV cell reads as null and null writes as an empty
//! cell.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tabulax_model::{CellValue, Row, Table, Transformation};

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Reads a table from CSV or JSON.
pub fn read_table(path: &Path) -> Result<Table> {
    if is_json(path) {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parse table {}", path.display()))
    } else {
        let reader = csv::Reader::from_path(path)
            .with_context(|| format!("open {}", path.display()))?;
        read_csv(reader).with_context(|| format!("parse table {}", path.display()))
    }
}

fn read_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Table> {
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| {
                let value = if cell.is_empty() {
                    CellValue::Null
                } else {
                    CellValue::text(cell)
                };
                (column, value)
            })
            .collect();
        rows.push(row);
    }
    Ok(Table::new(rows))
}

/// Writes a table to `path`, or as JSON to stdout when no path is given.
pub fn write_table(table: &Table, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) if !is_json(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            write_csv(table, file).with_context(|| format!("write {}", path.display()))
        }
        _ => write_json(table, path),
    }
}

fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let columns = table.columns();
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&columns)?;
    for row in table.rows() {
        writer.write_record(columns.iter().map(|column| row.get(column).to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes pretty JSON to `path`, or to stdout when no path is given.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Reads and validates a stored transformation record.
pub fn read_transformation(path: &Path) -> Result<Transformation> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let record: Transformation = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse transformation {}", path.display()))?;
    record
        .validate()
        .with_context(|| format!("invalid transformation {}", path.display()))?;
    Ok(record)
}

/// Collects aligned example columns, skipping rows where either side is null.
///
/// Returns the two columns and the number of rows skipped.
pub fn example_columns(
    table: &Table,
    source: &str,
    target: &str,
) -> Result<(Vec<String>, Vec<String>, usize)> {
    for column in [source, target] {
        if !table.has_column(column) {
            bail!("example column `{column}` is not present");
        }
    }
    let mut sources = Vec::new();
    let mut targets = Vec::new();
    let mut skipped = 0;
    for row in table.rows() {
        match (row.get(source).as_text(), row.get(target).as_text()) {
            (Some(s), Some(t)) => {
                sources.push(s.into_owned());
                targets.push(t.into_owned());
            }
            _ => skipped += 1,
        }
    }
    Ok((sources, targets, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_empty_cell_is_null() {
        let data = "name,city\nAda,\n,Paris\n";
        let table = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rows()[0].get("city").is_null());
        assert!(table.rows()[1].get("name").is_null());
        assert_eq!(table.rows()[1].get("city"), &CellValue::text("Paris"));
    }

    #[test]
    fn test_csv_writes_null_as_empty() {
        let mut row = Row::new();
        row.insert("b", CellValue::Null);
        row.insert("a", CellValue::Number(2.5));
        let mut out = Vec::new();
        write_csv(&Table::new(vec![row]), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a,b\n2.5,\n");
    }

    #[test]
    fn test_example_columns_skip_nulls() {
        let data = "s,t\na,A\nb,\nc,C\n";
        let table = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        let (sources, targets, skipped) = example_columns(&table, "s", "t").unwrap();
        assert_eq!(sources, ["a", "c"]);
        assert_eq!(targets, ["A", "C"]);
        assert_eq!(skipped, 1);
        assert!(example_columns(&table, "s", "missing").is_err());
    }
}
