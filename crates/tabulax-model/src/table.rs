use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::CellValue;

static NULL_CELL: CellValue = CellValue::Null;

/// A row: column name to scalar value.
///
/// Rows may carry different column sets; a missing key reads as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a column, or null when the column is absent.
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&NULL_CELL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Sets a column, returning the previous value if one was present.
    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) -> Option<CellValue> {
        self.cells.insert(column.into(), value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An ordered sequence of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Builds a single-column table, one row per value.
    pub fn from_column<V: Into<CellValue>>(
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            rows: values
                .into_iter()
                .map(|value| std::iter::once((column, value.into())).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if any row carries the column.
    pub fn has_column(&self, column: &str) -> bool {
        self.rows.iter().any(|row| row.contains(column))
    }

    /// Union of all column names across rows, sorted.
    pub fn columns(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .flat_map(|row| row.columns().map(str::to_string))
            .collect()
    }

    /// Values of one column in row order; missing cells read as null.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> {
        self.rows.iter().map(move |row| row.get(column))
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_reads_null() {
        let row: Row = [("name", "Ada")].into_iter().collect();
        assert_eq!(row.get("name"), &CellValue::text("Ada"));
        assert!(row.get("email").is_null());
    }

    #[test]
    fn test_heterogeneous_columns() {
        let table = Table::new(vec![
            [("a", "1")].into_iter().collect(),
            [("b", "2")].into_iter().collect(),
        ]);
        assert!(table.has_column("a"));
        assert!(table.has_column("b"));
        assert!(!table.has_column("c"));
        assert_eq!(table.columns().len(), 2);
        let values: Vec<_> = table.column_values("a").cloned().collect();
        assert_eq!(values, vec![CellValue::text("1"), CellValue::Null]);
    }

    #[test]
    fn test_table_json_shape() {
        let table: Table = serde_json::from_str(r#"[{"x": "a", "n": 2}, {"x": null}]"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].get("n"), &CellValue::Number(2.0));
        assert!(table.rows()[1].get("x").is_null());
        assert!(table.rows()[1].contains("x"));
    }
}
