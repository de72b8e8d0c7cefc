//! Per-row results and report assembly.

use std::borrow::Cow;

use tabulax_model::{
    CellValue, ExecutionReport, FailureKind, Provenance, Row, RowFailure, RowOutcome, Table,
};
use tracing::trace;

/// What happened to one row. `None` in a result vector means cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowResult {
    Done {
        value: String,
        provenance: Provenance,
    },
    Failed {
        kind: FailureKind,
        reason: String,
    },
}

impl RowResult {
    pub(crate) fn done(value: String, provenance: Provenance) -> Self {
        Self::Done { value, provenance }
    }

    pub(crate) fn failed(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            reason: reason.into(),
        }
    }
}

/// Reads the input cell as text, failing the row when it is null or absent.
pub(crate) fn input_text(row: &Row, column: &str) -> Result<String, RowResult> {
    row.get(column)
        .as_text()
        .map(Cow::into_owned)
        .ok_or_else(|| {
            RowResult::failed(
                FailureKind::MissingInput,
                format!("input column `{column}` is null or missing"),
            )
        })
}

/// Copies every input row, writing the output column from `results`.
///
/// Failed and cancelled rows get a null output; no row is dropped.
pub(crate) fn assemble(
    table: &Table,
    output: &str,
    results: Vec<Option<RowResult>>,
) -> ExecutionReport {
    let mut rows = Vec::with_capacity(table.len());
    let mut failures = Vec::new();
    let mut outcomes = Vec::with_capacity(table.len());

    for (row_index, (row, result)) in table.rows().iter().zip(results).enumerate() {
        let mut row = row.clone();
        let (value, outcome) = match result {
            Some(RowResult::Done { value, provenance }) => {
                (CellValue::Text(value), RowOutcome::completed(provenance))
            }
            Some(RowResult::Failed { kind, reason }) => {
                trace!(row_index, kind = kind.as_str(), %reason, "row failed");
                failures.push(RowFailure {
                    row_index,
                    kind,
                    reason,
                });
                (CellValue::Null, RowOutcome::failed())
            }
            None => (CellValue::Null, RowOutcome::cancelled()),
        };
        row.insert(output, value);
        rows.push(row);
        outcomes.push(outcome);
    }

    ExecutionReport::new(Table::new(rows), failures, outcomes)
}
