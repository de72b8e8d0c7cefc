//! Per-row execution outcomes.

use serde::{Deserialize, Serialize};

use crate::Table;

/// Final state of one row in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Completed,
    Failed,
    Cancelled,
}

/// How a completed row obtained its output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Evaluated by the transformation program.
    Program,
    /// Matched a stored example exactly (after trimming).
    ExampleExact,
    /// Matched a stored example ignoring case.
    ExampleCaseInsensitive,
    /// Produced by the external value resolver.
    Resolver,
}

/// Failure class of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingInput,
    Program,
    Resolver,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::Program => "program",
            Self::Resolver => "resolver",
        }
    }
}

/// A row-level failure marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row_index: usize,
    pub kind: FailureKind,
    pub reason: String,
}

/// Status of one row, with provenance when it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub status: RowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl RowOutcome {
    pub fn completed(provenance: Provenance) -> Self {
        Self {
            status: RowStatus::Completed,
            provenance: Some(provenance),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: RowStatus::Failed,
            provenance: None,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: RowStatus::Cancelled,
            provenance: None,
        }
    }
}

/// Result of executing a transformation over a table.
///
/// `data` holds every input row, in order, with the output column appended.
/// `outcomes` is aligned with `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub success: bool,
    pub data: Table,
    #[serde(rename = "per_row_errors")]
    pub failures: Vec<RowFailure>,
    pub outcomes: Vec<RowOutcome>,
}

impl ExecutionReport {
    pub fn new(data: Table, failures: Vec<RowFailure>, outcomes: Vec<RowOutcome>) -> Self {
        let success = failures.is_empty()
            && outcomes.iter().all(|o| o.status == RowStatus::Completed);
        Self {
            success,
            data,
            failures,
            outcomes,
        }
    }

    pub fn count(&self, status: RowStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn completed(&self) -> usize {
        self.count(RowStatus::Completed)
    }

    pub fn failed(&self) -> usize {
        self.count(RowStatus::Failed)
    }

    pub fn cancelled(&self) -> usize {
        self.count(RowStatus::Cancelled)
    }

    /// Number of completed rows with the given provenance.
    pub fn count_provenance(&self, provenance: Provenance) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.provenance == Some(provenance))
            .count()
    }
}
