//! Batch execution of one transformation over one table.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tabulax_common::{CancellationToken, effective_workers, parallel_map};
use tabulax_model::{
    ExecutionReport, FailureKind, Provenance, Row, Table, Transformation, TransformationExample,
    TransformationLogic,
};
use tabulax_resolve::ValueResolver;
use tabulax_synth::Program;
use tracing::{info, warn};

use crate::error::{ExecError, Result};
use crate::general::GeneralRun;
use crate::row::{RowResult, assemble, input_text};

/// Tuning for one execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
    /// Rows not started within this time are reported as cancelled.
    pub timeout: Option<Duration>,
}

impl ExecOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Runs transformations row by row, isolating per-row failures.
pub struct Executor<'a> {
    resolver: &'a dyn ValueResolver,
    options: ExecOptions,
    cancel: CancellationToken,
}

impl<'a> Executor<'a> {
    /// The resolver is only consulted for General transformations.
    pub fn new(resolver: &'a dyn ValueResolver) -> Self {
        Self {
            resolver,
            options: ExecOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Executes a stored transformation record.
    pub fn execute(
        &self,
        transformation: &Transformation,
        table: &Table,
        input: &str,
        output: &str,
    ) -> Result<ExecutionReport> {
        let logic = transformation.logic()?;
        let examples = transformation.examples()?;
        self.execute_logic(&logic, examples.as_slice(), table, input, output)
    }

    /// Executes code or a description directly.
    ///
    /// Validation happens before any row runs: the output column must be
    /// named, the input column must exist when the table has rows, and
    /// program text must parse.
    pub fn execute_logic(
        &self,
        logic: &TransformationLogic,
        examples: &[TransformationExample],
        table: &Table,
        input: &str,
        output: &str,
    ) -> Result<ExecutionReport> {
        if output.trim().is_empty() {
            return Err(ExecError::EmptyOutputColumn);
        }
        if !table.is_empty() && !table.has_column(input) {
            return Err(ExecError::MissingColumn {
                column: input.to_string(),
            });
        }
        let program = logic.code().map(Program::parse).transpose()?;

        let started = Instant::now();
        let workers = effective_workers(self.options.workers, table.len());
        let cancel = match self.options.timeout {
            Some(timeout) => self.cancel.with_timeout(timeout),
            None => self.cancel.clone(),
        };

        let results = match &program {
            Some(program) => parallel_map(table.rows(), workers, &cancel, |index, row| {
                guard_row(index, || run_program(program, row, input))
            }),
            None => GeneralRun {
                description: logic.description(),
                examples,
                resolver: self.resolver,
            }
            .run(table, input, workers, &cancel),
        };

        let report = assemble(table, output, results);
        info!(
            category = %logic.category(),
            rows = table.len(),
            workers,
            completed = report.completed(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            elapsed = ?started.elapsed(),
            "transformation executed"
        );
        if report.cancelled() > 0 {
            warn!(
                cancelled = report.cancelled(),
                "execution stopped before every row ran"
            );
        }
        Ok(report)
    }
}

/// Runs one row, turning a panic into a failure for that row only.
fn guard_row(index: usize, run: impl FnOnce() -> RowResult) -> RowResult {
    panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(row = index, %message, "row evaluation panicked");
        RowResult::failed(FailureKind::Program, format!("program panicked: {message}"))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else {
        "unknown panic"
    }
}

fn run_program(program: &Program, row: &Row, input: &str) -> RowResult {
    let text = match input_text(row, input) {
        Ok(text) => text,
        Err(failed) => return failed,
    };
    match program.run(&text) {
        Ok(value) => RowResult::done(value, Provenance::Program),
        Err(err) => RowResult::failed(FailureKind::Program, err.to_string()),
    }
}

/// Executes a stored transformation with default options.
pub fn execute(
    transformation: &Transformation,
    table: &Table,
    input: &str,
    output: &str,
    resolver: &dyn ValueResolver,
) -> Result<ExecutionReport> {
    Executor::new(resolver).execute(transformation, table, input, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_row_passes_results_through() {
        let result = guard_row(0, || RowResult::done("ok".to_string(), Provenance::Program));
        assert_eq!(result, RowResult::done("ok".to_string(), Provenance::Program));
    }

    #[test]
    fn test_guard_row_contains_panics() {
        let result = guard_row(3, || panic!("precision overflow"));
        assert_eq!(
            result,
            RowResult::failed(FailureKind::Program, "program panicked: precision overflow")
        );

        let result = guard_row(4, || std::panic::panic_any(7_u8));
        assert_eq!(
            result,
            RowResult::failed(FailureKind::Program, "program panicked: unknown panic")
        );
    }
}
