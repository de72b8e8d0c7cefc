//! Executor behaviour over whole batches.

use std::sync::Arc;
use std::time::Duration;

use tabulax_common::CancellationToken;
use tabulax_exec::{ExecError, ExecOptions, Executor, execute};
use tabulax_model::{
    CellValue, FailureKind, Provenance, Row, RowStatus, Table, Transformation,
    TransformationCategory, TransformationExample, TransformationLogic,
};
use tabulax_resolve::{
    DisabledResolver, ResilientResolver, ResolverPolicy, RetryPolicy, StubResolver,
};

fn record(category: TransformationCategory, code: Option<&str>) -> Transformation {
    Transformation {
        id: "t-1".to_string(),
        name: "test".to_string(),
        description: None,
        category,
        code: code.map(str::to_string),
        source_examples: vec!["5".to_string()],
        target_examples: vec!["10".to_string()],
        owner: None,
        created_at: None,
    }
}

fn general(pairs: &[(&str, &str)], description: Option<&str>) -> Transformation {
    Transformation {
        id: "t-2".to_string(),
        name: "capitals".to_string(),
        description: description.map(str::to_string),
        category: TransformationCategory::General,
        code: None,
        source_examples: pairs.iter().map(|(s, _)| s.to_string()).collect(),
        target_examples: pairs.iter().map(|(_, t)| t.to_string()).collect(),
        owner: None,
        created_at: None,
    }
}

fn doubling() -> Transformation {
    record(
        TransformationCategory::Numerical,
        Some("fixed(scale(number(input), 2), 0)"),
    )
}

#[test]
fn failing_row_is_isolated() {
    let values = ["1", "2", "3", "abc", "5", "6", "7", "8", "9", "10"];
    let table = Table::from_column("value", values);

    let report = execute(&doubling(), &table, "value", "doubled", &DisabledResolver).unwrap();

    assert_eq!(report.data.len(), 10);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row_index, 3);
    assert_eq!(report.failures[0].kind, FailureKind::Program);
    assert!(report.data.rows()[3].get("doubled").is_null());
    for (index, row) in report.data.rows().iter().enumerate() {
        if index != 3 {
            let expected = format!("{}", (index + 1) * 2);
            assert_eq!(row.get("doubled"), &CellValue::text(expected));
        }
    }
    assert!(!report.success);
    assert_eq!(report.completed(), 9);
}

#[test]
fn null_input_is_reported_not_dropped() {
    let mut table = Table::from_column("value", ["4"]);
    table.push(Row::new());
    table.push([("value", CellValue::Null)].into_iter().collect());

    let report = execute(&doubling(), &table, "value", "doubled", &DisabledResolver).unwrap();

    assert_eq!(report.data.len(), 3);
    assert_eq!(report.failures.len(), 2);
    assert!(
        report
            .failures
            .iter()
            .all(|f| f.kind == FailureKind::MissingInput)
    );
    assert_eq!(report.data.rows()[0].get("doubled"), &CellValue::text("8"));
}

#[test]
fn numbers_are_read_as_text() {
    let table = Table::from_column("value", [CellValue::Number(21.0)]);
    let report = execute(&doubling(), &table, "value", "doubled", &DisabledResolver).unwrap();
    assert_eq!(report.data.rows()[0].get("doubled"), &CellValue::text("42"));
}

#[test]
fn execution_is_idempotent() {
    let table = Table::from_column("value", ["1", "x", "3"]);
    let executor = Executor::new(&DisabledResolver);
    let first = executor
        .execute(&doubling(), &table, "value", "out")
        .unwrap();
    let second = executor
        .execute(&doubling(), &table, "value", "out")
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn worker_count_does_not_change_results() {
    let values: Vec<String> = (0..200).map(|i| i.to_string()).collect();
    let table = Table::from_column("value", values);
    let run = |workers| {
        Executor::new(&DisabledResolver)
            .with_options(ExecOptions::default().with_workers(workers))
            .execute(&doubling(), &table, "value", "out")
            .unwrap()
    };
    assert_eq!(run(1), run(8));
}

#[test]
fn output_column_may_overwrite_input() {
    let table = Table::from_column("value", ["7"]);
    let report = execute(&doubling(), &table, "value", "value", &DisabledResolver).unwrap();
    assert_eq!(report.data.rows()[0].get("value"), &CellValue::text("14"));
}

#[test]
fn validation_errors_stop_the_batch() {
    let table = Table::from_column("value", ["1"]);

    let err = execute(&doubling(), &table, "missing", "out", &DisabledResolver).unwrap_err();
    assert_eq!(
        err,
        ExecError::MissingColumn {
            column: "missing".to_string()
        }
    );

    let err = execute(&doubling(), &table, "value", " ", &DisabledResolver).unwrap_err();
    assert_eq!(err, ExecError::EmptyOutputColumn);

    let broken = record(TransformationCategory::StringBased, Some("upper(input"));
    let err = execute(&broken, &table, "value", "out", &DisabledResolver).unwrap_err();
    assert!(matches!(err, ExecError::Parse(_)));

    let codeless = record(TransformationCategory::Algorithmic, None);
    let err = execute(&codeless, &table, "value", "out", &DisabledResolver).unwrap_err();
    assert!(matches!(err, ExecError::Model(_)));
}

#[test]
fn empty_table_needs_no_input_column() {
    let report =
        execute(&doubling(), &Table::default(), "anything", "out", &DisabledResolver).unwrap();
    assert!(report.success);
    assert!(report.data.is_empty());
}

#[test]
fn general_uses_examples_before_resolver() {
    let transformation = general(
        &[("Japan", "Tokyo"), ("France", "Paris")],
        Some("Country to Capital City"),
    );
    let table = Table::from_column("country", [" Japan ", "FRANCE", "Kenya", "Kenya", "Peru"]);
    let stub = StubResolver::new()
        .with_mapping("Kenya", "Nairobi")
        .with_mapping("Peru", "Lima");

    let report = execute(&transformation, &table, "country", "capital", &stub).unwrap();

    let capitals: Vec<String> = report
        .data
        .column_values("capital")
        .map(ToString::to_string)
        .collect();
    assert_eq!(capitals, ["Tokyo", "Paris", "Nairobi", "Nairobi", "Lima"]);
    assert_eq!(report.count_provenance(Provenance::ExampleExact), 1);
    assert_eq!(report.count_provenance(Provenance::ExampleCaseInsensitive), 1);
    assert_eq!(report.count_provenance(Provenance::Resolver), 3);
    assert_eq!(stub.resolve_calls(), 2);
    assert!(report.success);
}

#[test]
fn general_resolver_failure_is_per_row() {
    let transformation = general(&[("Japan", "Tokyo")], None);
    let table = Table::from_column("country", ["Atlantis", "Japan"]);
    let stub = StubResolver::new();

    let report = execute(&transformation, &table, "country", "capital", &stub).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row_index, 0);
    assert_eq!(report.failures[0].kind, FailureKind::Resolver);
    assert_eq!(report.data.rows()[1].get("capital"), &CellValue::text("Tokyo"));
}

#[test]
fn general_retries_through_resilient_resolver() {
    let transformation = general(&[("Japan", "Tokyo")], None);
    let table = Table::from_column("country", ["Kenya"]);
    let stub = Arc::new(StubResolver::new().with_mapping("Kenya", "Nairobi").flaky(1));
    let policy = ResolverPolicy::default().with_retry(
        RetryPolicy::default().with_initial_backoff(Duration::from_millis(1)),
    );
    let resolver = ResilientResolver::new(stub.clone(), policy);

    let report = execute(&transformation, &table, "country", "capital", &resolver).unwrap();

    assert!(report.success);
    assert_eq!(stub.resolve_calls(), 2);
}

#[test]
fn blank_general_input_is_missing() {
    let transformation = general(&[("Japan", "Tokyo")], None);
    let table = Table::from_column("country", ["   "]);
    let report =
        execute(&transformation, &table, "country", "capital", &DisabledResolver).unwrap();
    assert_eq!(report.failures[0].kind, FailureKind::MissingInput);
}

#[test]
fn cancelled_batch_returns_every_row() {
    let table = Table::from_column("value", ["1", "2", "3"]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Executor::new(&DisabledResolver)
        .with_cancellation(cancel)
        .execute(&doubling(), &table, "value", "out")
        .unwrap();

    assert_eq!(report.data.len(), 3);
    assert_eq!(report.cancelled(), 3);
    assert!(report.failures.is_empty());
    assert!(!report.success);
    assert!(report.outcomes.iter().all(|o| o.status == RowStatus::Cancelled));
}

#[test]
fn expired_deadline_cancels_general_rows() {
    let transformation = general(&[("Japan", "Tokyo")], None);
    let table = Table::from_column("country", ["Japan", "Kenya"]);
    let stub = StubResolver::new().with_mapping("Kenya", "Nairobi");

    let report = Executor::new(&stub)
        .with_options(ExecOptions::default().with_timeout(Duration::ZERO))
        .execute(&transformation, &table, "country", "capital")
        .unwrap();

    assert_eq!(report.cancelled(), 2);
    assert_eq!(stub.resolve_calls(), 0);
}

#[test]
fn execute_logic_accepts_raw_code() {
    let logic = TransformationLogic::StringBased("upper(input)".to_string());
    let examples = [TransformationExample::new("a", "A")];
    let table = Table::from_column("name", ["ada"]);

    let report = Executor::new(&DisabledResolver)
        .execute_logic(&logic, &examples, &table, "name", "upper")
        .unwrap();

    assert_eq!(report.data.rows()[0].get("upper"), &CellValue::text("ADA"));
    assert_eq!(report.outcomes[0].provenance, Some(Provenance::Program));
}

#[test]
fn report_serializes_with_per_row_errors() {
    let table = Table::from_column("value", ["x"]);
    let report = execute(&doubling(), &table, "value", "out", &DisabledResolver).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["data"][0]["out"], serde_json::Value::Null);
    assert_eq!(json["per_row_errors"][0]["row_index"], 0);
    assert_eq!(json["per_row_errors"][0]["kind"], "program");
}

#[test]
fn oversized_program_arguments_are_rejected_before_any_row_runs() {
    let table = Table::from_column("value", ["1.5", "2", "x", "4"]);
    for code in [
        "round(number(input), 70000)",
        "fixed(number(input), 4000000000)",
        r#"pad_left(input, 1000000000000, "0")"#,
    ] {
        let logic = TransformationLogic::StringBased(code.to_string());
        let err = Executor::new(&DisabledResolver)
            .execute_logic(&logic, &[], &table, "value", "out")
            .unwrap_err();
        assert!(matches!(err, ExecError::Parse(_)), "{code}: {err}");
    }

    let nested = format!("{}input{}", "upper(".repeat(100_000), ")".repeat(100_000));
    let logic = TransformationLogic::StringBased(nested);
    let err = Executor::new(&DisabledResolver)
        .execute_logic(&logic, &[], &table, "value", "out")
        .unwrap_err();
    assert!(matches!(err, ExecError::Parse(_)));
}

#[test]
fn largest_accepted_precision_runs_per_row() {
    let table = Table::from_column("value", ["1.5", "x"]);
    let logic = TransformationLogic::Numerical("round(number(input), 17)".to_string());
    let report = Executor::new(&DisabledResolver)
        .with_options(ExecOptions::default().with_workers(2))
        .execute_logic(&logic, &[], &table, "value", "out")
        .unwrap();

    assert_eq!(report.data.len(), 2);
    assert_eq!(report.data.rows()[0].get("out"), &CellValue::text("1.5"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row_index, 1);
}
