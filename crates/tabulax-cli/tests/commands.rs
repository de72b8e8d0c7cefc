//! End-to-end command tests over temporary files.

use std::fs;
use std::path::{Path, PathBuf};

use tabulax_cli::cli::{ApplyArgs, JoinArgs, LearnArgs};
use tabulax_cli::commands::{run_apply, run_join, run_learn};
use tabulax_cli::config::FileConfig;
use tabulax_cli::io::{read_table, read_transformation};
use tabulax_model::{CellValue, FailureKind, TransformationCategory};
use tabulax_resolve::{DisabledResolver, StubResolver};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn learn_args(examples: PathBuf, output: PathBuf) -> LearnArgs {
    LearnArgs {
        examples,
        source_column: "source".to_string(),
        target_column: "target".to_string(),
        name: None,
        owner: Some("analyst".to_string()),
        output: Some(output),
    }
}

fn apply_args(transformation: PathBuf, table: PathBuf, output: PathBuf) -> ApplyArgs {
    ApplyArgs {
        transformation,
        table,
        input_column: "kg".to_string(),
        output_column: "lb".to_string(),
        output: Some(output),
        workers: Some(2),
        deadline_secs: None,
    }
}

#[test]
fn learn_writes_a_numeric_record() {
    let dir = TempDir::new().unwrap();
    let examples = write(dir.path(), "kg_to_lb.csv", "source,target\n5,2.2046\n10,4.4092\n");
    let output = dir.path().join("kg_to_lb.json");

    let record = run_learn(&learn_args(examples, output.clone()), &DisabledResolver).unwrap();

    assert_eq!(record.category, TransformationCategory::Numerical);
    assert_eq!(record.name, "kg_to_lb");
    assert_eq!(record.owner.as_deref(), Some("analyst"));
    assert!(record.code.is_some());

    let stored = read_transformation(&output).unwrap();
    assert_eq!(stored, record);
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap())
        .unwrap();
    assert_eq!(json["transformationType"], "Numerical");
    assert_eq!(json["sourceExamples"][1], "10");
}

#[test]
fn learn_then_apply_round_trips_through_files() {
    let dir = TempDir::new().unwrap();
    let examples = write(dir.path(), "ex.csv", "source,target\n5,2.2046\n10,4.4092\n");
    let record_path = dir.path().join("ex.json");
    run_learn(&learn_args(examples, record_path.clone()), &DisabledResolver).unwrap();

    let table = write(dir.path(), "weights.csv", "kg\n20\n");
    let output = dir.path().join("out.json");
    let report = run_apply(
        &apply_args(record_path, table, output.clone()),
        &FileConfig::default(),
        &DisabledResolver,
    )
    .unwrap();

    assert!(report.success);
    let written = read_table(&output).unwrap();
    assert_eq!(written.rows()[0].get("lb"), &CellValue::text("8.8184"));
}

#[test]
fn apply_writes_csv_with_failed_rows_kept() {
    let dir = TempDir::new().unwrap();
    let record = write(
        dir.path(),
        "double.json",
        r#"{
            "name": "double",
            "transformationType": "Numerical",
            "transformationCode": "fixed(scale(number(input), 2), 0)",
            "sourceExamples": ["1"],
            "targetExamples": ["2"]
        }"#,
    );
    let table = write(dir.path(), "in.csv", "id,kg\n1,1\n2,x\n3,\n");
    let output = dir.path().join("out.csv");

    let report = run_apply(
        &apply_args(record, table, output.clone()),
        &FileConfig::default(),
        &DisabledResolver,
    )
    .unwrap();

    assert!(!report.success);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].kind, FailureKind::Program);
    assert_eq!(report.failures[1].kind, FailureKind::MissingInput);

    let written = fs::read_to_string(&output).unwrap();
    insta::assert_snapshot!(written, @r"
    id,kg,lb
    1,1,2
    2,x,
    3,,
    ");
}

#[test]
fn general_records_use_examples_then_resolver() {
    let dir = TempDir::new().unwrap();
    let examples = write(
        dir.path(),
        "capitals.csv",
        "source,target\nJapan,Tokyo\nFrance,Paris\nItaly,Rome\n",
    );
    let record_path = dir.path().join("capitals.json");
    let stub = StubResolver::new()
        .with_description("Country to capital city")
        .with_mapping("Kenya", "Nairobi");

    let record = run_learn(&learn_args(examples, record_path.clone()), &stub).unwrap();
    assert_eq!(record.category, TransformationCategory::General);
    assert_eq!(record.description.as_deref(), Some("Country to capital city"));

    let table = write(dir.path(), "countries.json", r#"[{"kg": "japan"}, {"kg": "Kenya"}]"#);
    let output = dir.path().join("capitals_out.json");
    let report = run_apply(
        &apply_args(record_path, table, output.clone()),
        &FileConfig::default(),
        &stub,
    )
    .unwrap();

    assert!(report.success);
    let written = read_table(&output).unwrap();
    assert_eq!(written.rows()[0].get("lb"), &CellValue::text("Tokyo"));
    assert_eq!(written.rows()[1].get("lb"), &CellValue::text("Nairobi"));
    assert_eq!(stub.resolve_calls(), 1);
}

#[test]
fn join_reads_settings_from_config() {
    let dir = TempDir::new().unwrap();
    let source = write(dir.path(), "source.csv", "name\nJon\nMary-Ann\nZed\n");
    let target = write(dir.path(), "target.csv", "name,id\nJohn,1\nMaryAnn,2\n");
    let config = write(dir.path(), "tabulax.toml", "[join]\nomit_unmatched = true\n");
    let output = dir.path().join("joined.json");

    let config = FileConfig::load(Some(&config)).unwrap();
    let args = JoinArgs {
        source,
        target,
        source_column: "name".to_string(),
        target_column: "name".to_string(),
        category: TransformationCategory::StringBased,
        max_distance: Some(1.0),
        omit_unmatched: false,
        ignore_case: false,
        trim: false,
        workers: None,
        output: Some(output.clone()),
    };

    let result = run_join(&args, &config).unwrap();

    assert_eq!(result.matches.len(), 2);
    assert_eq!(result.unmatched, [2]);
    let joined = read_table(&output).unwrap();
    assert_eq!(joined.len(), 2);
    assert_eq!(joined.rows()[1].get("target_id"), &CellValue::text("2"));
    assert_eq!(joined.rows()[1].get("join_distance"), &CellValue::Number(1.0));
}

#[test]
fn explicit_config_must_exist() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(FileConfig::load(Some(&missing)).is_err());
}

#[test]
fn apply_rejects_invalid_records() {
    let dir = TempDir::new().unwrap();
    let record = write(
        dir.path(),
        "bad.json",
        r#"{
            "name": "bad",
            "transformationType": "String-based",
            "sourceExamples": ["a"],
            "targetExamples": ["A"]
        }"#,
    );
    let table = write(dir.path(), "in.csv", "kg\n1\n");
    let output = dir.path().join("out.csv");

    let err = run_apply(
        &apply_args(record, table, output.clone()),
        &FileConfig::default(),
        &DisabledResolver,
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("invalid transformation"));
    assert!(!output.exists());
}
